use std::{error::Error, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;

use pollsplit_rs::{get_user_by_email, initialize_db, set_admin_flag};

/// Give an existing user administrator rights, or take them away.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The email address of the user to update.
    #[arg(long)]
    email: String,

    /// Remove administrator rights instead of granting them.
    #[arg(long, default_value_t = false)]
    revoke: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);

    if !db_path.is_file() {
        eprintln!("File does not exist at {db_path:#?}!");
        exit(1);
    }

    let connection = Connection::open(db_path)?;
    initialize_db(&connection)?;

    let user = match get_user_by_email(&args.email, &connection) {
        Ok(user) => user,
        Err(error) => {
            eprintln!("Could not find a user with the email {}: {error}", args.email);
            exit(1);
        }
    };

    let is_admin = !args.revoke;
    set_admin_flag(user.id, is_admin, &connection)?;

    if is_admin {
        println!("{} is now an administrator.", user.email);
    } else {
        println!("{} is no longer an administrator.", user.email);
    }

    Ok(())
}
