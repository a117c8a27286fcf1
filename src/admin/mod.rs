//! Administrator pages for managing every user account.
//!
//! Every route in this module expects the admin guard to have added the
//! signed-in [crate::User] to the request extensions.

mod dashboard;
mod users;

pub use dashboard::get_admin_dashboard;
pub use users::{
    create_user_endpoint, delete_user_endpoint, get_admin_edit_user_page, get_new_user_page,
    update_user_endpoint,
};
