//! This file defines the templates and a convenience function for creating the navigation bar.

use maud::{Markup, html};

use crate::{
    endpoints::{self, format_endpoint},
    user::User,
};

/// Template for a link in the navigation bar.
///
/// It will change appearance if `is_current` is set to
/// `true`. Only one link should be set as active at any one time.
#[derive(Clone)]
struct Link {
    url: String,
    title: &'static str,
    is_current: bool,
}

impl Link {
    fn new(url: String, title: &'static str, active_endpoint: &str) -> Self {
        let is_current = url == active_endpoint;

        Self {
            url,
            title,
            is_current,
        }
    }

    fn into_html(self) -> Markup {
        let style = if self.is_current {
            "block py-2 px-3 text-white bg-blue-700 rounded-sm lg:bg-transparent
        lg:text-blue-700 lg:p-0 dark:text-white lg:dark:text-blue-500"
        } else {
            "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100
        lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0
        dark:text-white lg:dark:hover:text-blue-500 dark:hover:bg-gray-700
        dark:hover:text-white lg:dark:hover:bg-transparent"
        };

        html!(
            a
                href=(self.url)
                class=(style)
                aria-current=[self.is_current.then_some("page")]
            {
                (self.title)
            }
        )
    }
}

pub struct NavBar {
    links: Vec<Link>,
}

impl NavBar {
    /// Get the navigation bar for `user`.
    ///
    /// If a link matches `active_endpoint`, then that link will be
    /// marked as active and displayed differently in the HTML.
    /// Administrators get an extra link to the admin dashboard.
    pub fn new(active_endpoint: &str, user: &User) -> NavBar {
        let user_id = user.id.as_i64();
        let mut links = vec![
            Link::new(
                endpoints::DASHBOARD_VIEW.to_owned(),
                "Dashboard",
                active_endpoint,
            ),
            Link::new(
                format_endpoint(endpoints::NEW_POLL_VIEW, user_id),
                "New Poll",
                active_endpoint,
            ),
            Link::new(
                format_endpoint(endpoints::EDIT_USER_VIEW, user_id),
                "Profile",
                active_endpoint,
            ),
        ];

        if user.is_admin {
            links.push(Link::new(
                endpoints::ADMIN_DASHBOARD_VIEW.to_owned(),
                "Admin",
                active_endpoint,
            ));
        }

        links.push(Link {
            url: endpoints::LOG_OUT.to_owned(),
            title: "Log out",
            is_current: false,
        });

        NavBar { links }
    }

    pub fn into_html(self) -> Markup {
        // Template adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div
                    class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a
                        href=(endpoints::DASHBOARD_VIEW)
                        class="flex items-center space-x-3 rtl:space-x-reverse"
                    {
                        span
                            class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "Pollsplit"
                        }
                    }

                    div class="w-full lg:block lg:w-auto"
                    {
                        ul
                            class="font-medium flex flex-col p-4 lg:p-0 mt-4
                            border border-gray-100 rounded bg-gray-50
                            lg:flex-row lg:space-x-8 rtl:space-x-reverse lg:mt-0
                            lg:border-0 lg:bg-white dark:bg-gray-800
                            lg:dark:bg-gray-900 dark:border-gray-700"
                        {
                            @for link in self.links {
                                li { (link.into_html()) }
                            }
                        }
                    }
                }
            }
        )
    }
}

#[cfg(test)]
mod nav_bar_tests {
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        endpoints::{self, format_endpoint},
        navigation::NavBar,
        user::test_utils::{insert_user, user_details},
    };

    #[test]
    fn set_active_endpoint() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = insert_user(
            user_details("Alice", "alice@example.com"),
            false,
            "hunter2",
            &connection,
        );
        let new_poll = format_endpoint(endpoints::NEW_POLL_VIEW, user.id.as_i64());
        let profile = format_endpoint(endpoints::EDIT_USER_VIEW, user.id.as_i64());

        let cases = [
            (endpoints::DASHBOARD_VIEW, true),
            (new_poll.as_str(), true),
            (profile.as_str(), true),
            (endpoints::ROOT, false),
            (endpoints::LOG_OUT, false),
            (endpoints::LOG_IN_VIEW, false),
        ];

        for (endpoint, should_be_active) in cases {
            let nav_bar = NavBar::new(endpoint, &user);

            assert_link_active(nav_bar, endpoint, should_be_active);
        }
    }

    #[test]
    fn admin_link_only_shown_to_admins() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = insert_user(
            user_details("Alice", "alice@example.com"),
            false,
            "hunter2",
            &connection,
        );
        let admin = insert_user(
            user_details("Bob", "bob@example.com"),
            true,
            "hunter2",
            &connection,
        );

        let has_admin_link = |nav_bar: NavBar| {
            nav_bar
                .links
                .iter()
                .any(|link| link.url == endpoints::ADMIN_DASHBOARD_VIEW)
        };

        assert!(!has_admin_link(NavBar::new(endpoints::DASHBOARD_VIEW, &user)));
        assert!(has_admin_link(NavBar::new(endpoints::DASHBOARD_VIEW, &admin)));
    }

    #[track_caller]
    fn assert_link_active(nav_bar: NavBar, endpoint: &str, should_be_active: bool) {
        for link in nav_bar.links {
            if link.url == endpoint {
                assert_eq!(
                    link.is_current, should_be_active,
                    "Link for {endpoint} should have is_current={should_be_active}"
                );
            } else {
                assert!(
                    !link.is_current,
                    "Link for {} should be inactive",
                    link.url
                );
            }
        }
    }
}
