//! The landing page for visitors who are not signed in.

use axum::response::{IntoResponse, Response};
use maud::html;

use crate::{
    endpoints,
    html::{PAGE_CONTAINER_STYLE, base, link},
};

/// Display the landing page with links to log in and register.
pub async fn get_home_page() -> Response {
    let content = html! {
        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="max-w-md text-center space-y-4"
            {
                h1 class="text-3xl font-bold" { "Pollsplit" }

                p { "Split shared expenses with friends. Create a poll, record who paid for what and see who owes whom." }

                p
                {
                    (link(endpoints::LOG_IN_VIEW, "Log in"))
                    " or "
                    (link(endpoints::REGISTER_VIEW, "create an account"))
                    "."
                }
            }
        }
    };

    base("Home", &content).into_response()
}

#[cfg(test)]
mod home_page_tests {
    use scraper::Selector;

    use crate::{
        endpoints,
        test_utils::{assert_status_ok, assert_valid_html, parse_html_document},
    };

    use super::get_home_page;

    #[tokio::test]
    async fn links_to_log_in_and_register() {
        let response = get_home_page().await;

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let hrefs: Vec<_> = html
            .select(&Selector::parse("a[href]").unwrap())
            .filter_map(|link| link.value().attr("href"))
            .collect();
        assert!(hrefs.contains(&endpoints::LOG_IN_VIEW));
        assert!(hrefs.contains(&endpoints::REGISTER_VIEW));
    }
}
