//! Alert fragments for displaying error messages to users.
//!
//! Alerts are returned as HTML fragments. Forms that submit with HTMX target
//! error responses at the `#alert-container` element in the base page.

use maud::{Markup, html};

const ERROR_ALERT_STYLE: &str = "p-4 mb-4 text-sm text-red-800 rounded-lg \
    bg-red-50 dark:bg-gray-800 dark:text-red-400";

/// An error message with an optional longer explanation.
#[derive(Debug, Clone)]
pub struct Alert<'a> {
    pub message: &'a str,
    pub details: &'a str,
}

impl<'a> Alert<'a> {
    /// Create a new error alert
    pub fn error(message: &'a str, details: &'a str) -> Self {
        Self { message, details }
    }

    pub fn into_html(self) -> Markup {
        html! {
            div class=(ERROR_ALERT_STYLE) role="alert"
            {
                span class="font-medium" { (self.message) }

                @if !self.details.is_empty() {
                    p { (self.details) }
                }
            }
        }
    }
}
