//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::{Method, header::CONTENT_TYPE},
    middleware::Next,
    response::Response,
};

/// The form fields whose values are replaced with asterisks before logging.
const REDACTED_FIELDS: [&str; 2] = ["user_password", "password"];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
/// Password fields in submitted forms are redacted.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body_text) = extract_request_parts_and_body_text(request).await;

    if is_form_submission(&parts) {
        let display_text = REDACTED_FIELDS
            .iter()
            .fold(body_text.clone(), |text, field| redact_field(&text, field));
        log_request(&parts, &display_text);
    } else {
        log_request(&parts, &body_text);
    }

    let request = Request::from_parts(parts, Body::from(body_text));
    let response = next.run(request).await;

    let (parts, body_text) = extract_response_parts_and_body_text(response).await;
    log_response(&parts, &body_text);

    Response::from_parts(parts, Body::from(body_text))
}

fn is_form_submission(parts: &axum::http::request::Parts) -> bool {
    let is_write = parts.method == Method::POST || parts.method == Method::PUT;

    is_write
        && parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

/// Replace the value of every `field_name=value` pair in a URL encoded form.
fn redact_field(form_text: &str, field_name: &str) -> String {
    form_text
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if key == field_name => format!("{key}=********"),
            _ => pair.to_owned(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

async fn extract_request_parts_and_body_text(
    request: Request,
) -> (axum::http::request::Parts, String) {
    let (parts, body) = request.into_parts();
    let body_text = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).to_string(),
        Err(error) => {
            tracing::error!("Could not read request body: {error}");
            String::new()
        }
    };

    (parts, body_text)
}

async fn extract_response_parts_and_body_text(
    response: Response,
) -> (axum::http::response::Parts, String) {
    let (parts, body) = response.into_parts();
    let body_text = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).to_string(),
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            String::new()
        }
    };

    (parts, body_text)
}

const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The longest prefix of `body` that fits in [LOG_BODY_LENGTH_LIMIT] bytes
/// without splitting a character.
fn truncate_body(body: &str) -> &str {
    let mut end = LOG_BODY_LENGTH_LIMIT.min(body.len());

    while !body.is_char_boundary(end) {
        end -= 1;
    }

    &body[..end]
}

fn log_request(parts: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {parts:#?}\nbody: {:}...",
            truncate_body(body)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {parts:#?}\nbody: {body:?}");
    }
}

fn log_response(parts: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {parts:#?}\nbody: {:}...",
            truncate_body(body)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {parts:#?}\nbody: {body:?}");
    }
}

#[cfg(test)]
mod logging_tests {
    use axum::{Router, middleware, routing::post};
    use axum_test::TestServer;

    use super::{logging_middleware, redact_field, truncate_body};

    #[test]
    fn redacts_password_field() {
        let form = "user_email=foo%40bar.baz&user_password=hunter2&remember_me=on";

        let got = redact_field(form, "user_password");

        assert_eq!(
            got,
            "user_email=foo%40bar.baz&user_password=********&remember_me=on"
        );
    }

    #[test]
    fn redact_ignores_fields_with_similar_names() {
        let form = "password_hint=cat&password=hunter2";

        let got = redact_field(form, "password");

        assert_eq!(got, "password_hint=cat&password=********");
    }

    #[test]
    fn truncate_does_not_split_characters() {
        let body = "é".repeat(40);

        let got = truncate_body(&body);

        assert_eq!(got.len(), 64);
        assert!(got.chars().all(|c| c == 'é'));
    }

    #[tokio::test]
    async fn middleware_passes_body_through() {
        let app = Router::new()
            .route("/echo", post(|body: String| async move { body }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::new(app).expect("Could not create test server.");

        let response = server
            .post("/echo")
            .form(&[("user_email", "a@b.c"), ("user_password", "hunter2")])
            .await;

        response.assert_status_ok();
        response.assert_text("user_email=a%40b.c&user_password=hunter2");
    }
}
