//! Shared utilities and helper functions for web UI.

use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use chrono::{DateTime, NaiveDateTime};
use tera::Context;

use crate::auth::{Principal, Role};
use crate::error::AppError;
use crate::state::AppState;
use crate::web_ui::templates;

/// Helper to render a template
pub fn render_template(name: &str, context: &Context) -> Response {
    match templates::render(name, context) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Template error: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Template error: {}", e)).into_response()
        }
    }
}

/// Helper to render an error page
pub fn render_error(message: &str) -> Response {
    let mut context = Context::new();
    context.insert("message", message);

    match templates::render("error.html", &context) {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, message.to_string()).into_response(),
    }
}

/// Extract the session token from the cookie header
pub fn get_session_token(headers: &HeaderMap) -> Option<String> {
    let cookie_header = headers.get("cookie")?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some(token) = part.strip_prefix("session=") {
            return Some(token.to_string());
        }
    }
    None
}

/// Resolve the authenticated principal behind a request, if any
pub fn current_principal(state: &AppState, headers: &HeaderMap) -> Option<Principal> {
    let token = get_session_token(headers)?;
    state.auth.principal_for_token(&token)
}

/// Gate a handler on a role. On failure the caller gets a ready-made
/// redirect to the login page.
pub fn require_role(
    state: &AppState,
    headers: &HeaderMap,
    role: Role,
) -> std::result::Result<Principal, Response> {
    match current_principal(state, headers) {
        Some(p) if p.role == role => Ok(p),
        Some(_) => Err(redirect_with_error(
            "/login",
            &AppError::PermissionDenied.to_string(),
        )),
        None => Err(redirect_with_error("/login", &AppError::AuthRequired.to_string())),
    }
}

/// Best-effort client address for the login activity log.
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "local".to_string())
}

/// Encode a message for a redirect query parameter
pub fn encode_msg(message: &str) -> String {
    message.replace(' ', "+")
}

/// Redirect carrying a user-visible error message
pub fn redirect_with_error(path: &str, message: &str) -> Response {
    Redirect::to(&format!("{}?error={}", path, encode_msg(message))).into_response()
}

/// Redirect carrying a user-visible success message
pub fn redirect_with_message(path: &str, message: &str) -> Response {
    Redirect::to(&format!("{}?message={}", path, encode_msg(message))).into_response()
}

/// Put the signed-in principal and any flash message into the context
pub fn base_context(principal: &Principal, query: &std::collections::HashMap<String, String>) -> Context {
    let mut context = Context::new();
    context.insert("current_user", &principal.username);
    context.insert("current_role", principal.role.as_str());
    if let Some(error) = query.get("error") {
        context.insert("error", error);
    }
    if let Some(message) = query.get("message") {
        context.insert("message", message);
    }
    context
}

/// Parse an HTML `datetime-local` form value into unix seconds
pub fn parse_datetime_local(value: &str) -> Option<i64> {
    let fmt = if value.len() == 16 { "%Y-%m-%dT%H:%M" } else { "%Y-%m-%dT%H:%M:%S" };
    NaiveDateTime::parse_from_str(value, fmt)
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}

/// Format a unix timestamp for display
pub fn format_datetime(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Format seconds ago as human-readable string
pub fn format_time_ago(seconds: i64) -> String {
    if seconds < 0 {
        return "in the future".to_string();
    }
    if seconds < 60 {
        return format!("{} seconds ago", seconds);
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{} minute{} ago", minutes, if minutes == 1 { "" } else { "s" });
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" });
    }
    let days = hours / 24;
    format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
}

/// Format a Unix timestamp as a relative time string
pub fn format_relative_time(timestamp: i64) -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    format_time_ago(now - timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_datetime_local_values() {
        assert_eq!(parse_datetime_local("1970-01-01T00:00"), Some(0));
        assert_eq!(parse_datetime_local("1970-01-01T01:00:30"), Some(3630));
        assert!(parse_datetime_local("tomorrow").is_none());
    }

    #[test]
    fn relative_times_read_naturally() {
        assert_eq!(format_time_ago(30), "30 seconds ago");
        assert_eq!(format_time_ago(60), "1 minute ago");
        assert_eq!(format_time_ago(7200), "2 hours ago");
        assert_eq!(format_time_ago(86400 * 3), "3 days ago");
    }
}
