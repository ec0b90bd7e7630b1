//! Authentication route handlers for login and logout.

use axum::{
    extract::{Form, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use std::collections::HashMap;
use std::sync::Arc;
use tera::Context;

use crate::state::AppState;
use super::utils::{client_ip, get_session_token, render_template};

/// Login form data
#[derive(serde::Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Home page redirects to login
pub async fn home() -> Response {
    Redirect::to("/login").into_response()
}

/// Login page (GET)
pub async fn login_page(Query(query): Query<HashMap<String, String>>) -> Response {
    let mut context = Context::new();
    if let Some(error) = query.get("error") {
        context.insert("error", error);
    }
    if let Some(msg) = query.get("message") {
        context.insert("message", msg);
    }
    render_template("login.html", &context)
}

/// Login submit (POST)
pub async fn login_submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let ip = client_ip(&headers);
    match state.auth.login(&state.db, &form.username, &form.password, &ip).await {
        Ok((token, principal)) => Response::builder()
            .status(StatusCode::SEE_OTHER)
            .header("Location", principal.role.home())
            .header(
                "Set-Cookie",
                format!("session={}; Path=/; HttpOnly; SameSite=Lax", token),
            )
            .body(axum::body::Body::empty())
            .unwrap(),
        Err(_) => Redirect::to("/login?error=Invalid+username+or+password").into_response(),
    }
}

/// Logout (GET)
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(token) = get_session_token(&headers) {
        state.auth.revoke(&token);
    }
    Response::builder()
        .status(StatusCode::SEE_OTHER)
        .header("Location", "/login")
        .header(
            "Set-Cookie",
            "session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        )
        .body(axum::body::Body::empty())
        .unwrap()
}
