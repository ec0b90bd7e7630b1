//! Administrator route handlers: user management, audit views, leaderboard.

use axum::{
    extract::{Form, Query, State},
    http::HeaderMap,
    response::Response,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::audit;
use crate::auth::{hash_password, Role};
use crate::db::entities::{
    audit_log, canteen, donation_request, food, leaderboard, login_activity, meal_beneficiary,
    ngo, role, user, waste_report,
};
use crate::lifecycle::now_ts;
use crate::state::AppState;
use super::utils::{
    base_context, format_datetime, format_relative_time, redirect_with_error,
    redirect_with_message, render_error, render_template, require_role,
};

/// Reference option (canteen or NGO) for account forms
#[derive(serde::Serialize)]
struct RefOption {
    id: i32,
    name: String,
}

/// User row for the management table
#[derive(serde::Serialize)]
struct UserInfo {
    id: i32,
    username: String,
    email: String,
    role: String,
    ref_id: i32,
}

/// Form for creating a user account
#[derive(serde::Deserialize)]
pub struct AddUserForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub canteen_id: Option<String>,
    pub ngo_id: Option<String>,
}

/// Form for editing or deleting a user account
#[derive(serde::Deserialize)]
pub struct ManageUserForm {
    pub action: String, // "edit" or "delete"
    pub user_id: i32,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub canteen_id: Option<String>,
    pub ngo_id: Option<String>,
}

async fn ref_options(
    db: &sea_orm::DatabaseConnection,
) -> crate::error::Result<(Vec<RefOption>, Vec<RefOption>)> {
    let canteens = canteen::Entity::find()
        .order_by_asc(canteen::Column::Name)
        .all(db)
        .await?
        .into_iter()
        .map(|c| RefOption { id: c.id, name: c.name })
        .collect();
    let ngos = ngo::Entity::find()
        .order_by_asc(ngo::Column::Name)
        .all(db)
        .await?
        .into_iter()
        .map(|n| RefOption { id: n.id, name: n.name })
        .collect();
    Ok((canteens, ngos))
}

/// Resolve the ref_id for a role from the form's select fields.
fn resolve_ref_id(role: Role, canteen_id: &Option<String>, ngo_id: &Option<String>) -> Option<i32> {
    match role {
        Role::Admin => Some(0),
        Role::Canteen => canteen_id.as_deref().and_then(|s| s.parse().ok()),
        Role::Ngo => ngo_id.as_deref().and_then(|s| s.parse().ok()),
    }
}

/// Admin dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Admin) {
        Ok(p) => p,
        Err(r) => return r,
    };
    let db = state.db.as_ref();

    let user_count = user::Entity::find().count(db).await.unwrap_or(0);
    let food_count = food::Entity::find().count(db).await.unwrap_or(0);
    let pending_count = donation_request::Entity::find()
        .filter(donation_request::Column::Status.eq("pending"))
        .count(db)
        .await
        .unwrap_or(0);
    let report_count = waste_report::Entity::find().count(db).await.unwrap_or(0);

    let mut context = base_context(&principal, &query);
    context.insert("user_count", &user_count);
    context.insert("food_count", &food_count);
    context.insert("pending_count", &pending_count);
    context.insert("report_count", &report_count);

    render_template("admin_dashboard.html", &context)
}

/// Add user page (GET)
pub async fn add_user_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Admin) {
        Ok(p) => p,
        Err(r) => return r,
    };

    let (canteens, ngos) = match ref_options(&state.db).await {
        Ok(v) => v,
        Err(e) => return render_error(&e.to_string()),
    };

    let mut context = base_context(&principal, &query);
    context.insert("canteens", &canteens);
    context.insert("ngos", &ngos);

    render_template("admin_add_user.html", &context)
}

/// Add user (POST)
pub async fn add_user_submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<AddUserForm>,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Admin) {
        Ok(p) => p,
        Err(r) => return r,
    };
    let db = state.db.as_ref();

    let username = form.username.trim().to_string();
    let email = form.email.trim().to_string();
    if username.is_empty() || email.is_empty() || form.password.is_empty() {
        return redirect_with_error("/admin/add_user", "All fields are required");
    }

    let role = match Role::parse(&form.role) {
        Some(r) => r,
        None => return redirect_with_error("/admin/add_user", "Unknown role"),
    };
    let ref_id = match resolve_ref_id(role, &form.canteen_id, &form.ngo_id) {
        Some(id) => id,
        None => {
            return redirect_with_error("/admin/add_user", "Select a canteen or NGO for this role")
        }
    };

    let role_row = match role::Entity::find()
        .filter(role::Column::RoleName.eq(role.as_str()))
        .one(db)
        .await
    {
        Ok(Some(r)) => r,
        _ => return render_error("Role table is not seeded"),
    };

    let duplicate = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Username.eq(&username))
                .add(user::Column::Email.eq(&email)),
        )
        .one(db)
        .await;
    if matches!(duplicate, Ok(Some(_))) {
        return redirect_with_error("/admin/add_user", "Username or Email already exists");
    }

    let txn = match db.begin().await {
        Ok(t) => t,
        Err(e) => return render_error(&e.to_string()),
    };
    let inserted = user::ActiveModel {
        username: Set(username.clone()),
        password_hash: Set(hash_password(&form.password)),
        email: Set(email),
        role_id: Set(role_row.id),
        ref_id: Set(ref_id),
        created_at: Set(now_ts()),
        ..Default::default()
    }
    .insert(&txn)
    .await;

    match inserted {
        Ok(new_user) => {
            audit::record(
                &txn,
                &format!("Added user '{}'", username),
                "users",
                new_user.id as i64,
                principal.user_id,
            )
            .await;
            if let Err(e) = txn.commit().await {
                return render_error(&e.to_string());
            }
            redirect_with_message("/admin", "User added successfully")
        }
        Err(_) => redirect_with_error("/admin/add_user", "Username or Email already exists"),
    }
}

/// Manage users page (GET)
pub async fn manage_users_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Admin) {
        Ok(p) => p,
        Err(r) => return r,
    };
    let db = state.db.as_ref();

    let roles: HashMap<i32, String> = match role::Entity::find().all(db).await {
        Ok(rows) => rows.into_iter().map(|r| (r.id, r.role_name)).collect(),
        Err(e) => return render_error(&e.to_string()),
    };

    let users = match user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await
    {
        Ok(rows) => rows,
        Err(e) => return render_error(&e.to_string()),
    };

    let user_infos: Vec<UserInfo> = users
        .into_iter()
        .map(|u| UserInfo {
            id: u.id,
            username: u.username,
            email: u.email,
            role: roles.get(&u.role_id).cloned().unwrap_or_else(|| "unknown".to_string()),
            ref_id: u.ref_id,
        })
        .collect();

    let (canteens, ngos) = match ref_options(&state.db).await {
        Ok(v) => v,
        Err(e) => return render_error(&e.to_string()),
    };

    let mut context = base_context(&principal, &query);
    context.insert("users", &user_infos);
    context.insert("canteens", &canteens);
    context.insert("ngos", &ngos);

    render_template("admin_manage_users.html", &context)
}

/// Edit or delete a user (POST)
pub async fn manage_users_submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<ManageUserForm>,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Admin) {
        Ok(p) => p,
        Err(r) => return r,
    };
    let db = state.db.as_ref();

    let target = match user::Entity::find_by_id(form.user_id).one(db).await {
        Ok(Some(u)) => u,
        Ok(None) => return redirect_with_error("/admin/manage_users", "User not found"),
        Err(e) => return render_error(&e.to_string()),
    };

    let txn = match db.begin().await {
        Ok(t) => t,
        Err(e) => return render_error(&e.to_string()),
    };

    match form.action.as_str() {
        "delete" => {
            let username = target.username.clone();
            if let Err(e) = user::Entity::delete_by_id(form.user_id).exec(&txn).await {
                return render_error(&e.to_string());
            }
            audit::record(
                &txn,
                &format!("Deleted user '{}'", username),
                "users",
                form.user_id as i64,
                principal.user_id,
            )
            .await;
            if let Err(e) = txn.commit().await {
                return render_error(&e.to_string());
            }
            redirect_with_message("/admin/manage_users", "User deleted successfully")
        }
        "edit" => {
            let role = match form.role.as_deref().and_then(Role::parse) {
                Some(r) => r,
                None => return redirect_with_error("/admin/manage_users", "Unknown role"),
            };
            let ref_id = match resolve_ref_id(role, &form.canteen_id, &form.ngo_id) {
                Some(id) => id,
                None => {
                    return redirect_with_error(
                        "/admin/manage_users",
                        "Select a canteen or NGO for this role",
                    )
                }
            };
            let role_row = match role::Entity::find()
                .filter(role::Column::RoleName.eq(role.as_str()))
                .one(&txn)
                .await
            {
                Ok(Some(r)) => r,
                _ => return render_error("Role table is not seeded"),
            };

            let username = form.username.unwrap_or_default().trim().to_string();
            let email = form.email.unwrap_or_default().trim().to_string();
            if username.is_empty() || email.is_empty() {
                return redirect_with_error("/admin/manage_users", "Username and email are required");
            }

            let mut active: user::ActiveModel = target.into();
            active.username = Set(username.clone());
            active.email = Set(email);
            active.role_id = Set(role_row.id);
            active.ref_id = Set(ref_id);
            // Blank password field means "leave unchanged".
            if let Some(password) = form.password.as_deref().filter(|p| !p.is_empty()) {
                active.password_hash = Set(hash_password(password));
            }
            if active.update(&txn).await.is_err() {
                return redirect_with_error("/admin/manage_users", "Username or Email already exists");
            }

            audit::record(
                &txn,
                &format!("Updated user '{}'", username),
                "users",
                form.user_id as i64,
                principal.user_id,
            )
            .await;
            if let Err(e) = txn.commit().await {
                return render_error(&e.to_string());
            }
            redirect_with_message("/admin/manage_users", "Changes saved successfully")
        }
        _ => redirect_with_error("/admin/manage_users", "Unknown action"),
    }
}

/// Audit log row for display
#[derive(serde::Serialize)]
struct LogInfo {
    action: String,
    table_name: String,
    record_id: i64,
    performed_by: String,
    event_time: String,
}

/// Audit log view
pub async fn view_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Admin) {
        Ok(p) => p,
        Err(r) => return r,
    };
    let db = state.db.as_ref();

    let usernames = match username_map(db).await {
        Ok(m) => m,
        Err(e) => return render_error(&e.to_string()),
    };

    let logs = match audit_log::Entity::find()
        .order_by_desc(audit_log::Column::EventTime)
        .all(db)
        .await
    {
        Ok(rows) => rows,
        Err(e) => return render_error(&e.to_string()),
    };

    let log_infos: Vec<LogInfo> = logs
        .into_iter()
        .map(|l| LogInfo {
            action: l.action,
            table_name: l.table_name,
            record_id: l.record_id,
            performed_by: usernames
                .get(&l.performed_by)
                .cloned()
                .unwrap_or_else(|| format!("user #{}", l.performed_by)),
            event_time: format_relative_time(l.event_time),
        })
        .collect();

    let mut context = base_context(&principal, &query);
    context.insert("logs", &log_infos);
    render_template("admin_view_logs.html", &context)
}

/// Login activity row for display
#[derive(serde::Serialize)]
struct ActivityInfo {
    username: String,
    login_time: String,
    ip_address: String,
}

/// Login activity view
pub async fn view_activity(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Admin) {
        Ok(p) => p,
        Err(r) => return r,
    };
    let db = state.db.as_ref();

    let usernames = match username_map(db).await {
        Ok(m) => m,
        Err(e) => return render_error(&e.to_string()),
    };

    let activities = match login_activity::Entity::find()
        .order_by_desc(login_activity::Column::LoginTime)
        .all(db)
        .await
    {
        Ok(rows) => rows,
        Err(e) => return render_error(&e.to_string()),
    };

    let infos: Vec<ActivityInfo> = activities
        .into_iter()
        .map(|a| ActivityInfo {
            username: usernames
                .get(&a.user_id)
                .cloned()
                .unwrap_or_else(|| format!("user #{}", a.user_id)),
            login_time: format_datetime(a.login_time),
            ip_address: a.ip_address,
        })
        .collect();

    let mut context = base_context(&principal, &query);
    context.insert("activities", &infos);
    render_template("admin_view_activity.html", &context)
}

/// Waste report row for display
#[derive(serde::Serialize)]
struct ReportInfo {
    item_name: String,
    reporter: String,
    reason: String,
    quantity_wasted: i64,
    report_time: String,
}

/// Waste reports view
pub async fn view_reports(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Admin) {
        Ok(p) => p,
        Err(r) => return r,
    };
    let db = state.db.as_ref();

    let usernames = match username_map(db).await {
        Ok(m) => m,
        Err(e) => return render_error(&e.to_string()),
    };

    let reports = match waste_report::Entity::find()
        .order_by_desc(waste_report::Column::ReportTime)
        .all(db)
        .await
    {
        Ok(rows) => rows,
        Err(e) => return render_error(&e.to_string()),
    };

    let mut infos = Vec::new();
    for r in reports {
        // The food row may have been deleted once fully wasted.
        let item_name = food::Entity::find_by_id(r.food_id)
            .one(db)
            .await
            .ok()
            .flatten()
            .map(|f| f.item_name)
            .unwrap_or_else(|| format!("food #{}", r.food_id));

        infos.push(ReportInfo {
            item_name,
            reporter: usernames
                .get(&r.reported_by)
                .cloned()
                .unwrap_or_else(|| format!("user #{}", r.reported_by)),
            reason: r.reason,
            quantity_wasted: r.quantity_wasted,
            report_time: format_datetime(r.report_time),
        });
    }

    let mut context = base_context(&principal, &query);
    context.insert("reports", &infos);
    render_template("admin_view_reports.html", &context)
}

/// Leaderboard row for display
#[derive(serde::Serialize)]
struct LeaderboardInfo {
    canteen: String,
    total_items: i64,
    donated_items: i64,
    waste_score: i64,
}

/// Leaderboard view
pub async fn view_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Admin) {
        Ok(p) => p,
        Err(r) => return r,
    };
    let db = state.db.as_ref();

    let canteens: HashMap<i32, String> = match canteen::Entity::find().all(db).await {
        Ok(rows) => rows.into_iter().map(|c| (c.id, c.name)).collect(),
        Err(e) => return render_error(&e.to_string()),
    };

    let entries = match leaderboard::Entity::find()
        .order_by_desc(leaderboard::Column::WasteScore)
        .all(db)
        .await
    {
        Ok(rows) => rows,
        Err(e) => return render_error(&e.to_string()),
    };

    let infos: Vec<LeaderboardInfo> = entries
        .into_iter()
        .map(|l| LeaderboardInfo {
            canteen: canteens
                .get(&l.canteen_id)
                .cloned()
                .unwrap_or_else(|| format!("canteen #{}", l.canteen_id)),
            total_items: l.total_items,
            donated_items: l.donated_items,
            waste_score: l.waste_score,
        })
        .collect();

    let mut context = base_context(&principal, &query);
    context.insert("leaderboard", &infos);
    render_template("admin_view_leaderboard.html", &context)
}

/// Beneficiary record for display
#[derive(serde::Serialize)]
struct ImpactInfo {
    donation_id: i32,
    people_served: i64,
    location: String,
    recorded_time: String,
}

/// Impact view - beneficiary records across all donations
pub async fn impact(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Admin) {
        Ok(p) => p,
        Err(r) => return r,
    };
    let db = state.db.as_ref();

    let records = match meal_beneficiary::Entity::find()
        .order_by_desc(meal_beneficiary::Column::RecordedTime)
        .all(db)
        .await
    {
        Ok(rows) => rows,
        Err(e) => return render_error(&e.to_string()),
    };

    let infos: Vec<ImpactInfo> = records
        .into_iter()
        .map(|m| ImpactInfo {
            donation_id: m.donation_id,
            people_served: m.people_served,
            location: m.location,
            recorded_time: format_datetime(m.recorded_time),
        })
        .collect();

    let mut context = base_context(&principal, &query);
    context.insert("impact_data", &infos);
    render_template("admin_impact.html", &context)
}

async fn username_map(
    db: &sea_orm::DatabaseConnection,
) -> crate::error::Result<HashMap<i32, String>> {
    Ok(user::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect())
}
