//! NGO route handlers: browsing surplus food, pickup requests, impact reports.

use axum::{
    extract::{Form, Query, State},
    http::HeaderMap,
    response::Response,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::Role;
use crate::db::entities::{canteen, donation_request, food, ngo};
use crate::lifecycle;
use crate::state::AppState;
use super::utils::{
    base_context, format_datetime, redirect_with_error, redirect_with_message, render_error,
    render_template, require_role,
};

/// Available listing for the NGO dashboard
#[derive(serde::Serialize)]
struct AvailableFood {
    id: i32,
    item_name: String,
    quantity: i64,
    unit: String,
    expiry_time: String,
    canteen_name: String,
}

/// NGO dashboard: all available food across canteens
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Ngo) {
        Ok(p) => p,
        Err(r) => return r,
    };
    let db = state.db.as_ref();

    let ngo_name = ngo::Entity::find_by_id(principal.ref_id)
        .one(db)
        .await
        .ok()
        .flatten()
        .map(|n| n.name)
        .unwrap_or_else(|| "Unknown NGO".to_string());

    let canteens: HashMap<i32, String> = match canteen::Entity::find().all(db).await {
        Ok(rows) => rows.into_iter().map(|c| (c.id, c.name)).collect(),
        Err(e) => return render_error(&e.to_string()),
    };

    let items = match food::Entity::find()
        .filter(food::Column::Status.eq("available"))
        .filter(food::Column::Quantity.gt(0))
        .order_by_asc(food::Column::ExpiryTime)
        .all(db)
        .await
    {
        Ok(rows) => rows,
        Err(e) => return render_error(&e.to_string()),
    };

    let available_food: Vec<AvailableFood> = items
        .into_iter()
        .map(|f| AvailableFood {
            id: f.id,
            item_name: f.item_name,
            quantity: f.quantity,
            unit: f.unit,
            expiry_time: format_datetime(f.expiry_time),
            canteen_name: canteens
                .get(&f.canteen_id)
                .cloned()
                .unwrap_or_else(|| format!("canteen #{}", f.canteen_id)),
        })
        .collect();

    let mut context = base_context(&principal, &query);
    context.insert("ngo_name", &ngo_name);
    context.insert("available_food", &available_food);
    render_template("ngo_dashboard.html", &context)
}

/// Form for requesting a pickup
#[derive(serde::Deserialize)]
pub struct RequestForm {
    pub food_id: i32,
}

/// Request pickup of a food item (POST)
pub async fn request_pickup(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<RequestForm>,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Ngo) {
        Ok(p) => p,
        Err(r) => return r,
    };

    match lifecycle::request_pickup(&state.db, form.food_id, principal.ref_id, principal.user_id)
        .await
    {
        Ok(_) => redirect_with_message("/ngo", "Request sent successfully"),
        Err(e) => redirect_with_error("/ngo", &e.to_string()),
    }
}

/// Past request row for the history table
#[derive(serde::Serialize)]
struct HistoryInfo {
    request_id: i32,
    item_name: String,
    canteen_name: String,
    request_time: String,
    status: String,
}

/// Donation history for this NGO
pub async fn history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Ngo) {
        Ok(p) => p,
        Err(r) => return r,
    };
    let db = state.db.as_ref();

    let canteens: HashMap<i32, String> = match canteen::Entity::find().all(db).await {
        Ok(rows) => rows.into_iter().map(|c| (c.id, c.name)).collect(),
        Err(e) => return render_error(&e.to_string()),
    };

    let requests = match donation_request::Entity::find()
        .filter(donation_request::Column::NgoId.eq(principal.ref_id))
        .order_by_desc(donation_request::Column::RequestTime)
        .all(db)
        .await
    {
        Ok(rows) => rows,
        Err(e) => return render_error(&e.to_string()),
    };

    let mut history = Vec::new();
    for r in requests {
        let (item_name, canteen_name) = match food::Entity::find_by_id(r.food_id).one(db).await {
            Ok(Some(f)) => {
                let canteen_name = canteens
                    .get(&f.canteen_id)
                    .cloned()
                    .unwrap_or_else(|| format!("canteen #{}", f.canteen_id));
                (f.item_name, canteen_name)
            }
            // The food row is gone once fully wasted.
            _ => (format!("food #{}", r.food_id), "-".to_string()),
        };
        history.push(HistoryInfo {
            request_id: r.id,
            item_name,
            canteen_name,
            request_time: format_datetime(r.request_time),
            status: r.status,
        });
    }

    let mut context = base_context(&principal, &query);
    context.insert("history", &history);
    render_template("ngo_history.html", &context)
}

/// Approved donation awaiting an impact report
#[derive(serde::Serialize)]
struct PendingImpact {
    donation_id: i32,
    item_name: String,
    canteen_name: String,
    approved_time: String,
}

/// Record beneficiaries page (GET): approved requests for this NGO
pub async fn record_beneficiaries_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Ngo) {
        Ok(p) => p,
        Err(r) => return r,
    };
    let db = state.db.as_ref();

    let canteens: HashMap<i32, String> = match canteen::Entity::find().all(db).await {
        Ok(rows) => rows.into_iter().map(|c| (c.id, c.name)).collect(),
        Err(e) => return render_error(&e.to_string()),
    };

    let requests = match donation_request::Entity::find()
        .filter(donation_request::Column::NgoId.eq(principal.ref_id))
        .filter(donation_request::Column::Status.eq("approved"))
        .order_by_desc(donation_request::Column::ApprovedTime)
        .all(db)
        .await
    {
        Ok(rows) => rows,
        Err(e) => return render_error(&e.to_string()),
    };

    let mut completed_donations = Vec::new();
    for r in requests {
        let (item_name, canteen_name) = match food::Entity::find_by_id(r.food_id).one(db).await {
            Ok(Some(f)) => {
                let canteen_name = canteens
                    .get(&f.canteen_id)
                    .cloned()
                    .unwrap_or_else(|| format!("canteen #{}", f.canteen_id));
                (f.item_name, canteen_name)
            }
            _ => (format!("food #{}", r.food_id), "-".to_string()),
        };
        completed_donations.push(PendingImpact {
            donation_id: r.id,
            item_name,
            canteen_name,
            approved_time: r.approved_time.map(format_datetime).unwrap_or_default(),
        });
    }

    let mut context = base_context(&principal, &query);
    context.insert("completed_donations", &completed_donations);
    render_template("ngo_record_beneficiaries.html", &context)
}

/// Form for recording beneficiaries
#[derive(serde::Deserialize)]
pub struct BeneficiaryForm {
    pub donation_id: i32,
    pub people_served: String,
    pub location: String,
}

/// Record beneficiaries (POST)
pub async fn record_beneficiaries_submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<BeneficiaryForm>,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Ngo) {
        Ok(p) => p,
        Err(r) => return r,
    };

    let people_served: i64 = match form.people_served.trim().parse() {
        Ok(n) => n,
        Err(_) => {
            return redirect_with_error(
                "/ngo/record_beneficiaries",
                "People served must be a whole number",
            )
        }
    };

    match lifecycle::record_beneficiaries(
        &state.db,
        form.donation_id,
        principal.ref_id,
        people_served,
        form.location.trim().to_string(),
        principal.user_id,
    )
    .await
    {
        Ok(()) => redirect_with_message("/ngo/history", "Impact report submitted successfully"),
        Err(e) => redirect_with_error("/ngo/record_beneficiaries", &e.to_string()),
    }
}
