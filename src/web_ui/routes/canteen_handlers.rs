//! Canteen route handlers: food listings, request decisions, waste reports.

use axum::{
    extract::{Form, Path, Query, State},
    http::HeaderMap,
    response::Response,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::audit;
use crate::auth::Role;
use crate::db::entities::{canteen, donation_request, food, leaderboard, ngo};
use crate::lifecycle::{self, now_ts, Decision, NewFood};
use crate::state::AppState;
use super::utils::{
    base_context, format_datetime, format_relative_time, parse_datetime_local,
    redirect_with_error, redirect_with_message, render_error, render_template, require_role,
};

/// Food row for the dashboard table
#[derive(serde::Serialize)]
struct FoodInfo {
    id: i32,
    item_name: String,
    category: String,
    quantity: i64,
    unit: String,
    expiry_time: String,
    expiry_class: String,
    status: String,
    notes: String,
}

/// How close to expiry a listing is, as a CSS class for the dashboard.
fn expiry_class(expiry_time: i64, now: i64) -> &'static str {
    let remaining = expiry_time - now;
    if remaining < 60 * 60 {
        "expiry-critical"
    } else if remaining < 3 * 60 * 60 {
        "expiry-warning"
    } else {
        ""
    }
}

/// Canteen dashboard: own listings ordered by expiry
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Canteen) {
        Ok(p) => p,
        Err(r) => return r,
    };
    let db = state.db.as_ref();

    let canteen_name = canteen::Entity::find_by_id(principal.ref_id)
        .one(db)
        .await
        .ok()
        .flatten()
        .map(|c| c.name)
        .unwrap_or_else(|| "Unknown canteen".to_string());

    let items = match food::Entity::find()
        .filter(food::Column::CanteenId.eq(principal.ref_id))
        .order_by_asc(food::Column::ExpiryTime)
        .all(db)
        .await
    {
        Ok(rows) => rows,
        Err(e) => return render_error(&e.to_string()),
    };

    let now = now_ts();
    let food_items: Vec<FoodInfo> = items
        .into_iter()
        .map(|f| FoodInfo {
            id: f.id,
            item_name: f.item_name,
            category: f.category,
            quantity: f.quantity,
            unit: f.unit,
            expiry_time: format_datetime(f.expiry_time),
            expiry_class: expiry_class(f.expiry_time, now).to_string(),
            status: f.status,
            notes: f.notes.unwrap_or_default(),
        })
        .collect();

    let mut context = base_context(&principal, &query);
    context.insert("canteen_name", &canteen_name);
    context.insert("food_items", &food_items);

    render_template("canteen_dashboard.html", &context)
}

/// Form for creating or editing a food listing
#[derive(serde::Deserialize)]
pub struct FoodForm {
    pub item_name: String,
    pub category: String,
    pub quantity: String,
    pub unit: String,
    pub expiry_time: String,
    pub notes: Option<String>,
}

impl FoodForm {
    /// Validate the raw form fields into a [`NewFood`].
    fn into_new_food(self) -> Result<NewFood, &'static str> {
        let quantity: i64 = self
            .quantity
            .trim()
            .parse()
            .map_err(|_| "Quantity must be a whole number")?;
        let expiry_time = parse_datetime_local(self.expiry_time.trim())
            .ok_or("Expiry time must be a valid date and time")?;
        Ok(NewFood {
            item_name: self.item_name.trim().to_string(),
            category: self.category.trim().to_string(),
            quantity,
            unit: self.unit.trim().to_string(),
            expiry_time,
            notes: self.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        })
    }
}

/// Add food page (GET)
pub async fn add_food_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Canteen) {
        Ok(p) => p,
        Err(r) => return r,
    };
    let context = base_context(&principal, &query);
    render_template("canteen_add_food.html", &context)
}

/// Add food (POST)
pub async fn add_food_submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<FoodForm>,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Canteen) {
        Ok(p) => p,
        Err(r) => return r,
    };

    let new = match form.into_new_food() {
        Ok(n) => n,
        Err(msg) => return redirect_with_error("/canteen/add_food", msg),
    };

    match lifecycle::add_food(&state.db, principal.ref_id, principal.user_id, new).await {
        Ok(_) => redirect_with_message("/canteen", "Food item added successfully"),
        Err(e) => redirect_with_error("/canteen/add_food", &e.to_string()),
    }
}

/// Donation request row for the management table
#[derive(serde::Serialize)]
struct RequestInfo {
    id: i32,
    item_name: String,
    ngo_name: String,
    request_time: String,
    status: String,
}

/// Manage requests page (GET)
pub async fn manage_requests_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Canteen) {
        Ok(p) => p,
        Err(r) => return r,
    };
    let db = state.db.as_ref();

    let own_food = match food::Entity::find()
        .filter(food::Column::CanteenId.eq(principal.ref_id))
        .all(db)
        .await
    {
        Ok(rows) => rows,
        Err(e) => return render_error(&e.to_string()),
    };
    let food_names: HashMap<i32, String> =
        own_food.iter().map(|f| (f.id, f.item_name.clone())).collect();
    let food_ids: Vec<i32> = own_food.iter().map(|f| f.id).collect();

    let ngo_names: HashMap<i32, String> = match ngo::Entity::find().all(db).await {
        Ok(rows) => rows.into_iter().map(|n| (n.id, n.name)).collect(),
        Err(e) => return render_error(&e.to_string()),
    };

    let requests = match donation_request::Entity::find()
        .filter(donation_request::Column::FoodId.is_in(food_ids))
        .order_by_desc(donation_request::Column::RequestTime)
        .all(db)
        .await
    {
        Ok(rows) => rows,
        Err(e) => return render_error(&e.to_string()),
    };

    let request_infos: Vec<RequestInfo> = requests
        .into_iter()
        .map(|r| RequestInfo {
            id: r.id,
            item_name: food_names
                .get(&r.food_id)
                .cloned()
                .unwrap_or_else(|| format!("food #{}", r.food_id)),
            ngo_name: ngo_names
                .get(&r.ngo_id)
                .cloned()
                .unwrap_or_else(|| format!("ngo #{}", r.ngo_id)),
            request_time: format_relative_time(r.request_time),
            status: r.status,
        })
        .collect();

    let mut context = base_context(&principal, &query);
    context.insert("requests", &request_infos);
    render_template("canteen_manage_requests.html", &context)
}

/// Form for deciding a donation request
#[derive(serde::Deserialize)]
pub struct DecideForm {
    pub request_id: i32,
    pub action: String,
}

/// Approve or reject a request (POST)
pub async fn manage_requests_submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<DecideForm>,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Canteen) {
        Ok(p) => p,
        Err(r) => return r,
    };

    let decision = match Decision::parse(&form.action) {
        Some(d) => d,
        None => return redirect_with_error("/canteen/manage_requests", "Unknown action"),
    };

    match lifecycle::decide_request(
        &state.db,
        form.request_id,
        principal.ref_id,
        decision,
        principal.user_id,
    )
    .await
    {
        Ok(status) => redirect_with_message(
            "/canteen/manage_requests",
            &format!("Request has been {}", status.as_str()),
        ),
        Err(e) => redirect_with_error("/canteen/manage_requests", &e.to_string()),
    }
}

/// Edit food page (GET)
pub async fn edit_food_page(
    State(state): State<Arc<AppState>>,
    Path(food_id): Path<i32>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Canteen) {
        Ok(p) => p,
        Err(r) => return r,
    };
    let db = state.db.as_ref();

    let item = match food::Entity::find_by_id(food_id)
        .filter(food::Column::CanteenId.eq(principal.ref_id))
        .one(db)
        .await
    {
        Ok(Some(f)) => f,
        _ => {
            return redirect_with_error(
                "/canteen",
                "Food item not found or you don't have permission to edit it",
            )
        }
    };

    let mut context = base_context(&principal, &query);
    context.insert("food_id", &item.id);
    context.insert("item_name", &item.item_name);
    context.insert("category", &item.category);
    context.insert("quantity", &item.quantity);
    context.insert("unit", &item.unit);
    context.insert(
        "expiry_time",
        &chrono::DateTime::from_timestamp(item.expiry_time, 0)
            .map(|dt| dt.format("%Y-%m-%dT%H:%M").to_string())
            .unwrap_or_default(),
    );
    context.insert("notes", &item.notes.unwrap_or_default());

    render_template("canteen_edit_food.html", &context)
}

/// Edit food (POST)
pub async fn edit_food_submit(
    State(state): State<Arc<AppState>>,
    Path(food_id): Path<i32>,
    headers: HeaderMap,
    Form(form): Form<FoodForm>,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Canteen) {
        Ok(p) => p,
        Err(r) => return r,
    };
    let db = state.db.as_ref();

    let item = match food::Entity::find_by_id(food_id)
        .filter(food::Column::CanteenId.eq(principal.ref_id))
        .one(db)
        .await
    {
        Ok(Some(f)) => f,
        _ => {
            return redirect_with_error(
                "/canteen",
                "Food item not found or you don't have permission to edit it",
            )
        }
    };

    let new = match form.into_new_food() {
        Ok(n) => n,
        Err(msg) => return redirect_with_error(&format!("/canteen/edit_food/{food_id}"), msg),
    };
    if new.item_name.is_empty() {
        return redirect_with_error(&format!("/canteen/edit_food/{food_id}"), "Item name is required");
    }
    if new.quantity <= 0 {
        return redirect_with_error(
            &format!("/canteen/edit_food/{food_id}"),
            "Quantity must be greater than zero",
        );
    }

    let txn = match db.begin().await {
        Ok(t) => t,
        Err(e) => return render_error(&e.to_string()),
    };

    let item_name = new.item_name.clone();
    let mut active: food::ActiveModel = item.into();
    active.item_name = Set(new.item_name);
    active.category = Set(new.category);
    active.quantity = Set(new.quantity);
    active.unit = Set(new.unit);
    active.expiry_time = Set(new.expiry_time);
    active.notes = Set(new.notes);
    if let Err(e) = active.update(&txn).await {
        return render_error(&e.to_string());
    }

    audit::record(
        &txn,
        &format!("Edited food '{}'", item_name),
        "food",
        food_id as i64,
        principal.user_id,
    )
    .await;
    if let Err(e) = txn.commit().await {
        return render_error(&e.to_string());
    }

    redirect_with_message("/canteen", &format!("'{}' updated successfully", item_name))
}

/// Delete food (POST)
pub async fn delete_food(
    State(state): State<Arc<AppState>>,
    Path(food_id): Path<i32>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Canteen) {
        Ok(p) => p,
        Err(r) => return r,
    };
    let db = state.db.as_ref();

    let item = match food::Entity::find_by_id(food_id)
        .filter(food::Column::CanteenId.eq(principal.ref_id))
        .one(db)
        .await
    {
        Ok(Some(f)) => f,
        _ => {
            return redirect_with_error(
                "/canteen",
                "Food item not found or you don't have permission to delete it",
            )
        }
    };

    let txn = match db.begin().await {
        Ok(t) => t,
        Err(e) => return render_error(&e.to_string()),
    };
    let item_name = item.item_name.clone();
    if let Err(e) = item.delete(&txn).await {
        return render_error(&e.to_string());
    }
    audit::record(
        &txn,
        &format!("Deleted food '{}'", item_name),
        "food",
        food_id as i64,
        principal.user_id,
    )
    .await;
    if let Err(e) = txn.commit().await {
        return render_error(&e.to_string());
    }

    redirect_with_message("/canteen", &format!("'{}' has been deleted", item_name))
}

/// Selectable food row for the waste report form
#[derive(serde::Serialize)]
struct WasteCandidate {
    id: i32,
    item_name: String,
    quantity: i64,
    unit: String,
    expiry_time: String,
}

/// Waste report page (GET)
pub async fn file_waste_report_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Canteen) {
        Ok(p) => p,
        Err(r) => return r,
    };
    let db = state.db.as_ref();

    let items = match food::Entity::find()
        .filter(food::Column::CanteenId.eq(principal.ref_id))
        .filter(food::Column::Status.eq("available"))
        .filter(food::Column::Quantity.gt(0))
        .order_by_asc(food::Column::ExpiryTime)
        .all(db)
        .await
    {
        Ok(rows) => rows,
        Err(e) => return render_error(&e.to_string()),
    };

    let available_food: Vec<WasteCandidate> = items
        .into_iter()
        .map(|f| WasteCandidate {
            id: f.id,
            item_name: f.item_name,
            quantity: f.quantity,
            unit: f.unit,
            expiry_time: format_datetime(f.expiry_time),
        })
        .collect();

    let mut context = base_context(&principal, &query);
    context.insert("available_food", &available_food);
    render_template("canteen_waste_report.html", &context)
}

/// Form for filing a waste report
#[derive(serde::Deserialize)]
pub struct WasteForm {
    pub food_id: i32,
    pub reason: String,
    pub quantity_wasted: String,
}

/// File a waste report (POST)
pub async fn file_waste_report_submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<WasteForm>,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Canteen) {
        Ok(p) => p,
        Err(r) => return r,
    };

    let quantity_wasted: i64 = match form.quantity_wasted.trim().parse() {
        Ok(q) => q,
        Err(_) => {
            return redirect_with_error(
                "/canteen/file_waste_report",
                "Wasted quantity must be a whole number",
            )
        }
    };

    match lifecycle::file_waste_report(
        &state.db,
        form.food_id,
        principal.ref_id,
        form.reason.trim().to_string(),
        quantity_wasted,
        principal.user_id,
    )
    .await
    {
        Ok(()) => redirect_with_message("/canteen", "Waste report filed successfully"),
        Err(e) => redirect_with_error("/canteen/file_waste_report", &e.to_string()),
    }
}

/// Ranked row for the canteen-facing leaderboard
#[derive(serde::Serialize)]
struct RankedCanteen {
    rank: usize,
    name: String,
    waste_score: i64,
    is_you: bool,
}

/// Canteen-facing leaderboard: own rank plus the top three
pub async fn view_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_role(&state, &headers, Role::Canteen) {
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

    let ranked: Vec<RankedCanteen> = entries
        .iter()
        .enumerate()
        .map(|(i, l)| RankedCanteen {
            rank: i + 1,
            name: canteens
                .get(&l.canteen_id)
                .cloned()
                .unwrap_or_else(|| format!("canteen #{}", l.canteen_id)),
            waste_score: l.waste_score,
            is_you: l.canteen_id == principal.ref_id,
        })
        .collect();

    let your_entry = ranked.iter().find(|r| r.is_you);
    let your_rank = your_entry.map(|r| r.rank);
    let your_score = your_entry.map(|r| r.waste_score);
    let top_canteens: Vec<&RankedCanteen> = ranked.iter().take(3).collect();

    let mut context = base_context(&principal, &query);
    context.insert("your_rank", &your_rank);
    context.insert("your_score", &your_score);
    context.insert("top_canteens", &top_canteens);
    render_template("canteen_leaderboard.html", &context)
}
