//! Donation lifecycle workflow.
//!
//! Each operation here is one food-donation state transition together with
//! every row it touches: the food item, the donation request, the canteen's
//! leaderboard counters, and the audit trail. An operation runs inside a
//! single transaction, so a failure in any step rolls the whole mutation
//! back. The audit insert is the one exception: it happens inside the same
//! transaction but its failure is swallowed and never aborts the workflow.

pub mod status;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    ModelTrait, QueryFilter, Set, TransactionTrait,
};

use crate::audit;
use crate::db::entities::{donation_request, food, leaderboard, meal_beneficiary, waste_report};
use crate::error::{AppError, Result};

pub use status::{Decision, FoodStatus, RequestStatus};
use status::{food_transition, request_transition, FoodAction, RequestAction};

/// Unix timestamp in seconds.
pub fn now_ts() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Form fields for a new food listing.
pub struct NewFood {
    pub item_name: String,
    pub category: String,
    pub quantity: i64,
    pub unit: String,
    pub expiry_time: i64,
    pub notes: Option<String>,
}

/// Create a food item with status `available` and add its quantity to the
/// canteen's cumulative `total_items`.
pub async fn add_food(
    db: &DatabaseConnection,
    canteen_id: i32,
    actor: i32,
    new: NewFood,
) -> Result<food::Model> {
    if new.item_name.trim().is_empty() {
        return Err(AppError::Validation("Item name is required".to_string()));
    }
    if new.quantity <= 0 {
        return Err(AppError::Validation(
            "Quantity must be greater than zero".to_string(),
        ));
    }

    let txn = db.begin().await?;

    let item = food::ActiveModel {
        canteen_id: Set(canteen_id),
        item_name: Set(new.item_name),
        category: Set(new.category),
        quantity: Set(new.quantity),
        unit: Set(new.unit),
        expiry_time: Set(new.expiry_time),
        notes: Set(new.notes),
        status: Set(FoodStatus::Available.as_str().to_string()),
        created_at: Set(now_ts()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    bump_leaderboard(&txn, canteen_id, item.quantity, 0).await?;

    audit::record(
        &txn,
        &format!("Added food '{}'", item.item_name),
        "food",
        item.id as i64,
        actor,
    )
    .await;

    txn.commit().await?;
    Ok(item)
}

/// File an NGO's pickup request against an available food item.
///
/// A (food, ngo) pair may only ever request once; the item must currently be
/// `available`.
pub async fn request_pickup(
    db: &DatabaseConnection,
    food_id: i32,
    ngo_id: i32,
    actor: i32,
) -> Result<donation_request::Model> {
    let txn = db.begin().await?;

    let item = food::Entity::find_by_id(food_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Food item not found".to_string()))?;

    let existing = donation_request::Entity::find()
        .filter(donation_request::Column::FoodId.eq(food_id))
        .filter(donation_request::Column::NgoId.eq(ngo_id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "You have already requested this item".to_string(),
        ));
    }

    let next = food_transition(&item.status, FoodAction::Reserve)?;

    let request = donation_request::ActiveModel {
        food_id: Set(food_id),
        ngo_id: Set(ngo_id),
        status: Set(RequestStatus::Pending.as_str().to_string()),
        request_time: Set(now_ts()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut item: food::ActiveModel = item.into();
    item.status = Set(next.as_str().to_string());
    item.update(&txn).await?;

    audit::record(
        &txn,
        &format!("NGO request for food {food_id}"),
        "donation_request",
        request.id as i64,
        actor,
    )
    .await;

    txn.commit().await?;
    Ok(request)
}

/// Approve or reject a pending donation request on behalf of the canteen
/// that owns the food item.
///
/// The request is re-read inside the transaction, so a request decided by a
/// concurrent call fails here instead of being decided twice.
pub async fn decide_request(
    db: &DatabaseConnection,
    request_id: i32,
    canteen_id: i32,
    decision: Decision,
    actor: i32,
) -> Result<RequestStatus> {
    let txn = db.begin().await?;

    let request = donation_request::Entity::find_by_id(request_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Donation request not found".to_string()))?;

    let item = food::Entity::find_by_id(request.food_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Food item not found".to_string()))?;
    if item.canteen_id != canteen_id {
        return Err(AppError::NotFound("Donation request not found".to_string()));
    }

    let (request_action, food_action) = match decision {
        Decision::Approve => (RequestAction::Approve, FoodAction::Approve),
        Decision::Reject => (RequestAction::Reject, FoodAction::Release),
    };
    let next_request = request_transition(&request.status, request_action)?;
    let next_food = food_transition(&item.status, food_action)?;

    let now = now_ts();
    let mut request: donation_request::ActiveModel = request.into();
    request.status = Set(next_request.as_str().to_string());
    request.approved_by = Set(Some(actor));
    request.approved_time = Set(Some(now));
    request.update(&txn).await?;

    let mut item: food::ActiveModel = item.into();
    item.status = Set(next_food.as_str().to_string());
    item.update(&txn).await?;

    audit::record(
        &txn,
        &format!("Request {request_id} was {}", next_request.as_str()),
        "donation_request",
        request_id as i64,
        actor,
    )
    .await;

    txn.commit().await?;
    Ok(next_request)
}

/// Record a wasted quantity against a food item owned by the canteen,
/// subtracting it from the remaining quantity. The item is removed entirely
/// once its quantity reaches zero.
pub async fn file_waste_report(
    db: &DatabaseConnection,
    food_id: i32,
    canteen_id: i32,
    reason: String,
    quantity_wasted: i64,
    actor: i32,
) -> Result<()> {
    if quantity_wasted <= 0 {
        return Err(AppError::Validation(
            "Wasted quantity must be greater than zero".to_string(),
        ));
    }

    let txn = db.begin().await?;

    let item = food::Entity::find_by_id(food_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Food item not found".to_string()))?;
    if item.canteen_id != canteen_id {
        return Err(AppError::NotFound("Food item not found".to_string()));
    }
    if quantity_wasted > item.quantity {
        return Err(AppError::Validation(
            "Cannot report more waste than available quantity".to_string(),
        ));
    }

    let report = waste_report::ActiveModel {
        food_id: Set(food_id),
        reported_by: Set(actor),
        reason: Set(reason),
        quantity_wasted: Set(quantity_wasted),
        report_time: Set(now_ts()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let remaining = item.quantity - quantity_wasted;
    if remaining == 0 {
        item.delete(&txn).await?;
    } else {
        let mut item: food::ActiveModel = item.into();
        item.quantity = Set(remaining);
        item.update(&txn).await?;
    }

    audit::record(
        &txn,
        &format!("Filed waste report for food {food_id}"),
        "waste_report",
        report.id as i64,
        actor,
    )
    .await;

    txn.commit().await?;
    Ok(())
}

/// Record the people served by an approved donation, completing the request,
/// marking the food donated, and crediting the canteen's `donated_items`
/// with the quantity captured at donation time.
pub async fn record_beneficiaries(
    db: &DatabaseConnection,
    request_id: i32,
    ngo_id: i32,
    people_served: i64,
    location: String,
    actor: i32,
) -> Result<()> {
    if people_served <= 0 {
        return Err(AppError::Validation(
            "People served must be greater than zero".to_string(),
        ));
    }
    if location.trim().is_empty() {
        return Err(AppError::Validation("Location is required".to_string()));
    }

    let txn = db.begin().await?;

    let request = donation_request::Entity::find_by_id(request_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Donation request not found".to_string()))?;
    if request.ngo_id != ngo_id {
        return Err(AppError::NotFound("Donation request not found".to_string()));
    }

    let next_request = request_transition(&request.status, RequestAction::Complete)?;

    let item = food::Entity::find_by_id(request.food_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            AppError::NotFound("Food item for this donation no longer exists".to_string())
        })?;
    let next_food = food_transition(&item.status, FoodAction::Donate)?;

    let donated_quantity = item.quantity;
    let canteen_id = item.canteen_id;

    let beneficiary = meal_beneficiary::ActiveModel {
        donation_id: Set(request_id),
        people_served: Set(people_served),
        location: Set(location),
        recorded_time: Set(now_ts()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut request: donation_request::ActiveModel = request.into();
    request.status = Set(next_request.as_str().to_string());
    request.update(&txn).await?;

    let mut item: food::ActiveModel = item.into();
    item.status = Set(next_food.as_str().to_string());
    item.update(&txn).await?;

    bump_leaderboard(&txn, canteen_id, 0, donated_quantity).await?;

    audit::record(
        &txn,
        &format!("Recorded beneficiaries for request {request_id}"),
        "meal_beneficiary",
        beneficiary.id as i64,
        actor,
    )
    .await;

    txn.commit().await?;
    Ok(())
}

/// Add to a canteen's counters and recompute its waste score, creating the
/// leaderboard row on first use. Always called inside the transaction of the
/// mutation that changed the counters.
async fn bump_leaderboard(
    txn: &DatabaseTransaction,
    canteen_id: i32,
    added: i64,
    donated: i64,
) -> Result<()> {
    let row = leaderboard::Entity::find()
        .filter(leaderboard::Column::CanteenId.eq(canteen_id))
        .one(txn)
        .await?;

    let (total, done) = match &row {
        Some(r) => (r.total_items + added, r.donated_items + donated),
        None => (added, donated),
    };
    let score = if total > 0 { done * 100 / total } else { 0 };

    match row {
        Some(r) => {
            let mut r: leaderboard::ActiveModel = r.into();
            r.total_items = Set(total);
            r.donated_items = Set(done);
            r.waste_score = Set(score);
            r.update(txn).await?;
        }
        None => {
            leaderboard::ActiveModel {
                canteen_id: Set(canteen_id),
                total_items: Set(total),
                donated_items: Set(done),
                waste_score: Set(score),
                ..Default::default()
            }
            .insert(txn)
            .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ConnectOptions, Database};

    use crate::db::entities::{canteen, ngo};

    async fn test_db() -> DatabaseConnection {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1);
        let db = Database::connect(opt).await.unwrap();
        crate::db::create_tables(&db).await.unwrap();
        crate::db::seed_roles(&db).await.unwrap();
        db
    }

    async fn seed_canteen(db: &DatabaseConnection, name: &str) -> i32 {
        canteen::ActiveModel {
            name: Set(name.to_string()),
            location: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
        .id
    }

    async fn seed_ngo(db: &DatabaseConnection, name: &str) -> i32 {
        ngo::ActiveModel {
            name: Set(name.to_string()),
            contact: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
        .id
    }

    fn sample_food(quantity: i64) -> NewFood {
        NewFood {
            item_name: "Vegetable biryani".to_string(),
            category: "cooked".to_string(),
            quantity,
            unit: "kg".to_string(),
            expiry_time: now_ts() + 3600,
            notes: None,
        }
    }

    async fn leaderboard_row(db: &DatabaseConnection, canteen_id: i32) -> leaderboard::Model {
        leaderboard::Entity::find()
            .filter(leaderboard::Column::CanteenId.eq(canteen_id))
            .one(db)
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn add_food_creates_item_and_counts_it() {
        let db = test_db().await;
        let canteen_id = seed_canteen(&db, "North Mess").await;

        let item = add_food(&db, canteen_id, 1, sample_food(10)).await.unwrap();
        assert_eq!(item.status, "available");
        assert_eq!(item.quantity, 10);

        let lb = leaderboard_row(&db, canteen_id).await;
        assert_eq!(lb.total_items, 10);
        assert_eq!(lb.donated_items, 0);
        assert_eq!(lb.waste_score, 0);
    }

    #[tokio::test]
    async fn add_food_rejects_non_positive_quantity() {
        let db = test_db().await;
        let canteen_id = seed_canteen(&db, "North Mess").await;

        let err = add_food(&db, canteen_id, 1, sample_food(0)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(food::Entity::find().one(&db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn full_donation_scenario() {
        let db = test_db().await;
        let canteen_id = seed_canteen(&db, "North Mess").await;
        let ngo_id = seed_ngo(&db, "Helping Hands").await;

        let item = add_food(&db, canteen_id, 1, sample_food(10)).await.unwrap();
        assert_eq!(leaderboard_row(&db, canteen_id).await.total_items, 10);

        let request = request_pickup(&db, item.id, ngo_id, 2).await.unwrap();
        assert_eq!(request.status, "pending");
        let item_now = food::Entity::find_by_id(item.id).one(&db).await.unwrap().unwrap();
        assert_eq!(item_now.status, "requested");

        let decided = decide_request(&db, request.id, canteen_id, Decision::Approve, 1)
            .await
            .unwrap();
        assert_eq!(decided, RequestStatus::Approved);
        let item_now = food::Entity::find_by_id(item.id).one(&db).await.unwrap().unwrap();
        assert_eq!(item_now.status, "approved");
        let request_now = donation_request::Entity::find_by_id(request.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(request_now.status, "approved");
        assert_eq!(request_now.approved_by, Some(1));

        record_beneficiaries(&db, request.id, ngo_id, 25, "Shelter A".to_string(), 2)
            .await
            .unwrap();

        let item_now = food::Entity::find_by_id(item.id).one(&db).await.unwrap().unwrap();
        assert_eq!(item_now.status, "donated");
        let request_now = donation_request::Entity::find_by_id(request.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(request_now.status, "completed");

        let lb = leaderboard_row(&db, canteen_id).await;
        assert_eq!(lb.total_items, 10);
        assert_eq!(lb.donated_items, 10);
        assert_eq!(lb.waste_score, 100);

        let beneficiary = meal_beneficiary::Entity::find().one(&db).await.unwrap().unwrap();
        assert_eq!(beneficiary.donation_id, request.id);
        assert_eq!(beneficiary.people_served, 25);
    }

    #[tokio::test]
    async fn duplicate_request_is_rejected() {
        let db = test_db().await;
        let canteen_id = seed_canteen(&db, "North Mess").await;
        let ngo_id = seed_ngo(&db, "Helping Hands").await;

        let item = add_food(&db, canteen_id, 1, sample_food(5)).await.unwrap();
        request_pickup(&db, item.id, ngo_id, 2).await.unwrap();

        let err = request_pickup(&db, item.id, ngo_id, 2).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let count = donation_request::Entity::find().all(&db).await.unwrap().len();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn request_requires_available_food() {
        let db = test_db().await;
        let canteen_id = seed_canteen(&db, "North Mess").await;
        let ngo_a = seed_ngo(&db, "Helping Hands").await;
        let ngo_b = seed_ngo(&db, "Food Angels").await;

        let item = add_food(&db, canteen_id, 1, sample_food(5)).await.unwrap();
        request_pickup(&db, item.id, ngo_a, 2).await.unwrap();

        // A different NGO passes the duplicate guard but the item is no
        // longer available.
        let err = request_pickup(&db, item.id, ngo_b, 3).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn request_against_missing_food_is_not_found() {
        let db = test_db().await;
        seed_canteen(&db, "North Mess").await;
        let ngo_id = seed_ngo(&db, "Helping Hands").await;

        let err = request_pickup(&db, 999, ngo_id, 2).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn decide_twice_fails_second_time() {
        let db = test_db().await;
        let canteen_id = seed_canteen(&db, "North Mess").await;
        let ngo_id = seed_ngo(&db, "Helping Hands").await;

        let item = add_food(&db, canteen_id, 1, sample_food(5)).await.unwrap();
        let request = request_pickup(&db, item.id, ngo_id, 2).await.unwrap();

        decide_request(&db, request.id, canteen_id, Decision::Approve, 1)
            .await
            .unwrap();
        let err = decide_request(&db, request.id, canteen_id, Decision::Approve, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn decide_checks_canteen_ownership() {
        let db = test_db().await;
        let canteen_id = seed_canteen(&db, "North Mess").await;
        let other_canteen = seed_canteen(&db, "South Mess").await;
        let ngo_id = seed_ngo(&db, "Helping Hands").await;

        let item = add_food(&db, canteen_id, 1, sample_food(5)).await.unwrap();
        let request = request_pickup(&db, item.id, ngo_id, 2).await.unwrap();

        let err = decide_request(&db, request.id, other_canteen, Decision::Approve, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let request_now = donation_request::Entity::find_by_id(request.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(request_now.status, "pending");
    }

    #[tokio::test]
    async fn reject_releases_the_item() {
        let db = test_db().await;
        let canteen_id = seed_canteen(&db, "North Mess").await;
        let ngo_id = seed_ngo(&db, "Helping Hands").await;

        let item = add_food(&db, canteen_id, 1, sample_food(5)).await.unwrap();
        let request = request_pickup(&db, item.id, ngo_id, 2).await.unwrap();

        let decided = decide_request(&db, request.id, canteen_id, Decision::Reject, 1)
            .await
            .unwrap();
        assert_eq!(decided, RequestStatus::Rejected);

        let item_now = food::Entity::find_by_id(item.id).one(&db).await.unwrap().unwrap();
        assert_eq!(item_now.status, "available");
    }

    #[tokio::test]
    async fn waste_report_subtracts_and_deletes_at_zero() {
        let db = test_db().await;
        let canteen_id = seed_canteen(&db, "North Mess").await;

        let item = add_food(&db, canteen_id, 1, sample_food(5)).await.unwrap();

        file_waste_report(&db, item.id, canteen_id, "spoiled".to_string(), 3, 1)
            .await
            .unwrap();
        let item_now = food::Entity::find_by_id(item.id).one(&db).await.unwrap().unwrap();
        assert_eq!(item_now.quantity, 2);

        file_waste_report(&db, item.id, canteen_id, "spoiled".to_string(), 2, 1)
            .await
            .unwrap();
        assert!(food::Entity::find_by_id(item.id).one(&db).await.unwrap().is_none());

        // The item is gone, so a further report fails with not-found.
        let err = file_waste_report(&db, item.id, canteen_id, "spoiled".to_string(), 1, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let reports = waste_report::Entity::find().all(&db).await.unwrap();
        assert_eq!(reports.len(), 2);
    }

    #[tokio::test]
    async fn waste_report_rejects_excess_quantity() {
        let db = test_db().await;
        let canteen_id = seed_canteen(&db, "North Mess").await;

        let item = add_food(&db, canteen_id, 1, sample_food(5)).await.unwrap();
        let err = file_waste_report(&db, item.id, canteen_id, "spoiled".to_string(), 6, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let item_now = food::Entity::find_by_id(item.id).one(&db).await.unwrap().unwrap();
        assert_eq!(item_now.quantity, 5);
        assert!(waste_report::Entity::find().one(&db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn beneficiaries_require_an_approved_request() {
        let db = test_db().await;
        let canteen_id = seed_canteen(&db, "North Mess").await;
        let ngo_id = seed_ngo(&db, "Helping Hands").await;

        let item = add_food(&db, canteen_id, 1, sample_food(10)).await.unwrap();
        let request = request_pickup(&db, item.id, ngo_id, 2).await.unwrap();

        // Still pending: the whole operation must leave no trace behind.
        let err = record_beneficiaries(&db, request.id, ngo_id, 25, "Shelter A".to_string(), 2)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));

        assert!(meal_beneficiary::Entity::find().one(&db).await.unwrap().is_none());
        assert_eq!(leaderboard_row(&db, canteen_id).await.donated_items, 0);
        let item_now = food::Entity::find_by_id(item.id).one(&db).await.unwrap().unwrap();
        assert_eq!(item_now.status, "requested");
    }

    #[tokio::test]
    async fn beneficiaries_recorded_once() {
        let db = test_db().await;
        let canteen_id = seed_canteen(&db, "North Mess").await;
        let ngo_id = seed_ngo(&db, "Helping Hands").await;

        let item = add_food(&db, canteen_id, 1, sample_food(10)).await.unwrap();
        let request = request_pickup(&db, item.id, ngo_id, 2).await.unwrap();
        decide_request(&db, request.id, canteen_id, Decision::Approve, 1)
            .await
            .unwrap();

        record_beneficiaries(&db, request.id, ngo_id, 25, "Shelter A".to_string(), 2)
            .await
            .unwrap();
        let err = record_beneficiaries(&db, request.id, ngo_id, 30, "Shelter B".to_string(), 2)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));

        // No double-increment of the donated counter.
        let lb = leaderboard_row(&db, canteen_id).await;
        assert_eq!(lb.donated_items, 10);
        let rows = meal_beneficiary::Entity::find().all(&db).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn waste_score_tracks_donated_share() {
        let db = test_db().await;
        let canteen_id = seed_canteen(&db, "North Mess").await;
        let ngo_id = seed_ngo(&db, "Helping Hands").await;

        let first = add_food(&db, canteen_id, 1, sample_food(10)).await.unwrap();
        add_food(&db, canteen_id, 1, sample_food(10)).await.unwrap();

        let request = request_pickup(&db, first.id, ngo_id, 2).await.unwrap();
        decide_request(&db, request.id, canteen_id, Decision::Approve, 1)
            .await
            .unwrap();
        record_beneficiaries(&db, request.id, ngo_id, 12, "Shelter A".to_string(), 2)
            .await
            .unwrap();

        let lb = leaderboard_row(&db, canteen_id).await;
        assert_eq!(lb.total_items, 20);
        assert_eq!(lb.donated_items, 10);
        assert_eq!(lb.waste_score, 50);
    }
}
