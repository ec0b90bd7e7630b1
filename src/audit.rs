//! Best-effort audit trail.
//!
//! An audit row rides inside the transaction of the mutation it describes,
//! but a failed insert is only logged: auditing must never abort the
//! workflow that triggered it.

use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};

use crate::db::entities::audit_log;
use crate::lifecycle::now_ts;

/// Record who did what to which row.
pub async fn record<C: ConnectionTrait>(
    conn: &C,
    action: &str,
    table_name: &str,
    record_id: i64,
    performed_by: i32,
) {
    let entry = audit_log::ActiveModel {
        action: Set(action.to_string()),
        table_name: Set(table_name.to_string()),
        record_id: Set(record_id),
        performed_by: Set(performed_by),
        event_time: Set(now_ts()),
        ..Default::default()
    };

    if let Err(e) = entry.insert(conn).await {
        tracing::warn!("Audit log write failed: {}", e);
    }
}
