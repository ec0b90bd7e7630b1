//! Database module for SQLite persistence using SeaORM

pub mod entities;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use std::path::Path;

/// Initialize database connection and create tables
pub async fn init_database(db_path: &Path) -> Result<DatabaseConnection, DbErr> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
    tracing::info!("Connecting to database: {}", db_url);

    let db = Database::connect(&db_url).await?;

    create_tables(&db).await?;
    seed_roles(&db).await?;

    Ok(db)
}

/// Create all tables if they don't exist
pub async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS roles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            role_name TEXT NOT NULL UNIQUE
        )
        "#.to_string(),
    )).await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            role_id INTEGER NOT NULL,
            ref_id INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (role_id) REFERENCES roles(id)
        )
        "#.to_string(),
    )).await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS canteen (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            location TEXT
        )
        "#.to_string(),
    )).await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS ngo (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            contact TEXT
        )
        "#.to_string(),
    )).await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS food (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            canteen_id INTEGER NOT NULL,
            item_name TEXT NOT NULL,
            category TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            unit TEXT NOT NULL,
            expiry_time INTEGER NOT NULL,
            notes TEXT,
            status TEXT NOT NULL DEFAULT 'available',
            created_at INTEGER NOT NULL,
            FOREIGN KEY (canteen_id) REFERENCES canteen(id) ON DELETE CASCADE
        )
        "#.to_string(),
    )).await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"CREATE INDEX IF NOT EXISTS idx_food_canteen ON food(canteen_id)"#.to_string(),
    )).await?;
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"CREATE INDEX IF NOT EXISTS idx_food_status ON food(status)"#.to_string(),
    )).await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS donation_request (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            food_id INTEGER NOT NULL,
            ngo_id INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            request_time INTEGER NOT NULL,
            approved_by INTEGER,
            approved_time INTEGER,
            FOREIGN KEY (ngo_id) REFERENCES ngo(id) ON DELETE CASCADE
        )
        "#.to_string(),
    )).await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"CREATE INDEX IF NOT EXISTS idx_request_food ON donation_request(food_id)"#.to_string(),
    )).await?;
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"CREATE INDEX IF NOT EXISTS idx_request_ngo ON donation_request(ngo_id)"#.to_string(),
    )).await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS leaderboard (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            canteen_id INTEGER NOT NULL UNIQUE,
            total_items INTEGER NOT NULL DEFAULT 0,
            donated_items INTEGER NOT NULL DEFAULT 0,
            waste_score INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (canteen_id) REFERENCES canteen(id) ON DELETE CASCADE
        )
        "#.to_string(),
    )).await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS waste_report (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            food_id INTEGER NOT NULL,
            reported_by INTEGER NOT NULL,
            reason TEXT NOT NULL,
            quantity_wasted INTEGER NOT NULL,
            report_time INTEGER NOT NULL
        )
        "#.to_string(),
    )).await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS meal_beneficiary (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            donation_id INTEGER NOT NULL,
            people_served INTEGER NOT NULL,
            location TEXT NOT NULL,
            recorded_time INTEGER NOT NULL,
            FOREIGN KEY (donation_id) REFERENCES donation_request(id) ON DELETE CASCADE
        )
        "#.to_string(),
    )).await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS audit_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            action TEXT NOT NULL,
            table_name TEXT NOT NULL,
            record_id INTEGER NOT NULL,
            performed_by INTEGER NOT NULL,
            event_time INTEGER NOT NULL
        )
        "#.to_string(),
    )).await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS login_activity (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            login_time INTEGER NOT NULL,
            ip_address TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        )
        "#.to_string(),
    )).await?;

    tracing::info!("Database tables initialized");
    Ok(())
}

/// Seed the three fixed roles if missing
pub async fn seed_roles(db: &DatabaseConnection) -> Result<(), DbErr> {
    for role_name in ["admin", "canteen", "ngo"] {
        db.execute(Statement::from_sql_and_values(
            db.get_database_backend(),
            "INSERT OR IGNORE INTO roles (role_name) VALUES (?)",
            [role_name.into()],
        )).await?;
    }
    Ok(())
}
