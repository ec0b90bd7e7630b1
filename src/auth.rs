//! Authentication and authorization module.
//!
//! Accounts live in the `users` table; sessions are opaque tokens held in
//! memory and handed out as cookies. Every request resolves its token to a
//! [`Principal`] carrying the user's role and the canteen/NGO row the
//! account belongs to.

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use parking_lot::RwLock;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use sha2::{Digest, Sha256};

use crate::db::entities::{login_activity, role, user};
use crate::error::{AppError, Result};
use crate::lifecycle::now_ts;

/// The three account roles.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Role {
    Admin,
    Canteen,
    Ngo,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Canteen => "canteen",
            Role::Ngo => "ngo",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "canteen" => Some(Role::Canteen),
            "ngo" => Some(Role::Ngo),
            _ => None,
        }
    }

    /// Dashboard route for this role.
    pub fn home(&self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Canteen => "/canteen",
            Role::Ngo => "/ngo",
        }
    }
}

/// The authenticated actor behind a request.
#[derive(Clone, Debug)]
pub struct Principal {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
    /// Canteen or NGO row this account acts for; 0 for admins.
    pub ref_id: i32,
}

/// A live session
#[derive(Clone, Debug)]
struct Session {
    principal: Principal,
    expires_at: SystemTime,
}

impl Session {
    fn is_expired(&self) -> bool {
        SystemTime::now() > self.expires_at
    }
}

/// Hash a password with salt
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"foodshare-salt:");
    hasher.update(password.as_bytes());
    let result = hasher.finalize();
    result.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Generate a secure random token
fn generate_token() -> String {
    let mut hasher = Sha256::new();

    // Use timestamp for uniqueness
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    hasher.update(timestamp.to_le_bytes());

    // Use thread ID
    let thread_id = std::thread::current().id();
    hasher.update(format!("{:?}", thread_id).as_bytes());

    // Use random-ish data from stack
    let stack_addr = &timestamp as *const _ as usize;
    hasher.update(stack_addr.to_le_bytes());

    let result = hasher.finalize();
    BASE64.encode(&result[..24])
}

/// Session manager
pub struct AuthManager {
    sessions: RwLock<HashMap<String, Session>>,
    session_duration: Duration,
}

impl AuthManager {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            session_duration: Duration::from_secs(24 * 60 * 60),
        }
    }

    /// Verify credentials, record the login, and open a session.
    /// Returns the session token to set as a cookie.
    pub async fn login(
        &self,
        db: &DatabaseConnection,
        username: &str,
        password: &str,
        ip_address: &str,
    ) -> Result<(String, Principal)> {
        let account = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(db)
            .await?
            .ok_or(AppError::AuthFailed)?;

        if hash_password(password) != account.password_hash {
            return Err(AppError::AuthFailed);
        }

        let role_row = role::Entity::find_by_id(account.role_id)
            .one(db)
            .await?
            .ok_or(AppError::AuthFailed)?;
        let role = Role::parse(&role_row.role_name).ok_or(AppError::AuthFailed)?;

        let principal = Principal {
            user_id: account.id,
            username: account.username,
            role,
            ref_id: account.ref_id,
        };

        login_activity::ActiveModel {
            user_id: Set(principal.user_id),
            login_time: Set(now_ts()),
            ip_address: Set(ip_address.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        let token = generate_token();
        let session = Session {
            principal: principal.clone(),
            expires_at: SystemTime::now() + self.session_duration,
        };
        self.sessions.write().insert(token.clone(), session);

        Ok((token, principal))
    }

    /// Resolve a session token to its principal, if still valid.
    pub fn principal_for_token(&self, token: &str) -> Option<Principal> {
        let sessions = self.sessions.read();
        let session = sessions.get(token)?;
        if session.is_expired() {
            return None;
        }
        Some(session.principal.clone())
    }

    /// Revoke a session token
    pub fn revoke(&self, token: &str) {
        self.sessions.write().remove(token);
    }

    /// Cleanup expired sessions
    pub fn cleanup_expired(&self) {
        self.sessions.write().retain(|_, s| !s.is_expired());
    }

    /// Create the bootstrap admin account if it doesn't exist yet.
    pub async fn ensure_admin_user(
        &self,
        db: &DatabaseConnection,
        username: &str,
        password: &str,
    ) -> Result<()> {
        let existing = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(db)
            .await?;
        if existing.is_some() {
            return Ok(());
        }

        let admin_role = role::Entity::find()
            .filter(role::Column::RoleName.eq(Role::Admin.as_str()))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("admin role missing".to_string()))?;

        user::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(hash_password(password)),
            email: Set(format!("{username}@foodshare.local")),
            role_id: Set(admin_role.id),
            ref_id: Set(0),
            created_at: Set(now_ts()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        tracing::info!("Created bootstrap admin account '{}'", username);
        Ok(())
    }
}

impl Default for AuthManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ConnectOptions;

    async fn test_db() -> DatabaseConnection {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1);
        let db = sea_orm::Database::connect(opt).await.unwrap();
        crate::db::create_tables(&db).await.unwrap();
        crate::db::seed_roles(&db).await.unwrap();
        db
    }

    #[test]
    fn test_password_hash() {
        let hash1 = hash_password("test123");
        let hash2 = hash_password("test123");
        let hash3 = hash_password("different");

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
    }

    #[tokio::test]
    async fn test_login_and_session() {
        let db = test_db().await;
        let auth = AuthManager::new();
        auth.ensure_admin_user(&db, "admin", "admin123").await.unwrap();

        let (token, principal) = auth.login(&db, "admin", "admin123", "127.0.0.1").await.unwrap();
        assert_eq!(principal.role, Role::Admin);
        assert_eq!(principal.ref_id, 0);

        let resolved = auth.principal_for_token(&token).unwrap();
        assert_eq!(resolved.username, "admin");

        auth.revoke(&token);
        assert!(auth.principal_for_token(&token).is_none());
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let db = test_db().await;
        let auth = AuthManager::new();
        auth.ensure_admin_user(&db, "admin", "admin123").await.unwrap();

        assert!(auth.login(&db, "admin", "wrong", "127.0.0.1").await.is_err());
        assert!(auth.login(&db, "nobody", "pass", "127.0.0.1").await.is_err());
    }

    #[tokio::test]
    async fn test_ensure_admin_idempotent() {
        let db = test_db().await;
        let auth = AuthManager::new();
        auth.ensure_admin_user(&db, "admin", "admin123").await.unwrap();
        auth.ensure_admin_user(&db, "admin", "admin123").await.unwrap();

        let admins = user::Entity::find().all(&db).await.unwrap();
        assert_eq!(admins.len(), 1);
    }

    #[tokio::test]
    async fn test_login_records_activity() {
        let db = test_db().await;
        let auth = AuthManager::new();
        auth.ensure_admin_user(&db, "admin", "admin123").await.unwrap();

        auth.login(&db, "admin", "admin123", "10.0.0.7").await.unwrap();
        let activity = login_activity::Entity::find().one(&db).await.unwrap().unwrap();
        assert_eq!(activity.ip_address, "10.0.0.7");
    }

    #[test]
    fn test_role_round_trip() {
        for r in [Role::Admin, Role::Canteen, Role::Ngo] {
            assert_eq!(Role::parse(r.as_str()), Some(r));
        }
        assert!(Role::parse("staff").is_none());
    }
}
