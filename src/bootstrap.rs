/// Admin bootstrap.
/// Makes sure exactly one initialized admin credential exists, hashing the
/// configured plaintext password the first time it runs.
use crate::auth::{self, AuthError, MIN_PASSWORD_LEN};
use crate::config::ServerConfig;
use crate::db::{models::AdminCredential, Database, DbPool, StoreError};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// No credential existed; one was created
    Created,
    /// An uninitialized credential was re-hashed and flagged initialized
    Updated,
    /// Nothing to do
    AlreadyInitialized,
}

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Hashing error: {0}")]
    Hash(String),
}

impl From<AuthError> for BootstrapError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Store(e) => BootstrapError::Store(e),
            other => BootstrapError::Hash(other.to_string()),
        }
    }
}

/// Initialized and holding a hash `authenticate` can check against
fn is_usable(admin: &AdminCredential) -> bool {
    admin.initialized && admin.password_hash.is_some()
}

/// Validate the configured admin password
fn admin_secret(config: &ServerConfig) -> Result<&str, BootstrapError> {
    match config.admin_password.as_deref() {
        None => Err(BootstrapError::Config("ADMIN_PASSWORD is not set".to_string())),
        Some(p) if p.chars().count() < MIN_PASSWORD_LEN => Err(BootstrapError::Config(format!(
            "ADMIN_PASSWORD must be at least {} characters",
            MIN_PASSWORD_LEN
        ))),
        Some(p) => Ok(p),
    }
}

/// Ensure the admin credential exists and is initialized.
///
/// A no-op once initialized. Each run that does hash uses a fresh salt.
pub async fn initialize_admin(
    pool: &DbPool,
    config: &ServerConfig,
) -> Result<BootstrapOutcome, BootstrapError> {
    pool.ensure_connected().await?;

    let existing = Database::get_admin(pool).await?;
    if existing.as_ref().is_some_and(is_usable) {
        log::debug!("Admin already initialized");
        return Ok(BootstrapOutcome::AlreadyInitialized);
    }

    let secret = admin_secret(config)?;
    let hash = auth::hash_password(secret).await?;

    let outcome = if existing.is_some() {
        Database::update_admin(pool, &hash, true).await?;
        BootstrapOutcome::Updated
    } else {
        match Database::create_admin(pool, Some(hash.as_str()), true).await {
            Ok(_) => BootstrapOutcome::Created,
            // Another bootstrap created the row between our read and insert
            Err(StoreError::Duplicate(_)) => {
                let current = Database::get_admin(pool).await?;
                if current.as_ref().is_some_and(is_usable) {
                    return Ok(BootstrapOutcome::AlreadyInitialized);
                }
                Database::update_admin(pool, &hash, true).await?;
                BootstrapOutcome::Updated
            }
            Err(e) => return Err(e.into()),
        }
    };

    log::info!("Admin credential initialized ({:?})", outcome);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    fn config(password: Option<&str>) -> ServerConfig {
        ServerConfig::new(password, "test-signing-secret")
    }

    #[tokio::test]
    async fn test_first_run_creates_credential() {
        let pool = create_test_pool();
        let outcome = initialize_admin(&pool, &config(Some("correct horse")))
            .await
            .expect("Bootstrap failed");
        assert_eq!(outcome, BootstrapOutcome::Created);

        let admin = Database::get_admin(&pool)
            .await
            .expect("Query failed")
            .expect("Admin not created");
        assert!(admin.initialized);
        let hash = admin.password_hash.expect("Hash missing");
        assert!(auth::verify_password("correct horse", &hash)
            .await
            .expect("Verify failed"));
    }

    #[tokio::test]
    async fn test_second_run_is_noop() {
        let pool = create_test_pool();
        let cfg = config(Some("correct horse"));
        initialize_admin(&pool, &cfg).await.expect("Bootstrap failed");
        let before = Database::get_admin(&pool).await.expect("Query failed");

        let outcome = initialize_admin(&pool, &cfg).await.expect("Bootstrap failed");
        assert_eq!(outcome, BootstrapOutcome::AlreadyInitialized);

        let after = Database::get_admin(&pool).await.expect("Query failed");
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_uninitialized_record_is_rehashed() {
        let pool = create_test_pool();
        Database::create_admin(&pool, Some("stale-hash"), false)
            .await
            .expect("Failed to seed admin");

        let outcome = initialize_admin(&pool, &config(Some("correct horse")))
            .await
            .expect("Bootstrap failed");
        assert_eq!(outcome, BootstrapOutcome::Updated);

        let admin = Database::get_admin(&pool)
            .await
            .expect("Query failed")
            .expect("Admin missing");
        assert!(admin.initialized);
        assert_ne!(admin.password_hash.as_deref(), Some("stale-hash"));
    }

    #[tokio::test]
    async fn test_initialized_record_without_hash_is_repaired() {
        let pool = create_test_pool();
        Database::create_admin(&pool, None, true)
            .await
            .expect("Failed to seed admin");

        let outcome = initialize_admin(&pool, &config(Some("correct horse")))
            .await
            .expect("Bootstrap failed");
        assert_eq!(outcome, BootstrapOutcome::Updated);

        let hash = Database::get_admin(&pool)
            .await
            .expect("Query failed")
            .and_then(|admin| admin.password_hash)
            .expect("Hash missing");
        assert!(auth::verify_password("correct horse", &hash)
            .await
            .expect("Verify failed"));
    }

    #[tokio::test]
    async fn test_concurrent_first_runs_both_succeed() {
        let pool = create_test_pool();
        let cfg = config(Some("correct horse"));

        // Both calls read "no record" before either finishes hashing
        let (a, b) = tokio::join!(
            initialize_admin(&pool, &cfg),
            initialize_admin(&pool, &cfg)
        );
        let outcomes = [
            a.expect("First bootstrap failed"),
            b.expect("Second bootstrap failed"),
        ];
        assert!(outcomes.contains(&BootstrapOutcome::Created));

        let admin = Database::get_admin(&pool)
            .await
            .expect("Query failed")
            .expect("Admin missing");
        assert!(admin.initialized);
        let hash = admin.password_hash.expect("Hash missing");
        assert!(auth::verify_password("correct horse", &hash)
            .await
            .expect("Verify failed"));
    }

    #[tokio::test]
    async fn test_missing_secret_is_config_error() {
        let pool = create_test_pool();
        let result = initialize_admin(&pool, &config(None)).await;
        assert!(matches!(result, Err(BootstrapError::Config(_))));
        assert!(Database::get_admin(&pool).await.expect("Query failed").is_none());
    }

    #[tokio::test]
    async fn test_short_secret_is_config_error() {
        let pool = create_test_pool();
        let result = initialize_admin(&pool, &config(Some("1234567"))).await;
        assert!(matches!(result, Err(BootstrapError::Config(_))));
    }

    #[tokio::test]
    async fn test_unreachable_store_is_store_error() {
        let pool = crate::db::create_pool("/nonexistent-dir/for/presale/admin.db");
        let result = initialize_admin(&pool, &config(Some("correct horse"))).await;
        assert!(matches!(result, Err(BootstrapError::Store(StoreError::Connection(_)))));
    }
}
