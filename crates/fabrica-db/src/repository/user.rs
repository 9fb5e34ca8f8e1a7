//! # User Repository
//!
//! Registration and login against `usuarios`.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::password;
use crate::pool::checkout;
use fabrica_core::{CoreError, User};

/// Repository for user accounts. Each call checks out its own connection.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

const USER_COLUMNS: &str = "id, correo AS email, contrasena AS password_hash";

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Registers a new user and returns its id.
    ///
    /// The email is trimmed before storage and the password is stored as an
    /// Argon2 hash. Format rules are checked by the caller
    /// (`validate_registration`).
    ///
    /// ## Returns
    /// * `Ok(id)` - User created
    /// * `Err(DbError::Rule(CoreError::EmailTaken))` - Email already registered
    pub async fn register(&self, email: &str, password: &str) -> DbResult<i64> {
        let email = email.trim();
        debug!(email = %email, "Registering user");

        let hash = password::hash_password(password)?;
        let mut conn = checkout(&self.pool).await?;

        let result = sqlx::query("INSERT INTO usuarios (correo, contrasena) VALUES (?1, ?2)")
            .bind(email)
            .bind(&hash)
            .execute(&mut *conn)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => {
                    DbError::Rule(CoreError::EmailTaken(email.to_string()))
                }
                other => other,
            })?;

        let id = result.last_insert_rowid();
        info!(user_id = id, "User registered");
        Ok(id)
    }

    /// True only when the email exists and the password matches the stored
    /// credential exactly.
    pub async fn verify_login(&self, email: &str, password: &str) -> DbResult<bool> {
        debug!(email = %email.trim(), "Verifying login");

        let mut conn = checkout(&self.pool).await?;
        let stored: Option<String> =
            sqlx::query_scalar("SELECT contrasena FROM usuarios WHERE correo = ?1")
                .bind(email.trim())
                .fetch_optional(&mut *conn)
                .await?;

        Ok(stored
            .map(|s| password::verify_password(password, &s))
            .unwrap_or(false))
    }

    /// Whether an account exists for the email.
    pub async fn exists_by_email(&self, email: &str) -> DbResult<bool> {
        let mut conn = checkout(&self.pool).await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM usuarios WHERE correo = ?1")
            .bind(email.trim())
            .fetch_one(&mut *conn)
            .await?;

        Ok(count > 0)
    }

    /// Looks up the id of the account with this email.
    pub async fn id_by_email(&self, email: &str) -> DbResult<Option<i64>> {
        let mut conn = checkout(&self.pool).await?;
        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM usuarios WHERE correo = ?1")
            .bind(email.trim())
            .fetch_optional(&mut *conn)
            .await?;

        Ok(id)
    }

    /// Gets a user by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let mut conn = checkout(&self.pool).await?;
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM usuarios WHERE id = ?1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(user)
    }

    /// Logs in and returns the account, or `InvalidCredentials`.
    pub async fn authenticate(&self, email: &str, password: &str) -> DbResult<User> {
        if !self.verify_login(email, password).await? {
            return Err(CoreError::InvalidCredentials.into());
        }

        let mut conn = checkout(&self.pool).await?;
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM usuarios WHERE correo = ?1",
            USER_COLUMNS
        ))
        .bind(email.trim())
        .fetch_optional(&mut *conn)
        .await?;

        user.ok_or_else(|| CoreError::InvalidCredentials.into())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};

    use super::*;

    async fn repo() -> (Database, UserRepository) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();
        (db, users)
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let (_db, users) = repo().await;

        let id = users.register("ana@fabrica.es", "secreto").await.unwrap();
        assert!(id > 0);

        assert!(users.verify_login("ana@fabrica.es", "secreto").await.unwrap());
        assert!(!users.verify_login("ana@fabrica.es", "secreta").await.unwrap());
        assert!(!users.verify_login("ana@fabrica.es", "").await.unwrap());
        assert!(!users.verify_login("otro@fabrica.es", "secreto").await.unwrap());
    }

    #[tokio::test]
    async fn test_password_is_not_stored_in_clear() {
        let (db, users) = repo().await;
        users.register("ana@fabrica.es", "secreto").await.unwrap();

        let stored: String = sqlx::query_scalar("SELECT contrasena FROM usuarios")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_ne!(stored, "secreto");
        assert!(password::is_hashed(&stored));
    }

    #[tokio::test]
    async fn test_legacy_plaintext_login() {
        let (db, users) = repo().await;
        sqlx::query("INSERT INTO usuarios (correo, contrasena) VALUES ('viejo@fabrica.es', '1234')")
            .execute(db.pool())
            .await
            .unwrap();

        assert!(users.verify_login("viejo@fabrica.es", "1234").await.unwrap());
        assert!(!users.verify_login("viejo@fabrica.es", "12345").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let (_db, users) = repo().await;
        users.register("ana@fabrica.es", "secreto").await.unwrap();

        let err = users.register("ana@fabrica.es", "otra_clave").await.unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::EmailTaken(_))));
    }

    #[tokio::test]
    async fn test_lookup_by_email() {
        let (_db, users) = repo().await;
        let id = users.register("ana@fabrica.es", "secreto").await.unwrap();

        assert!(users.exists_by_email("ana@fabrica.es").await.unwrap());
        assert!(!users.exists_by_email("nadie@fabrica.es").await.unwrap());
        assert_eq!(users.id_by_email("ana@fabrica.es").await.unwrap(), Some(id));
        assert_eq!(users.id_by_email("nadie@fabrica.es").await.unwrap(), None);

        let user = users.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.email, "ana@fabrica.es");
        assert!(users.get_by_id(id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_authenticate() {
        let (_db, users) = repo().await;
        let id = users.register("ana@fabrica.es", "secreto").await.unwrap();

        assert_eq!(users.authenticate("ana@fabrica.es", "secreto").await.unwrap().id, id);
        assert!(matches!(
            users.authenticate("ana@fabrica.es", "nope").await,
            Err(DbError::Rule(CoreError::InvalidCredentials))
        ));
    }

    #[tokio::test]
    async fn test_calls_wait_for_a_free_connection() {
        let config = DbConfig::in_memory().acquire_timeout(std::time::Duration::from_millis(50));
        let db = Database::new(config).await.unwrap();
        let users = db.users();

        let held = db.acquire().await.unwrap();
        assert!(matches!(
            users.exists_by_email("ana@fabrica.es").await,
            Err(DbError::PoolExhausted)
        ));

        drop(held);
        users.register("ana@fabrica.es", "secreto").await.unwrap();
        assert!(users.verify_login("ana@fabrica.es", "secreto").await.unwrap());

        db.close().await;
        assert!(matches!(
            users.id_by_email("ana@fabrica.es").await,
            Err(DbError::ConnectionFailed(_))
        ));
    }
}
