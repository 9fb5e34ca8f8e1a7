//! Registration and login.

use tracing::{info, warn};

use crate::error::{CliError, CliResult, ErrorCode};
use fabrica_core::validation::{validate_login, validate_registration};
use fabrica_core::{CoreError, User};
use fabrica_db::Database;

/// Creates an account after checking the registration form.
pub async fn register(
    db: &Database,
    email: &str,
    password: &str,
    confirmation: &str,
) -> CliResult<String> {
    validate_registration(email, password, confirmation)?;

    let taken = db
        .users()
        .exists_by_email(email)
        .await
        .map_err(|e| CliError::from_db(e, "Error al registrar el usuario. Inténtelo nuevamente."))?;
    if taken {
        return Err(CoreError::EmailTaken(email.trim().to_string()).into());
    }

    db.users()
        .register(email, password)
        .await
        .map_err(|e| CliError::from_db(e, "Error al registrar el usuario. Inténtelo nuevamente."))?;

    info!(email = %email.trim(), "Account created");
    Ok("Usuario registrado correctamente.".to_string())
}

/// Checks credentials and returns the account.
pub async fn authenticate(db: &Database, email: &str, password: &str) -> CliResult<User> {
    validate_login(email, password)?;

    db.users().authenticate(email, password).await.map_err(|e| {
        let err = CliError::from_db(e, "Error al iniciar sesión. Inténtelo nuevamente.");
        if err.code == ErrorCode::AuthFailed {
            warn!(email = %email.trim(), "Login rejected");
        }
        err
    })
}

/// `fabrica login`
pub async fn login(db: &Database, email: &str, password: &str) -> CliResult<String> {
    let user = authenticate(db, email, password).await?;
    Ok(format!("Bienvenido, {}.", user.email))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabrica_db::DbConfig;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let db = db().await;

        let out = register(&db, "ana@fabrica.es", "secreto", "secreto").await.unwrap();
        assert_eq!(out, "Usuario registrado correctamente.");

        assert_eq!(
            login(&db, "ana@fabrica.es", "secreto").await.unwrap(),
            "Bienvenido, ana@fabrica.es."
        );
        let err = login(&db, "ana@fabrica.es", "secret0").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthFailed);
    }

    #[tokio::test]
    async fn test_register_rules() {
        let db = db().await;

        let err = register(&db, "ana@fabrica.es", "secreto", "otro").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = register(&db, "ana@fabrica.es", "123", "123").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = register(&db, "no-es-correo", "secreto", "secreto").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        register(&db, "ana@fabrica.es", "secreto", "secreto").await.unwrap();
        let err = register(&db, "ana@fabrica.es", "secreto", "secreto").await.unwrap_err();
        assert!(err.message.contains("ya está registrado"));
    }

    #[tokio::test]
    async fn test_login_requires_fields() {
        let db = db().await;
        let err = login(&db, "", "x").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
