//! `fabrica seed`: demo account, catalogue and tickets.

use crate::error::{CliError, CliResult};
use fabrica_db::seed::{self, DEMO_EMAIL, DEMO_PASSWORD};
use fabrica_db::Database;

pub async fn run(db: &Database) -> CliResult<String> {
    let report = seed::seed(db)
        .await
        .map_err(|e| CliError::from_db(e, "Error al cargar los datos de ejemplo."))?;

    if report.is_empty() {
        return Ok("La base de datos ya contiene datos de ejemplo.".to_string());
    }

    Ok(format!(
        "Datos de ejemplo cargados: {} usuarios, {} productos, {} tickets.\nCuenta demo: {} / {}",
        report.users, report.products, report.tickets, DEMO_EMAIL, DEMO_PASSWORD
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabrica_db::DbConfig;

    #[tokio::test]
    async fn test_seed_twice() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let out = run(&db).await.unwrap();
        assert!(out.starts_with("Datos de ejemplo cargados: 1 usuarios"));
        assert!(out.contains(DEMO_EMAIL));

        assert_eq!(
            run(&db).await.unwrap(),
            "La base de datos ya contiene datos de ejemplo."
        );
    }
}
