//! # Product Repository
//!
//! Stock management over `productos`.
//!
//! ## Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Stock Search Matches                             │
//! │                                                                         │
//! │  User types: "12.5"                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  nombre LIKE '%12.5%'  OR  printf('%.2f', precio / 100.0) LIKE '%12.5%' │
//! │                                                                         │
//! │  ┌───────────────────────────────┬──────────┬──────┐                   │
//! │  │ Atlas 12.5 x 20               │   900    │ name │ ← MATCH           │
//! │  │ Cuaderno A4                   │  1250    │12.50 │ ← MATCH (price)   │
//! │  │ Cuaderno A5                   │   999    │ 9.99 │                   │
//! │  └───────────────────────────────┴──────────┴──────┘                   │
//! │                                                                         │
//! │  Results ordered by name.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use fabrica_core::validation::validate_search_term;
use fabrica_core::{Money, Product, ProductInput};

const PRODUCT_COLUMNS: &str = r#"
    id,
    nombre AS name,
    precio AS price_cents,
    cantidad AS quantity,
    fecha_modificacion AS updated_at
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let created = repo.create(&ProductInput::new("Atlas", Money::parse("12.50")?, 3)).await?;
/// let found = repo.search("atlas").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists every product ordered by name.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM productos ORDER BY nombre, id",
            PRODUCT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets a product by its id.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM productos WHERE id = ?1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product and returns it with its id and timestamp.
    ///
    /// ## Returns
    /// * `Err(DbError::Rule(..))` - Blank name, negative price or quantity
    ///   (nothing is written)
    pub async fn create(&self, input: &ProductInput) -> DbResult<Product> {
        input.validate()?;
        debug!(name = %input.name, "Inserting product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO productos (nombre, precio, cantidad, fecha_modificacion)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&input.name)
        .bind(input.price_cents)
        .bind(input.quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(product_id = id, "Product created");

        Ok(Product {
            id,
            name: input.name.clone(),
            price_cents: input.price_cents,
            quantity: input.quantity,
            updated_at: Some(now),
        })
    }

    /// Replaces every editable field of product `id`.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, id: i64, input: &ProductInput) -> DbResult<Product> {
        input.validate()?;
        debug!(id = id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE productos SET
                nombre = ?2,
                precio = ?3,
                cantidad = ?4,
                fecha_modificacion = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.price_cents)
        .bind(input.quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(Product {
            id,
            name: input.name.clone(),
            price_cents: input.price_cents,
            quantity: input.quantity,
            updated_at: Some(now),
        })
    }

    /// Deletes product `id`.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id = id, "Deleting product");

        let result = sqlx::query("DELETE FROM productos WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(product_id = id, "Product deleted");
        Ok(())
    }

    /// Substring search on the name or on the price as text (`12.50`).
    ///
    /// An empty term lists everything.
    pub async fn search(&self, term: &str) -> DbResult<Vec<Product>> {
        let term = validate_search_term(term)?;
        if term.is_empty() {
            return self.list_all().await;
        }

        debug!(term = %term, "Searching products");

        let pattern = format!("%{}%", escape_like(&term));

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {}
            FROM productos
            WHERE nombre LIKE ?1 ESCAPE '\'
               OR printf('%.2f', precio / 100.0) LIKE ?1 ESCAPE '\'
            ORDER BY nombre, id
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Counts products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM productos")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Value of all stock: Σ price × quantity, saturating at `i64::MAX`.
    ///
    /// Summed here rather than in SQL: SQLite turns an overflowing
    /// `precio * cantidad` into a REAL.
    pub async fn inventory_value(&self) -> DbResult<Money> {
        let rows: Vec<(i64, i64)> = sqlx::query_as("SELECT precio, cantidad FROM productos")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(price, quantity)| Money::from_cents(price) * quantity)
            .sum())
    }
}

/// `%`, `_` and `\` match literally.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};
    use fabrica_core::{CoreError, ValidationError, MAX_PRICE_CENTS, MAX_STOCK_QUANTITY};

    use super::*;

    async fn repo() -> (Database, ProductRepository) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let products = db.products();
        (db, products)
    }

    fn input(name: &str, price: &str, qty: i64) -> ProductInput {
        ProductInput::new(name, Money::parse(price).unwrap(), qty)
    }

    #[tokio::test]
    async fn test_create_then_read() {
        let (_db, repo) = repo().await;

        let created = repo.create(&input("Atlas escolar", "12.50", 3)).await.unwrap();
        let read = repo.get_by_id(created.id).await.unwrap().unwrap();

        assert_eq!(read.name, "Atlas escolar");
        assert_eq!(read.price_cents, 1250);
        assert_eq!(read.quantity, 3);
        assert!(read.updated_at.is_some());
        assert!(repo.get_by_id(created.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_negative_values_rejected_before_insert() {
        let (_db, repo) = repo().await;

        let err = repo.create(&input("Atlas", "-1", 3)).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::Validation(ValidationError::Negative { .. }))
        ));
        assert!(repo.create(&input("Atlas", "1", -3)).await.is_err());
        assert!(repo.create(&input("  ", "1", 3)).await.is_err());

        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bounds_and_large_stock_value() {
        let (_db, repo) = repo().await;

        let too_dear = ProductInput::new("Incunable", Money::from_cents(MAX_PRICE_CENTS + 1), 1);
        assert!(matches!(
            repo.create(&too_dear).await.unwrap_err(),
            DbError::Rule(CoreError::Validation(ValidationError::TooLarge { .. }))
        ));
        let too_many = ProductInput::new("Folleto", Money::from_cents(1), MAX_STOCK_QUANTITY + 1);
        assert!(repo.create(&too_many).await.is_err());

        let top = ProductInput::new(
            "Incunable",
            Money::from_cents(MAX_PRICE_CENTS),
            MAX_STOCK_QUANTITY,
        );
        let p = repo.create(&top).await.unwrap();
        repo.create(&top).await.unwrap();
        repo.create(&input("Lápiz", "0.35", 10)).await.unwrap();

        assert_eq!(p.stock_value().cents(), i64::MAX);
        assert_eq!(repo.inventory_value().await.unwrap().cents(), i64::MAX);
        assert_eq!(repo.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_list_all_ordered_by_name() {
        let (_db, repo) = repo().await;
        repo.create(&input("Cuaderno", "2", 1)).await.unwrap();
        repo.create(&input("Atlas", "9", 1)).await.unwrap();
        repo.create(&input("Bolígrafo", "1", 1)).await.unwrap();

        let names: Vec<_> = repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Atlas", "Bolígrafo", "Cuaderno"]);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (_db, repo) = repo().await;
        let p = repo.create(&input("Atlas", "9", 1)).await.unwrap();

        let updated = repo.update(p.id, &input("Atlas 2ª ed.", "10.99", 0)).await.unwrap();
        assert_eq!(updated.price_cents, 1099);
        let read = repo.get_by_id(p.id).await.unwrap().unwrap();
        assert_eq!(read.name, "Atlas 2ª ed.");
        assert!(!read.is_available());

        assert!(repo.update(p.id + 1, &input("X", "1", 1)).await.unwrap_err().is_not_found());

        repo.delete(p.id).await.unwrap();
        assert!(repo.get_by_id(p.id).await.unwrap().is_none());
        assert!(repo.delete(p.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_search_by_name_and_price() {
        let (_db, repo) = repo().await;
        repo.create(&input("Atlas escolar", "9", 1)).await.unwrap();
        repo.create(&input("Cuaderno A4", "12.50", 1)).await.unwrap();
        repo.create(&input("Cuaderno A5", "9.99", 1)).await.unwrap();

        let by_name = repo.search("cuaderno").await.unwrap();
        assert_eq!(by_name.len(), 2);

        let by_price = repo.search("12.5").await.unwrap();
        assert_eq!(by_price.len(), 1);
        assert_eq!(by_price[0].name, "Cuaderno A4");

        assert_eq!(repo.search("").await.unwrap().len(), 3);
        assert!(repo.search("100%").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inventory_value() {
        let (_db, repo) = repo().await;
        assert_eq!(repo.inventory_value().await.unwrap(), Money::zero());

        repo.create(&input("Atlas", "12.50", 2)).await.unwrap();
        repo.create(&input("Lápiz", "0.35", 10)).await.unwrap();

        assert_eq!(repo.inventory_value().await.unwrap().cents(), 2500 + 350);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
