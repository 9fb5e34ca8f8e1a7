//! Stock management commands.

use tracing::info;

use super::{render, table, OutputFormat};
use crate::error::{CliError, CliResult};
use fabrica_core::validation::parse_stock_quantity;
use fabrica_core::{Money, Product, ProductInput};
use fabrica_db::Database;

const SAVE_FAILED: &str = "Error al guardar el producto. Inténtelo nuevamente.";
const LOAD_FAILED: &str = "Error al cargar los productos. Inténtelo nuevamente.";
const DELETE_FAILED: &str = "Error al eliminar el producto. Inténtelo nuevamente.";

/// Product form as typed on the command line.
#[derive(Debug, Clone)]
pub struct ProductForm {
    pub name: String,
    pub price: String,
    pub quantity: String,
}

impl ProductForm {
    fn parse(&self) -> CliResult<ProductInput> {
        let price = Money::parse(&self.price)?;
        let quantity = parse_stock_quantity(&self.quantity)?;
        let input = ProductInput::new(&self.name, price, quantity);
        input.validate()?;
        Ok(input)
    }
}

fn product_rows(products: &[Product]) -> String {
    let rows: Vec<Vec<String>> = products
        .iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                p.name.clone(),
                p.price().to_string(),
                p.quantity.to_string(),
                p.formatted_date(),
            ]
        })
        .collect();
    table(&["ID", "Nombre", "Precio", "Cantidad", "Modificado"], &rows)
}

/// `fabrica product list`
pub async fn list(db: &Database, format: OutputFormat) -> CliResult<String> {
    let repo = db.products();
    let products = repo
        .list_all()
        .await
        .map_err(|e| CliError::from_db(e, LOAD_FAILED))?;
    let value = repo
        .inventory_value()
        .await
        .map_err(|e| CliError::from_db(e, LOAD_FAILED))?;

    render(format, &products, |products| {
        format!(
            "{}\n\n{} productos · valor del inventario: {}",
            product_rows(products),
            products.len(),
            value
        )
    })
}

/// `fabrica product show <id>`
pub async fn show(db: &Database, id: i64, format: OutputFormat) -> CliResult<String> {
    let product = db
        .products()
        .get_by_id(id)
        .await
        .map_err(|e| CliError::from_db(e, LOAD_FAILED))?
        .ok_or_else(|| CliError::not_found("Product", &id.to_string()))?;

    render(format, &product, |p| {
        format!(
            "Producto #{}\n  Nombre:      {}\n  Precio:      {}\n  Cantidad:    {}{}\n  Valor stock: {}\n  Modificado:  {}",
            p.id,
            p.name,
            p.price(),
            p.quantity,
            if p.is_available() { "" } else { " (agotado)" },
            p.stock_value(),
            p.formatted_date()
        )
    })
}

/// `fabrica product add`
pub async fn add(db: &Database, form: &ProductForm) -> CliResult<String> {
    let input = form.parse()?;

    let product = db
        .products()
        .create(&input)
        .await
        .map_err(|e| CliError::from_db(e, SAVE_FAILED))?;

    info!(product_id = product.id, "Product added from CLI");
    Ok(format!("Producto #{} guardado correctamente.", product.id))
}

/// `fabrica product update <id>` (replaces every field)
pub async fn update(db: &Database, id: i64, form: &ProductForm) -> CliResult<String> {
    let input = form.parse()?;

    db.products()
        .update(id, &input)
        .await
        .map_err(|e| CliError::from_db(e, SAVE_FAILED))?;

    Ok(format!("Producto #{} actualizado correctamente.", id))
}

/// `fabrica product delete <id>`
pub async fn delete(db: &Database, id: i64) -> CliResult<String> {
    db.products()
        .delete(id)
        .await
        .map_err(|e| CliError::from_db(e, DELETE_FAILED))?;

    Ok(format!("Producto #{} eliminado.", id))
}

/// `fabrica product search <term>`
pub async fn search(db: &Database, term: &str, format: OutputFormat) -> CliResult<String> {
    let products = db
        .products()
        .search(term)
        .await
        .map_err(|e| CliError::from_db(e, LOAD_FAILED))?;

    render(format, &products, |products| {
        if products.is_empty() {
            format!("Ningún producto coincide con \"{}\".", term.trim())
        } else {
            product_rows(products)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use fabrica_db::DbConfig;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn form(name: &str, price: &str, quantity: &str) -> ProductForm {
        ProductForm {
            name: name.to_string(),
            price: price.to_string(),
            quantity: quantity.to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_list_show() {
        let db = db().await;

        let out = add(&db, &form("Rayuela", "16,50", "8")).await.unwrap();
        assert_eq!(out, "Producto #1 guardado correctamente.");

        let out = list(&db, OutputFormat::Text).await.unwrap();
        assert!(out.contains("Rayuela"));
        assert!(out.contains("€16.50"));
        assert!(out.ends_with("1 productos · valor del inventario: €132.00"));

        let out = show(&db, 1, OutputFormat::Text).await.unwrap();
        assert!(out.contains("Valor stock: €132.00"));

        let json = show(&db, 1, OutputFormat::Json).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["price_cents"], 1650);
    }

    #[tokio::test]
    async fn test_invalid_forms() {
        let db = db().await;

        for bad in [
            form("Rayuela", "-1", "8"),
            form("Rayuela", "1", "-8"),
            form("Rayuela", "abc", "8"),
            form("Rayuela", "1", "2.5"),
            form("", "1", "1"),
            form("Rayuela", "100000000000", "8"),
            form("Rayuela", "1", "2147483648"),
        ] {
            let err = add(&db, &bad).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::ValidationError, "{:?}", bad);
        }
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_delete_not_found() {
        let db = db().await;
        add(&db, &form("Rayuela", "1", "1")).await.unwrap();

        update(&db, 1, &form("Rayuela (bolsillo)", "9.95", "3")).await.unwrap();
        assert!(show(&db, 1, OutputFormat::Text)
            .await
            .unwrap()
            .contains("Rayuela (bolsillo)"));

        let err = update(&db, 2, &form("X", "1", "1")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        delete(&db, 1).await.unwrap();
        assert_eq!(delete(&db, 1).await.unwrap_err().code, ErrorCode::NotFound);
        assert_eq!(
            show(&db, 1, OutputFormat::Text).await.unwrap_err().message,
            "Producto no encontrado: 1"
        );
    }

    #[tokio::test]
    async fn test_largest_stock_still_lists() {
        let db = db().await;
        add(&db, &form("Incunable", "99999999.99", "2147483647")).await.unwrap();
        add(&db, &form("Rayuela", "16.50", "1")).await.unwrap();

        let out = show(&db, 1, OutputFormat::Text).await.unwrap();
        assert!(out.contains("€99999999.99"));
        let out = list(&db, OutputFormat::Text).await.unwrap();
        assert!(out.contains("2 productos"));
    }

    #[tokio::test]
    async fn test_search() {
        let db = db().await;
        add(&db, &form("Rayuela", "16.50", "1")).await.unwrap();
        add(&db, &form("Ficciones", "13.99", "1")).await.unwrap();

        assert!(search(&db, "ficc", OutputFormat::Text)
            .await
            .unwrap()
            .contains("Ficciones"));
        assert!(search(&db, "16.5", OutputFormat::Text)
            .await
            .unwrap()
            .contains("Rayuela"));
        assert_eq!(
            search(&db, "zzz", OutputFormat::Text).await.unwrap(),
            "Ningún producto coincide con \"zzz\"."
        );
    }
}
