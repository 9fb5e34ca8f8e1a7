//! # Development Data
//!
//! Fills an empty database with a demo account, a book catalogue and a few
//! support tickets. Used by the `seed` binary and `fabrica seed`.

use fabrica_core::{Money, NewTicket, ProductInput, TicketPriority, TicketStatus, TicketType};
use tracing::{info, warn};

use crate::error::DbResult;
use crate::pool::Database;

/// Demo login created by [`seed`].
pub const DEMO_EMAIL: &str = "demo@fabricadelibros.es";
pub const DEMO_PASSWORD: &str = "demo1234";

/// (name, price in cents, quantity)
const BOOKS: &[(&str, i64, i64)] = &[
    ("Cien años de soledad", 1990, 24),
    ("Don Quijote de la Mancha", 2450, 12),
    ("La sombra del viento", 1895, 30),
    ("Rayuela", 1650, 8),
    ("Pedro Páramo", 1200, 15),
    ("Ficciones", 1399, 0),
    ("La casa de los espíritus", 1875, 6),
    ("El túnel", 995, 40),
    ("Cuaderno de notas A5", 350, 200),
    ("Marcapáginas de cuero", 600, 75),
];

/// (subject, description, priority, type, final status)
const TICKETS: &[(&str, &str, TicketPriority, TicketType, TicketStatus)] = &[
    (
        "Pedido incompleto",
        "Faltan dos cajas del pedido 4471.",
        TicketPriority::High,
        TicketType::Problem,
        TicketStatus::InProgress,
    ),
    (
        "Error en la factura",
        "El IVA aplicado no es correcto.",
        TicketPriority::Urgent,
        TicketType::Urgent,
        TicketStatus::Open,
    ),
    (
        "Tapas duras",
        "¿Hacéis ediciones en tapa dura para colegios?",
        TicketPriority::Low,
        TicketType::Inquiry,
        TicketStatus::Resolved,
    ),
    (
        "Catálogo en PDF",
        "Sería útil descargar el catálogo completo.",
        TicketPriority::Medium,
        TicketType::Suggestion,
        TicketStatus::Closed,
    ),
];

/// What [`seed`] wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub products: usize,
    pub tickets: usize,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        self.users == 0 && self.products == 0 && self.tickets == 0
    }
}

/// Seeds the database. Each part is skipped if it already has data.
pub async fn seed(db: &Database) -> DbResult<SeedReport> {
    let mut report = SeedReport::default();

    let user_id = match db.users().id_by_email(DEMO_EMAIL).await? {
        Some(id) => id,
        None => {
            report.users += 1;
            db.users().register(DEMO_EMAIL, DEMO_PASSWORD).await?
        }
    };

    if db.products().count().await? == 0 {
        for (name, cents, quantity) in BOOKS {
            let input = ProductInput::new(*name, Money::from_cents(*cents), *quantity);
            db.products().create(&input).await?;
            report.products += 1;
        }
    } else {
        warn!("Products already present, skipping catalogue");
    }

    if db.support().list_all().await?.is_empty() {
        for (subject, description, priority, ticket_type, status) in TICKETS {
            let ticket = NewTicket {
                requester_name: "Cliente Demo".to_string(),
                requester_email: DEMO_EMAIL.to_string(),
                subject: subject.to_string(),
                description: description.to_string(),
                priority: *priority,
                ticket_type: *ticket_type,
                user_id,
            };
            let id = db.support().create_ticket(&ticket).await?;
            if *status != TicketStatus::Open {
                db.support().update_status(&id, *status).await?;
            }
            report.tickets += 1;
        }
    } else {
        warn!("Tickets already present, skipping tickets");
    }

    info!(
        users = report.users,
        products = report.products,
        tickets = report.tickets,
        "Seed complete"
    );
    Ok(report)
}
