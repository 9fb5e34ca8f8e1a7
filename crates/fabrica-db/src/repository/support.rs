//! # Support Repository
//!
//! Support tickets and their chat, stored across `tickets` and
//! `mensaje_tickets`.
//!
//! ## Ticket Creation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     create_ticket (one transaction)                     │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    │                                                                    │
//! │    ├── SELECT COUNT(*) FROM tickets WHERE ticket_id LIKE 'TK-2025-%'   │
//! │    │        └── TK-2025-<count+1>  (timestamp suffix if this fails)    │
//! │    │                                                                    │
//! │    ├── INSERT INTO tickets          (ticket_id, contenido, tipo, fecha) │
//! │    │                                                                    │
//! │    ├── INSERT INTO mensaje_tickets  (... estado = 'abierto' ...)        │
//! │    │        └── fails? ──► ROLLBACK: no ticket row is left behind      │
//! │    │                                                                    │
//! │  COMMIT                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Known Gap
//! Two tickets created at the same instant can compute the same sequence.
//! The primary key on `tickets.ticket_id` then rejects the second one with
//! [`DbError::UniqueViolation`]; nothing is overwritten.

use chrono::{DateTime, Datelike, Utc};
use sqlx::{Sqlite, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use fabrica_core::{
    ChatAuthor, ChatHistory, ChatMessage, CoreError, NewTicket, StatusChange, TicketDetail,
    TicketId, TicketInfo, TicketPriority, TicketStatus,
};

const INFO_COLUMNS: &str = r#"
    m.id,
    m.ticket_id,
    m.nombre_cliente AS requester_name,
    m.email_cliente AS requester_email,
    m.asunto AS subject,
    m.prioridad AS priority,
    m.estado AS status,
    m.fecha_creacion AS created_at,
    t.tipo AS ticket_type
"#;

const DETAIL_COLUMNS: &str = r#"
    m.descripcion AS description,
    t.contenido AS content,
    t.fecha AS ticket_date
"#;

const FROM_JOIN: &str = "FROM mensaje_tickets m JOIN tickets t ON t.ticket_id = m.ticket_id";

/// Urgent first, low last.
const PRIORITY_RANK: &str = r#"
    CASE m.prioridad
        WHEN 'urgente' THEN 1
        WHEN 'alta' THEN 2
        WHEN 'media' THEN 3
        WHEN 'baja' THEN 4
        ELSE 5
    END
"#;

/// Repository for support tickets.
///
/// ## Usage
/// ```rust,ignore
/// let support = db.support();
///
/// let id = support.create_ticket(&new_ticket).await?;
/// support.update_status(&id, TicketStatus::InProgress).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SupportRepository {
    pool: SqlitePool,
}

impl SupportRepository {
    /// Creates a new SupportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SupportRepository { pool }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Every ticket, by priority (urgent → low) then newest first.
    pub async fn list_all(&self) -> DbResult<Vec<TicketInfo>> {
        let tickets = sqlx::query_as::<_, TicketInfo>(&format!(
            "SELECT {} {} ORDER BY {}, m.fecha_creacion DESC, m.id DESC",
            INFO_COLUMNS, FROM_JOIN, PRIORITY_RANK
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = tickets.len(), "Listed tickets");
        Ok(tickets)
    }

    /// Tickets of one priority, newest first.
    pub async fn list_by_priority(&self, priority: TicketPriority) -> DbResult<Vec<TicketInfo>> {
        let tickets = sqlx::query_as::<_, TicketInfo>(&format!(
            "SELECT {} {} WHERE m.prioridad = ?1 ORDER BY m.fecha_creacion DESC, m.id DESC",
            INFO_COLUMNS, FROM_JOIN
        ))
        .bind(priority)
        .fetch_all(&self.pool)
        .await?;

        Ok(tickets)
    }

    /// Tickets filed by one user, newest first.
    pub async fn list_by_user(&self, user_id: i64) -> DbResult<Vec<TicketInfo>> {
        let tickets = sqlx::query_as::<_, TicketInfo>(&format!(
            "SELECT {} {} WHERE m.usuario_id = ?1 ORDER BY m.fecha_creacion DESC, m.id DESC",
            INFO_COLUMNS, FROM_JOIN
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tickets)
    }

    /// Full ticket by public id.
    pub async fn get_detail(&self, ticket_id: &TicketId) -> DbResult<Option<TicketDetail>> {
        let detail = sqlx::query_as::<_, TicketDetail>(&format!(
            "SELECT {}, {} {} WHERE m.ticket_id = ?1",
            INFO_COLUMNS, DETAIL_COLUMNS, FROM_JOIN
        ))
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(detail)
    }

    /// Full ticket, only if it was filed by `user_id`.
    pub async fn get_detail_for_user(
        &self,
        ticket_id: &TicketId,
        user_id: i64,
    ) -> DbResult<Option<TicketDetail>> {
        let detail = sqlx::query_as::<_, TicketDetail>(&format!(
            "SELECT {}, {} {} WHERE m.ticket_id = ?1 AND m.usuario_id = ?2",
            INFO_COLUMNS, DETAIL_COLUMNS, FROM_JOIN
        ))
        .bind(ticket_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(detail)
    }

    /// Number of tickets in `status`.
    pub async fn count_by_status(&self, status: TicketStatus) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM mensaje_tickets WHERE estado = ?1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Count for every status, in [`TicketStatus::ALL`] order. Statuses with
    /// no tickets report zero.
    pub async fn status_summary(&self) -> DbResult<Vec<(TicketStatus, i64)>> {
        let rows: Vec<(TicketStatus, i64)> =
            sqlx::query_as("SELECT estado, COUNT(*) FROM mensaje_tickets GROUP BY estado")
                .fetch_all(&self.pool)
                .await?;

        Ok(TicketStatus::ALL
            .iter()
            .map(|status| {
                let count = rows
                    .iter()
                    .find(|(s, _)| s == status)
                    .map(|(_, c)| *c)
                    .unwrap_or(0);
                (*status, count)
            })
            .collect())
    }

    // =========================================================================
    // Ticket Ids
    // =========================================================================

    /// The id the next ticket of the current year would get.
    ///
    /// Never fails: if the count query errors, a timestamp-based id is
    /// returned instead.
    pub async fn next_ticket_id(&self) -> TicketId {
        next_id(&self.pool, Utc::now()).await
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Creates a ticket and its first message in one transaction.
    ///
    /// ## Returns
    /// * `Ok(TicketId)` - Public id of the new ticket
    /// * `Err(DbError::Rule(..))` - Form failed validation (nothing written)
    /// * `Err(DbError::ForeignKeyViolation)` - Unknown user (rolled back)
    /// * `Err(DbError::UniqueViolation)` - Id taken by a concurrent create
    pub async fn create_ticket(&self, ticket: &NewTicket) -> DbResult<TicketId> {
        ticket.validate()?;

        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let ticket_id = next_id(&mut *tx, now).await;
        debug!(ticket_id = %ticket_id, user_id = ticket.user_id, "Creating ticket");

        sqlx::query(
            r#"
            INSERT INTO tickets (ticket_id, contenido, tipo, fecha)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&ticket_id)
        .bind(ticket.content())
        .bind(ticket.ticket_type)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO mensaje_tickets (
                ticket_id, nombre_cliente, email_cliente, asunto, descripcion,
                prioridad, estado, fecha_creacion, usuario_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&ticket_id)
        .bind(ticket.requester_name.trim())
        .bind(ticket.requester_email.trim())
        .bind(ticket.subject.trim())
        .bind(ticket.description.trim())
        .bind(ticket.priority)
        .bind(TicketStatus::Open)
        .bind(now)
        .bind(ticket.user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(ticket_id = %ticket_id, "Ticket created");
        Ok(ticket_id)
    }

    /// Moves a ticket to `status` and notes the change in its chat.
    ///
    /// ## Returns
    /// * `Err(DbError::Rule(CoreError::StatusUnchanged))` - Already in `status`
    /// * `Err(DbError::Rule(CoreError::TicketNotFound))` - Unknown ticket
    pub async fn update_status(
        &self,
        ticket_id: &TicketId,
        status: TicketStatus,
    ) -> DbResult<StatusChange> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let row: Option<(TicketStatus, String, Option<DateTime<Utc>>)> = sqlx::query_as(
            "SELECT estado, descripcion, fecha_creacion FROM mensaje_tickets WHERE ticket_id = ?1",
        )
        .bind(ticket_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (current, description, created_at) =
            row.ok_or_else(|| CoreError::TicketNotFound(ticket_id.to_string()))?;

        let change = current.change_to(status)?;

        let mut history = ChatHistory::parse_stored(&description, created_at)?;
        history.push(ChatMessage::new(
            ChatAuthor::System,
            change.system_note(),
            Utc::now(),
        ))?;

        sqlx::query("UPDATE mensaje_tickets SET estado = ?2, descripcion = ?3 WHERE ticket_id = ?1")
            .bind(ticket_id)
            .bind(status)
            .bind(history.to_json()?)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            ticket_id = %ticket_id,
            from = %change.from,
            to = %change.to,
            "Ticket status changed"
        );
        Ok(change)
    }

    /// Closes a ticket. Closing a closed ticket yields `StatusUnchanged`.
    pub async fn close(&self, ticket_id: &TicketId) -> DbResult<StatusChange> {
        self.update_status(ticket_id, TicketStatus::Closed).await
    }

    /// Appends a chat message and returns the updated conversation.
    ///
    /// With `owner = Some(user_id)` the ticket must belong to that user.
    /// A plain-text description is converted to a history whose first entry
    /// is the first client message.
    pub async fn append_chat_message(
        &self,
        ticket_id: &TicketId,
        author: ChatAuthor,
        text: &str,
        owner: Option<i64>,
    ) -> DbResult<ChatHistory> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let row: Option<(String, Option<DateTime<Utc>>)> = sqlx::query_as(
            r#"
            SELECT descripcion, fecha_creacion
            FROM mensaje_tickets
            WHERE ticket_id = ?1 AND (?2 IS NULL OR usuario_id = ?2)
            "#,
        )
        .bind(ticket_id)
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await?;

        let (description, created_at) =
            row.ok_or_else(|| CoreError::TicketNotFound(ticket_id.to_string()))?;

        let mut history = ChatHistory::parse_stored(&description, created_at)?;
        history.push(ChatMessage::new(author, text.trim(), Utc::now()))?;

        sqlx::query("UPDATE mensaje_tickets SET descripcion = ?2 WHERE ticket_id = ?1")
            .bind(ticket_id)
            .bind(history.to_json()?)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(ticket_id = %ticket_id, messages = history.len(), "Chat message appended");
        Ok(history)
    }
}

/// `TK-<year>-<count+1>` for the year of `now`, or the timestamp fallback.
async fn next_id<'e, E>(executor: E, now: DateTime<Utc>) -> TicketId
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let year = now.year();
    let pattern = format!("{}%", TicketId::year_prefix(year));

    let result: Result<i64, sqlx::Error> =
        sqlx::query_scalar("SELECT COUNT(*) + 1 FROM tickets WHERE ticket_id LIKE ?1")
            .bind(pattern)
            .fetch_one(executor)
            .await;

    match result {
        Ok(sequence) => TicketId::sequential(year, sequence),
        Err(e) => {
            warn!(error = %e, "Ticket sequence query failed, using timestamp id");
            TicketId::fallback(year, now.timestamp_millis())
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};
    use fabrica_core::TicketType;

    use super::*;

    async fn setup() -> (Database, SupportRepository, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user_id = db.users().register("ana@fabrica.es", "secreto").await.unwrap();
        let support = db.support();
        (db, support, user_id)
    }

    fn new_ticket(user_id: i64, subject: &str, priority: TicketPriority) -> NewTicket {
        NewTicket {
            requester_name: "Ana Pérez".to_string(),
            requester_email: "ana@fabrica.es".to_string(),
            subject: subject.to_string(),
            description: "Faltan dos cajas del pedido".to_string(),
            priority,
            ticket_type: TicketType::Problem,
            user_id,
        }
    }

    fn current_prefix() -> String {
        TicketId::year_prefix(Utc::now().year())
    }

    #[tokio::test]
    async fn test_create_then_read() {
        let (_db, support, user_id) = setup().await;

        let id = support
            .create_ticket(&new_ticket(user_id, "Pedido incompleto", TicketPriority::High))
            .await
            .unwrap();
        assert_eq!(id.as_str(), format!("{}001", current_prefix()));

        let detail = support.get_detail(&id).await.unwrap().unwrap();
        assert_eq!(detail.info.ticket_id, id);
        assert_eq!(detail.info.requester_name, "Ana Pérez");
        assert_eq!(detail.info.subject, "Pedido incompleto");
        assert_eq!(detail.info.priority, TicketPriority::High);
        assert_eq!(detail.info.status, TicketStatus::Open);
        assert_eq!(detail.info.ticket_type, TicketType::Problem);
        assert_eq!(detail.description, "Faltan dos cajas del pedido");
        assert_eq!(
            detail.content,
            "Asunto: Pedido incompleto\n\nDescripción: Faltan dos cajas del pedido"
        );
        assert!(detail.info.created_at.is_some());
        assert!(detail.has_complete_information());

        let missing = TicketId::sequential(1999, 1);
        assert!(support.get_detail(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ids_are_sequential_within_year() {
        let (_db, support, user_id) = setup().await;

        assert_eq!(
            support.next_ticket_id().await.as_str(),
            format!("{}001", current_prefix())
        );

        for _ in 0..3 {
            support
                .create_ticket(&new_ticket(user_id, "Hola", TicketPriority::Low))
                .await
                .unwrap();
        }

        let next = support.next_ticket_id().await;
        assert_eq!(next.sequence(), 4);
        assert_eq!(next.year(), Utc::now().year());
    }

    #[tokio::test]
    async fn test_other_years_do_not_count() {
        let (db, support, _user_id) = setup().await;
        sqlx::query("INSERT INTO tickets (ticket_id, contenido, tipo) VALUES ('TK-1999-001', 'x', 'consulta')")
            .execute(db.pool())
            .await
            .unwrap();

        assert_eq!(support.next_ticket_id().await.sequence(), 1);
    }

    #[tokio::test]
    async fn test_failed_message_insert_rolls_back_ticket() {
        let (db, support, user_id) = setup().await;

        let err = support
            .create_ticket(&new_ticket(user_id + 999, "Sin usuario", TicketPriority::Medium))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        let tickets: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tickets")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(tickets, 0);
    }

    #[tokio::test]
    async fn test_invalid_ticket_not_written() {
        let (_db, support, user_id) = setup().await;

        let mut ticket = new_ticket(user_id, "  ", TicketPriority::Low);
        assert!(matches!(
            support.create_ticket(&ticket).await,
            Err(DbError::Rule(CoreError::Validation(_)))
        ));

        ticket.subject = "Hola".to_string();
        ticket.requester_email = "sin-arroba".to_string();
        assert!(support.create_ticket(&ticket).await.is_err());

        assert!(support.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_all_sorted_by_priority_for_equal_timestamps() {
        let (db, support, user_id) = setup().await;

        for (subject, priority) in [
            ("baja", TicketPriority::Low),
            ("urgente", TicketPriority::Urgent),
            ("media", TicketPriority::Medium),
            ("alta", TicketPriority::High),
        ] {
            support
                .create_ticket(&new_ticket(user_id, subject, priority))
                .await
                .unwrap();
        }

        sqlx::query("UPDATE mensaje_tickets SET fecha_creacion = '2025-01-15 10:00:00'")
            .execute(db.pool())
            .await
            .unwrap();

        let priorities: Vec<_> = support
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.priority)
            .collect();
        assert_eq!(
            priorities,
            vec![
                TicketPriority::Urgent,
                TicketPriority::High,
                TicketPriority::Medium,
                TicketPriority::Low
            ]
        );
    }

    #[tokio::test]
    async fn test_list_all_newest_first_within_priority() {
        let (db, support, user_id) = setup().await;

        let old = support
            .create_ticket(&new_ticket(user_id, "viejo", TicketPriority::High))
            .await
            .unwrap();
        let new = support
            .create_ticket(&new_ticket(user_id, "nuevo", TicketPriority::High))
            .await
            .unwrap();

        sqlx::query("UPDATE mensaje_tickets SET fecha_creacion = '2024-01-01 00:00:00' WHERE ticket_id = ?1")
            .bind(&old)
            .execute(db.pool())
            .await
            .unwrap();

        let ids: Vec<_> = support
            .list_by_priority(TicketPriority::High)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.ticket_id)
            .collect();
        assert_eq!(ids, vec![new, old]);
        assert!(support
            .list_by_priority(TicketPriority::Low)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_status_changes() {
        let (_db, support, user_id) = setup().await;
        let id = support
            .create_ticket(&new_ticket(user_id, "Hola", TicketPriority::Low))
            .await
            .unwrap();

        assert!(matches!(
            support.update_status(&id, TicketStatus::Open).await,
            Err(DbError::Rule(CoreError::StatusUnchanged(TicketStatus::Open)))
        ));

        let change = support.update_status(&id, TicketStatus::InProgress).await.unwrap();
        assert_eq!(change.from, TicketStatus::Open);

        support.close(&id).await.unwrap();
        assert!(matches!(
            support.close(&id).await,
            Err(DbError::Rule(CoreError::StatusUnchanged(TicketStatus::Closed)))
        ));

        // Reopening is allowed
        support.update_status(&id, TicketStatus::Open).await.unwrap();

        let detail = support.get_detail(&id).await.unwrap().unwrap();
        assert_eq!(detail.info.status, TicketStatus::Open);

        let history = detail.chat_history();
        let notes: Vec<_> = history
            .messages()
            .iter()
            .filter(|m| m.author == ChatAuthor::System)
            .map(|m| m.text.as_str())
            .collect();
        assert_eq!(
            notes,
            vec![
                "Estado cambiado a 'EN PROCESO'",
                "Ticket cerrado por el soporte",
                "Estado cambiado a 'ABIERTO'"
            ]
        );

        let unknown = TicketId::sequential(1999, 1);
        let err = support.update_status(&unknown, TicketStatus::Closed).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_counts() {
        let (_db, support, user_id) = setup().await;
        let a = support
            .create_ticket(&new_ticket(user_id, "a", TicketPriority::Low))
            .await
            .unwrap();
        support
            .create_ticket(&new_ticket(user_id, "b", TicketPriority::Low))
            .await
            .unwrap();
        support.close(&a).await.unwrap();

        assert_eq!(support.count_by_status(TicketStatus::Open).await.unwrap(), 1);
        assert_eq!(support.count_by_status(TicketStatus::Closed).await.unwrap(), 1);
        assert_eq!(support.count_by_status(TicketStatus::Resolved).await.unwrap(), 0);

        assert_eq!(
            support.status_summary().await.unwrap(),
            vec![
                (TicketStatus::Open, 1),
                (TicketStatus::InProgress, 0),
                (TicketStatus::Resolved, 0),
                (TicketStatus::Closed, 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_user_scoped_access() {
        let (db, support, ana) = setup().await;
        let luis = db.users().register("luis@fabrica.es", "secreto").await.unwrap();

        let id = support
            .create_ticket(&new_ticket(ana, "De Ana", TicketPriority::Low))
            .await
            .unwrap();

        assert_eq!(support.list_by_user(ana).await.unwrap().len(), 1);
        assert!(support.list_by_user(luis).await.unwrap().is_empty());

        assert!(support.get_detail_for_user(&id, ana).await.unwrap().is_some());
        assert!(support.get_detail_for_user(&id, luis).await.unwrap().is_none());

        let err = support
            .append_chat_message(&id, ChatAuthor::Client, "¿Hola?", Some(luis))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_chat_append() {
        let (_db, support, user_id) = setup().await;
        let id = support
            .create_ticket(&new_ticket(user_id, "Hola", TicketPriority::Low))
            .await
            .unwrap();

        let history = support
            .append_chat_message(&id, ChatAuthor::Client, "¿Alguna novedad?", Some(user_id))
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.messages()[0].text, "Faltan dos cajas del pedido");

        support
            .append_chat_message(&id, ChatAuthor::Support, " Enviado hoy ", None)
            .await
            .unwrap();

        let history = support.get_detail(&id).await.unwrap().unwrap().chat_history();
        assert_eq!(history.len(), 3);
        assert_eq!(history.messages()[2].author, ChatAuthor::Support);
        assert_eq!(history.messages()[2].text, "Enviado hoy");

        assert!(support
            .append_chat_message(&id, ChatAuthor::Client, "   ", None)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_stored_history_from_other_tools_is_kept() {
        let (db, support, user_id) = setup().await;
        let id = support
            .create_ticket(&new_ticket(user_id, "Hola", TicketPriority::Low))
            .await
            .unwrap();

        let set_description = |text: &'static str| {
            sqlx::query::<sqlx::Sqlite>(
                "UPDATE mensaje_tickets SET descripcion = ?2 WHERE ticket_id = ?1",
            )
            .bind(id.clone())
            .bind(text)
        };

        set_description(r#"[{"autor":"admin","mensaje":"Revisado"}]"#)
            .execute(db.pool())
            .await
            .unwrap();
        support.update_status(&id, TicketStatus::InProgress).await.unwrap();
        let history = support.get_detail(&id).await.unwrap().unwrap().chat_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history.messages()[0].author, ChatAuthor::Other("admin".into()));
        assert_eq!(history.messages()[1].author, ChatAuthor::System);

        let broken = r#"[1, 2]"#;
        set_description(broken).execute(db.pool()).await.unwrap();
        let err = support
            .append_chat_message(&id, ChatAuthor::Support, "Hola", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::ChatHistory(_))));
        assert!(support.close(&id).await.is_err());

        let detail = support.get_detail(&id).await.unwrap().unwrap();
        assert_eq!(detail.description, broken);
        assert_eq!(detail.info.status, TicketStatus::InProgress);
    }
}
