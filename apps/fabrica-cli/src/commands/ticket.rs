//! Support ticket commands.
//!
//! Support staff commands (`list`, `show`, `status`, `close`, `stats`,
//! `by-priority`) need no login. Client commands (`create`, `mine`, and
//! `chat` with credentials) act as the logged-in user and only see that
//! user's tickets.

use tracing::info;

use super::{auth, render, table, OutputFormat};
use crate::error::{CliError, CliResult};
use fabrica_core::{
    ChatAuthor, ChatHistory, CoreError, NewTicket, TicketDetail, TicketId, TicketInfo,
    TicketPriority, TicketStatus, TicketType,
};
use fabrica_db::{Database, DbError};

const LOAD_FAILED: &str = "Error al cargar los tickets. Inténtelo nuevamente.";
const CREATE_FAILED: &str = "Error al crear el ticket. Inténtelo nuevamente.";
const STATUS_FAILED: &str = "Error al actualizar el estado. Inténtelo nuevamente.";
const CHAT_FAILED: &str = "Error al enviar el mensaje. Inténtelo nuevamente.";

/// Email and password of the acting client.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Ticket form as typed on the command line.
#[derive(Debug, Clone)]
pub struct TicketForm {
    pub name: String,
    /// Contact address; the login email when absent.
    pub contact_email: Option<String>,
    pub subject: String,
    pub description: String,
    pub priority: TicketPriority,
    pub ticket_type: TicketType,
}

fn ticket_rows(tickets: &[TicketInfo]) -> String {
    let rows: Vec<Vec<String>> = tickets
        .iter()
        .map(|t| {
            vec![
                t.ticket_id.to_string(),
                t.priority.as_str().to_uppercase(),
                t.status.label(),
                t.ticket_type.to_string(),
                t.requester_name.clone(),
                t.subject.clone(),
                t.formatted_date(),
            ]
        })
        .collect();
    table(
        &["Ticket", "Prioridad", "Estado", "Tipo", "Cliente", "Asunto", "Creado"],
        &rows,
    )
}

fn ticket_list(tickets: &[TicketInfo], empty: &str) -> String {
    if tickets.is_empty() {
        empty.to_string()
    } else {
        ticket_rows(tickets)
    }
}

fn render_detail(detail: &TicketDetail) -> String {
    let info = &detail.info;
    let mut out = vec![
        detail.summary(),
        format!("  Cliente:   {} <{}>", info.requester_name, info.requester_email),
        format!("  Asunto:    {}", info.subject),
        format!(
            "  Prioridad: {} ({})",
            info.priority.as_str().to_uppercase(),
            info.priority_color().hex()
        ),
        format!("  Estado:    {} ({})", info.status.label(), info.status_color().hex()),
        format!("  Tipo:      {}", info.ticket_type),
        format!("  Creado:    {}", info.formatted_date()),
    ];
    if !detail.has_complete_information() {
        out.push("  (información incompleta)".to_string());
    }
    out.push(String::new());
    out.push(render_chat(&detail.chat_history()));
    out.join("\n")
}

fn render_chat(history: &ChatHistory) -> String {
    if history.is_empty() {
        return "Sin mensajes.".to_string();
    }
    history
        .messages()
        .iter()
        .map(|m| m.render())
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_id(input: &str) -> CliResult<TicketId> {
    Ok(TicketId::parse(input)?)
}

/// `fabrica ticket list`: all tickets, urgent first.
pub async fn list(db: &Database, format: OutputFormat) -> CliResult<String> {
    let tickets = db
        .support()
        .list_all()
        .await
        .map_err(|e| CliError::from_db(e, LOAD_FAILED))?;

    render(format, &tickets, |t| ticket_list(t, "No hay tickets."))
}

/// `fabrica ticket show <id>`
pub async fn show(db: &Database, ticket_id: &str, format: OutputFormat) -> CliResult<String> {
    let id = parse_id(ticket_id)?;
    let detail = db
        .support()
        .get_detail(&id)
        .await
        .map_err(|e| CliError::from_db(e, LOAD_FAILED))?
        .ok_or_else(|| CliError::not_found("Ticket", id.as_str()))?;

    render(format, &detail, render_detail)
}

/// `fabrica ticket create`: files a ticket as the logged-in user.
pub async fn create(db: &Database, creds: &Credentials, form: &TicketForm) -> CliResult<String> {
    let user = auth::authenticate(db, &creds.email, &creds.password).await?;

    let ticket = NewTicket {
        requester_name: form.name.trim().to_string(),
        requester_email: form
            .contact_email
            .clone()
            .unwrap_or_else(|| user.email.clone()),
        subject: form.subject.clone(),
        description: form.description.clone(),
        priority: form.priority,
        ticket_type: form.ticket_type,
        user_id: user.id,
    };
    ticket.validate()?;

    let id = db
        .support()
        .create_ticket(&ticket)
        .await
        .map_err(|e| CliError::from_db(e, CREATE_FAILED))?;

    info!(ticket_id = %id, user_id = user.id, "Ticket filed from CLI");
    Ok(format!("Ticket {} creado correctamente.", id))
}

/// `fabrica ticket status <id> <status>`
pub async fn set_status(db: &Database, ticket_id: &str, status: TicketStatus) -> CliResult<String> {
    let id = parse_id(ticket_id)?;
    db.support()
        .update_status(&id, status)
        .await
        .map_err(|e| CliError::from_db(e, STATUS_FAILED))?;

    Ok("Estado actualizado correctamente.".to_string())
}

/// `fabrica ticket close <id>`. Closing a closed ticket is a notice, not
/// an error.
pub async fn close(db: &Database, ticket_id: &str) -> CliResult<String> {
    let id = parse_id(ticket_id)?;
    match db.support().close(&id).await {
        Ok(_) => Ok("Ticket cerrado correctamente.".to_string()),
        Err(DbError::Rule(CoreError::StatusUnchanged(_))) => {
            Ok("El ticket ya se encuentra cerrado.".to_string())
        }
        Err(e) => Err(CliError::from_db(e, STATUS_FAILED)),
    }
}

/// `fabrica ticket chat <id> [--message ..]`
///
/// With credentials the message is sent as the client and the ticket must
/// be theirs. Without, it is sent as support.
pub async fn chat(
    db: &Database,
    ticket_id: &str,
    message: Option<&str>,
    creds: Option<&Credentials>,
) -> CliResult<String> {
    let id = parse_id(ticket_id)?;

    let owner = match creds {
        Some(c) => Some(auth::authenticate(db, &c.email, &c.password).await?.id),
        None => None,
    };

    let history = match message {
        Some(text) => {
            let author = if owner.is_some() {
                ChatAuthor::Client
            } else {
                ChatAuthor::Support
            };
            db.support()
                .append_chat_message(&id, author, text, owner)
                .await
                .map_err(|e| CliError::from_db(e, CHAT_FAILED))?
        }
        None => {
            let detail = match owner {
                Some(user_id) => db.support().get_detail_for_user(&id, user_id).await,
                None => db.support().get_detail(&id).await,
            }
            .map_err(|e| CliError::from_db(e, LOAD_FAILED))?
            .ok_or_else(|| CliError::not_found("Ticket", id.as_str()))?;
            detail.chat_history()
        }
    };

    Ok(render_chat(&history))
}

/// `fabrica ticket stats`: count per status.
pub async fn stats(db: &Database, format: OutputFormat) -> CliResult<String> {
    let summary = db
        .support()
        .status_summary()
        .await
        .map_err(|e| CliError::from_db(e, LOAD_FAILED))?;

    render(format, &summary, |summary| {
        let rows: Vec<Vec<String>> = summary
            .iter()
            .map(|(status, count)| vec![status.label(), count.to_string()])
            .collect();
        let total: i64 = summary.iter().map(|(_, c)| c).sum();
        format!("{}\n\nTotal: {}", table(&["Estado", "Tickets"], &rows), total)
    })
}

/// `fabrica ticket by-priority <priority>`
pub async fn by_priority(
    db: &Database,
    priority: TicketPriority,
    format: OutputFormat,
) -> CliResult<String> {
    let tickets = db
        .support()
        .list_by_priority(priority)
        .await
        .map_err(|e| CliError::from_db(e, LOAD_FAILED))?;

    render(format, &tickets, |t| {
        ticket_list(t, "No hay tickets con esa prioridad.")
    })
}

/// `fabrica ticket mine`: tickets filed by the logged-in user.
pub async fn mine(db: &Database, creds: &Credentials, format: OutputFormat) -> CliResult<String> {
    let user = auth::authenticate(db, &creds.email, &creds.password).await?;

    let tickets = db
        .support()
        .list_by_user(user.id)
        .await
        .map_err(|e| CliError::from_db(e, LOAD_FAILED))?;

    render(format, &tickets, |t| {
        ticket_list(t, "Todavía no has creado ningún ticket.")
    })
}
