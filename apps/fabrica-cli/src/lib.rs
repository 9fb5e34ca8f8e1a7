//! # Fábrica de Libros CLI
//!
//! Terminal front end for the bookshop back office: accounts, book stock
//! and the support desk.
//!
//! ## Module Organization
//! ```text
//! fabrica_cli/
//! ├── lib.rs          ◄─── You are here (argument parsing & dispatch)
//! ├── config.rs       ◄─── Environment settings
//! ├── error.rs        ◄─── CliError and exit codes
//! └── commands/
//!     ├── mod.rs      ◄─── Output helpers (table, --json)
//!     ├── auth.rs     ◄─── register / login
//!     ├── product.rs  ◄─── Stock CRUD and search
//!     ├── ticket.rs   ◄─── Support tickets and chat
//!     └── seed.rs     ◄─── Demo data
//! ```
//!
//! ## Run Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Initialize Logging ── stderr, RUST_LOG or DEFAULT_LOG_FILTER        │
//! │  2. Parse Arguments ───── clap; usage errors exit with status 2         │
//! │  3. Resolve Config ────── env vars, then --db                           │
//! │  4. Open Database ─────── create parent dir, pool, migrations           │
//! │  5. Dispatch ──────────── commands::* → text on stdout                  │
//! │  6. Exit ──────────────── 0, or ErrorCode::exit_code() with message     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod config;
pub mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use commands::product::ProductForm;
use commands::ticket::{Credentials, TicketForm};
use commands::OutputFormat;
use config::{AppConfig, DEFAULT_LOG_FILTER};
use error::{CliError, CliResult};
use fabrica_core::{TicketPriority, TicketStatus, TicketType};
use fabrica_db::Database;

/// Fábrica de Libros back office
#[derive(Parser, Debug)]
#[command(name = "fabrica", version)]
#[command(about = "Stock and support desk for Fábrica de Libros")]
pub struct Cli {
    /// SQLite database file (overrides FABRICA_DB_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Print records as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Password again
        #[arg(long)]
        confirm: String,
    },

    /// Check email and password
    Login(LoginArgs),

    /// Book stock
    #[command(subcommand)]
    Product(ProductCommand),

    /// Support tickets
    #[command(subcommand)]
    Ticket(TicketCommand),

    /// Load the demo account, catalogue and tickets
    Seed,
}

/// Credentials of the acting client.
#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    /// Account email
    #[arg(long = "user", value_name = "EMAIL")]
    pub email: String,
    #[arg(long)]
    pub password: String,
}

impl From<LoginArgs> for Credentials {
    fn from(args: LoginArgs) -> Self {
        Credentials {
            email: args.email,
            password: args.password,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ProductArgs {
    #[arg(long)]
    pub name: String,
    /// Unit price, e.g. 12.50 or 12,50
    #[arg(long)]
    pub price: String,
    #[arg(long)]
    pub quantity: String,
}

impl From<ProductArgs> for ProductForm {
    fn from(args: ProductArgs) -> Self {
        ProductForm {
            name: args.name,
            price: args.price,
            quantity: args.quantity,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ProductCommand {
    /// All products by name
    List,
    /// One product
    Show { id: i64 },
    /// Add a product
    Add(ProductArgs),
    /// Replace a product's fields
    Update {
        id: i64,
        #[command(flatten)]
        fields: ProductArgs,
    },
    /// Delete a product
    Delete { id: i64 },
    /// Search by name or price
    Search {
        /// Lists everything when omitted
        term: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum TicketCommand {
    /// All tickets, most urgent first
    List,
    /// Ticket detail and conversation
    Show { ticket_id: String },
    /// File a ticket as a client
    Create {
        #[command(flatten)]
        login: LoginArgs,
        /// Requester name
        #[arg(long)]
        name: String,
        /// Contact email (defaults to the login email)
        #[arg(long)]
        contact_email: Option<String>,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        description: String,
        /// baja, media, alta or urgente
        #[arg(long, default_value = "media")]
        priority: TicketPriority,
        /// consulta, problema, sugerencia or urgente
        #[arg(long = "type", default_value = "consulta")]
        ticket_type: TicketType,
    },
    /// Change a ticket's status
    Status {
        ticket_id: String,
        /// abierto, en_proceso, resuelto or cerrado
        status: TicketStatus,
    },
    /// Close a ticket
    Close { ticket_id: String },
    /// Show or extend the conversation
    Chat {
        ticket_id: String,
        /// Message to send
        #[arg(long)]
        message: Option<String>,
        /// Send as this client instead of support
        #[arg(long = "user", value_name = "EMAIL", requires = "password")]
        email: Option<String>,
        #[arg(long, requires = "email")]
        password: Option<String>,
    },
    /// Tickets per status
    Stats,
    /// Tickets with one priority
    ByPriority { priority: TicketPriority },
    /// Tickets filed by the logged-in client
    Mine(LoginArgs),
}

/// Initializes the tracing subscriber. Logs go to stderr so stdout stays
/// clean for command output.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=fabrica_db=trace` - Trace the data layer only
/// - Default: [`DEFAULT_LOG_FILTER`]
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Opens the database and runs one command, printing its output.
pub async fn run(cli: Cli) -> ExitCode {
    let config = AppConfig::from_env().with_db_override(cli.db.clone());
    debug!(db_path = ?config.db_path, "Configuration resolved");

    let result = match open_database(&config).await {
        Ok(db) => {
            let result = execute(&db, cli).await;
            db.close().await;
            result
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.code.exit_code())
        }
    }
}

async fn open_database(config: &AppConfig) -> CliResult<Database> {
    if let Some(parent) = config.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            tracing::error!(error = %e, path = ?parent, "Cannot create database directory");
            CliError::internal(format!(
                "No se pudo crear el directorio {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let db = Database::new(config.db_config())
        .await
        .map_err(|e| CliError::from_db(e, "No se pudo abrir la base de datos."))?;
    info!(db_path = ?config.db_path, "Database ready");
    Ok(db)
}

/// Dispatches a parsed command against `db`.
pub async fn execute(db: &Database, cli: Cli) -> CliResult<String> {
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    match cli.command {
        Command::Register {
            email,
            password,
            confirm,
        } => commands::auth::register(db, &email, &password, &confirm).await,
        Command::Login(login) => commands::auth::login(db, &login.email, &login.password).await,
        Command::Product(cmd) => product(db, cmd, format).await,
        Command::Ticket(cmd) => ticket(db, cmd, format).await,
        Command::Seed => commands::seed::run(db).await,
    }
}

async fn product(db: &Database, cmd: ProductCommand, format: OutputFormat) -> CliResult<String> {
    use commands::product;

    match cmd {
        ProductCommand::List => product::list(db, format).await,
        ProductCommand::Show { id } => product::show(db, id, format).await,
        ProductCommand::Add(fields) => product::add(db, &fields.into()).await,
        ProductCommand::Update { id, fields } => product::update(db, id, &fields.into()).await,
        ProductCommand::Delete { id } => product::delete(db, id).await,
        ProductCommand::Search { term } => {
            product::search(db, term.as_deref().unwrap_or_default(), format).await
        }
    }
}

async fn ticket(db: &Database, cmd: TicketCommand, format: OutputFormat) -> CliResult<String> {
    use commands::ticket;

    match cmd {
        TicketCommand::List => ticket::list(db, format).await,
        TicketCommand::Show { ticket_id } => ticket::show(db, &ticket_id, format).await,
        TicketCommand::Create {
            login,
            name,
            contact_email,
            subject,
            description,
            priority,
            ticket_type,
        } => {
            let form = TicketForm {
                name,
                contact_email,
                subject,
                description,
                priority,
                ticket_type,
            };
            ticket::create(db, &login.into(), &form).await
        }
        TicketCommand::Status { ticket_id, status } => {
            ticket::set_status(db, &ticket_id, status).await
        }
        TicketCommand::Close { ticket_id } => ticket::close(db, &ticket_id).await,
        TicketCommand::Chat {
            ticket_id,
            message,
            email,
            password,
        } => {
            let creds = match (email, password) {
                (Some(email), Some(password)) => Some(Credentials { email, password }),
                _ => None,
            };
            ticket::chat(db, &ticket_id, message.as_deref(), creds.as_ref()).await
        }
        TicketCommand::Stats => ticket::stats(db, format).await,
        TicketCommand::ByPriority { priority } => ticket::by_priority(db, priority, format).await,
        TicketCommand::Mine(login) => ticket::mine(db, &login.into(), format).await,
    }
}
