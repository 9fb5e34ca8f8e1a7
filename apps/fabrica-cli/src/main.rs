//! # fabrica
//!
//! Back office binary for Fábrica de Libros.
//!
//! ```text
//! fabrica register --email ana@fabrica.es --password secreto --confirm secreto
//! fabrica product add --name "Rayuela" --price 16,50 --quantity 8
//! fabrica ticket create --user ana@fabrica.es --password secreto \
//!     --name "Ana Pérez" --subject "Pedido" --description "Faltan dos cajas"
//! fabrica ticket list --json
//! ```

use std::process::ExitCode;

use clap::Parser;

use fabrica_cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    fabrica_cli::init_tracing();

    // The setup is in lib.rs so commands are testable
    let cli = Cli::parse();
    fabrica_cli::run(cli).await
}
