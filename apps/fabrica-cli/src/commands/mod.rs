//! # Command Handlers
//!
//! One module per area. Every handler takes the [`Database`] handle and
//! already-parsed arguments and returns the text to print, so handlers are
//! tested without spawning the binary.
//!
//! ```text
//!   lib.rs (clap)  ──►  commands::product::search(&db, "atlas", fmt)
//!                                    │
//!                                    ▼
//!                         CliResult<String>  ──►  stdout / stderr
//! ```
//!
//! [`Database`]: fabrica_db::Database

pub mod auth;
pub mod product;
pub mod seed;
pub mod ticket;

use serde::Serialize;

use crate::error::CliResult;

/// How list and detail commands print records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Renders `value` as pretty JSON or via `text`.
pub(crate) fn render<T: Serialize + ?Sized>(
    format: OutputFormat,
    value: &T,
    text: impl FnOnce(&T) -> String,
) -> CliResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Text => Ok(text(value)),
    }
}

/// Left-aligned plain-text table. Column widths follow the widest cell.
pub(crate) fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(line(headers.to_vec()));
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in rows {
        out.push(line(row.iter().map(String::as_str).collect()));
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_alignment() {
        let out = table(
            &["ID", "Nombre"],
            &[
                vec!["1".into(), "Rayuela".into()],
                vec!["12".into(), "El túnel".into()],
            ],
        );
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], "ID  Nombre");
        assert_eq!(lines[1], "--  --------");
        assert_eq!(lines[2], "1   Rayuela");
        assert_eq!(lines[3], "12  El túnel");
    }

    #[test]
    fn test_render_json() {
        let out = render(OutputFormat::Json, &vec![1, 2], |_| unreachable!()).unwrap();
        assert_eq!(out, "[\n  1,\n  2\n]");
        let out = render(OutputFormat::Text, &3, |v| format!("tres={}", v)).unwrap();
        assert_eq!(out, "tres=3");
    }
}
