//! Terminal rendering for command results.
//!
//! Human mode prints styled lines and tables; `--json` mode prints a single
//! `{"status": ..., "data": ...}` envelope on stdout and sends notices to stderr.

use console::{style, StyledObject};
use meterguard_core::models::Severity;
use serde::Serialize;
use std::fmt::Display;
use tabled::{settings::Style, Table, Tabled};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Human,
    Json,
}

#[derive(Debug, Clone, Copy)]
enum Notice {
    Done,
    Note,
    Caution,
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

pub struct OutputWriter {
    mode: Mode,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self { mode: if json { Mode::Json } else { Mode::Human } }
    }

    pub fn is_json(&self) -> bool {
        self.mode == Mode::Json
    }

    pub fn success(&self, message: impl Display) {
        self.notice(Notice::Done, message);
    }

    /// Human-only hint; dropped in JSON mode
    pub fn info(&self, message: impl Display) {
        self.notice(Notice::Note, message);
    }

    pub fn warning(&self, message: impl Display) {
        self.notice(Notice::Caution, message);
    }

    fn notice(&self, kind: Notice, message: impl Display) {
        match (self.mode, kind) {
            (Mode::Human, Notice::Done) => println!("{} {}", style("✓").green().bold(), message),
            (Mode::Human, Notice::Note) => println!("{} {}", style("•").cyan(), message),
            (Mode::Human, Notice::Caution) => {
                eprintln!("{} {}", style("!").yellow().bold(), message)
            }
            (Mode::Json, Notice::Note) => {}
            (Mode::Json, Notice::Done) => {
                let envelope: Envelope<'_, ()> =
                    Envelope { status: "success", message: Some(message.to_string()), data: None };
                if let Ok(text) = serde_json::to_string(&envelope) {
                    println!("{}", text);
                }
            }
            (Mode::Json, Notice::Caution) => {
                let envelope: Envelope<'_, ()> =
                    Envelope { status: "warning", message: Some(message.to_string()), data: None };
                if let Ok(text) = serde_json::to_string(&envelope) {
                    eprintln!("{}", text);
                }
            }
        }
    }

    /// Emit the command's payload; a no-op in human mode
    pub fn result<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.is_json() {
            let envelope = Envelope { status: "success", message: None, data: Some(data) };
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
        Ok(())
    }

    pub fn table<T: Tabled>(&self, rows: impl IntoIterator<Item = T>) {
        if self.is_json() {
            return;
        }
        let mut table = Table::new(rows);
        table.with(Style::modern());
        println!("{}", table);
    }

    pub fn kv(&self, key: impl Display, value: impl Display) {
        if !self.is_json() {
            println!("  {:<18} {}", style(format!("{}:", key)).bold(), value);
        }
    }

    /// Key/value line with the severity colored by how bad it is
    pub fn risk(&self, key: impl Display, severity: Severity) {
        self.kv(key, severity_style(severity));
    }

    pub fn section(&self, title: impl Display) {
        if !self.is_json() {
            println!("\n{}", style(title).bold().underlined());
        }
    }
}

fn severity_style(severity: Severity) -> StyledObject<String> {
    let label = style(severity.to_string());
    match severity {
        Severity::Low => label.green(),
        Severity::Medium => label.yellow(),
        Severity::High => label.red(),
        Severity::Critical => label.red().bold().reverse(),
    }
}
