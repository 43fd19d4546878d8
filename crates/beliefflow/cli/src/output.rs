//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a vector of rows in the specified format
pub fn print_output<T: Serialize + Tabled>(data: Vec<T>, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                println!("{}", "No results".dimmed());
            } else {
                println!("{}", render_table(data));
            }
        }
        OutputFormat::Json => print_json(&data)?,
    }
    Ok(())
}

pub fn render_table<T: Tabled>(data: Vec<T>) -> String {
    Table::new(data).to_string()
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn heading(title: &str) {
    println!("{}", title.bold().cyan());
    println!("{}", "=".repeat(60));
}

/// A probability as a plain fixed-width bar and percentage
pub fn probability_bar(p: f64) -> String {
    let filled = (p.clamp(0.0, 1.0) * 20.0).round() as usize;
    format!(
        "{}{} {:>6.2}%",
        "█".repeat(filled),
        "░".repeat(20 - filled),
        p * 100.0
    )
}
