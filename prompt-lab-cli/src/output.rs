//! Output formatting for CLI

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use prompt_lab_core::{ResultTable, RESULT_COLUMNS};
use prompt_lab_metrics::{strategy_performance, StrategyPerformance};
use prompt_lab_workflow::{csv_field, escape_html, render_csv, render_html};
use serde::Serialize;

/// Longest response text shown in a console table cell.
const MAX_CELL_CHARS: usize = 60;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Tables on the terminal (default)
    #[default]
    Console,
    /// Comma-separated values
    Csv,
    /// JSON
    Json,
    /// Self-contained HTML
    Html,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Console => write!(f, "console"),
            Self::Csv => write!(f, "csv"),
            Self::Json => write!(f, "json"),
            Self::Html => write!(f, "html"),
        }
    }
}

/// Output writer that handles different formats
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(format: OutputFormat, no_color: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format }
    }

    pub fn is_console(&self) -> bool {
        self.format == OutputFormat::Console
    }

    fn table(headers: &[&str]) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.apply_modifier(UTF8_ROUND_CORNERS);
        let header_cells: Vec<Cell> = headers
            .iter()
            .map(|h| Cell::new(h).fg(Color::Cyan))
            .collect();
        table.set_header(header_cells);
        table
    }

    /// Write a single item
    pub fn write<T: Serialize + TableDisplay>(&self, item: &T) -> Result<()> {
        match self.format {
            OutputFormat::Console => item.display_single(),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(item)?),
            OutputFormat::Csv => {
                println!("{}", item.headers().join(","));
                println!("{}", csv_line(&item.fields()));
            }
            OutputFormat::Html => print!("{}", html_table(&item.headers(), &[item.fields()])),
        }
        Ok(())
    }

    /// Write a list of items
    pub fn write_list<T: Serialize + TableDisplay>(&self, items: &[T], headers: &[&str]) -> Result<()> {
        match self.format {
            OutputFormat::Console => {
                if items.is_empty() {
                    println!("{}", "No items found.".dimmed());
                    return Ok(());
                }

                let mut table = Self::table(headers);
                for item in items {
                    table.add_row(item.to_row());
                }

                println!("{table}");
                println!(
                    "\n{} {} item(s)",
                    "Total:".bold(),
                    items.len().to_string().green()
                );
            }
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(items)?),
            OutputFormat::Csv => {
                println!("{}", headers.join(","));
                for item in items {
                    println!("{}", csv_line(&item.fields()));
                }
            }
            OutputFormat::Html => {
                let rows: Vec<Vec<String>> = items.iter().map(|i| i.fields()).collect();
                print!("{}", html_table(headers, &rows));
            }
        }
        Ok(())
    }

    /// Write the rows of one run followed by per-strategy statistics.
    pub fn write_results(&self, task_key: &str, table: &ResultTable) -> Result<()> {
        match self.format {
            OutputFormat::Console => {
                if table.is_empty() {
                    println!("{}", "No results.".dimmed());
                    return Ok(());
                }

                let mut out = Self::table(&RESULT_COLUMNS);
                for row in table.rows() {
                    let cells = row.cells();
                    let accuracy = row.accuracy;
                    let mut rendered: Vec<Cell> = cells[..6]
                        .iter()
                        .map(|c| Cell::new(truncate(c, MAX_CELL_CHARS)))
                        .collect();
                    rendered.push(Cell::new(accuracy_badge(accuracy)));
                    out.add_row(rendered);
                }
                println!("{out}");

                self.write_performance(&strategy_performance(table));
                print_section("Summary");
                print_field("Total tests", &table.len().to_string());
                print_field("Successful tests", &table.accuracies().len().to_string());
                print_field("Average accuracy", &accuracy_badge(table.mean_accuracy()));
            }
            OutputFormat::Csv => print!("{}", render_csv(table)),
            OutputFormat::Json => println!("{}", table.to_json()?),
            OutputFormat::Html => {
                print!("{}", render_html(&[(task_key.to_string(), table.clone())]))
            }
        }
        Ok(())
    }

    /// Console-only table of per-strategy accuracy statistics.
    pub fn write_performance(&self, performance: &[StrategyPerformance]) {
        if !self.is_console() || performance.is_empty() {
            return;
        }

        print_section("Performance by Strategy");
        let mut table = Self::table(&["Prompt Type", "Prompt Format", "Mean", "Std", "Count"]);
        for perf in performance {
            table.add_row(vec![
                Cell::new(&perf.prompt_type),
                Cell::new(&perf.prompt_format),
                Cell::new(accuracy_badge(perf.mean_f64())),
                Cell::new(
                    perf.std_dev
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ),
                Cell::new(perf.count),
            ]);
        }
        println!("{table}");
    }

    /// Write a success message
    pub fn success(&self, message: &str) {
        if self.is_console() {
            println!("{} {}", "✓".green(), message);
        } else {
            eprintln!("{}", message);
        }
    }

    /// Write an error message
    pub fn error(&self, message: &str) {
        if self.is_console() {
            eprintln!("{} {}", "✗".red(), message);
        } else {
            eprintln!("Error: {}", message);
        }
    }

    /// Write a warning message
    pub fn warning(&self, message: &str) {
        if self.is_console() {
            println!("{} {}", "⚠".yellow(), message);
        } else {
            eprintln!("Warning: {}", message);
        }
    }

    /// Write an info message
    pub fn info(&self, message: &str) {
        if self.is_console() {
            println!("{} {}", "ℹ".blue(), message);
        } else {
            eprintln!("{}", message);
        }
    }

    /// Create a progress bar; hidden unless printing to the console.
    pub fn progress_bar(&self, total: u64, message: &str) -> indicatif::ProgressBar {
        if !self.is_console() {
            return indicatif::ProgressBar::hidden();
        }
        let pb = indicatif::ProgressBar::new(total);
        if let Ok(style) = indicatif::ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏ "));
        }
        pb.set_message(message.to_string());
        pb
    }
}

/// Trait for displaying items in a table
pub trait TableDisplay {
    fn headers(&self) -> Vec<&'static str>;

    /// Plain cell values in header order
    fn fields(&self) -> Vec<String>;

    /// Convert item to a table row
    fn to_row(&self) -> Vec<Cell> {
        self.fields().into_iter().map(Cell::new).collect()
    }

    /// Display a single item in detail
    fn display_single(&self) {
        for (header, value) in self.headers().into_iter().zip(self.fields()) {
            print_field(header, &value);
        }
    }
}

fn csv_line(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| csv_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

fn html_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut html = String::from("<table>\n  <tr>");
    for h in headers {
        html.push_str(&format!("<th>{}</th>", escape_html(h)));
    }
    html.push_str("</tr>\n");
    for row in rows {
        html.push_str("  <tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape_html(cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");
    html
}

/// Print a key-value pair in detail format
pub fn print_field(key: &str, value: &str) {
    println!("  {}: {}", key.cyan(), value);
}

/// Print a list field
pub fn print_list_field(key: &str, values: &[String]) {
    if values.is_empty() {
        println!("  {}: {}", key.cyan(), "-".dimmed());
    } else {
        println!("  {}:", key.cyan());
        for v in values {
            println!("    - {}", v);
        }
    }
}

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", title.bold().underline());
}

/// Single-line, length-capped cell text.
pub fn truncate(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

/// Accuracy with color
pub fn accuracy_badge(accuracy: Option<f64>) -> String {
    match accuracy {
        None => "-".dimmed().to_string(),
        Some(a) if a >= 0.8 => format!("{a:.3}").green().to_string(),
        Some(a) if a >= 0.5 => format!("{a:.3}").yellow().to_string(),
        Some(a) => format!("{a:.3}").red().to_string(),
    }
}
