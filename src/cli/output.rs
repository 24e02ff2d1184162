//! Colored output helpers for CLI
//!
//! Provides consistent, colored terminal output for the Delve CLI.

use crate::research::ProgressEvent;
use owo_colors::OwoColorize;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print the Delve banner
    pub fn banner(&self) {
        if self.colored {
            println!(
                "\n   {} {}\n",
                "delve".bright_cyan().bold(),
                format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
            );
        } else {
            println!("\n   delve v{}\n", env!("CARGO_PKG_VERSION"));
        }
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a step message (for multi-step operations)
    pub fn step(&self, step_num: usize, total: usize, message: &str) {
        if self.colored {
            println!(
                "  {} {}",
                format!("[{}/{}]", step_num, total).dimmed(),
                message.bright_white()
            );
        } else {
            println!("  [{}/{}] {}", step_num, total, message);
        }
    }

    /// Print one progress event of a research run.
    ///
    /// The final report content is printed unindented so it can be piped.
    pub fn progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Trace(id) => self.kv("run", id),
            ProgressEvent::SearchProgress(p) => {
                let label = if p.succeeded {
                    format!("search {} done", p.plan_index + 1)
                } else {
                    format!("search {} failed", p.plan_index + 1)
                };
                self.step(p.completed, p.total, &label);
            }
            ProgressEvent::SearchesComplete { succeeded, failed } if *failed > 0 => self.warning(
                &format!("searches complete ({} ok, {} failed)", succeeded, failed),
            ),
            ProgressEvent::Delivered(ack) => match &ack.reference {
                Some(reference) => self.success(&format!("delivered via {} ({})", ack.channel, reference)),
                None => self.success(&format!("delivered via {}", ack.channel)),
            },
            ProgressEvent::DeliveryFailed(_) => self.warning(&event.to_string()),
            ProgressEvent::Report(content) => {
                self.newline();
                println!("{}", content);
            }
            other => self.info(&other.to_string()),
        }
    }

    /// Print a file creation message
    pub fn created(&self, file_type: &str, path: &str) {
        if self.colored {
            println!(
                "  {} {} {}",
                "✓".green().bold(),
                file_type.dimmed(),
                path.bright_white()
            );
        } else {
            println!("  [CREATED] {} {}", file_type, path);
        }
    }

    /// Print a file skipped message
    pub fn skipped(&self, path: &str, reason: &str) {
        if self.colored {
            println!(
                "  {} {} {}",
                "○".yellow(),
                path.dimmed(),
                format!("({})", reason).yellow()
            );
        } else {
            println!("  [SKIPPED] {} ({})", path, reason);
        }
    }

    /// Print a header for a section
    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Print a hint/tip message
    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "💡".dimmed(), message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// Print a command suggestion
    pub fn command(&self, cmd: &str) {
        if self.colored {
            println!("     {}", format!("$ {}", cmd).bright_cyan());
        } else {
            println!("     $ {}", cmd);
        }
    }

    /// Print completion message
    pub fn complete(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "🚀".green(), message.bright_green().bold());
        } else {
            println!("\n  [DONE] {}", message);
        }
    }

    /// Print a table header row
    pub fn table_header(&self, columns: &[&str]) {
        let header: String = columns
            .iter()
            .map(|c| format!("{:<15}", c))
            .collect::<Vec<_>>()
            .join(" ");
        if self.colored {
            println!("    {}", header.bright_white().bold());
            println!("    {}", "─".repeat(columns.len() * 16).dimmed());
        } else {
            println!("    {}", header);
            println!("    {}", "-".repeat(columns.len() * 16));
        }
    }

    /// Print a table row
    pub fn table_row(&self, values: &[&str]) {
        let row: String = values
            .iter()
            .map(|v| format!("{:<15}", v))
            .collect::<Vec<_>>()
            .join(" ");
        println!("    {}", row);
    }

    /// Print newline
    pub fn newline(&self) {
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::SearchProgress;
    use crate::types::DeliveryAck;

    #[test]
    fn test_output_modes() {
        assert!(Output::new().colored);
        assert!(Output::default().colored);
        assert!(!Output::no_color().colored);
    }

    fn every_event() -> Vec<ProgressEvent> {
        vec![
            ProgressEvent::Trace("trace_0123".into()),
            ProgressEvent::Starting,
            ProgressEvent::Planning,
            ProgressEvent::SearchProgress(SearchProgress {
                completed: 1,
                total: 2,
                plan_index: 1,
                succeeded: false,
            }),
            ProgressEvent::SearchesComplete {
                succeeded: 1,
                failed: 1,
            },
            ProgressEvent::Writing,
            ProgressEvent::Delivered(DeliveryAck {
                channel: "file".into(),
                reference: Some("reports/trace_0123.md".into()),
            }),
            ProgressEvent::DeliveryFailed("down".into()),
            ProgressEvent::Report("# Report".into()),
        ]
    }

    #[test]
    fn test_progress_no_panic() {
        for output in [Output::new(), Output::no_color()] {
            for event in every_event() {
                output.progress(&event);
            }
        }
    }

    #[test]
    fn test_output_methods_no_panic() {
        let output = Output::no_color();

        output.banner();
        output.success("test success");
        output.info("test info");
        output.warning("test warning");
        output.error("test error");
        output.step(1, 3, "step message");
        output.created("file", "path/to/file");
        output.skipped("path", "reason");
        output.header("Test Header");
        output.kv("key", "value");
        output.hint("hint message");
        output.command("some command");
        output.complete("complete message");
        output.table_header(&["Collaborator", "Model"]);
        output.table_row(&["planner", "fast"]);
        output.table_row(&[]);
        output.newline();
    }
}
