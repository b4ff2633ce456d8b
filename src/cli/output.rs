//! Styled terminal output

use console::style;

use crate::types::{GenerationReport, GenerationStatus};

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    /// Print the terminal status line for a finished request
    ///
    /// A partial result gets an explicit marker with the actual counts; it is
    /// never presented as a success.
    pub fn report_status(&self, report: &GenerationReport) {
        match report.status {
            GenerationStatus::Succeeded => {
                self.success(&format!(
                    "produced {} {} in {} batches ({} upstream attempts)",
                    report.produced,
                    report.mode.label(),
                    report.batches.len(),
                    report.total_attempts(),
                ));
            }
            GenerationStatus::Partial => {
                self.warning(&format!(
                    "partial result: produced {} of {} {} ({} of {} batches abandoned)",
                    report.produced,
                    report.requested,
                    report.mode.label(),
                    report.abandoned_batches(),
                    report.batches.len(),
                ));
            }
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
