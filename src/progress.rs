//! Centralized progress reporting
//!
//! Spinner while connecting, one bar per server while its avatars download.

use human_bytes::human_bytes;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::download::BatchReport;

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", ""];

/// Create a bar counting finished avatars for one server
pub fn create_progress_bar(total: u64, server_name: &str) -> ProgressBar {
    let bar = ProgressBar::new(total);
    if let Ok(style) =
        ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos:>5}/{len:<5} {percent:>3}% {msg}")
    {
        bar.set_style(style.progress_chars("━━╸ "));
    }
    bar.set_message(server_name.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Create a spinner with a status message
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(style.tick_strings(TICKS));
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Format the one-line tally printed after a server finishes
pub fn format_group_summary(report: &BatchReport) -> String {
    if report.failed == 0 {
        format!(
            "({}/{}) ✓ Saved {}",
            report.saved,
            report.attempted,
            human_bytes(report.bytes as f64)
        )
    } else {
        format!(
            "({}/{}) ⚠ Saved {} ({} failed)",
            report.saved,
            report.attempted,
            human_bytes(report.bytes as f64),
            report.failed
        )
    }
}
