//! Report Module
//!
//! End-of-run summary for the batch conversion.

use crate::batch::BatchResult;
use std::time::Duration;

pub fn print_summary_report(result: &BatchResult, duration: Duration, operation_name: &str) {
    let reduction = if result.input_bytes > 0 {
        (1.0 - result.output_bytes as f64 / result.input_bytes as f64) * 100.0
    } else {
        0.0
    };

    println!();
    println!("╔══════════════════════════════════════════════╗");
    println!("║        📊 {} Summary Report         ║", operation_name);
    println!("╠══════════════════════════════════════════════╣");
    println!("║  Files Processed:    {:>10}              ║", result.total);
    println!("║  ✅ Succeeded:       {:>10}              ║", result.succeeded);
    println!("║  ❌ Failed:          {:>10}              ║", result.failed);
    println!("║  ⏭️  Skipped:         {:>10}              ║", result.skipped);
    println!("║  Success Rate:       {:>9.1}%              ║", result.success_rate());
    println!("╠══════════════════════════════════════════════╣");
    println!("║  Input Size:         {:>10}              ║", format_bytes(result.input_bytes));
    println!("║  Output Size:        {:>10}              ║", format_bytes(result.output_bytes));
    println!("║  Size Reduction:     {:>9.1}%              ║", reduction);
    println!("╠══════════════════════════════════════════════╣");
    println!("║  Total Time:         {:>10}              ║", format_duration(duration));
    println!("╚══════════════════════════════════════════════╝");

    if !result.errors.is_empty() {
        println!();
        println!("❌ Errors encountered:");
        for (path, error) in &result.errors {
            println!("   {} → {}", path.display(), error);
        }
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}
