use console::style;

use crate::types::ApiDocumentation;

/// Styled terminal messages. Errors go to stderr, everything else to stdout.
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

    /// Aligned `key: value` line
    pub fn field(&self, key: &str, value: impl std::fmt::Display) {
        println!("  {:<12} {}", style(format!("{}:", key)).dim(), value);
    }

    /// Route counts plus one line per route, unverified ones flagged
    pub fn route_summary(&self, docs: &ApiDocumentation) {
        self.section(&docs.title);
        self.field("Version", &docs.version);
        self.field("Routes", docs.routes.len());
        self.field("Verified", docs.verified_count());

        let unverified = docs.unverified_count();
        if unverified > 0 {
            self.field("Unverified", style(unverified).yellow());
        }

        if !docs.routes.is_empty() {
            println!();
        }
        for route in &docs.routes {
            let marker = if route.verified {
                style("✓").green()
            } else {
                style("?").yellow()
            };
            let origin = route
                .source_file
                .as_deref()
                .map(|f| format!("  {}", style(f).dim()))
                .unwrap_or_default();
            println!(
                "  {} {:<7} {}{}",
                marker,
                route.methods.join(","),
                route.path,
                origin
            );
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
