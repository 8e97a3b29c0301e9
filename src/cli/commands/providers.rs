//! `list-providers` and `list-formats`

use console::style;

use crate::ai::ProviderRegistry;
use crate::export::list_formats;

pub fn list_providers(registry: &ProviderRegistry) {
    println!("{}", style("Available providers").bold());
    for spec in registry.specs() {
        println!(
            "  {:<10} default: {:<16} models: {}",
            style(spec.name).cyan(),
            spec.default_model,
            spec.models.join(", ")
        );
    }
}

pub fn list_export_formats() {
    println!("{}", style("Available export formats").bold());
    for format in list_formats() {
        println!("  {}", format);
    }
}
