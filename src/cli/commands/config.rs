//! Config Command
//!
//! Usage:
//!   routesage config show [-f json]
//!   routesage config path

use crate::config::ConfigLoader;
use crate::types::{Result, RouteSageError};

/// Print the effective configuration as TOML or JSON
pub fn show(format: &str) -> Result<()> {
    match format {
        "toml" | "text" => ConfigLoader::show_config(false),
        "json" => ConfigLoader::show_config(true),
        other => Err(RouteSageError::Config(format!(
            "Unknown output format '{}'. Valid values: toml, json",
            other
        ))),
    }
}

/// Print configuration and cache paths
pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_format_rejected() {
        let err = show("yaml").unwrap_err();
        assert!(err.to_string().contains("yaml"));
    }
}
