//! Config check command handler.

use anyhow::{Context, Result};

use baitbot::config::validate::{validate_config, DiagnosticLevel};
use baitbot::config::Config;

use super::{config_path, ConfigAction};

/// Validate configuration file.
pub(crate) async fn cmd_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Check { config } => {
            let path = config_path(config);
            println!("Config file: {}", path.display());

            if !path.exists() {
                println!("[OK] No config file found (using defaults)");
                return Ok(());
            }

            let content = std::fs::read_to_string(&path).context("Failed to read config file")?;

            let raw: serde_json::Value = match serde_json::from_str(&content) {
                Ok(v) => v,
                Err(e) => {
                    println!("[ERROR] Invalid JSON: {}", e);
                    return Ok(());
                }
            };

            let diagnostics = validate_config(&raw);
            for diag in &diagnostics {
                println!("{}", diag);
            }

            let mut errors = diagnostics
                .iter()
                .filter(|d| d.level == DiagnosticLevel::Error)
                .count();
            let warnings = diagnostics
                .iter()
                .filter(|d| d.level == DiagnosticLevel::Warn)
                .count();

            match Config::load_from_path(&path).and_then(|c| c.validate()) {
                Ok(()) => {}
                Err(e) => {
                    println!("[ERROR] {}", e);
                    errors += 1;
                }
            }

            if errors == 0 && warnings == 0 {
                println!("\nConfiguration looks good!");
            } else {
                println!("\nFound {} error(s), {} warning(s)", errors, warnings);
            }
        }
    }
    Ok(())
}
