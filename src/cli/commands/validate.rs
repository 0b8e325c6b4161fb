//! Validate-config command implementation

use crate::config::AppConfig;
use crate::core::mapping::load_mapping_rules;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Also parse the field-mapping CSV named by the configuration
    #[arg(long)]
    pub with_mapping: bool,
}

impl ValidateArgs {
    /// Execute the validate-config command
    ///
    /// The configuration itself was loaded and validated at startup; an
    /// invalid file never reaches this point. What remains is reporting
    /// and, with `--with-mapping`, parsing the mapping table.
    pub async fn execute(&self, config: &AppConfig, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(path = config_path, "Validating configuration");

        println!("✅ Configuration valid: {config_path}");
        println!(
            "  Source: {} joined with {}",
            config.source.specimen_table, config.source.form_table
        );
        println!("  Mapping table: {}", config.mapping.path.display());
        println!("  Batch size: {}", config.migration.batch_size);

        if self.with_mapping {
            match load_mapping_rules(&config.mapping.path) {
                Ok(rules) => {
                    println!("✅ Mapping table valid: {} rules", rules.len());
                    for rule in &rules {
                        println!(
                            "  {} -> {}.{} ({})",
                            rule.legacy_field, rule.target_table, rule.target_column, rule.cardinality
                        );
                    }
                }
                Err(e) => {
                    eprintln!("❌ Mapping table invalid: {e}");
                    return Ok(2);
                }
            }
        }

        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_args_defaults() {
        let args = ValidateArgs {
            with_mapping: false,
        };
        assert!(!args.with_mapping);
    }
}
