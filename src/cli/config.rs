//! Configuration management command

use anyhow::Context;
use clap::Subcommand;
use scrivener_core::ScrivenerConfig;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,

    /// Write the default configuration to a file
    Init {
        /// Destination file
        #[arg(default_value = "scrivener.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub async fn handle(action: ConfigAction, config: &ScrivenerConfig) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let rendered = toml::to_string_pretty(config).context("Failed to render config")?;
            println!("{}", rendered);
            Ok(())
        }
        ConfigAction::Init { path, force } => {
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            ScrivenerConfig::default()
                .to_file(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✓ Default configuration written to {}", path.display());
            Ok(())
        }
    }
}
