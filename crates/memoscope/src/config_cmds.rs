use anyhow::{Result, anyhow};
use memoscope_config::{AppConfig, paths};

use crate::cli::OutputFormat;

pub(crate) fn handle_config_show(config: &AppConfig, format: OutputFormat) -> Result<()> {
    let redacted = config.redacted_for_display();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&redacted)?),
        OutputFormat::Text => print!("{}", toml::to_string_pretty(&redacted)?),
    }
    Ok(())
}

pub(crate) fn handle_config_path() -> Result<()> {
    let path = paths::config_file()
        .ok_or_else(|| anyhow!("could not determine the user config directory"))?;
    println!("{}", path.display());
    Ok(())
}
