//! Configuration CLI command handlers

use crate::cli::commands::ConfigCommand;
use crate::core::config::{Config, Mode};
use crate::error::{PhraseError, Result};

/// Handle configuration commands
pub fn handle_config(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => handle_show(),
        ConfigCommand::Path => {
            println!("{}", Config::config_path()?.display());
            Ok(())
        }
        ConfigCommand::SetMode { mode } => handle_set_mode(&mode),
        ConfigCommand::SetBase { base, clear } => handle_set_base(base.as_deref(), clear),
    }
}

fn handle_show() -> Result<()> {
    let config = Config::load()?;
    let endpoints = config.endpoints();

    println!("Mode:           {}", config.mode);
    println!("Client:         {}", config.client);
    println!("Client version: {}", config.client_version);
    println!("API:            {}", endpoints.http_url(""));
    println!("Login socket:   {}", endpoints.login_qr_url());
    Ok(())
}

fn handle_set_mode(value: &str) -> Result<()> {
    let mode = Mode::from_str(value).ok_or_else(|| {
        PhraseError::InvalidInput(format!(
            "Invalid mode '{}'. Available modes: production, test",
            value
        ))
    })?;

    let path = Config::config_path()?;
    let mut config = Config::load_from(&path)?;
    config.mode = mode;
    config.save_to(&path)?;

    println!("Mode set to: {}", mode);
    Ok(())
}

fn handle_set_base(base: Option<&str>, clear: bool) -> Result<()> {
    let base = match base {
        Some(base) if !clear => Some(Config::parse_base(base)?),
        _ => None,
    };

    let path = Config::config_path()?;
    let mut config = Config::load_from(&path)?;
    config.base_override = base;
    config.save_to(&path)?;

    match &config.base_override {
        Some(base) => println!("Base set to: {}", base),
        None => println!("Base reset to the {} default", config.mode),
    }
    Ok(())
}
