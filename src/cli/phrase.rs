//! Phrase and tracking CLI command handlers

use std::sync::Arc;

use serde_json::Value;

use crate::api::{Observers, PhraseApi, ServeClient, Settled};
use crate::cli::commands::PhraseCommand;
use crate::core::config::Config;
use crate::core::credentials::{KeyringCredentialStore, NEED_LOGIN, NEED_RELOGIN};
use crate::core::telemetry::TracingTelemetry;
use crate::error::{PhraseError, Result};

/// Handle phrase commands
pub async fn handle_phrase(command: PhraseCommand) -> Result<()> {
    let data = parse_data(command.data())?;
    let client = build_client()?;
    let api = PhraseApi::new(&client);

    let settled = match command {
        PhraseCommand::Collect { .. } => api.collect(data, Observers::none()).await,
        PhraseCommand::Remove { .. } => api.remove(data, Observers::none()).await,
        PhraseCommand::Mark { .. } => api.update_mark(data, Observers::none()).await,
    };

    print_settled(&settled)?;

    match settled {
        Settled::Resolved(_) => Ok(()),
        Settled::Rejected(result) if result.err_msg == NEED_LOGIN || result.err_msg == NEED_RELOGIN => {
            Err(PhraseError::NotAuthenticated)
        }
        Settled::Rejected(result) => Err(PhraseError::RequestFailed(result.err_msg)),
    }
}

/// Handle the track command
///
/// Tracking failures are silent: the result is printed but never an error.
pub async fn handle_track(data: &str) -> Result<()> {
    let data = parse_data(data)?;
    let client = build_client()?;

    let settled = PhraseApi::new(&client).send_event(data).await;
    println!("{}", serde_json::to_string_pretty(settled.result())?);
    Ok(())
}

fn build_client() -> Result<ServeClient> {
    let config = Config::load()?;
    ServeClient::from_config(
        &config,
        Arc::new(KeyringCredentialStore::new()),
        Arc::new(TracingTelemetry),
    )
}

fn parse_data(raw: &str) -> Result<Value> {
    serde_json::from_str(raw)
        .map_err(|e| PhraseError::InvalidInput(format!("--data is not valid JSON: {}", e)))
}

fn print_settled(settled: &Settled) -> Result<()> {
    let result = settled.result();
    println!("{}", serde_json::to_string_pretty(result)?);
    if let Some(toast) = result.toast() {
        eprintln!("{}", toast);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_data_rejects_garbage() {
        let err = parse_data("{not json").unwrap_err();
        assert!(matches!(err, PhraseError::InvalidInput(msg) if msg.contains("not valid JSON")));
    }

    #[test]
    fn test_parse_data_accepts_any_json() {
        assert_eq!(parse_data("[1]").unwrap(), serde_json::json!([1]));
    }
}
