//! Authentication CLI command handlers

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::config::Config;
use crate::core::credentials::{KeyringCredentialStore, TokenLookup};
use crate::core::telemetry::TracingTelemetry;
use crate::error::{PhraseError, Result};
use crate::login::{LoginSession, LoginStatus, QrLogin};

/// Handle the login command using the QR code handshake
pub async fn handle_login(qr_out: PathBuf, data_url: bool) -> Result<()> {
    let config = Config::load()?;
    let store = Arc::new(KeyringCredentialStore::new());

    let machine = QrLogin::new(store, Arc::new(TracingTelemetry));
    let session = LoginSession::new(&config.endpoints(), machine);

    // Print transitions and save each QR image as it arrives
    let mut views = session.subscribe();
    let watcher = tokio::spawn(async move {
        let mut last_status = LoginStatus::Idle;
        while views.changed().await.is_ok() {
            let view = views.borrow_and_update().clone();
            if view.status == last_status {
                continue;
            }
            last_status = view.status;

            match view.status {
                LoginStatus::LoadingQr => println!("Loading QR code..."),
                LoginStatus::ScanQr => {
                    if let Some(qr) = &view.qr {
                        match save_qr(&qr_out, qr.bytes()) {
                            Ok(()) => {
                                println!("QR code saved to {}", qr_out.display());
                                println!("Scan it with your phone to log in. Press Ctrl-C to cancel.");
                            }
                            Err(e) => eprintln!("Could not save QR code: {}", e),
                        }
                        if data_url {
                            println!("{}", qr.data_url());
                        }
                    }
                }
                _ => {}
            }
        }
    });

    let status = session
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    let _ = watcher.await;

    match status {
        LoginStatus::LoginOk => {
            println!("\n✓ Logged in.");
            Ok(())
        }
        other => Err(PhraseError::LoginFailed(other.to_string())),
    }
}

fn save_qr(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, bytes)?;
    Ok(())
}

/// Handle the logout command
pub fn handle_logout() -> Result<()> {
    KeyringCredentialStore::new().clear()?;
    println!("✓ Logged out. Stored session removed.");
    Ok(())
}

/// Handle the status command
pub fn handle_status() -> Result<()> {
    let store = KeyringCredentialStore::new();

    match store.lookup() {
        TokenLookup::Token(token) => {
            println!("✓ Logged in");
            println!("  Token: {}", KeyringCredentialStore::mask_token(&token));
            if let Ok(Some(openid)) = store.stored_identity() {
                if !openid.is_empty() {
                    println!("  Account: {}", openid);
                }
            }
        }
        TokenLookup::NeedLogin => {
            println!("✗ Not logged in");
            println!("  Run 'phrasebook login' to authenticate.");
        }
        TokenLookup::NeedRelogin => {
            println!("✗ Session expired");
            println!("  Run 'phrasebook login' to authenticate again.");
        }
    }
    Ok(())
}
