//! QR login state machine
//!
//! ```text
//! idle ──start──▶ loadingQr ──image──▶ scanQr ──token──▶ loginOk
//!                     │                   │
//!                   close               close
//!                     ▼                   ▼
//!                 loadQrFail          invalidQr
//! ```
//!
//! [`QrLogin`] holds no socket. The driver in `login::socket` feeds it the
//! open/frame/close events and sends the frames it asks for, which keeps
//! every transition testable without a network.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::core::credentials::CredentialStore;
use crate::core::telemetry::{Telemetry, TelemetryEvent};
use crate::error::{PhraseError, Result};
use crate::login::message::{LoginFrame, QrImage};

/// First frame sent once the socket is open
pub const LOGIN_FRAME: &str = "login";

/// Acknowledgment sent after a credential arrives
pub const LOGIN_OK_FRAME: &str = "loginOk";

/// Phase of the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum LoginStatus {
    /// Nothing started yet
    #[default]
    Idle,
    /// Socket opening, waiting for the QR image
    LoadingQr,
    /// QR image shown, waiting for the scan
    ScanQr,
    /// Socket closed before any image arrived
    LoadQrFail,
    /// Socket closed while the code was displayed
    InvalidQr,
    /// Credential received and stored
    LoginOk,
}

impl LoginStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginStatus::Idle => "idle",
            LoginStatus::LoadingQr => "loadingQr",
            LoginStatus::ScanQr => "scanQr",
            LoginStatus::LoadQrFail => "loadQrFail",
            LoginStatus::InvalidQr => "invalidQr",
            LoginStatus::LoginOk => "loginOk",
        }
    }

    /// Whether the handshake instance is over
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LoginStatus::LoginOk | LoginStatus::LoadQrFail | LoginStatus::InvalidQr
        )
    }

    /// Whether a handshake is running
    pub fn is_active(&self) -> bool {
        matches!(self, LoginStatus::LoadingQr | LoginStatus::ScanQr)
    }
}

impl std::fmt::Display for LoginStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a UI shows for the handshake
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginView {
    pub status: LoginStatus,
    /// Latest QR image, once one arrived
    pub qr: Option<QrImage>,
}

/// Socket-free QR login state machine
pub struct QrLogin {
    credentials: Arc<dyn CredentialStore>,
    telemetry: Arc<dyn Telemetry>,
    view: watch::Sender<LoginView>,
    started: Option<Instant>,
    started_at: Option<DateTime<Utc>>,
}

impl QrLogin {
    pub fn new(credentials: Arc<dyn CredentialStore>, telemetry: Arc<dyn Telemetry>) -> Self {
        let (view, _) = watch::channel(LoginView::default());
        Self {
            credentials,
            telemetry,
            view,
            started: None,
            started_at: None,
        }
    }

    /// Follow view changes
    pub fn subscribe(&self) -> watch::Receiver<LoginView> {
        self.view.subscribe()
    }

    pub fn status(&self) -> LoginStatus {
        self.view.borrow().status
    }

    pub fn view(&self) -> LoginView {
        self.view.borrow().clone()
    }

    /// When the current handshake started
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Begin a handshake; the caller opens the socket next
    ///
    /// Fails while another handshake is running on this machine.
    pub fn start(&mut self) -> Result<()> {
        let current = self.status();
        if current.is_active() {
            return Err(PhraseError::LoginInProgress(current.to_string()));
        }

        self.telemetry
            .record(TelemetryEvent::new("load_qr").with("status", current.as_str()));

        self.started = Some(Instant::now());
        self.started_at = Some(Utc::now());
        self.view.send_modify(|view| {
            view.status = LoginStatus::LoadingQr;
            view.qr = None;
        });
        tracing::info!("QR login started");
        Ok(())
    }

    /// Frame to send once the socket is open
    pub fn on_open(&self) -> &'static str {
        LOGIN_FRAME
    }

    /// Frame to send back before handling `frame`, if any
    pub fn ack(frame: &LoginFrame) -> Option<&'static str> {
        match frame {
            LoginFrame::Token(_) => Some(LOGIN_OK_FRAME),
            LoginFrame::Error(_) | LoginFrame::Image(_) => None,
        }
    }

    /// Apply an inbound frame
    pub async fn handle(&mut self, frame: LoginFrame) {
        let status = self.status();
        if !status.is_active() {
            tracing::debug!("Ignoring login frame in state {}", status);
            return;
        }

        match frame {
            LoginFrame::Token(info) => {
                match self.credentials.persist_token(&info).await {
                    Ok(()) => {
                        self.set_status(LoginStatus::LoginOk);
                        tracing::info!("QR login succeeded for {}", info.openid);
                    }
                    Err(e) => tracing::error!("Failed to store login credential: {}", e),
                }
                self.telemetry.record(
                    TelemetryEvent::new("qr_loginOk")
                        .with("openid", info.openid.as_str())
                        .with("cost", self.cost()),
                );
            }
            LoginFrame::Error(text) => {
                tracing::debug!("Server login notice ignored: {}", text);
            }
            LoginFrame::Image(image) => {
                self.view.send_modify(|view| {
                    view.status = LoginStatus::ScanQr;
                    view.qr = Some(image);
                });
                self.telemetry
                    .record(TelemetryEvent::new("qr_load").with("cost", self.cost()));
            }
        }
    }

    /// Apply the socket close, returning the resulting status
    pub fn on_close(&mut self) -> LoginStatus {
        let next = match self.status() {
            LoginStatus::ScanQr => Some(LoginStatus::InvalidQr),
            LoginStatus::LoadingQr => Some(LoginStatus::LoadQrFail),
            _ => None,
        };
        if let Some(next) = next {
            self.set_status(next);
        }

        let status = self.status();
        self.telemetry
            .record(TelemetryEvent::new("qr_ws_close").with("status", status.as_str()));
        status
    }

    fn set_status(&self, status: LoginStatus) {
        self.view.send_modify(|view| view.status = status);
    }

    /// Milliseconds since `start`
    fn cost(&self) -> u64 {
        self.started
            .map(|started| started.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }
}
