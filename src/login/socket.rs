//! Websocket driver for the QR login
//!
//! A [`LoginSession`] owns one socket and one [`QrLogin`] for the duration
//! of a handshake. Running it consumes the session; the socket is gone once
//! `run` returns.

use std::future::Future;

use futures::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::core::config::Endpoints;
use crate::error::Result;
use crate::login::machine::{LoginStatus, LoginView, QrLogin};
use crate::login::message::LoginFrame;

/// One QR login handshake over a websocket
pub struct LoginSession {
    url: String,
    machine: QrLogin,
}

impl LoginSession {
    /// Session against the configured login endpoint
    pub fn new(endpoints: &Endpoints, machine: QrLogin) -> Self {
        Self::with_url(endpoints.login_qr_url(), machine)
    }

    /// Session against an explicit socket URL
    pub fn with_url(url: impl Into<String>, machine: QrLogin) -> Self {
        Self {
            url: url.into(),
            machine,
        }
    }

    /// Follow state and QR image changes while the session runs
    pub fn subscribe(&self) -> watch::Receiver<LoginView> {
        self.machine.subscribe()
    }

    /// Run until the socket closes
    pub async fn run(self) -> Result<LoginStatus> {
        self.run_until(std::future::pending()).await
    }

    /// Run until the socket closes or `cancel` completes
    ///
    /// Cancelling closes the socket, which drives the handshake to its
    /// failure state like any other close.
    pub async fn run_until<F>(mut self, cancel: F) -> Result<LoginStatus>
    where
        F: Future<Output = ()>,
    {
        self.machine.start()?;
        tracing::debug!("Connecting to {}", self.url);

        let mut socket = match connect_async(self.url.as_str()).await {
            Ok((socket, _)) => socket,
            Err(e) => {
                tracing::warn!("Login socket failed to open: {}", e);
                return Ok(self.machine.on_close());
            }
        };

        if let Err(e) = socket.send(Message::text(self.machine.on_open())).await {
            tracing::warn!("Failed to send login frame: {}", e);
            return Ok(self.machine.on_close());
        }

        tokio::pin!(cancel);
        loop {
            let next = tokio::select! {
                _ = &mut cancel => None,
                message = socket.next() => Some(message),
            };
            let Some(message) = next else {
                tracing::info!("QR login cancelled");
                let _ = socket.close(None).await;
                break;
            };

            let bytes = match message {
                Some(Ok(Message::Binary(data))) => data.to_vec(),
                Some(Ok(Message::Text(text))) => text.as_bytes().to_vec(),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    tracing::warn!("Login socket error: {}", e);
                    break;
                }
            };

            let frame = LoginFrame::classify(&bytes);
            if let Some(ack) = QrLogin::ack(&frame) {
                if let Err(e) = socket.send(Message::text(ack)).await {
                    tracing::warn!("Failed to acknowledge login: {}", e);
                }
            }
            self.machine.handle(frame).await;

            if self.machine.status() == LoginStatus::LoginOk {
                let _ = socket.close(None).await;
                break;
            }
        }

        Ok(self.machine.on_close())
    }
}
