//! QR code login
//!
//! - Frame decoding and classification
//! - The handshake state machine
//! - The websocket session driving it

pub mod machine;
pub mod message;
pub mod socket;

pub use machine::{LoginStatus, LoginView, QrLogin};
pub use message::{LoginFrame, QrImage};
pub use socket::LoginSession;
