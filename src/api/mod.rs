//! Service API client
//!
//! This module provides the request side of the client:
//! - HTTP transport
//! - Result normalization
//! - The authenticated request pipeline
//! - Phrase operations

pub mod phrase;
pub mod request;
pub mod result;
pub mod transport;

pub use phrase::PhraseApi;
pub use request::{Observers, RequestSpec, ServeClient, Settled};
pub use result::RequestResult;
pub use transport::{FetchFailure, HttpMethod, RawResponse, ReqwestTransport, Transport};
