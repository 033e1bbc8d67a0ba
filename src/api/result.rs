//! Uniform result shape for every pipeline call
//!
//! [`RequestResult::normalize`] turns a raw response into a
//! [`RequestResult`]. It never fails: an unparseable body just leaves `data`
//! empty.
//!
//! At most one of `toast_msg` and `serve_toast_msg` is ever set. A local
//! toast always suppresses the server-suggested one.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::transport::RawResponse;

/// Toast synthesized when a failed response carries none of its own
pub const GENERIC_TOAST: &str = "网络开小差!";

/// Toast for requests that never reached the server
pub const UNREACHABLE_TOAST: &str = "网络开小差了!";

/// Outcome of one pipeline call
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResult {
    /// HTTP status, or 0 when nothing was sent
    pub status: u16,
    /// Internal error tag, empty on success
    #[serde(default)]
    pub err_msg: String,
    /// Parsed response body
    #[serde(default)]
    pub data: Option<Value>,
    /// User-facing toast decided by the client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toast_msg: Option<String>,
    /// User-facing toast suggested by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serve_toast_msg: Option<String>,
}

impl RequestResult {
    /// Build a result from a raw response, tagging it with `context` on failure
    pub fn normalize(raw: &RawResponse, context: Option<&str>) -> Self {
        let context = context.filter(|tag| !tag.is_empty());
        let data = serde_json::from_str::<Value>(&raw.body).ok();

        let mut toast_msg = data.as_ref().and_then(|body| text_field(body, "toastMsg"));
        let mut serve_toast_msg = data
            .as_ref()
            .and_then(|body| text_field(body, "serveToastMsg"));

        if context.is_some() && toast_msg.is_none() {
            toast_msg = Some(GENERIC_TOAST.to_string());
        }
        if toast_msg.is_some() {
            serve_toast_msg = None;
        }

        Self {
            status: raw.status,
            err_msg: context.unwrap_or_default().to_string(),
            data,
            toast_msg,
            serve_toast_msg,
        }
    }

    /// Result for a call short-circuited by a missing session
    pub fn auth_missing(marker: &str) -> Self {
        Self {
            status: 0,
            err_msg: marker.to_string(),
            ..Self::default()
        }
    }

    /// Result for a call whose exchange never completed
    pub fn unreachable(url_suffix: &str) -> Self {
        Self {
            status: 0,
            err_msg: unreachable_tag(url_suffix),
            toast_msg: Some(UNREACHABLE_TOAST.to_string()),
            ..Self::default()
        }
    }

    /// Whether this result carries an error tag
    pub fn is_error(&self) -> bool {
        !self.err_msg.is_empty()
    }

    /// The toast to display, if any
    pub fn toast(&self) -> Option<&str> {
        self.toast_msg
            .as_deref()
            .or(self.serve_toast_msg.as_deref())
    }
}

/// Error tag for a rejected response
pub fn rejected_tag(url_suffix: &str) -> String {
    format!("authReq_{}_err", url_suffix)
}

/// Error tag for an exchange that never completed
pub fn unreachable_tag(url_suffix: &str) -> String {
    format!("fetchReq_{}_err", url_suffix)
}

fn text_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
