//! CloudFront origin-response event shapes.
//!
//! Only the fields the resizer reads or writes are typed; everything else is
//! kept in `extra` so a passthrough serializes back exactly as received.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Lower-case header name to the list of `{key, value}` entries.
pub type Headers = BTreeMap<String, Vec<HeaderEntry>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub value: String,
}

impl HeaderEntry {
    pub fn new(key: &str, value: impl Into<String>) -> HeaderEntry {
        HeaderEntry {
            key: Some(key.to_string()),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEvent {
    #[serde(rename = "Records")]
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub cf: CloudFrontEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudFrontEvent {
    pub request: CloudFrontRequest,
    pub response: CloudFrontResponse,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudFrontRequest {
    pub uri: String,
    #[serde(default)]
    pub querystring: String,
    #[serde(default)]
    pub headers: Headers,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CloudFrontRequest {
    /// First value of the `host` header.
    pub fn host(&self) -> Option<&str> {
        first_header(&self.headers, "host")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudFrontResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_description: Option<String>,
    #[serde(default)]
    pub headers: Headers,
    /// Outer `None` when the field was absent, `Some(None)` for an explicit
    /// `null`.
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub body: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub body_encoding: Option<Option<BodyEncoding>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CloudFrontResponse {
    /// Replaces every entry for `name` with a single entry.
    pub fn set_header(&mut self, name: &str, key: &str, value: impl Into<String>) {
        self.headers
            .insert(name.to_ascii_lowercase(), vec![HeaderEntry::new(key, value)]);
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        first_header(&self.headers, name)
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_ref().and_then(|body| body.as_deref())
    }

    pub fn body_encoding(&self) -> Option<BodyEncoding> {
        self.body_encoding.flatten()
    }

    pub fn set_body(&mut self, body: String, encoding: BodyEncoding) {
        self.body = Some(Some(body));
        self.body_encoding = Some(Some(encoding));
    }
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    Text,
    Base64,
}

pub fn first_header<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .get(&name.to_ascii_lowercase())
        .and_then(|entries| entries.first())
        .map(|entry| entry.value.as_str())
}
