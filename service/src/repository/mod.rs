use crate::domain::error::FatalHostnameError;
use crate::domain::event::CloudFrontRequest;
use std::fmt::{Display, Formatter};

pub(crate) mod bucket_repository;

/// Location of the original object behind an origin response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectReference {
    pub bucket: String,
    pub key: String,
}

impl ObjectReference {
    /// `bucket` is the host with `.<storage_domain>` stripped, `key` is the
    /// path without its leading `/`. Any other host is a misconfigured origin.
    pub fn from_request(
        request: &CloudFrontRequest,
        storage_domain: &str,
    ) -> Result<ObjectReference, FatalHostnameError> {
        let hostname = request.host().unwrap_or_default();
        let suffix = format!(".{}", storage_domain.to_ascii_lowercase());
        let lowered = hostname.to_ascii_lowercase();

        match lowered.strip_suffix(&suffix) {
            Some(bucket) if !bucket.is_empty() => Ok(ObjectReference {
                bucket: bucket.to_string(),
                key: request.uri.strip_prefix('/').unwrap_or(&request.uri).to_string(),
            }),
            _ => Err(FatalHostnameError {
                hostname: hostname.to_string(),
            }),
        }
    }
}

impl Display for ObjectReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(host: Option<&str>, uri: &str) -> CloudFrontRequest {
        let headers = match host {
            Some(host) => json!({ "host": [{ "key": "Host", "value": host }] }),
            None => json!({}),
        };
        serde_json::from_value(json!({ "uri": uri, "querystring": "w=1", "headers": headers }))
            .unwrap()
    }

    #[test]
    fn derives_bucket_and_key() {
        let reference = ObjectReference::from_request(
            &request(Some("my-photos.s3.amazonaws.com"), "/2024/cat.jpg"),
            "s3.amazonaws.com",
        )
        .unwrap();
        assert_eq!(reference.bucket, "my-photos");
        assert_eq!(reference.key, "2024/cat.jpg");
        assert_eq!(reference.to_string(), "s3://my-photos/2024/cat.jpg");
    }

    #[test]
    fn foreign_host_is_fatal() {
        let err = ObjectReference::from_request(
            &request(Some("example.com"), "/cat.jpg"),
            "s3.amazonaws.com",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "invalid S3 hostname: example.com");
    }

    #[test]
    fn suffix_must_follow_a_dot() {
        assert!(ObjectReference::from_request(
            &request(Some("evils3.amazonaws.com"), "/cat.jpg"),
            "s3.amazonaws.com",
        )
        .is_err());
        assert!(ObjectReference::from_request(
            &request(Some(".s3.amazonaws.com"), "/cat.jpg"),
            "s3.amazonaws.com",
        )
        .is_err());
    }

    #[test]
    fn missing_host_is_fatal() {
        let err =
            ObjectReference::from_request(&request(None, "/cat.jpg"), "s3.amazonaws.com")
                .unwrap_err();
        assert_eq!(err.hostname, "");
    }
}
