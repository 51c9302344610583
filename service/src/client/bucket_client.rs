use crate::client::ObjectStore;
use crate::domain::error::FetchError;
use futures_util::TryFutureExt;
use reqwest::StatusCode;
use tracing::{info, instrument};

/// Unsigned virtual-hosted-style HTTP access to `<bucket>.<domain>/<key>`
/// over a shared connection pool. Only reads public buckets.
#[derive(Debug, Clone)]
pub struct BucketClient {
    client: reqwest::Client,
    scheme: String,
    domain: String,
}

impl BucketClient {
    pub fn new(scheme: &str, domain: &str) -> Result<BucketClient, reqwest::Error> {
        info!("Initializing bucket client for {scheme}://*.{domain}");
        let client = reqwest::Client::builder()
            .https_only(scheme == "https")
            .use_rustls_tls()
            .build()?;
        Ok(BucketClient {
            client,
            scheme: scheme.to_string(),
            domain: domain.to_string(),
        })
    }

    pub fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}://{}.{}/{}", self.scheme, bucket, self.domain, key)
    }
}

impl ObjectStore for BucketClient {
    #[instrument(skip(self))]
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.object_url(bucket, key);
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| FetchError::Request(e.to_string()))
            .await?;

        match resp.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(FetchError::NotFound),
            status => return Err(FetchError::Status(status.as_u16())),
        }

        resp.bytes()
            .map_ok(|body| body.to_vec())
            .map_err(|e| FetchError::Request(e.to_string()))
            .await
    }
}
