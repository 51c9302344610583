use crate::client::bucket_client::BucketClient;
use crate::client::s3_client::S3Store;
use crate::config::{Config, StorageBackend};
use crate::domain::error::FetchError;
use std::future::Future;

pub mod bucket_client;
pub mod s3_client;

/// Storage collaborator: fetch the raw bytes of one object.
pub trait ObjectStore {
    fn get_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// The store the process was configured with.
#[derive(Debug, Clone)]
pub enum Storage {
    S3(S3Store),
    Http(BucketClient),
}

impl Storage {
    pub async fn from_config(config: &Config) -> Result<Storage, reqwest::Error> {
        match config.storage_backend {
            StorageBackend::S3 => Ok(Storage::S3(S3Store::from_env().await)),
            StorageBackend::Http => Ok(Storage::Http(BucketClient::new(
                &config.storage_scheme,
                &config.storage_domain,
            )?)),
        }
    }
}

impl ObjectStore for Storage {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, FetchError> {
        match self {
            Storage::S3(store) => store.get_object(bucket, key).await,
            Storage::Http(client) => client.get_object(bucket, key).await,
        }
    }
}
