use crate::client::ObjectStore;
use crate::domain::error::FetchError;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::Client as S3Client;
use std::fmt::Debug;
use tracing::{info, instrument};

/// Authenticated `GetObject` through the AWS SDK. Credentials and region come
/// from the standard AWS environment/profile chain.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: S3Client,
}

impl S3Store {
    pub fn new(client: S3Client) -> S3Store {
        S3Store { client }
    }

    pub async fn from_env() -> S3Store {
        let sdk_config = aws_config::load_from_env().await;
        info!(region = ?sdk_config.region(), "Initializing S3 client.");
        S3Store::new(S3Client::new(&sdk_config))
    }
}

impl ObjectStore for S3Store {
    #[instrument(skip(self))]
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, FetchError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(fetch_error)?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| FetchError::Request(format!("failed to read S3 body: {e}")))?;
        Ok(body.into_bytes().to_vec())
    }
}

fn fetch_error<R: Debug>(error: SdkError<GetObjectError, R>) -> FetchError {
    match error {
        SdkError::ServiceError(context) => service_error(context.into_err()),
        other => FetchError::Request(DisplayErrorContext(&other).to_string()),
    }
}

fn service_error(error: GetObjectError) -> FetchError {
    match error {
        GetObjectError::NoSuchKey(_) => FetchError::NotFound,
        other => match other.code() {
            Some(code) => {
                FetchError::Request(format!("{code}: {}", other.message().unwrap_or_default()))
            }
            None => FetchError::Request(DisplayErrorContext(&other).to_string()),
        },
    }
}
