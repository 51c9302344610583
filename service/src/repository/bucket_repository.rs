use crate::client::ObjectStore;
use crate::domain::error::TransformError;
use crate::repository::ObjectReference;
use tracing::{error, instrument};

/// Reads originals through whichever object store the process was wired with.
#[derive(Debug, Clone)]
pub struct BucketRepository<S> {
    store: S,
}

impl<S: ObjectStore> BucketRepository<S> {
    pub fn new(store: S) -> BucketRepository<S> {
        BucketRepository { store }
    }

    #[instrument(skip(self), fields(object = %reference))]
    pub async fn read_image(&self, reference: &ObjectReference) -> Result<Vec<u8>, TransformError> {
        self.store
            .get_object(&reference.bucket, &reference.key)
            .await
            .map_err(|source| {
                error!("Could not fetch image at {reference}: {source}");
                TransformError::Fetch {
                    uri: reference.to_string(),
                    source,
                }
            })
    }
}
