use crate::client::ObjectStore;
use crate::config::Config;
use crate::domain::directive::{self, ResizeDirective};
use crate::domain::error::{FatalHostnameError, TransformError};
use crate::domain::event::{CloudFrontEvent, CloudFrontResponse};
use crate::domain::server_timing::timing::Timing;
use crate::domain::TransformedImage;
use crate::image_service;
use crate::repository::bucket_repository::BucketRepository;
use crate::repository::ObjectReference;
use crate::response_handler::synthesize;
use std::time::Instant;
use tracing::{debug, error, info, instrument};

/// Everything one invocation needs, built once at start-up.
#[derive(Debug)]
pub struct AppState<S> {
    pub config: Config,
    pub repository: BucketRepository<S>,
}

impl<S: ObjectStore> AppState<S> {
    pub fn new(config: Config, store: S) -> AppState<S> {
        AppState {
            config,
            repository: BucketRepository::new(store),
        }
    }
}

/// What the guard chain decided for one origin response.
#[derive(Debug)]
pub enum Outcome {
    Passthrough,
    NotFound,
    Transformed(TransformedImage),
    Error(TransformError),
}

/// Run the guard chain for one origin-response event and build the response
/// CloudFront should continue with.
///
/// The only `Err` is a host that is not a storage host: the invocation is
/// meant to fail loudly there rather than answer on behalf of a misconfigured
/// origin.
#[instrument(skip_all, fields(uri = %event.request.uri, status = %event.response.status))]
pub async fn handle<S>(
    event: &CloudFrontEvent,
    state: &AppState<S>,
) -> Result<CloudFrontResponse, FatalHostnameError>
where
    S: ObjectStore + Sync,
{
    let outcome = decide(event, state).await?;
    Ok(synthesize(&event.request, &event.response, outcome))
}

async fn decide<S>(event: &CloudFrontEvent, state: &AppState<S>) -> Result<Outcome, FatalHostnameError>
where
    S: ObjectStore + Sync,
{
    let request = &event.request;

    if !has_jpeg_extension(&request.uri) {
        debug!(
            content_type = ?event.response.header("content-type"),
            "Not a jpeg, passing through"
        );
        return Ok(Outcome::Passthrough);
    }
    if request.querystring.is_empty() {
        debug!("No query string, passing through");
        return Ok(Outcome::Passthrough);
    }
    match event.response.status.as_str() {
        "200" => {}
        "404" => return Ok(Outcome::NotFound),
        _ => {
            debug!("Origin status not resizable, passing through");
            return Ok(Outcome::Passthrough);
        }
    }

    let directive = directive::decode(&request.querystring);
    let reference = ObjectReference::from_request(request, &state.config.storage_domain)?;
    info!(?directive, s3uri = %reference, "Resizing origin object");

    match resize(&reference, directive, state).await {
        Ok(image) => {
            info!("Resized {reference} to {}x{}", image.width, image.height);
            Ok(Outcome::Transformed(image))
        }
        Err(e) => {
            error!("Resize of {reference} failed: {e}");
            Ok(Outcome::Error(e))
        }
    }
}

async fn resize<S>(
    reference: &ObjectReference,
    directive: ResizeDirective,
    state: &AppState<S>,
) -> Result<TransformedImage, TransformError>
where
    S: ObjectStore + Sync,
{
    let fetch_timer = Instant::now();
    let bytes = state.repository.read_image(reference).await?;
    let fetch_timing = Timing::new("fetch", fetch_timer.elapsed(), None);

    let mut image =
        tokio::task::spawn_blocking(move || image_service::transform(&bytes, &directive))
            .await
            .map_err(|e| TransformError::Task(e.to_string()))??;
    image.server_timing.prepend(fetch_timing);
    Ok(image)
}

/// `.jpg` or `.jpeg` on the last path segment, any case.
fn has_jpeg_extension(uri: &str) -> bool {
    let file_name = uri.rsplit('/').next().unwrap_or(uri);
    match file_name.rsplit_once('.') {
        Some((_, ext)) => ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"),
        None => false,
    }
}
