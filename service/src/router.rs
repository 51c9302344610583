use crate::client::ObjectStore;
use crate::domain::event::ResponseEvent;
use crate::handler::{handle, AppState};
use crate::observability::propagators::CloudFrontHeaderExtractor;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::{Method, Request, Response, StatusCode};
use opentelemetry::Context;
use std::error;
use std::sync::Arc;
use tracing::{error, instrument, warn};
use tracing_opentelemetry::OpenTelemetrySpanExt;

const CONTENT_TYPE_HEADER_NAME: &str = "content-type";

pub type ResultResponse =
    Result<Response<BoxBody<Bytes, hyper::Error>>, Box<dyn error::Error + Send + Sync>>;

#[instrument(skip_all, fields(method = %req.method(), path = %req.uri().path()))]
pub async fn router<S>(req: Request<Incoming>, state: Arc<AppState<S>>) -> ResultResponse
where
    S: ObjectStore + Sync,
{
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/private/status") => Ok(Response::new(full("OK"))),
        (&Method::POST, "/invoke") => {
            let body = req.into_body().collect().await?.to_bytes();
            invoke(&body, &state).await
        }
        _ => text_response(StatusCode::NOT_FOUND, "Endpoint not found"),
    }
}

/// One origin-response invocation: event JSON in, CloudFront response JSON out.
async fn invoke<S>(body: &[u8], state: &AppState<S>) -> ResultResponse
where
    S: ObjectStore + Sync,
{
    let event: ResponseEvent = match serde_json::from_slice(body) {
        Ok(event) => event,
        Err(e) => {
            warn!("Rejected invocation: {e}");
            return text_response(StatusCode::BAD_REQUEST, format!("invalid event: {e}"));
        }
    };
    let Some(record) = event.records.first() else {
        return text_response(StatusCode::BAD_REQUEST, "invalid event: no records");
    };

    let context: Context = opentelemetry::global::get_text_map_propagator(|propagator| {
        propagator.extract(&CloudFrontHeaderExtractor(&record.cf.request.headers))
    });
    tracing::Span::current().set_parent(context);

    match handle(&record.cf, state).await {
        Ok(response) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE_HEADER_NAME, "application/json")
            .body(full(serde_json::to_vec(&response)?))?),
        Err(fatal) => {
            error!("Invocation failed: {fatal}");
            text_response(StatusCode::BAD_GATEWAY, fatal.to_string())
        }
    }
}

fn text_response(status: StatusCode, message: impl Into<Bytes>) -> ResultResponse {
    Ok(Response::builder()
        .status(status)
        .header(CONTENT_TYPE_HEADER_NAME, "text/plain")
        .body(full(message))?)
}

pub fn full<T: Into<Bytes>>(chunk: T) -> BoxBody<Bytes, hyper::Error> {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}
