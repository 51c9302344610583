use crate::domain::event::{BodyEncoding, CloudFrontRequest, CloudFrontResponse};
use crate::handler::Outcome;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hyper::StatusCode;
use tracing::instrument;

const CONTENT_TYPE_HEADER_NAME: &str = "Content-Type";
const SERVER_TIMING_HEADER_NAME: &str = "Server-Timing";
const TEXT_CONTENT_TYPE: &str = "text/plain";

/// Build the response for an outcome. The original is never modified;
/// every branch works on its own copy.
#[instrument(skip_all)]
pub fn synthesize(
    request: &CloudFrontRequest,
    original: &CloudFrontResponse,
    outcome: Outcome,
) -> CloudFrontResponse {
    match outcome {
        Outcome::Passthrough => original.clone(),
        Outcome::NotFound => text_response(
            original,
            StatusCode::NOT_FOUND,
            format!("{} is not found.", request.uri),
        ),
        Outcome::Error(e) => text_response(original, StatusCode::FORBIDDEN, e.to_string()),
        Outcome::Transformed(image) => {
            let mut response = original.clone();
            response.set_body(STANDARD.encode(&image.bytes), BodyEncoding::Base64);
            if image.transcoded {
                response.set_header(
                    CONTENT_TYPE_HEADER_NAME,
                    CONTENT_TYPE_HEADER_NAME,
                    image.content_type,
                );
            }
            if !image.server_timing.is_empty() {
                response.set_header(
                    SERVER_TIMING_HEADER_NAME,
                    SERVER_TIMING_HEADER_NAME,
                    image.server_timing.to_string(),
                );
            }
            response
        }
    }
}

fn text_response(original: &CloudFrontResponse, status: StatusCode, body: String) -> CloudFrontResponse {
    let mut response = original.clone();
    response.status = status.as_str().to_string();
    if response.status_description.is_some() {
        response.status_description = status.canonical_reason().map(str::to_string);
    }
    response.set_header(CONTENT_TYPE_HEADER_NAME, CONTENT_TYPE_HEADER_NAME, TEXT_CONTENT_TYPE);
    response.set_body(body, BodyEncoding::Text);
    response
}
