use crate::domain::event::{first_header, Headers};
use opentelemetry::propagation::Extractor;

/// Reads trace context (`traceparent`, `tracestate`) out of the viewer
/// request headers CloudFront forwards in the event.
pub struct CloudFrontHeaderExtractor<'a>(pub &'a Headers);

impl<'a> Extractor for CloudFrontHeaderExtractor<'a> {
    fn get(&self, key: &str) -> Option<&str> {
        first_header(self.0, key)
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}
