pub mod directive;
pub mod error;
pub mod event;
pub mod server_timing;

use crate::domain::server_timing::ServerTiming;

pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";
pub const WEBP_CONTENT_TYPE: &str = "image/webp";

/// Successful pipeline output, consumed once by the response synthesizer.
#[derive(Debug, Clone)]
pub struct TransformedImage {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub transcoded: bool,
    pub width: u32,
    pub height: u32,
    pub server_timing: ServerTiming,
}
