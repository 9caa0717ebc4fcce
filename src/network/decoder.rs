//! Content decoding

use std::io::Read;

use flate2::read::GzDecoder;

use super::response::Response;
use crate::utils::{FetchError, Result};

/// Reverse the response's content-encoding when it is exactly `gzip`.
///
/// Any other encoding leaves the body untouched.
pub fn decode(response: Response) -> Result<Response> {
    if response.header("content-encoding") != Some("gzip") {
        return Ok(response);
    }

    let body = gunzip(response.body())?;
    log::debug!(
        "decoded gzip body: {} -> {} bytes",
        response.body().len(),
        body.len()
    );
    Ok(response.with_body(body))
}

/// Inflate a gzip stream; all or nothing
pub fn gunzip(compressed: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(compressed)
        .read_to_end(&mut out)
        .map_err(|e| FetchError::DecodeError(e.to_string()))?;
    Ok(out)
}
