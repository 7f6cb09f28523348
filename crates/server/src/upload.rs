//! RFC 2397 data URLs, the way uploads travel inside JSON payloads.
//!
//! `data:image/png;base64,iVBORw0KGgo...`

use crate::error::{ApiError, ApiResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use solder_store::Upload;

/// Media type assumed when the data URL declares none.
const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// Decode a base64 data URL into bytes and their declared media type.
///
/// Only base64 payloads are accepted; percent-encoded data URLs are rejected.
pub fn decode(data_url: &str) -> ApiResult<Upload> {
    let Some(rest) = data_url.trim().strip_prefix("data:") else {
        return Err(ApiError::validation("upload must be a data URL"));
    };
    let Some((header, data)) = rest.split_once(',') else {
        return Err(ApiError::validation("data URL has no payload"));
    };
    let Some(media_type) = header.strip_suffix(";base64") else {
        return Err(ApiError::validation("data URL must be base64 encoded"));
    };
    let content = STANDARD
        .decode(data.trim())
        .map_err(|err| ApiError::validation(format!("invalid base64 payload: {err}")))?;
    let media_type = match media_type.trim() {
        "" => DEFAULT_MEDIA_TYPE.to_string(),
        declared => declared.to_string(),
    };
    Ok(Upload { content, media_type })
}

/// Decode an optional upload field.
pub fn decode_field(data_url: Option<&str>) -> ApiResult<Option<Upload>> {
    data_url.map(decode).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use rstest::rstest;

    #[test]
    fn test_decode() {
        let upload = decode("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(upload.content, b"hello");
        assert_eq!(upload.media_type, "image/png");
    }

    #[test]
    fn test_keeps_parameters() {
        let upload = decode("data:text/plain;charset=utf-8;base64,aGk=").unwrap();
        assert_eq!(upload.media_type, "text/plain;charset=utf-8");
    }

    #[test]
    fn test_default_media_type() {
        assert_eq!(decode("data:;base64,aGk=").unwrap().media_type, DEFAULT_MEDIA_TYPE);
    }

    #[rstest]
    #[case("aGVsbG8=")]
    #[case("data:image/png;base64")]
    #[case("data:text/plain,hello")]
    #[case("data:image/png;base64,not base64!")]
    fn test_rejects(#[case] input: &str) {
        let err = decode(input).unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_missing_field() {
        assert!(decode_field(None).unwrap().is_none());
    }
}
