use super::error::ReviewError;
use base64::Engine;

/// Encode bytes as a `data:` URL, the form kept in history records.
pub fn to_data_url(media_type: &str, data: &[u8]) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(data);
    format!("data:{};base64,{}", media_type, b64)
}

/// Decode a base64 `data:` URL into its media type and bytes.
pub fn from_data_url(url: &str) -> Result<(String, Vec<u8>), ReviewError> {
    let rest = url.strip_prefix("data:").ok_or(ReviewError::InvalidPayload)?;
    let (header, body) = rest.split_once(',').ok_or(ReviewError::InvalidPayload)?;
    let media_type = header
        .strip_suffix(";base64")
        .ok_or(ReviewError::InvalidPayload)?;
    let data = base64::engine::general_purpose::STANDARD
        .decode(body)
        .map_err(|_| ReviewError::InvalidPayload)?;
    Ok((media_type.to_string(), data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_with_media_type_prefix() {
        assert_eq!(
            to_data_url("application/pdf", b"%PDF"),
            "data:application/pdf;base64,JVBERg=="
        );
    }

    #[test]
    fn decodes_cached_payload() {
        let (media_type, data) = from_data_url("data:audio/mpeg;base64,AAEC").unwrap();
        assert_eq!(media_type, "audio/mpeg");
        assert_eq!(data, vec![0, 1, 2]);
    }

    #[test]
    fn rejects_non_base64_urls() {
        for url in [
            "",
            "data:text/plain,hello",
            "https://example.com/a.pdf",
            "data:application/pdf;base64,@@@",
        ] {
            assert!(matches!(from_data_url(url), Err(ReviewError::InvalidPayload)), "{url}");
        }
    }
}
