use super::error::ReviewError;
use super::schema::{ContentKind, UploadFile};
use std::path::Path;

const PORTFOLIO_TYPES: &[&str] = &["application/pdf"];

const AUDIO_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/x-m4a",
    "audio/mp4",
];

/// Accepted when the declared type is missing or generic.
const AUDIO_EXTENSIONS: &[&str] = &["m4a"];

/// Check a file against the kind's allow-list.
pub fn validate(kind: ContentKind, file: &UploadFile) -> Result<(), ReviewError> {
    let media_type = file.media_type.to_ascii_lowercase();
    let accepted = match kind {
        ContentKind::Portfolio => PORTFOLIO_TYPES.contains(&media_type.as_str()),
        ContentKind::Audio => {
            AUDIO_TYPES.contains(&media_type.as_str())
                || AUDIO_EXTENSIONS.contains(&extension(&file.file_name).as_str())
        }
    };

    if accepted {
        Ok(())
    } else {
        Err(ReviewError::UnsupportedMediaType {
            kind,
            media_type: file.media_type.clone(),
        })
    }
}

/// Filename without its extension, used as the record's label.
pub fn display_name(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(file_name)
        .to_string()
}

fn extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Guess MIME type from filename extension.
pub fn guess_media_type(file_name: &str) -> String {
    match extension(file_name).as_str() {
        "pdf" => "application/pdf",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/x-m4a",
        "mp4" => "audio/mp4",
        "ogg" => "audio/ogg",
        "txt" => "text/plain",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, media_type: &str) -> UploadFile {
        UploadFile::new(name, media_type, vec![0; 4])
    }

    #[test]
    fn portfolio_accepts_only_pdf() {
        assert!(validate(ContentKind::Portfolio, &file("cv.pdf", "application/pdf")).is_ok());
        assert!(validate(ContentKind::Portfolio, &file("cv.PDF", "Application/PDF")).is_ok());

        let err = validate(ContentKind::Portfolio, &file("cv.png", "image/png")).unwrap_err();
        assert!(matches!(
            err,
            ReviewError::UnsupportedMediaType { kind: ContentKind::Portfolio, .. }
        ));
    }

    #[test]
    fn portfolio_has_no_extension_fallback() {
        let octet = file("cv.pdf", "application/octet-stream");
        assert!(validate(ContentKind::Portfolio, &octet).is_err());
    }

    #[test]
    fn audio_allow_list() {
        for media_type in ["audio/mpeg", "audio/wav", "audio/x-m4a", "audio/mp4"] {
            let take = file("take", media_type);
            assert!(validate(ContentKind::Audio, &take).is_ok(), "{media_type}");
        }
        assert!(validate(ContentKind::Audio, &file("take.ogg", "audio/ogg")).is_err());
        assert!(validate(ContentKind::Audio, &file("cv.pdf", "application/pdf")).is_err());
    }

    #[test]
    fn audio_falls_back_to_m4a_extension() {
        assert!(validate(ContentKind::Audio, &file("Interview.M4A", "")).is_ok());
        let octet = file("interview.m4a", "application/octet-stream");
        assert!(validate(ContentKind::Audio, &octet).is_ok());
    }

    #[test]
    fn display_name_strips_extension() {
        assert_eq!(display_name("my portfolio.pdf"), "my portfolio");
        assert_eq!(display_name("archive.tar.gz"), "archive.tar");
        assert_eq!(display_name("noext"), "noext");
    }

    #[test]
    fn guesses_known_types() {
        assert_eq!(guess_media_type("a.PDF"), "application/pdf");
        assert_eq!(guess_media_type("a.m4a"), "audio/x-m4a");
        assert_eq!(guess_media_type("a.bin"), "application/octet-stream");
    }
}
