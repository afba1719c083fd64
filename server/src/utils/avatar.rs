//! Avatar helpers: upload sniffing, data URIs and generated project avatars

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::core::constants::PROJECT_AVATAR_BASE_URL;

/// Image types accepted as avatars
const ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
    "image/bmp",
];

/// Sniff an image MIME type from the file signature
pub fn sniff_image_mime(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("image/png")
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        Some("image/webp")
    } else if data.len() >= 6 && data.starts_with(b"BM") {
        Some("image/bmp")
    } else {
        None
    }
}

/// Resolve the MIME type of an uploaded avatar
///
/// The file signature wins. Without a recognizable signature the declared
/// content type is used, then the file name extension. Returns `None` for
/// anything that is not an allowed image type.
pub fn resolve_image_mime(
    data: &[u8],
    declared: Option<&str>,
    file_name: Option<&str>,
) -> Option<String> {
    if let Some(mime) = sniff_image_mime(data) {
        return Some(mime.to_string());
    }

    let declared = declared
        .map(|m| m.split(';').next().unwrap_or(m).trim().to_ascii_lowercase())
        .filter(|m| m != "application/octet-stream" && !m.is_empty());
    let guessed = file_name
        .and_then(|name| mime_guess::from_path(name).first())
        .map(|m| m.essence_str().to_string());

    declared
        .or(guessed)
        .filter(|m| ALLOWED_IMAGE_TYPES.contains(&m.as_str()))
}

/// Render bytes as a `data:` URI
pub fn data_uri(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Generated avatar for a project, seeded by its ID
pub fn project_avatar_url(project_id: &str) -> String {
    let mut url = match reqwest::Url::parse(PROJECT_AVATAR_BASE_URL) {
        Ok(url) => url,
        Err(_) => return String::new(),
    };
    url.query_pairs_mut()
        .append_pair("seed", project_id)
        .append_pair("backgroundType", "gradientLinear")
        .append_pair("radius", "0");
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

    #[test]
    fn test_sniff_known_signatures() {
        assert_eq!(sniff_image_mime(PNG_HEADER), Some("image/png"));
        assert_eq!(sniff_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_image_mime(b"GIF89a...."), Some("image/gif"));
        assert_eq!(sniff_image_mime(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_image_mime(b"%PDF-1.7"), None);
    }

    #[test]
    fn test_signature_overrides_declared_type() {
        assert_eq!(
            resolve_image_mime(PNG_HEADER, Some("image/jpeg"), Some("a.jpg")).as_deref(),
            Some("image/png")
        );
    }

    #[test]
    fn test_fallback_to_declared_then_extension() {
        assert_eq!(
            resolve_image_mime(b"????", Some("image/webp; q=1"), None).as_deref(),
            Some("image/webp")
        );
        assert_eq!(
            resolve_image_mime(b"????", Some("application/octet-stream"), Some("me.gif"))
                .as_deref(),
            Some("image/gif")
        );
    }

    #[test]
    fn test_non_images_are_rejected() {
        assert_eq!(resolve_image_mime(b"%PDF-1.7", Some("application/pdf"), None), None);
        assert_eq!(resolve_image_mime(b"<svg/>", None, Some("x.svg")), None);
        assert_eq!(resolve_image_mime(b"", None, None), None);
    }

    #[test]
    fn test_data_uri() {
        assert_eq!(data_uri(b"hi", "image/png"), "data:image/png;base64,aGk=");
    }

    #[test]
    fn test_project_avatar_url() {
        assert_eq!(
            project_avatar_url("abc_123"),
            "https://api.dicebear.com/6.x/shapes/svg?seed=abc_123&backgroundType=gradientLinear&radius=0"
        );
    }
}
