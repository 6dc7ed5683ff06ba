use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

/// MIME type for a survey image, from its extension.
#[must_use]
pub fn image_mime(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        _ => "image/jpeg",
    }
}

/// Inline `data:` URI so the webview can show bytes read from disk.
#[must_use]
pub fn image_data_uri(filename: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", image_mime(filename), BASE64.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_follows_extension() {
        assert_eq!(image_mime("a.PNG"), "image/png");
        assert_eq!(image_mime("a.jpeg"), "image/jpeg");
        assert_eq!(image_mime("a.JPG"), "image/jpeg");
    }

    #[test]
    fn data_uri_embeds_bytes() {
        assert_eq!(image_data_uri("x.png", b"hi"), "data:image/png;base64,aGk=");
    }
}
