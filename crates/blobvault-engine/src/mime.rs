//! Content-type sniffing
//!
//! Detects a MIME type from leading magic bytes when the caller supplies
//! no hint. Covers the formats the hosting surface actually sees; anything
//! unrecognized that is valid UTF-8 is plain text, the rest is an opaque
//! octet stream.

/// Sniff the MIME type of `data` from its leading bytes
#[must_use]
pub fn sniff(data: &[u8]) -> &'static str {
    const MAGIC: &[(&[u8], &str)] = &[
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xFF\xD8\xFF", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"%PDF-", "application/pdf"),
        (b"PK\x03\x04", "application/zip"),
        (b"\x1F\x8B", "application/gzip"),
        (b"\xEF\xBB\xBF", "text/plain; charset=utf-8"),
    ];

    for (magic, mime) in MAGIC {
        if data.starts_with(magic) {
            return mime;
        }
    }

    if looks_like_html(data) {
        return "text/html; charset=utf-8";
    }

    if std::str::from_utf8(data).is_ok() {
        return "text/plain; charset=utf-8";
    }

    "application/octet-stream"
}

fn looks_like_html(data: &[u8]) -> bool {
    const TAGS: &[&str] = &["<!doctype html", "<html", "<head", "<body", "<script", "<!--"];

    let Ok(text) = std::str::from_utf8(&data[..data.len().min(512)]) else {
        return false;
    };
    let trimmed = text.trim_start().to_ascii_lowercase();
    TAGS.iter().any(|tag| trimmed.starts_with(tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_png() {
        assert_eq!(sniff(b"\x89PNG\r\n\x1a\n....."), "image/png");
    }

    #[test]
    fn test_sniff_jpeg_and_gif() {
        assert_eq!(sniff(b"\xFF\xD8\xFF\xE0rest"), "image/jpeg");
        assert_eq!(sniff(b"GIF89a......"), "image/gif");
    }

    #[test]
    fn test_sniff_pdf_and_archives() {
        assert_eq!(sniff(b"%PDF-1.7"), "application/pdf");
        assert_eq!(sniff(b"PK\x03\x04rest"), "application/zip");
        assert_eq!(sniff(b"\x1F\x8Brest"), "application/gzip");
    }

    #[test]
    fn test_sniff_html() {
        assert_eq!(sniff(b"  <!DOCTYPE html><html>"), "text/html; charset=utf-8");
        assert_eq!(sniff(b"<html lang=\"en\">"), "text/html; charset=utf-8");
    }

    #[test]
    fn test_sniff_text_fallbacks() {
        assert_eq!(sniff(b"hello world"), "text/plain; charset=utf-8");
        assert_eq!(sniff(b""), "text/plain; charset=utf-8");
        assert_eq!(sniff(&[0x00, 0xFF, 0xFE, 0x01]), "application/octet-stream");
    }
}
