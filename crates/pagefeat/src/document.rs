// ABOUTME: Input normalization: text, bytes, or a reader become a ParsedDocument ready for XPath queries.
// ABOUTME: Byte input is decoded with BOM/charset sniffing; empty input is a document-level error.

use std::borrow::Cow;
use std::fmt;
use std::io::Read;

use sxd_document::dom::Document;
use sxd_document::Package;

use crate::error::ExtractError;

/// The three input forms accepted by the extractor.
pub enum DocumentSource<'a> {
    /// Already-decoded HTML text.
    Text(&'a str),
    /// Raw HTML bytes in any encoding.
    Bytes(&'a [u8]),
    /// A byte stream, drained before parsing.
    Reader(Box<dyn Read + 'a>),
}

impl<'a> DocumentSource<'a> {
    /// Wraps any reader.
    pub fn reader(reader: impl Read + 'a) -> Self {
        DocumentSource::Reader(Box::new(reader))
    }

    /// Normalizes this source into a parsed document.
    pub fn parse(self) -> Result<ParsedDocument, ExtractError> {
        match self {
            DocumentSource::Text(text) => ParsedDocument::parse_str(text),
            DocumentSource::Bytes(bytes) => ParsedDocument::parse_bytes(bytes),
            DocumentSource::Reader(reader) => ParsedDocument::parse_reader(reader),
        }
    }
}

impl<'a> From<&'a str> for DocumentSource<'a> {
    fn from(text: &'a str) -> Self {
        DocumentSource::Text(text)
    }
}

impl<'a> From<&'a [u8]> for DocumentSource<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        DocumentSource::Bytes(bytes)
    }
}

impl<'a> From<Box<dyn Read + 'a>> for DocumentSource<'a> {
    fn from(reader: Box<dyn Read + 'a>) -> Self {
        DocumentSource::Reader(reader)
    }
}

/// An HTML document parsed into a tree that XPath expressions can query.
pub struct ParsedDocument {
    package: Package,
}

impl ParsedDocument {
    /// Parses HTML text. Malformed markup is recovered by the HTML5 tree builder.
    pub fn parse_str(html: &str) -> Result<Self, ExtractError> {
        if html.trim().is_empty() {
            return Err(ExtractError::empty("parse"));
        }
        Ok(Self {
            package: sxd_html::parse_html(html),
        })
    }

    /// Decodes and parses HTML bytes.
    pub fn parse_bytes(bytes: &[u8]) -> Result<Self, ExtractError> {
        let text = decode_html(bytes);
        Self::parse_str(&text)
    }

    /// Reads the whole stream, then decodes and parses it.
    pub fn parse_reader(mut reader: impl Read) -> Result<Self, ExtractError> {
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .map_err(|e| ExtractError::read("parse", "", e))?;
        Self::parse_bytes(&buf)
    }

    /// Borrows the underlying document tree.
    pub fn document(&self) -> Document<'_> {
        self.package.as_document()
    }
}

impl fmt::Debug for ParsedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedDocument").finish_non_exhaustive()
    }
}

/// Decodes HTML bytes to text.
///
/// A byte-order mark wins; otherwise the encoding is guessed from the content.
/// Malformed sequences are replaced rather than rejected.
pub fn decode_html(bytes: &[u8]) -> Cow<'_, str> {
    if let Some((encoding, _)) = encoding_rs::Encoding::for_bom(bytes) {
        let (decoded, _, _) = encoding.decode(bytes);
        return decoded;
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Cow::Borrowed(text);
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(bytes);
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_bytes_borrow() {
        let decoded = decode_html("<p>héllo</p>".as_bytes());
        assert!(matches!(decoded, Cow::Borrowed(_)));
        assert_eq!(decoded, "<p>héllo</p>");
    }

    #[test]
    fn bom_is_honored() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"<p>hi</p>");
        assert_eq!(decode_html(&bytes), "<p>hi</p>");
    }

    #[test]
    fn latin1_bytes_are_decoded() {
        // "café" in windows-1252
        let bytes = b"<html><body><p>caf\xe9 au lait, tr\xe8s bien</p></body></html>";
        let decoded = decode_html(bytes);
        assert!(decoded.contains("café"), "got {decoded}");
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = ParsedDocument::parse_str("  \n ").unwrap_err();
        assert!(err.is_empty());
        let err = ParsedDocument::parse_bytes(b"").unwrap_err();
        assert!(err.is_empty());
    }

    #[test]
    fn reader_source_parses() {
        let html = b"<html><head><title>T</title></head></html>";
        let doc = DocumentSource::reader(&html[..]).parse();
        assert!(doc.is_ok());
    }

    #[test]
    fn failing_reader_is_a_read_error() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"))
            }
        }
        let err = DocumentSource::reader(Broken).parse().unwrap_err();
        assert!(err.is_read());
    }
}
