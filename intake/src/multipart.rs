//! Minimal `multipart/form-data` decoder.
//!
//! The decoder works directly on the raw request body. It splits the buffer on the
//! `--<boundary>` delimiter, separates each segment into a header block and a body at the
//! first blank line, and scans the header block for the `name` and `filename` attributes of
//! `Content-Disposition`. It is deliberately one level deep: no nested multipart, no charset
//! handling and no per-part size limits (the router's body limit applies to the whole request).
//!
//! Part bodies are zero-copy slices of the input [`Bytes`], so file payloads are returned
//! byte-for-byte. A payload that itself contains the delimiter bytes is split at that point;
//! such bodies do not round-trip.

use bytes::Bytes;

const LINE_BREAK_LEN: usize = 2;
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// One named section of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Field name from `Content-Disposition`, never empty
    pub name: String,
    /// Original filename; present only for file parts
    pub filename: Option<String>,
    /// Raw part body
    pub data: Bytes,
}

impl Part {
    pub fn is_file(&self) -> bool {
        self.filename.is_some()
    }
}

/// Returns true if the `Content-Type` header value announces a multipart form body.
pub fn is_multipart(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("multipart/form-data")
}

/// Extract the `boundary` parameter from a `Content-Type` header value.
///
/// Quoted boundaries are unquoted. Returns `None` when the parameter is missing or empty.
pub fn boundary_from_content_type(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .skip(1)
        .find_map(|param| {
            let (key, value) = param.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("boundary")
                .then(|| value.trim().trim_matches('"').to_string())
        })
        .filter(|boundary| !boundary.is_empty())
}

/// Decode a multipart body into its parts, in the order they appear.
///
/// Segments without a header terminator or without a `name` attribute are skipped. Decoding
/// stops at the first position after which no further delimiter exists, which also absorbs
/// the closing `--<boundary>--` line and any epilogue.
pub fn decode(body: &Bytes, boundary: &str) -> Vec<Part> {
    let mut parts = Vec::new();
    if boundary.is_empty() {
        return parts;
    }

    let delimiter = format!("--{boundary}").into_bytes();
    let Some(first) = find(body, &delimiter, 0) else {
        return parts;
    };

    // Skip the delimiter and the line break that follows it
    let mut cursor = first + delimiter.len() + LINE_BREAK_LEN;

    while cursor < body.len() {
        let Some(next) = find(body, &delimiter, cursor) else {
            break;
        };

        // The line break preceding a delimiter belongs to the delimiter, not the body
        let segment_end = next.saturating_sub(LINE_BREAK_LEN).max(cursor);
        if let Some(part) = parse_segment(body.slice(cursor..segment_end)) {
            parts.push(part);
        }

        cursor = next + delimiter.len() + LINE_BREAK_LEN;
    }

    parts
}

fn parse_segment(segment: Bytes) -> Option<Part> {
    let header_end = find(&segment, HEADER_TERMINATOR, 0)?;
    let headers = String::from_utf8_lossy(&segment[..header_end]);

    let name = header_attribute(&headers, "name")?;
    let filename = header_attribute(&headers, "filename");

    Some(Part {
        name,
        filename,
        data: segment.slice(header_end + HEADER_TERMINATOR.len()..),
    })
}

/// Find the first non-empty `key="value"` in a header block.
///
/// `key` must start a token, so looking up `name` never matches inside `filename`.
fn header_attribute(headers: &str, key: &str) -> Option<String> {
    let pattern = format!("{key}=\"");
    let mut search_from = 0;

    while let Some(offset) = headers[search_from..].find(&pattern) {
        let start = search_from + offset;
        let value_start = start + pattern.len();
        search_from = value_start;

        let starts_token = headers[..start].chars().next_back().is_none_or(|c| !is_token_char(c));
        if !starts_token {
            continue;
        }

        let value_len = headers[value_start..].find('"')?;
        if value_len == 0 {
            continue;
        }

        return Some(headers[value_start..value_start + value_len].to_string());
    }

    None
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|position| position + from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::multipart_body;

    const BOUNDARY: &str = "----IntakeBoundary7MA4YWxkTrZu0gW";

    #[test]
    fn test_decodes_fields_and_files() {
        let pdf: &[u8] = b"%PDF-1.4\x00\xff\xfe\r\nbinary";
        let body = Bytes::from(multipart_body(
            BOUNDARY,
            &[
                ("data", None, br#"{"employeeCount":5}"#),
                ("note", None, b"hello"),
                ("bizFile", Some("doc.pdf"), pdf),
                ("creditFile", Some("credit.png"), b"\x89PNG"),
            ],
        ));

        let parts = decode(&body, BOUNDARY);

        assert_eq!(parts.len(), 4);
        assert_eq!(parts.iter().filter(|p| p.is_file()).count(), 2);
        assert_eq!(parts.iter().filter(|p| !p.is_file()).count(), 2);

        assert_eq!(parts[0].name, "data");
        assert_eq!(parts[0].filename, None);
        assert_eq!(&parts[0].data[..], br#"{"employeeCount":5}"#);

        assert_eq!(parts[2].name, "bizFile");
        assert_eq!(parts[2].filename.as_deref(), Some("doc.pdf"));
        assert_eq!(&parts[2].data[..], pdf);

        assert_eq!(parts[3].filename.as_deref(), Some("credit.png"));
        assert_eq!(&parts[3].data[..], b"\x89PNG");
    }

    #[test]
    fn test_round_trip_preserves_tuples_including_empty_bodies() {
        let inputs: [(&str, Option<&str>, &[u8]); 4] = [
            ("first", None, b""),
            ("upload", Some("empty.bin"), b""),
            ("second", None, b"line one\r\nline two"),
            ("blob", Some("a.dat"), &[0u8, 1, 2, 3, 13, 10, 13, 10, 255]),
        ];
        let body = Bytes::from(multipart_body(BOUNDARY, &inputs));

        let decoded: Vec<(String, Option<String>, Vec<u8>)> = decode(&body, BOUNDARY)
            .into_iter()
            .map(|p| (p.name, p.filename, p.data.to_vec()))
            .collect();
        let expected: Vec<(String, Option<String>, Vec<u8>)> = inputs
            .iter()
            .map(|(name, filename, data)| (name.to_string(), filename.map(str::to_string), data.to_vec()))
            .collect();

        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_attribute_order_does_not_matter() {
        let body = Bytes::from(format!(
            "--{BOUNDARY}\r\n\
             Content-Type: application/pdf\r\n\
             Content-Disposition: form-data; filename=\"report.pdf\"; name=\"bizFile\"\r\n\
             \r\n\
             abc\r\n\
             --{BOUNDARY}--\r\n"
        ));

        let parts = decode(&body, BOUNDARY);

        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].name, "bizFile");
        assert_eq!(parts[0].filename.as_deref(), Some("report.pdf"));
        assert_eq!(&parts[0].data[..], b"abc");
    }

    #[test]
    fn test_segments_without_name_are_skipped() {
        let body = Bytes::from(format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data\r\n\
             \r\n\
             orphan\r\n\
             --{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"\"\r\n\
             \r\n\
             empty name\r\n\
             --{BOUNDARY}\r\n\
             no header terminator here\r\n\
             --{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"kept\"\r\n\
             \r\n\
             value\r\n\
             --{BOUNDARY}--\r\n"
        ));

        let parts = decode(&body, BOUNDARY);

        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].name, "kept");
        assert_eq!(&parts[0].data[..], b"value");
    }

    #[test]
    fn test_empty_filename_is_a_plain_field() {
        let body = Bytes::from(multipart_body(BOUNDARY, &[("bizFile", Some(""), b"")]));

        let parts = decode(&body, BOUNDARY);

        assert_eq!(parts.len(), 1);
        assert!(!parts[0].is_file());
        assert!(parts[0].data.is_empty());
    }

    #[test]
    fn test_missing_delimiter_yields_nothing() {
        let body = Bytes::from_static(b"Content-Disposition: form-data; name=\"x\"\r\n\r\ny");
        assert!(decode(&body, BOUNDARY).is_empty());
        assert!(decode(&Bytes::new(), BOUNDARY).is_empty());
        assert!(decode(&body, "").is_empty());
    }

    #[test]
    fn test_preamble_and_epilogue_are_ignored() {
        let mut raw = b"this is a preamble\r\n".to_vec();
        raw.extend(multipart_body(BOUNDARY, &[("field", None, b"1")]));
        raw.extend_from_slice(b"trailing epilogue");

        let parts = decode(&Bytes::from(raw), BOUNDARY);

        assert_eq!(parts.len(), 1);
        assert_eq!(&parts[0].data[..], b"1");
    }

    #[test]
    fn test_boundary_from_content_type() {
        assert_eq!(
            boundary_from_content_type("multipart/form-data; boundary=abc123").as_deref(),
            Some("abc123")
        );
        assert_eq!(
            boundary_from_content_type("multipart/form-data; charset=utf-8; Boundary=\"quoted value\"").as_deref(),
            Some("quoted value")
        );
        assert_eq!(boundary_from_content_type("multipart/form-data"), None);
        assert_eq!(boundary_from_content_type("multipart/form-data; boundary="), None);
    }

    #[test]
    fn test_is_multipart() {
        assert!(is_multipart("multipart/form-data; boundary=x"));
        assert!(is_multipart("Multipart/Form-Data; boundary=x"));
        assert!(!is_multipart("application/json"));
        assert!(!is_multipart(""));
    }
}
