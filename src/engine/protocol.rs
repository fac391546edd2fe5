//! Line protocol spoken with the engine over stdin/stdout.
//!
//! ```text
//! engine -> READY
//! client -> /abs/path/to/image.jpg
//! engine -> KR12345 | NONE | ERROR...
//! client -> EXIT
//! ```

use super::Recognition;

/// Handshake line the engine prints once it can take requests.
pub const READY: &str = "READY";

/// Response when no plate was found.
pub const NONE: &str = "NONE";

/// Prefix of an engine-reported failure for one image.
pub const ERROR_PREFIX: &str = "ERROR";

/// Command asking the engine to exit.
pub const EXIT: &str = "EXIT";

/// Strip the line terminator (`\n` or `\r\n`) and nothing else.
pub(crate) fn strip_terminator(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Interpret one response line.
pub fn parse_response(line: &str) -> Recognition {
    let text = line.trim();
    if text.is_empty() || text == NONE {
        Recognition::NotFound
    } else if text.starts_with(ERROR_PREFIX) {
        Recognition::EngineError(text.to_string())
    } else {
        Recognition::Found(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_found() {
        assert_eq!(parse_response("  KR12345 \r\n"), Recognition::Found("KR12345".into()));
    }

    #[test]
    fn test_parse_none() {
        assert_eq!(parse_response("NONE"), Recognition::NotFound);
        assert_eq!(parse_response(""), Recognition::NotFound);
    }

    #[test]
    fn test_parse_error_variants() {
        assert_eq!(parse_response("ERROR: x"), Recognition::EngineError("ERROR: x".into()));
        assert_eq!(parse_response("ERROR_FILE"), Recognition::EngineError("ERROR_FILE".into()));
    }

    #[test]
    fn test_strip_terminator() {
        assert_eq!(strip_terminator("READY\r\n"), "READY");
        assert_eq!(strip_terminator(" READY \n"), " READY ");
    }
}
