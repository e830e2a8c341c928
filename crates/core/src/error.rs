use std::fmt;

use thiserror::Error;

/// Numeric codes the crate refers to by name.
///
/// Negative values down to -67 are PCRE2's match-time codes. Values at or
/// below -1000 are produced by this crate, never by the engine.
pub mod codes {
    pub const NOMATCH: i32 = -1;
    pub const PARTIAL: i32 = -2;
    pub const BADOFFSET: i32 = -33;
    pub const BADOPTION: i32 = -34;
    pub const BADUTFOFFSET: i32 = -36;
    pub const INTERNAL: i32 = -44;
    pub const JIT_STACKLIMIT: i32 = -46;
    pub const NOMEMORY: i32 = -48;

    pub const CONFLICTING_NEWLINE: i32 = -1001;
    pub const CONFLICTING_BSR: i32 = -1002;
    pub const UNCHECKED_UTF: i32 = -1003;
    pub const CONTEXT_SETTING: i32 = -1004;
}

/// Where an error was raised.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorDomain {
    /// Pattern compilation; always carries a pattern offset.
    Compile,
    /// Match execution.
    Match,
    /// Option validation done before the engine is reached.
    Options,
}

impl ErrorDomain {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Match => "match",
            Self::Options => "options",
        }
    }
}

impl fmt::Display for ErrorDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct Error {
    domain: ErrorDomain,
    code: i32,
    message: String,
    offset: Option<usize>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "{} at offset {}", self.message, offset),
            None => f.write_str(&self.message),
        }
    }
}

impl Error {
    /// Builds a match- or options-domain error described from the fixed table.
    pub(crate) fn new(domain: ErrorDomain, code: i32) -> Self {
        Self {
            domain,
            code,
            message: describe_error_code(code).to_owned(),
            offset: None,
        }
    }

    pub(crate) const fn compile(code: i32, message: String, offset: usize) -> Self {
        Self {
            domain: ErrorDomain::Compile,
            code,
            message,
            offset: Some(offset),
        }
    }

    /// Appends the engine's own reason to the message.
    pub(crate) fn with_engine_detail(mut self, engine_code: i32, detail: &str) -> Self {
        self.message = format!("{} ({detail}, engine code {engine_code})", self.message);
        self
    }

    pub const fn domain(&self) -> ErrorDomain {
        self.domain
    }

    pub const fn code(&self) -> i32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Byte offset into the pattern; only set for compile errors.
    pub const fn offset(&self) -> Option<usize> {
        self.offset
    }
}

pub const UNKNOWN_ERROR: &str = "unknown error code";

// indexed by `-code - 1`
static ENGINE_MESSAGES: [&str; 67] = [
    "no match",
    "partial match",
    "UTF-8 error: 1 byte missing at end",
    "UTF-8 error: 2 bytes missing at end",
    "UTF-8 error: 3 bytes missing at end",
    "UTF-8 error: 4 bytes missing at end",
    "UTF-8 error: 5 bytes missing at end",
    "UTF-8 error: byte 2 top bits not 0x80",
    "UTF-8 error: byte 3 top bits not 0x80",
    "UTF-8 error: byte 4 top bits not 0x80",
    "UTF-8 error: byte 5 top bits not 0x80",
    "UTF-8 error: byte 6 top bits not 0x80",
    "UTF-8 error: 5-byte character is not allowed (RFC 3629)",
    "UTF-8 error: 6-byte character is not allowed (RFC 3629)",
    "UTF-8 error: code points greater than 0x10ffff are not defined",
    "UTF-8 error: code points 0xd800-0xdfff are not defined",
    "UTF-8 error: overlong 2-byte sequence",
    "UTF-8 error: overlong 3-byte sequence",
    "UTF-8 error: overlong 4-byte sequence",
    "UTF-8 error: overlong 5-byte sequence",
    "UTF-8 error: overlong 6-byte sequence",
    "UTF-8 error: isolated byte with 0x80 bit set",
    "UTF-8 error: illegal byte (0xfe or 0xff)",
    "UTF-16 error: missing low surrogate at end",
    "UTF-16 error: invalid low surrogate",
    "UTF-16 error: isolated low surrogate",
    "UTF-32 error: code points 0xd800-0xdfff are not defined",
    "UTF-32 error: code points greater than 0x10ffff are not defined",
    "bad data value",
    "patterns do not all use the same character tables",
    "magic number missing",
    "pattern compiled in wrong mode: 8/16/32-bit error",
    "bad offset value",
    "bad option value",
    "invalid replacement string",
    "bad offset into UTF string",
    "callout error code",
    "invalid data in workspace for DFA restart",
    "too much recursion for DFA matching",
    "backreference condition or recursion test is not supported for DFA matching",
    "function is not supported for DFA matching",
    "pattern contains an item that is not supported for DFA matching",
    "workspace size exceeded in DFA matching",
    "internal error: pattern overwritten?",
    "bad JIT option",
    "JIT stack limit reached",
    "match limit exceeded",
    "no more memory",
    "unknown substring",
    "non-unique substring name",
    "NULL argument passed with non-zero length",
    "nested recursion at the same subject position",
    "matching depth limit exceeded",
    "requested value is not available",
    "requested value is not set",
    "offset limit set without PCRE2_USE_OFFSET_LIMIT",
    "bad escape sequence in replacement string",
    "expected closing curly bracket in replacement string",
    "bad substitution in replacement string",
    "match with end before start or start moved backwards is not supported",
    "too many replacements (more than INT_MAX)",
    "bad serialized data",
    "heap limit exceeded",
    "invalid syntax",
    "internal error: duplicate substitution match",
    "PCRE2_MATCH_INVALID_UTF is not supported for DFA matching",
    "invalid offset value",
];

/// Human-readable description of a PCRE2 match-time code or one of this
/// crate's own codes. Never empty; codes outside the table get
/// [`UNKNOWN_ERROR`].
#[must_use]
pub fn describe_error_code(code: i32) -> &'static str {
    match code {
        codes::CONFLICTING_NEWLINE => "more than one newline convention requested",
        codes::CONFLICTING_BSR => "more than one \\R convention requested",
        codes::UNCHECKED_UTF => "skipping UTF validation requires the unchecked entry point",
        codes::CONTEXT_SETTING => "compile context rejected a setting",
        -67..=-1 => ENGINE_MESSAGES[(-code - 1) as usize],
        _ => UNKNOWN_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_no_empty_entries() {
        for code in -80..0 {
            assert!(!describe_error_code(code).is_empty(), "code {code}");
        }
        assert!(ENGINE_MESSAGES.iter().all(|m| !m.is_empty()));
    }

    #[test]
    fn named_codes() {
        assert_eq!(describe_error_code(codes::NOMATCH), "no match");
        assert_eq!(describe_error_code(codes::BADOFFSET), "bad offset value");
        assert_eq!(describe_error_code(codes::BADUTFOFFSET), "bad offset into UTF string");
        assert_eq!(describe_error_code(codes::NOMEMORY), "no more memory");
        assert_eq!(describe_error_code(codes::INTERNAL), "internal error: pattern overwritten?");
    }

    #[test]
    fn stable_fallback() {
        for code in [0, 1, 101, -68, -999, i32::MIN, i32::MAX] {
            assert_eq!(describe_error_code(code), UNKNOWN_ERROR);
        }
    }

    #[test]
    fn display_includes_offset_for_compile_errors() {
        let err = Error::compile(114, "missing closing parenthesis".to_owned(), 3);
        assert_eq!(err.to_string(), "missing closing parenthesis at offset 3");
        assert_eq!(err.domain(), ErrorDomain::Compile);

        let err = Error::new(ErrorDomain::Match, codes::BADOFFSET);
        assert_eq!(err.to_string(), "bad offset value");
        assert_eq!(err.offset(), None);
    }
}
