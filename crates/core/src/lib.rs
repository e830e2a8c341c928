//! Compile-once, match-many regular expressions on top of PCRE2.
//!
//! ```
//! use pcregex_core::{CompileOptions, compile};
//!
//! let pattern = compile("(a)(b)?", CompileOptions::empty()).unwrap();
//! let caps = pattern.first_match("a", 0).unwrap().unwrap();
//! assert_eq!(caps.ranges(), &[Some(0..1), Some(0..1), None]);
//! assert!(pattern.first_match("xx", 0).unwrap().is_none());
//! ```
//!
//! Offsets are byte offsets. A missing match is `Ok(None)`, never an error;
//! engine failures come back as [`Error`] with a domain, the numeric code and
//! a description from [`describe_error_code`] or the engine.

mod ffi;

pub mod error;
pub mod matcher;
pub mod options;
pub mod pattern;

pub use error::{Error, ErrorDomain, describe_error_code};
pub use matcher::Captures;
pub use options::{Bsr, CompileOptions, MatchOptions, Newline};
pub use pattern::{CompiledPattern, SharedPattern, compile};
