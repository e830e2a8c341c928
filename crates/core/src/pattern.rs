use std::{fmt, sync::Arc};

use log::{debug, trace};

use crate::{
    error::Error,
    ffi::{Code, GeneralContext},
    options::CompileOptions,
};

/// A compiled pattern shared between threads.
pub type SharedPattern = Arc<CompiledPattern>;

/// One successfully compiled expression.
///
/// The compiled code, its JIT data and the allocator context that produced
/// them are released together when the value is dropped. Matching only reads
/// them, so a pattern can be shared (see [`SharedPattern`]) and matched from
/// several threads at once.
pub struct CompiledPattern {
    // field order is drop order: code before the context that allocated it
    pub(crate) code: Code,
    pub(crate) general: GeneralContext,
    capture_count: usize,
    studied: bool,
    pattern: Box<str>,
    options: CompileOptions,
}

impl CompiledPattern {
    /// Compiles `pattern` with no options.
    pub fn new(pattern: &str) -> Result<Self, Error> {
        Self::with_options(pattern, CompileOptions::empty())
    }

    pub fn with_options(pattern: &str, options: CompileOptions) -> Result<Self, Error> {
        let resolved = options.resolve()?;
        let general = GeneralContext::new()?;
        let mut code = Code::compile(pattern, &resolved, &general)?;
        // from here on `code` is owned, so any early return frees it
        let capture_count = code.capture_count()?;
        let studied = match code.jit_compile() {
            Ok(()) => true,
            Err(rc) => {
                debug!("JIT compilation skipped for {pattern:?}: engine code {rc}");
                false
            }
        };
        trace!("compiled {pattern:?} ({capture_count} groups, studied: {studied})");
        Ok(Self {
            code,
            general,
            capture_count,
            studied,
            pattern: pattern.into(),
            options,
        })
    }

    /// Wraps the pattern for sharing across threads.
    #[must_use]
    pub fn into_shared(self) -> SharedPattern {
        Arc::new(self)
    }

    /// Number of capturing groups, not counting group 0.
    #[inline]
    #[must_use]
    pub const fn capture_count(&self) -> usize {
        self.capture_count
    }

    /// Whether the optimisation step succeeded. Matching results do not
    /// depend on it.
    #[inline]
    #[must_use]
    pub const fn is_studied(&self) -> bool {
        self.studied
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    #[must_use]
    pub const fn options(&self) -> CompileOptions {
        self.options
    }

    /// Whether subjects are treated as UTF-8 rather than bytes.
    pub(crate) const fn is_utf(&self) -> bool {
        self.options.contains(CompileOptions::UTF)
    }
}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPattern")
            .field("pattern", &self.pattern)
            .field("options", &self.options)
            .field("capture_count", &self.capture_count)
            .field("studied", &self.studied)
            .finish()
    }
}

impl fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

/// Compiles `pattern` with `options`.
pub fn compile(pattern: &str, options: CompileOptions) -> Result<CompiledPattern, Error> {
    CompiledPattern::with_options(pattern, options)
}
