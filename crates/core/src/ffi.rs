//! Owning wrappers around the raw PCRE2 handles.
//!
//! Every engine allocation is made through a general context whose callbacks
//! forward to the Rust global allocator, so engine memory shows up in (and is
//! returned to) the same heap as everything else in the process.

use std::{
    alloc::{Layout, alloc, dealloc},
    ptr::{self, NonNull},
};

use libc::{c_int, c_void};
use log::debug;
use pcre2_sys::{
    PCRE2_INFO_CAPTURECOUNT, PCRE2_JIT_COMPLETE, PCRE2_JIT_PARTIAL_HARD, PCRE2_JIT_PARTIAL_SOFT,
    pcre2_code_8, pcre2_code_free_8, pcre2_compile_8, pcre2_compile_context_8,
    pcre2_compile_context_create_8, pcre2_compile_context_free_8, pcre2_general_context_8,
    pcre2_general_context_create_8, pcre2_general_context_free_8, pcre2_get_error_message_8,
    pcre2_get_ovector_count_8, pcre2_get_ovector_pointer_8, pcre2_jit_compile_8, pcre2_match_8,
    pcre2_match_data_8, pcre2_match_data_create_8, pcre2_match_data_free_8, pcre2_pattern_info_8,
    pcre2_set_bsr_8, pcre2_set_newline_8,
};

use crate::{
    error::{Error, ErrorDomain, codes, describe_error_code},
    options::EngineOptions,
};

// every block is prefixed with its total size; 16 keeps malloc's alignment
const HEADER: usize = 16;

extern "C" fn engine_malloc(size: usize, _data: *mut c_void) -> *mut c_void {
    let Some(total) = size.checked_add(HEADER) else {
        return ptr::null_mut();
    };
    let Ok(layout) = Layout::from_size_align(total, HEADER) else {
        return ptr::null_mut();
    };
    // SAFETY: layout has non-zero size.
    unsafe {
        let base = alloc(layout);
        if base.is_null() {
            return ptr::null_mut();
        }
        base.cast::<usize>().write(total);
        base.add(HEADER).cast()
    }
}

extern "C" fn engine_free(block: *mut c_void, _data: *mut c_void) {
    if block.is_null() {
        return;
    }
    // SAFETY: `block` was returned by `engine_malloc`, which stored the
    // layout size in the header just before it.
    unsafe {
        let base = block.cast::<u8>().sub(HEADER);
        let total = base.cast::<usize>().read();
        dealloc(base, Layout::from_size_align_unchecked(total, HEADER));
    }
}

/// Engine message for `code`, falling back to the fixed table.
pub(crate) fn engine_message(code: i32) -> String {
    let mut buf = [0u8; 256];
    // SAFETY: the buffer pointer and length describe a valid writable region.
    let len = unsafe { pcre2_get_error_message_8(code as c_int, buf.as_mut_ptr(), buf.len()) };
    if len > 0 {
        String::from_utf8_lossy(&buf[..len as usize]).into_owned()
    } else {
        describe_error_code(code).to_owned()
    }
}

// compile-domain errors that don't come from parsing point at offset 0
fn setup_failure(code: i32) -> Error {
    Error::compile(code, describe_error_code(code).to_owned(), 0)
}

pub(crate) struct GeneralContext(NonNull<pcre2_general_context_8>);

impl GeneralContext {
    pub(crate) fn new() -> Result<Self, Error> {
        // SAFETY: the callbacks are valid for the lifetime of the program and
        // ignore their user-data pointer.
        let ctx = unsafe {
            pcre2_general_context_create_8(Some(engine_malloc), Some(engine_free), ptr::null_mut())
        };
        NonNull::new(ctx)
            .map(Self)
            .ok_or_else(|| setup_failure(codes::NOMEMORY))
    }

    pub(crate) const fn as_ptr(&self) -> *mut pcre2_general_context_8 {
        self.0.as_ptr()
    }
}

impl Drop for GeneralContext {
    fn drop(&mut self) {
        // SAFETY: the context was created by `pcre2_general_context_create_8`
        // and is freed only here.
        unsafe { pcre2_general_context_free_8(self.0.as_ptr()) }
    }
}

struct CompileContext(NonNull<pcre2_compile_context_8>);

impl CompileContext {
    fn new(general: &GeneralContext, options: &EngineOptions) -> Result<Self, Error> {
        // SAFETY: `general` is a live general context.
        let ctx = unsafe { pcre2_compile_context_create_8(general.as_ptr()) };
        let ctx = NonNull::new(ctx)
            .map(Self)
            .ok_or_else(|| setup_failure(codes::NOMEMORY))?;
        if let Some(newline) = options.newline {
            // SAFETY: `ctx` is a live compile context.
            context_setting(unsafe { pcre2_set_newline_8(ctx.0.as_ptr(), newline as u32) })?;
        }
        if let Some(bsr) = options.bsr {
            // SAFETY: as above.
            context_setting(unsafe { pcre2_set_bsr_8(ctx.0.as_ptr(), bsr as u32) })?;
        }
        Ok(ctx)
    }
}

fn context_setting(rc: c_int) -> Result<(), Error> {
    if rc == 0 {
        return Ok(());
    }
    debug!("compile context rejected a setting: engine code {rc}");
    Err(Error::new(ErrorDomain::Options, codes::CONTEXT_SETTING)
        .with_engine_detail(rc, &engine_message(rc)))
}

impl Drop for CompileContext {
    fn drop(&mut self) {
        // SAFETY: created by `pcre2_compile_context_create_8`, freed only here.
        unsafe { pcre2_compile_context_free_8(self.0.as_ptr()) }
    }
}

/// A compiled pattern handle. Freed exactly once, on drop; the JIT data
/// produced by [`Code::jit_compile`] lives inside it and goes with it.
pub(crate) struct Code(NonNull<pcre2_code_8>);

// SAFETY: the engine never mutates compiled code during a match, and
// `pcre2_match` is reentrant for a given code handle.
unsafe impl Send for Code {}
unsafe impl Sync for Code {}
unsafe impl Send for GeneralContext {}
unsafe impl Sync for GeneralContext {}

impl Code {
    pub(crate) fn compile(
        pattern: &str,
        options: &EngineOptions,
        general: &GeneralContext,
    ) -> Result<Self, Error> {
        let ctx = CompileContext::new(general, options)?;
        let mut error_code: c_int = 0;
        let mut error_offset: usize = 0;
        // SAFETY: pattern pointer and length come from a live `&str`; the
        // out-parameters point to locals.
        let code = unsafe {
            pcre2_compile_8(
                pattern.as_ptr(),
                pattern.len(),
                options.native,
                &mut error_code,
                &mut error_offset,
                ctx.0.as_ptr(),
            )
        };
        match NonNull::new(code) {
            Some(code) => Ok(Self(code)),
            None => Err(Error::compile(
                error_code,
                engine_message(error_code),
                error_offset,
            )),
        }
    }

    /// Number of capturing groups, not counting the whole match.
    pub(crate) fn capture_count(&self) -> Result<usize, Error> {
        let mut count: u32 = 0;
        // SAFETY: CAPTURECOUNT writes a single u32.
        let rc = unsafe {
            pcre2_pattern_info_8(
                self.0.as_ptr(),
                PCRE2_INFO_CAPTURECOUNT,
                (&raw mut count).cast::<c_void>(),
            )
        };
        if rc == 0 {
            Ok(count as usize)
        } else {
            Err(setup_failure(rc))
        }
    }

    /// Returns the engine's code when JIT compilation is unavailable or fails.
    pub(crate) fn jit_compile(&mut self) -> Result<(), i32> {
        let modes = PCRE2_JIT_COMPLETE | PCRE2_JIT_PARTIAL_SOFT | PCRE2_JIT_PARTIAL_HARD;
        // SAFETY: `&mut self` guarantees no match is using the code.
        let rc = unsafe { pcre2_jit_compile_8(self.0.as_ptr(), modes) };
        if rc == 0 { Ok(()) } else { Err(rc) }
    }

    /// Runs one match. The subject slice carries its own length, so embedded
    /// NULs are fine.
    ///
    /// # Safety
    ///
    /// If `options` contains `NO_UTF_CHECK` and the pattern is in UTF mode,
    /// `subject` must be valid UTF-8 and `start` must sit on a character
    /// boundary.
    pub(crate) unsafe fn exec(
        &self,
        subject: &[u8],
        start: usize,
        options: u32,
        data: &mut MatchData,
    ) -> c_int {
        // SAFETY: forwarded to the caller for the UTF case; all pointers are
        // live for the duration of the call.
        unsafe {
            pcre2_match_8(
                self.0.as_ptr(),
                subject.as_ptr(),
                subject.len(),
                start,
                options,
                data.0.as_ptr(),
                ptr::null_mut(),
            )
        }
    }
}

impl Drop for Code {
    fn drop(&mut self) {
        // SAFETY: created by `pcre2_compile_8`, freed only here.
        unsafe { pcre2_code_free_8(self.0.as_ptr()) }
    }
}

/// Per-call output block holding the offset vector.
pub(crate) struct MatchData(NonNull<pcre2_match_data_8>);

impl MatchData {
    pub(crate) fn new(pairs: usize, general: &GeneralContext) -> Result<Self, Error> {
        let no_memory = || Error::new(ErrorDomain::Match, codes::NOMEMORY);
        let pairs = u32::try_from(pairs).map_err(|_| no_memory())?;
        // SAFETY: `general` is a live general context.
        let data = unsafe { pcre2_match_data_create_8(pairs, general.as_ptr()) };
        NonNull::new(data)
            .map(Self)
            .ok_or_else(no_memory)
    }

    /// Offset pairs flattened as `[start0, end0, start1, end1, ...]`.
    pub(crate) fn ovector(&self) -> &[usize] {
        // SAFETY: the engine guarantees the pointer addresses `2 * count`
        // elements that live as long as the match data.
        unsafe {
            let count = pcre2_get_ovector_count_8(self.0.as_ptr()) as usize;
            let ptr = pcre2_get_ovector_pointer_8(self.0.as_ptr());
            std::slice::from_raw_parts(ptr, 2 * count)
        }
    }
}

impl Drop for MatchData {
    fn drop(&mut self) {
        // SAFETY: created by `pcre2_match_data_create_8`, freed only here.
        unsafe { pcre2_match_data_free_8(self.0.as_ptr()) }
    }
}
