use std::{ffi::CStr, ops::Range};

use libc::c_int;
use log::{debug, trace};

use crate::{
    error::{Error, ErrorDomain, codes},
    ffi::MatchData,
    options::MatchOptions,
    pattern::CompiledPattern,
};

const UNSET: usize = usize::MAX;

/// Capture ranges of one match; `None` marks a group that did not take part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captures {
    ranges: Vec<Option<Range<usize>>>,
    partial: bool,
}

impl Captures {
    /// Number of entries, group 0 included.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    #[must_use]
    pub fn get(&self, group: usize) -> Option<Range<usize>> {
        self.ranges.get(group).cloned().flatten()
    }

    /// Extent of the whole match.
    #[must_use]
    pub fn whole(&self) -> Range<usize> {
        self.get(0).unwrap_or_default()
    }

    #[must_use]
    pub fn ranges(&self) -> &[Option<Range<usize>>] {
        &self.ranges
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<Range<usize>>> + '_ {
        self.ranges.iter().cloned()
    }

    /// Set when a partial-match option stopped at the end of the subject.
    /// Only group 0 is meaningful then.
    #[inline]
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        self.partial
    }

    /// The captured slices of `subject`, which must be the matched subject.
    #[must_use]
    pub fn extract<'s>(&self, subject: &'s [u8]) -> Vec<Option<&'s [u8]>> {
        self.iter()
            .map(|range| range.and_then(|r| subject.get(r)))
            .collect()
    }

    fn from_ovector(ovector: &[usize], groups: usize, filled: usize) -> Self {
        let ranges = (0..groups)
            .map(|group| {
                if group >= filled {
                    return None;
                }
                match ovector.get(2 * group..2 * group + 2) {
                    Some(&[start, end]) if start != UNSET && end != UNSET => Some(start..end),
                    _ => None,
                }
            })
            .collect();
        Self {
            ranges,
            partial: false,
        }
    }

    fn partial(ovector: &[usize], groups: usize) -> Self {
        let mut captures = Self::from_ovector(ovector, groups, 1);
        captures.partial = true;
        captures
    }

    /// Interprets the engine's return code against the offset vector it
    /// filled.
    fn from_rc(rc: c_int, ovector: &[usize], groups: usize) -> Result<Option<Self>, Error> {
        match rc {
            codes::NOMATCH => Ok(None),
            codes::PARTIAL => Ok(Some(Self::partial(ovector, groups))),
            rc if rc < 0 => Err(Error::new(ErrorDomain::Match, rc)),
            // the vector filled up; read every pair it holds
            0 => Ok(Some(Self::from_ovector(ovector, groups, ovector.len() / 2))),
            rc => Ok(Some(Self::from_ovector(ovector, groups, rc as usize))),
        }
    }
}

impl<'a> IntoIterator for &'a Captures {
    type Item = Option<Range<usize>>;
    type IntoIter = std::iter::Cloned<std::slice::Iter<'a, Option<Range<usize>>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter().cloned()
    }
}

#[derive(Debug, Clone, Copy)]
struct Request<'a> {
    subject: &'a [u8],
    start: usize,
    options: MatchOptions,
}

impl CompiledPattern {
    /// Finds the first match in `subject` at or after byte offset `start`.
    ///
    /// Offsets in the result are byte offsets into `subject`. For a UTF
    /// pattern `start` must lie on a character boundary; otherwise any byte
    /// offset up to the length is accepted.
    pub fn first_match(&self, subject: &str, start: usize) -> Result<Option<Captures>, Error> {
        let options = if self.is_utf() {
            if start <= subject.len() && !subject.is_char_boundary(start) {
                return Err(Error::new(ErrorDomain::Match, codes::BADUTFOFFSET));
            }
            MatchOptions::NO_UTF_CHECK
        } else {
            MatchOptions::empty()
        };
        let req = Request {
            subject: subject.as_bytes(),
            start,
            options,
        };
        // SAFETY: a `&str` is valid UTF-8, and `start` was checked to be a
        // char boundary whenever NO_UTF_CHECK is set.
        unsafe { self.exec(req) }
    }

    /// Finds the first match in a byte buffer that may contain NULs.
    ///
    /// `MatchOptions::NO_UTF_CHECK` is refused here; see
    /// [`first_match_bytes_unchecked`](Self::first_match_bytes_unchecked).
    pub fn first_match_bytes(
        &self,
        subject: &[u8],
        start: usize,
        options: MatchOptions,
    ) -> Result<Option<Captures>, Error> {
        if options.contains(MatchOptions::NO_UTF_CHECK) {
            return Err(Error::new(ErrorDomain::Options, codes::UNCHECKED_UTF));
        }
        // SAFETY: the engine validates UTF itself without NO_UTF_CHECK.
        unsafe {
            self.exec(Request {
                subject,
                start,
                options,
            })
        }
    }

    /// Like [`first_match_bytes`](Self::first_match_bytes) but lets
    /// `NO_UTF_CHECK` through.
    ///
    /// # Safety
    ///
    /// With `NO_UTF_CHECK` on a UTF pattern, `subject` must be valid UTF-8
    /// and `start` must be a character boundary.
    pub unsafe fn first_match_bytes_unchecked(
        &self,
        subject: &[u8],
        start: usize,
        options: MatchOptions,
    ) -> Result<Option<Captures>, Error> {
        // SAFETY: forwarded to the caller.
        unsafe {
            self.exec(Request {
                subject,
                start,
                options,
            })
        }
    }

    /// Matches the bytes of a NUL-terminated string, terminator excluded.
    pub fn first_match_cstr(
        &self,
        subject: &CStr,
        start: usize,
        options: MatchOptions,
    ) -> Result<Option<Captures>, Error> {
        self.first_match_bytes(subject.to_bytes(), start, options)
    }

    /// # Safety
    ///
    /// Same contract as `Code::exec`.
    unsafe fn exec(&self, req: Request<'_>) -> Result<Option<Captures>, Error> {
        if req.start > req.subject.len() {
            return Err(Error::new(ErrorDomain::Match, codes::BADOFFSET));
        }
        let groups = self.capture_count() + 1;
        let mut data = MatchData::new(groups, &self.general)?;
        // SAFETY: forwarded to the caller.
        let mut rc = unsafe {
            self.code
                .exec(req.subject, req.start, req.options.bits(), &mut data)
        };
        // JIT code runs on a small fixed stack; the interpreter does not
        if rc == codes::JIT_STACKLIMIT
            && self.is_studied()
            && !req.options.contains(MatchOptions::NO_JIT)
        {
            debug!("{:?}: JIT stack exhausted, retrying without JIT", self.as_str());
            let options = req.options | MatchOptions::NO_JIT;
            // SAFETY: same request, one extra option.
            rc = unsafe {
                self.code
                    .exec(req.subject, req.start, options.bits(), &mut data)
            };
        }
        trace!("{:?} at {}: engine returned {rc}", self.as_str(), req.start);
        Captures::from_rc(rc, data.ovector(), groups)
    }
}
