use bitflags::bitflags;

use crate::error::{Error, ErrorDomain, codes};

bitflags! {
    /// Options fixed at compile time.
    ///
    /// The low 32 bits are PCRE2 compile options and keep the engine's bit
    /// values. The high 32 bits select settings that PCRE2 takes through its
    /// compile context (newline and `\R` conventions) or that expand into
    /// several native bits (`JAVASCRIPT_COMPAT`).
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CompileOptions: u64 {
        const ALLOW_EMPTY_CLASS = 0x0000_0001;
        const ALT_BSUX = 0x0000_0002;
        const AUTO_CALLOUT = 0x0000_0004;
        const CASELESS = 0x0000_0008;
        const DOLLAR_ENDONLY = 0x0000_0010;
        const DOTALL = 0x0000_0020;
        const DUPNAMES = 0x0000_0040;
        const EXTENDED = 0x0000_0080;
        const FIRSTLINE = 0x0000_0100;
        const MATCH_UNSET_BACKREF = 0x0000_0200;
        const MULTILINE = 0x0000_0400;
        const NEVER_UCP = 0x0000_0800;
        const NEVER_UTF = 0x0000_1000;
        const NO_AUTO_CAPTURE = 0x0000_2000;
        const NO_AUTO_POSSESS = 0x0000_4000;
        const NO_DOTSTAR_ANCHOR = 0x0000_8000;
        const NO_START_OPTIMIZE = 0x0001_0000;
        const UCP = 0x0002_0000;
        const UNGREEDY = 0x0004_0000;
        const UTF = 0x0008_0000;
        const EXTENDED_MORE = 0x0100_0000;
        const LITERAL = 0x0200_0000;
        const ENDANCHORED = 0x2000_0000;
        const NO_UTF_CHECK = 0x4000_0000;
        const ANCHORED = 0x8000_0000;

        const NEWLINE_CR = 1 << 32;
        const NEWLINE_LF = 1 << 33;
        const NEWLINE_CRLF = 1 << 34;
        const NEWLINE_ANY = 1 << 35;
        const NEWLINE_ANYCRLF = 1 << 36;
        const NEWLINE_NUL = 1 << 37;
        const BSR_ANYCRLF = 1 << 38;
        const BSR_UNICODE = 1 << 39;
        const JAVASCRIPT_COMPAT = 1 << 40;
    }
}

bitflags! {
    /// Options applied to a single match call. Values are PCRE2's.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MatchOptions: u32 {
        const NOTBOL = 0x0000_0001;
        const NOTEOL = 0x0000_0002;
        const NOTEMPTY = 0x0000_0004;
        const NOTEMPTY_ATSTART = 0x0000_0008;
        const PARTIAL_SOFT = 0x0000_0010;
        const PARTIAL_HARD = 0x0000_0020;
        const NO_JIT = 0x0000_2000;
        const ENDANCHORED = 0x2000_0000;
        const NO_UTF_CHECK = 0x4000_0000;
        const ANCHORED = 0x8000_0000;
    }
}

/// Line-ending convention handed to the engine's compile context.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Newline {
    Cr = 1,
    Lf = 2,
    CrLf = 3,
    Any = 4,
    AnyCrLf = 5,
    Nul = 6,
}

/// What `\R` matches.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Bsr {
    Unicode = 1,
    AnyCrLf = 2,
}

const NATIVE_MASK: u64 = 0xFFFF_FFFF;

const NEWLINE_FLAGS: [(CompileOptions, Newline); 6] = [
    (CompileOptions::NEWLINE_CR, Newline::Cr),
    (CompileOptions::NEWLINE_LF, Newline::Lf),
    (CompileOptions::NEWLINE_CRLF, Newline::CrLf),
    (CompileOptions::NEWLINE_ANY, Newline::Any),
    (CompileOptions::NEWLINE_ANYCRLF, Newline::AnyCrLf),
    (CompileOptions::NEWLINE_NUL, Newline::Nul),
];

const BSR_FLAGS: [(CompileOptions, Bsr); 2] = [
    (CompileOptions::BSR_ANYCRLF, Bsr::AnyCrLf),
    (CompileOptions::BSR_UNICODE, Bsr::Unicode),
];

/// Compile options resolved into what the engine consumes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct EngineOptions {
    pub(crate) native: u32,
    pub(crate) newline: Option<Newline>,
    pub(crate) bsr: Option<Bsr>,
}

fn pick_one<T: Copy>(
    options: CompileOptions,
    table: &[(CompileOptions, T)],
    code: i32,
) -> Result<Option<T>, Error> {
    let mut found = table.iter().filter(|(flag, _)| options.contains(*flag));
    let first = found.next().map(|&(_, value)| value);
    if found.next().is_some() {
        return Err(Error::new(ErrorDomain::Options, code));
    }
    Ok(first)
}

impl CompileOptions {
    /// The bits passed to the engine's compile call unchanged.
    #[inline]
    #[must_use]
    pub const fn native_bits(self) -> u32 {
        (self.bits() & NATIVE_MASK) as u32
    }

    pub fn newline(self) -> Result<Option<Newline>, Error> {
        pick_one(self, &NEWLINE_FLAGS, codes::CONFLICTING_NEWLINE)
    }

    pub fn bsr(self) -> Result<Option<Bsr>, Error> {
        pick_one(self, &BSR_FLAGS, codes::CONFLICTING_BSR)
    }

    pub(crate) fn resolve(self) -> Result<EngineOptions, Error> {
        let mut native = self;
        if self.contains(Self::JAVASCRIPT_COMPAT) {
            native |= Self::ALT_BSUX | Self::ALLOW_EMPTY_CLASS | Self::MATCH_UNSET_BACKREF;
        }
        Ok(EngineOptions {
            native: native.native_bits(),
            newline: self.newline()?,
            bsr: self.bsr()?,
        })
    }
}
