use lexopt::{Arg, Parser, ValueExt};
use pcregex_core::{CompileOptions, MatchOptions};
use std::ffi::OsString;

pub const USAGE: &str = "\
usage: pcregex [OPTIONS] PATTERN [SUBJECT]...
       pcregex --describe CODE

Matches PATTERN against each SUBJECT (or each line of stdin) and prints the
capture ranges of the first match.

options:
  -i                     caseless matching
  -m                     ^ and $ match at internal newlines
  -s                     . matches newlines
  -x                     extended (free-spacing) syntax
  -u                     UTF-8 mode
  -U                     ungreedy quantifiers
  -A                     anchor the pattern at the start offset
  --newline KIND         cr, lf, crlf, any, anycrlf or nul
  --offset N             byte offset to start matching from
  --notbol, --noteol     subject start/end is not a line start/end
  --notempty             reject empty matches
  --partial soft|hard    report partial matches
  --describe CODE        print the description of an engine error code
  -v                     more logging (repeatable); PCREGEX_LOG overrides
  -h, --help             show this help";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RunMode {
    Match {
        pattern: String,
        subjects: Vec<String>,
    },
    Describe(i32),
    Help,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) compile_options: CompileOptions,
    pub(crate) match_options: MatchOptions,
    pub(crate) start_offset: usize,
    pub(crate) verbose: u8,
}

fn newline_flag(kind: &str) -> Result<CompileOptions, lexopt::Error> {
    Ok(match kind {
        "cr" => CompileOptions::NEWLINE_CR,
        "lf" => CompileOptions::NEWLINE_LF,
        "crlf" => CompileOptions::NEWLINE_CRLF,
        "any" => CompileOptions::NEWLINE_ANY,
        "anycrlf" => CompileOptions::NEWLINE_ANYCRLF,
        "nul" => CompileOptions::NEWLINE_NUL,
        other => return Err(format!("unknown newline convention '{other}'").into()),
    })
}

fn partial_flag(kind: &str) -> Result<MatchOptions, lexopt::Error> {
    match kind {
        "soft" => Ok(MatchOptions::PARTIAL_SOFT),
        "hard" => Ok(MatchOptions::PARTIAL_HARD),
        other => Err(format!("unknown partial mode '{other}'").into()),
    }
}

/// Create settings by examining the command line.
pub(crate) fn parse_opts() -> Result<(Settings, RunMode), lexopt::Error> {
    parse_args(std::env::args_os().skip(1))
}

pub(crate) fn parse_args<I>(args: I) -> Result<(Settings, RunMode), lexopt::Error>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    settings_from(Parser::from_args(args))
}

fn settings_from(mut parser: Parser) -> Result<(Settings, RunMode), lexopt::Error> {
    let mut settings = Settings::default();
    let mut positional = Vec::new();
    let mut describe = None;

    while let Some(arg) = parser.next()? {
        match arg {
            Arg::Short('i') => settings.compile_options |= CompileOptions::CASELESS,
            Arg::Short('m') => settings.compile_options |= CompileOptions::MULTILINE,
            Arg::Short('s') => settings.compile_options |= CompileOptions::DOTALL,
            Arg::Short('x') => settings.compile_options |= CompileOptions::EXTENDED,
            Arg::Short('u') => settings.compile_options |= CompileOptions::UTF,
            Arg::Short('U') => settings.compile_options |= CompileOptions::UNGREEDY,
            Arg::Short('A') => settings.compile_options |= CompileOptions::ANCHORED,
            Arg::Long("newline") => {
                let kind = parser.value()?.string()?;
                settings.compile_options |= newline_flag(&kind)?;
            }
            Arg::Long("offset") => settings.start_offset = parser.value()?.parse()?,
            Arg::Long("notbol") => settings.match_options |= MatchOptions::NOTBOL,
            Arg::Long("noteol") => settings.match_options |= MatchOptions::NOTEOL,
            Arg::Long("notempty") => settings.match_options |= MatchOptions::NOTEMPTY,
            Arg::Long("partial") => {
                let kind = parser.value()?.string()?;
                settings.match_options |= partial_flag(&kind)?;
            }
            Arg::Long("describe") => describe = Some(parser.value()?.parse()?),
            Arg::Short('v') => settings.verbose = settings.verbose.saturating_add(1),
            Arg::Short('h') | Arg::Long("help") => return Ok((settings, RunMode::Help)),
            Arg::Value(value) => positional.push(value.string()?),
            _ => return Err(arg.unexpected()),
        }
    }

    if let Some(code) = describe {
        return Ok((settings, RunMode::Describe(code)));
    }
    let mut positional = positional.into_iter();
    let pattern = positional.next().ok_or("missing PATTERN")?;
    let mode = RunMode::Match {
        pattern,
        subjects: positional.collect(),
    };
    Ok((settings, mode))
}
