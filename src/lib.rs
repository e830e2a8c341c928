//! This is the `pcregex` binary. If you're looking to match from your own code, you're likely
//! looking for the [`pcregex-core`](https://docs.rs/pcregex-core) crate.
//!
//! The binary compiles one pattern and reports the first match in each subject, which makes it
//! handy for checking how an option set changes what a pattern captures:
//!
//! ```text
//! $ pcregex '(a)(b)?' ab a xx
//! ab: match
//!   0: 0..2 "ab"
//!   1: 0..1 "a"
//!   2: 1..2 "b"
//! a: match
//!   0: 0..1 "a"
//!   1: 0..1 "a"
//!   2: unset
//! xx: no match
//! ```

#[macro_use]
extern crate log;

mod settings;

use pcregex_core::{Captures, CompiledPattern, compile, describe_error_code};
use settings::{RunMode, Settings};
use std::{
    error::Error,
    io::{self, BufRead, Write},
    process::ExitCode,
};

pub use pcregex_core;
pub use settings::USAGE;

/// The main cli of `pcregex`. Exits 0 when some subject matched, 1 when none
/// did and 2 on errors.
pub fn run() -> ExitCode {
    let (settings, mode) = match settings::parse_opts() {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("pcregex: {err}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };
    init_logging(settings.verbose);

    match mode {
        RunMode::Help => {
            println!("{USAGE}");
            ExitCode::SUCCESS
        }
        RunMode::Describe(code) => {
            println!("{code}: {}", describe_error_code(code));
            ExitCode::SUCCESS
        }
        RunMode::Match { pattern, subjects } => {
            let stdout = io::stdout();
            match run_match(&settings, &pattern, subjects, &mut stdout.lock()) {
                Ok(true) => ExitCode::SUCCESS,
                Ok(false) => ExitCode::from(1),
                Err(err) => {
                    error!("{err}");
                    eprintln!("pcregex: {err}");
                    ExitCode::from(2)
                }
            }
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("PCREGEX_LOG", level)).init();
}

fn run_match(
    settings: &Settings,
    pattern: &str,
    subjects: Vec<String>,
    out: &mut impl Write,
) -> Result<bool, Box<dyn Error>> {
    let compiled = compile(pattern, settings.compile_options)?;
    debug!("{compiled:?}");

    let mut any = false;
    if subjects.is_empty() {
        for line in io::stdin().lock().lines() {
            any |= match_one(&compiled, settings, &line?, out)?;
        }
    } else {
        for subject in &subjects {
            any |= match_one(&compiled, settings, subject, out)?;
        }
    }
    Ok(any)
}

fn match_one(
    pattern: &CompiledPattern,
    settings: &Settings,
    subject: &str,
    out: &mut impl Write,
) -> Result<bool, Box<dyn Error>> {
    let found = pattern.first_match_bytes(
        subject.as_bytes(),
        settings.start_offset,
        settings.match_options,
    )?;
    match found {
        Some(caps) => {
            write_captures(out, subject, &caps)?;
            Ok(true)
        }
        None => {
            writeln!(out, "{subject}: no match")?;
            Ok(false)
        }
    }
}

fn write_captures(out: &mut impl Write, subject: &str, caps: &Captures) -> io::Result<()> {
    let kind = if caps.is_partial() { "partial match" } else { "match" };
    writeln!(out, "{subject}: {kind}")?;
    for (group, range) in caps.iter().enumerate() {
        match range {
            Some(range) => {
                let text = String::from_utf8_lossy(&subject.as_bytes()[range.clone()]);
                writeln!(out, "  {group}: {}..{} {text:?}", range.start, range.end)?;
            }
            None => writeln!(out, "  {group}: unset")?,
        }
    }
    Ok(())
}
