use std::{ffi::CString, sync::Arc, thread};

use pcregex_core::{
    CompileOptions, CompiledPattern, ErrorDomain, MatchOptions, compile, describe_error_code,
    error::{UNKNOWN_ERROR, codes},
};

fn pattern(source: &str) -> CompiledPattern {
    CompiledPattern::new(source).unwrap()
}

#[test]
fn optional_group_participates() {
    let re = pattern("(a)(b)?");
    assert_eq!(re.capture_count(), 2);
    let caps = re.first_match("ab", 0).unwrap().unwrap();
    assert_eq!(caps.ranges(), &[Some(0..2), Some(0..1), Some(1..2)]);
    assert_eq!(caps.len(), 3);
}

#[test]
fn optional_group_unset() {
    let re = pattern("(a)(b)?");
    let caps = re.first_match("a", 0).unwrap().unwrap();
    assert_eq!(caps.ranges(), &[Some(0..1), Some(0..1), None]);
    assert_eq!(caps.get(2), None);
}

#[test]
fn no_match_is_not_an_error() {
    let re = pattern("(a)(b)?");
    assert_eq!(re.first_match("xx", 0), Ok(None));
    assert_eq!(re.first_match("", 0), Ok(None));
}

#[test]
fn start_offset_moves_the_search() {
    let re = pattern("(a)");
    let caps = re.first_match("aba", 1).unwrap().unwrap();
    assert_eq!(caps.ranges(), &[Some(2..3), Some(2..3)]);
    assert_eq!(re.first_match("aba", 3), Ok(None));
}

#[test]
fn start_offset_past_end_is_rejected() {
    let re = pattern("a");
    let err = re.first_match("aa", 3).unwrap_err();
    assert_eq!(err.domain(), ErrorDomain::Match);
    assert_eq!(err.code(), codes::BADOFFSET);
    assert_eq!(err.offset(), None);

    let err = re.first_match_bytes(b"a", 2, MatchOptions::empty()).unwrap_err();
    assert_eq!(err.code(), codes::BADOFFSET);
}

#[test]
fn invalid_patterns_point_inside_the_pattern() {
    for source in ["ab(c", "a)", "[a-", "x{2,1}", "(?<n>a)(?<n>b)", "\\", "*a"] {
        let err = CompiledPattern::new(source).unwrap_err();
        assert_eq!(err.domain(), ErrorDomain::Compile, "{source}");
        let offset = err.offset().expect("compile errors carry an offset");
        assert!(offset <= source.len(), "{source}: {offset}");
        assert!(!err.message().is_empty());
        assert!(err.to_string().contains("at offset"));
    }
}

#[test]
fn recompiling_gives_identical_results() {
    let subjects = ["ab", "a", "xx", "zzab", ""];
    let first = compile("(a)(b)?", CompileOptions::CASELESS).unwrap();
    let second = compile("(a)(b)?", CompileOptions::CASELESS).unwrap();
    for subject in subjects {
        assert_eq!(
            first.first_match(subject, 0),
            second.first_match(subject, 0),
            "{subject}"
        );
    }
}

#[test]
fn caseless() {
    let re = compile("ABC", CompileOptions::CASELESS).unwrap();
    let caps = re.first_match("abc", 0).unwrap().unwrap();
    assert_eq!(caps.whole(), 0..3);
    assert_eq!(pattern("ABC").first_match("abc", 0), Ok(None));
}

#[test]
fn describe_error_code_table() {
    for code in -67..=-1 {
        let text = describe_error_code(code);
        assert!(!text.is_empty());
        assert_ne!(text, UNKNOWN_ERROR, "{code}");
    }
    assert_eq!(describe_error_code(-4242), UNKNOWN_ERROR);
    assert_eq!(describe_error_code(7), UNKNOWN_ERROR);
}

#[test]
fn embedded_nul_in_subject() {
    let re = pattern("b(\\x00)c");
    let caps = re
        .first_match_bytes(b"a\0b\0c", 0, MatchOptions::empty())
        .unwrap()
        .unwrap();
    assert_eq!(caps.ranges(), &[Some(2..5), Some(3..4)]);
}

#[test]
fn c_string_subject() {
    let re = pattern("o+");
    let subject = CString::new("foo bar").unwrap();
    let caps = re
        .first_match_cstr(&subject, 0, MatchOptions::empty())
        .unwrap()
        .unwrap();
    assert_eq!(caps.whole(), 1..3);
    assert_eq!(caps.extract(subject.as_bytes()), vec![Some(&b"oo"[..])]);
}

#[test]
fn utf_offsets_are_bytes() {
    let re = compile("é(.)", CompileOptions::UTF).unwrap();
    let caps = re.first_match("xéñ", 0).unwrap().unwrap();
    assert_eq!(caps.ranges(), &[Some(1..5), Some(3..5)]);
}

#[test]
fn text_start_must_be_a_char_boundary() {
    let re = compile(".", CompileOptions::UTF).unwrap();
    let err = re.first_match("é", 1).unwrap_err();
    assert_eq!(err.domain(), ErrorDomain::Match);
    assert_eq!(err.code(), codes::BADUTFOFFSET);
}

#[test]
fn byte_mode_start_may_split_a_char() {
    let re = pattern(".");
    let first = re.first_match("é", 0).unwrap().unwrap();
    assert_eq!(first.whole(), 0..1);
    let second = re.first_match("é", first.whole().end).unwrap().unwrap();
    assert_eq!(second.whole(), 1..2);
    assert_eq!(re.first_match("é", 2), Ok(None));
}

#[test]
fn invalid_utf_subject_is_a_match_error() {
    let re = compile("a", CompileOptions::UTF).unwrap();
    let err = re
        .first_match_bytes(b"\xffa", 0, MatchOptions::empty())
        .unwrap_err();
    assert_eq!(err.domain(), ErrorDomain::Match);
    assert!((-23..=-3).contains(&err.code()), "{}", err.code());
    assert!(err.message().starts_with("UTF-8 error"));
    assert_eq!(err.offset(), None);
}

#[test]
fn unchecked_utf_needs_the_unsafe_entry_point() {
    let re = compile("a", CompileOptions::UTF).unwrap();
    let err = re
        .first_match_bytes(b"a", 0, MatchOptions::NO_UTF_CHECK)
        .unwrap_err();
    assert_eq!(err.domain(), ErrorDomain::Options);
    assert_eq!(err.code(), codes::UNCHECKED_UTF);

    // SAFETY: the subject is ASCII.
    let caps = unsafe { re.first_match_bytes_unchecked(b"ba", 0, MatchOptions::NO_UTF_CHECK) }
        .unwrap()
        .unwrap();
    assert_eq!(caps.whole(), 1..2);
}

#[test]
fn match_time_options() {
    let re = pattern("^a");
    assert!(
        re.first_match_bytes(b"a", 0, MatchOptions::NOTBOL)
            .unwrap()
            .is_none()
    );

    let re = pattern("a*");
    let caps = re.first_match("b", 0).unwrap().unwrap();
    assert_eq!(caps.whole(), 0..0);
    assert!(
        re.first_match_bytes(b"b", 0, MatchOptions::NOTEMPTY)
            .unwrap()
            .is_none()
    );

    let re = pattern("b");
    assert!(
        re.first_match_bytes(b"ab", 0, MatchOptions::ANCHORED)
            .unwrap()
            .is_none()
    );
}

#[test]
fn partial_matches_are_flagged() {
    let re = pattern("abc");
    let caps = re
        .first_match_bytes(b"xab", 0, MatchOptions::PARTIAL_HARD)
        .unwrap()
        .unwrap();
    assert!(caps.is_partial());
    assert_eq!(caps.whole(), 1..3);

    let caps = re
        .first_match_bytes(b"xabc", 0, MatchOptions::PARTIAL_SOFT)
        .unwrap()
        .unwrap();
    assert!(!caps.is_partial());
}

#[test]
fn jit_does_not_change_results() {
    let re = pattern("(\\d+)-(\\d+)?");
    for subject in ["12-34", "12-", "-"] {
        assert_eq!(
            re.first_match_bytes(subject.as_bytes(), 0, MatchOptions::empty()),
            re.first_match_bytes(subject.as_bytes(), 0, MatchOptions::NO_JIT),
        );
    }

    // deep enough to exhaust the default JIT stack
    let re = pattern("(a|b)*c");
    let subject = "ab".repeat(50_000) + "c";
    let jit = re.first_match(&subject, 0).unwrap().unwrap();
    assert_eq!(jit.whole(), 0..100_001);
    assert_eq!(
        Ok(Some(jit)),
        re.first_match_bytes(subject.as_bytes(), 0, MatchOptions::NO_JIT)
    );
}

#[test]
fn newline_conventions() {
    let cr = compile("^b", CompileOptions::MULTILINE | CompileOptions::NEWLINE_CR).unwrap();
    assert_eq!(cr.first_match("a\rb", 0).unwrap().unwrap().whole(), 2..3);

    let lf = compile("^b", CompileOptions::MULTILINE | CompileOptions::NEWLINE_LF).unwrap();
    assert_eq!(lf.first_match("a\rb", 0), Ok(None));

    let err = compile("^b", CompileOptions::NEWLINE_CR | CompileOptions::NEWLINE_ANY).unwrap_err();
    assert_eq!(err.domain(), ErrorDomain::Options);
    assert_eq!(err.code(), codes::CONFLICTING_NEWLINE);
}

#[test]
fn javascript_compat_accepts_unicode_escapes() {
    assert!(CompiledPattern::new("\\u0041").is_err());
    let re = compile("\\u0041", CompileOptions::JAVASCRIPT_COMPAT).unwrap();
    assert_eq!(re.first_match("xA", 0).unwrap().unwrap().whole(), 1..2);
}

#[test]
fn shared_across_threads() {
    let re = pattern("(\\w+)@(\\w+)").into_shared();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let re = Arc::clone(&re);
            thread::spawn(move || {
                let subject = format!("{}user{i}@host", " ".repeat(i));
                let caps = re.first_match(&subject, 0).unwrap().unwrap();
                (i, caps.get(1).unwrap(), caps.get(2).unwrap())
            })
        })
        .collect();
    for handle in handles {
        let (i, user, host) = handle.join().unwrap();
        assert_eq!(user, i..i + 5);
        assert_eq!(host, i + 6..i + 10);
    }
}
