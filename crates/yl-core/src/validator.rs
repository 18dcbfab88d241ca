//! Strict structural validation of generated lyrics.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! | Order | Check | Reason code |
//! |-------|-------|-------------|
//! | 1 | markers appear in grammar order | `tag_order_violation` |
//! | 2 | required phrase present | `missing_required_phrase` |
//! | 3 | parser opened exactly six sections | `section_count_mismatch` |
//! | 3 | section headings follow grammar order | `tag_order_violation` |
//! | 4 | positional line counts | `line_count_mismatch` |
//! | 5 | every line ends with a parenthesised adlib | `line_format_violation` |
//! | 6 | second chorus repeats the first | `chorus_mismatch` |
//!
//! Rhyme is not verified. The adlib suffix rule is the only per-line check.

use crate::grammar::{
    SectionTag, CHORUS_REPEAT_LINES, FIRST_CHORUS_INDEX, GRAMMAR, REQUIRED_PHRASE,
    SECOND_CHORUS_INDEX,
};
use crate::parser::{parse_sections, ParseError, ParsedLyric};
use crate::sanitize::sanitize;

/// A structural rule the lyric broke.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("tag_order_violation: {expected} (position {position}) not found in order")]
    TagOrder {
        /// Grammar position whose marker was missing.
        position: usize,
        expected: SectionTag,
    },

    #[error("missing_required_phrase: {:?} not found", REQUIRED_PHRASE)]
    MissingPhrase,

    #[error("section_count_mismatch: expected {expected} sections, found {found}")]
    SectionCount { expected: usize, found: usize },

    #[error("line_count_mismatch: section {section} {tag} has {found} lines, expected {expected}")]
    LineCount {
        section: usize,
        tag: SectionTag,
        expected: usize,
        found: usize,
    },

    #[error("line_format_violation: section {section}: {line:?}")]
    LineFormat { section: usize, line: String },

    #[error("chorus_mismatch: repeated chorus line {line} differs")]
    ChorusMismatch {
        /// Zero-based line index within the chorus.
        line: usize,
    },
}

impl Violation {
    /// Stable reason code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Violation::TagOrder { .. } => "tag_order_violation",
            Violation::MissingPhrase => "missing_required_phrase",
            Violation::SectionCount { .. } => "section_count_mismatch",
            Violation::LineCount { .. } => "line_count_mismatch",
            Violation::LineFormat { .. } => "line_format_violation",
            Violation::ChorusMismatch { .. } => "chorus_mismatch",
        }
    }
}

impl From<ParseError> for Violation {
    fn from(err: ParseError) -> Self {
        Violation::SectionCount {
            expected: err.expected,
            found: err.found,
        }
    }
}

/// Result of validating one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Sanitized text that passed every check.
    Valid(String),
    Invalid(Violation),
}

impl ValidationOutcome {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }
}

/// What the checks look at: the sanitized text and the parser's verdict on it.
struct Candidate<'a> {
    text: &'a str,
    parsed: &'a Result<ParsedLyric, ParseError>,
}

type Check = fn(&Candidate<'_>) -> Result<(), Violation>;

/// The checks, in the order they run.
const CHECKS: [Check; 6] = [
    check_tag_order,
    check_phrase,
    check_section_count,
    check_line_counts,
    check_line_format,
    check_chorus_repeat,
];

/// Run every check against sanitized text and its parse result.
///
/// Returns the first violation found.
pub fn check(text: &str, parsed: &Result<ParsedLyric, ParseError>) -> Result<(), Violation> {
    let candidate = Candidate { text, parsed };
    for rule in CHECKS {
        rule(&candidate)?;
    }
    Ok(())
}

/// Sanitize, parse, and check raw generator output.
#[must_use]
pub fn validate(raw: &str) -> ValidationOutcome {
    let text = sanitize(raw);
    let parsed = parse_sections(&text);
    match check(&text, &parsed) {
        Ok(()) => ValidationOutcome::Valid(text),
        Err(violation) => ValidationOutcome::Invalid(violation),
    }
}

fn check_tag_order(candidate: &Candidate<'_>) -> Result<(), Violation> {
    let mut cursor = 0;
    for (position, rule) in GRAMMAR.iter().enumerate() {
        let marker = rule.tag.marker();
        match candidate.text[cursor..].find(marker) {
            Some(offset) => cursor += offset + marker.len(),
            None => {
                return Err(Violation::TagOrder {
                    position,
                    expected: rule.tag,
                })
            }
        }
    }
    Ok(())
}

fn check_phrase(candidate: &Candidate<'_>) -> Result<(), Violation> {
    if candidate.text.contains(REQUIRED_PHRASE) {
        Ok(())
    } else {
        Err(Violation::MissingPhrase)
    }
}

fn check_section_count(candidate: &Candidate<'_>) -> Result<(), Violation> {
    let lyric = parsed(candidate)?;
    // Markers found by check 1 may sit inside lines; the headings must match too.
    for (position, (section, rule)) in lyric.sections().iter().zip(GRAMMAR.iter()).enumerate() {
        if section.tag != rule.tag {
            return Err(Violation::TagOrder {
                position,
                expected: rule.tag,
            });
        }
    }
    Ok(())
}

fn parsed<'a>(candidate: &Candidate<'a>) -> Result<&'a ParsedLyric, Violation> {
    let parsed: &'a Result<ParsedLyric, ParseError> = candidate.parsed;
    parsed.as_ref().map_err(|err| Violation::from(*err))
}

fn check_line_counts(candidate: &Candidate<'_>) -> Result<(), Violation> {
    let lyric = parsed(candidate)?;
    for (index, (section, rule)) in lyric.sections().iter().zip(GRAMMAR.iter()).enumerate() {
        if section.lines.len() != rule.lines_count {
            return Err(Violation::LineCount {
                section: index,
                tag: section.tag,
                expected: rule.lines_count,
                found: section.lines.len(),
            });
        }
    }
    Ok(())
}

fn check_line_format(candidate: &Candidate<'_>) -> Result<(), Violation> {
    let lyric = parsed(candidate)?;
    match lyric.lines().find(|(_, line)| !has_adlib_suffix(line)) {
        Some((section, line)) => Err(Violation::LineFormat {
            section,
            line: line.to_string(),
        }),
        None => Ok(()),
    }
}

fn check_chorus_repeat(candidate: &Candidate<'_>) -> Result<(), Violation> {
    let lyric = parsed(candidate)?;
    let (Some(first), Some(second)) = (
        lyric.section(FIRST_CHORUS_INDEX),
        lyric.section(SECOND_CHORUS_INDEX),
    ) else {
        return Err(Violation::SectionCount {
            expected: GRAMMAR.len(),
            found: lyric.sections().len(),
        });
    };

    for line in 0..CHORUS_REPEAT_LINES {
        let original = first.lines.get(line).map(|l| l.trim());
        let repeated = second.lines.get(line).map(|l| l.trim());
        if original.is_none() || original != repeated {
            return Err(Violation::ChorusMismatch { line });
        }
    }
    Ok(())
}

/// A non-empty line ending in `)` with a `(` before it.
fn has_adlib_suffix(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || !trimmed.ends_with(')') {
        return false;
    }
    match (trimmed.rfind('('), trimmed.rfind(')')) {
        (Some(open), Some(close)) => open < close,
        _ => false,
    }
}
