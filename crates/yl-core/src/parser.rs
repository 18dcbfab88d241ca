//! Permissive grouping of sanitized text into tagged sections.
//!
//! The parser only groups lines under the most recent tag. Ordering and line
//! counts are the validator's job; the single rule enforced here is that
//! exactly [`SECTIONS_COUNT`] sections were opened, since every later check
//! addresses sections by position.

use crate::grammar::{SectionTag, SECTIONS_COUNT};

/// A tag and the lines grouped under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub tag: SectionTag,
    /// Lines as they appear in the sanitized text (not trimmed, never blank).
    pub lines: Vec<String>,
}

impl Section {
    fn open(tag: SectionTag) -> Self {
        Self {
            tag,
            lines: Vec::new(),
        }
    }
}

/// Exactly [`SECTIONS_COUNT`] sections, in the order they were found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLyric {
    sections: Vec<Section>,
}

impl ParsedLyric {
    /// Sections in document order.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Section at `index`, if in range.
    #[must_use]
    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    /// Tags in document order.
    #[must_use]
    pub fn tags(&self) -> Vec<SectionTag> {
        self.sections.iter().map(|s| s.tag).collect()
    }

    /// Iterate over every lyric line with its section index.
    pub fn lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.sections
            .iter()
            .enumerate()
            .flat_map(|(index, section)| section.lines.iter().map(move |l| (index, l.as_str())))
    }
}

/// Parse failure: the number of opened sections was wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("section_count_mismatch: expected {expected} sections, found {found}")]
pub struct ParseError {
    pub expected: usize,
    pub found: usize,
}

/// Group sanitized text into sections.
///
/// A line whose trimmed form is exactly one of the five markers opens a new
/// section. Blank lines are skipped; other lines go to the open section, and
/// lines before the first marker are discarded.
pub fn parse_sections(text: &str) -> Result<ParsedLyric, ParseError> {
    let mut sections: Vec<Section> = Vec::with_capacity(SECTIONS_COUNT);

    for raw in text.lines() {
        if raw.trim().is_empty() {
            continue;
        }

        if let Some(tag) = SectionTag::from_marker(raw) {
            sections.push(Section::open(tag));
            continue;
        }

        if let Some(current) = sections.last_mut() {
            current.lines.push(raw.to_string());
        }
    }

    if sections.len() != SECTIONS_COUNT {
        return Err(ParseError {
            expected: SECTIONS_COUNT,
            found: sections.len(),
        });
    }

    debug_assert_eq!(sections.len(), SECTIONS_COUNT);
    Ok(ParsedLyric { sections })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIX_TAGS: &str = "\
preamble the model should not have written
[Intro]
a (u)

b (yeah)
[Chorus]
c (tss)
[Verse]
[Bridge]
d (fa)
[Chorus]
[Outro]
e (e)";

    #[test]
    fn test_groups_under_most_recent_tag() {
        let parsed = parse_sections(SIX_TAGS).unwrap();
        assert_eq!(
            parsed.tags(),
            vec![
                SectionTag::Intro,
                SectionTag::Chorus,
                SectionTag::Verse,
                SectionTag::Bridge,
                SectionTag::Chorus,
                SectionTag::Outro,
            ]
        );
        assert_eq!(parsed.sections()[0].lines, vec!["a (u)", "b (yeah)"]);
        assert!(parsed.sections()[2].lines.is_empty());
        assert_eq!(parsed.lines().count(), 5);
    }

    #[test]
    fn test_lines_before_first_tag_discarded() {
        let parsed = parse_sections(SIX_TAGS).unwrap();
        assert!(parsed
            .lines()
            .all(|(_, line)| !line.contains("preamble")));
    }

    #[test]
    fn test_wrong_section_count() {
        let err = parse_sections("[Intro]\na (u)\n[Outro]\nb (e)").unwrap_err();
        assert_eq!(err, ParseError { expected: 6, found: 2 });

        let seven = format!("{}\n[Outro]\nf (e)", SIX_TAGS);
        assert_eq!(parse_sections(&seven).unwrap_err().found, 7);

        assert_eq!(parse_sections("").unwrap_err().found, 0);
    }

    #[test]
    fn test_embedded_tag_is_not_a_section() {
        let text = SIX_TAGS.replace("c (tss)", "c (tss)\nsing [Chorus] again (yeah)\n  [Outro]x (e)");
        let parsed = parse_sections(&text).unwrap();
        assert_eq!(parsed.sections().len(), 6);
        assert_eq!(
            parsed.sections()[1].lines,
            vec!["c (tss)", "sing [Chorus] again (yeah)", "  [Outro]x (e)"]
        );
    }

    #[test]
    fn test_indented_marker_still_opens_section() {
        let text = SIX_TAGS.replace("[Verse]", "    [Verse]");
        let parsed = parse_sections(&text).unwrap();
        assert_eq!(parsed.sections()[2].tag, SectionTag::Verse);
    }

    #[test]
    fn test_parse_error_message_carries_code() {
        let err = parse_sections("[Intro]").unwrap_err();
        assert!(err.to_string().starts_with("section_count_mismatch"));
    }
}
