//! The lyric grammar: section tags, their order, and per-position line counts.
//!
//! The grammar is a static table indexed by position. Resizing or reordering a
//! section is a change to [`GRAMMAR`], never to the parser or validator logic.

use std::fmt;

/// Phrase that must appear somewhere in every generated lyric.
pub const REQUIRED_PHRASE: &str = "special for yeah music buddy";

/// Number of leading lines of the second chorus that must repeat the first.
pub const CHORUS_REPEAT_LINES: usize = 4;

/// Position of the first chorus in [`GRAMMAR`].
pub const FIRST_CHORUS_INDEX: usize = 1;

/// Position of the repeated chorus in [`GRAMMAR`].
pub const SECOND_CHORUS_INDEX: usize = 4;

/// A recognised section label.
///
/// Order is a property of position in [`GRAMMAR`], not of the tag, since
/// `Chorus` occurs twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionTag {
    Intro,
    Chorus,
    Verse,
    Bridge,
    Outro,
}

impl SectionTag {
    /// All five tags, in declaration order.
    pub const ALL: [SectionTag; 5] = [
        SectionTag::Intro,
        SectionTag::Chorus,
        SectionTag::Verse,
        SectionTag::Bridge,
        SectionTag::Outro,
    ];

    /// The literal marker as it appears on its own line, e.g. `[Intro]`.
    #[must_use]
    pub fn marker(self) -> &'static str {
        match self {
            SectionTag::Intro => "[Intro]",
            SectionTag::Chorus => "[Chorus]",
            SectionTag::Verse => "[Verse]",
            SectionTag::Bridge => "[Bridge]",
            SectionTag::Outro => "[Outro]",
        }
    }

    /// Match a line against the five markers.
    ///
    /// The line is trimmed first; anything other than an exact marker
    /// (e.g. `Sing [Chorus] loud (yeah)`) is not a tag.
    #[must_use]
    pub fn from_marker(line: &str) -> Option<SectionTag> {
        let trimmed = line.trim();
        Self::ALL.into_iter().find(|tag| tag.marker() == trimmed)
    }
}

impl fmt::Display for SectionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// One row of the grammar table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionRule {
    /// Tag expected at this position.
    pub tag: SectionTag,
    /// Exact number of non-blank lines required at this position.
    pub lines_count: usize,
}

/// The fixed section sequence with its positional line counts.
pub const GRAMMAR: [SectionRule; 6] = [
    SectionRule { tag: SectionTag::Intro, lines_count: 2 },
    SectionRule { tag: SectionTag::Chorus, lines_count: 4 },
    SectionRule { tag: SectionTag::Verse, lines_count: 8 },
    SectionRule { tag: SectionTag::Bridge, lines_count: 4 },
    SectionRule { tag: SectionTag::Chorus, lines_count: 8 },
    SectionRule { tag: SectionTag::Outro, lines_count: 2 },
];

/// Number of sections every lyric must have.
pub const SECTIONS_COUNT: usize = GRAMMAR.len();

/// Total number of lyric lines across all sections.
#[must_use]
pub fn total_lines_count() -> usize {
    GRAMMAR.iter().map(|rule| rule.lines_count).sum()
}
