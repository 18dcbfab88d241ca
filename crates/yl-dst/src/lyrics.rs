//! Simulated generator output.
//!
//! `well_formed_lyrics` builds text that satisfies every structural rule.
//! `Corruption` breaks exactly one rule in a way the validator must catch,
//! and `add_noise` adds formatting the sanitizer must tolerate.

use yl_core::grammar::{
    SectionTag, CHORUS_REPEAT_LINES, FIRST_CHORUS_INDEX, GRAMMAR, REQUIRED_PHRASE,
    SECOND_CHORUS_INDEX,
};

use crate::random::DeterministicRng;

const WORDS: [&str; 16] = [
    "night", "fire", "road", "light", "heart", "rain", "city", "dream", "gold", "river", "stars",
    "ocean", "smoke", "shadow", "morning", "echo",
];

const ADLIBS: [&str; 7] = ["(u)", "(yeah)", "(tss)", "(fa)", "(e)", "(e-e-e)", "(baby)"];

/// Words per generated lyric line (before the adlib).
const LINE_WORDS_MIN: usize = 3;
const LINE_WORDS_MAX: usize = 9;

fn lyric_line(rng: &mut DeterministicRng) -> String {
    let words_count = rng.in_range(LINE_WORDS_MIN..=LINE_WORDS_MAX);
    let mut line = (0..words_count)
        .map(|_| rng.pick(&WORDS).unwrap_or(WORDS[0]))
        .collect::<Vec<_>>()
        .join(" ");
    line.push(' ');
    line.push_str(rng.pick(&ADLIBS).unwrap_or(ADLIBS[0]));
    line
}

/// Lyrics that pass every structural check.
///
/// The required phrase sits in the first intro line and the second chorus
/// opens with the first chorus's lines.
#[must_use]
pub fn well_formed_lyrics(rng: &mut DeterministicRng) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut first_chorus: Vec<String> = Vec::new();

    for (index, rule) in GRAMMAR.iter().enumerate() {
        out.push(rule.tag.marker().to_string());

        let mut lines: Vec<String> = (0..rule.lines_count).map(|_| lyric_line(rng)).collect();
        if index == 0 {
            if let Some(first) = lines.first_mut() {
                *first = format!("{} (yeah)", REQUIRED_PHRASE);
            }
        }
        if index == SECOND_CHORUS_INDEX {
            for (line, repeated) in lines.iter_mut().zip(&first_chorus) {
                line.clone_from(repeated);
            }
        }
        if index == FIRST_CHORUS_INDEX {
            first_chorus = lines.iter().take(CHORUS_REPEAT_LINES).cloned().collect();
        }

        out.extend(lines);
    }

    out.join("\n")
}

/// Formatting noise the sanitizer removes: CRLF endings, trailing spaces,
/// blank lines and a chatty preamble before the first tag.
#[must_use]
pub fn add_noise(text: &str, rng: &mut DeterministicRng) -> String {
    let mut out = String::new();
    if rng.chance(0.5) {
        out.push_str("  Here are your lyrics:\n\n");
    }

    let newline = if rng.chance(0.5) { "\r\n" } else { "\n" };
    for line in text.lines() {
        out.push_str(line);
        if rng.chance(0.3) {
            out.push_str("   ");
        }
        out.push_str(newline);
        if rng.chance(0.1) {
            out.push_str(newline);
        }
    }

    out.push_str("\n\n");
    out
}

/// A single structural defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corruption {
    /// Remove the required phrase
    DropPhrase,
    /// Remove one section tag line
    DropTag,
    /// Remove one lyric line
    DropLine,
    /// Remove the adlib from one lyric line
    StripAdlib,
    /// Change one repeated line of the second chorus
    AlterChorus,
    /// Cut the text off before its end
    Truncate,
}

impl Corruption {
    pub const ALL: [Corruption; 6] = [
        Corruption::DropPhrase,
        Corruption::DropTag,
        Corruption::DropLine,
        Corruption::StripAdlib,
        Corruption::AlterChorus,
        Corruption::Truncate,
    ];

    /// Pick a corruption uniformly.
    pub fn random(rng: &mut DeterministicRng) -> Corruption {
        rng.pick(&Self::ALL).unwrap_or(Corruption::Truncate)
    }

    /// Apply this corruption to well-formed lyrics.
    #[must_use]
    pub fn apply(self, text: &str, rng: &mut DeterministicRng) -> String {
        let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
        debug_assert!(!lines.is_empty(), "Cannot corrupt empty text");

        let tag_positions: Vec<usize> = positions(&lines, true);
        let lyric_positions: Vec<usize> = positions(&lines, false);

        match self {
            Corruption::DropPhrase => {
                return text.replace(REQUIRED_PHRASE, "something for nobody");
            }
            Corruption::DropTag => {
                if let Some(at) = rng.pick(&tag_positions) {
                    lines.remove(at);
                }
            }
            Corruption::DropLine => {
                if let Some(at) = rng.pick(&lyric_positions) {
                    lines.remove(at);
                }
            }
            Corruption::StripAdlib => {
                if let Some(at) = rng.pick(&lyric_positions) {
                    let line = &lines[at];
                    let stripped = match line.rfind('(') {
                        Some(cut) => line[..cut].trim_end().to_string(),
                        None => line.clone(),
                    };
                    lines[at] = stripped;
                }
            }
            Corruption::AlterChorus => {
                let chorus_start = tag_positions.get(SECOND_CHORUS_INDEX).copied();
                if let Some(start) = chorus_start {
                    let offset = rng.in_range(1..=CHORUS_REPEAT_LINES);
                    if let Some(line) = lines.get_mut(start + offset) {
                        line.insert_str(0, "oh ");
                    }
                }
            }
            Corruption::Truncate => {
                let keep = rng.in_range(1..lines.len().max(2));
                lines.truncate(keep);
            }
        }

        lines.join("\n")
    }
}

fn positions(lines: &[String], tags: bool) -> Vec<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| SectionTag::from_marker(line).is_some() == tags)
        .map(|(index, _)| index)
        .collect()
}
