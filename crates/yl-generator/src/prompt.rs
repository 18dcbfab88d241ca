//! Prompt synthesis from a generation request.
//!
//! The structural rules in the prompt are rendered from the same grammar
//! table the validator enforces, so the two cannot drift apart.

use yl_core::grammar::{
    SectionTag, CHORUS_REPEAT_LINES, FIRST_CHORUS_INDEX, GRAMMAR, REQUIRED_PHRASE,
    SECOND_CHORUS_INDEX,
};
use yl_core::GenerationRequest;

/// Example adlibs shown to the generator.
const ADLIB_EXAMPLES: &str = "(u) (yeah) (tss) (fa) (e) (e-e-e) (baby)";

/// Lines per rhyme block (advisory, not validated).
const RHYME_BLOCK_LINES: usize = 4;

/// Builds the text sent to the generator.
pub struct PromptSynthesizer;

impl PromptSynthesizer {
    /// Prompt for `request`.
    ///
    /// A non-blank override prompt is returned unchanged.
    #[must_use]
    pub fn synthesize(request: &GenerationRequest) -> String {
        if let Some(prompt) = request.prompt_override() {
            return prompt.to_string();
        }

        format!(
            "You are a professional songwriter. Output ONLY lyrics. No explanations. No notes.\n\
             \n\
             Language: {language}.\n\
             Genre: {genre}.\n\
             Theme/Story: {theme}.\n\
             Extra context: {extra}.\n\
             \n\
             ABSOLUTE RULES (must follow or you failed):\n\
             {rules}\n\
             \n\
             Now generate the lyrics with strong, obvious rhymes and clean structure.",
            language = request.language(),
            genre = request.genre(),
            theme = request.theme(),
            extra = request.extra(),
            rules = Self::rules(),
        )
    }

    /// The numbered rule list, rendered from the grammar table.
    #[must_use]
    pub fn rules() -> String {
        let markers = GRAMMAR
            .iter()
            .map(|rule| rule.tag.marker())
            .collect::<Vec<_>>()
            .join("\n");

        let lengths = GRAMMAR
            .iter()
            .enumerate()
            .map(|(index, rule)| Self::length_rule(index, rule.tag, rule.lines_count))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "1) Use ONLY these section tags, exactly and in this order, each on its own line:\n\
             {markers}\n\
             2) Each lyric line MUST end with an adlib in parentheses, exactly like: {ADLIB_EXAMPLES}\n\
             3) RHYME RULE: every block of {RHYME_BLOCK_LINES} lines must rhyme with each other (AAAA). \
             So lines 1-4 rhyme, 5-8 rhyme, etc.\n\
             4) LENGTH RULES:\n\
             {lengths}\n\
             5) The lyrics MUST contain the exact phrase: \"{REQUIRED_PHRASE}\".\n\
             6) No emojis. No profanity. No numbering like Verse 1. No extra sections.\n\
             7) Do not leave any section incomplete. Do not cut off. Make sure the output contains ALL sections."
        )
    }

    fn length_rule(index: usize, tag: SectionTag, lines_count: usize) -> String {
        match (index, tag) {
            (0, SectionTag::Intro) => format!(
                "- {tag} exactly {lines_count} lines. One of these lines MUST contain the exact phrase: \"{REQUIRED_PHRASE}\"."
            ),
            (SECOND_CHORUS_INDEX, SectionTag::Chorus) => format!(
                "- Second {tag} exactly {lines_count} lines total: the first {CHORUS_REPEAT_LINES} lines must be EXACTLY \
                 the same as the first {tag}, and then add {extra} new lines that are a logical and rhyming continuation.",
                extra = lines_count.saturating_sub(CHORUS_REPEAT_LINES),
            ),
            (FIRST_CHORUS_INDEX, SectionTag::Chorus) => {
                format!("- First {tag} exactly {lines_count} lines.")
            }
            (_, SectionTag::Verse) => format!(
                "- {tag} exactly {lines_count} lines and each line must be long (at least 8 words)."
            ),
            (_, SectionTag::Outro) => {
                format!("- {tag} exactly {lines_count} lines that release the song.")
            }
            _ => format!("- {tag} exactly {lines_count} lines."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_returned_unchanged() {
        let request = GenerationRequest::about("ignored").with_prompt("  just this\n");
        assert_eq!(PromptSynthesizer::synthesize(&request), "  just this\n");
    }

    #[test]
    fn test_blank_override_is_ignored() {
        let request = GenerationRequest::about("rain").with_prompt("   ");
        let prompt = PromptSynthesizer::synthesize(&request);
        assert!(prompt.contains("Theme/Story: rain."));
    }

    #[test]
    fn test_fields_interpolated() {
        let request = GenerationRequest::about("neon city")
            .with_genre("synthwave")
            .with_language("en");
        let prompt = PromptSynthesizer::synthesize(&request);
        assert!(prompt.starts_with("You are a professional songwriter."));
        assert!(prompt.contains("Language: en.\n"));
        assert!(prompt.contains("Genre: synthwave.\n"));
        assert!(prompt.contains("Theme/Story: neon city.\n"));
        assert!(prompt.contains("Extra context: .\n"));
    }

    #[test]
    fn test_language_defaults() {
        let prompt = PromptSynthesizer::synthesize(&GenerationRequest::default());
        assert!(prompt.contains("Language: ru.\n"));
    }

    #[test]
    fn test_description_fallback() {
        let request = GenerationRequest {
            description: Some("first love".to_string()),
            ..Default::default()
        };
        let prompt = PromptSynthesizer::synthesize(&request);
        assert!(prompt.contains("Theme/Story: first love."));
    }

    #[test]
    fn test_rules_mirror_grammar() {
        let rules = PromptSynthesizer::rules();

        // Tag order as a contiguous block.
        assert!(rules.contains("[Intro]\n[Chorus]\n[Verse]\n[Bridge]\n[Chorus]\n[Outro]\n"));

        for rule in GRAMMAR {
            let needle = format!("{} exactly {} lines", rule.tag.marker(), rule.lines_count);
            assert!(rules.contains(&needle), "missing length rule: {}", needle);
        }

        assert!(rules.contains(REQUIRED_PHRASE));
        assert!(rules.contains("first 4 lines must be EXACTLY the same"));
        assert!(rules.contains("adlib in parentheses"));
        assert!(rules.contains("Do not leave any section incomplete"));
    }

    #[test]
    fn test_rules_are_not_indented() {
        for line in PromptSynthesizer::rules().lines() {
            assert_eq!(line, line.trim_start(), "indented rule line: {:?}", line);
        }
    }
}
