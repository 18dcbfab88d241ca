//! Caller-supplied generation request.

use serde::{Deserialize, Serialize};

/// Locale used when the request names none.
pub const DEFAULT_LANGUAGE: &str = "ru";

/// What the caller wants a song about.
///
/// Every field is optional; an empty or whitespace-only value is treated as
/// absent. If `prompt` is present it is sent to the generator verbatim and
/// the caller takes responsibility for structural compliance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationRequest {
    pub genre: Option<String>,
    /// Theme or story of the song.
    pub about: Option<String>,
    pub language: Option<String>,
    /// Extra context passed through to the prompt.
    pub extra: Option<String>,
    /// Literal prompt override; skips prompt synthesis.
    pub prompt: Option<String>,
    /// Free-form description, used as the theme when `about` is empty.
    pub description: Option<String>,
}

impl GenerationRequest {
    /// Request with only a theme set.
    #[must_use]
    pub fn about(theme: impl Into<String>) -> Self {
        Self {
            about: Some(theme.into()),
            ..Default::default()
        }
    }

    /// Set the genre.
    #[must_use]
    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    /// Set the language.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the literal prompt override.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Trimmed genre, or empty.
    #[must_use]
    pub fn genre(&self) -> &str {
        trimmed(&self.genre).unwrap_or("")
    }

    /// Trimmed language, or [`DEFAULT_LANGUAGE`].
    #[must_use]
    pub fn language(&self) -> &str {
        trimmed(&self.language).unwrap_or(DEFAULT_LANGUAGE)
    }

    /// Trimmed theme, falling back to the description, else empty.
    #[must_use]
    pub fn theme(&self) -> &str {
        trimmed(&self.about)
            .or_else(|| trimmed(&self.description))
            .unwrap_or("")
    }

    /// Trimmed extra context, or empty.
    #[must_use]
    pub fn extra(&self) -> &str {
        trimmed(&self.extra).unwrap_or("")
    }

    /// The override prompt, unchanged, if it has any non-whitespace content.
    #[must_use]
    pub fn prompt_override(&self) -> Option<&str> {
        self.prompt
            .as_deref()
            .filter(|prompt| !prompt.trim().is_empty())
    }
}

fn trimmed(field: &Option<String>) -> Option<&str> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
