//! # yl-core
//!
//! Structural contract for generated song lyrics.
//!
//! Generated text is treated as untrusted. It is sanitized, grouped into
//! sections by a permissive parser, then checked by a strict validator
//! against a fixed grammar:
//!
//! | Position | Tag | Lines |
//! |----------|-----|-------|
//! | 0 | `[Intro]` | 2 |
//! | 1 | `[Chorus]` | 4 |
//! | 2 | `[Verse]` | 8 |
//! | 3 | `[Bridge]` | 4 |
//! | 4 | `[Chorus]` | 8 (first 4 repeat position 1) |
//! | 5 | `[Outro]` | 2 |
//!
//! Every line ends with a parenthesised adlib, and the text contains
//! [`REQUIRED_PHRASE`].
//!
//! The [`retry`] module holds the pure state machine that decides when to
//! regenerate. Nothing in this crate touches the network or a clock.
//!
//! ```rust
//! use yl_core::{validate, ValidationOutcome};
//!
//! let outcome = validate("[Intro]\nhello (yeah)");
//! assert!(matches!(outcome, ValidationOutcome::Invalid(_)));
//! ```

pub mod grammar;
pub mod parser;
pub mod request;
pub mod retry;
pub mod sanitize;
pub mod validator;

pub use grammar::{SectionRule, SectionTag, GRAMMAR, REQUIRED_PHRASE, SECTIONS_COUNT};
pub use parser::{parse_sections, ParseError, ParsedLyric, Section};
pub use request::{GenerationRequest, DEFAULT_LANGUAGE};
pub use retry::{
    transition, Event, FailureKind, Phase, RetryPolicy, RetryState, Step, CORRECTIVE_INSTRUCTION,
};
pub use sanitize::sanitize;
pub use validator::{check, validate, ValidationOutcome, Violation};
