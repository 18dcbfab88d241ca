//! # yl-generator
//!
//! Song lyrics from an external text generator, with a structural guarantee.
//!
//! The generator is treated as an unreliable oracle. Output is sanitized and
//! validated by `yl-core`; transport failures are retried with linear backoff,
//! and a structural failure earns exactly one corrective regeneration.
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Request    │ ──> │   Prompt    │ ──> │  Generator  │ <─┐ transport retry
//! │             │     │ Synthesizer │     │   (Gemini)  │ ──┘ (linear backoff)
//! └─────────────┘     └─────────────┘     └──────┬──────┘
//!                            ▲                   │
//!                            │                   ▼
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │ Corrective  │ <── │  Sanitize + │ ──> validated lyrics
//!                     │   suffix    │fail │  Validate   │
//!                     └─────────────┘     └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```bash
//! GEMINI_API_KEY=... cargo run -p yl-generator --bin yl-generate -- --about "night drive" --genre synthwave
//! ```

pub mod client;
pub mod config;
pub mod generator;
pub mod prompt;

pub use client::{GeminiClient, GeminiConfig, GenerationClient, GenerationError};
pub use config::{dotenv_values, load_dotenv, ConfigError, GeneratorConfig};
pub use generator::{
    AttemptOutcome, AttemptRecord, GenerationReport, LyricsError, LyricsGenerator, Sleeper,
    TokioSleeper,
};
pub use prompt::PromptSynthesizer;
