//! CLI for generating structurally validated song lyrics.
//!
//! # Usage
//!
//! ```bash
//! # Synthesized prompt
//! cargo run -p yl-generator --bin yl-generate -- --about "night drive" --genre synthwave --language en
//!
//! # Request read from a JSON file, lyrics written to a file
//! cargo run -p yl-generator --bin yl-generate -- --request request.json --output lyrics.txt
//!
//! # Literal prompt, no synthesis
//! cargo run -p yl-generator --bin yl-generate -- --prompt "Write a song about rain"
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use yl_core::GenerationRequest;
use yl_generator::{
    load_dotenv, ConfigError, GeminiClient, GeminiConfig, GeneratorConfig, LyricsGenerator,
};

#[derive(Debug, Parser)]
#[command(
    name = "yl-generate",
    about = "Generate song lyrics that follow the six-section template",
    after_help = "ENVIRONMENT:\n    GEMINI_API_KEY    Required. Gemini API key.\n    GEMINI_MODEL      Optional. Defaults to gemini-2.5-flash.\n    RUST_LOG          Optional. Log filter (logs go to stderr)."
)]
struct Args {
    /// JSON request file; flags below override its fields
    #[arg(short, long)]
    request: Option<PathBuf>,

    /// Genre of the song
    #[arg(short, long)]
    genre: Option<String>,

    /// Theme or story
    #[arg(short, long)]
    about: Option<String>,

    /// Language code (default: ru)
    #[arg(short, long)]
    language: Option<String>,

    /// Extra context for the songwriter
    #[arg(short, long)]
    extra: Option<String>,

    /// Free-form description, used when --about is empty
    #[arg(short, long)]
    description: Option<String>,

    /// Literal prompt sent as-is (skips prompt synthesis)
    #[arg(short, long)]
    prompt: Option<String>,

    /// Model name (overrides GEMINI_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// Transport attempts in the first cycle
    #[arg(short = 'n', long)]
    max_attempts: Option<u32>,

    /// Use the patient retry preset
    #[arg(long)]
    patient: bool,

    /// Write lyrics to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Dotenv file loaded before reading the environment
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log prompts and raw generator output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn build_request(&self) -> Result<GenerationRequest, ConfigError> {
        let mut request = match &self.request {
            Some(path) => read_request(path)?,
            None => GenerationRequest::default(),
        };

        let overrides = [
            (&mut request.genre, &self.genre),
            (&mut request.about, &self.about),
            (&mut request.language, &self.language),
            (&mut request.extra, &self.extra),
            (&mut request.description, &self.description),
            (&mut request.prompt, &self.prompt),
        ];
        for (field, flag) in overrides {
            if flag.is_some() {
                field.clone_from(flag);
            }
        }

        Ok(request)
    }

    fn build_config(&self) -> GeneratorConfig {
        let mut config = if self.patient {
            GeneratorConfig::patient()
        } else {
            GeneratorConfig::default()
        };
        if let Some(max) = self.max_attempts {
            config.policy.initial_attempts_max = max.max(1);
        }
        config
    }
}

fn read_request(path: &Path) -> Result<GenerationRequest, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::RequestFile(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw)
        .map_err(|e| ConfigError::RequestFile(format!("{}: {}", path.display(), e)))
}

fn init_tracing(args: &Args) {
    let fallback_level = if args.quiet {
        "warn"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(fallback_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args);

    if let Err(e) = load_dotenv(&args.env_file) {
        error!(path = %args.env_file.display(), error = %e, "failed to load dotenv file");
        return ExitCode::FAILURE;
    }

    let request = match args.build_request() {
        Ok(request) => request,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let client = match GeminiConfig::from_env().and_then(|mut gemini| {
        if let Some(model) = &args.model {
            gemini.model.clone_from(model);
        }
        GeminiClient::new(gemini)
    }) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error creating client: {}", e);
            eprintln!();
            eprintln!("Make sure GEMINI_API_KEY is set (environment or {}):", args.env_file.display());
            eprintln!("  export GEMINI_API_KEY=...");
            return ExitCode::FAILURE;
        }
    };

    let generator = LyricsGenerator::new(client, args.build_config());

    match generator.generate(&request).await {
        Ok(report) => {
            eprintln!("{}", report.format_summary());

            if let Some(path) = &args.output {
                if let Err(e) = tokio::fs::write(path, &report.lyrics).await {
                    eprintln!("Failed to write output: {}", e);
                    return ExitCode::FAILURE;
                }
                eprintln!("Lyrics written to: {}", path.display());
            } else {
                println!("{}", report.lyrics);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("AI error [{}]: {}", e.code(), e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_flags_override_request_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"genre":"pop","about":"summer","language":"en"}}"#).unwrap();

        let path = file.path().to_string_lossy().to_string();
        let args = Args::parse_from(["yl-generate", "--request", &path, "--genre", "rock"]);
        let request = args.build_request().unwrap();
        assert_eq!(request.genre(), "rock");
        assert_eq!(request.theme(), "summer");
        assert_eq!(request.language(), "en");
    }

    #[test]
    fn test_bad_request_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let path = file.path().to_string_lossy().to_string();
        let args = Args::parse_from(["yl-generate", "--request", &path]);
        assert!(matches!(args.build_request(), Err(ConfigError::RequestFile(_))));
    }

    #[test]
    fn test_attempt_overrides() {
        let args = Args::parse_from(["yl-generate", "-n", "0"]);
        assert_eq!(args.build_config().policy.initial_attempts_max, 1);

        let args = Args::parse_from(["yl-generate", "--patient"]);
        assert_eq!(args.build_config().policy.initial_attempts_max, 5);
    }
}
