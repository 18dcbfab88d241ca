//! End-to-end retry scenarios against scripted generators.
//!
//! No network and no real sleeping: the generator replays a fixed script and
//! the sleeper records the delays it was asked to wait.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use yl_core::{validate, GenerationRequest, Violation, CORRECTIVE_INSTRUCTION};
use yl_dst::{well_formed_lyrics, Corruption, DeterministicRng};
use yl_generator::{
    AttemptOutcome, GenerationClient, GenerationError, GeneratorConfig, LyricsError,
    LyricsGenerator, Sleeper,
};

/// Replays scripted responses and records every prompt it receives.
#[derive(Default)]
struct ScriptedClient {
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    fn new(script: Vec<Result<String, GenerationError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Transport("script exhausted".to_string())))
    }
}

/// Records requested delays without waiting.
#[derive(Clone, Default)]
struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

fn lyrics(seed: u64) -> String {
    well_formed_lyrics(&mut DeterministicRng::new(seed))
}

fn without_phrase(seed: u64) -> String {
    let mut rng = DeterministicRng::new(seed);
    let text = well_formed_lyrics(&mut rng);
    Corruption::DropPhrase.apply(&text, &mut rng)
}

fn timeout() -> GenerationError {
    GenerationError::Transport("timeout after 45s".to_string())
}

fn generator(
    client: &Arc<ScriptedClient>,
) -> (LyricsGenerator<Arc<ScriptedClient>, RecordingSleeper>, RecordingSleeper) {
    let sleeper = RecordingSleeper::default();
    let generator =
        LyricsGenerator::with_sleeper(Arc::clone(client), sleeper.clone(), GeneratorConfig::default());
    (generator, sleeper)
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

#[tokio::test]
async fn test_valid_on_first_attempt() {
    let text = lyrics(1);
    let client = ScriptedClient::new(vec![Ok(text.clone())]);
    let (generator, sleeper) = generator(&client);

    let report = generator.generate_from_prompt("write a song".to_string()).await.unwrap();

    assert_eq!(report.lyrics, text);
    assert_eq!(report.corrections_used, 0);
    assert_eq!(report.transport_attempts, 1);
    assert_eq!(report.attempt_history.len(), 1);
    assert_eq!(report.attempt_history[0].outcome, AttemptOutcome::Valid);
    assert!(sleeper.delays().is_empty());
    assert_eq!(client.prompts(), vec!["write a song".to_string()]);
}

#[tokio::test]
async fn test_missing_phrase_then_corrected() {
    let fixed = lyrics(2);
    let client = ScriptedClient::new(vec![Ok(without_phrase(2)), Ok(fixed.clone())]);
    let (generator, sleeper) = generator(&client);

    let report = generator.generate_from_prompt("write a song".to_string()).await.unwrap();

    assert_eq!(report.lyrics, fixed);
    assert_eq!(report.corrections_used, 1);
    assert_eq!(report.transport_attempts, 2);
    assert_eq!(
        report.attempt_history[0].outcome,
        AttemptOutcome::Invalid(Violation::MissingPhrase)
    );
    assert_eq!(report.attempt_history[1].cycle, 1);
    // The first attempt of each cycle never waits.
    assert!(sleeper.delays().is_empty());

    let prompts = client.prompts();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0], "write a song");
    assert_eq!(prompts[1], format!("write a song{}", CORRECTIVE_INSTRUCTION));
}

#[tokio::test]
async fn test_transport_exhaustion_is_unavailable() {
    let client = ScriptedClient::new(vec![Err(timeout()), Err(timeout()), Err(timeout())]);
    let (generator, sleeper) = generator(&client);

    let err = generator
        .generate_from_prompt("write a song".to_string())
        .await
        .unwrap_err();

    assert_eq!(err.code(), "generation_unavailable");
    assert_eq!(
        err,
        LyricsError::GenerationUnavailable {
            attempts: 3,
            corrections_used: 0,
            last_error: timeout(),
        }
    );
    assert_eq!(sleeper.delays(), vec![ms(600), ms(900)]);
    // No correction was attempted, so the prompt never changed.
    assert!(client.prompts().iter().all(|p| p == "write a song"));
}

#[tokio::test]
async fn test_invalid_twice_is_invalid_structure() {
    let client = ScriptedClient::new(vec![Ok(without_phrase(3)), Ok(without_phrase(4))]);
    let (generator, _) = generator(&client);

    let err = generator
        .generate_from_prompt("write a song".to_string())
        .await
        .unwrap_err();

    assert_eq!(err.code(), "invalid_structure");
    assert_eq!(
        err,
        LyricsError::InvalidStructure {
            corrections_used: 1,
            violation: Violation::MissingPhrase,
        }
    );
    assert_eq!(client.prompts().len(), 2);
}

#[tokio::test]
async fn test_only_one_correction_for_any_violation() {
    let mut rng = DeterministicRng::new(5);
    let base = well_formed_lyrics(&mut rng);

    for corruption in Corruption::ALL {
        let first = corruption.apply(&base, &mut rng);
        let second = corruption.apply(&base, &mut rng);
        let client = ScriptedClient::new(vec![Ok(first), Ok(second), Ok(base.clone())]);
        let (generator, _) = generator(&client);

        let err = generator
            .generate_from_prompt("write a song".to_string())
            .await
            .unwrap_err();

        assert_eq!(err.code(), "invalid_structure", "{:?}", corruption);
        assert_eq!(client.prompts().len(), 2, "{:?}", corruption);
    }
}

#[tokio::test]
async fn test_transport_failure_then_success() {
    let text = lyrics(6);
    let client = ScriptedClient::new(vec![
        Err(GenerationError::Service {
            status: 503,
            body: "overloaded".to_string(),
        }),
        Err(GenerationError::EmptyResponse),
        Ok(format!("Sure! Here you go:\r\n\r\n{}\r\n", text)),
    ]);
    let (generator, sleeper) = generator(&client);

    let report = generator.generate_from_prompt("write a song".to_string()).await.unwrap();

    assert_eq!(report.transport_attempts, 3);
    assert_eq!(report.corrections_used, 0);
    assert!(validate(&report.lyrics).is_valid());
    assert!(!report.lyrics.contains('\r'));
    assert_eq!(sleeper.delays(), vec![ms(600), ms(900)]);
    assert!(matches!(
        report.attempt_history[0].outcome,
        AttemptOutcome::Transport(GenerationError::Service { status: 503, .. })
    ));
    assert!(report.format_summary().contains("Corrections used: 0"));
}

#[tokio::test]
async fn test_corrective_cycle_transport_exhaustion() {
    let client = ScriptedClient::new(vec![
        Ok(without_phrase(7)),
        Err(timeout()),
        Err(GenerationError::EmptyResponse),
    ]);
    let (generator, sleeper) = generator(&client);

    let err = generator
        .generate_from_prompt("write a song".to_string())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        LyricsError::GenerationUnavailable {
            attempts: 3,
            corrections_used: 1,
            last_error: GenerationError::EmptyResponse,
        }
    );
    // The corrective cycle has its own, smaller budget.
    assert_eq!(sleeper.delays(), vec![ms(600)]);
}

#[tokio::test]
async fn test_request_prompt_override_is_sent_verbatim() {
    let client = ScriptedClient::new(vec![Ok(lyrics(8))]);
    let (generator, _) = generator(&client);

    let request = GenerationRequest::about("ignored").with_prompt("my own prompt");
    generator.generate(&request).await.unwrap();

    assert_eq!(client.prompts(), vec!["my own prompt".to_string()]);
}

#[tokio::test]
async fn test_synthesized_prompt_carries_request() {
    let client = ScriptedClient::new(vec![Ok(lyrics(9))]);
    let (generator, _) = generator(&client);

    let request = GenerationRequest::about("night drive").with_genre("synthwave");
    generator.generate(&request).await.unwrap();

    let prompt = &client.prompts()[0];
    assert!(prompt.contains("Genre: synthwave."));
    assert!(prompt.contains("Theme/Story: night drive."));
    assert!(prompt.contains("Language: ru."));
}

#[tokio::test]
async fn test_zero_attempt_budget_makes_no_calls() {
    let client = ScriptedClient::new(vec![Ok(lyrics(10))]);
    let sleeper = RecordingSleeper::default();
    let mut config = GeneratorConfig::default();
    config.policy.initial_attempts_max = 0;
    let generator = LyricsGenerator::with_sleeper(Arc::clone(&client), sleeper.clone(), config);

    let err = generator
        .generate_from_prompt("write a song".to_string())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LyricsError::GenerationUnavailable {
            attempts: 0,
            corrections_used: 0,
            ..
        }
    ));
    assert!(client.prompts().is_empty());
    assert!(sleeper.delays().is_empty());
}

/// Fails the first call for prompts containing "flaky", per prompt.
#[derive(Default)]
struct PerPromptClient {
    calls: Mutex<HashMap<String, u32>>,
}

#[async_trait]
impl GenerationClient for PerPromptClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(prompt.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        tokio::task::yield_now().await;

        if prompt.contains("flaky") && call == 1 {
            return Err(timeout());
        }
        Ok(lyrics(u64::from(call) + prompt.len() as u64))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_are_independent() {
    let sleeper = RecordingSleeper::default();
    let generator = Arc::new(LyricsGenerator::with_sleeper(
        PerPromptClient::default(),
        sleeper.clone(),
        GeneratorConfig::default(),
    ));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let generator = Arc::clone(&generator);
            let prompt = if i % 2 == 0 {
                format!("steady song {}", i)
            } else {
                format!("flaky song {}", i)
            };
            tokio::spawn(async move { (i, generator.generate_from_prompt(prompt).await) })
        })
        .collect();

    for handle in handles {
        let (i, result) = handle.await.unwrap();
        let report = result.unwrap();
        let expected_attempts = if i % 2 == 0 { 1 } else { 2 };
        assert_eq!(report.transport_attempts, expected_attempts, "request {}", i);
        assert_eq!(report.corrections_used, 0);
    }

    // One 600ms backoff per flaky request.
    assert_eq!(sleeper.delays(), vec![ms(600); 8]);
}
