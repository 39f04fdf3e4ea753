//! End-to-end tests for a rollchat session.
//!
//! These drive `ChatSession` the way the binary does (scripted input lines,
//! a real or in-memory transcript store, a recording sink) against a mock
//! provider, and check what ends up in the transcript, on disk, and on screen.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rollchat_agent::{ChatSession, CompactionPolicy, CompletionClient, Summarizer};
use rollchat_channels::{BufferSink, ScriptedChannel, SinkEvent};
use rollchat_core::channel::InputChannel;
use rollchat_core::error::ProviderError;
use rollchat_core::message::{Role, Transcript, Turn};
use rollchat_core::provider::{GenerationRequest, GenerationResponse, Provider};
use rollchat_core::store::TranscriptStore;
use rollchat_memory::{InMemoryStore, JsonFileStore};
use tokio::time::Instant;

// ── Mock Provider ────────────────────────────────────────────────────────

type Outcome = Result<GenerationResponse, ProviderError>;

/// Answers summarization and completion requests from separate scripts.
///
/// Summarization requests are the ones sent without a directive. Once a
/// script runs dry its last entry repeats.
struct ScriptedProvider {
    replies: Mutex<Vec<Outcome>>,
    summaries: Mutex<Vec<Outcome>>,
    completion_requests: Mutex<Vec<GenerationRequest>>,
    summary_requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedProvider {
    fn new(replies: Vec<Outcome>, summaries: Vec<Outcome>) -> Self {
        Self {
            replies: Mutex::new(replies),
            summaries: Mutex::new(summaries),
            completion_requests: Mutex::new(Vec::new()),
            summary_requests: Mutex::new(Vec::new()),
        }
    }

    fn replying(text: &str) -> Self {
        Self::new(vec![Ok(text_response(text))], vec![Ok(text_response("summary"))])
    }

    fn completion_requests(&self) -> Vec<GenerationRequest> {
        self.completion_requests.lock().unwrap().clone()
    }

    fn summary_requests(&self) -> Vec<GenerationRequest> {
        self.summary_requests.lock().unwrap().clone()
    }
}

fn next(script: &Mutex<Vec<Outcome>>, calls: usize) -> Outcome {
    let script = script.lock().unwrap();
    let last = script.len().checked_sub(1).expect("empty script");
    script[calls.min(last)].clone()
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn generate(&self, request: GenerationRequest) -> Outcome {
        if request.system_instruction.is_none() {
            let mut seen = self.summary_requests.lock().unwrap();
            seen.push(request);
            next(&self.summaries, seen.len() - 1)
        } else {
            let mut seen = self.completion_requests.lock().unwrap();
            seen.push(request);
            next(&self.replies, seen.len() - 1)
        }
    }
}

fn text_response(text: &str) -> GenerationResponse {
    GenerationResponse {
        text: text.into(),
        model: "mock-model".into(),
        ..Default::default()
    }
}

fn overloaded() -> ProviderError {
    ProviderError::Unavailable {
        status_code: 503,
        message: "UNAVAILABLE".into(),
    }
}

// ── Harness ──────────────────────────────────────────────────────────────

fn session(
    provider: &Arc<ScriptedProvider>,
    store: Arc<dyn TranscriptStore>,
    sink: &Arc<BufferSink>,
    retry_delay: Duration,
) -> ChatSession {
    let completion = CompletionClient::new(provider.clone(), "gemini-2.5-flash", "Be concise.")
        .with_retry(3, retry_delay)
        .with_notices(sink.clone());
    let summarizer = Summarizer::new(provider.clone(), "gemini-2.5-flash");
    ChatSession::new(completion, summarizer, store, sink.clone())
        .with_policy(CompactionPolicy::new(10, 6))
}

fn exchanges(n: usize) -> Transcript {
    let mut t = Transcript::new();
    for i in 0..n {
        t.push(Turn::user(format!("question {i}")));
        t.push(Turn::assistant(format!("answer {i}")));
    }
    t
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn fresh_session_without_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path().join("chat_history.json")));
    let provider = Arc::new(ScriptedProvider::replying("Hello!"));
    let sink = Arc::new(BufferSink::new());

    let mut s = session(&provider, store, &sink, Duration::ZERO);

    assert_eq!(s.restore().await, 0);
    assert!(s.transcript().is_empty());
    assert!(sink.errors().is_empty());
}

#[tokio::test]
async fn eleventh_turn_compacts_to_seven_before_completion() {
    let provider = Arc::new(ScriptedProvider::new(
        vec![Ok(text_response("Sure."))],
        vec![Ok(text_response("User asked five questions."))],
    ));
    let store = InMemoryStore::with_transcript(exchanges(5));
    let sink = Arc::new(BufferSink::new());
    let mut s = session(&provider, Arc::new(store), &sink, Duration::ZERO);
    s.restore().await;
    assert_eq!(s.transcript().len(), 10);

    s.handle_input("question 5").await;

    let summaries = provider.summary_requests();
    assert_eq!(summaries.len(), 1);
    let summarized = summaries[0].contents.split("\n\n").nth(1).unwrap();
    assert_eq!(summarized.lines().count(), 5);
    assert!(summarized.starts_with("User: question 0"));
    assert!(summarized.ends_with("User: question 2"));

    // What the model saw: one summary line plus the six most recent turns.
    let sent = &provider.completion_requests()[0].contents;
    let lines: Vec<&str> = sent.lines().collect();
    assert_eq!(lines.len(), 7);
    assert_eq!(lines[0], "System: Conversation summary: User asked five questions.");
    assert_eq!(lines[1], "Assistant: answer 2");
    assert_eq!(lines[6], "User: question 5");

    assert_eq!(s.transcript().len(), 8);
    assert!(s.transcript().is_well_formed());
}

#[tokio::test(start_paused = true)]
async fn overload_twice_then_success_is_seamless() {
    let provider = Arc::new(ScriptedProvider::new(
        vec![Err(overloaded()), Err(overloaded()), Ok(text_response("Made it."))],
        vec![Ok(text_response("summary"))],
    ));
    let sink = Arc::new(BufferSink::new());
    let mut s = session(
        &provider,
        Arc::new(InMemoryStore::new()),
        &sink,
        Duration::from_secs(2),
    );
    let start = Instant::now();

    s.handle_input("Hi").await;

    assert_eq!(start.elapsed(), Duration::from_secs(4));
    assert_eq!(provider.completion_requests().len(), 3);
    assert_eq!(s.transcript().flatten(), "User: Hi\nAssistant: Made it.");
    assert!(sink.errors().is_empty());
    assert_eq!(
        sink.notices(),
        vec![
            "[Model overloaded — retrying 1/3]".to_string(),
            "[Model overloaded — retrying 2/3]".to_string(),
        ]
    );
}

#[tokio::test]
async fn empty_completion_leaves_transcript_unchanged() {
    let provider = Arc::new(ScriptedProvider::replying(""));
    let store = InMemoryStore::with_transcript(exchanges(1));
    let sink = Arc::new(BufferSink::new());
    let mut s = session(&provider, Arc::new(store), &sink, Duration::ZERO);
    s.restore().await;

    s.handle_input("Anything?").await;

    // The user turn stays; no assistant turn follows it.
    assert_eq!(s.transcript().len(), 3);
    assert_eq!(s.transcript().turns()[2].role(), Role::User);
    assert!(sink.notices().contains(&"[No response generated]".to_string()));
    assert!(sink.replies().is_empty());
}

// ── Properties ───────────────────────────────────────────────────────────

#[tokio::test]
async fn flattened_context_keeps_chronological_order() {
    let provider = Arc::new(ScriptedProvider::new(
        vec![
            Ok(text_response("one")),
            Ok(text_response("two")),
            Ok(text_response("three")),
        ],
        vec![Ok(text_response("summary"))],
    ));
    let sink = Arc::new(BufferSink::new());
    let mut s = session(&provider, Arc::new(InMemoryStore::new()), &sink, Duration::ZERO);

    for line in ["first", "second", "third"] {
        s.handle_input(line).await;
    }

    let last = &provider.completion_requests()[2].contents;
    assert_eq!(
        last,
        "User: first\nAssistant: one\nUser: second\nAssistant: two\nUser: third"
    );
}

#[tokio::test]
async fn summarizes_once_per_triggering_turn_only() {
    let provider = Arc::new(ScriptedProvider::replying("ok"));
    let sink = Arc::new(BufferSink::new());
    let mut s = session(&provider, Arc::new(InMemoryStore::new()), &sink, Duration::ZERO);

    // Five exchanges reach exactly the trigger: no summarization yet.
    for i in 0..5 {
        s.handle_input(&format!("message {i}")).await;
    }
    assert_eq!(s.transcript().len(), 10);
    assert!(provider.summary_requests().is_empty());

    // The sixth user turn makes eleven.
    s.handle_input("message 5").await;
    assert_eq!(provider.summary_requests().len(), 1);
    assert_eq!(s.transcript().len(), 8);

    // Nine after the next user turn, ten after its reply: still under.
    s.handle_input("message 6").await;
    assert_eq!(provider.summary_requests().len(), 1);

    s.handle_input("message 7").await;
    assert_eq!(provider.summary_requests().len(), 2);
    assert!(s.transcript().is_well_formed());
}

#[tokio::test(start_paused = true)]
async fn persistent_overload_gives_up_after_three_attempts() {
    let provider = Arc::new(ScriptedProvider::new(
        vec![Err(overloaded())],
        vec![Ok(text_response("summary"))],
    ));
    let store = InMemoryStore::new();
    let sink = Arc::new(BufferSink::new());
    let mut s = session(
        &provider,
        Arc::new(store.clone()),
        &sink,
        Duration::from_secs(2),
    );
    let start = Instant::now();

    s.handle_input("Hi").await;

    assert_eq!(provider.completion_requests().len(), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(4));
    let errors = sink.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("temporarily overloaded"));
    // The failed turn was saved, user turn included.
    assert_eq!(store.save_count(), 1);
    assert_eq!(store.snapshot().await.map(|t| t.len()), Some(1));
}

#[tokio::test]
async fn non_ascii_conversation_survives_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chat_history.json");
    let provider = Arc::new(ScriptedProvider::replying("Ça va très bien, merci ! 😊"));
    let sink = Arc::new(BufferSink::new());

    let mut s = session(
        &provider,
        Arc::new(JsonFileStore::new(&path)),
        &sink,
        Duration::ZERO,
    );
    let input = ScriptedChannel::new(["Привет! Comment ça va? 你好", "quit"])
        .start()
        .await
        .unwrap();
    s.run(input).await;

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("Привет! Comment ça va? 你好"));
    assert!(raw.contains("Ça va très bien, merci ! 😊"));

    let reloaded = JsonFileStore::new(&path).load().await;
    assert_eq!(&reloaded, s.transcript());
    assert_eq!(reloaded.turns()[0].content(), "Привет! Comment ça va? 你好");
}

// ── Command surface ──────────────────────────────────────────────────────

#[tokio::test]
async fn scripted_run_covers_commands_and_end_of_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chat_history.json");
    let provider = Arc::new(ScriptedProvider::replying("Hello!"));
    let sink = Arc::new(BufferSink::new());
    let mut s = session(
        &provider,
        Arc::new(JsonFileStore::new(&path)),
        &sink,
        Duration::ZERO,
    );

    let input = ScriptedChannel::new(["", "Hi", "SAVE", "clear", "Hi again"])
        .start()
        .await
        .unwrap();
    s.run(input).await;

    assert_eq!(
        sink.notices(),
        vec![
            "Please type something.".to_string(),
            "[Chat saved successfully]".to_string(),
            "[Chat history cleared]".to_string(),
            "[Chat saved successfully]".to_string(),
            "Exiting program...".to_string(),
        ]
    );
    // Only what came after `clear` was saved at the end.
    let saved = JsonFileStore::new(&path).load().await;
    assert_eq!(saved.flatten(), "User: Hi again\nAssistant: Hello!");
    assert_eq!(
        sink.events().iter().filter(|e| **e == SinkEvent::Prompt).count(),
        6
    );
}

#[tokio::test]
async fn restarted_session_continues_saved_conversation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chat_history.json");
    let provider = Arc::new(ScriptedProvider::new(
        vec![Ok(text_response("Nice to meet you, Ada.")), Ok(text_response("Ada."))],
        vec![Ok(text_response("summary"))],
    ));
    let sink = Arc::new(BufferSink::new());

    let mut first = session(&provider, Arc::new(JsonFileStore::new(&path)), &sink, Duration::ZERO);
    first.handle_input("My name is Ada").await;
    first.handle_input("quit").await;

    let mut second = session(&provider, Arc::new(JsonFileStore::new(&path)), &sink, Duration::ZERO);
    assert_eq!(second.restore().await, 2);
    second.handle_input("What is my name?").await;

    let sent = &provider.completion_requests()[1].contents;
    assert!(sent.starts_with("User: My name is Ada\nAssistant: Nice to meet you, Ada."));
    assert_eq!(second.transcript().len(), 4);
}
