//! Integration tests for the question acquisition flow.
//!
//! Each test spins up an Axum server on a random port, either a scripted mock
//! backend or the real generation routes over a stub LLM, and drives
//! `QuestionService` against it over HTTP.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use onboarding_questions::config::GenerationConfig;
use onboarding_questions::error::{Cancelled, LlmError};
use onboarding_questions::generation::{GenerationState, QuestionGenerator, generation_routes};
use onboarding_questions::llm::{CompletionRequest, CompletionResponse, FinishReason, LlmProvider};
use onboarding_questions::questions::bank::default_bank;
use onboarding_questions::questions::{
    FallbackSampler, FixedContext, LoadOptions, QuestionOrigin, QuestionService,
    RegenerateOptions, RemoteQuestionClient, ResultCache,
};
use onboarding_questions::store::{MemoryStore, SettingsStore, settings_keys};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// What the mock backend does with each request.
#[derive(Clone)]
enum Behaviour {
    Generate { source: &'static str },
    Status(u16),
    Garbage,
    Slow(Duration),
}

struct MockBackend {
    behaviour: Behaviour,
    hits: AtomicUsize,
    last_body: std::sync::Mutex<Value>,
}

fn generated(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "id": format!("q{}", i + 1),
                "prompt": format!("Generated scenario number {i}"),
                "a": "Leave exactly on the agreed time",
                "b": "Wait a few minutes for a late rider",
            })
        })
        .collect()
}

async fn mock_questions(
    State(backend): State<Arc<MockBackend>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    *backend.last_body.lock().unwrap() = body.clone();
    let count = body["count"].as_u64().unwrap_or(10) as usize;

    match backend.behaviour.clone() {
        Behaviour::Generate { source } => {
            Json(json!({ "questions": generated(count), "source": source })).into_response()
        }
        Behaviour::Status(code) => (
            StatusCode::from_u16(code).unwrap(),
            Json(json!({ "error": "boom" })),
        )
            .into_response(),
        Behaviour::Garbage => (StatusCode::OK, "<html>not json</html>").into_response(),
        Behaviour::Slow(delay) => {
            tokio::time::sleep(delay).await;
            Json(json!({ "questions": generated(count), "source": "openrouter" })).into_response()
        }
    }
}

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    format!("http://127.0.0.1:{port}/api/onboarding/questions")
}

/// Start a scripted backend, return (endpoint, backend).
async fn start_mock(behaviour: Behaviour) -> (String, Arc<MockBackend>) {
    let backend = Arc::new(MockBackend {
        behaviour,
        hits: AtomicUsize::new(0),
        last_body: std::sync::Mutex::new(Value::Null),
    });
    let app = Router::new()
        .route("/api/onboarding/questions", post(mock_questions))
        .with_state(Arc::clone(&backend));
    (serve(app).await, backend)
}

fn service(endpoint: &str, store: Arc<MemoryStore>) -> QuestionService {
    QuestionService::new(
        Arc::new(RemoteQuestionClient::with_client(
            reqwest::Client::new(),
            endpoint,
        )),
        Arc::new(FallbackSampler::default()),
        ResultCache::new(store),
        Arc::new(FixedContext::default()),
    )
}

async fn cached(store: &MemoryStore) -> Option<Value> {
    store
        .get_setting(settings_keys::DEFAULT_USER, settings_keys::QUESTIONS_CACHE)
        .await
        .unwrap()
}

// ── Batch loading ────────────────────────────────────────────────────

#[tokio::test]
async fn second_load_is_served_from_cache() {
    timeout(TEST_TIMEOUT, async {
        let (endpoint, backend) = start_mock(Behaviour::Generate { source: "openrouter" }).await;
        let store = Arc::new(MemoryStore::new());
        let service = service(&endpoint, Arc::clone(&store));

        let first = service.load_set(LoadOptions::default()).await.unwrap();
        assert_eq!(first.source, QuestionOrigin::Ai);
        assert_eq!(first.questions.len(), 10);
        assert!(first.error.is_none());

        let second = service.load_set(LoadOptions::default()).await.unwrap();
        assert_eq!(second.source, QuestionOrigin::Cache);
        assert_eq!(second.questions, first.questions);
        assert_eq!(backend.hits.load(Ordering::SeqCst), 1);

        let body = backend.last_body.lock().unwrap().clone();
        assert_eq!(body["count"], 10);
        assert_eq!(body["mode"], "batch");
        assert_eq!(body["regenSeed"], 0);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unreachable_backend_serves_ten_unique_fallback_questions() {
    timeout(TEST_TIMEOUT, async {
        let store = Arc::new(MemoryStore::new());
        let service = service("http://127.0.0.1:1/api/onboarding/questions", Arc::clone(&store));

        let batch = service.load_set(LoadOptions::default()).await.unwrap();
        assert_eq!(batch.source, QuestionOrigin::Fallback);
        assert!(batch.error.unwrap().starts_with("Unable to load AI questions"));
        assert_eq!(batch.questions.len(), 10);
        let prompts: HashSet<&str> = batch.questions.iter().map(|q| q.prompt.as_str()).collect();
        assert_eq!(prompts.len(), 10);
        assert!(cached(&store).await.is_none());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn server_error_reports_status() {
    timeout(TEST_TIMEOUT, async {
        let (endpoint, _backend) = start_mock(Behaviour::Status(500)).await;
        let service = service(&endpoint, Arc::new(MemoryStore::new()));

        let batch = service.load_set(LoadOptions::default()).await.unwrap();
        assert_eq!(batch.source, QuestionOrigin::Fallback);
        assert_eq!(batch.error.as_deref(), Some("AI service unavailable (500)"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn malformed_body_falls_back() {
    timeout(TEST_TIMEOUT, async {
        let (endpoint, _backend) = start_mock(Behaviour::Garbage).await;
        let service = service(&endpoint, Arc::new(MemoryStore::new()));

        let batch = service.load_set(LoadOptions::default()).await.unwrap();
        assert_eq!(batch.source, QuestionOrigin::Fallback);
        assert!(batch.error.unwrap().starts_with("AI returned invalid question format"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn backend_fallback_is_shown_but_not_cached() {
    timeout(TEST_TIMEOUT, async {
        let (endpoint, backend) = start_mock(Behaviour::Generate { source: "fallback" }).await;
        let store = Arc::new(MemoryStore::new());
        let service = service(&endpoint, Arc::clone(&store));

        let batch = service.load_set(LoadOptions::default()).await.unwrap();
        assert_eq!(batch.source, QuestionOrigin::Fallback);
        assert_eq!(batch.error.as_deref(), Some("AI generation unavailable"));
        assert_eq!(batch.questions[0].prompt, "Generated scenario number 0");
        assert!(cached(&store).await.is_none());

        service.load_set(LoadOptions::default()).await.unwrap();
        assert_eq!(backend.hits.load(Ordering::SeqCst), 2);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn cancellation_mid_request_skips_cache_write() {
    timeout(TEST_TIMEOUT, async {
        let (endpoint, _backend) = start_mock(Behaviour::Slow(Duration::from_secs(2))).await;
        let store = Arc::new(MemoryStore::new());
        let service = Arc::new(service(&endpoint, Arc::clone(&store)));

        let cancel = CancellationToken::new();
        let task = {
            let service = Arc::clone(&service);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                service
                    .load_set(LoadOptions {
                        cancel,
                        ..Default::default()
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();

        assert_eq!(task.await.unwrap(), Err(Cancelled));
        assert!(cached(&store).await.is_none());
    })
    .await
    .expect("test timed out");
}

// ── Single regeneration ──────────────────────────────────────────────

#[tokio::test]
async fn regenerate_sends_exclusions_in_single_mode() {
    timeout(TEST_TIMEOUT, async {
        let (endpoint, backend) = start_mock(Behaviour::Generate { source: "openrouter" }).await;
        let service = service(&endpoint, Arc::new(MemoryStore::new()));

        let exclude = vec!["During rides, you prefer:".to_string()];
        let result = service
            .regenerate_one(RegenerateOptions {
                exclude_prompts: exclude,
                regen_seed: 5,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(result.ok);
        assert_eq!(result.source, Some(QuestionOrigin::Ai));
        assert_eq!(result.question.unwrap().id, "q1");

        let body = backend.last_body.lock().unwrap().clone();
        assert_eq!(body["mode"], "single");
        assert_eq!(body["count"], 1);
        assert_eq!(body["regenSeed"], 5);
        assert_eq!(body["excludePrompts"][0], "During rides, you prefer:");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn regenerate_offline_avoids_nine_shown_prompts() {
    timeout(TEST_TIMEOUT, async {
        let service = service(
            "http://127.0.0.1:1/api/onboarding/questions",
            Arc::new(MemoryStore::new()),
        );
        let shown: Vec<String> = default_bank()[..9].iter().map(|q| q.prompt.clone()).collect();

        let result = service
            .regenerate_one(RegenerateOptions {
                exclude_prompts: shown.clone(),
                regen_seed: 42,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(result.ok);
        assert_eq!(result.source, Some(QuestionOrigin::Fallback));
        assert_eq!(result.error.as_deref(), Some("AI generation unavailable"));
        assert!(!shown.contains(&result.question.unwrap().prompt));
    })
    .await
    .expect("test timed out");
}

// ── End to end through the generation backend ────────────────────────

/// Stub LLM provider returning a fixed, valid question payload.
struct StubLlm {
    calls: AtomicUsize,
}

#[async_trait]
impl LlmProvider for StubLlm {
    fn model_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let questions: Vec<Value> = (0..20)
            .map(|i| {
                json!({
                    "prompt": format!("Stub carpool dilemma {i}"),
                    "a": "Keep the ride quiet and calm",
                    "b": "Keep the ride friendly and social",
                })
            })
            .collect();
        Ok(CompletionResponse {
            content: format!("```json\n{}\n```", json!({ "questions": questions })),
            input_tokens: 0,
            output_tokens: 0,
            finish_reason: FinishReason::Stop,
            response_id: None,
        })
    }
}

#[tokio::test]
async fn end_to_end_generation_is_cached() {
    timeout(TEST_TIMEOUT, async {
        let llm = Arc::new(StubLlm {
            calls: AtomicUsize::new(0),
        });
        let generator = QuestionGenerator::new(llm.clone(), GenerationConfig::default());
        let endpoint = serve(generation_routes(GenerationState {
            generator: Some(Arc::new(generator)),
            bank: default_bank().into(),
        }))
        .await;

        let store = Arc::new(MemoryStore::new());
        let service = service(&endpoint, Arc::clone(&store));

        let first = service.load_set(LoadOptions::default()).await.unwrap();
        assert_eq!(first.source, QuestionOrigin::Ai);
        assert_eq!(first.questions.len(), 10);
        assert_eq!(first.questions[9].id, "q10");
        assert!(cached(&store).await.is_some());

        let second = service.load_set(LoadOptions::default()).await.unwrap();
        assert_eq!(second.source, QuestionOrigin::Cache);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn end_to_end_without_generator_is_backend_fallback() {
    timeout(TEST_TIMEOUT, async {
        let endpoint = serve(generation_routes(GenerationState {
            generator: None,
            bank: default_bank().into(),
        }))
        .await;
        let store = Arc::new(MemoryStore::new());
        let service = service(&endpoint, Arc::clone(&store));

        let batch = service.load_set(LoadOptions::default()).await.unwrap();
        assert_eq!(batch.source, QuestionOrigin::Fallback);
        assert_eq!(batch.error.as_deref(), Some("AI generation unavailable"));
        assert_eq!(batch.questions.len(), 10);
        assert!(cached(&store).await.is_none());
    })
    .await
    .expect("test timed out");
}
