use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::WorkerGuard;

use onboarding_questions::config::{EnvFile, GenerationConfig, QuestionsConfig, ServerConfig};
use onboarding_questions::generation::{GenerationState, QuestionGenerator, generation_routes};
use onboarding_questions::llm::create_provider;
use onboarding_questions::questions::bank::default_bank;
use onboarding_questions::questions::{
    FallbackSampler, LoadOptions, QuestionService, RegenerateOptions, RemoteQuestionClient,
    ResultCache, StoredContext,
};
use onboarding_questions::store::LibSqlStore;

const USAGE: &str = "usage: onboarding-questions [serve | load [SEED] | regenerate [PROMPT...]]";

/// Log to stderr, or to a daily-rolling file when a log directory is set.
fn init_tracing(log_dir: Option<&str>) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "onboarding.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

async fn serve(env: &EnvFile, server: &ServerConfig) -> anyhow::Result<()> {
    let generation = GenerationConfig::from_lookup(|key| env.var(key))?;
    let generator = match create_provider(&generation) {
        Ok(llm) => Some(Arc::new(QuestionGenerator::new(llm, generation))),
        Err(e) => {
            tracing::warn!(error = %e, "OPENROUTER_API_KEY not set, serving fallback questions only");
            None
        }
    };

    let app = generation_routes(GenerationState {
        generator,
        bank: default_bank().into(),
    });

    let addr = server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    eprintln!("Backend running on http://{addr}");
    tracing::info!(%addr, "Question backend started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;
    Ok(())
}

async fn question_service(env: &EnvFile, server: &ServerConfig) -> anyhow::Result<QuestionService> {
    let questions = QuestionsConfig::from_lookup(|key| env.var(key))?;
    let store = Arc::new(LibSqlStore::new_local(Path::new(&server.db_path)).await?);

    Ok(QuestionService::new(
        Arc::new(RemoteQuestionClient::new(&questions)?),
        Arc::new(FallbackSampler::default()),
        ResultCache::with_ttl(store.clone(), questions.cache_ttl),
        Arc::new(StoredContext::new(store)),
    )
    .with_default_size(questions.set_size))
}

/// Cancel the token on Ctrl-C.
fn cancel_on_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });
    cancel
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = EnvFile::load(Path::new(".env"))?;
    let server = ServerConfig::from_lookup(|key| env.var(key))?;
    let _guard = init_tracing(server.log_dir.as_deref());

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("serve") => serve(&env, &server).await,
        Some("load") => {
            let service = question_service(&env, &server).await?;
            let regen_seed = match args.get(1) {
                Some(raw) => raw.parse().with_context(|| format!("Invalid seed: {raw}"))?,
                None => 0,
            };
            let options = LoadOptions {
                regen_seed,
                cancel: cancel_on_interrupt(),
                ..service.load_options()
            };
            let batch = service.load_set(options).await?;
            println!("{}", serde_json::to_string_pretty(&batch)?);
            Ok(())
        }
        Some("regenerate") => {
            let service = question_service(&env, &server).await?;
            let options = RegenerateOptions {
                exclude_prompts: args[1..].to_vec(),
                cancel: cancel_on_interrupt(),
                ..Default::default()
            };
            let result = service.regenerate_one(options).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Some(other) => anyhow::bail!("Unknown command: {other}\n{USAGE}"),
    }
}
