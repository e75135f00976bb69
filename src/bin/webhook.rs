//! Webhook front door (§6): receives work-tracker comment events, and on a
//! "/implement" trigger comment, dispatches a fresh task asynchronously.
//!
//! Supersedes the teacher's `bin/webhook_gateway.rs`, which only served a
//! bare `/health` → "OK" with no payload parsing at all.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tarsis::agent::{AgentTask, ReflectionManager};
use tarsis::config::{LlmDialectConfig, ProviderKind, TaskSettings};
use tarsis::errors::{categorize_error, format_error_for_tracker};
use tarsis::git::GitWorkspace;
use tarsis::github::TrackerClient;
use tarsis::llm::anthropic::AnthropicProvider;
use tarsis::llm::gemini::GeminiProvider;
use tarsis::llm::ollama::OllamaProvider;
use tarsis::llm::LlmProvider;
use tarsis::tools::file::{ReadFileTool, WriteFileTool};
use tarsis::tools::git::{CreateBranchTool, GitCommitTool};
use tarsis::tools::github::{CreatePullRequestTool, PostCommentTool};
use tarsis::tools::task::RunValidationTool;
use tarsis::tools::ToolRegistry;
use tarsis::webhook::{parse_trigger, DispatchRequest, WebhookPayload};
use tarsis::TaskOutcome;
use tracing::{error, info, warn};

#[derive(Clone)]
struct AppState {
    settings: Arc<TaskSettings>,
}

#[tokio::main]
async fn main() {
    tarsis::logging::init_tracing();

    let settings = match TaskSettings::from_env() {
        Ok(settings) => Arc::new(settings),
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let state = AppState { settings };
    let app = Router::new()
        .route("/health", get(health))
        .route("/webhook", post(handle_webhook))
        .with_state(state);

    let port: u16 = std::env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("webhook front door listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await.expect("failed to bind webhook port");
    axum::serve(listener, app).await.expect("webhook server crashed");
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "tarsis-webhook",
        "architecture": "agentic-loop-with-reflexion",
    }))
}

async fn handle_webhook(State(state): State<AppState>, Json(payload): Json<WebhookPayload>) -> Json<Value> {
    match parse_trigger(&payload) {
        Some(request) => {
            info!("dispatching task for {}/{}#{}", request.owner, request.repo, request.issue_number);
            let settings = state.settings.clone();
            tokio::spawn(async move {
                if let Err(e) = run_task(settings, request).await {
                    error!("task failed: {e}");
                }
            });
            Json(json!({ "dispatched": true }))
        }
        None => {
            warn!("ignoring webhook event that is not a trigger comment");
            Json(json!({ "dispatched": false }))
        }
    }
}

/// Mirrors `bin/cli.rs`'s one-shot wiring (clone, tool registry, reflection
/// manager, task), then runs it to completion. On failure, posts a single
/// formatted comment to the issue summarizing it (§7's propagation policy:
/// any uncaught error marks the task failed and surfaces exactly one
/// tracker comment, never a comment per retry).
async fn run_task(settings: Arc<TaskSettings>, request: DispatchRequest) -> Result<(), String> {
    let tracker = Arc::new(TrackerClient::new("https://api.github.com", settings.tracker_token.clone()));

    let result = run_task_inner(&settings, &tracker, &request).await;

    if let Err(e) = &result {
        let comment = format_error_for_tracker(&e.to_string(), None, None);
        if let Err(post_err) = tracker.post_comment(&request.owner, &request.repo, request.issue_number, &comment).await {
            error!("failed to post failure comment for {}/{}#{}: {post_err}", request.owner, request.repo, request.issue_number);
        }
        let category = categorize_error(&e.to_string(), None);
        warn!("task for {}/{}#{} failed ({category:?}): {e}", request.owner, request.repo, request.issue_number);
    }

    result
}

async fn run_task_inner(settings: &TaskSettings, tracker: &Arc<TrackerClient>, request: &DispatchRequest) -> Result<(), String> {
    let issue = tracker
        .get_issue(&request.owner, &request.repo, request.issue_number)
        .await
        .map_err(|e| e.to_string())?;

    let repo_url = format!("https://github.com/{}/{}.git", request.owner, request.repo);
    let workdir = PathBuf::from("./workspace").join(format!("{}_{}_{}", request.owner, request.repo, request.issue_number));
    let workspace = Arc::new(GitWorkspace::clone(&repo_url, workdir).await.map_err(|e| e.to_string())?);

    let llm = build_provider(LlmDialectConfig::from_env()?)?;

    let mut registry = ToolRegistry::new();
    registry.register(ReadFileTool::new(workspace.path().to_path_buf()));
    registry.register(WriteFileTool::new(workspace.path().to_path_buf()));
    registry.register(CreateBranchTool::new(workspace.clone()));
    registry.register(GitCommitTool::new(workspace.clone()));
    registry.register(RunValidationTool::new(workspace.path().to_path_buf(), settings.validation_command.clone()));
    registry.register(PostCommentTool::new(tracker.clone(), request.owner.clone(), request.repo.clone(), request.issue_number));
    registry.register(CreatePullRequestTool::new(tracker.clone(), request.owner.clone(), request.repo.clone(), "main"));

    let mut reflection = ReflectionManager::new(llm.clone(), settings.reflection.clone());
    reflection.initialize(&request.owner, &request.repo).await.map_err(|e| e.to_string())?;

    let repo_identifier = format!("{}/{}", request.owner, request.repo);
    let issue_identifier = format!("#{}", request.issue_number);
    let mut task = AgentTask::new(llm, registry, reflection)
        .with_max_iterations(settings.max_iterations_per_trial)
        .with_task_identity(repo_identifier, issue_identifier);
    let issue_body = format!("{}\n\n{}", issue.title, issue.body.unwrap_or_default());
    let outcome = task.execute(&issue_body, settings.max_trials).await;

    match outcome {
        TaskOutcome::Success { summary, trial } => {
            info!("task for {}/{}#{} completed on trial {trial}: {summary}", request.owner, request.repo, request.issue_number);
            Ok(())
        }
        TaskOutcome::AllTrialsFailed { trials_run } => Err(format!("all {trials_run} trial(s) failed")),
    }
}

fn build_provider(provider: LlmDialectConfig) -> Result<Arc<dyn LlmProvider>, String> {
    match provider.kind {
        ProviderKind::Anthropic => {
            let api_key = provider.api_key.ok_or_else(|| "anthropic requires an api key".to_string())?;
            Ok(Arc::new(AnthropicProvider::new(api_key, provider.model_id)))
        }
        ProviderKind::Gemini => {
            let api_key = provider.api_key.ok_or_else(|| "gemini requires an api key".to_string())?;
            Ok(Arc::new(GeminiProvider::new(api_key, provider.model_id)))
        }
        ProviderKind::Ollama => Ok(Arc::new(OllamaProvider::new(provider.model_id))),
    }
}
