//! One-shot CLI entry point: run a single task against one work-tracker
//! issue, for local testing and cron-style invocation (§0). Replaces the
//! teacher's interactive `dialoguer`/`console` onboarding wizard, which has
//! no counterpart in an agent driven entirely by environment variables and
//! a single issue number.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tarsis::agent::{AgentTask, ReflectionManager};
use tarsis::config::TaskSettings;
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
use tarsis::{TaskOutcome, VERSION};
use tracing::info;

#[derive(Parser)]
#[command(name = "tarsis", version = VERSION, about = "Drive an issue to a pull request")]
struct Cli {
    /// Work-tracker repository owner
    #[arg(long)]
    owner: String,

    /// Work-tracker repository name
    #[arg(long)]
    repo: String,

    /// Issue number to implement
    #[arg(long)]
    issue: u64,

    /// Directory to clone the repository into
    #[arg(long, default_value = "./workspace")]
    workdir: PathBuf,

    /// Branch to open the pull request against
    #[arg(long, default_value = "main")]
    base_branch: String,
}

#[tokio::main]
async fn main() {
    tarsis::logging::init_tracing();
    let cli = Cli::parse();

    let settings = match TaskSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli, settings).await {
        eprintln!("task failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, settings: TaskSettings) -> Result<(), String> {
    let TaskSettings { provider, reflection: reflection_config, retry: _, tracker_token, validation_command, max_trials, max_iterations_per_trial } = settings;

    let tracker = Arc::new(TrackerClient::new("https://api.github.com", tracker_token));
    let issue = tracker.get_issue(&cli.owner, &cli.repo, cli.issue).await.map_err(|e| e.to_string())?;

    let repo_url = format!("https://github.com/{}/{}.git", cli.owner, cli.repo);
    let workspace = Arc::new(
        GitWorkspace::clone(&repo_url, cli.workdir.clone())
            .await
            .map_err(|e| e.to_string())?,
    );

    let llm = build_provider(provider)?;

    let mut registry = ToolRegistry::new();
    registry.register(ReadFileTool::new(workspace.path().to_path_buf()));
    registry.register(WriteFileTool::new(workspace.path().to_path_buf()));
    registry.register(CreateBranchTool::new(workspace.clone()));
    registry.register(GitCommitTool::new(workspace.clone()));
    registry.register(RunValidationTool::new(workspace.path().to_path_buf(), validation_command));
    registry.register(PostCommentTool::new(tracker.clone(), cli.owner.clone(), cli.repo.clone(), cli.issue));
    registry.register(CreatePullRequestTool::new(tracker.clone(), cli.owner.clone(), cli.repo.clone(), cli.base_branch.clone()));

    let mut reflection = ReflectionManager::new(llm.clone(), reflection_config);
    reflection.initialize(&cli.owner, &cli.repo).await.map_err(|e| e.to_string())?;

    let repo_identifier = format!("{}/{}", cli.owner, cli.repo);
    let issue_identifier = format!("#{}", cli.issue);
    let mut task = AgentTask::new(llm, registry, reflection)
        .with_max_iterations(max_iterations_per_trial)
        .with_task_identity(repo_identifier, issue_identifier);
    let issue_body = format!("{}\n\n{}", issue.title, issue.body.unwrap_or_default());
    let outcome = task.execute(&issue_body, max_trials).await;

    match outcome {
        TaskOutcome::Success { summary, trial } => {
            info!("task completed on trial {trial}: {summary}");
            Ok(())
        }
        TaskOutcome::AllTrialsFailed { trials_run } => Err(format!("all {trials_run} trial(s) failed")),
    }
}

fn build_provider(provider: tarsis::config::LlmDialectConfig) -> Result<Arc<dyn LlmProvider>, String> {
    use tarsis::config::ProviderKind;
    match provider.kind {
        ProviderKind::Anthropic => {
            let api_key = provider.api_key.expect("anthropic requires an api key");
            Ok(Arc::new(AnthropicProvider::new(api_key, provider.model_id)))
        }
        ProviderKind::Gemini => {
            let api_key = provider.api_key.expect("gemini requires an api key");
            Ok(Arc::new(GeminiProvider::new(api_key, provider.model_id)))
        }
        ProviderKind::Ollama => Ok(Arc::new(OllamaProvider::new(provider.model_id))),
    }
}
