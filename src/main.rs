use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use quickpr::app::AppState;
use quickpr::ci::types::PatchConfig;
use quickpr::config::AppConfig;
use quickpr::error::{PatchError, Result};
use quickpr::state::{PatchPreset, PresetStore};
use quickpr::workflow::{
    failure_message, ConfigSource, PatchRequest, PullRequestOutcome,
};

#[derive(Parser)]
#[command(
    name = "quickpr",
    about = "Open a pull request for the current branch and schedule Evergreen patches"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Working copy to operate on
    #[arg(short, long, global = true, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a pull request for the current branch, or resume the open one
    Pr {
        /// Print the draft instead of creating it
        #[arg(long)]
        dry_run: bool,
    },
    /// Upload the branch diff as an Evergreen patch and link it from the PR
    Patch {
        #[command(flatten)]
        selection: Selection,

        /// Merge a saved preset into the selection
        #[arg(long, conflicts_with = "last")]
        preset: Option<String>,

        /// Merge the selection used by the previous patch on this branch
        #[arg(long)]
        last: bool,

        /// Configure the patch but do not schedule it
        #[arg(long)]
        no_finalize: bool,
    },
    /// Manage saved patch selections for this repository
    Preset {
        #[command(subcommand)]
        command: PresetCommand,
    },
    /// Validate configuration and credentials
    Check {
        /// Also fetch this issue to confirm Jira access
        #[arg(long)]
        issue: Option<String>,
    },
}

#[derive(Subcommand)]
enum PresetCommand {
    List,
    Show { name: String },
    Save {
        name: String,
        #[command(flatten)]
        selection: Selection,
    },
    Delete { name: String },
}

#[derive(Args)]
struct Selection {
    /// Alias to schedule; repeatable or comma-separated
    #[arg(short, long = "alias")]
    aliases: Vec<String>,

    /// Variant/task selection as JSON: [{"id": "variant", "tasks": ["task"]}]
    #[arg(long)]
    tasks: Option<String>,
}

impl Selection {
    fn parse(&self) -> Result<PatchConfig> {
        PatchConfig::parse(&self.aliases, self.tasks.as_deref())
    }
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Pr { .. } => "pr",
            Command::Patch { .. } => "patch",
            Command::Preset { .. } => "preset",
            Command::Check { .. } => "check",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries command output
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let flow = cli.command.name();

    if let Err(e) = run(cli).await {
        eprintln!("{}", failure_message(flow, &e));
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let app = AppState::new(config)?;
    let dir = cli.dir.as_path();

    match cli.command {
        Command::Pr { dry_run } => run_pr(&app, dir, dry_run).await,
        Command::Patch {
            selection,
            preset,
            last,
            no_finalize,
        } => {
            let source = match (preset, last) {
                (Some(name), _) => ConfigSource::Preset(name),
                (None, true) => ConfigSource::LastUsed,
                (None, false) => ConfigSource::Explicit,
            };
            let request = PatchRequest {
                config: selection.parse()?,
                source,
                finalize: !no_finalize,
            };
            run_patch(&app, dir, request).await
        }
        Command::Preset { command } => run_preset(&app, dir, command).await,
        Command::Check { issue } => {
            let report = app.check(issue.as_deref()).await?;
            println!("GitHub: authenticated as {}", report.login);
            if let Some(issue) = report.issue {
                println!("Jira: fetched {} ({})", issue.key, issue.title);
            }
            println!("Credentials OK");
            Ok(())
        }
    }
}

async fn run_pr(app: &AppState, dir: &Path, dry_run: bool) -> Result<()> {
    match app.pull_request_flow()?.run(dir, dry_run).await? {
        PullRequestOutcome::Created(ctx) => {
            println!(
                "Created pull request #{}: {}",
                ctx.pull_request.number, ctx.pull_request.url
            );
        }
        PullRequestOutcome::Resumed(ctx) => {
            println!(
                "Pull request #{} is already open: {}",
                ctx.pull_request.number, ctx.pull_request.url
            );
        }
        PullRequestOutcome::Drafted { repo, draft } => {
            println!("Would open a pull request on {repo}");
            println!("{} -> {}", draft.head_branch, draft.base_branch);
            println!("Title: {}", draft.title);
            println!();
            println!("{}", draft.body);
        }
    }
    Ok(())
}

async fn run_patch(app: &AppState, dir: &Path, request: PatchRequest) -> Result<()> {
    let patch_flow = app.patch_flow()?;
    let outcome = app.pull_request_flow()?.run(dir, false).await?;
    let Some(ctx) = outcome.into_context() else {
        return Ok(());
    };

    let outcome = patch_flow.run(dir, &ctx, request).await?;
    print!("{}", outcome.diff_stat);
    println!("Patch {}: {}", outcome.patch_id, outcome.patch_url);
    if outcome.finalized {
        println!("Scheduled against {}", outcome.base_commit);
    } else {
        println!("Configured, not scheduled");
    }
    Ok(())
}

async fn run_preset(app: &AppState, dir: &Path, command: PresetCommand) -> Result<()> {
    let repo = app.repo_key(dir).await?;

    match command {
        PresetCommand::List => {
            for preset in app.store.presets(&repo).await? {
                let aliases: Vec<&str> = preset.config.aliases.iter().map(String::as_str).collect();
                println!(
                    "{}\taliases: {}\tvariants: {}",
                    preset.name,
                    aliases.join(","),
                    preset.config.tasks.len()
                );
            }
        }
        PresetCommand::Show { name } => {
            let preset = app
                .store
                .preset(&repo, &name)
                .await?
                .ok_or(PatchError::PresetNotFound)?;
            println!("{}", serde_json::to_string_pretty(&preset.config)?);
        }
        PresetCommand::Save { name, selection } => {
            let config = selection.parse()?;
            app.store
                .save_preset(&repo, PatchPreset { name: name.clone(), config })
                .await?;
            println!("Saved preset {name} for {repo}");
        }
        PresetCommand::Delete { name } => {
            if !app.store.delete_preset(&repo, &name).await? {
                return Err(PatchError::PresetNotFound.into());
            }
            println!("Deleted preset {name}");
        }
    }
    Ok(())
}
