// Turnstile CLI - Command Line Interface Entry Point

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use turnstile_config::{Config, ConfigLoader, parse_cli_overrides};
use turnstile_core::tools::handlers::todos::render_todos;
use turnstile_core::{ModelClient, Orchestrator, TurnError, build_default_tools, event_channel};
use turnstile_protocol::{ApprovalDecision, ApprovalRequest, ApprovalResponse, EventMsg};

/// Turnstile - agentic task runner with approvals and checkpoints
#[derive(Parser, Debug)]
#[command(name = "turnstile")]
#[command(version, about, long_about = None)]
struct TopCli {
  #[clap(flatten)]
  config_overrides: CliConfigOverrides,

  /// Working directory
  #[arg(short = 'd', long = "dir")]
  dir: Option<PathBuf>,

  /// Session to use
  #[arg(short = 's', long = "session", default_value = "main")]
  session: String,

  #[clap(subcommand)]
  command: Option<Commands>,
}

/// CLI configuration overrides
#[derive(Debug, clap::Args)]
struct CliConfigOverrides {
  /// Configuration override in key=value format
  #[arg(short = 'c', long = "config", value_name = "KEY=VALUE")]
  overrides: Vec<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
  /// Execute a single task and exit
  Run {
    /// Task description
    task: String,
  },

  /// Interactive session (default)
  Chat,
}

type StdinLines = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let cli = TopCli::parse();

  if let Some(dir) = &cli.dir {
    std::env::set_current_dir(dir)
      .with_context(|| format!("cannot enter directory {}", dir.display()))?;
  }
  let cwd = std::env::current_dir().context("cannot determine working directory")?;

  let overrides = parse_cli_overrides(&cli.config_overrides.overrides)?;
  let config = ConfigLoader::new()
    .with_project_dir(cwd.clone())
    .load_with_cli_overrides(overrides)
    .context("failed to load configuration")?;
  info!(provider = %config.models.provider, model = %config.models.model, "turnstile starting");

  let orchestrator = build_orchestrator(&config, cwd)?;
  let mut lines = BufReader::new(tokio::io::stdin()).lines();

  match cli.command {
    Some(Commands::Run { task }) => {
      run_turn(&orchestrator, &cli.session, &task, &mut lines).await?;
    }
    Some(Commands::Chat) | None => {
      run_repl(&orchestrator, cli.session, &mut lines).await?;
    }
  }

  Ok(())
}

fn build_orchestrator(config: &Config, cwd: PathBuf) -> Result<Orchestrator> {
  let client = Arc::new(
    ModelClient::from_config(&config.models).context("failed to initialize model client")?,
  );
  let tools = build_default_tools(Arc::clone(&client), config);
  Ok(Orchestrator::new(client, tools, config).with_cwd(cwd))
}

/// Run one turn, streaming its events and prompting for approvals.
/// Ctrl-C cancels the turn.
async fn run_turn(
  orchestrator: &Orchestrator,
  session_id: &str,
  text: &str,
  lines: &mut StdinLines,
) -> Result<()> {
  let (sink, mut rx) = event_channel();
  let cancel = CancellationToken::new();
  let turn = orchestrator.process_message_cancellable(session_id, text, sink, cancel.clone());
  tokio::pin!(turn);

  let result = loop {
    tokio::select! {
      result = &mut turn => break result,
      Some(event) = rx.recv() => render_event(orchestrator, event, lines).await?,
      _ = tokio::signal::ctrl_c(), if !cancel.is_cancelled() => {
        eprintln!("\n[cancelling turn]");
        cancel.cancel();
      }
    }
  };
  while let Ok(event) = rx.try_recv() {
    render_event(orchestrator, event, lines).await?;
  }
  println!();

  match result {
    Ok(outcome) => {
      debug!(iterations = outcome.iterations, stop_reason = ?outcome.stop_reason, "turn done");
      Ok(())
    }
    Err(TurnError::Cancelled) => Ok(()),
    Err(err) => Err(err.into()),
  }
}

async fn render_event(
  orchestrator: &Orchestrator,
  event: EventMsg,
  lines: &mut StdinLines,
) -> Result<()> {
  match event {
    EventMsg::Text(text) => {
      print!("{}", text.content);
      std::io::stdout().flush()?;
    }
    EventMsg::ToolCallStarted(started) => eprintln!("\n[tool] {}", started.tool_name),
    EventMsg::ToolCallCompleted(done) if done.is_error => {
      eprintln!("[tool] {} failed", done.tool_name)
    }
    EventMsg::ToolProgress(progress) => eprintln!("[tool] {}", progress.message),
    EventMsg::ContextUpdate(usage) if usage.warning => eprintln!(
      "[context] {:.1}% of the window used{}",
      usage.percentage,
      if usage.at_soft_limit { " (soft limit reached)" } else { "" }
    ),
    EventMsg::IterationLimitReached(limit) => {
      eprintln!("[stopped after {} iterations]", limit.iterations)
    }
    EventMsg::ApprovalRequired(required) => {
      let response = prompt_approval(&required.request, lines).await?;
      if !orchestrator.handle_approval_response(response).await {
        eprintln!("[approval expired before the answer arrived]");
      }
    }
    EventMsg::Error(err) => eprintln!("[error] {}", err.message),
    _ => {}
  }
  Ok(())
}

async fn prompt_approval(request: &ApprovalRequest, lines: &mut StdinLines) -> Result<ApprovalResponse> {
  eprintln!();
  if request.is_dangerous {
    eprintln!("!! DANGEROUS: {}", request.summary);
  } else {
    eprintln!("Approve: {}", request.summary);
  }
  let pattern_hint = request
    .suggested_pattern
    .as_deref()
    .map(|p| format!(" (default `{p}`)"))
    .unwrap_or_default();
  loop {
    eprint!("[o]nce / [p]attern{pattern_hint} / [t]ool / [d]eny > ");
    std::io::stderr().flush()?;
    let Some(line) = lines.next_line().await? else {
      return Ok(ApprovalResponse::new(&request.request_id, ApprovalDecision::Deny));
    };
    match parse_approval_answer(&line) {
      Some((decision, pattern)) => {
        let response = ApprovalResponse::new(&request.request_id, decision);
        return Ok(match pattern {
          Some(pattern) => response.with_pattern(pattern),
          None => response,
        });
      }
      None => eprintln!("please answer o, p [pattern], t or d"),
    }
  }
}

/// `o`, `p [pattern]`, `t` or `d`, in short or long form.
fn parse_approval_answer(line: &str) -> Option<(ApprovalDecision, Option<String>)> {
  let line = line.trim();
  let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
  let rest = rest.trim();
  let decision = match word.to_ascii_lowercase().as_str() {
    "o" | "once" | "y" | "yes" => ApprovalDecision::AllowOnce,
    "p" | "pattern" => ApprovalDecision::AllowPattern,
    "t" | "tool" => ApprovalDecision::AllowTool,
    "d" | "deny" | "n" | "no" => ApprovalDecision::Deny,
    _ => return None,
  };
  let pattern = (decision == ApprovalDecision::AllowPattern && !rest.is_empty()).then(|| rest.to_string());
  Some((decision, pattern))
}

#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
  Message(String),
  Checkpoints,
  Revert(String),
  Fork { checkpoint: String, session: String },
  Session(Option<String>),
  Todos,
  Help,
  Exit,
  Invalid(String),
}

fn parse_repl_line(line: &str) -> Option<ReplCommand> {
  let line = line.trim();
  if line.is_empty() {
    return None;
  }
  let Some(command) = line.strip_prefix('/') else {
    return Some(ReplCommand::Message(line.to_string()));
  };
  let mut parts = command.split_whitespace();
  let name = parts.next().unwrap_or_default();
  let args: Vec<&str> = parts.collect();
  Some(match (name, args.as_slice()) {
    ("checkpoints", []) => ReplCommand::Checkpoints,
    ("revert", [id]) => ReplCommand::Revert(id.to_string()),
    ("fork", [checkpoint, session]) => ReplCommand::Fork {
      checkpoint: checkpoint.to_string(),
      session: session.to_string(),
    },
    ("session", []) => ReplCommand::Session(None),
    ("session", [id]) => ReplCommand::Session(Some(id.to_string())),
    ("todos", []) => ReplCommand::Todos,
    ("help", []) => ReplCommand::Help,
    ("exit" | "quit", []) => ReplCommand::Exit,
    _ => ReplCommand::Invalid(line.to_string()),
  })
}

const HELP: &str = "\
Commands:
  /checkpoints            list checkpoints of this session, newest first
  /revert <id>            restore the session to a checkpoint
  /fork <id> <session>    start a new session from a checkpoint and switch to it
  /session [id]           show or switch the current session
  /todos                  show the session todo list
  /help                   show this help
  /exit                   leave

Anything else is sent to the agent.";

async fn run_repl(
  orchestrator: &Orchestrator,
  mut session_id: String,
  lines: &mut StdinLines,
) -> Result<()> {
  println!("Turnstile interactive mode. /help for commands.");

  loop {
    print!("{session_id}> ");
    std::io::stdout().flush()?;

    let Some(line) = lines.next_line().await? else {
      break;
    };
    let Some(command) = parse_repl_line(&line) else {
      continue;
    };

    match command {
      ReplCommand::Message(text) => {
        if let Err(err) = run_turn(orchestrator, &session_id, &text, lines).await {
          eprintln!("[turn failed] {err:#}");
        }
      }
      ReplCommand::Checkpoints => {
        let checkpoints = orchestrator.list_checkpoints(&session_id).await;
        if checkpoints.is_empty() {
          println!("(no checkpoints)");
        }
        for checkpoint in checkpoints {
          println!(
            "{}  {}  {}{}",
            checkpoint.id,
            checkpoint.timestamp.format("%H:%M:%S"),
            checkpoint.name.as_deref().unwrap_or("(unnamed)"),
            checkpoint
              .action_summary
              .map(|s| format!(" - {s}"))
              .unwrap_or_default()
          );
        }
      }
      ReplCommand::Revert(id) => {
        if orchestrator.revert_to_checkpoint(&session_id, &id).await {
          println!("reverted to {id}");
        } else {
          println!("no checkpoint {id} in session {session_id}");
        }
      }
      ReplCommand::Fork {
        checkpoint,
        session,
      } => {
        if orchestrator
          .fork_from_checkpoint(&session_id, &checkpoint, &session)
          .await
        {
          println!("forked {checkpoint} into {session}");
          session_id = session;
        } else {
          println!("cannot fork {checkpoint} from {session_id} into {session}");
        }
      }
      ReplCommand::Session(None) => {
        println!("current session: {session_id}");
        println!("known sessions: {}", orchestrator.session_ids().await.join(", "));
      }
      ReplCommand::Session(Some(id)) => session_id = id,
      ReplCommand::Todos => {
        let handle = orchestrator.get_or_create_state(&session_id).await;
        let state = handle.lock().await;
        println!("{}", render_todos(&state.todos));
      }
      ReplCommand::Help => println!("{HELP}"),
      ReplCommand::Exit => break,
      ReplCommand::Invalid(line) => println!("unknown command: {line} (try /help)"),
    }
  }

  Ok(())
}
