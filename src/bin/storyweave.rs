//! CLI: validate, lay out, play through and analyze StoryMap JSON files.
//!
//! Usage: `storyweave <COMMAND> [OPTIONS] <path-to-map.json>`
//! Example: storyweave play --choose left story.json
//!
//! Set RUST_LOG=storyweave=trace for TRACE-level span enter/exit and events.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use storyweave::error::PlaybackError;
use storyweave::session_io::save_session;
use storyweave::types::PlaybackState;
use storyweave::{
  AnalyticsAggregator, LayoutAlgorithm, PlaybackEvent, PlaybackResolver, StoryConfig, StoryMap,
  autolayout, lint, spawn_ingestor, validate,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

/// Work with branching-narrative StoryMaps.
#[derive(Parser, Debug)]
#[command(name = "storyweave")]
#[command(
  after_help = r#"Environment variables (command-line flags take precedence):
  STORYWEAVE_LAYOUT              Layout algorithm: layered | vertical (default: layered).
  STORYWEAVE_COLUMN_GAP          Distance between layers (default: 250).
  STORYWEAVE_ROW_GAP             Distance between nodes in a layer (default: 150).
  STORYWEAVE_MAX_AUTO_STEPS      Branch nodes passed through per step (default: 256).
  STORYWEAVE_ANALYTICS_BATCH     Events folded per analytics batch (default: 64).
  STORYWEAVE_ANALYTICS_CAPACITY  Analytics channel capacity (default: 1024).

Examples:
  storyweave validate story.json
  storyweave layout --algorithm vertical story.json
  storyweave play --choose left --session-out session.json story.json
  storyweave analytics story.json events.jsonl"#
)]
struct Args {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Check a StoryMap for structural errors and print lint warnings.
  Validate {
    #[arg(value_name = "path-to-map.json")]
    map: PathBuf,
  },
  /// Print the StoryMap with auto-layout positions assigned.
  Layout {
    /// layered | vertical. Overrides STORYWEAVE_LAYOUT.
    #[arg(long)]
    algorithm: Option<LayoutAlgorithm>,
    /// Distance between layers. Overrides STORYWEAVE_COLUMN_GAP.
    #[arg(long)]
    column_gap: Option<f64>,
    /// Distance between nodes in a layer. Overrides STORYWEAVE_ROW_GAP.
    #[arg(long)]
    row_gap: Option<f64>,
    #[arg(value_name = "path-to-map.json")]
    map: PathBuf,
  },
  /// Play from the start node, taking the given choices in order.
  Play {
    /// Choice id to select at the next choice node. Repeatable.
    #[arg(long = "choose", value_name = "choiceId")]
    choices: Vec<String>,
    /// Write the final session to this file.
    #[arg(long, value_name = "PATH")]
    session_out: Option<PathBuf>,
    #[arg(long, default_value = "cli")]
    session_id: String,
    /// Stop after this many transitions.
    #[arg(long, default_value_t = 1000)]
    max_steps: usize,
    #[arg(value_name = "path-to-map.json")]
    map: PathBuf,
  },
  /// Aggregate playback events (one JSON object per line) into reach/selection rates.
  Analytics {
    #[arg(value_name = "path-to-map.json")]
    map: PathBuf,
    #[arg(value_name = "events.jsonl")]
    events: PathBuf,
  },
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();
  let config = match StoryConfig::from_env() {
    Ok(c) => c,
    Err(e) => fail(format!("Configuration error: {}", e)),
  };
  info!(?config, "storyweave starting");

  match args.command {
    Command::Validate { map } => run_validate(&map),
    Command::Layout {
      algorithm,
      column_gap,
      row_gap,
      map,
    } => {
      let config = config
        .with_layout_overrides(algorithm, column_gap, row_gap)
        .unwrap_or_else(|e| fail(format!("Configuration error: {}", e)));
      let mut graph = read_map(&map);
      graph.nodes = autolayout(&graph.nodes, &graph.edges, &config.layout);
      print_json(&graph);
    }
    Command::Play {
      choices,
      session_out,
      session_id,
      max_steps,
      map,
    } => run_play(
      &read_map(&map),
      &config,
      choices,
      &session_id,
      max_steps,
      session_out.as_deref(),
    ),
    Command::Analytics { map, events } => run_analytics(&read_map(&map), &config, &events).await,
  }
}

fn run_validate(path: &Path) {
  let graph = read_map(path);
  if let Err(issues) = validate(&graph) {
    for issue in &issues {
      eprintln!("error: {}", issue);
    }
    fail(format!("{} issue(s) found in {}", issues.len(), path.display()));
  }
  for warning in lint(&graph) {
    println!("warning: {}", warning);
  }
  println!(
    "StoryMap is valid: {} nodes, {} edges, {} variables.",
    graph.nodes.len(),
    graph.edges.len(),
    graph.story_variables.len()
  );
}

fn run_play(
  graph: &StoryMap,
  config: &StoryConfig,
  choices: Vec<String>,
  session_id: &str,
  max_steps: usize,
  session_out: Option<&Path>,
) {
  let resolver = PlaybackResolver::new(graph).with_max_auto_steps(config.max_auto_steps);
  let (mut session, _) = resolver
    .start(session_id)
    .unwrap_or_else(|e| fail(format!("Playback error: {}", e)));
  println!("{}", session.state);
  let mut pending = choices.into_iter();
  for _ in 0..max_steps {
    let result: Result<_, PlaybackError> = match &session.state {
      PlaybackState::AtScene { .. } => resolver.advance(&mut session),
      PlaybackState::AwaitingChoice { .. } => match pending.next() {
        Some(choice_id) => resolver.select_choice(&mut session, &choice_id),
        None => break,
      },
      PlaybackState::Resolving { .. } | PlaybackState::AtEnding { .. } => break,
    };
    match result {
      Ok(t) => println!("{}", t.state),
      Err(e) => {
        save_if_requested(session_out, &session);
        fail(format!("Playback error: {}", e));
      }
    }
  }
  let unused: Vec<String> = pending.collect();
  if !unused.is_empty() {
    warn!(?unused, "choices left unused");
  }
  println!("Variables: {}", serde_json::to_string(&session.variables).unwrap_or_default());
  save_if_requested(session_out, &session);
  if !session.is_finished() {
    println!("Stopped at {} before reaching an ending.", session.state);
  }
}

async fn run_analytics(graph: &StoryMap, config: &StoryConfig, events_path: &Path) {
  let text = fs::read_to_string(events_path)
    .unwrap_or_else(|e| fail(format!("Error reading {}: {}", events_path.display(), e)));
  let pipeline = spawn_ingestor(
    AnalyticsAggregator::new(graph),
    config.analytics_capacity,
    config.analytics_batch_size,
  );
  let handle = pipeline.handle();
  let mut skipped = 0usize;
  for (line_no, line) in text.lines().enumerate() {
    if line.trim().is_empty() {
      continue;
    }
    match serde_json::from_str::<PlaybackEvent>(line) {
      Ok(event) => handle.record(event),
      Err(e) => {
        skipped += 1;
        warn!(line = line_no + 1, error = %e, "unparsable event line skipped");
      }
    }
  }
  drop(handle);
  let report = pipeline.shutdown().await;
  info!(skipped, "analytics complete");
  print_json(&report);
}

fn save_if_requested(path: Option<&Path>, session: &storyweave::PlaybackSession) {
  if let Some(path) = path {
    match save_session(path, session) {
      Ok(()) => info!(path = %path.display(), "session saved"),
      Err(e) => eprintln!("Error writing session: {}", e),
    }
  }
}

fn read_map(path: &Path) -> StoryMap {
  let text = fs::read_to_string(path)
    .unwrap_or_else(|e| fail(format!("Error reading {}: {}", path.display(), e)));
  serde_json::from_str(&text)
    .unwrap_or_else(|e| fail(format!("Error parsing {}: {}", path.display(), e)))
}

fn print_json<T: serde::Serialize>(value: &T) {
  match serde_json::to_string_pretty(value) {
    Ok(s) => println!("{}", s),
    Err(e) => fail(format!("Error serializing output: {}", e)),
  }
}

fn fail(message: String) -> ! {
  eprintln!("{}", message);
  process::exit(1);
}
