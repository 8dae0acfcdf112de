mod config;
mod judge;
mod llm;
mod output;
mod parse;
mod prompt;
mod session;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use elorank_core::{ItemPayload, RankingEngine};
use rand::rngs::StdRng;
use rand::SeedableRng;
use reqwest::Client;
use serde::Deserialize;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::judge::{Judge, JudgeKind, LlmJudge, TerminalJudge};
use crate::llm::LlmConfig;
use crate::session::{ComparisonLog, SessionOptions, Snapshot};

#[derive(Parser)]
#[command(name = "elorank", version, about = "Rank items through pairwise comparisons with ELO ratings")]
struct Cli {
    /// Show progress during execution (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run a ranking session on a list of items
    Rank(RankArgs),
    /// Print the standings of a saved session
    Show(ShowArgs),
    /// Create a default config file at ~/.config/elorank/config.toml
    Init,
}

#[derive(Parser)]
struct RankArgs {
    /// File with items: JSON array (strings or {"name", "metadata"} objects) or one per line
    #[arg(long)]
    items: Option<PathBuf>,

    /// Inline item (repeatable)
    #[arg(long = "item")]
    inline_items: Vec<String>,

    /// Resume a session saved with --state
    #[arg(long, conflicts_with_all = ["items", "inline_items"])]
    resume: Option<PathBuf>,

    /// Who decides each comparison
    #[arg(long, value_enum)]
    judge: Option<JudgeKind>,

    /// The comparison question (e.g. "Which song is better?")
    #[arg(long)]
    criterion: Option<String>,

    /// Stop after this many comparisons
    #[arg(long)]
    comparisons: Option<usize>,

    /// Seed for pair selection, for reproducible sessions
    #[arg(long)]
    seed: Option<u64>,

    /// Save the session here after every comparison
    #[arg(long)]
    state: Option<PathBuf>,

    /// Append every comparison to this JSONL file
    #[arg(long)]
    log_comparisons: Option<PathBuf>,

    /// Output JSON instead of table
    #[arg(long)]
    json: bool,

    /// OpenAI-compatible base URL (e.g. http://localhost:8000)
    #[arg(long)]
    endpoint: Option<String>,

    /// Bearer token for the API (also reads OPENAI_API_KEY env var)
    #[arg(long)]
    api_key: Option<String>,

    /// Model ID for the API
    #[arg(long)]
    model: Option<String>,

    /// LLM sampling temperature. Default: 0.3.
    #[arg(long)]
    temperature: Option<f64>,

    /// Max retries per comparison on HTTP errors. Default: 3. Set to 0 to disable.
    #[arg(long)]
    retries: Option<usize>,

    /// Path to a custom prompt template file.
    /// The template must contain: $criterion, $option1, $option2
    #[arg(long)]
    prompt_template: Option<PathBuf>,

    /// Path to config file (default: ~/.config/elorank/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser)]
struct ShowArgs {
    /// Session file written by `rank --state`
    file: PathBuf,

    /// Output JSON instead of table
    #[arg(long)]
    json: bool,
}

/// One entry of a JSON items file.
#[derive(Deserialize)]
#[serde(untagged)]
enum ItemEntry {
    Name(String),
    Full(ItemPayload),
}

/// Parse a string as either a JSON array or plain text (one item per line).
fn parse_items_from_str(content: &str) -> Result<Vec<ItemPayload>> {
    let trimmed = content.trim();
    if trimmed.starts_with('[') {
        let entries: Vec<ItemEntry> = serde_json::from_str(trimmed)
            .context("Items look like JSON but failed to parse")?;
        Ok(entries
            .into_iter()
            .map(|entry| match entry {
                ItemEntry::Name(name) => ItemPayload::new(name.trim()),
                ItemEntry::Full(payload) => payload,
            })
            .filter(|payload| !payload.name.trim().is_empty())
            .collect())
    } else {
        Ok(trimmed
            .lines()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ItemPayload::new)
            .collect())
    }
}

/// Load items from all sources: --items file, --item inline args, or stdin.
fn load_items(args: &RankArgs, judge: JudgeKind) -> Result<Vec<ItemPayload>> {
    let mut items = Vec::new();

    if let Some(ref path) = args.items {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read items file {}", path.display()))?;
        items = parse_items_from_str(&content)
            .with_context(|| format!("Invalid items file {}", path.display()))?;
    }

    items.extend(
        args.inline_items
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(ItemPayload::new),
    );

    // From stdin (only if no file and no inline items)
    if items.is_empty() {
        let stdin = io::stdin();
        if stdin.is_terminal() {
            bail!("No items provided. Use --items <file>, --item <name>, or pipe items via stdin.");
        }
        if judge == JudgeKind::Terminal {
            bail!("The terminal judge reads answers from stdin, so items must come from --items or --item.");
        }
        let mut content = String::new();
        stdin.lock().read_to_string(&mut content).context("Failed to read from stdin")?;
        items = parse_items_from_str(&content)?;
    }

    if items.len() < 2 {
        bail!("Need at least 2 items to rank, got {}", items.len());
    }
    Ok(items)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Rank(args) => run_rank(args).await,
        Commands::Show(args) => run_show(&args),
        Commands::Init => {
            let path = config::config_path()?;
            config::create_default_config(&path)?;
            println!("Created config at {}", path.display());
            println!("Edit it to set your default judge, endpoint, model, etc.");
            Ok(())
        }
    }
}

fn run_show(args: &ShowArgs) -> Result<()> {
    let snapshot = session::load_snapshot(&args.file)?;
    snapshot
        .validate()
        .with_context(|| format!("Invalid session file {}", args.file.display()))?;
    print_standings(&snapshot, args.json)
}

fn print_standings(snapshot: &Snapshot, json: bool) -> Result<()> {
    if json {
        output::print_json(&snapshot.items, snapshot.total_rounds)
    } else {
        output::print_table(&snapshot.items, snapshot.total_rounds);
        Ok(())
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn build_llm_judge(args: &RankArgs, cfg: config::ElorankConfig, config_path: &Path) -> Result<LlmJudge> {
    let criterion = args.criterion.clone().or(cfg.criterion).with_context(|| {
        format!("No criterion specified. Pass --criterion or set it in {}", config_path.display())
    })?;
    let endpoint = args.endpoint.clone().or(cfg.endpoint).with_context(|| {
        format!("No endpoint specified. Pass --endpoint or set it in {}", config_path.display())
    })?;
    let model = args.model.clone().or(cfg.model).with_context(|| {
        format!("No model specified. Pass --model or set it in {}", config_path.display())
    })?;

    // Load prompt template: CLI arg > config file > built-in default
    let template_path = args.prompt_template.clone().or_else(|| cfg.prompt_template.map(PathBuf::from));
    let template = match template_path {
        Some(path) => prompt::load_template(&path)?,
        None => prompt::DEFAULT_TEMPLATE.to_string(),
    };

    let api_key = args.api_key.clone().or_else(|| std::env::var("OPENAI_API_KEY").ok());

    info!("Endpoint: {} | Model: {}", endpoint, model);
    info!("Criterion: \"{}\"", criterion);

    Ok(LlmJudge {
        client: Client::new(),
        config: LlmConfig {
            endpoint,
            model,
            api_key,
            temperature: args.temperature.or(cfg.temperature).unwrap_or(0.3),
        },
        template,
        criterion,
        max_retries: args.retries.or(cfg.retries).unwrap_or(3),
        rng: make_rng(args.seed),
    })
}

async fn run_rank(args: RankArgs) -> Result<()> {
    // Load config file, merge with CLI args (CLI wins)
    let config_path = match args.config.clone() {
        Some(path) => path,
        None => config::config_path()?,
    };
    let cfg = config::load_config(&config_path)?;

    let judge_kind = match (args.judge, cfg.judge.as_deref()) {
        (Some(kind), _) => kind,
        (None, Some(name)) => JudgeKind::from_str(name, true).map_err(|_| {
            anyhow::anyhow!(
                "Unknown judge \"{name}\" in {}. Use \"terminal\" or \"llm\".",
                config_path.display()
            )
        })?,
        (None, None) => JudgeKind::Terminal,
    };

    let budget = args.comparisons.or(cfg.comparisons);
    if judge_kind == JudgeKind::Llm && budget.is_none() {
        bail!(
            "The llm judge needs a comparison budget. Pass --comparisons or set it in {}",
            config_path.display()
        );
    }

    let rng = make_rng(args.seed);
    let mut engine = match args.resume {
        Some(ref path) => {
            let snapshot = session::load_snapshot(path)?;
            RankingEngine::restore(snapshot, rng)
                .with_context(|| format!("Cannot resume from {}", path.display()))?
        }
        None => RankingEngine::with_rng(load_items(&args, judge_kind)?, rng),
    };

    let mut judge = match judge_kind {
        JudgeKind::Terminal => Judge::Terminal(TerminalJudge::stdin()),
        JudgeKind::Llm => Judge::Llm(build_llm_judge(&args, cfg, &config_path)?),
    };

    let mut options = SessionOptions {
        budget,
        state: args.state.clone(),
        log: args.log_comparisons.as_deref().map(ComparisonLog::open).transpose()?,
    };

    info!(
        "Ranking {} items ({} comparisons so far{})",
        engine.len(),
        engine.total_rounds(),
        budget.map(|b| format!(", {b} planned")).unwrap_or_default(),
    );

    let summary = session::run_session(&mut engine, &mut judge, &mut options).await?;

    if summary.skipped > 0 {
        info!("Skipped pairs: {}", summary.skipped);
    }
    if summary.failed > 0 {
        info!("Failed comparisons: {}", summary.failed);
    }

    print_standings(&engine.snapshot(), args.json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_lines() {
        let items = parse_items_from_str("  Hey Jude\n\nYesterday  \nLet It Be\n").unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Hey Jude", "Yesterday", "Let It Be"]);
    }

    #[test]
    fn test_parse_json_strings() {
        let items = parse_items_from_str(r#"["Hey Jude", " ", "Yesterday"]"#).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].name, "Yesterday");
    }

    #[test]
    fn test_parse_json_objects_with_metadata() {
        let items = parse_items_from_str(
            r#"[{"name": "Teardrop", "metadata": {"artist": "Massive Attack"}}, "Roads"]"#,
        )
        .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].metadata["artist"], "Massive Attack");
        assert!(items[1].metadata.is_empty());
    }

    #[test]
    fn test_parse_broken_json() {
        assert!(parse_items_from_str("[\"unterminated").is_err());
    }

    #[test]
    fn test_cli_parses_rank_args() {
        let cli = Cli::try_parse_from([
            "elorank", "-v", "rank", "--item", "A", "--item", "B", "--judge", "llm", "--comparisons", "10", "--seed", "7",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Rank(args) => {
                assert_eq!(args.inline_items, vec!["A", "B"]);
                assert_eq!(args.judge, Some(JudgeKind::Llm));
                assert_eq!(args.comparisons, Some(10));
                assert_eq!(args.seed, Some(7));
            }
            _ => panic!("expected rank command"),
        }
    }

    #[test]
    fn test_cli_resume_conflicts_with_items() {
        let result = Cli::try_parse_from(["elorank", "rank", "--resume", "s.json", "--item", "A"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_make_rng_is_reproducible() {
        use rand::Rng;
        let a: u64 = make_rng(Some(3)).random();
        let b: u64 = make_rng(Some(3)).random();
        assert_eq!(a, b);
    }
}
