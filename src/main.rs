mod api;
mod server;

use clap::{Args, Parser, Subcommand};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use slop_score::analysis::{AnalysisReport, AnalysisService};
use slop_score::config::{AppConfig, ServerConfig};
use slop_score::leaderboard::{query_leaderboard, LeaderboardQuery};
use slop_score::provider::{FixtureProvider, PostProvider, TwitterApiClient};
use slop_score::refresh::RefreshPolicy;
use slop_score::scoring::AccountScore;
use slop_score::store::ScoreStore;
use slop_score::{
    calculate_percentage_score, format_float, format_signed, score_account, Post, SlopBand,
};

#[derive(Parser)]
#[command(name = "slop-score", about = "Account content-quality (slop) scorer")]
struct Cli {
    /// Path to the TOML config (defaults to $SLOP_CONFIG_PATH or config/slop.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score a JSON array of posts from a file or stdin
    Score(ScoreArgs),
    /// Fetch, score and store an account
    Analyze(AnalyzeArgs),
    /// Show stored scores, best first
    Leaderboard(LeaderboardArgs),
    /// Run the HTTP API (and optional static web root)
    Serve(ServeArgs),
    /// Write the default config file
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug, Clone)]
struct ScoreArgs {
    #[arg(long)]
    file: Option<PathBuf>,
    #[arg(long)]
    top_score: Option<f64>,
    #[arg(long)]
    details: bool,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug, Clone)]
struct AnalyzeArgs {
    username: String,
    #[arg(long)]
    refresh: bool,
    /// Read timelines from `<dir>/<username>.json` instead of the remote API
    #[arg(long)]
    fixtures: Option<PathBuf>,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug, Clone)]
struct LeaderboardArgs {
    #[arg(long)]
    search: Option<String>,
    #[arg(long, default_value_t = 1)]
    page: usize,
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args, Debug, Clone)]
struct ServeArgs {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    web_root: Option<String>,
    #[arg(long)]
    fixtures: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct InitConfigArgs {
    #[arg(long, default_value = "config/slop.toml")]
    path: PathBuf,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let (config, config_path) = AppConfig::load(cli.config)?;
    if let Some(path) = config_path.as_ref().filter(|path| path.exists()) {
        tracing::debug!(path = %path.display(), "loaded config");
    }

    match cli.command {
        Command::Score(args) => run_score(args, &config).await,
        Command::Analyze(args) => run_analyze(args, &config).await,
        Command::Leaderboard(args) => run_leaderboard(args, &config).await,
        Command::Serve(args) => run_serve(args, config).await,
        Command::InitConfig(args) => run_init_config(&args.path),
    }
}

async fn run_score(args: ScoreArgs, config: &AppConfig) -> Result<(), String> {
    let payload = read_input(args.file.as_deref())?;
    let posts: Vec<Post> =
        serde_json::from_str(&payload).map_err(|err| format!("invalid posts payload: {}", err))?;

    let score = score_account(&posts);
    let top_score = match args.top_score {
        Some(top_score) => top_score,
        None => ScoreStore::load(config.store.path.clone()).await?.top_score().await,
    }
    .max(score.normalized_score);

    if args.json {
        let response = api::ApiScoreResponse::from_score(score, top_score, args.details);
        let payload = serde_json::to_string_pretty(&response)
            .map_err(|err| format!("failed to serialize score: {}", err))?;
        println!("{}", payload);
        return Ok(());
    }

    print_score(&score, top_score, args.details);
    Ok(())
}

async fn run_analyze(args: AnalyzeArgs, config: &AppConfig) -> Result<(), String> {
    let service = build_service(config, args.fixtures).await?;
    let report = service
        .analyze(&args.username, args.refresh)
        .await
        .map_err(|err| err.to_string())?;

    if args.json {
        let payload = serde_json::to_string_pretty(&report)
            .map_err(|err| format!("failed to serialize report: {}", err))?;
        println!("{}", payload);
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

async fn run_leaderboard(args: LeaderboardArgs, config: &AppConfig) -> Result<(), String> {
    let store = ScoreStore::load(config.store.path.clone()).await?;
    let query = LeaderboardQuery {
        search: args.search,
        page: Some(args.page),
        limit: args.limit,
    };
    let page = query_leaderboard(&store, &query, &config.leaderboard).await;

    if page.entries.is_empty() {
        println!("No analyzed accounts yet.");
        return Ok(());
    }

    for entry in &page.entries {
        println!(
            "#{:<4} @{:<16} score {:>6}  slop {:>3}% ({})",
            entry.rank,
            entry.username,
            format_float(entry.normalized_score, 2),
            entry.percentage,
            entry.band.label()
        );
    }
    println!(
        "Page {} of {} ({} accounts)",
        page.pagination.page,
        page.pagination.total_pages.max(1),
        page.pagination.total
    );
    Ok(())
}

async fn run_serve(args: ServeArgs, config: AppConfig) -> Result<(), String> {
    let service = Arc::new(build_service(&config, args.fixtures).await?);
    let server_config = ServerConfig {
        host: args.host.unwrap_or(config.server.host),
        port: args.port.unwrap_or(config.server.port),
        web_root: args.web_root.or(config.server.web_root),
    };
    server::serve(server_config, service, config.leaderboard).await
}

fn run_init_config(path: &Path) -> Result<(), String> {
    if path.exists() {
        return Err(format!("config already exists: {}", path.display()));
    }
    AppConfig::default().write(path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

async fn build_service(
    config: &AppConfig,
    fixtures: Option<PathBuf>,
) -> Result<AnalysisService, String> {
    let provider: Arc<dyn PostProvider> =
        match fixtures.or_else(|| config.provider.fixtures_dir.clone()) {
            Some(dir) => Arc::new(FixtureProvider::new(dir)),
            None => Arc::new(
                TwitterApiClient::from_env(&config.provider)?
                    .ok_or_else(|| "TWITTER_API_KEY is not set".to_string())?,
            ),
        };
    let store = Arc::new(ScoreStore::load(config.store.path.clone()).await?);
    Ok(AnalysisService::new(
        provider,
        store,
        RefreshPolicy::from_config(&config.refresh),
    ))
}

fn print_score(score: &AccountScore, top_score: f64, details: bool) {
    let percentage = calculate_percentage_score(score.normalized_score, top_score);
    let band = SlopBand::from_percentage(percentage);

    println!(
        "Quality score: {} / 100 ({} posts, average raw {})",
        format_float(score.normalized_score, 2),
        score.post_count,
        format_float(score.average_raw, 1)
    );
    println!(
        "Slop score: {}% ({}) against top score {}",
        percentage,
        band.label(),
        format_float(top_score, 2)
    );

    if details && !score.posts.is_empty() {
        println!("\nPosts:");
        for post in &score.posts {
            let penalties = &post.penalties;
            println!(
                "- {} raw {} | engagement {} | content {} | brevity -{} hashtags -{} link -{} complexity -{} em dash -{}{}",
                post.post_id,
                format_signed(post.raw_score),
                format_signed(post.engagement),
                format_signed(post.content_adjustment),
                penalties.brevity,
                penalties.hashtags,
                penalties.external_link,
                penalties.complexity,
                penalties.em_dashes,
                if post.flags.is_retweet { " [retweet]" } else { "" }
            );
        }
    }
}

fn print_report(report: &AnalysisReport) {
    let name = report
        .display_name
        .as_deref()
        .map(|name| format!("{} (@{})", name, report.username))
        .unwrap_or_else(|| format!("@{}", report.username));
    println!("{}", name);
    println!(
        "Slop score: {}% ({})",
        report.percentage,
        report.band.label()
    );
    println!(
        "Quality score: {} / 100 (top {})",
        format_float(report.normalized_score, 2),
        format_float(report.top_score, 2)
    );
    if let Some(rank) = report.rank {
        println!("Ranking: #{} out of {}", rank, report.total_users);
    }
    if report.from_cache {
        println!("Served from stored analysis (use --refresh to re-analyze)");
    } else if report.timeline_changed {
        println!("Analyzed {} posts", report.post_count);
    } else {
        println!(
            "Analyzed {} posts (same posts as the previous analysis)",
            report.post_count
        );
    }
}

fn read_input(path: Option<&Path>) -> Result<String, String> {
    if let Some(path) = path {
        return std::fs::read_to_string(path)
            .map_err(|err| format!("failed reading {}: {}", path.display(), err));
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|err| format!("failed reading stdin: {}", err))?;
    if buffer.trim().is_empty() {
        return Err("missing posts: pass --file or pipe a JSON array on stdin".to_string());
    }
    Ok(buffer)
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("slop_score=info,warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::CommandFactory;

    #[test]
    fn every_subcommand_has_help_text() {
        let command = Cli::command();
        command.clone().debug_assert();
        for subcommand in command.get_subcommands() {
            assert!(
                subcommand.get_about().is_some(),
                "{} has no help text",
                subcommand.get_name()
            );
        }
    }
}
