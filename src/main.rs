mod api;
mod history;
mod server;

use clap::{Args, Parser, Subcommand};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use api::ApiComputeRequest;
use history::SnapshotHistory;
use search_share::config::{default_config_path, EngineConfig};
use search_share::{
    format_number, format_percent, format_signed, trend_for, Recommendation, RecommendationContext,
    RecommendationEngine, Snapshot, SnapshotTrend,
};

#[derive(Parser)]
#[command(name = "search-share", about = "Share of Search / Share of Voice metrics")]
struct Cli {
    /// Config file (defaults to $SEARCH_SHARE_CONFIG_PATH or config/search_share.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute a snapshot from an input JSON document
    Compute(ComputeArgs),
    /// List stored snapshots for a project
    History(ProjectArgs),
    /// Regenerate recommendations from the latest stored snapshot
    Recommend(ProjectArgs),
    /// Serve the HTTP API
    Serve(ServeArgs),
    /// Write the default config file
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug, Clone)]
struct ComputeArgs {
    /// Input file, or `-` for stdin
    #[arg(long, default_value = "-")]
    input: String,
    #[arg(long)]
    project: Option<String>,
    /// Append the snapshot to the project history
    #[arg(long, requires = "project")]
    save: bool,
    #[arg(long)]
    details: bool,
}

#[derive(Args, Debug, Clone)]
struct ProjectArgs {
    #[arg(long)]
    project: String,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long, default_value_t = 8788)]
    port: u16,
}

#[derive(Args, Debug, Clone)]
struct InitConfigArgs {
    #[arg(long)]
    path: Option<PathBuf>,
    #[arg(long)]
    force: bool,
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

    if let Command::InitConfig(args) = &cli.command {
        return run_init_config(args.path.clone().or(cli.config), args.force);
    }

    let (config, config_path) = EngineConfig::load(cli.config)?;
    if let Some(path) = config_path.as_ref().filter(|path| path.exists()) {
        tracing::debug!(config = %path.display(), scheme = %config.gap.scheme, "loaded config");
    }

    match cli.command {
        Command::Compute(args) => run_compute(args, &config).await,
        Command::History(args) => run_history(args, &config).await,
        Command::Recommend(args) => run_recommend(args, &config).await,
        Command::Serve(args) => server::serve(args, config).await,
        Command::InitConfig(_) => Ok(()),
    }
}

async fn run_compute(args: ComputeArgs, config: &EngineConfig) -> Result<(), String> {
    let raw = read_input(&args.input)?;
    let request: ApiComputeRequest =
        serde_json::from_str(&raw).map_err(|err| format!("invalid input document: {}", err))?;
    let input = request.into_input()?;
    let assembler = config.assembler();

    let (snapshot, trend) = match args.project.as_deref().filter(|_| args.save) {
        Some(project_id) => {
            let history = SnapshotHistory::load(config.history.path.clone()).await?;
            history
                .append(project_id, || assembler.assemble(&input, chrono::Utc::now()))
                .await?
        }
        None => (assembler.assemble(&input, chrono::Utc::now()), None),
    };

    print_snapshot(&snapshot, args.details);
    if let Some(trend) = trend {
        print_trend(&trend);
    }

    let recommendations = RecommendationEngine::new()
        .generate(&snapshot, &RecommendationContext::from_snapshot(&snapshot));
    print_recommendations(&recommendations);
    Ok(())
}

async fn run_history(args: ProjectArgs, config: &EngineConfig) -> Result<(), String> {
    let history = SnapshotHistory::load(config.history.path.clone()).await?;
    let snapshots = history.history(&args.project).await;
    if snapshots.is_empty() {
        return Err(format!("no snapshots for project {}", args.project));
    }

    println!(
        "{:<8} {:<20} {:>8} {:>8} {:>8} {:>8} {:>8}  {}",
        "Month", "Timestamp", "SOS", "SOV", "Gap", "ΔSOS", "ΔSOV", "Status"
    );
    for (index, snapshot) in snapshots.iter().enumerate() {
        let trend = trend_for(&snapshots[..=index]);
        println!(
            "{:<8} {:<20} {:>8} {:>8} {:>8} {:>8} {:>8}  {}",
            snapshot.date,
            snapshot.timestamp.format("%Y-%m-%d %H:%M:%S"),
            format_percent(snapshot.sos),
            format_percent(snapshot.sov),
            format_signed(snapshot.gap),
            trend.map(|t| format_signed(t.sos_delta)).unwrap_or_else(|| "-".to_string()),
            trend.map(|t| format_signed(t.sov_delta)).unwrap_or_else(|| "-".to_string()),
            snapshot.status.label()
        );
    }
    Ok(())
}

async fn run_recommend(args: ProjectArgs, config: &EngineConfig) -> Result<(), String> {
    let history = SnapshotHistory::load(config.history.path.clone()).await?;
    let snapshot = history
        .latest(&args.project)
        .await
        .ok_or_else(|| format!("no snapshots for project {}", args.project))?;

    let recommendations = RecommendationEngine::new()
        .generate(&snapshot, &RecommendationContext::from_snapshot(&snapshot));
    print_recommendations(&recommendations);
    Ok(())
}

fn run_init_config(path: Option<PathBuf>, force: bool) -> Result<(), String> {
    let path = path
        .or_else(default_config_path)
        .ok_or_else(|| "no config path available".to_string())?;
    if path.exists() && !force {
        return Err(format!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        ));
    }
    EngineConfig::default().write(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn print_snapshot(snapshot: &Snapshot, details: bool) {
    println!(
        "Share of Search: {} ({} of {} branded searches)",
        format_percent(snapshot.sos),
        format_number(snapshot.brand_volume as f64),
        format_number(snapshot.total_brand_volume as f64)
    );
    println!(
        "Share of Voice: {} ({} visible of {} market searches)",
        format_percent(snapshot.sov),
        format_number(snapshot.visible_volume as f64),
        format_number(snapshot.total_market_volume as f64)
    );
    println!(
        "Growth gap: {} ({}) - {}",
        format_signed(snapshot.gap),
        snapshot.status.label(),
        snapshot.status.interpretation()
    );

    if details {
        println!(
            "\n{:<24} {:>10} {:>8} {:>8} {:>10} {:>8}",
            "Brand", "Volume", "SOS", "SOV", "Visible", "Gap"
        );
        for row in snapshot.ranked_by_sos() {
            let marker = if row.is_own_brand { "*" } else { " " };
            println!(
                "{}{:<23} {:>10} {:>8} {:>8} {:>10} {:>8}",
                marker,
                row.name,
                format_number(row.volume as f64),
                format_percent(row.sos),
                format_percent(row.sov),
                format_number(row.visible_volume as f64),
                format_signed(row.gap)
            );
        }
    }
}

fn print_trend(trend: &SnapshotTrend) {
    println!(
        "Since previous snapshot: SOS {} | SOV {} | gap {}{}",
        format_signed(trend.sos_delta),
        format_signed(trend.sov_delta),
        format_signed(trend.gap_delta),
        if trend.status_changed { " (status changed)" } else { "" }
    );
}

fn print_recommendations(recommendations: &[Recommendation]) {
    if recommendations.is_empty() {
        return;
    }
    println!("\nRecommendations:");
    for recommendation in recommendations {
        println!(
            "- [{}] {}: {}",
            recommendation.priority.label(),
            recommendation.title,
            recommendation.message
        );
    }
}

fn read_input(source: &str) -> Result<String, String> {
    if source != "-" {
        return std::fs::read_to_string(source)
            .map_err(|err| format!("failed to read {}: {}", source, err));
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|err| format!("failed reading stdin: {}", err))?;
    if buffer.trim().is_empty() {
        return Err("missing input: pass --input <file> or pipe JSON on stdin".to_string());
    }
    Ok(buffer)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
