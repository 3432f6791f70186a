use clap::{Parser, Subcommand};
use sentiment_analyser::{LanguageServiceClient, SentimentAggregator};
use std::path::PathBuf;
use trend_pipeline::{report, TrendPipeline};
use trends_core::{AppConfig, CoreError, ErrorReporter};
use tracing_subscriber::EnvFilter;
use twitter_client::TwitterClient;

const DEFAULT_LOG_FILTER: &str =
    "trendsai=info,trend_pipeline=info,sentiment_analyser=info,twitter_client=info";

#[derive(Parser, Debug)]
#[command(name = "trendsai", version, about = "Sentiment of trending topics on Twitter")]
struct Cli {
    /// TOML configuration file; without one, defaults and environment variables are used.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Where On Earth id of the region. Worldwide trends when omitted.
    #[arg(long)]
    woeid: Option<u64>,
    /// Directory holding snapshots and results.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Collects the current trends and their top tweets.
    Collect,
    /// Scores the collected tweets trend by trend.
    ByTrends,
    /// Scores entity sentiment of all collected tweets as one document.
    All,
    /// Collects, then scores trend by trend.
    Run,
}

#[tokio::main]
async fn main() -> Result<(), CoreError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!("Starting TrendsAI ({:?})", cli.command);

    if let Err(e) = run(cli).await {
        ErrorReporter::new().report_error(&e);
        return Err(e);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), CoreError> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::from_env(),
    };
    if cli.woeid.is_some() {
        config.woeid = cli.woeid;
    }
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    let pipeline = TrendPipeline::from_config(&config);

    match cli.command {
        Commands::Collect => collect(&pipeline, &config).await,
        Commands::ByTrends => by_trends(&pipeline, &config).await,
        Commands::All => {
            let aggregator = aggregator(&config)?;
            let entities = pipeline.analyse_all(&aggregator).await?;
            print!("{}", report::format_entities(&entities));
            Ok(())
        }
        Commands::Run => {
            collect(&pipeline, &config).await?;
            by_trends(&pipeline, &config).await
        }
    }
}

async fn collect(pipeline: &TrendPipeline, config: &AppConfig) -> Result<(), CoreError> {
    let client = TwitterClient::connect(&config.twitter).await?;
    let path = pipeline.collect(&client).await?;
    println!("Trends saved to {}", path.display());
    Ok(())
}

async fn by_trends(pipeline: &TrendPipeline, config: &AppConfig) -> Result<(), CoreError> {
    let aggregator = aggregator(config)?;
    let result = pipeline.analyse_by_trends(&aggregator).await?;
    print!("{}", report::format_by_trends(&result));
    Ok(())
}

fn aggregator(config: &AppConfig) -> Result<SentimentAggregator<LanguageServiceClient>, CoreError> {
    let client = LanguageServiceClient::from_config(&config.scoring)?;
    Ok(SentimentAggregator::from_config(client, &config.scoring))
}
