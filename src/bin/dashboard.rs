use std::path::PathBuf;

use clap::Parser;
use shop_scraper::dashboard::sentiment::SentimentAnalyzer;
use shop_scraper::dashboard::{server, summarize, Snapshot};
use shop_scraper::settings::Settings;

#[derive(Parser)]
#[command(name = "dashboard", about = "Browse the scraped CSV files with charts and review sentiment")]
struct Cli {
    /// Folder the CSV files are read from
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Address to listen on (default: 127.0.0.1:8501)
    #[arg(long)]
    bind: Option<String>,
    /// Print the aggregates and exit instead of serving
    #[arg(long)]
    summary: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shop_scraper::init_tracing();

    let cli = Cli::parse();
    let mut settings = Settings::load()?;
    if let Some(dir) = cli.data_dir {
        settings = settings.with_data_dir(dir);
    }
    if let Some(bind) = cli.bind {
        settings = settings.with_bind(bind);
    }

    if cli.summary {
        let snapshot = Snapshot::load(&settings.data_dir);
        summarize(&snapshot, &SentimentAnalyzer::new()).print();
        return Ok(());
    }

    server::serve(&settings).await
}
