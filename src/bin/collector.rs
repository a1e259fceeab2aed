use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use shop_scraper::collector;
use shop_scraper::records::DataKind;
use shop_scraper::settings::Settings;
use shop_scraper::util::format_duration;

#[derive(Parser)]
#[command(name = "collector", about = "Scrape products, reviews and testimonials into CSV files")]
struct Cli {
    /// Folder the CSV files are written to
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Shop to scrape (default: https://web-scraping.dev)
    #[arg(long)]
    base_url: Option<String>,
    /// Only collect these kinds (repeatable; default: all)
    #[arg(long, value_enum)]
    only: Vec<DataKind>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shop_scraper::init_tracing();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut settings = Settings::load()?;
    if let Some(dir) = cli.data_dir {
        settings = settings.with_data_dir(dir);
    }
    if let Some(url) = cli.base_url {
        settings = settings.with_base_url(url);
    }
    let kinds = if cli.only.is_empty() {
        DataKind::ALL.to_vec()
    } else {
        cli.only
    };

    println!("Collecting from {} into {:?}", settings.base_url, settings.data_dir);
    let collected = collector::run(&settings, &kinds).await?;
    for c in &collected {
        println!(
            "Saved {} {} to {} in {}",
            c.rows,
            c.kind,
            c.path.display(),
            format_duration(c.elapsed)
        );
    }

    println!("\nDone in {}", format_duration(t0.elapsed()));
    Ok(())
}
