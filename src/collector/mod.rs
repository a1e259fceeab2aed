pub mod client;
pub mod products;
pub mod reviews;
pub mod testimonials;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::records::DataKind;
use crate::settings::Settings;
use crate::store;
use client::SiteClient;

/// What one data kind produced.
#[derive(Debug)]
pub struct Collected {
    pub kind: DataKind,
    pub rows: usize,
    pub path: PathBuf,
    pub elapsed: Duration,
}

/// Fetch each requested kind serially and write its CSV file as soon as the
/// kind is complete. The first error aborts the run; files written for
/// earlier kinds stay on disk.
pub async fn run(settings: &Settings, kinds: &[DataKind]) -> Result<Vec<Collected>> {
    let client = SiteClient::new(settings)?;
    let mut out = Vec::with_capacity(kinds.len());

    for kind in DataKind::ALL.into_iter().filter(|k| kinds.contains(k)) {
        let t0 = Instant::now();
        let pb = spinner(kind);
        info!(kind = %kind, base_url = %settings.base_url, "collecting");

        let result = collect_kind(&client, settings, kind, &pb).await;
        pb.finish_and_clear();
        let (rows, path) = result?;

        out.push(Collected {
            kind,
            rows,
            path,
            elapsed: t0.elapsed(),
        });
    }

    Ok(out)
}

async fn collect_kind(
    client: &SiteClient,
    settings: &Settings,
    kind: DataKind,
    pb: &ProgressBar,
) -> Result<(usize, PathBuf)> {
    let dir = settings.data_dir.as_path();
    match kind {
        DataKind::Products => {
            let rows = products::collect(client, settings, pb).await?;
            Ok((rows.len(), store::write_records(dir, &rows)?))
        }
        DataKind::Reviews => {
            let rows = reviews::collect(client, settings, pb).await?;
            Ok((rows.len(), store::write_records(dir, &rows)?))
        }
        DataKind::Testimonials => {
            let rows = testimonials::collect(client, settings, pb).await?;
            Ok((rows.len(), store::write_records(dir, &rows)?))
        }
    }
}

fn spinner(kind: DataKind) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(format!("{}: starting", kind));
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
