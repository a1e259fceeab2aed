use std::path::Path;

use serde::Deserialize;

use super::render::{self, Alert, Nav};
use super::sentiment::{Label, SentimentAnalyzer};
use super::stats;
use super::Snapshot;
use crate::records::DataKind;
use crate::store::{self, StoreError, Table};

const ACCENT: &str = "#ff4b4b";
const CLOUD_WORDS: usize = 60;

/// Query string of `/reviews`. Both fields arrive as raw strings because the
/// month form submits an empty value for "all months".
#[derive(Debug, Default, Deserialize)]
pub struct ReviewsQuery {
    pub month: Option<String>,
    pub year: Option<String>,
}

impl ReviewsQuery {
    pub fn month(&self) -> Option<u32> {
        self.month
            .as_deref()
            .and_then(|m| m.trim().parse().ok())
            .filter(|m| (1..=12).contains(m))
    }

    pub fn year(&self, default_year: i32) -> i32 {
        self.year
            .as_deref()
            .and_then(|y| y.trim().parse().ok())
            .unwrap_or(default_year)
    }
}

fn load_error(e: &StoreError) -> String {
    match e {
        StoreError::Missing(_) => render::alert(Alert::Error, &format!("{}. Run the collector first.", e)),
        StoreError::Malformed { .. } => render::alert(Alert::Error, &e.to_string()),
    }
}

fn count_or_dash(t: &Result<Table, StoreError>) -> String {
    match t {
        Ok(t) => t.len().to_string(),
        Err(_) => "–".to_string(),
    }
}

pub fn overview(snapshot: &Snapshot, data_dir: &Path) -> String {
    let mut body = render::metrics(&[
        ("Products", count_or_dash(&snapshot.products)),
        ("Reviews", count_or_dash(&snapshot.reviews)),
        ("Testimonials", count_or_dash(&snapshot.testimonials)),
    ]);
    body.push_str("<p>Monitor brand reputation using the scraped shop data.</p>");

    let mut rows = Vec::new();
    for (kind, loaded) in [
        (DataKind::Products, &snapshot.products),
        (DataKind::Reviews, &snapshot.reviews),
        (DataKind::Testimonials, &snapshot.testimonials),
    ] {
        let status = match loaded {
            Ok(t) => format!("{} rows, {} columns", t.len(), t.headers.len()),
            Err(e) => e.to_string(),
        };
        rows.push(vec![
            kind.to_string(),
            store::path(data_dir, kind).display().to_string(),
            status,
        ]);
    }
    body.push_str(&render::table(&["data", "file", "status"], &rows));
    render::page("Overview", Nav::Overview, &body)
}

pub fn products(snapshot: &Snapshot) -> String {
    let body = match &snapshot.products {
        Err(e) => load_error(e),
        Ok(t) => {
            let s = stats::product_stats(t);
            let mut body = render::metrics(&[
                ("Total products", s.total.to_string()),
                ("With price", s.priced.to_string()),
                ("Average price", render::fmt_opt(s.average_price, 2)),
            ]);
            body.push_str("<h2>By category</h2>");
            body.push_str(&render::bar_chart(&s.by_category, ACCENT));
            body.push_str("<h2>Catalog</h2>");
            body.push_str(&render::table(&t.headers, &t.rows));
            body
        }
    };
    render::page("Product catalog", Nav::Products, &body)
}

pub fn testimonials(snapshot: &Snapshot) -> String {
    let body = match &snapshot.testimonials {
        Err(e) => load_error(e),
        Ok(t) => {
            let s = stats::rating_stats(t);
            let mut items = vec![("Testimonials", s.total.to_string())];
            if t.column_any(&["rating", "stars"]).is_some() {
                items.push(("Average customer rating", format!("{} ★", render::fmt_opt(s.average, 2))));
            }
            let mut body = render::metrics(&items);
            body.push_str("<h2>Ratings</h2>");
            body.push_str(&render::bar_chart(&star_bars(&s.histogram), ACCENT));
            body.push_str("<h2>All testimonials</h2>");
            body.push_str(&render::table(&t.headers, &t.rows));
            body
        }
    };
    render::page("Customer testimonials", Nav::Testimonials, &body)
}

fn star_bars(histogram: &[usize; 5]) -> Vec<(String, usize)> {
    histogram
        .iter()
        .enumerate()
        .map(|(i, n)| (format!("{} ★", i + 1), *n))
        .collect()
}

pub fn reviews(
    snapshot: &Snapshot,
    analyzer: &SentimentAnalyzer,
    query: &ReviewsQuery,
    default_year: i32,
) -> String {
    let year = query.year(default_year);
    let month = query.month();

    let table = match &snapshot.reviews {
        Ok(t) => t,
        Err(e) => return render::page("Reviews & sentiment", Nav::Reviews, &load_error(e)),
    };

    let index = snapshot.product_index();
    let scored = stats::score_reviews(table, &index, analyzer);
    let filtered = stats::filter_period(&scored, year, month);

    let mut body = render::month_selector(year, month);
    if let Err(e) = &snapshot.products {
        body.push_str(&render::alert(
            Alert::Warning,
            &format!("Product details unavailable ({}); showing unknown.", e),
        ));
    }

    let period = match month {
        Some(m) => format!("{} {}", render::MONTHS[m as usize - 1], year),
        None => "all months".to_string(),
    };
    body.push_str(&render::alert(
        Alert::Info,
        &format!("Found {} reviews for {}.", filtered.len(), period),
    ));

    if filtered.is_empty() {
        body.push_str(&render::alert(
            Alert::Warning,
            "No reviews available for this period to analyze.",
        ));
        body.push_str("<h2>Reviews per month</h2>");
        body.push_str(&render::bar_chart(&stats::by_month(&scored), ACCENT));
        return render::page("Reviews & sentiment", Nav::Reviews, &body);
    }

    let summary = stats::sentiment_summary(&filtered);
    let ratings: Vec<f64> = filtered.iter().filter_map(|r| r.rating).collect();
    let avg_rating = if ratings.is_empty() {
        None
    } else {
        Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
    };
    let positive_share = Some(summary.count(Label::Positive) as f64 / summary.total as f64);

    body.push_str(&render::metrics(&[
        ("Reviews", summary.total.to_string()),
        ("Average rating", render::fmt_opt(avg_rating, 2)),
        ("Positive share", render::fmt_percent(positive_share)),
        ("Avg. confidence", render::fmt_percent(summary.average_confidence)),
    ]));

    let dist: Vec<(String, usize)> = summary
        .counts
        .iter()
        .map(|(l, n)| (l.to_string(), *n))
        .collect();
    body.push_str("<div class=\"cols\"><div><h2>Sentiment distribution</h2>");
    body.push_str(&render::bar_chart(&dist, ACCENT));
    body.push_str("</div><div><h2>Reviews per month</h2>");
    body.push_str(&render::bar_chart(&stats::by_month(&scored), "#1c4e80"));
    body.push_str("</div></div>");

    let rows: Vec<Vec<String>> = filtered
        .iter()
        .map(|r| {
            vec![
                r.date.map(|d| d.to_string()).unwrap_or_default(),
                r.product_name.clone(),
                r.product_price.clone(),
                render::fmt_opt(r.rating, 0),
                r.sentiment.label.to_string(),
                format!("{:.2}", r.sentiment.confidence),
                r.text.clone(),
            ]
        })
        .collect();
    body.push_str("<h2>Detailed results</h2>");
    body.push_str(&render::table(
        &["date", "product", "price", "rating", "sentiment", "confidence", "text"],
        &rows,
    ));

    body.push_str("<h2>Word cloud</h2>");
    let words = stats::word_frequencies(filtered.iter().map(|r| r.text.as_str()), CLOUD_WORDS);
    body.push_str(&render::word_cloud(&words));

    render::page("Reviews & sentiment", Nav::Reviews, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(month: Option<&str>, year: Option<&str>) -> ReviewsQuery {
        ReviewsQuery {
            month: month.map(str::to_string),
            year: year.map(str::to_string),
        }
    }

    #[test]
    fn query_parsing_is_lenient() {
        assert_eq!(query(Some("3"), None).month(), Some(3));
        assert_eq!(query(Some(""), None).month(), None);
        assert_eq!(query(Some("13"), None).month(), None);
        assert_eq!(query(None, Some("2024")).year(2023), 2024);
        assert_eq!(query(None, Some("abc")).year(2023), 2023);
    }

    #[test]
    fn stars_histogram_labels() {
        let bars = star_bars(&[0, 1, 0, 2, 5]);
        assert_eq!(bars[0], ("1 ★".to_string(), 0));
        assert_eq!(bars[4], ("5 ★".to_string(), 5));
    }

    #[test]
    fn missing_files_show_hint() {
        let tmp = tempfile::TempDir::new().unwrap();
        let snapshot = Snapshot::load(tmp.path());
        let html = products(&snapshot);
        assert!(html.contains("File not found"));
        assert!(html.contains("Run the collector first."));
        let html = reviews(&snapshot, &SentimentAnalyzer::new(), &ReviewsQuery::default(), 2023);
        assert!(html.contains("File not found"));
    }
}
