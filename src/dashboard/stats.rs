use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;

use super::sentiment::{Label, SentimentAnalyzer, SentimentScore};
use crate::store::{Row, Table};

pub const UNKNOWN: &str = "unknown";

static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had",
    "her", "was", "one", "our", "out", "has", "him", "his", "how", "its", "may",
    "new", "now", "own", "she", "too", "use", "way", "who", "did", "get", "got",
    "this", "that", "with", "have", "from", "they", "will", "would", "there",
    "their", "what", "about", "which", "when", "were", "been", "than", "them",
    "then", "these", "some", "just", "also", "very", "into", "more", "only",
    "it's", "i'm", "i've", "really", "much", "even", "after", "before", "could",
    "should", "because", "while", "your", "yours", "ours", "over", "other",
];

// ── Products ──

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductStats {
    pub total: usize,
    pub priced: usize,
    pub average_price: Option<f64>,
    pub by_category: Vec<(String, usize)>,
}

pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', "");
    PRICE_RE.find(&cleaned)?.as_str().parse().ok()
}

pub fn product_stats(products: &Table) -> ProductStats {
    let prices: Vec<f64> = products
        .records()
        .filter_map(|r| r.get("price").and_then(parse_price))
        .collect();

    let mut categories: BTreeMap<String, usize> = BTreeMap::new();
    for r in products.records() {
        let c = r.get("category").unwrap_or("uncategorized");
        *categories.entry(c.to_string()).or_default() += 1;
    }

    ProductStats {
        total: products.len(),
        priced: prices.len(),
        average_price: mean(&prices),
        by_category: categories.into_iter().collect(),
    }
}

/// Product name and price by product id, for joining reviews at display
/// time. Missing files, columns or ids all resolve to `unknown`.
#[derive(Default)]
pub struct ProductIndex {
    by_id: HashMap<String, (String, String)>,
}

impl ProductIndex {
    pub fn build(products: Option<&Table>) -> Self {
        let mut by_id = HashMap::new();
        for r in products.into_iter().flat_map(|t| t.records()) {
            let Some(id) = r.get("id") else { continue };
            let name = r.get("name").unwrap_or(UNKNOWN).to_string();
            let price = r.get("price").unwrap_or(UNKNOWN).to_string();
            by_id.entry(id.to_string()).or_insert((name, price));
        }
        Self { by_id }
    }

    pub fn lookup(&self, id: Option<&str>) -> (String, String) {
        id.and_then(|id| self.by_id.get(id))
            .cloned()
            .unwrap_or_else(|| (UNKNOWN.to_string(), UNKNOWN.to_string()))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

// ── Ratings ──

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingStats {
    pub total: usize,
    pub rated: usize,
    pub average: Option<f64>,
    /// Counts of ratings rounded to 1..=5. Unrated (0 star) rows are left
    /// out.
    pub histogram: [usize; 5],
}

fn rating_of(r: &Row) -> Option<f64> {
    r.get_any(&["rating", "stars"])?
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
}

pub fn rating_stats(table: &Table) -> RatingStats {
    let ratings: Vec<f64> = table.records().filter_map(|r| rating_of(&r)).collect();
    RatingStats {
        total: table.len(),
        rated: ratings.len(),
        average: mean(&ratings),
        histogram: histogram(ratings.iter().copied()),
    }
}

fn histogram(ratings: impl Iterator<Item = f64>) -> [usize; 5] {
    let mut h = [0usize; 5];
    for r in ratings.filter(|r| *r >= 0.5) {
        let bucket = r.round().clamp(1.0, 5.0) as usize;
        h[bucket - 1] += 1;
    }
    h
}

// ── Reviews ──

#[derive(Debug, Clone, Serialize)]
pub struct ScoredReview {
    pub id: String,
    pub date: Option<NaiveDate>,
    pub rating: Option<f64>,
    pub text: String,
    pub product_name: String,
    pub product_price: String,
    pub sentiment: SentimentScore,
}

/// Accepts `YYYY-MM-DD` with or without a trailing time part.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Score every review row, in file order.
pub fn score_reviews(
    reviews: &Table,
    products: &ProductIndex,
    analyzer: &SentimentAnalyzer,
) -> Vec<ScoredReview> {
    let rows: Vec<Row> = reviews.records().collect();
    rows.par_iter()
        .enumerate()
        .map(|(i, r)| {
            let text = r.get_any(&["text", "review"]).unwrap_or("").to_string();
            let (product_name, product_price) = products.lookup(r.get("product_id"));
            ScoredReview {
                id: r.get("id").map(str::to_string).unwrap_or_else(|| (i + 1).to_string()),
                date: r.get("date").and_then(parse_date),
                rating: rating_of(r),
                sentiment: analyzer.score(&text),
                text,
                product_name,
                product_price,
            }
        })
        .collect()
}

/// Reviews dated in `month` of `year`, or all reviews when no month is
/// selected.
pub fn filter_period(reviews: &[ScoredReview], year: i32, month: Option<u32>) -> Vec<&ScoredReview> {
    match month {
        None => reviews.iter().collect(),
        Some(m) => reviews
            .iter()
            .filter(|r| r.date.is_some_and(|d| d.year() == year && d.month() == m))
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentSummary {
    pub total: usize,
    pub counts: Vec<(Label, usize)>,
    pub average_confidence: Option<f64>,
    pub average_compound: Option<f64>,
}

impl SentimentSummary {
    pub fn count(&self, label: Label) -> usize {
        self.counts
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

pub fn sentiment_summary(reviews: &[&ScoredReview]) -> SentimentSummary {
    let counts = Label::ALL
        .iter()
        .map(|&l| (l, reviews.iter().filter(|r| r.sentiment.label == l).count()))
        .collect();
    let confidences: Vec<f64> = reviews.iter().map(|r| r.sentiment.confidence).collect();
    let compounds: Vec<f64> = reviews.iter().map(|r| r.sentiment.compound).collect();
    SentimentSummary {
        total: reviews.len(),
        counts,
        average_confidence: mean(&confidences),
        average_compound: mean(&compounds),
    }
}

/// Review counts per `YYYY-MM`, oldest first, with undated reviews last.
pub fn by_month(reviews: &[ScoredReview]) -> Vec<(String, usize)> {
    let mut months: BTreeMap<String, usize> = BTreeMap::new();
    let mut undated = 0;
    for r in reviews {
        match r.date {
            Some(d) => *months.entry(d.format("%Y-%m").to_string()).or_default() += 1,
            None => undated += 1,
        }
    }
    let mut out: Vec<(String, usize)> = months.into_iter().collect();
    if undated > 0 {
        out.push(("undated".to_string(), undated));
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewStats {
    pub total: usize,
    pub ratings: RatingStats,
    pub sentiment: SentimentSummary,
    pub by_month: Vec<(String, usize)>,
}

pub fn review_stats(table: &Table, scored: &[ScoredReview]) -> ReviewStats {
    let all: Vec<&ScoredReview> = scored.iter().collect();
    ReviewStats {
        total: table.len(),
        ratings: rating_stats(table),
        sentiment: sentiment_summary(&all),
        by_month: by_month(scored),
    }
}

// ── Words ──

/// Lowercased word tokens; apostrophes stay inside words so "didn't" is one
/// token.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\'').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Most frequent words across `texts`, ignoring stopwords, numbers and
/// words shorter than three characters. Ties sort alphabetically.
pub fn word_frequencies<'a>(texts: impl Iterator<Item = &'a str>, top: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for text in texts {
        for tok in tokenize(text) {
            if tok.chars().count() < 3
                || tok.chars().all(|c| c.is_ascii_digit())
                || STOPWORDS.contains(&tok.as_str())
            {
                continue;
            }
            *counts.entry(tok).or_default() += 1;
        }
    }
    let mut words: Vec<(String, usize)> = counts.into_iter().collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    words.truncate(top);
    words
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    fn reviews() -> Table {
        table(
            &["id", "product_id", "date", "rating", "text"],
            &[
                &["r1", "1", "2023-01-05", "5", "Great chocolate, love it"],
                &["r2", "2", "2023-01-20", "1", "Terrible potion, it leaked"],
                &["r3", "", "2023-02-11", "4", "Nice and fresh"],
                &["r4", "9", "", "", "The box arrived"],
            ],
        )
    }

    #[test]
    fn prices_and_categories() {
        let t = table(
            &["id", "name", "price", "category"],
            &[
                &["1", "Candy", "24.99", "consumables"],
                &["2", "Potion", "$5", "consumables"],
                &["3", "Shirt", "", ""],
            ],
        );
        let s = product_stats(&t);
        assert_eq!(s.total, 3);
        assert_eq!(s.priced, 2);
        assert!((s.average_price.unwrap() - 14.995).abs() < 1e-9);
        assert_eq!(
            s.by_category,
            vec![("consumables".to_string(), 2), ("uncategorized".to_string(), 1)]
        );
    }

    #[test]
    fn price_parsing() {
        assert_eq!(parse_price("24.99"), Some(24.99));
        assert_eq!(parse_price("$1,299.00"), Some(1299.0));
        assert_eq!(parse_price("free"), None);
    }

    #[test]
    fn ratings_accept_stars_column() {
        let t = table(&["text", "stars"], &[&["a", "5"], &["b", "3"], &["c", "x"]]);
        let s = rating_stats(&t);
        assert_eq!(s.total, 3);
        assert_eq!(s.rated, 2);
        assert_eq!(s.average, Some(4.0));
        assert_eq!(s.histogram, [0, 0, 1, 0, 1]);
    }

    #[test]
    fn non_finite_ratings_are_ignored() {
        let t = table(&["id", "rating"], &[&["1", "NaN"], &["2", "inf"], &["3", "-inf"], &["4", "4"]]);
        let s = rating_stats(&t);
        assert_eq!(s.total, 4);
        assert_eq!(s.rated, 1);
        assert_eq!(s.average, Some(4.0));
        assert_eq!(s.histogram, [0, 0, 0, 1, 0]);
    }

    #[test]
    fn zero_star_rows_stay_out_of_the_histogram() {
        let t = table(&["id", "rating"], &[&["1", "0"], &["2", "1"], &["3", "5"]]);
        let s = rating_stats(&t);
        assert_eq!(s.rated, 3);
        assert_eq!(s.average, Some(2.0));
        assert_eq!(s.histogram, [1, 0, 0, 0, 1]);
    }

    #[test]
    fn join_without_price_column_is_unknown() {
        let products = table(&["id", "name"], &[&["1", "Candy"]]);
        let index = ProductIndex::build(Some(&products));
        assert_eq!(index.lookup(Some("1")), ("Candy".to_string(), UNKNOWN.to_string()));
        assert_eq!(index.lookup(Some("2")), (UNKNOWN.to_string(), UNKNOWN.to_string()));
        assert_eq!(index.lookup(None), (UNKNOWN.to_string(), UNKNOWN.to_string()));

        let none = ProductIndex::build(None);
        assert!(none.is_empty());
    }

    #[test]
    fn scored_reviews_keep_order_and_join() {
        let products = table(&["id", "name", "price"], &[&["1", "Candy", "24.99"]]);
        let index = ProductIndex::build(Some(&products));
        let scored = score_reviews(&reviews(), &index, &SentimentAnalyzer::new());
        let ids: Vec<&str> = scored.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2", "r3", "r4"]);
        assert_eq!(scored[0].product_name, "Candy");
        assert_eq!(scored[0].product_price, "24.99");
        assert_eq!(scored[1].product_price, UNKNOWN);
        assert_eq!(scored[0].sentiment.label, Label::Positive);
        assert_eq!(scored[1].sentiment.label, Label::Negative);
        assert_eq!(scored[3].date, None);
        assert_eq!(scored[3].rating, None);
    }

    #[test]
    fn month_filter() {
        let scored = score_reviews(&reviews(), &ProductIndex::default(), &SentimentAnalyzer::new());
        assert_eq!(filter_period(&scored, 2023, Some(1)).len(), 2);
        assert_eq!(filter_period(&scored, 2023, Some(2)).len(), 1);
        assert_eq!(filter_period(&scored, 2024, Some(1)).len(), 0);
        assert_eq!(filter_period(&scored, 2023, None).len(), 4);
    }

    #[test]
    fn review_totals_match_rows() {
        let t = reviews();
        let scored = score_reviews(&t, &ProductIndex::default(), &SentimentAnalyzer::new());
        let s = review_stats(&t, &scored);
        assert_eq!(s.total, t.len());
        assert_eq!(s.sentiment.total, t.len());
        let labelled: usize = s.sentiment.counts.iter().map(|(_, n)| n).sum();
        assert_eq!(labelled, t.len());
        assert_eq!(s.ratings.rated, 3);
        assert_eq!(
            s.by_month,
            vec![
                ("2023-01".to_string(), 2),
                ("2023-02".to_string(), 1),
                ("undated".to_string(), 1)
            ]
        );
    }

    #[test]
    fn empty_reviews_give_zero_aggregates() {
        let t = table(&["id", "product_id", "date", "rating", "text"], &[]);
        let scored = score_reviews(&t, &ProductIndex::default(), &SentimentAnalyzer::new());
        let s = review_stats(&t, &scored);
        assert_eq!(s.total, 0);
        assert_eq!(s.ratings.average, None);
        assert_eq!(s.sentiment.average_confidence, None);
        assert_eq!(s.sentiment.count(Label::Positive), 0);
        assert!(s.by_month.is_empty());
    }

    #[test]
    fn dates_with_time_parts() {
        assert_eq!(parse_date("2023-03-04"), NaiveDate::from_ymd_opt(2023, 3, 4));
        assert_eq!(parse_date("2023-03-04T10:00:00"), NaiveDate::from_ymd_opt(2023, 3, 4));
        assert_eq!(parse_date("March"), None);
    }

    #[test]
    fn top_words() {
        let texts = ["The potion tastes great", "Great potion, great price", "ok 2023"];
        let words = word_frequencies(texts.iter().copied(), 2);
        assert_eq!(words, vec![("great".to_string(), 3), ("potion".to_string(), 2)]);
    }

    #[test]
    fn tokenizer_keeps_contractions() {
        assert_eq!(tokenize("Didn't LOVE it, 'really'."), vec!["didn't", "love", "it", "really"]);
    }
}
