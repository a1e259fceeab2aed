pub mod pages;
pub mod render;
pub mod sentiment;
pub mod server;
pub mod stats;

use std::path::Path;

use serde::Serialize;

use crate::records::DataKind;
use crate::store::{self, StoreError, Table};
use sentiment::SentimentAnalyzer;
use stats::{ProductIndex, ProductStats, RatingStats, ReviewStats};

/// The three files as they are on disk right now. Each one loads or fails
/// on its own.
pub struct Snapshot {
    pub products: Result<Table, StoreError>,
    pub reviews: Result<Table, StoreError>,
    pub testimonials: Result<Table, StoreError>,
}

impl Snapshot {
    pub fn load(data_dir: &Path) -> Self {
        Self {
            products: store::load(data_dir, DataKind::Products),
            reviews: store::load(data_dir, DataKind::Reviews),
            testimonials: store::load(data_dir, DataKind::Testimonials),
        }
    }

    pub fn product_index(&self) -> ProductIndex {
        ProductIndex::build(self.products.as_ref().ok())
    }
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub products: Option<ProductStats>,
    pub reviews: Option<ReviewStats>,
    pub testimonials: Option<RatingStats>,
    pub errors: Vec<String>,
}

pub fn summarize(snapshot: &Snapshot, analyzer: &SentimentAnalyzer) -> Summary {
    let mut errors = Vec::new();

    let products = match &snapshot.products {
        Ok(t) => Some(stats::product_stats(t)),
        Err(e) => {
            errors.push(e.to_string());
            None
        }
    };
    let reviews = match &snapshot.reviews {
        Ok(t) => {
            let scored = stats::score_reviews(t, &snapshot.product_index(), analyzer);
            Some(stats::review_stats(t, &scored))
        }
        Err(e) => {
            errors.push(e.to_string());
            None
        }
    };
    let testimonials = match &snapshot.testimonials {
        Ok(t) => Some(stats::rating_stats(t)),
        Err(e) => {
            errors.push(e.to_string());
            None
        }
    };

    Summary {
        products,
        reviews,
        testimonials,
        errors,
    }
}

impl Summary {
    /// Plain-text version for the terminal.
    pub fn print(&self) {
        match &self.products {
            Some(p) => {
                println!("Products:      {}", p.total);
                println!("  priced:      {}", p.priced);
                println!("  avg price:   {}", render::fmt_opt(p.average_price, 2));
                for (c, n) in &p.by_category {
                    println!("  {:<12} {}", crate::util::truncate(c, 12), n);
                }
            }
            None => println!("Products:      -"),
        }
        match &self.reviews {
            Some(r) => {
                println!("Reviews:       {}", r.total);
                println!("  avg rating:  {}", render::fmt_opt(r.ratings.average, 2));
                for (label, n) in &r.sentiment.counts {
                    println!("  {:<12} {}", label.as_str(), n);
                }
                println!(
                    "  confidence:  {}",
                    render::fmt_percent(r.sentiment.average_confidence)
                );
            }
            None => println!("Reviews:       -"),
        }
        match &self.testimonials {
            Some(t) => {
                println!("Testimonials:  {}", t.total);
                println!("  avg rating:  {}", render::fmt_opt(t.average, 2));
            }
            None => println!("Testimonials:  -"),
        }
        for e in &self.errors {
            println!("! {}", e);
        }
    }
}
