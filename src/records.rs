use std::fmt;

use serde::Serialize;

/// The three data kinds the collector produces, one CSV file each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum DataKind {
    Products,
    Reviews,
    Testimonials,
}

impl DataKind {
    pub const ALL: [DataKind; 3] = [DataKind::Products, DataKind::Reviews, DataKind::Testimonials];

    pub fn file_name(self) -> &'static str {
        match self {
            DataKind::Products => "products.csv",
            DataKind::Reviews => "reviews.csv",
            DataKind::Testimonials => "testimonials.csv",
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            DataKind::Products => Product::COLUMNS,
            DataKind::Reviews => Review::COLUMNS,
            DataKind::Testimonials => Testimonial::COLUMNS,
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataKind::Products => "products",
            DataKind::Reviews => "reviews",
            DataKind::Testimonials => "testimonials",
        };
        f.write_str(s)
    }
}

/// A row type with a fixed CSV header. `COLUMNS` must list the struct's
/// fields in declaration order.
pub trait Record: Serialize {
    const KIND: DataKind;
    const COLUMNS: &'static [&'static str];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: String,
    pub category: String,
    pub description: String,
    pub url: String,
    pub image: String,
}

impl Record for Product {
    const KIND: DataKind = DataKind::Products;
    const COLUMNS: &'static [&'static str] =
        &["id", "name", "price", "category", "description", "url", "image"];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    pub id: String,
    pub product_id: Option<String>,
    pub date: Option<String>,
    pub rating: Option<u8>,
    pub text: String,
}

impl Record for Review {
    const KIND: DataKind = DataKind::Reviews;
    const COLUMNS: &'static [&'static str] = &["id", "product_id", "date", "rating", "text"];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Testimonial {
    pub id: String,
    pub author: String,
    pub rating: u8,
    pub text: String,
}

impl Record for Testimonial {
    const KIND: DataKind = DataKind::Testimonials;
    const COLUMNS: &'static [&'static str] = &["id", "author", "rating", "text"];
}
