use std::collections::HashSet;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

use super::client::SiteClient;
use crate::records::Product;
use crate::settings::Settings;
use crate::util::squash_whitespace;

static CARD_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.row.product").unwrap());
static NAME_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".description h3 a").unwrap());
static PRICE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".price-wrap .price").unwrap());
static DESC_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".short-description").unwrap());
static IMG_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());
static PAGING_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.paging a").unwrap());
static CATEGORY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href*="category="]"#).unwrap());
static PRODUCT_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/product/(\d+)").unwrap());

/// One parsed listing page.
pub struct Listing {
    pub products: Vec<Product>,
    pub next: Option<Url>,
    pub categories: Vec<String>,
}

/// Parse a `/products` page. Cards missing a name link or a price are
/// skipped; relative links are resolved against `page_url`.
pub fn parse_listing(html: &str, page_url: &Url, category: &str) -> Listing {
    let doc = Html::parse_document(html);

    let mut products = Vec::new();
    for card in doc.select(&CARD_SEL) {
        match parse_card(card, page_url, category) {
            Some(p) => products.push(p),
            None => warn!(page = %page_url, "skipping product card without name or price"),
        }
    }

    let next = doc
        .select(&PAGING_SEL)
        .find(|a| {
            let text = text_of(*a);
            text.contains('>') || text.contains("Next")
        })
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| SiteClient::resolve(page_url, href).ok());

    let mut categories: Vec<String> = Vec::new();
    for a in doc.select(&CATEGORY_SEL) {
        let Some(url) = a
            .value()
            .attr("href")
            .and_then(|href| SiteClient::resolve(page_url, href).ok())
        else {
            continue;
        };
        let found = url
            .query_pairs()
            .find(|(k, _)| k == "category")
            .map(|(_, v)| v.trim().to_string());
        if let Some(c) = found.filter(|c| !c.is_empty()) {
            if !categories.contains(&c) {
                categories.push(c);
            }
        }
    }

    Listing {
        products,
        next,
        categories,
    }
}

fn parse_card(card: ElementRef, page_url: &Url, category: &str) -> Option<Product> {
    let link = card.select(&NAME_SEL).next()?;
    let name = text_of(link);
    let href = link.value().attr("href")?;
    let price = card.select(&PRICE_SEL).next().map(text_of)?;
    if name.is_empty() || price.is_empty() {
        return None;
    }

    let url = SiteClient::resolve(page_url, href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string());
    let id = PRODUCT_ID_RE
        .captures(&url)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| url.clone());
    let description = card.select(&DESC_SEL).next().map(text_of).unwrap_or_default();
    let image = card
        .select(&IMG_SEL)
        .next()
        .and_then(|img| img.value().attr("src"))
        .and_then(|src| SiteClient::resolve(page_url, src).ok())
        .map(|u| u.to_string())
        .unwrap_or_default();

    Some(Product {
        id,
        name,
        price,
        category: category.to_string(),
        description,
        url,
        image,
    })
}

fn text_of(el: ElementRef) -> String {
    squash_whitespace(&el.text().collect::<String>())
}

// ── Crawling ──

struct Crawl {
    seen_ids: HashSet<String>,
    seen_urls: HashSet<String>,
    products: Vec<Product>,
}

impl Crawl {
    fn absorb(&mut self, products: Vec<Product>) {
        for p in products {
            if self.seen_ids.insert(p.id.clone()) {
                self.products.push(p);
            }
        }
    }

    /// Follow "next" links from `next` until a page is empty, has no next
    /// link, repeats, or `max_pages` is reached.
    async fn follow(
        &mut self,
        client: &SiteClient,
        settings: &Settings,
        mut next: Option<Url>,
        category: &str,
        mut pages: usize,
        pb: &ProgressBar,
    ) -> Result<()> {
        while let Some(url) = next.take() {
            if pages >= settings.max_pages {
                warn!(max_pages = settings.max_pages, "stopping product pagination at page limit");
                break;
            }
            if !self.seen_urls.insert(url.to_string()) {
                warn!(url = %url, "listing page already visited, stopping");
                break;
            }

            client.pause().await;
            let html = client
                .get_html(&url)
                .await
                .with_context(|| format!("Failed to fetch product page {}", url))?;
            let listing = parse_listing(&html, &url, category);
            pages += 1;
            info!(url = %url, found = listing.products.len(), "product page");

            if listing.products.is_empty() {
                break;
            }
            self.absorb(listing.products);
            pb.set_message(format!("products: {} rows, {} pages", self.products.len(), pages));
            next = listing.next;
        }
        Ok(())
    }
}

/// Crawl the product listing (per category when the listing links to
/// category filters) and return products unique by id.
pub async fn collect(client: &SiteClient, settings: &Settings, pb: &ProgressBar) -> Result<Vec<Product>> {
    let start = client.endpoint("/products")?;
    let html = client
        .get_html(&start)
        .await
        .with_context(|| format!("Failed to fetch product page {}", start))?;
    let first = parse_listing(&html, &start, "");

    let mut crawl = Crawl {
        seen_ids: HashSet::new(),
        seen_urls: HashSet::new(),
        products: Vec::new(),
    };

    if settings.discover_categories && !first.categories.is_empty() {
        info!(categories = ?first.categories, "crawling products per category");
        for category in &first.categories {
            let mut url = start.clone();
            url.query_pairs_mut().append_pair("category", category);
            crawl
                .follow(client, settings, Some(url), category, 0, pb)
                .await?;
        }
    } else {
        info!(url = %start, found = first.products.len(), "product page");
        crawl.seen_urls.insert(start.to_string());
        let found_any = !first.products.is_empty();
        crawl.absorb(first.products);
        if found_any {
            crawl
                .follow(client, settings, first.next, "", 1, pb)
                .await?;
        }
    }

    Ok(crawl.products)
}
