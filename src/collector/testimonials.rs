use std::sync::LazyLock;

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::{info, warn};

use super::client::SiteClient;
use crate::records::Testimonial;
use crate::settings::Settings;
use crate::util::squash_whitespace;

static ITEM_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.testimonial").unwrap());
static TEXT_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p.text").unwrap());
static RATING_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span.rating").unwrap());
static STAR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("svg").unwrap());
static IDENTICON_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("identicon-svg").unwrap());
static AUTHOR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".author").unwrap());

/// Parse an HTMX fragment. `offset` is the number of testimonials already
/// collected, used for positional ids.
pub fn parse_fragment(html: &str, offset: usize) -> Vec<Testimonial> {
    let doc = Html::parse_fragment(html);
    doc.select(&ITEM_SEL)
        .enumerate()
        .map(|(i, item)| parse_item(item, offset + i + 1))
        .collect()
}

fn parse_item(item: ElementRef, position: usize) -> Testimonial {
    let text = item
        .select(&TEXT_SEL)
        .next()
        .map(|el| squash_whitespace(&el.text().collect::<String>()))
        .unwrap_or_default();

    // One svg star per rating point
    let rating = item
        .select(&RATING_SEL)
        .next()
        .map(|el| el.select(&STAR_SEL).count())
        .unwrap_or(0);

    let author = item
        .select(&IDENTICON_SEL)
        .next()
        .and_then(|el| el.value().attr("username"))
        .map(str::to_string)
        .or_else(|| {
            item.select(&AUTHOR_SEL)
                .next()
                .map(|el| squash_whitespace(&el.text().collect::<String>()))
        })
        .unwrap_or_default();

    let id = item
        .value()
        .attr("id")
        .or_else(|| item.value().attr("data-id"))
        .map(str::to_string)
        .unwrap_or_else(|| position.to_string());

    Testimonial {
        id,
        author,
        rating: rating.min(u8::MAX as usize) as u8,
        text,
    }
}

/// Parse a JSON page: either a bare list or `{"data": [...]}`.
pub fn parse_json(body: &str, offset: usize) -> Result<Vec<Testimonial>> {
    let value: Value = serde_json::from_str(body).context("Invalid testimonials JSON")?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    let rows = items
        .iter()
        .enumerate()
        .map(|(i, item)| Testimonial {
            id: scalar(item.get("id")).unwrap_or_else(|| (offset + i + 1).to_string()),
            author: scalar(item.get("author")).unwrap_or_default(),
            rating: item
                .get("rating")
                .or_else(|| item.get("stars"))
                .and_then(Value::as_u64)
                .map(|r| r.min(u8::MAX as u64) as u8)
                .unwrap_or(0),
            text: scalar(item.get("text")).unwrap_or_default(),
        })
        .collect();
    Ok(rows)
}

fn scalar(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Page through the testimonials endpoint until it refuses a page or
/// returns an empty one.
pub async fn collect(client: &SiteClient, settings: &Settings, pb: &ProgressBar) -> Result<Vec<Testimonial>> {
    let referer = client.endpoint("/testimonials")?;
    let mut rows: Vec<Testimonial> = Vec::new();
    let mut page = 1usize;

    loop {
        if page > settings.max_pages {
            warn!(max_pages = settings.max_pages, "stopping testimonial pagination at page limit");
            break;
        }
        if page > 1 {
            client.pause().await;
        }

        let mut url = client.endpoint("/api/testimonials")?;
        url.query_pairs_mut().append_pair("page", &page.to_string());

        let fragment = client
            .get_fragment(&url, &referer)
            .await
            .with_context(|| format!("Failed to fetch testimonials page {}", page))?;
        let Some(fragment) = fragment else {
            info!(page, "testimonials endpoint refused page, stopping");
            break;
        };

        let found = if fragment.is_json {
            parse_json(&fragment.body, rows.len())?
        } else {
            parse_fragment(&fragment.body, rows.len())
        };
        if found.is_empty() {
            info!(page, "no testimonials on page, stopping");
            break;
        }

        info!(page, found = found.len(), "testimonials page");
        rows.extend(found);
        pb.set_message(format!("testimonials: {} rows, {} pages", rows.len(), page));
        page += 1;
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    #[test]
    fn counts_star_icons() {
        let rows = parse_fragment(&fixture("testimonials_page1"), 0);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].rating, 5);
        assert_eq!(rows[1].rating, 3);
        assert_eq!(rows[2].rating, 0);
    }

    #[test]
    fn text_author_and_ids() {
        let rows = parse_fragment(&fixture("testimonials_page1"), 0);
        assert_eq!(rows[0].text, "We've been using this utility for years - awesome service!");
        assert_eq!(rows[0].author, "testimonial-1");
        assert_eq!(rows[0].id, "1");
        assert_eq!(rows[2].id, "t-3");
        assert_eq!(rows[2].author, "");
    }

    #[test]
    fn positional_ids_continue_across_pages() {
        let rows = parse_fragment(&fixture("testimonials_page2"), 3);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "4");
        assert_eq!(rows[0].author, "Dana");
        assert_eq!(rows[0].rating, 4);
    }

    #[test]
    fn empty_fragment() {
        assert!(parse_fragment("<p>nothing here</p>", 0).is_empty());
    }

    #[test]
    fn json_list_and_data_object() {
        let rows = parse_json(r#"[{"text": "Great", "rating": 5}, {"text": "Meh", "stars": 2, "id": 9}]"#, 0).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "1");
        assert_eq!(rows[1].rating, 2);
        assert_eq!(rows[1].id, "9");

        let rows = parse_json(r#"{"data": [{"text": "Fine", "rating": 4, "author": "sam"}]}"#, 10).unwrap();
        assert_eq!(rows[0].id, "11");
        assert_eq!(rows[0].author, "sam");

        assert!(parse_json(r#"{"data": []}"#, 0).unwrap().is_empty());
        assert!(parse_json("not json", 0).is_err());
    }
}
