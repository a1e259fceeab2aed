use anyhow::{Context, Result};
use indicatif::ProgressBar;
use serde::Deserialize;
use tracing::{info, warn};

use super::client::SiteClient;
use crate::records::Review;
use crate::settings::Settings;

const REVIEWS_QUERY: &str = r#"
query GetReviews($first: Int, $after: String) {
  reviews(first: $first, after: $after) {
    edges {
      node {
        rid
        text
        rating
        date
      }
      cursor
    }
    pageInfo {
      endCursor
      hasNextPage
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
pub struct ReviewsData {
    pub reviews: Option<Connection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Connection {
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(rename = "pageInfo", default)]
    pub page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
pub struct Edge {
    pub node: Node,
}

#[derive(Debug, Deserialize)]
pub struct Node {
    pub rid: Option<String>,
    pub text: Option<String>,
    pub rating: Option<u8>,
    pub date: Option<String>,
    pub product: Option<ProductRef>,
}

#[derive(Debug, Deserialize)]
pub struct ProductRef {
    pub id: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageInfo {
    #[serde(rename = "endCursor")]
    pub end_cursor: Option<String>,
    #[serde(rename = "hasNextPage", default)]
    pub has_next_page: bool,
}

/// Rows of one connection page plus the cursor to continue from, if the
/// server says there is more.
pub fn flatten(conn: Connection, offset: usize) -> (Vec<Review>, Option<String>) {
    let rows = conn
        .edges
        .into_iter()
        .enumerate()
        .map(|(i, edge)| {
            let node = edge.node;
            let product_id = node
                .product
                .and_then(|p| p.id)
                .and_then(|id| match id {
                    serde_json::Value::String(s) => Some(s),
                    serde_json::Value::Number(n) => Some(n.to_string()),
                    _ => None,
                });
            Review {
                id: node.rid.unwrap_or_else(|| (offset + i + 1).to_string()),
                product_id,
                date: node.date,
                rating: node.rating,
                text: node.text.unwrap_or_default(),
            }
        })
        .collect();

    let next = if conn.page_info.has_next_page {
        conn.page_info.end_cursor
    } else {
        None
    };
    (rows, next)
}

/// Walk the `reviews` connection `page_size` edges at a time.
pub async fn collect(client: &SiteClient, settings: &Settings, pb: &ProgressBar) -> Result<Vec<Review>> {
    let url = client.endpoint("/api/graphql")?;
    let mut reviews: Vec<Review> = Vec::new();
    let mut cursor: Option<String> = None;
    let mut page = 0usize;

    loop {
        if page >= settings.max_pages {
            warn!(max_pages = settings.max_pages, "stopping review pagination at page limit");
            break;
        }
        if page > 0 {
            client.pause().await;
        }
        page += 1;

        let vars = serde_json::json!({ "first": settings.page_size, "after": cursor });
        let data: ReviewsData = client
            .graphql(&url, REVIEWS_QUERY, vars)
            .await
            .with_context(|| format!("Failed to fetch reviews page {}", page))?;

        let conn = data.reviews.unwrap_or_default();
        if conn.edges.is_empty() {
            info!(page, "no reviews in response");
            break;
        }

        let (rows, next) = flatten(conn, reviews.len());
        info!(page, found = rows.len(), "reviews page");
        reviews.extend(rows);
        pb.set_message(format!("reviews: {} rows, {} pages", reviews.len(), page));

        match next {
            Some(c) if cursor.as_deref() != Some(c.as_str()) => cursor = Some(c),
            Some(_) => {
                warn!("end cursor did not advance, stopping");
                break;
            }
            None => break,
        }
    }

    Ok(reviews)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Connection {
        let data: ReviewsData = serde_json::from_str(json).unwrap();
        data.reviews.unwrap()
    }

    #[test]
    fn flattens_edges_and_keeps_cursor() {
        let conn = parse(
            r#"{"reviews": {
                "edges": [
                  {"node": {"rid": "teal-potion-4", "text": "Unique flavor!", "rating": 5, "date": "2023-05-18"}, "cursor": "a"},
                  {"node": {"rid": "red-potion-4", "text": "Too sweet.", "rating": 2, "date": "2023-08-05"}, "cursor": "b"}
                ],
                "pageInfo": {"endCursor": "b", "hasNextPage": true}
            }}"#,
        );
        let (rows, next) = flatten(conn, 0);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "teal-potion-4");
        assert_eq!(rows[0].rating, Some(5));
        assert_eq!(rows[1].date.as_deref(), Some("2023-08-05"));
        assert_eq!(rows[0].product_id, None);
        assert_eq!(next.as_deref(), Some("b"));
    }

    #[test]
    fn last_page_has_no_cursor() {
        let conn = parse(
            r#"{"reviews": {
                "edges": [{"node": {"rid": "x", "text": "ok", "rating": 3, "date": "2023-01-01"}}],
                "pageInfo": {"endCursor": "z", "hasNextPage": false}
            }}"#,
        );
        let (_, next) = flatten(conn, 0);
        assert!(next.is_none());
    }

    #[test]
    fn missing_fields_fall_back() {
        let conn = parse(
            r#"{"reviews": {
                "edges": [{"node": {"text": null, "rating": null, "date": null, "product": {"id": 7}}}],
                "pageInfo": {}
            }}"#,
        );
        let (rows, next) = flatten(conn, 40);
        assert_eq!(rows[0].id, "41");
        assert_eq!(rows[0].text, "");
        assert_eq!(rows[0].rating, None);
        assert_eq!(rows[0].product_id.as_deref(), Some("7"));
        assert!(next.is_none());
    }

    #[test]
    fn null_connection_is_empty() {
        let data: ReviewsData = serde_json::from_str(r#"{"reviews": null}"#).unwrap();
        assert!(data.reviews.unwrap_or_default().edges.is_empty());
    }
}
