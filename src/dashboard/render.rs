//! HTML building blocks for the dashboard pages. Everything is rendered to
//! plain strings; every piece of file content goes through `escape`.

use std::fmt::Write;

pub const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August",
    "September", "October", "November", "December",
];

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; display: flex; color: #262730; }
nav { width: 200px; min-height: 100vh; background: #f0f2f6; padding: 1.5rem 1rem; box-sizing: border-box; }
nav a { display: block; padding: .4rem .6rem; margin-bottom: .2rem; color: #262730; text-decoration: none; border-radius: 4px; }
nav a.active { background: #ff4b4b; color: white; }
main { flex: 1; padding: 1.5rem 2.5rem; max-width: 1200px; }
.metrics { display: flex; gap: 2.5rem; margin: 1rem 0; }
.metric .label { font-size: .85rem; color: #6b6f7b; }
.metric .value { font-size: 2rem; }
.alert { padding: .8rem 1rem; border-radius: 4px; margin: 1rem 0; }
.alert.error { background: #ffe3e3; } .alert.info { background: #e3efff; } .alert.warning { background: #fff6d6; }
table { border-collapse: collapse; font-size: .85rem; width: 100%; }
th, td { border-bottom: 1px solid #e6e9ef; padding: .3rem .5rem; text-align: left; vertical-align: top; }
th { background: #f0f2f6; }
.cloud span { display: inline-block; margin: .15rem .4rem; color: #1c4e80; }
.cols { display: flex; gap: 2rem; } .cols > div { flex: 1; }
.muted { color: #6b6f7b; }
"#;

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Overview,
    Products,
    Testimonials,
    Reviews,
}

impl Nav {
    const ALL: [(Nav, &'static str, &'static str); 4] = [
        (Nav::Overview, "/", "Overview"),
        (Nav::Products, "/products", "Products"),
        (Nav::Testimonials, "/testimonials", "Testimonials"),
        (Nav::Reviews, "/reviews", "Reviews (sentiment)"),
    ];
}

pub fn page(title: &str, active: Nav, body: &str) -> String {
    let mut nav = String::new();
    for (item, href, label) in Nav::ALL {
        let class = if item == active { " class=\"active\"" } else { "" };
        let _ = write!(nav, "<a href=\"{href}\"{class}>{label}</a>");
    }
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>{title} · Shop dashboard</title><style>{STYLE}</style></head>\
         <body><nav><strong>Shop dashboard</strong><br><br>{nav}</nav>\
         <main><h1>{title}</h1>{body}</main></body></html>",
        title = escape(title),
    )
}

pub fn metrics(items: &[(&str, String)]) -> String {
    let mut out = String::from("<div class=\"metrics\">");
    for (label, value) in items {
        let _ = write!(
            out,
            "<div class=\"metric\"><div class=\"label\">{}</div><div class=\"value\">{}</div></div>",
            escape(label),
            escape(value)
        );
    }
    out.push_str("</div>");
    out
}

#[derive(Debug, Clone, Copy)]
pub enum Alert {
    Error,
    Info,
    Warning,
}

pub fn alert(kind: Alert, msg: &str) -> String {
    let class = match kind {
        Alert::Error => "error",
        Alert::Info => "info",
        Alert::Warning => "warning",
    };
    format!("<div class=\"alert {class}\">{}</div>", escape(msg))
}

pub fn table<S: AsRef<str>>(headers: &[S], rows: &[Vec<String>]) -> String {
    if headers.is_empty() {
        return "<p class=\"muted\">No columns.</p>".to_string();
    }
    let mut out = String::from("<table><thead><tr>");
    for h in headers {
        let _ = write!(out, "<th>{}</th>", escape(h.as_ref()));
    }
    out.push_str("</tr></thead><tbody>");
    for row in rows {
        out.push_str("<tr>");
        for cell in row {
            let _ = write!(out, "<td>{}</td>", escape(cell));
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
    if rows.is_empty() {
        out.push_str("<p class=\"muted\">No rows.</p>");
    }
    out
}

/// Horizontal SVG bar chart, one bar per `(label, count)`.
pub fn bar_chart(bars: &[(String, usize)], color: &str) -> String {
    if bars.is_empty() {
        return "<p class=\"muted\">No data.</p>".to_string();
    }
    const LABEL_W: usize = 150;
    const BAR_MAX: usize = 400;
    const ROW_H: usize = 28;

    let max = bars.iter().map(|(_, n)| *n).max().unwrap_or(0).max(1);
    let height = bars.len() * ROW_H + 4;
    let width = LABEL_W + BAR_MAX + 60;

    let mut out = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" role=\"img\">"
    );
    for (i, (label, n)) in bars.iter().enumerate() {
        let y = i * ROW_H + 2;
        let w = n * BAR_MAX / max;
        let _ = write!(
            out,
            "<text x=\"{tx}\" y=\"{ty}\" text-anchor=\"end\" font-size=\"13\">{label}</text>\
             <rect x=\"{LABEL_W}\" y=\"{y}\" width=\"{w}\" height=\"{bh}\" fill=\"{color}\"></rect>\
             <text x=\"{cx}\" y=\"{ty}\" font-size=\"13\">{n}</text>",
            tx = LABEL_W - 8,
            ty = y + 17,
            label = escape(label),
            bh = ROW_H - 6,
            color = escape(color),
            cx = LABEL_W + w + 6,
        );
    }
    out.push_str("</svg>");
    out
}

/// Words sized by relative frequency, largest first.
pub fn word_cloud(words: &[(String, usize)]) -> String {
    let Some(max) = words.iter().map(|(_, n)| *n).max() else {
        return "<p class=\"muted\">No text available to build a word cloud.</p>".to_string();
    };
    let mut out = String::from("<div class=\"cloud\">");
    for (word, n) in words {
        let size = 0.8 + 1.8 * (*n as f64 / max as f64);
        let _ = write!(
            out,
            "<span style=\"font-size:{size:.2}rem\" title=\"{n}\">{}</span>",
            escape(word)
        );
    }
    out.push_str("</div>");
    out
}

pub fn month_selector(year: i32, selected: Option<u32>) -> String {
    let mut out = String::from(
        "<form method=\"get\" action=\"/reviews\"><label>Month <select name=\"month\">\
         <option value=\"\">All months</option>",
    );
    for (i, name) in MONTHS.iter().enumerate() {
        let m = i as u32 + 1;
        let sel = if selected == Some(m) { " selected" } else { "" };
        let _ = write!(out, "<option value=\"{m}\"{sel}>{name}</option>");
    }
    let _ = write!(
        out,
        "</select></label> <label>Year <input type=\"number\" name=\"year\" value=\"{year}\" \
         style=\"width:6rem\"></label> <button type=\"submit\">Show</button></form>"
    );
    out
}

pub fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(x) => format!("{:.*}", decimals, x),
        None => "–".to_string(),
    }
}

pub fn fmt_percent(v: Option<f64>) -> String {
    match v {
        Some(x) => format!("{:.2}%", x * 100.0),
        None => "–".to_string(),
    }
}
