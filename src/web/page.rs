//! HTML rendering for the search page

use std::fmt::Write;

use crate::core::types::ImageHit;

pub const NO_RESULTS_MESSAGE: &str = "No results found for your query.";

/// What the page shows below the search box
#[derive(Debug)]
pub enum PageBody {
    /// No query yet
    Empty,
    Results(Vec<ImageHit>),
    /// Search failed; the message is shown under the generic notice
    Failed(String),
}

/// Everything needed to render one page
#[derive(Debug)]
pub struct PageView<'a> {
    pub title: &'a str,
    pub query: &'a str,
    pub columns: usize,
    pub collections: &'a [String],
    pub body: PageBody,
}

/// Escape text for HTML element content and quoted attributes
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// URL that serves an image through `/image`
pub fn image_url(path: &str) -> String {
    format!("/image?path={}", urlencoding::encode(path))
}

pub fn render_page(view: &PageView<'_>) -> String {
    let title = escape_html(view.title);
    let mut html = String::with_capacity(4096);

    // Writing into a String cannot fail
    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; margin: 2rem auto; max-width: 1100px; }}
form input[type=text] {{ width: 70%; padding: 0.5rem; }}
.grid {{ display: grid; grid-template-columns: repeat({columns}, 1fr); gap: 1rem; }}
.cell img {{ width: 100%; }}
.error {{ color: #b00020; }}
.collections {{ color: #666; font-size: 0.85rem; }}
</style>
</head>
<body>
<h1>{title}</h1>
<form method="get" action="/">
<input type="text" name="q" placeholder="Enter your search query:" value="{query}" autofocus>
<button type="submit">Search</button>
</form>
"#,
        title = title,
        columns = view.columns.max(1),
        query = escape_html(view.query),
    );

    match &view.body {
        PageBody::Empty => {}
        PageBody::Results(hits) if hits.is_empty() => {
            let _ = writeln!(html, "<p>{}</p>", NO_RESULTS_MESSAGE);
        }
        PageBody::Results(hits) => {
            html.push_str("<h2>Search Results</h2>\n");
            html.push_str("<div class=\"grid\">\n");
            for hit in hits {
                let _ = writeln!(
                    html,
                    "<div class=\"cell\"><img src=\"{src}\" alt=\"{alt}\"><p>Score: {score}</p></div>",
                    src = escape_html(&image_url(&hit.path)),
                    alt = escape_html(&hit.path),
                    score = hit.display_score(),
                );
            }
            html.push_str("</div>\n");
        }
        PageBody::Failed(message) => {
            let _ = writeln!(
                html,
                "<p class=\"error\">{}</p>\n<p class=\"error\">{}</p>",
                crate::search::SEARCH_FAILED_MESSAGE,
                escape_html(message)
            );
        }
    }

    if !view.collections.is_empty() {
        let names: Vec<String> = view.collections.iter().map(|c| escape_html(c)).collect();
        let _ = writeln!(
            html,
            "<p class=\"collections\">Available collections: {}</p>",
            names.join(", ")
        );
    }

    html.push_str("</body>\n</html>\n");
    html
}
