//! Search UI
//!
//! A small axum server with one HTML page and a JSON API:
//! - `GET /` renders the query box and the result grid
//! - `GET /api/search` and `GET /api/collections` return JSON
//! - `GET /image` streams image files confined to the image root
//! - every response carries nosniff, frame and referrer headers

mod config;
mod error;
mod page;
mod routes;
mod server;

pub use config::{WebConfig, DEFAULT_WEB_PORT};
pub use error::WebError;
pub use page::{escape_html, image_url, render_page, PageBody, PageView, NO_RESULTS_MESSAGE};
pub use routes::{resolve_image_path, SearchHitDto, SearchResponse};
pub use server::{AppState, WebServer};
