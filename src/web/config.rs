//! Web server configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default listening port
pub const DEFAULT_WEB_PORT: u16 = 8501;

/// HTTP listener and page layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Address to bind
    pub host: IpAddr,
    /// Port to bind
    pub port: u16,
    /// Directory that relative image paths resolve against; nothing outside it is served
    pub image_root: PathBuf,
    /// Result grid columns
    pub columns: usize,
    /// Page title
    pub title: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_WEB_PORT,
            image_root: PathBuf::from("."),
            columns: 3,
            title: "Housing Multi-Modal Similarity Search".to_string(),
        }
    }
}

impl WebConfig {
    pub fn with_image_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.image_root = root.into();
        self
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
