//! URL checks
//!
//! [`ShallowUrlValidator`] only looks at the shape of a URL: GitHub hosts are
//! always accepted and anything else needs a scheme and a host. It never
//! touches the network, so it cannot tell a dead link from a live one.
//! [`HttpUrlValidator`] issues a HEAD request per URL; every failure becomes
//! an invalid verdict and is never propagated.

use crate::error::{Result, ScrivenerError};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Hosts accepted without further checks
pub const TRUSTED_HOSTS: [&str; 2] = ["github.com", "githubusercontent.com"];

/// Why a URL was judged invalid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlCheckError {
    Malformed,
    Timeout,
    Network(String),
    Status(u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlVerdict {
    Valid,
    Invalid(UrlCheckError),
}

impl UrlVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, UrlVerdict::Valid)
    }
}

#[async_trait]
pub trait UrlValidator: Send + Sync {
    async fn check(&self, url: &str) -> UrlVerdict;
}

/// `http(s)://` URLs in document order, ending at whitespace or `)`
pub fn extract_urls(text: &str) -> Vec<&str> {
    static PATTERN: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"https?://[^\s)]+").expect("Valid URL regex"));
    PATTERN.find_iter(text).map(|m| m.as_str()).collect()
}

fn shallow_verdict(url: &str) -> UrlVerdict {
    match Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) if TRUSTED_HOSTS.contains(&host) => UrlVerdict::Valid,
            Some(host) if !host.is_empty() => UrlVerdict::Valid,
            _ => UrlVerdict::Invalid(UrlCheckError::Malformed),
        },
        Err(_) => UrlVerdict::Invalid(UrlCheckError::Malformed),
    }
}

/// Format-only check
#[derive(Debug, Clone, Copy, Default)]
pub struct ShallowUrlValidator;

#[async_trait]
impl UrlValidator for ShallowUrlValidator {
    async fn check(&self, url: &str) -> UrlVerdict {
        shallow_verdict(url)
    }
}

/// HEAD request per URL
pub struct HttpUrlValidator {
    client: Client,
}

impl HttpUrlValidator {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("scrivener-proofreader")
            .build()
            .map_err(|e| ScrivenerError::Network(e.to_string()))?;
        Ok(Self { client })
    }

    async fn probe(&self, url: &str) -> Result<reqwest::StatusCode> {
        let response = self.client.head(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ScrivenerError::NetworkTimeout(url.to_string())
            } else {
                ScrivenerError::Network(format!("{}: {}", url, e))
            }
        })?;
        Ok(response.status())
    }
}

#[async_trait]
impl UrlValidator for HttpUrlValidator {
    async fn check(&self, url: &str) -> UrlVerdict {
        if let UrlVerdict::Invalid(reason) = shallow_verdict(url) {
            return UrlVerdict::Invalid(reason);
        }

        match self.probe(url).await {
            Ok(status) if status.is_client_error() || status.is_server_error() => {
                debug!("{} returned {}", url, status);
                UrlVerdict::Invalid(UrlCheckError::Status(status.as_u16()))
            }
            Ok(_) => UrlVerdict::Valid,
            Err(ScrivenerError::NetworkTimeout(_)) => UrlVerdict::Invalid(UrlCheckError::Timeout),
            Err(e) => {
                debug!("URL probe failed: {}", e);
                UrlVerdict::Invalid(UrlCheckError::Network(e.to_string()))
            }
        }
    }
}
