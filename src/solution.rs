use anyhow::Result;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::ScrapeConfig;

/// Fetches reference solutions published as `<slug>.py` under a fixed URL prefix.
#[derive(Debug, Clone)]
pub struct SolutionFetcher {
    client: Client,
    base_url: String,
}

impl SolutionFetcher {
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.http_timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.solutions_url.clone(),
        })
    }

    pub fn url(&self, slug: &str) -> String {
        format!("{}{}.py", self.base_url, slug)
    }

    /// The solution text, or an empty string when it can't be fetched.
    pub async fn fetch(&self, slug: &str) -> String {
        let url = self.url(slug);
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url, error = %e, "failed to fetch solution");
                return String::new();
            }
        };

        if !response.status().is_success() {
            debug!(url, status = %response.status(), "no solution");
            return String::new();
        }

        response.text().await.unwrap_or_else(|e| {
            warn!(url, error = %e, "failed to read solution");
            String::new()
        })
    }
}

/// `Two Sum` -> `two-sum`.
pub fn slug(title: &str) -> String {
    title.to_lowercase().replace(' ', "-")
}
