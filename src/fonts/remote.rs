//! Remote (served, not uploaded) font families.
//!
//! A family is fetched from a URL template such as
//! `https://fonts.example.com/{family}.ttf`. The registry wraps each fetch in
//! a per-family cache cell so concurrent callers share a single download.

use std::time::Duration;

use super::FontLoadError;

/// HTTP source for remote font files.
#[derive(Debug, Clone)]
pub struct RemoteFontSource {
    client: reqwest::Client,
    url_template: String,
}

impl RemoteFontSource {
    /// `url_template` must contain `{family}`.
    pub fn new(url_template: impl Into<String>) -> Result<Self, FontLoadError> {
        let url_template = url_template.into();
        if !url_template.contains("{family}") {
            return Err(FontLoadError::Remote {
                family: String::new(),
                reason: format!("URL template '{}' has no {{family}} placeholder", url_template),
            });
        }
        let client = reqwest::Client::builder()
            .user_agent(concat!("nametag/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FontLoadError::Remote {
                family: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            url_template,
        })
    }

    /// URL for a family; spaces become `+`.
    pub fn url_for(&self, family: &str) -> String {
        self.url_template
            .replace("{family}", &family.trim().replace(' ', "+"))
    }

    /// Download the raw font bytes for `family`.
    pub async fn fetch(&self, family: &str) -> Result<Vec<u8>, FontLoadError> {
        let remote_err = |reason: String| FontLoadError::Remote {
            family: family.to_string(),
            reason,
        };

        let response = self
            .client
            .get(self.url_for(family))
            .send()
            .await
            .map_err(|e| remote_err(e.to_string()))?
            .error_for_status()
            .map_err(|e| remote_err(e.to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| remote_err(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
