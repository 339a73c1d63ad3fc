//! Landing page content from the CMS.
//!
//! The document is fetched on every page render with caching disabled, so
//! edits show up immediately.

pub mod schema;
pub mod sections;

pub use schema::{LandingPage, parse_landing_page};
pub use sections::{Section, SectionView, build_sections};

use reqwest::header::CACHE_CONTROL;
use thiserror::Error;
use tracing::instrument;

/// Errors fetching or validating the document.
///
/// Display strings are shown on the page in place of the sections.
#[derive(Debug, Error)]
pub enum CmsError {
    #[error("CMS_SPEC_URL is not configured")]
    NotConfigured,

    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("CMS API request failed: {reason}")]
    Status { status: u16, reason: String },

    #[error("Invalid CMS response: {0}")]
    Invalid(String),
}

/// Client for the CMS document endpoint.
#[derive(Debug, Clone)]
pub struct CmsClient {
    client: reqwest::Client,
    url: Option<String>,
}

impl CmsClient {
    /// `url` of `None` makes every fetch fail with [`CmsError::NotConfigured`].
    #[must_use]
    pub fn new(url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.filter(|u| !u.is_empty()),
        }
    }

    /// Fetch and validate the landing page document.
    ///
    /// # Errors
    ///
    /// Returns `CmsError` if the URL is unset, the request fails or returns
    /// a non-success status, or the body does not match the schema.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<LandingPage, CmsError> {
        let url = self.url.as_deref().ok_or(CmsError::NotConfigured)?;

        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            return Err(CmsError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await?;
        parse_landing_page(&body).map_err(CmsError::Invalid)
    }
}
