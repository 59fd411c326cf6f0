use crate::common::info;
use crate::updater::error::UpdateError;
use crate::updater::version::derive_version;
use anyhow::Context;
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use std::time::Duration;

const LISTING_ROW_SELECTOR: &str = "#list tbody tr";

pub trait ListingSource: Send + Sync {
    /// Fetch the HTML of the directory listing at `url`.
    fn fetch(&self, url: &str) -> Result<String, UpdateError>;
}

pub struct HttpListing {
    client: Client,
}

impl HttpListing {
    pub fn create(user_agent: &str) -> anyhow::Result<HttpListing> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .context("Could not build client")?;
        Ok(HttpListing { client })
    }
}

impl ListingSource for HttpListing {
    fn fetch(&self, url: &str) -> Result<String, UpdateError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| UpdateError::Network(format!("Could not get {url}: {e}")))?;

        let status_code = response.status();
        if !status_code.is_success() {
            return Err(UpdateError::Network(format!("Request to {url} failed: {status_code}")));
        }

        response
            .text()
            .map_err(|e| UpdateError::Network(format!("Could not get text from response: {e}")))
    }
}

/// The newest artifact of the listing. `url` and `version` are `None` if it could not be found.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArtifactDescriptor {
    pub name: String,
    pub url: Option<String>,
    pub version: Option<String>,
}

pub struct ArtifactLocator {
    listing_url: String,
    row: usize,
    source: Box<dyn ListingSource>,
}

impl ArtifactLocator {
    /// * `row` - index of the table row holding the newest artifact, the mirror listing keeps
    ///   it at a fixed position below the parent directory and the separator rows
    pub fn create(listing_url: &str, row: usize, source: Box<dyn ListingSource>) -> Self {
        ArtifactLocator {
            listing_url: listing_url.to_string(),
            row,
            source,
        }
    }

    pub fn locate(&self) -> Result<ArtifactDescriptor, UpdateError> {
        info(&format!("Looking for latest artifact on {}", self.listing_url));
        let html = self.source.fetch(&self.listing_url)?;
        let name = extract_artifact_name(&html, self.row)?;

        if name.is_empty() {
            return Ok(ArtifactDescriptor::default());
        }

        Ok(ArtifactDescriptor {
            url: Some(join_url(&self.listing_url, &name)),
            version: derive_version(&name),
            name,
        })
    }
}

pub(crate) fn extract_artifact_name(html: &str, row: usize) -> Result<String, UpdateError> {
    let document = Html::parse_document(html);
    let row_selector =
        Selector::parse(LISTING_ROW_SELECTOR).map_err(|e| UpdateError::Parse(e.to_string()))?;
    let cell_selector = Selector::parse("td").map_err(|e| UpdateError::Parse(e.to_string()))?;

    let row_element = document.select(&row_selector).nth(row).ok_or_else(|| {
        UpdateError::Parse(format!("Listing has no row {row} for {LISTING_ROW_SELECTOR}"))
    })?;
    let cell = row_element
        .select(&cell_selector)
        .next()
        .ok_or_else(|| UpdateError::Parse(format!("Listing row {row} has no cells")))?;

    Ok(cell.text().collect::<String>().trim().to_string())
}

fn join_url(base: &str, name: &str) -> String {
    if base.ends_with('/') {
        format!("{base}{name}")
    } else {
        format!("{base}/{name}")
    }
}
