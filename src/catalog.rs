//! Read-only REST boundary: case catalog and backend health.
//!
//! The debate core only needs a `row_id` before `start`; these calls feed
//! the case picker and pre-fill the default model. Consumed once around
//! startup, never during a streaming session.

use serde::{Deserialize, Serialize};

/// Width of the claim snippet shown in case listings.
pub const SNIPPET_WIDTH: usize = 110;

/// Failure talking to the REST boundary.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// One selectable claim/truth case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseDescriptor {
    pub row_id: i64,
    pub claim: String,
    pub truth: String,
    #[serde(default)]
    pub is_default: bool,
}

/// The backend's case catalog.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaseCatalog {
    #[serde(default)]
    pub cases: Vec<CaseDescriptor>,
    #[serde(default)]
    pub default_ids: Vec<i64>,
}

impl CaseCatalog {
    /// The case to pre-select: the first default, else the first case.
    pub fn preferred(&self) -> Option<&CaseDescriptor> {
        self.cases
            .iter()
            .find(|case| case.is_default)
            .or_else(|| self.cases.first())
    }

    /// Look up a case by row ID.
    pub fn by_row_id(&self, row_id: i64) -> Option<&CaseDescriptor> {
        self.cases.iter().find(|case| case.row_id == row_id)
    }
}

/// Backend health summary, used to pre-fill the default model.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthInfo {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub rows_total: u64,
    #[serde(default)]
    pub pandemic_rows: u64,
    #[serde(default)]
    pub default_focus: Vec<i64>,
    #[serde(default)]
    pub default_model: Option<String>,
}

/// Fetch the case catalog from `{base}/api/cases`.
pub async fn fetch_cases(
    client: &reqwest::Client,
    base_url: &str,
) -> Result<CaseCatalog, CatalogError> {
    let url = format!("{}/api/cases", base_url.trim_end_matches('/'));
    let catalog = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(catalog)
}

/// Fetch the health summary from `{base}/api/health`.
pub async fn fetch_health(
    client: &reqwest::Client,
    base_url: &str,
) -> Result<HealthInfo, CatalogError> {
    let url = format!("{}/api/health", base_url.trim_end_matches('/'));
    let health = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(health)
}

/// Collapse whitespace and truncate to `width` characters with an ellipsis.
pub fn snippet(text: &str, width: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= width {
        return collapsed;
    }
    let mut cut: String = collapsed.chars().take(width).collect();
    cut.push('…');
    cut
}
