// Job search sources and the pipeline that drives them.

pub mod pipeline;
pub mod serpapi;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::posting::RawJob;

/// Parameters for one page of a google_jobs search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub q: String,
    pub location: Option<String>,
    pub hl: String,
    pub gl: Option<String>,
    pub posted_today: bool,
    pub next_page_token: Option<String>,
}

impl PageRequest {
    /// Query string pairs, excluding the engine and credential which the
    /// source adds itself.
    pub fn params(&self) -> Vec<(&'static str, &str)> {
        let mut params = vec![("q", self.q.as_str()), ("hl", self.hl.as_str())];
        if let Some(gl) = &self.gl {
            params.push(("gl", gl.as_str()));
        }
        if let Some(location) = &self.location {
            params.push(("location", location.as_str()));
        }
        if self.posted_today {
            params.push(("chips", "date_posted:today"));
        }
        if let Some(token) = &self.next_page_token {
            params.push(("next_page_token", token.as_str()));
        }
        params
    }
}

/// Body of a google_jobs response, reduced to what pagination needs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchPage {
    pub error: Option<String>,
    pub jobs_results: Vec<RawJob>,
    pub serpapi_pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub next_page_token: Option<String>,
}

impl SearchPage {
    pub fn next_page_token(&self) -> Option<&str> {
        self.serpapi_pagination
            .as_ref()
            .and_then(|p| p.next_page_token.as_deref())
            .filter(|t| !t.is_empty())
    }
}

/// A source of job search result pages. Each call is exactly one upstream
/// request; the pipeline owns cursor handling and stopping.
#[async_trait]
pub trait JobSearch: Send + Sync {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    async fn fetch_page(&self, request: &PageRequest) -> Result<SearchPage, AppError>;
}
