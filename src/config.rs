use std::path::PathBuf;

use clap::Parser;

use crate::models::query::SearchQuery;

pub const DEFAULT_OUTPUT: &str = "job_scrape_master.json";
pub const DEFAULT_BASE_URL: &str = "https://serpapi.com/search.json";

#[derive(Parser, Debug, Clone)]
#[command(name = "jobscrape", about = "Scrape Google Jobs via SerpAPI")]
pub struct Config {
    /// Job title / keywords to search for
    #[arg(long = "search_term")]
    pub search_term: String,

    /// Maximum number of jobs to scrape
    #[arg(long, default_value = "50")]
    pub limit: usize,

    /// Only include jobs posted today
    #[arg(long = "is_today")]
    pub is_today: bool,

    /// Location to filter by (e.g. 'Hanoi' or 'New York, NY')
    #[arg(long = "city_state")]
    pub city_state: Option<String>,

    /// Language code for results. Use 'vi' for Vietnamese.
    #[arg(long, default_value = "en")]
    pub hl: String,

    /// Country code (e.g. 'vn' for Vietnam, 'us' for USA)
    #[arg(long)]
    pub gl: Option<String>,

    /// SerpAPI key. Get a free key at https://serpapi.com/users/sign_up
    #[arg(long = "api_key", env = "SERPAPI_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output file, overwritten on every successful run
    #[arg(long, env = "JOB_SCRAPE_OUTPUT", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long = "timeout_secs", env = "SERPAPI_TIMEOUT_SECS", default_value = "30")]
    pub timeout_secs: u64,

    #[arg(long = "base_url", env = "SERPAPI_BASE_URL", default_value = DEFAULT_BASE_URL, hide = true)]
    pub base_url: String,

    /// Emit logs as JSON lines
    #[arg(long = "log_json", env = "JOB_SCRAPE_LOG_JSON")]
    pub log_json: bool,
}

impl Config {
    /// Build the run's query. Not validated here; see `SearchQuery::validate`.
    pub fn search_query(&self) -> SearchQuery {
        SearchQuery {
            search_term: self.search_term.trim().to_string(),
            city_state: non_blank(self.city_state.as_deref()),
            language_code: self.hl.clone(),
            country_code: non_blank(self.gl.as_deref()),
            posted_today_only: self.is_today,
            limit: self.limit,
            api_key: self.api_key.clone().unwrap_or_default(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_cli() {
        let config = Config::try_parse_from([
            "jobscrape",
            "--search_term",
            "data scientist",
            "--api_key",
            "k",
        ])
        .unwrap();
        assert_eq!(config.limit, 50);
        assert_eq!(config.hl, "en");
        assert!(!config.is_today);
        assert_eq!(config.output, PathBuf::from(DEFAULT_OUTPUT));

        let query = config.search_query();
        assert_eq!(query.search_term, "data scientist");
        assert_eq!(query.city_state, None);
        assert_eq!(query.country_code, None);
    }

    #[test]
    fn underscore_flags_are_accepted() {
        let config = Config::try_parse_from([
            "jobscrape",
            "--search_term",
            "rust",
            "--city_state",
            "Hà Nội",
            "--is_today",
            "--gl",
            "vn",
            "--hl",
            "vi",
            "--limit",
            "20",
            "--api_key",
            "k",
        ])
        .unwrap();
        let query = config.search_query();
        assert_eq!(query.city_state.as_deref(), Some("Hà Nội"));
        assert_eq!(query.country_code.as_deref(), Some("vn"));
        assert_eq!(query.language_code, "vi");
        assert!(query.posted_today_only);
        assert_eq!(query.limit, 20);
    }

    #[test]
    fn search_term_is_required() {
        assert!(Config::try_parse_from(["jobscrape", "--api_key", "k"]).is_err());
    }

    #[test]
    fn blank_location_is_dropped() {
        let config = Config::try_parse_from([
            "jobscrape",
            "--search_term",
            "rust",
            "--city_state",
            "  ",
            "--api_key",
            "k",
        ])
        .unwrap();
        assert_eq!(config.search_query().city_state, None);
    }
}
