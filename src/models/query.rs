use crate::error::AppError;

/// Everything one run needs to talk to the jobs API. Built once at startup
/// and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub search_term: String,
    pub city_state: Option<String>,
    pub language_code: String,
    pub country_code: Option<String>,
    pub posted_today_only: bool,
    pub limit: usize,
    pub api_key: String,
}

impl SearchQuery {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.api_key.trim().is_empty() {
            return Err(AppError::Configuration(
                "SerpAPI key required. Pass --api_key=YOUR_KEY or set the SERPAPI_KEY \
                 environment variable. Get a free key (100 searches/month) at \
                 https://serpapi.com/users/sign_up"
                    .to_string(),
            ));
        }
        if self.search_term.trim().is_empty() {
            return Err(AppError::Configuration(
                "--search_term must not be empty".to_string(),
            ));
        }
        if self.limit == 0 {
            return Err(AppError::Configuration(
                "--limit must be a positive integer".to_string(),
            ));
        }
        if self.language_code.trim().is_empty() {
            return Err(AppError::Configuration(
                "--hl must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_query() -> SearchQuery {
    SearchQuery {
        search_term: "data scientist".to_string(),
        city_state: None,
        language_code: "en".to_string(),
        country_code: None,
        posted_today_only: false,
        limit: 20,
        api_key: "test-key".to_string(),
    }
}
