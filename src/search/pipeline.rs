use std::path::{Path, PathBuf};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::AppError;
use crate::models::posting::JobPosting;
use crate::models::query::SearchQuery;
use crate::output;
use crate::search::{JobSearch, PageRequest, SearchPage};

/// Characters left as-is in a query component, matching encodeURIComponent.
const QUERY_COMPONENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const GOOGLE_SEARCH_URL: &str = "https://www.google.com/search";

const NO_RESULTS_MARKER: &str = "hasn't returned any results";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub output: PathBuf,
    pub written: usize,
}

/// One way of phrasing the location to the API.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Strategy {
    label: String,
    q: String,
    location: Option<String>,
}

enum Disposition {
    /// No (more) results for this strategy.
    Exhausted,
    /// The strategy's parameters were rejected; try the next one.
    Abandon,
    Fatal,
}

/// Scrape and persist. Nothing is written unless every page request
/// succeeded.
pub async fn run(
    source: &dyn JobSearch,
    query: &SearchQuery,
    output_path: &Path,
) -> Result<RunSummary, AppError> {
    let postings = scrape(source, query).await?;
    output::write_postings(output_path, &postings)?;

    tracing::info!(
        "Done. {} jobs saved to {}",
        postings.len(),
        output_path.display()
    );

    Ok(RunSummary {
        output: output_path.to_path_buf(),
        written: postings.len(),
    })
}

/// Collect up to `query.limit` postings. When `posted_today_only` is set,
/// postings not dated today are dropped before they count toward the limit.
pub async fn scrape(
    source: &dyn JobSearch,
    query: &SearchQuery,
) -> Result<Vec<JobPosting>, AppError> {
    query.validate()?;

    match &query.city_state {
        Some(city) => tracing::info!("Searching Google Jobs for '{}' in {city}", query.search_term),
        None => tracing::info!("Searching Google Jobs for '{}'", query.search_term),
    }
    tracing::info!("Equivalent search page: {}", search_page_url(query));

    for strategy in strategies(query) {
        tracing::info!("Trying strategy via {}: {} ...", source.name(), strategy.label);
        let postings = collect_strategy(source, query, &strategy).await?;
        if !postings.is_empty() {
            tracing::info!("Strategy succeeded with {} jobs", postings.len());
            return Ok(postings);
        }
        tracing::info!("Strategy returned no results, trying next...");
    }

    Ok(Vec::new())
}

fn strategies(query: &SearchQuery) -> Vec<Strategy> {
    match &query.city_state {
        Some(city) => vec![
            Strategy {
                label: format!("location='{city}'"),
                q: query.search_term.clone(),
                location: Some(city.clone()),
            },
            Strategy {
                label: format!("q embedded ('{} {city}')", query.search_term),
                q: format!("{} {city}", query.search_term),
                location: None,
            },
        ],
        None => vec![Strategy {
            label: "no location filter".to_string(),
            q: query.search_term.clone(),
            location: None,
        }],
    }
}

async fn collect_strategy(
    source: &dyn JobSearch,
    query: &SearchQuery,
    strategy: &Strategy,
) -> Result<Vec<JobPosting>, AppError> {
    let mut collected: Vec<JobPosting> = Vec::new();
    let mut cursor: Option<String> = None;
    let mut page_num = 1;

    while collected.len() < query.limit {
        let request = PageRequest {
            q: strategy.q.clone(),
            location: strategy.location.clone(),
            hl: query.language_code.clone(),
            gl: query.country_code.clone(),
            posted_today: query.posted_today_only,
            next_page_token: cursor.take(),
        };

        let page = match source.fetch_page(&request).await {
            Ok(page) => page,
            Err(err) => {
                let disposition = match &err {
                    AppError::UpstreamStatus { message, .. } => {
                        classify(message, strategy, page_num)
                    }
                    _ => Disposition::Fatal,
                };
                match disposition {
                    Disposition::Exhausted => break,
                    Disposition::Abandon => {
                        tracing::warn!("Upstream rejected {}: {err}", strategy.label);
                        return Ok(Vec::new());
                    }
                    Disposition::Fatal => return Err(err),
                }
            }
        };

        if let Some(message) = page.error.as_deref() {
            match classify(message, strategy, page_num) {
                Disposition::Exhausted => {
                    tracing::info!("No more results on page {page_num}");
                    break;
                }
                Disposition::Abandon => {
                    tracing::warn!("Upstream rejected {}: {message}", strategy.label);
                    return Ok(Vec::new());
                }
                Disposition::Fatal => {
                    tracing::error!("SerpAPI error: {message}");
                    return Err(AppError::Upstream(message.to_string()));
                }
            }
        }

        if page.jobs_results.is_empty() {
            tracing::info!("No more results on page {page_num}");
            break;
        }

        let next = page.next_page_token().map(String::from);
        let (kept, skipped) = absorb_page(page, query, &mut collected);
        tracing::info!(
            "Page {page_num}: {kept} jobs kept, {skipped} skipped (strategy total: {})",
            collected.len()
        );

        match next {
            Some(token) => cursor = Some(token),
            None => break,
        }
        page_num += 1;
    }

    Ok(collected)
}

/// Normalise a page into `collected`, stopping at the limit.
/// Returns (kept, skipped-as-not-today).
fn absorb_page(
    page: SearchPage,
    query: &SearchQuery,
    collected: &mut Vec<JobPosting>,
) -> (usize, usize) {
    let scrape_time = scrape_time();
    let mut kept = 0;
    let mut skipped = 0;

    for raw in page.jobs_results {
        if collected.len() >= query.limit {
            break;
        }
        let posting = JobPosting::from_raw(raw, &scrape_time);
        if query.posted_today_only && !posting.is_posted_today() {
            skipped += 1;
            continue;
        }
        collected.push(posting);
        kept += 1;
    }

    (kept, skipped)
}

fn classify(message: &str, strategy: &Strategy, page_num: u32) -> Disposition {
    let lower = message.to_lowercase();
    if lower.contains(NO_RESULTS_MARKER) {
        Disposition::Exhausted
    } else if strategy.location.is_some() && page_num == 1 && lower.contains("location") {
        Disposition::Abandon
    } else {
        Disposition::Fatal
    }
}

fn scrape_time() -> String {
    chrono::Local::now().format("%d-%b-%Y T%I:%M").to_string()
}

/// The Google Jobs web page showing the same search.
pub fn search_page_url(query: &SearchQuery) -> String {
    let mut url = format!(
        "{GOOGLE_SEARCH_URL}?q={}&ibp=htl;jobs",
        utf8_percent_encode(&query.search_term, QUERY_COMPONENT_SET)
    );
    if let Some(city) = &query.city_state {
        url.push_str("&htichips=city;");
        url.push_str(&utf8_percent_encode(city, QUERY_COMPONENT_SET).to_string());
    }
    url
}
