use serde::{Deserialize, Serialize};

pub const NOT_SPECIFIED: &str = "Not specified";

/// One job posting as written to the output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub scrape_time: String,
    pub job_title: String,
    pub publisher: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub time_posted: String,
    pub salary: String,
    pub benefits: Vec<String>,
    pub job_type: String,
    pub desc: String,
    pub application_links: Vec<ApplicationLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationLink {
    pub url: String,
    pub platform: String,
}

/// A single entry of `jobs_results` in a google_jobs response. Every field
/// is optional upstream, so everything defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawJob {
    pub title: Option<String>,
    pub company_name: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub job_id: Option<String>,
    pub detected_extensions: DetectedExtensions,
    pub job_highlights: Vec<JobHighlight>,
    pub apply_options: Vec<ApplyOption>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DetectedExtensions {
    pub posted_at: Option<String>,
    pub salary: Option<String>,
    pub schedule_type: Option<String>,
    pub health_insurance: bool,
    pub paid_time_off: bool,
    pub dental_coverage: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JobHighlight {
    pub title: Option<String>,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApplyOption {
    pub title: Option<String>,
    pub link: Option<String>,
}

impl JobPosting {
    /// Normalise an upstream result into the output schema.
    pub fn from_raw(raw: RawJob, scrape_time: &str) -> Self {
        let ext = raw.detected_extensions;

        let mut desc_parts = Vec::new();
        for highlight in raw.job_highlights {
            if let Some(title) = highlight.title.filter(|t| !t.is_empty()) {
                desc_parts.push(title);
            }
            desc_parts.extend(highlight.items);
        }
        let desc = if desc_parts.is_empty() {
            raw.description.unwrap_or_default()
        } else {
            desc_parts.join("\n")
        };

        let mut benefits = Vec::new();
        if ext.health_insurance {
            benefits.push("Health insurance".to_string());
        }
        if ext.paid_time_off {
            benefits.push("Paid time off".to_string());
        }
        if ext.dental_coverage {
            benefits.push("Dental coverage".to_string());
        }

        let application_links = raw
            .apply_options
            .into_iter()
            .map(|opt| ApplicationLink {
                url: opt.link.unwrap_or_default(),
                platform: opt.title.unwrap_or_else(|| "Unknown Platform".to_string()),
            })
            .collect();

        Self {
            scrape_time: scrape_time.to_string(),
            job_title: raw.title.unwrap_or_else(|| "Title not found".to_string()),
            publisher: or_not_specified(raw.company_name),
            location: raw.location,
            time_posted: or_not_specified(ext.posted_at),
            salary: or_not_specified(ext.salary),
            benefits,
            job_type: or_not_specified(ext.schedule_type),
            desc,
            application_links,
            job_id: raw.job_id,
        }
    }

    /// False only when `time_posted` is recognisably older than a day.
    /// Unknown or missing labels are kept, since the request itself already
    /// asks the API for today's postings.
    pub fn is_posted_today(&self) -> bool {
        !is_older_than_today(&self.time_posted)
    }
}

fn or_not_specified(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_SPECIFIED.to_string())
}

const OLDER_PHRASES: &[&str] = &["yesterday", "hôm qua", "hier", "gestern", "ayer"];

/// (marker, units) pairs of relative ages of a day or more, per language.
const OLDER_UNITS: &[(&str, &[&str])] = &[
    ("ago", &["day", "week", "month", "year"]),
    ("trước", &["ngày", "tuần", "tháng", "năm"]),
    ("il y a", &["jour", "semaine", "mois", " an"]),
    ("vor", &["tag", "woche", "monat", "jahr"]),
    ("hace", &["día", "semana", "mes", "año"]),
];

/// Whether a relative age such as "3 days ago" or "2 tuần trước" is at
/// least a day old. Labels that are not understood return false.
pub fn is_older_than_today(posted_at: &str) -> bool {
    let label = posted_at.trim().to_lowercase();
    if OLDER_PHRASES.iter().any(|p| label.contains(p)) {
        return true;
    }
    OLDER_UNITS.iter().any(|(marker, units)| {
        label.contains(marker) && units.iter().any(|u| label.contains(u))
    })
}
