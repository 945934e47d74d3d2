//! hh.ru vacancies API client.
//!
//! Fetches the paginated vacancy listing, then each vacancy's detail page
//! for its key skills, and normalizes the result into snapshot records.

use crate::config::CollectorConfig;
use crate::models::{Salary, Vacancy};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One page of the vacancy listing.
#[derive(Debug, Deserialize)]
struct ListingPage {
    #[serde(default)]
    items: Vec<ListingItem>,
    /// Total number of pages available for the query.
    #[serde(default)]
    pages: Option<u32>,
}

/// A vacancy as it appears in the listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub salary: Option<RawSalary>,
    #[serde(default)]
    pub alternate_url: Option<String>,
}

/// Salary block as returned by the API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSalary {
    #[serde(default)]
    pub from: Option<f64>,
    #[serde(default)]
    pub to: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VacancyDetails {
    #[serde(default)]
    key_skills: Option<Vec<KeySkill>>,
}

#[derive(Debug, Deserialize)]
struct KeySkill {
    name: String,
}

/// Keep a salary only when it has a lower bound in the accepted currency.
pub fn normalize_salary(raw: Option<&RawSalary>, currency: &str) -> Salary {
    match raw {
        Some(salary) if salary.from.is_some() && salary.currency.as_deref() == Some(currency) => {
            Salary {
                from: salary.from,
                to: salary.to,
                currency: salary.currency.clone(),
            }
        }
        _ => Salary::unspecified(),
    }
}

/// Client for the hh.ru vacancies endpoint.
pub struct HeadHunterClient {
    http_client: reqwest::Client,
    config: CollectorConfig,
}

impl HeadHunterClient {
    /// Create a client for the given collector settings.
    pub fn new(config: CollectorConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Fetch one listing page.
    ///
    /// A non-success status is logged and treated as an empty page, which ends
    /// pagination.
    pub async fn fetch_page(&self, page: u32) -> Result<(Vec<ListingItem>, Option<u32>)> {
        let params = [
            ("text", self.config.keyword.clone()),
            ("per_page", self.config.per_page.to_string()),
            ("page", page.to_string()),
            ("area", self.config.area.to_string()),
        ];

        let response = self
            .http_client
            .get(&self.config.api_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow::anyhow!(
                        "Request timed out after {}s",
                        self.config.timeout_seconds
                    )
                } else if e.is_connect() {
                    anyhow::anyhow!("Cannot connect to {}", self.config.api_url)
                } else {
                    anyhow::anyhow!("Failed to send request: {}", e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Listing page {} failed with status {}: {}", page, status, body);
            return Ok((Vec::new(), None));
        }

        let listing: ListingPage = response
            .json()
            .await
            .with_context(|| format!("Failed to parse listing page {}", page))?;

        debug!("Page {}: {} items", page, listing.items.len());
        Ok((listing.items, listing.pages))
    }

    /// Fetch up to `pages` listing pages, stopping at the first empty one.
    pub async fn fetch_listing(&self) -> Result<Vec<ListingItem>> {
        let mut all_items = Vec::new();

        for page in 0..self.config.pages {
            let (items, total_pages) = self.fetch_page(page).await?;

            if items.is_empty() {
                info!("Page {} is empty, stopping", page + 1);
                break;
            }

            info!("Page {}: {} vacancies", page + 1, items.len());
            all_items.extend(items);

            if let Some(total) = total_pages {
                if page + 1 >= total {
                    debug!("Reached last available page ({})", total);
                    break;
                }
            }
        }

        info!("Fetched {} vacancies from the listing", all_items.len());
        Ok(all_items)
    }

    /// Fetch the key skills of one vacancy.
    pub async fn fetch_key_skills(&self, vacancy_id: &str) -> Result<Vec<String>> {
        let url = format!("{}/{}", self.config.api_url.trim_end_matches('/'), vacancy_id);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch vacancy {}", vacancy_id))?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Vacancy {} request failed with status {}",
                vacancy_id,
                response.status()
            );
        }

        let details: VacancyDetails = response
            .json()
            .await
            .with_context(|| format!("Failed to parse vacancy {}", vacancy_id))?;

        Ok(details
            .key_skills
            .unwrap_or_default()
            .into_iter()
            .map(|skill| skill.name)
            .collect())
    }

    /// Build a snapshot record from a listing item and its detail page.
    pub async fn vacancy_details(&self, item: &ListingItem) -> Vacancy {
        let key_skills = match self.fetch_key_skills(&item.id).await {
            Ok(skills) => skills,
            Err(e) => {
                warn!("Skipping key skills of vacancy {}: {:#}", item.id, e);
                Vec::new()
            }
        };

        Vacancy {
            id: item.id.clone(),
            title: item.name.clone(),
            salary: Some(normalize_salary(item.salary.as_ref(), &self.config.currency)),
            key_skills,
            url: item.alternate_url.clone(),
        }
    }

    /// Run the whole collection: listing, then details for every vacancy.
    pub async fn collect(&self, show_progress: bool) -> Result<Vec<Vacancy>> {
        info!(
            "Collecting vacancies for '{}' (area {}, up to {} pages)",
            self.config.keyword, self.config.area, self.config.pages
        );

        let items = self.fetch_listing().await?;

        let progress = if show_progress {
            let pb = ProgressBar::new(items.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        let mut vacancies = Vec::with_capacity(items.len());
        for item in &items {
            if let Some(ref pb) = progress {
                pb.set_message(format!("vacancy {}", item.id));
            }
            debug!("Fetching details of vacancy {}", item.id);

            vacancies.push(self.vacancy_details(item).await);

            if let Some(ref pb) = progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress {
            pb.finish_with_message("done");
        }

        Ok(vacancies)
    }
}
