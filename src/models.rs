//! Data models for the vacancy snapshot and analytics results.
//!
//! The snapshot format is a flat JSON array of [`Vacancy`] records. Reading
//! is deliberately lenient so that snapshots written by older collectors
//! (placeholder strings instead of `null`, numeric ids) still load.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Salary range of a single vacancy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Salary {
    /// Lower bound.
    #[serde(
        default,
        deserialize_with = "lenient_number",
        serialize_with = "whole_number"
    )]
    pub from: Option<f64>,
    /// Upper bound.
    #[serde(
        default,
        deserialize_with = "lenient_number",
        serialize_with = "whole_number"
    )]
    pub to: Option<f64>,
    /// ISO-like currency code as reported by the API (`RUR`).
    #[serde(default, deserialize_with = "lenient_string")]
    pub currency: Option<String>,
}

impl Salary {
    /// A salary with no usable information.
    pub fn unspecified() -> Self {
        Self::default()
    }

    /// Numeric bounds that are present, `from` before `to`.
    pub fn values(&self) -> Vec<f64> {
        self.from.into_iter().chain(self.to).collect()
    }
}

/// A single vacancy as stored in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vacancy {
    /// Vacancy id on hh.ru.
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    /// Vacancy title.
    #[serde(default)]
    pub title: String,
    /// Normalized salary (absent or all-`None` when unknown).
    #[serde(default)]
    pub salary: Option<Salary>,
    /// Key skills listed by the employer.
    #[serde(default, deserialize_with = "lenient_skills")]
    pub key_skills: Vec<String>,
    /// Public page of the vacancy.
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
}

impl Vacancy {
    /// Numeric salary bounds of this vacancy.
    pub fn salary_values(&self) -> Vec<f64> {
        self.salary.as_ref().map(Salary::values).unwrap_or_default()
    }
}

/// Aggregate view over all vacancies matching a title query.
#[derive(Debug, Clone, PartialEq)]
pub struct VacancySummary {
    /// Number of matching vacancies.
    pub count: usize,
    /// Every salary bound of every match, in snapshot order.
    pub salaries: Vec<f64>,
    /// Unique, trimmed skills across all matches.
    pub skills: Vec<String>,
    /// Links of the matches that have one.
    pub links: Vec<String>,
}

impl VacancySummary {
    /// Mean of all collected salary bounds.
    pub fn average_salary(&self) -> Option<f64> {
        crate::analysis::mean(&self.salaries)
    }
}

/// A vacancy title ranked by its mean salary.
#[derive(Debug, Clone, PartialEq)]
pub struct SalaryRank {
    pub title: String,
    pub salaries: Vec<f64>,
    pub mean: f64,
}

/// How many vacancies list a given skill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillCount {
    pub skill: String,
    pub count: usize,
}

/// Largest integer an f64 holds exactly.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Write whole amounts as JSON integers (`150000`, not `150000.0`).
fn whole_number<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match *value {
        Some(v) if v.fract() == 0.0 && v.abs() <= MAX_EXACT_INT => {
            serializer.serialize_i64(v as i64)
        }
        Some(v) => serializer.serialize_f64(v),
        None => serializer.serialize_none(),
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_str().map(String::from)))
}

fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "vacancy id must be a string or a number, got {}",
            other
        ))),
    }
}

fn lenient_skills<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let skills = match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| item.as_str().map(String::from))
            .collect(),
        _ => Vec::new(),
    };
    Ok(skills)
}
