//! Vacancy aggregation and statistics.
//!
//! This module provides the title matching, salary averaging and ranking
//! utilities that back every bot command.

use crate::models::{SalaryRank, SkillCount, Vacancy, VacancySummary};
use std::collections::{HashMap, HashSet};

/// Trim skills, drop empty ones and deduplicate, keeping first-seen order.
pub fn clean_skills<S: AsRef<str>>(skills: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut cleaned = Vec::new();

    for skill in skills {
        let skill = skill.as_ref().trim();
        if skill.is_empty() {
            continue;
        }
        if seen.insert(skill.to_string()) {
            cleaned.push(skill.to_string());
        }
    }

    cleaned
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Round a salary for display (half to even).
pub fn round_salary(value: f64) -> i64 {
    value.round_ties_even() as i64
}

/// Case-insensitive substring match of a query against a vacancy title.
pub fn matches_title(title: &str, query: &str) -> bool {
    title.to_lowercase().contains(&query.to_lowercase())
}

/// Summarize all vacancies whose title contains `query`.
///
/// Returns `None` when nothing matches.
pub fn summarize(vacancies: &[Vacancy], query: &str) -> Option<VacancySummary> {
    let matched: Vec<&Vacancy> = vacancies
        .iter()
        .filter(|v| matches_title(&v.title, query))
        .collect();

    if matched.is_empty() {
        return None;
    }

    let mut salaries = Vec::new();
    let mut skills: Vec<&str> = Vec::new();
    let mut links = Vec::new();

    for vacancy in &matched {
        salaries.extend(vacancy.salary_values());
        skills.extend(vacancy.key_skills.iter().map(String::as_str));
        if let Some(ref url) = vacancy.url {
            links.push(url.clone());
        }
    }

    Some(VacancySummary {
        count: matched.len(),
        salaries,
        skills: clean_skills(&skills),
        links,
    })
}

/// Rank vacancy titles by mean salary, highest first.
///
/// Titles containing any of `excluded_words` are skipped, as are vacancies
/// without salary bounds. Vacancies sharing a title collapse into one entry:
/// the last one's salaries win, the first one's position is kept.
pub fn top_salary_vacancies(
    vacancies: &[Vacancy],
    excluded_words: &[String],
    n: usize,
) -> Vec<SalaryRank> {
    let excluded: Vec<String> = excluded_words
        .iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect();

    let mut order: Vec<String> = Vec::new();
    let mut by_title: HashMap<String, Vec<f64>> = HashMap::new();

    for vacancy in vacancies {
        let title = vacancy.title.to_lowercase();
        if excluded.iter().any(|word| title.contains(word.as_str())) {
            continue;
        }

        let salaries = vacancy.salary_values();
        if salaries.is_empty() {
            continue;
        }

        if by_title.insert(vacancy.title.clone(), salaries).is_none() {
            order.push(vacancy.title.clone());
        }
    }

    let mut ranks: Vec<SalaryRank> = order
        .into_iter()
        .filter_map(|title| {
            let salaries = by_title.remove(&title)?;
            let mean = mean(&salaries)?;
            Some(SalaryRank {
                title,
                salaries,
                mean,
            })
        })
        .collect();

    // Stable: equal means keep snapshot order
    ranks.sort_by(|a, b| b.mean.total_cmp(&a.mean));
    ranks.truncate(n);

    ranks
}

/// Count how many vacancies list each skill and return the `n` most common.
pub fn top_skills(vacancies: &[Vacancy], n: usize) -> Vec<SkillCount> {
    let mut counts: Vec<SkillCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for vacancy in vacancies {
        for skill in clean_skills(&vacancy.key_skills) {
            match index.get(&skill) {
                Some(&i) => counts[i].count += 1,
                None => {
                    index.insert(skill.clone(), counts.len());
                    counts.push(SkillCount { skill, count: 1 });
                }
            }
        }
    }

    counts.sort_by_key(|c| std::cmp::Reverse(c.count));
    counts.truncate(n);

    counts
}
