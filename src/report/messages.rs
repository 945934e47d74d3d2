//! Chat reply text.
//!
//! Every user-facing string the bot sends is built here so the dispatcher
//! stays free of formatting details.

use crate::analysis::round_salary;
use crate::models::{SalaryRank, SkillCount, VacancySummary};
use chrono::{DateTime, Local};

pub const MISSING_NAME: &str = "🚫 Пожалуйста, укажите название вакансии.";
pub const SALARY_NOT_SPECIFIED_FOR_VACANCY: &str = "🚫 Зарплата не указана для данной вакансии.";
pub const NO_RANKED_VACANCIES: &str = "🚫 Нет доступных вакансий для отображения.";
pub const NO_SKILLS: &str = "🚫 Навыки не указаны ни в одной вакансии.";
pub const NO_LINKS: &str = "🚫 Ссылки на вакансии не найдены.";

/// What the welcome message says about the loaded snapshot.
#[derive(Debug, Clone, Default)]
pub struct SnapshotInfo {
    pub vacancies: usize,
    pub updated_at: Option<DateTime<Local>>,
}

/// Reply to `/start` and `/help`.
pub fn welcome(info: &SnapshotInfo) -> String {
    let mut text = String::new();

    text.push_str("👋 Привет! Я ваш помощник по поиску вакансий. 🤖\n");
    text.push_str("Вы можете использовать следующие команды:\n");
    text.push_str("/vacancy <название вакансии> - получить информацию о вакансиях по указанному названию.\n");
    text.push_str("/links <название вакансии> - получить только ссылки на вакансии по указанному названию.\n");
    text.push_str("/analytics <название вакансии> - получить только аналитику по вакансиям (зарплата и навыки).\n");
    text.push_str("/salary_plot <название вакансии> - получить график средней зарплаты.\n");
    text.push_str("/top_salary_vacancies - получить топ вакансий по среднему уровню зарплаты.\n");
    text.push_str("/top_skills - получить график топ навыков по количеству вакансий.\n");
    text.push_str("Например: /vacancy Python Developer\n");

    text.push_str(&format!("\n📦 Вакансий в базе: {}", info.vacancies));
    if let Some(updated_at) = info.updated_at {
        text.push_str(&format!(
            " (обновлено {})",
            updated_at.format("%Y-%m-%d %H:%M")
        ));
    }
    text.push('\n');

    text
}

/// Reply when nothing matched the query.
pub fn not_found(name: &str) -> String {
    format!("❌ Вакансии по '{}' не найдены.", name)
}

/// Reply to an unrecognized command.
pub fn unknown_command(command: &str) -> String {
    format!(
        "❓ Неизвестная команда /{}. Используйте /start, чтобы увидеть список команд.",
        command
    )
}

/// Full reply to `/vacancy`: count, salary, skills and links.
pub fn vacancy(name: &str, summary: &VacancySummary) -> String {
    let mut text = format!(
        "🔍 Количество вакансий по '{}': {}\n",
        name, summary.count
    );
    text.push_str(&salary_line(summary));
    text.push_str(&skills_block(summary));
    text.push_str(&links_block(&summary.links));
    text
}

/// Reply to `/links`.
pub fn links(summary: &VacancySummary) -> String {
    if summary.links.is_empty() {
        return NO_LINKS.to_string();
    }
    links_block(&summary.links)
}

/// Reply to `/analytics`: salary and skills only.
pub fn analytics(name: &str, summary: &VacancySummary) -> String {
    let mut text = format!("🔍 Аналитика по вакансиям '{}':\n", name);
    text.push_str(&salary_line(summary));
    text.push_str(&skills_block(summary));
    text
}

/// Caption sent before the `/salary_plot` chart.
pub fn salary_plot_caption(name: &str) -> String {
    format!("🌍 Распределение зарплат по вакансии '{}':\n", name)
}

/// Reply to `/top_salary_vacancies`.
pub fn top_salary(ranks: &[SalaryRank]) -> String {
    let mut text = format!(
        "🏆 Топ {} вакансий по средней зарплате:\n",
        ranks.len()
    );
    for rank in ranks {
        text.push_str(&format!(
            "{}: {} рублей\n",
            rank.title,
            round_salary(rank.mean)
        ));
    }
    text
}

/// Reply to `/top_skills`.
pub fn top_skills(counts: &[SkillCount]) -> String {
    let mut text = String::from("📊 Топ навыков по количеству вакансий:\n");
    for count in counts {
        text.push_str(&format!("{}: {}\n", count.skill, count.count));
    }
    text
}

fn salary_line(summary: &VacancySummary) -> String {
    match summary.average_salary() {
        Some(avg) => format!("💰 Средний уровень зарплаты: {} рублей\n", round_salary(avg)),
        None => "🚫 Зарплата не указана.\n".to_string(),
    }
}

fn skills_block(summary: &VacancySummary) -> String {
    if summary.skills.is_empty() {
        return "🚫 Навыки не указаны.\n".to_string();
    }
    format!("✔️ Навыки кандидатов:\n{}\n", summary.skills.join("\n"))
}

fn links_block(links: &[String]) -> String {
    format!("🔗 Ссылки на вакансии:\n{}\n", links.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn summary() -> VacancySummary {
        VacancySummary {
            count: 2,
            salaries: vec![100_000.0, 150_001.0],
            skills: vec!["SIEM".to_string(), "Linux".to_string()],
            links: vec![
                "https://hh.ru/vacancy/1".to_string(),
                "https://hh.ru/vacancy/2".to_string(),
            ],
        }
    }

    #[test]
    fn test_vacancy_reply() {
        let text = vacancy("SOC", &summary());

        assert!(text.starts_with("🔍 Количество вакансий по 'SOC': 2\n"));
        assert!(text.contains("💰 Средний уровень зарплаты: 125000 рублей\n"));
        assert!(text.contains("✔️ Навыки кандидатов:\nSIEM\nLinux\n"));
        assert!(text.ends_with("🔗 Ссылки на вакансии:\nhttps://hh.ru/vacancy/1\nhttps://hh.ru/vacancy/2\n"));
    }

    #[test]
    fn test_analytics_reply_without_data() {
        let empty = VacancySummary {
            count: 1,
            salaries: vec![],
            skills: vec![],
            links: vec![],
        };
        let text = analytics("SOC", &empty);

        assert_eq!(
            text,
            "🔍 Аналитика по вакансиям 'SOC':\n🚫 Зарплата не указана.\n🚫 Навыки не указаны.\n"
        );
        assert_eq!(links(&empty), NO_LINKS);
    }

    #[test]
    fn test_top_salary_reply() {
        let ranks = vec![
            SalaryRank {
                title: "Пентестер".to_string(),
                salaries: vec![250_000.0],
                mean: 250_000.0,
            },
            SalaryRank {
                title: "Аналитик".to_string(),
                salaries: vec![100_000.0, 140_001.0],
                mean: 120_000.5,
            },
        ];

        let text = top_salary(&ranks);
        assert_eq!(
            text,
            "🏆 Топ 2 вакансий по средней зарплате:\nПентестер: 250000 рублей\nАналитик: 120000 рублей\n"
        );
    }

    #[test]
    fn test_top_skills_reply() {
        let counts = vec![SkillCount {
            skill: "SIEM".to_string(),
            count: 3,
        }];
        assert_eq!(
            top_skills(&counts),
            "📊 Топ навыков по количеству вакансий:\nSIEM: 3\n"
        );
    }

    #[test]
    fn test_welcome_mentions_snapshot() {
        let info = SnapshotInfo {
            vacancies: 42,
            updated_at: Local.with_ymd_and_hms(2026, 10, 1, 9, 30, 0).single(),
        };
        let text = welcome(&info);

        assert!(text.contains("/top_skills"));
        assert!(text.contains("Вакансий в базе: 42 (обновлено 2026-10-01 09:30)"));
    }

    #[test]
    fn test_not_found_and_unknown() {
        assert_eq!(not_found("Rust"), "❌ Вакансии по 'Rust' не найдены.");
        assert!(unknown_command("foo").contains("/foo"));
    }
}
