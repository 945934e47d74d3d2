//! Chat command parsing and dispatch.
//!
//! Maps a command message to an analytics query over the loaded snapshot and
//! renders the answer as text plus an optional chart.

use crate::analysis;
use crate::config::AnalyticsConfig;
use crate::models::{SalaryRank, Vacancy, VacancySummary};
use crate::report::{messages, Chart, ChartRenderer, SnapshotInfo};
use chrono::{DateTime, Local};
use std::fmt;
use tracing::{debug, warn};

/// Tick label size for single-vacancy charts.
const TICK_FONT_SIZE: u32 = 8;
/// Tick label size for ranking charts, which carry more labels.
const RANKING_TICK_FONT_SIZE: u32 = 7;

/// A bot command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Vacancy,
    Links,
    Analytics,
    SalaryPlot,
    TopSalaryVacancies,
    TopSkills,
    Unknown(String),
}

impl From<&str> for Command {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "start" | "help" => Command::Start,
            "vacancy" => Command::Vacancy,
            "links" => Command::Links,
            "analytics" => Command::Analytics,
            "salary_plot" => Command::SalaryPlot,
            "top_salary_vacancies" => Command::TopSalaryVacancies,
            "top_skills" => Command::TopSkills,
            other => Command::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Start => write!(f, "/start"),
            Command::Vacancy => write!(f, "/vacancy"),
            Command::Links => write!(f, "/links"),
            Command::Analytics => write!(f, "/analytics"),
            Command::SalaryPlot => write!(f, "/salary_plot"),
            Command::TopSalaryVacancies => write!(f, "/top_salary_vacancies"),
            Command::TopSkills => write!(f, "/top_skills"),
            Command::Unknown(name) => write!(f, "/{}", name),
        }
    }
}

/// A command with its whitespace-normalized argument string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: Command,
    pub args: String,
}

/// Parse a chat message into a command.
///
/// Returns `None` for plain text. A `@botname` suffix on the command is
/// ignored, and arguments are rejoined with single spaces.
pub fn parse_command(text: &str) -> Option<ParsedCommand> {
    let rest = text.trim_start().strip_prefix('/')?;
    if rest.starts_with(char::is_whitespace) {
        return None;
    }

    let mut parts = rest.split_whitespace();
    let head = parts.next()?;
    let name = head.split('@').next().unwrap_or(head);
    if name.is_empty() {
        return None;
    }

    Some(ParsedCommand {
        command: Command::from(name),
        args: parts.collect::<Vec<_>>().join(" "),
    })
}

/// Answer to a command: text first, then an optional chart.
#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub chart: Option<Chart>,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            chart: None,
        }
    }

    /// Attach a chart; if it could not be built the text goes out alone.
    fn with_chart(text: impl Into<String>, chart: anyhow::Result<Chart>) -> Self {
        let chart = match chart {
            Ok(chart) => Some(chart),
            Err(e) => {
                warn!("Failed to build chart: {:#}", e);
                None
            }
        };

        Self {
            text: text.into(),
            chart,
        }
    }
}

/// Answers commands from an in-memory snapshot.
pub struct Dispatcher {
    vacancies: Vec<Vacancy>,
    analytics: AnalyticsConfig,
    renderer: ChartRenderer,
    snapshot: SnapshotInfo,
}

impl Dispatcher {
    pub fn new(
        vacancies: Vec<Vacancy>,
        analytics: AnalyticsConfig,
        renderer: ChartRenderer,
        updated_at: Option<DateTime<Local>>,
    ) -> Self {
        let snapshot = SnapshotInfo {
            vacancies: vacancies.len(),
            updated_at,
        };

        Self {
            vacancies,
            analytics,
            renderer,
            snapshot,
        }
    }

    /// The chart renderer, for callers that rasterize replies.
    pub fn renderer(&self) -> &ChartRenderer {
        &self.renderer
    }

    /// Handle a chat message. Plain text gets no reply.
    pub fn handle(&self, text: &str) -> Option<Reply> {
        let parsed = parse_command(text)?;
        Some(self.execute(&parsed))
    }

    /// Run a parsed command.
    pub fn execute(&self, parsed: &ParsedCommand) -> Reply {
        debug!("Handling {} with args '{}'", parsed.command, parsed.args);
        let name = parsed.args.as_str();

        match &parsed.command {
            Command::Start => Reply::text(messages::welcome(&self.snapshot)),
            Command::Vacancy => self.with_summary(name, |summary| {
                Reply::text(messages::vacancy(name, summary))
            }),
            Command::Links => {
                self.with_summary(name, |summary| Reply::text(messages::links(summary)))
            }
            Command::Analytics => self.with_summary(name, |summary| {
                Reply::text(messages::analytics(name, summary))
            }),
            Command::SalaryPlot => self.with_summary(name, |summary| self.salary_plot(name, summary)),
            Command::TopSalaryVacancies => self.top_salary_vacancies(),
            Command::TopSkills => self.top_skills(),
            Command::Unknown(command) => Reply::text(messages::unknown_command(command)),
        }
    }

    fn with_summary<F>(&self, name: &str, respond: F) -> Reply
    where
        F: FnOnce(&VacancySummary) -> Reply,
    {
        if name.is_empty() {
            return Reply::text(messages::MISSING_NAME);
        }

        match analysis::summarize(&self.vacancies, name) {
            Some(summary) => respond(&summary),
            None => Reply::text(messages::not_found(name)),
        }
    }

    fn salary_plot(&self, name: &str, summary: &VacancySummary) -> Reply {
        let Some(mean) = summary.average_salary() else {
            return Reply::text(messages::SALARY_NOT_SPECIFIED_FOR_VACANCY);
        };

        let rank = SalaryRank {
            title: name.to_string(),
            salaries: summary.salaries.clone(),
            mean,
        };
        let chart = self.renderer.salary_chart(&[rank], TICK_FONT_SIZE);

        Reply::with_chart(messages::salary_plot_caption(name), chart)
    }

    fn top_salary_vacancies(&self) -> Reply {
        let ranks = analysis::top_salary_vacancies(
            &self.vacancies,
            &self.analytics.excluded_title_words,
            self.analytics.top_n,
        );

        if ranks.is_empty() {
            return Reply::text(messages::NO_RANKED_VACANCIES);
        }

        let chart = self.renderer.salary_chart(&ranks, RANKING_TICK_FONT_SIZE);
        Reply::with_chart(messages::top_salary(&ranks), chart)
    }

    fn top_skills(&self) -> Reply {
        let counts = analysis::top_skills(&self.vacancies, self.analytics.top_n);

        if counts.is_empty() {
            return Reply::text(messages::NO_SKILLS);
        }

        let chart = self.renderer.skills_chart(&counts, RANKING_TICK_FONT_SIZE);
        Reply::with_chart(messages::top_skills(&counts), chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChartsConfig;
    use crate::models::Salary;

    fn vacancy(id: &str, title: &str, from: Option<f64>, skills: &[&str]) -> Vacancy {
        Vacancy {
            id: id.to_string(),
            title: title.to_string(),
            salary: Some(Salary {
                from,
                to: None,
                currency: from.map(|_| "RUR".to_string()),
            }),
            key_skills: skills.iter().map(|s| s.to_string()).collect(),
            url: Some(format!("https://hh.ru/vacancy/{}", id)),
        }
    }

    fn dispatcher(vacancies: Vec<Vacancy>) -> Dispatcher {
        Dispatcher::new(
            vacancies,
            AnalyticsConfig::default(),
            ChartRenderer::new(&ChartsConfig::default()),
            None,
        )
    }

    fn sample() -> Dispatcher {
        dispatcher(vec![
            vacancy("1", "Аналитик SOC", Some(120_000.0), &["SIEM", "Linux"]),
            vacancy("2", "Старший аналитик SOC", Some(180_000.0), &["SIEM"]),
            vacancy("3", "Архитектор ИБ", Some(500_000.0), &["TOGAF"]),
            vacancy("4", "Пентестер", None, &[]),
        ])
    }

    #[test]
    fn test_parse_command() {
        let parsed = parse_command("/vacancy   Python \t Developer ").unwrap();
        assert_eq!(parsed.command, Command::Vacancy);
        assert_eq!(parsed.args, "Python Developer");

        let parsed = parse_command("/top_skills@vacancy_bot").unwrap();
        assert_eq!(parsed.command, Command::TopSkills);
        assert!(parsed.args.is_empty());

        assert_eq!(parse_command("/HELP").unwrap().command, Command::Start);
        assert_eq!(
            parse_command("/weather").unwrap().command,
            Command::Unknown("weather".to_string())
        );
        assert!(parse_command("hello").is_none());
        assert!(parse_command("/").is_none());
        assert!(parse_command("/ vacancy").is_none());
    }

    #[test]
    fn test_plain_text_is_ignored() {
        assert!(sample().handle("what's up").is_none());
    }

    #[test]
    fn test_start() {
        let reply = sample().handle("/start").unwrap();
        assert!(reply.text.contains("/salary_plot"));
        assert!(reply.text.contains("Вакансий в базе: 4"));
        assert!(reply.chart.is_none());
    }

    #[test]
    fn test_vacancy() {
        let reply = sample().handle("/vacancy soc").unwrap();

        assert!(reply.text.contains("по 'soc': 2"));
        assert!(reply.text.contains("150000 рублей"));
        assert!(reply.text.contains("SIEM\nLinux"));
        assert!(reply.text.contains("https://hh.ru/vacancy/2"));
        assert!(reply.chart.is_none());
    }

    #[test]
    fn test_missing_name_and_not_found() {
        let d = sample();
        for command in ["/vacancy", "/links", "/analytics", "/salary_plot"] {
            assert_eq!(d.handle(command).unwrap().text, messages::MISSING_NAME);
        }
        assert_eq!(
            d.handle("/links DevOps").unwrap().text,
            "❌ Вакансии по 'DevOps' не найдены."
        );
    }

    #[test]
    fn test_links_and_analytics() {
        let d = sample();

        let links = d.handle("/links пентестер").unwrap().text;
        assert_eq!(links, "🔗 Ссылки на вакансии:\nhttps://hh.ru/vacancy/4\n");

        let analytics = d.handle("/analytics пентестер").unwrap().text;
        assert!(analytics.contains("🚫 Зарплата не указана."));
        assert!(analytics.contains("🚫 Навыки не указаны."));
        assert!(!analytics.contains("hh.ru"));
    }

    #[test]
    fn test_salary_plot() {
        let d = sample();

        let reply = d.handle("/salary_plot SOC").unwrap();
        assert!(reply.text.contains("'SOC'"));
        let chart = reply.chart.unwrap();
        assert_eq!(chart.file_name, "salary_plot.png");
        assert!(chart.svg.contains("SOC"));

        let reply = d.handle("/salary_plot Пентестер").unwrap();
        assert_eq!(reply.text, messages::SALARY_NOT_SPECIFIED_FOR_VACANCY);
        assert!(reply.chart.is_none());
    }

    #[test]
    fn test_top_salary_vacancies_excludes_architects() {
        let reply = sample().handle("/top_salary_vacancies").unwrap();

        assert!(reply.text.starts_with("🏆 Топ 2 вакансий"));
        assert!(!reply.text.contains("Архитектор"));
        let first = reply.text.lines().nth(1).unwrap();
        assert_eq!(first, "Старший аналитик SOC: 180000 рублей");
        assert!(reply.chart.is_some());
    }

    #[test]
    fn test_top_skills() {
        let reply = sample().handle("/top_skills").unwrap();

        let lines: Vec<&str> = reply.text.lines().skip(1).collect();
        assert_eq!(lines[0], "SIEM: 2");
        assert!(lines.iter().all(|l| !l.starts_with("1.")));
        assert_eq!(reply.chart.unwrap().file_name, "skills_plot.png");
    }

    #[test]
    fn test_empty_snapshot_rankings() {
        let d = dispatcher(vec![]);
        assert_eq!(
            d.handle("/top_salary_vacancies").unwrap().text,
            messages::NO_RANKED_VACANCIES
        );
        assert_eq!(d.handle("/top_skills").unwrap().text, messages::NO_SKILLS);
    }

    #[test]
    fn test_unknown_command() {
        let reply = sample().handle("/weather today").unwrap();
        assert!(reply.text.contains("/weather"));
    }

    #[test]
    fn test_chart_failure_falls_back_to_text() {
        let reply = Reply::with_chart("📊", Err(anyhow::anyhow!("no bars")));
        assert_eq!(reply.text, "📊");
        assert!(reply.chart.is_none());
    }
}
