//! Horizontal bar chart generation.
//!
//! Charts are laid out with plotters on its SVG backend and rasterized to PNG
//! with resvg when they need to leave the process.

use crate::config::ChartsConfig;
use crate::models::{SalaryRank, SkillCount};
use anyhow::{ensure, Context, Result};
use plotters::prelude::*;
use resvg::tiny_skia;
use resvg::usvg;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Longest label drawn on the y axis before it is cut.
const MAX_LABEL_CHARS: usize = 60;

const SALARY_COLOR: RGBColor = RGBColor(0x87, 0xCE, 0xEB);
const SKILLS_COLOR: RGBColor = RGBColor(0xF0, 0x80, 0x80);

const TITLE_FONT_SIZE: u32 = 16;
const AXIS_DESC_FONT_SIZE: u32 = 12;
const X_TICK_FONT_SIZE: u32 = 10;
const MAX_X_TICKS: usize = 11;

/// A rendered chart ready to be written or uploaded.
#[derive(Debug, Clone)]
pub struct Chart {
    /// Suggested file name for the PNG image.
    pub file_name: String,
    /// SVG source.
    pub svg: String,
}

impl Chart {
    /// Write the chart as PNG into `dir`, returning the file path.
    pub fn write_png(&self, renderer: &ChartRenderer, dir: &Path) -> Result<PathBuf> {
        let png = renderer.rasterize(&self.svg)?;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create chart directory {}", dir.display()))?;

        let path = dir.join(&self.file_name);
        std::fs::write(&path, png)
            .with_context(|| format!("Failed to write chart to {}", path.display()))?;
        Ok(path)
    }
}

/// Labels and styling of one bar chart.
struct BarChartSpec<'a> {
    title: &'a str,
    x_label: &'a str,
    y_label: &'a str,
    color: RGBColor,
    tick_font_size: u32,
}

/// Builds charts at a fixed canvas size and rasterizes them.
pub struct ChartRenderer {
    width: u32,
    height: u32,
    font_family: String,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl ChartRenderer {
    /// Renderer without any fonts loaded; text is skipped when rasterizing.
    pub fn new(config: &ChartsConfig) -> Self {
        Self {
            width: config.width.max(200),
            height: config.height.max(150),
            font_family: config.font_family.clone(),
            fontdb: Arc::new(usvg::fontdb::Database::new()),
        }
    }

    /// Load the system fonts used for chart text.
    pub fn with_system_fonts(mut self) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        debug!("Loaded {} font faces for charts", db.len());
        self.fontdb = Arc::new(db);
        self
    }

    /// Mean salary per vacancy title, in the given order (top to bottom).
    pub fn salary_chart(&self, ranks: &[SalaryRank], tick_font_size: u32) -> Result<Chart> {
        let bars: Vec<(&str, f64)> = ranks.iter().map(|r| (r.title.as_str(), r.mean)).collect();
        let spec = BarChartSpec {
            title: "Средняя зарплата по вакансиям",
            x_label: "Средняя зарплата (рублей)",
            y_label: "Вакансии",
            color: SALARY_COLOR,
            tick_font_size,
        };

        Ok(Chart {
            file_name: "salary_plot.png".to_string(),
            svg: self.bar_chart(&spec, &bars)?,
        })
    }

    /// Vacancy count per skill, in the given order (top to bottom).
    pub fn skills_chart(&self, counts: &[SkillCount], tick_font_size: u32) -> Result<Chart> {
        let bars: Vec<(&str, f64)> = counts
            .iter()
            .map(|c| (c.skill.as_str(), c.count as f64))
            .collect();
        let spec = BarChartSpec {
            title: "Топ навыков по количеству вакансий",
            x_label: "Количество вакансий",
            y_label: "Навыки",
            color: SKILLS_COLOR,
            tick_font_size,
        };

        Ok(Chart {
            file_name: "skills_plot.png".to_string(),
            svg: self.bar_chart(&spec, &bars)?,
        })
    }

    /// Rasterize an SVG document to PNG bytes.
    pub fn rasterize(&self, svg: &str) -> Result<Vec<u8>> {
        let mut options = usvg::Options::default();
        options.fontdb = Arc::clone(&self.fontdb);

        let tree = usvg::Tree::from_str(svg, &options).context("Failed to parse chart SVG")?;
        let size = tree.size().to_int_size();
        let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
            .context("Chart has an empty canvas")?;

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        pixmap.encode_png().context("Failed to encode chart PNG")
    }

    fn bar_chart(&self, spec: &BarChartSpec<'_>, bars: &[(&str, f64)]) -> Result<String> {
        ensure!(!bars.is_empty(), "Nothing to plot for '{}'", spec.title);

        let labels: Vec<String> = bars.iter().map(|(label, _)| truncate_label(label)).collect();
        // Y categories run bottom to top, so rank 0 goes last.
        let rows: Vec<usize> = (0..bars.len()).rev().collect();

        let max_value = bars.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
        let x_max = (max_value * 1.05).ceil().max(1.0);
        let x_ticks = (x_max as usize + 1).min(MAX_X_TICKS);

        let font = self.font_family.as_str();
        let tick_font = (font, spec.tick_font_size.max(1));

        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, self.height))
                .into_drawing_area();
            root.fill(&WHITE)?;

            let tick_style = tick_font.into_text_style(&root);
            let mut label_width = 0;
            for label in &labels {
                let (w, _) = root.estimate_text_size(label, &tick_style)?;
                label_width = label_width.max(w);
            }
            let y_label_area = (label_width + 15).clamp(60, self.width * 45 / 100);

            let mut chart = ChartBuilder::on(&root)
                .caption(spec.title, (font, TITLE_FONT_SIZE))
                .margin(15)
                .x_label_area_size(50)
                .y_label_area_size(y_label_area)
                .build_cartesian_2d(0f64..x_max, rows.as_slice().into_segmented())?;

            let row_label = |v: &SegmentValue<&usize>| match v {
                SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => {
                    labels.get(**i).cloned().unwrap_or_default()
                }
                SegmentValue::Last => String::new(),
            };

            chart
                .configure_mesh()
                .disable_y_mesh()
                .x_labels(x_ticks)
                .y_labels(bars.len())
                .x_label_formatter(&|v: &f64| format_tick(*v))
                .y_label_formatter(&row_label)
                .x_label_style((font, X_TICK_FONT_SIZE))
                .y_label_style(tick_font)
                .axis_desc_style((font, AXIS_DESC_FONT_SIZE))
                .x_desc(spec.x_label)
                .y_desc(spec.y_label)
                .draw()?;

            let band = chart.plotting_area().dim_in_pixel().1 / bars.len() as u32;
            let pad = band / 10;
            let color = spec.color;

            chart.draw_series(bars.iter().enumerate().map(|(rank, (_, value))| {
                let row = rows.len() - 1 - rank;
                let upper = rows.get(row + 1).map_or(SegmentValue::Last, SegmentValue::Exact);
                let mut bar = Rectangle::new(
                    [(0.0, SegmentValue::Exact(&rows[row])), (*value, upper)],
                    color.filled(),
                );
                bar.set_margin(pad, pad, 0, 0);
                bar
            }))?;

            root.present()?;
        }

        Ok(svg)
    }
}

fn format_tick(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

fn truncate_label(label: &str) -> String {
    if label.chars().count() <= MAX_LABEL_CHARS {
        return label.to_string();
    }
    let mut cut: String = label.chars().take(MAX_LABEL_CHARS - 1).collect();
    cut.push('…');
    cut
}
