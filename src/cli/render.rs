use std::fmt::{self, Write};

use ansi_term::{Colour, Style};
use chrono::NaiveDate;

use crate::{
    aggregation::{ColorBand, DayProgress},
    calendar::MonthGrid,
    storage::entities::{DailyRecord, Task},
    utils::time::date_banner,
};

const WEEKDAY_HEADER: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];
const BLANK_CELL: &str = "     ";

/// Everything shown by the task view.
pub struct TodayView<'a> {
    pub title: &'a str,
    pub today: NaiveDate,
    pub tasks: &'a [Task],
    pub record: &'a DailyRecord,
    pub progress: DayProgress,
}

fn band_glyph(band: ColorBand) -> char {
    match band {
        ColorBand::Zero => '·',
        ColorBand::Low => '░',
        ColorBand::Medium => '▒',
        ColorBand::High => '▓',
        ColorBand::Complete => '█',
    }
}

fn band_style(band: ColorBand) -> Style {
    let (r, g, b) = band.rgb();
    let foreground = match band {
        ColorBand::Complete | ColorBand::High => Colour::White,
        _ => Colour::Black,
    };
    Style::new().on(Colour::RGB(r, g, b)).fg(foreground)
}

pub fn render_today(view: &TodayView, colored: bool) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "{}", view.title)?;
    writeln!(out, "{}", date_banner(view.today))?;
    writeln!(out)?;

    if view.tasks.is_empty() {
        writeln!(out, "No tasks yet. Add your first task with `consistency add <name>`.")?;
    } else {
        let width = view
            .tasks
            .iter()
            .map(|task| task.name.chars().count())
            .max()
            .unwrap_or(0);
        for task in view.tasks {
            let mark = if view.record.is_completed(&task.id) {
                'x'
            } else {
                ' '
            };
            writeln!(out, "  [{mark}] {:<width$}  {}", task.name, task.id)?;
        }
    }

    writeln!(out)?;
    let percentage = view.progress.percentage.to_string();
    let percentage = if colored {
        band_style(view.progress.band())
            .paint(format!(" {percentage} "))
            .to_string()
    } else {
        percentage
    };
    writeln!(
        out,
        "Completed {}/{} {}",
        view.progress.completed, view.progress.total, percentage
    )?;
    Ok(out)
}

pub fn render_calendar(grid: &MonthGrid, colored: bool) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "{}", grid.view.title())?;
    for name in WEEKDAY_HEADER {
        write!(out, " {name}  ")?;
    }
    writeln!(out)?;

    for week in grid.weeks() {
        for cell in week {
            let Some(cell) = cell else {
                out.push_str(BLANK_CELL);
                continue;
            };
            let (open, close) = if cell.is_today { ('[', ']') } else { (' ', ' ') };
            if colored {
                let text = format!("{open}{:>2}{close}", cell.day);
                write!(out, "{} ", band_style(cell.band).paint(text))?;
            } else {
                write!(out, "{open}{:>2}{}{close}", cell.day, band_glyph(cell.band))?;
            }
        }
        writeln!(out)?;
    }

    let bands = [
        ColorBand::Zero,
        ColorBand::Low,
        ColorBand::Medium,
        ColorBand::High,
        ColorBand::Complete,
    ];
    let legend = bands
        .iter()
        .map(|band| {
            if colored {
                band_style(*band).paint("  ").to_string()
            } else {
                band_glyph(*band).to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(out, "Less {legend} More")?;
    Ok(out)
}
