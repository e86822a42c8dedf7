use crate::error::LadderError;
use crate::types::*;
use log::info;
use std::io::Write;

/// Destination for end-of-season reports. A failing sink aborts the run.
pub trait ReportSink {
    fn write_season_report(&mut self, report: &SeasonReport) -> Result<(), LadderError>;
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn write_season_report(&mut self, report: &SeasonReport) -> Result<(), LadderError> {
        (**self).write_season_report(report)
    }
}

/// Keeps every report in memory
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    pub reports: Vec<SeasonReport>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&SeasonReport> {
        self.reports.last()
    }
}

impl ReportSink for MemorySink {
    fn write_season_report(&mut self, report: &SeasonReport) -> Result<(), LadderError> {
        self.reports.push(report.clone());
        Ok(())
    }
}

/// Writes populated ranks as CSV records, one header for the whole run
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    header_written: bool,
}

const CSV_HEADER: [&str; 7] = [
    "Season",
    "Rank",
    "Player Count",
    "Average Games Played",
    "Average Skill",
    "Std Dev",
    "Average Progression Count",
];

impl CsvSink<std::fs::File> {
    pub fn create(path: &std::path::Path) -> Result<Self, LadderError> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(file))
    }
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
            header_written: false,
        }
    }

    pub fn into_inner(self) -> Result<W, LadderError> {
        self.writer.into_inner().map_err(|e| {
            LadderError::Io(std::io::Error::new(e.error().kind(), e.error().to_string()))
        })
    }
}

impl<W: Write> ReportSink for CsvSink<W> {
    fn write_season_report(&mut self, report: &SeasonReport) -> Result<(), LadderError> {
        if !self.header_written {
            self.writer.write_record(CSV_HEADER)?;
            self.header_written = true;
        }

        for row in report.rows.iter().filter(|row| row.count > 0) {
            self.writer.write_record([
                report.season.to_string(),
                row.rank.to_string(),
                row.count.to_string(),
                format!("{:.6}", row.mean_games_played),
                format_optional(row.mean_skill),
                format_optional(row.std_dev_skill),
                format_optional(row.mean_games_to_progress),
            ])?;
        }

        self.writer.flush()?;
        Ok(())
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map(|v| format!("{:.6}", v)).unwrap_or_default()
}

/// Human-readable line for one rank, shared by the log and browser sinks
pub fn format_rank_row(row: &RankRow) -> String {
    match (row.mean_skill, row.std_dev_skill) {
        (Some(skill), Some(std_dev)) => {
            let mut line = format!(
                "Rank {}\tPlayers: {}\tGamesPlayed: {:.0}\tSkill: {:.4}\tStdDev: {:.4}",
                row.rank, row.count, row.mean_games_played, skill, std_dev
            );
            if let Some(progress) = row.mean_games_to_progress {
                line.push_str(&format!("\tGamesToProgressPastRank: {:.0}", progress));
            }
            line
        }
        _ => format!(
            "Rank {}\tPlayers: 0\tGamesPlayed: 0\tSkill: n/a\tStdDev: n/a\tGamesToProgress: n/a",
            row.rank
        ),
    }
}

/// Reports through the `log` facade
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn write_season_report(&mut self, report: &SeasonReport) -> Result<(), LadderError> {
        info!("Season {} Rankings:", report.season);
        for row in &report.rows {
            info!("{}", format_rank_row(row));
        }
        Ok(())
    }
}

/// Reports to the browser console
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleSink;

impl ReportSink for ConsoleSink {
    fn write_season_report(&mut self, report: &SeasonReport) -> Result<(), LadderError> {
        web_sys::console::log_1(&format!("Season {} Rankings:", report.season).into());
        for row in &report.rows {
            web_sys::console::log_1(&format_rank_row(row).into());
        }
        Ok(())
    }
}

/// Forwards every report to two sinks, stopping at the first failure
pub struct TeeSink<A, B> {
    first: A,
    second: B,
}

impl<A: ReportSink, B: ReportSink> TeeSink<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    pub fn into_parts(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: ReportSink, B: ReportSink> ReportSink for TeeSink<A, B> {
    fn write_season_report(&mut self, report: &SeasonReport) -> Result<(), LadderError> {
        self.first.write_season_report(report)?;
        self.second.write_season_report(report)
    }
}
