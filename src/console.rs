use std::io::Write;

use anyhow::{Context, Result};

use crate::participant::ParticipantSummary;
use crate::project_kpi::{hours, ratio, PeriodProjectSummary, ProjectKpi};
use crate::report_command::ProjectReport;

/// 値がない場合の表示。
const NOT_AVAILABLE: &str = "N/A";

/// Consoleにプロジェクトの集計結果を表示するためのtrait。
pub trait ConsolePresenter {
    /// 集計結果を表示する。
    ///
    /// # Arguments
    ///
    /// * `reports` - 表示するプロジェクトごとの集計結果
    fn show_reports(&mut self, reports: &[ProjectReport]) -> Result<()>;
}

/// 集計結果をタブでインデントしたテキストで表示する。
pub struct ConsoleTextReport<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleTextReport<'a, W> {
    /// 新しい`ConsoleTextReport`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }

    fn show_report(&mut self, report: &ProjectReport) -> Result<()> {
        writeln!(self.writer, "{}", project_line(&report.kpi))?;
        for participant in &report.participants {
            writeln!(
                self.writer,
                "\t{}",
                participant_verbose_line(participant, &report.kpi)
            )?;
        }

        writeln!(self.writer)?;
        writeln!(self.writer, "\tbreakdown per {}", report.granularity)?;
        for period in &report.periods {
            writeln!(self.writer, "\t\t{}", period_line(period))?;
            for participant in &period.participants {
                writeln!(self.writer, "\t\t\t{}", participant_line(participant))?;
            }
        }

        Ok(())
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleTextReport<'a, W> {
    fn show_reports(&mut self, reports: &[ProjectReport]) -> Result<()> {
        for report in reports {
            self.show_report(report)
                .with_context(|| format!("Failed to write report: {}", report.kpi.name()))?;
        }

        Ok(())
    }
}

fn format_optional(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}", v))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// プロジェクト全体の1行サマリー。
pub fn project_line(kpi: &ProjectKpi) -> String {
    format!(
        "{} total invoiced : ${:.2}, {:.1}h ({}$/h) - Billable : {:.1}h ({}$/h) - Unbillable : {:.1}h",
        kpi.name(),
        kpi.invoiced_total(),
        kpi.invoiced_hours(),
        format_optional(kpi.invoiced_hourly_rate()),
        kpi.billable_hours(),
        format_optional(kpi.hourly_rate()),
        kpi.unbillable_hours(),
    )
}

pub fn participant_line(participant: &ParticipantSummary) -> String {
    format!(
        "{} Billable : {:.1}h - Unbillable : {:.1}h",
        participant.participant.email,
        hours(participant.billable_minutes),
        hours(participant.unbillable_minutes),
    )
}

/// プロジェクト全体に対する参加者の割合を含む1行サマリー。
pub fn participant_verbose_line(participant: &ParticipantSummary, kpi: &ProjectKpi) -> String {
    let percent = |minutes: i64, total: i64| {
        ratio(minutes as f64, total as f64).map(|r| r * 100.0)
    };
    format!(
        "{} Billable : {:.1}h ({} %) - Unbillable : {:.1}h ({} %)",
        participant.participant.email,
        hours(participant.billable_minutes),
        format_optional(percent(
            participant.billable_minutes,
            kpi.project.billable_minutes
        )),
        hours(participant.unbillable_minutes),
        format_optional(percent(
            participant.unbillable_minutes,
            kpi.project.unbillable_minutes
        )),
    )
}

pub fn period_line(summary: &PeriodProjectSummary) -> String {
    format!(
        "{} ${:.2} invoiced",
        summary.period.label(),
        summary.invoice.total_amount
    )
}
