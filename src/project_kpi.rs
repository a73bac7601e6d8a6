use std::collections::HashMap;

use crate::error::KpiResult;
use crate::invoice::{summarize_invoices_per_period, PeriodInvoiceSummary};
use crate::participant::{
    summarize_participants, summarize_participants_per_period, ParticipantSummary,
    PeriodParticipants,
};
use crate::period::{Granularity, Period};
use crate::time_entry::{Project, TimeEntry};

/// 分を時間に変換する。
pub fn hours(minutes: i64) -> f64 {
    minutes as f64 / 60.0
}

/// 割り算の結果。割る数が0の場合は`None`を返す。
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// プロジェクトとそのプロジェクトに記録されたタイムエントリー。
#[derive(Clone, Debug)]
pub struct ProjectKpi {
    pub project: Project,
    pub entries: Vec<TimeEntry>,
}

impl ProjectKpi {
    pub fn new(project: Project, entries: Vec<TimeEntry>) -> Self {
        Self { project, entries }
    }

    pub fn name(&self) -> &str {
        &self.project.name
    }

    /// 請求額の総計。
    pub fn invoiced_total(&self) -> f64 {
        // 請求書がない場合は-0.0ではなく0.0
        self.project
            .invoices
            .iter()
            .fold(0.0, |total, invoice| total + invoice.total_amount)
    }

    pub fn invoiced_hours(&self) -> f64 {
        hours(self.project.invoiced_minutes)
    }

    /// 請求済み時間あたりの請求額。請求済み時間が0の場合は`None`。
    pub fn invoiced_hourly_rate(&self) -> Option<f64> {
        ratio(self.invoiced_total(), self.invoiced_hours())
    }

    pub fn billable_hours(&self) -> f64 {
        hours(self.project.billable_minutes)
    }

    /// 請求可能時間あたりの請求額。請求可能時間が0の場合は`None`。
    pub fn hourly_rate(&self) -> Option<f64> {
        ratio(self.invoiced_total(), self.billable_hours())
    }

    pub fn unbillable_hours(&self) -> f64 {
        hours(self.project.unbillable_minutes)
    }

    /// プロジェクト全体での参加者ごとの集計結果。
    pub fn participants(&self) -> Vec<ParticipantSummary> {
        summarize_participants(&self.entries)
    }

    /// 期間ごとの請求額と参加者の集計結果を返す。
    ///
    /// 請求だけ、または作業時間だけがある期間も結果に含める。期間はキーの昇順に並べる。
    pub fn per_period(&self, granularity: Granularity) -> KpiResult<Vec<PeriodProjectSummary>> {
        let invoices = summarize_invoices_per_period(granularity, &self.project.invoices)?;
        let participants = summarize_participants_per_period(granularity, &self.entries)?;

        let mut merged: HashMap<i32, PeriodProjectSummary> = HashMap::new();
        for invoice in invoices {
            let period = invoice.period.clone();
            merged
                .entry(period.key)
                .or_insert_with(|| PeriodProjectSummary::empty(period))
                .invoice = invoice;
        }
        for PeriodParticipants {
            period,
            participants,
        } in participants
        {
            merged
                .entry(period.key)
                .or_insert_with(|| PeriodProjectSummary::empty(period))
                .participants = participants;
        }

        let mut sorted = merged.into_values().collect::<Vec<_>>();
        sorted.sort_by_key(|summary| summary.period.key);

        Ok(sorted)
    }
}

/// ある期間のプロジェクトの集計結果。
#[derive(Clone, Debug)]
pub struct PeriodProjectSummary {
    pub period: Period,
    pub invoice: PeriodInvoiceSummary,
    pub participants: Vec<ParticipantSummary>,
}

impl PeriodProjectSummary {
    fn empty(period: Period) -> Self {
        Self {
            invoice: PeriodInvoiceSummary::empty(period.clone()),
            period,
            participants: Vec::new(),
        }
    }

    pub fn billable_minutes(&self) -> i64 {
        self.participants.iter().map(|p| p.billable_minutes).sum()
    }

    pub fn unbillable_minutes(&self) -> i64 {
        self.participants.iter().map(|p| p.unbillable_minutes).sum()
    }
}
