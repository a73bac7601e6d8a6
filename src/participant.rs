use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::KpiResult;
use crate::period::{Granularity, Period};
use crate::time_entry::{Participant, TimeEntry};

/// 参加者ごとの請求可能/請求不可の作業時間(分)。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParticipantSummary {
    pub participant: Participant,
    pub billable_minutes: i64,
    pub unbillable_minutes: i64,
}

impl ParticipantSummary {
    fn new(participant: Participant) -> Self {
        Self {
            participant,
            billable_minutes: 0,
            unbillable_minutes: 0,
        }
    }

    fn add(&mut self, entry: &TimeEntry) {
        if entry.billable {
            self.billable_minutes += entry.minutes;
        } else {
            self.unbillable_minutes += entry.minutes;
        }
    }

    pub fn total_minutes(&self) -> i64 {
        self.billable_minutes + self.unbillable_minutes
    }
}

/// 作業時間の多い順。同じ場合は参加者IDの昇順とする。
pub fn by_volume_desc(a: &ParticipantSummary, b: &ParticipantSummary) -> Ordering {
    b.total_minutes()
        .cmp(&a.total_minutes())
        .then_with(|| a.participant.id.cmp(&b.participant.id))
}

/// ある期間の参加者ごとの集計結果。
#[derive(Clone, Debug)]
pub struct PeriodParticipants {
    pub period: Period,
    pub participants: Vec<ParticipantSummary>,
}

/// タイムエントリーを参加者ごとに集計する。
///
/// 結果は`by_volume_desc`の順に並べる。
pub fn summarize_participants<'a, I>(entries: I) -> Vec<ParticipantSummary>
where
    I: IntoIterator<Item = &'a TimeEntry>,
{
    let summaries: HashMap<i64, ParticipantSummary> =
        entries.into_iter().fold(HashMap::new(), |mut accumulate, entry| {
            accumulate
                .entry(entry.participant.id)
                .or_insert_with(|| ParticipantSummary::new(entry.participant.clone()))
                .add(entry);
            accumulate
        });

    let mut sorted = summaries.into_values().collect::<Vec<_>>();
    sorted.sort_by(by_volume_desc);
    sorted
}

/// タイムエントリーを期間ごと、かつ参加者ごとに集計する。
///
/// 期間はキーの昇順に並べる。日付をパースできないエントリーがあった場合はエラーを返し、途中までの結果は返さない。
pub fn summarize_participants_per_period(
    granularity: Granularity,
    entries: &[TimeEntry],
) -> KpiResult<Vec<PeriodParticipants>> {
    let mut grouped: HashMap<i32, (Period, Vec<&TimeEntry>)> = HashMap::new();
    for entry in entries {
        let period = Period::parse(granularity, &entry.date)?;
        grouped
            .entry(period.key)
            .or_insert_with(|| (period, Vec::new()))
            .1
            .push(entry);
    }

    let mut periods = grouped
        .into_values()
        .map(|(period, entries)| PeriodParticipants {
            period,
            participants: summarize_participants(entries),
        })
        .collect::<Vec<_>>();
    periods.sort_by_key(|p| p.period.key);

    Ok(periods)
}
