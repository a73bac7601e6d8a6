use serde::Serialize;

use crate::participant::ParticipantSummary;
use crate::period::Granularity;
use crate::project_kpi::{PeriodProjectSummary, ProjectKpi};

/// メトリクス名の共通の接頭辞。
pub const METRIC_BASE_NAME: &str = "FreckleAPI";
const CATEGORY_PROJECTS: &str = "projects";
const CATEGORY_PARTICIPANTS: &str = "participants";

/// メトリクス名やソース名に使えない文字を置き換える。
///
/// 空白、`/`、`\`は`-`に置き換え、`#`、`(`、`)`は取り除く。
pub fn sanitize_metric_name(s: &str) -> String {
    s.chars()
        .filter_map(|c| match c {
            ' ' | '/' | '\\' => Some('-'),
            '#' | '(' | ')' => None,
            c => Some(c),
        })
        .collect()
}

/// 1つの計測値。
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Gauge {
    pub name: String,
    pub source: String,
    pub count: u32,
    pub sum: f64,
}

impl Gauge {
    fn new(name: String, source: &str, value: f64) -> Self {
        Self {
            name,
            source: sanitize_metric_name(source),
            count: 1,
            sum: value,
        }
    }
}

/// 送信するメトリクスの一覧。
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MetricBatch {
    pub gauges: Vec<Gauge>,
}

impl MetricBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.gauges.is_empty()
    }

    fn push(&mut self, name: String, source: &str, value: f64) {
        self.gauges.push(Gauge::new(name, source, value));
    }

    /// プロジェクト全体のメトリクスを追加する。
    pub fn register_project(&mut self, kpi: &ProjectKpi) {
        let prefix = format!("{}.{}", METRIC_BASE_NAME, CATEGORY_PROJECTS);
        let project = &kpi.project;
        let source = kpi.name();

        self.push(
            format!("{}.UnbillableMinutes", prefix),
            source,
            project.unbillable_minutes as f64,
        );
        self.push(
            format!("{}.BillableMinutes", prefix),
            source,
            project.billable_minutes as f64,
        );
        self.push(
            format!("{}.InvoicedMinutes", prefix),
            source,
            project.invoiced_minutes as f64,
        );
        self.push(
            format!("{}.InvoicedAmount", prefix),
            source,
            kpi.invoiced_total(),
        );
    }

    /// プロジェクト内の参加者のメトリクスを追加する。
    pub fn register_participant(&mut self, participant: &ParticipantSummary, project_name: &str) {
        let prefix = format!("{}.{}", METRIC_BASE_NAME, CATEGORY_PARTICIPANTS);
        let name = sanitize_metric_name(&participant.participant.display_name());

        self.push(
            format!("{}.UnbillableMinutes.{}", prefix, name),
            project_name,
            participant.unbillable_minutes as f64,
        );
        self.push(
            format!("{}.BillableMinutes.{}", prefix, name),
            project_name,
            participant.billable_minutes as f64,
        );
    }

    /// 期間ごとのプロジェクトのメトリクスを追加する。ソースは期間のラベルとする。
    pub fn register_period(
        &mut self,
        summary: &PeriodProjectSummary,
        project_name: &str,
        granularity: Granularity,
    ) {
        let prefix = format!("{}.{}", METRIC_BASE_NAME, granularity.metric_category());
        let name = sanitize_metric_name(project_name);
        let source = summary.period.label();

        self.push(
            format!("{}.InvoicedAmount.{}", prefix, name),
            &source,
            summary.invoice.total_amount,
        );
        self.push(
            format!("{}.UnbillableMinutes.{}", prefix, name),
            &source,
            summary.unbillable_minutes() as f64,
        );
        self.push(
            format!("{}.BillableMinutes.{}", prefix, name),
            &source,
            summary.billable_minutes() as f64,
        );
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::{sanitize_metric_name, MetricBatch};
    use crate::participant::tests::person;
    use crate::participant::ParticipantSummary;
    use crate::period::Granularity;
    use crate::project_kpi::tests::{invoice, project, sample_entries};
    use crate::project_kpi::ProjectKpi;

    #[rstest]
    #[case::plain("Alpha", "Alpha")]
    #[case::space("Big Project", "Big-Project")]
    #[case::slashes("a/b\\c", "a-b-c")]
    #[case::stripped("#42 (internal)", "42-internal")]
    #[case::empty("", "")]
    fn test_sanitize_metric_name(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_metric_name(input), expected);
    }

    proptest! {
        /// 2回適用しても結果が変わらず、禁止文字が残らない。
        #[test]
        fn test_sanitize_is_idempotent(input in ".*") {
            let once = sanitize_metric_name(&input);

            prop_assert_eq!(sanitize_metric_name(&once), once.clone());
            prop_assert!(!once.contains(|c: char| matches!(c, ' ' | '/' | '\\' | '#' | '(' | ')')));
        }

        /// 置き換え対象以外の文字はそのまま残る。
        #[test]
        fn test_sanitize_keeps_other_characters(input in "[^ /\\\\#()]*") {
            prop_assert_eq!(sanitize_metric_name(&input), input);
        }
    }

    #[test]
    fn test_register_project() {
        let kpi = ProjectKpi::new(
            project("My Project", vec![invoice("2016-01-15", 500.0)]),
            vec![],
        );
        let mut batch = MetricBatch::new();

        batch.register_project(&kpi);

        let gauges = batch
            .gauges
            .iter()
            .map(|g| (g.name.as_str(), g.source.as_str(), g.sum))
            .collect::<Vec<_>>();
        assert_eq!(
            gauges,
            vec![
                ("FreckleAPI.projects.UnbillableMinutes", "My-Project", 30.0),
                ("FreckleAPI.projects.BillableMinutes", "My-Project", 150.0),
                ("FreckleAPI.projects.InvoicedMinutes", "My-Project", 120.0),
                ("FreckleAPI.projects.InvoicedAmount", "My-Project", 500.0),
            ]
        );
        assert!(batch.gauges.iter().all(|g| g.count == 1));
    }

    #[test]
    fn test_register_project_without_invoices() {
        let kpi = ProjectKpi::new(project("Alpha", vec![]), vec![]);
        let mut batch = MetricBatch::new();

        batch.register_project(&kpi);

        let amount = &batch.gauges[3];
        assert_eq!(amount.name, "FreckleAPI.projects.InvoicedAmount");
        assert_eq!(amount.sum, 0.0);
        assert!(amount.sum.is_sign_positive());
    }

    #[test]
    fn test_register_participant_sanitizes_names() {
        let mut participant = person(7, "Mary Ann");
        participant.last_name = "O/Neil".to_string();
        let summary = ParticipantSummary {
            participant,
            billable_minutes: 90,
            unbillable_minutes: 15,
        };
        let mut batch = MetricBatch::new();

        batch.register_participant(&summary, "Alpha (old)");

        assert_eq!(batch.gauges.len(), 2);
        assert_eq!(
            batch.gauges[0].name,
            "FreckleAPI.participants.UnbillableMinutes.Mary-Ann-O-Neil"
        );
        assert_eq!(batch.gauges[0].source, "Alpha-old");
        assert_eq!(batch.gauges[0].sum, 15.0);
        assert_eq!(batch.gauges[1].sum, 90.0);
    }

    #[rstest]
    #[case(Granularity::Year, "FreckleAPI.yearlyParticipants.InvoicedAmount.Alpha", "2016")]
    #[case(Granularity::Month, "FreckleAPI.monthlyParticipants.InvoicedAmount.Alpha", "2016-01")]
    fn test_register_period(
        #[case] granularity: Granularity,
        #[case] first_name: &str,
        #[case] first_source: &str,
    ) {
        let kpi = ProjectKpi::new(
            project("Alpha", vec![invoice("2016-01-15", 500.0)]),
            sample_entries(),
        );
        let periods = kpi.per_period(granularity).unwrap();
        let mut batch = MetricBatch::new();

        batch.register_period(&periods[0], kpi.name(), granularity);

        assert_eq!(batch.gauges.len(), 3);
        assert_eq!(batch.gauges[0].name, first_name);
        assert_eq!(batch.gauges[0].source, first_source);
        assert_eq!(batch.gauges[0].sum, 500.0);
    }
}
