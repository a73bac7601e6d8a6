use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::KpiResult;
use crate::period::{Granularity, Period};
use crate::time_entry::Invoice;

/// ある期間の請求額の合計。
#[derive(Clone, Debug, PartialEq)]
pub struct PeriodInvoiceSummary {
    pub period: Period,
    pub total_amount: f64,
}

impl PeriodInvoiceSummary {
    /// 請求のない期間。
    pub fn empty(period: Period) -> Self {
        Self {
            period,
            total_amount: 0.0,
        }
    }
}

/// 古い期間から順に並べる。
pub fn chronological(a: &PeriodInvoiceSummary, b: &PeriodInvoiceSummary) -> Ordering {
    a.period.key.cmp(&b.period.key)
}

/// 請求書を期間ごとに集計する。
///
/// 日付をパースできない請求書があった場合はエラーをそのまま返す。
pub fn summarize_invoices_per_period(
    granularity: Granularity,
    invoices: &[Invoice],
) -> KpiResult<Vec<PeriodInvoiceSummary>> {
    let mut summaries: HashMap<i32, PeriodInvoiceSummary> = HashMap::new();
    for invoice in invoices {
        let period = Period::parse(granularity, &invoice.date)?;
        summaries
            .entry(period.key)
            .or_insert_with(|| PeriodInvoiceSummary::empty(period))
            .total_amount += invoice.total_amount;
    }

    let mut sorted = summaries.into_values().collect::<Vec<_>>();
    sorted.sort_by(chronological);

    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::summarize_invoices_per_period;
    use crate::period::Granularity;
    use crate::time_entry::Invoice;

    fn invoice(date: &str, total_amount: f64) -> Invoice {
        Invoice {
            date: date.to_string(),
            total_amount,
        }
    }

    fn sample_invoices() -> Vec<Invoice> {
        vec![
            invoice("2016-03-01", 100.0),
            invoice("2016-01-15", 500.0),
            invoice("2016-01-20", 250.0),
        ]
    }

    #[test]
    fn test_per_year() {
        let summaries =
            summarize_invoices_per_period(Granularity::Year, &sample_invoices()).unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].period.label(), "2016");
        assert_eq!(summaries[0].total_amount, 850.0);
    }

    /// 入力の順序に関係なく古い期間から並ぶ。
    #[test]
    fn test_per_month_is_chronological() {
        let summaries =
            summarize_invoices_per_period(Granularity::Month, &sample_invoices()).unwrap();

        let labels = summaries
            .iter()
            .map(|s| (s.period.label(), s.total_amount))
            .collect::<Vec<_>>();
        assert_eq!(
            labels,
            vec![("2016-01".to_string(), 750.0), ("2016-03".to_string(), 100.0)]
        );
    }

    #[test]
    fn test_across_year_boundary() {
        let invoices = vec![invoice("2016-01-02", 10.0), invoice("2015-12-30", 20.0)];

        let summaries = summarize_invoices_per_period(Granularity::Month, &invoices).unwrap();

        assert_eq!(summaries[0].period.key, 201512);
        assert_eq!(summaries[1].period.key, 201601);
    }

    #[rstest]
    #[case(Granularity::Month)]
    #[case(Granularity::Year)]
    fn test_period_totals_sum_to_grand_total(#[case] granularity: Granularity) {
        let invoices = sample_invoices();

        let summaries = summarize_invoices_per_period(granularity, &invoices).unwrap();

        let per_period: f64 = summaries.iter().map(|s| s.total_amount).sum();
        let total: f64 = invoices.iter().map(|i| i.total_amount).sum();
        assert!((per_period - total).abs() < 1e-9);
    }

    #[test]
    fn test_empty_invoices() {
        assert!(summarize_invoices_per_period(Granularity::Year, &[])
            .unwrap()
            .is_empty());
    }

    /// 1件でも不正な日付があれば結果を返さない。
    #[test]
    fn test_invalid_date() {
        let mut invoices = sample_invoices();
        invoices.push(invoice("2016-13-01", 1.0));

        assert!(summarize_invoices_per_period(Granularity::Month, &invoices).is_err());
    }
}
