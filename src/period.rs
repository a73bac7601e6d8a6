use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};

use crate::error::{KpiError, KpiResult};

/// APIから受け取る日付の形式。
const DATE_FORMAT: &str = "%Y-%m-%d";

/// 集計の粒度。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Granularity {
    Month,
    Year,
}

impl Granularity {
    /// 集計キーを返す。
    ///
    /// 月単位では`year * 100 + month`、年単位では`year`となり、時間に対して単調増加する。
    pub fn key(&self, date: NaiveDate) -> i32 {
        match self {
            Granularity::Month => date.year() * 100 + date.month() as i32,
            Granularity::Year => date.year(),
        }
    }

    /// 期間の開始日時(UTCの00:00:00)を返す。
    pub fn start(&self, date: NaiveDate) -> DateTime<Utc> {
        let first_day = match self {
            Granularity::Month => date - Duration::days(date.day0() as i64),
            Granularity::Year => date - Duration::days(date.ordinal0() as i64),
        };
        first_day.and_time(NaiveTime::MIN).and_utc()
    }

    /// 表示用のラベルを返す。
    pub fn label(&self, date: NaiveDate) -> String {
        match self {
            Granularity::Month => format!("{}-{:02}", date.year(), date.month()),
            Granularity::Year => format!("{}", date.year()),
        }
    }

    /// `monthlyParticipants`のようなメトリクスのカテゴリ名。
    pub fn metric_category(&self) -> &'static str {
        match self {
            Granularity::Month => "monthlyParticipants",
            Granularity::Year => "yearlyParticipants",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Month => write!(f, "month"),
            Granularity::Year => write!(f, "year"),
        }
    }
}

/// 集計単位となる期間。
///
/// 同じ`key`を持つ日付は同じ期間に属する。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Period {
    pub granularity: Granularity,
    pub key: i32,
    pub start: DateTime<Utc>,
}

impl Period {
    /// 日付を含む期間を返す。
    pub fn containing(granularity: Granularity, date: NaiveDate) -> Self {
        Self {
            granularity,
            key: granularity.key(date),
            start: granularity.start(date),
        }
    }

    /// `YYYY-MM-DD`形式の文字列から期間を求める。
    pub fn parse(granularity: Granularity, date: &str) -> KpiResult<Self> {
        Ok(Self::containing(granularity, parse_date(date)?))
    }

    pub fn label(&self) -> String {
        self.granularity.label(self.start.date_naive())
    }
}

/// 日付をパースする。
pub fn parse_date(s: &str) -> KpiResult<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|source| KpiError::InvalidDate {
        value: s.to_string(),
        source,
    })
}
