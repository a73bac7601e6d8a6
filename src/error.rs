use thiserror::Error;

/// 集計処理で発生するエラー。
#[derive(Debug, Error)]
pub enum KpiError {
    /// `YYYY-MM-DD`形式として解釈できない日付。
    #[error("Failed to parse date: {value}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

pub type KpiResult<T> = std::result::Result<T, KpiError>;
