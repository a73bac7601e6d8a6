use anyhow::{Context, Result};
use log::{error, info, warn};
use reqwest::Client;

use crate::config::LibratoCredentials;
use crate::metrics::MetricBatch;
use crate::report_command::ProjectReport;

const LIBRATO_API_URL: &str = "https://metrics-api.librato.com/v1";

/// メトリクスの送信先。
#[allow(async_fn_in_trait)]
#[cfg_attr(test, mockall::automock)]
pub trait MetricsSink {
    /// メトリクスを1回だけ送信する。
    async fn submit(&self, batch: &MetricBatch) -> Result<()>;
}

/// Librato APIにメトリクスを送信するためのクライアント。
pub struct LibratoClient {
    client: Client,
    api_url: String,
    credentials: LibratoCredentials,
}

impl LibratoClient {
    pub fn new(credentials: LibratoCredentials) -> Self {
        Self::with_api_url(credentials, LIBRATO_API_URL)
    }

    pub fn with_api_url(credentials: LibratoCredentials, api_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }
}

impl MetricsSink for LibratoClient {
    async fn submit(&self, batch: &MetricBatch) -> Result<()> {
        let url = format!("{}/metrics", self.api_url);
        self.client
            .post(&url)
            .basic_auth(&self.credentials.account, Some(&self.credentials.token))
            .json(batch)
            .send()
            .await
            .with_context(|| format!("Failed to send request to Librato API at {}", url))?
            .error_for_status()
            .context("Request returned an error status")?;
        info!("Posted {} gauges to librato", batch.gauges.len());

        Ok(())
    }
}

/// メトリクスを送信する。
///
/// 送信に失敗しても処理は止めず、エラーを表示するだけとする。空の場合は送信しない。
pub async fn push_metrics<S: MetricsSink>(sink: &S, batch: &MetricBatch) {
    if batch.is_empty() {
        info!("No metrics to post");
        return;
    }
    if let Err(err) = sink.submit(batch).await {
        error!("An error occurred while POSTing the metrics to librato: {:#}", err);
    }
}

/// 集計結果のメトリクスを送信する。
///
/// `enabled`が`true`で、かつ認証情報がそろっている場合のみ`connect`で送信先を作って送信する。
/// それ以外の場合は何も送信しない。
///
/// # Arguments
///
/// * `enabled` - `--librato`が指定されたかどうか
/// * `credentials` - Libratoの認証情報
/// * `connect` - 認証情報から送信先を作る関数
/// * `reports` - 送信する集計結果
pub async fn push_report_metrics<S, F>(
    enabled: bool,
    credentials: Option<LibratoCredentials>,
    connect: F,
    reports: &[ProjectReport],
) where
    S: MetricsSink,
    F: FnOnce(LibratoCredentials) -> S,
{
    if !enabled {
        return;
    }
    let Some(credentials) = credentials else {
        warn!("Librato credentials are not set, skipping metrics");
        return;
    };

    let mut batch = MetricBatch::new();
    for report in reports {
        report.register_metrics(&mut batch);
    }
    push_metrics(&connect(credentials), &batch).await;
}
