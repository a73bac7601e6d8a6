use std::collections::HashSet;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use reqwest::{
    header::{HeaderMap, ACCEPT, LINK},
    Client,
};
use serde::{de::DeserializeOwned, Deserialize};

use crate::time_entry::{Invoice, Participant, Project, TimeEntry};

const FRECKLE_API_URL: &str = "https://api.letsfreckle.com/v2";
const TOKEN_HEADER: &str = "X-FreckleToken";
const PER_PAGE: u32 = 1000;

/// Freckle APIのユーザー情報をデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct FreckleUser {
    id: i64,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

/// Freckle APIのタイムエントリーをデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct FreckleEntry {
    date: String,
    #[serde(default)]
    minutes: i64,
    #[serde(default)]
    billable: bool,
    user: FreckleUser,
}

#[derive(Debug, Deserialize)]
struct FreckleInvoice {
    invoice_date: String,
    #[serde(default)]
    total_amount: f64,
}

/// Freckle APIのプロジェクト情報をデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct FreckleProject {
    id: i64,
    name: String,
    #[serde(default)]
    billable_minutes: i64,
    #[serde(default)]
    unbillable_minutes: i64,
    #[serde(default)]
    invoiced_minutes: i64,
    #[serde(default)]
    invoices: Vec<FreckleInvoice>,
}

impl From<FreckleEntry> for TimeEntry {
    fn from(entry: FreckleEntry) -> Self {
        TimeEntry {
            participant: Participant {
                id: entry.user.id,
                email: entry.user.email.unwrap_or_default(),
                first_name: entry.user.first_name.unwrap_or_default(),
                last_name: entry.user.last_name.unwrap_or_default(),
            },
            date: entry.date,
            minutes: entry.minutes,
            billable: entry.billable,
        }
    }
}

impl From<FreckleProject> for Project {
    fn from(project: FreckleProject) -> Self {
        Project {
            id: project.id,
            name: project.name,
            billable_minutes: project.billable_minutes,
            unbillable_minutes: project.unbillable_minutes,
            invoiced_minutes: project.invoiced_minutes,
            invoices: project
                .invoices
                .into_iter()
                .map(|invoice| Invoice {
                    date: invoice.invoice_date,
                    total_amount: invoice.total_amount,
                })
                .collect(),
        }
    }
}

/// Freckle APIからデータを取得するためのリポジトリ。
#[allow(async_fn_in_trait)]
#[cfg_attr(test, mockall::automock)]
pub trait FreckleRepository {
    /// 全てのプロジェクトを取得する。
    async fn list_projects(&self) -> Result<Vec<Project>>;

    /// プロジェクトの全てのタイムエントリーを取得する。
    ///
    /// # Arguments
    ///
    /// * `project_id` - 対象のプロジェクトのID
    async fn list_entries(&self, project_id: i64) -> Result<Vec<TimeEntry>>;
}

/// ページングして取得した結果。
struct Pages<T> {
    items: Vec<T>,
    /// 途中のページで発生したエラー。
    error: Option<anyhow::Error>,
}

/// Freckle APIと通信するためのクライアント。
///
/// # Examples
///
/// ```
/// let client = FreckleClient::new("token").unwrap();
/// let projects = client.list_projects().await.unwrap();
/// ```
pub struct FreckleClient {
    client: Client,
    api_url: String,
    api_token: String,
}

impl FreckleClient {
    /// 新しい`FreckleClient`を返す。
    pub fn new(api_token: &str) -> Result<Self> {
        Self::with_api_url(api_token, FRECKLE_API_URL)
    }

    /// 接続先を指定して新しい`FreckleClient`を返す。
    pub fn with_api_url(api_token: &str, api_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build http client")?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
        })
    }

    /// 1ページ分を取得し、次のページのURLと一緒に返す。
    async fn read_page<T: DeserializeOwned>(&self, url: &str) -> Result<(Vec<T>, Option<String>)> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header(TOKEN_HEADER, &self.api_token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to send request to Freckle API at {}", url))?
            .error_for_status()
            .context("Request returned an error status")?;
        let next = next_page_url(response.headers());
        let items = response
            .json::<Vec<T>>()
            .await
            .context("Failed to deserialize response")?;

        Ok((items, next))
    }

    /// `Link`ヘッダーをたどって全てのページを取得する。
    ///
    /// 取得済みのページを次のページとして指している場合は、そこで取得をやめる。
    async fn read_all<T: DeserializeOwned>(&self, path: &str) -> Pages<T> {
        let mut items = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(format!("{}{}?page=1&per_page={}", self.api_url, path, PER_PAGE));

        while let Some(url) = next.take() {
            if !visited.insert(url.clone()) {
                warn!("Page {} was already fetched, stopping pagination", url);
                break;
            }
            match self.read_page::<T>(&url).await {
                Ok((page, next_url)) => {
                    items.extend(page);
                    next = next_url;
                }
                Err(error) => {
                    return Pages {
                        items,
                        error: Some(error),
                    }
                }
            }
        }

        Pages { items, error: None }
    }
}

impl FreckleRepository for FreckleClient {
    /// 最初のページの取得に失敗した場合はエラーを返す。
    /// 以降のページで失敗した場合は警告を出し、それまでに取得したプロジェクトを返す。
    async fn list_projects(&self) -> Result<Vec<Project>> {
        let pages = self.read_all::<FreckleProject>("/projects").await;
        match pages.error {
            Some(error) if pages.items.is_empty() => {
                return Err(error.context("Failed to get project list from freckle"))
            }
            Some(error) => warn!(
                "Project list is incomplete, continuing with {} projects: {:#}",
                pages.items.len(),
                error
            ),
            None => info!("length of projects: {}", pages.items.len()),
        }

        Ok(pages.items.into_iter().map(Project::from).collect())
    }

    async fn list_entries(&self, project_id: i64) -> Result<Vec<TimeEntry>> {
        let pages = self
            .read_all::<FreckleEntry>(&format!("/projects/{}/entries", project_id))
            .await;
        if let Some(error) = pages.error {
            return Err(error.context(format!(
                "Failed to get entries of project {} from freckle",
                project_id
            )));
        }

        Ok(pages.items.into_iter().map(TimeEntry::from).collect())
    }
}

/// `Link`ヘッダーから`rel="next"`のURLを取り出す。
fn next_page_url(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|part| {
        let (url, params) = part.split_once(';')?;
        params
            .split(';')
            .any(|param| param.trim() == r#"rel="next""#)
            .then(|| {
                url.trim()
                    .trim_start_matches('<')
                    .trim_end_matches('>')
                    .to_string()
            })
    })
}
