use anyhow::{Context, Result};
use log::{error, info, warn};

use crate::freckle::FreckleRepository;
use crate::metrics::MetricBatch;
use crate::participant::ParticipantSummary;
use crate::period::Granularity;
use crate::project_kpi::{PeriodProjectSummary, ProjectKpi};
use crate::time_entry::Project;

/// レポートの引数。
#[derive(Debug, clap::Args)]
pub struct ReportArgs {
    #[clap(
        long = "period",
        value_enum,
        default_value = "year",
        help = "Time period you want to build the aggregation on"
    )]
    pub period: Granularity,

    #[clap(long = "librato", help = "Push metrics to librato")]
    pub librato: bool,

    #[clap(value_name = "PROJECT", help = "Only report these projects (all when empty)")]
    pub projects: Vec<String>,
}

/// 1プロジェクト分の集計結果。
#[derive(Clone, Debug)]
pub struct ProjectReport {
    pub kpi: ProjectKpi,
    pub participants: Vec<ParticipantSummary>,
    pub granularity: Granularity,
    pub periods: Vec<PeriodProjectSummary>,
}

impl ProjectReport {
    /// プロジェクト全体と期間ごとの集計を行う。
    pub fn build(kpi: ProjectKpi, granularity: Granularity) -> Result<Self> {
        let periods = kpi
            .per_period(granularity)
            .with_context(|| format!("Failed to aggregate project: {}", kpi.name()))?;
        let participants = kpi.participants();

        Ok(Self {
            kpi,
            participants,
            granularity,
            periods,
        })
    }

    /// この集計結果のメトリクスを追加する。
    pub fn register_metrics(&self, batch: &mut MetricBatch) {
        batch.register_project(&self.kpi);
        for participant in &self.participants {
            batch.register_participant(participant, self.kpi.name());
        }
        for period in &self.periods {
            batch.register_period(period, self.kpi.name(), self.granularity);
        }
    }
}

/// 名前で対象のプロジェクトを絞り込む。
///
/// 名前が指定されていない場合は全てのプロジェクトを対象とする。
/// 指定された名前が全て見つかった時点で以降のプロジェクトは見ない。
pub fn select_projects(projects: Vec<Project>, names: &[String]) -> Vec<Project> {
    if names.is_empty() {
        return projects;
    }

    let mut remaining = names.to_vec();
    let mut selected = Vec::new();
    for project in projects {
        if remaining.is_empty() {
            break;
        }
        if let Some(index) = remaining.iter().position(|name| *name == project.name) {
            remaining.swap_remove(index);
            selected.push(project);
        }
    }
    for name in remaining {
        warn!("Project not found: {}", name);
    }

    selected
}

pub struct ReportCommand<'a, T: FreckleRepository> {
    freckle_client: &'a T,
}

impl<'a, T: FreckleRepository> ReportCommand<'a, T> {
    /// 新しい`ReportCommand`を返す。
    ///
    /// # Arguments
    /// * `freckle_client` - Freckle APIと通信するためのリポジトリ
    pub fn new(freckle_client: &'a T) -> Self {
        Self { freckle_client }
    }

    /// プロジェクトごとの集計を行う。
    ///
    /// プロジェクト一覧の取得に失敗した場合はエラーを報告し、0件として続行する。
    /// タイムエントリーの取得や日付のパースに失敗した場合は全体をエラーとする。
    ///
    /// # Arguments
    ///
    /// * `args` - レポートの引数
    pub async fn run(&self, args: &ReportArgs) -> Result<Vec<ProjectReport>> {
        let projects = match self.freckle_client.list_projects().await {
            Ok(projects) => projects,
            Err(err) => {
                error!("An error occurred while getting the project list: {:#}", err);
                Vec::new()
            }
        };
        info!("Projects retrieved: {}", projects.len());

        let mut reports = Vec::new();
        for project in select_projects(projects, &args.projects) {
            let entries = self
                .freckle_client
                .list_entries(project.id)
                .await
                .with_context(|| {
                    format!("Failed to retrieve entries for project: {}", project.name)
                })?;
            info!("Entries retrieved for {}: {}", project.name, entries.len());

            let report = ProjectReport::build(ProjectKpi::new(project, entries), args.period)?;
            reports.push(report);
        }

        Ok(reports)
    }
}
