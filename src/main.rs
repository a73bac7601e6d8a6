use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use fern::colors::{Color, ColoredLevelConfig};
use log::{info, LevelFilter};

mod config;
mod console;
mod error;
mod freckle;
mod invoice;
mod librato;
mod metrics;
mod participant;
mod period;
mod project_kpi;
mod report_command;
mod time_entry;

use config::Config;
use console::{ConsolePresenter, ConsoleTextReport};
use freckle::FreckleClient;
use librato::{push_report_metrics, LibratoClient};
use report_command::{ReportArgs, ReportCommand};

/// Freckleのプロジェクトごとの請求額と作業時間を集計するCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- --period month "My Project"
/// $ cargo run -- --librato
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(flatten)]
    report: ReportArgs,

    #[clap(short = 'v', long = "verbose", help = "Show debug logs")]
    verbose: bool,
}

/// ログを標準エラー出力に出すように設定する。
fn setup_logger(verbose: bool) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue);
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(LevelFilter::Warn)
        .level_for(env!("CARGO_CRATE_NAME"), level)
        .chain(io::stderr())
        .apply()
        .context("Failed to set up logger")?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logger(args.verbose)?;

    let config = Config::from_env()?;
    let freckle_client =
        FreckleClient::new(&config.freckle_token).context("Failed to new freckle client")?;

    let command = ReportCommand::new(&freckle_client);
    let reports = command.run(&args.report).await?;
    info!("Reports built: {}", reports.len());

    let mut stdout = io::stdout().lock();
    ConsoleTextReport::new(&mut stdout).show_reports(&reports)?;

    push_report_metrics(
        args.report.librato,
        config.librato,
        LibratoClient::new,
        &reports,
    )
    .await;

    Ok(())
}
