use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fern::colors::{Color, ColoredLevelConfig};
use log::error;

mod config;
mod datetime;
mod durations;
mod openai;
mod report;
mod wakatime;

use config::Config;
use openai::OpenAiClient;
use report::{ReportArgs, ReportCommand};
use wakatime::WakaTimeClient;

/// WakaTimeの計測データから日毎の作業レポートを作成するCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- --start-date 2024-10-21 --project sipe-web --project sipe-api
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(
        short = 'o',
        long = "output",
        help = "Sets the report file path",
        parse(from_os_str),
        default_value = "trabalho.csv",
    )]
    output: PathBuf,
    #[clap(flatten)]
    report: ReportArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logger().context("Failed to initialize the logger")?;
    dotenv::dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("{:#}", err);
            error!(
                "Please make sure you have the following environment variables set: {}, {}",
                config::OPENAI_API_KEY_VAR,
                config::WAKATIME_TOKEN_VAR
            );
            return Ok(());
        }
    };

    let wakatime_client = WakaTimeClient::new(&config.wakatime_token);
    let description_generator = OpenAiClient::new(&config.openai_api_key);
    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("Failed to create the report file: {}", args.output.display()))?;

    ReportCommand::new(&wakatime_client, &description_generator)
        .run(args.report, &mut writer)
        .await?;

    Ok(())
}

/// ロガーを初期化する。
fn setup_logger() -> Result<(), fern::InitError> {
    let colors = ColoredLevelConfig::new()
        .info(Color::Green)
        .warn(Color::Yellow)
        .error(Color::Red);
    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.target(),
                colors.color(record.level()),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stderr())
        .apply()?;

    Ok(())
}
