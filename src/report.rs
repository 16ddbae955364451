use std::io::Write;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use log::{error, info};

use crate::datetime::{self, format_duration, weekday_abbrev};
use crate::durations::DurationEntry;
use crate::openai::DescriptionGenerator;
use crate::wakatime::{WakaTimeError, WakaTimeRepository};

/// レポートのヘッダー行。
const CSV_HEADER: [&str; 3] = ["Data", "Horas", "Descrição"];

/// 日毎の作業レポートを作成するための引数。
#[derive(Debug, clap::Args)]
pub struct ReportArgs {
    #[clap(
        short = 's',
        long = "start-date",
        help = "Sets the analysis start date in the format YYYY-MM-DD",
        parse(try_from_str = parse_date),
    )]
    start_date: NaiveDate,
    #[clap(
        short = 'e',
        long = "end-date",
        help = "Sets the analysis end date in the format YYYY-MM-DD (defaults to today)",
        parse(try_from_str = parse_date),
    )]
    end_date: Option<NaiveDate>,
    #[clap(
        short = 'p',
        long = "project",
        help = "Adds a project to aggregate (can be repeated)",
        required = true,
    )]
    projects: Vec<String>,
}

/// 1日分の集計結果。
struct DailyWork {
    entries: Vec<DurationEntry>,
    total_duration: f64,
}

pub struct ReportCommand<'a, W: WakaTimeRepository, G: DescriptionGenerator> {
    wakatime_client: &'a W,
    description_generator: &'a G,
}

impl<'a, W: WakaTimeRepository, G: DescriptionGenerator> ReportCommand<'a, W, G> {
    /// 新しい`ReportCommand`を返す。
    ///
    /// # Arguments
    /// * `wakatime_client` - WakaTime APIと通信するためのリポジトリ
    /// * `description_generator` - 作業内容の説明文を生成するためのクライアント
    pub fn new(wakatime_client: &'a W, description_generator: &'a G) -> Self {
        Self {
            wakatime_client,
            description_generator,
        }
    }

    /// 日毎の作業レポートを作成する。
    ///
    /// 開始日から終了日までの各日について全プロジェクトのdurationsを集計し、
    /// エントリーがある日だけ説明文を生成して1行書き出す。
    /// 終了日が指定されていない場合は、Localタイムゾーンで現在の日付を利用する。
    ///
    /// # Arguments
    ///
    /// * `args` - レポート作成の引数
    /// * `writer` - レポートの書き出し先
    pub async fn run<Wr: Write>(
        &self,
        args: ReportArgs,
        writer: &mut csv::Writer<Wr>,
    ) -> Result<()> {
        // Localのタイムゾーンでの今日を既定の終了日とする
        let end_date = args
            .end_date
            .unwrap_or_else(|| datetime::now().with_timezone(&Local).date_naive());
        info!("Starting analysis from {} to {}", args.start_date, end_date);

        writer
            .write_record(CSV_HEADER)
            .context("Failed to write the report header")?;

        let project_label = args.projects.join(", ");
        let mut current_date = args.start_date;
        while current_date <= end_date {
            info!("Processing {}", current_date);
            let daily_work = self.collect_day(&args.projects, current_date).await?;
            if !daily_work.entries.is_empty() {
                info!("Generating work description");
                let description = self
                    .description_generator
                    .generate_description(&daily_work.entries, &project_label)
                    .await
                    .context("Failed to generate the work description")?;

                let date_label = format!(
                    "{} ({})",
                    current_date.format("%Y-%m-%d"),
                    weekday_abbrev(current_date)
                );
                let total_hours = format_duration(daily_work.total_duration);
                writer
                    .write_record([
                        date_label.as_str(),
                        total_hours.as_str(),
                        description.as_str(),
                    ])
                    .with_context(|| {
                        format!("Failed to write the report row for {}", current_date)
                    })?;
            }

            current_date = current_date
                .succ_opt()
                .context("Failed to advance to the next date")?;
        }

        writer.flush().context("Failed to flush the report")?;
        info!("Analysis completed! The report file has been generated.");

        Ok(())
    }

    /// 1日分のdurationsを全プロジェクトから集める。
    ///
    /// 取得に失敗したプロジェクトはログへ記録した上でスキップする。
    /// レスポンスを変換できない場合はエラーを返す。
    async fn collect_day(&self, projects: &[String], date: NaiveDate) -> Result<DailyWork> {
        let mut entries = Vec::new();
        let mut total_duration = 0.0;
        for project in projects {
            info!("Fetching WakaTime data for {}", project);
            match self.wakatime_client.fetch_durations(project, date).await {
                Ok(durations) => {
                    total_duration += durations.total_duration();
                    entries.extend(durations.data);
                }
                Err(err @ WakaTimeError::Request(_)) => {
                    error!(
                        "Error fetching WakaTime data for {} on {}: {}",
                        project, date, err
                    );
                }
                Err(err) => {
                    return Err(err).with_context(|| {
                        format!("Failed to decode WakaTime data for {} on {}", project, date)
                    });
                }
            }
        }

        Ok(DailyWork {
            entries,
            total_duration,
        })
    }
}

/// 日付をパースする。
fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("Failed to parse date: {}", s))
}
