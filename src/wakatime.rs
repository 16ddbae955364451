use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::Deserialize;
use thiserror::Error;

use crate::durations::{DurationEntry, DurationsResponse};

#[cfg(test)]
use mockall::automock;

/// WakaTime APIのURL。
const WAKATIME_API_URL: &str = "https://wakatime.com/api/v1";

/// WakaTime APIの呼び出しで発生するエラー。
#[derive(Debug, Error)]
pub enum WakaTimeError {
    /// HTTP層の失敗。対象のプロジェクト・日付の取得だけをスキップできる。
    #[error("request to the WakaTime API failed: {0}")]
    Request(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// レスポンスがスキーマと一致しない場合の失敗。
    #[error("failed to decode the WakaTime durations payload: {0}")]
    Decode(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// durationsレスポンスをデシリアライズするための構造体。
///
/// スキーマにないキーはエラーとする。
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WakaTimeDurationsResponse {
    data: Vec<WakaTimeDurationEntry>,
    start: String,
    end: String,
    timezone: String,
    color: Option<String>,
    branches: Vec<String>,
    available_branches: Vec<String>,
}

/// durationsレスポンスの1エントリーをデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WakaTimeDurationEntry {
    entity: String,
    #[serde(rename = "type")]
    entry_type: String,
    time: f64,
    project: String,
    #[serde(default)]
    project_root_count: Option<u32>,
    branch: String,
    language: String,
    dependencies: Vec<String>,
    duration: f64,
}

/// WakaTime APIと通信するためのrepositoryを表すtrait。
#[cfg_attr(test, automock)]
pub trait WakaTimeRepository {
    /// 指定されたプロジェクトと日付のdurationsを取得する。
    ///
    /// # Arguments
    ///
    /// * `project` - 取得対象のプロジェクト名
    /// * `date` - 取得対象の日付
    async fn fetch_durations(
        &self,
        project: &str,
        date: NaiveDate,
    ) -> Result<DurationsResponse, WakaTimeError>;
}

/// WakaTime APIと通信するためのクライアント。
///
/// # Examples
///
/// ```
/// let client = WakaTimeClient::new(&config.wakatime_token);
/// let durations = client.fetch_durations("sipe-web", date).await.unwrap();
/// ```
pub struct WakaTimeClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl WakaTimeClient {
    /// 新しい`WakaTimeClient`を返す。
    pub fn new(api_key: &str) -> Self {
        Self::with_api_url(api_key, WAKATIME_API_URL)
    }

    /// APIのURLを指定して新しい`WakaTimeClient`を返す。
    pub fn with_api_url(api_key: &str, api_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

impl WakaTimeRepository for WakaTimeClient {
    // current userのdurationsエンドポイントを呼び出し、domainモデルへ変換する。
    async fn fetch_durations(
        &self,
        project: &str,
        date: NaiveDate,
    ) -> Result<DurationsResponse, WakaTimeError> {
        let raw_response = self
            .client
            .get(format!("{}/users/current/durations", self.api_url))
            .basic_auth(&self.api_key, None::<&str>)
            .header(CONTENT_TYPE, "application/json")
            .query(&[
                ("date", date.format("%Y-%m-%d").to_string()),
                ("project", project.to_string()),
            ])
            .send()
            .await
            .map_err(|err| WakaTimeError::Request(Box::new(err)))?
            .error_for_status()
            .map_err(|err| WakaTimeError::Request(Box::new(err)))?
            .json::<WakaTimeDurationsResponse>()
            .await
            .map_err(|err| WakaTimeError::Decode(Box::new(err)))?;
        info!(
            "Fetched {} duration entries for {}",
            raw_response.data.len(),
            project
        );

        decode_response(raw_response)
    }
}

/// レスポンスをdomainモデルの`DurationsResponse`へ変換する。
fn decode_response(raw: WakaTimeDurationsResponse) -> Result<DurationsResponse, WakaTimeError> {
    Ok(DurationsResponse {
        data: raw.data.into_iter().map(decode_entry).collect(),
        start: parse_timestamp(&raw.start)?,
        end: parse_timestamp(&raw.end)?,
        timezone: raw.timezone,
        color: raw.color,
        branches: raw.branches,
        available_branches: raw.available_branches,
    })
}

/// エントリーをdomainモデルの`DurationEntry`へ変換する。
///
/// `project_root_count`が欠けている場合は0とする。
fn decode_entry(raw: WakaTimeDurationEntry) -> DurationEntry {
    DurationEntry {
        entity: raw.entity,
        entry_type: raw.entry_type,
        time: raw.time,
        project: raw.project,
        project_root_count: raw.project_root_count.unwrap_or(0),
        branch: raw.branch,
        language: raw.language,
        dependencies: raw.dependencies,
        duration: raw.duration,
    }
}

/// ISO-8601のタイムスタンプをUTCへ変換する。末尾の`Z`は`+00:00`として扱う。
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, WakaTimeError> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.to_utc())
        .map_err(|err| {
            WakaTimeError::Decode(format!("invalid timestamp `{}`: {}", value, err).into())
        })
}
