use chrono::{DateTime, Utc};

/// 1つのファイルに対して記録された作業時間のエントリー。
#[derive(Clone, Debug, PartialEq)]
pub struct DurationEntry {
    pub entity: String,
    pub entry_type: String,
    pub time: f64,
    pub project: String,
    pub project_root_count: u32,
    pub branch: String,
    pub language: String,
    pub dependencies: Vec<String>,
    pub duration: f64,
}

/// 1プロジェクト・1日分のdurationsの取得結果。
#[derive(Clone, Debug)]
pub struct DurationsResponse {
    pub data: Vec<DurationEntry>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub timezone: String,
    pub color: Option<String>,
    pub branches: Vec<String>,
    pub available_branches: Vec<String>,
}

impl DurationsResponse {
    /// 全エントリーのdurationを合計した秒数を返す。
    pub fn total_duration(&self) -> f64 {
        self.data.iter().map(|entry| entry.duration).sum()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{DurationEntry, DurationsResponse};

    /// エントリーが空の場合に合計が0になることを確認する。
    #[test]
    fn test_total_duration_no_entry() {
        let response = dummy_response(vec![]);

        assert_eq!(response.total_duration(), 0.0);
    }

    /// 全エントリーのdurationが合計されることを確認する。
    #[test]
    fn test_total_duration_sums_all_entries() {
        let response = dummy_response(vec![dummy_entry(90.5), dummy_entry(9.5)]);

        assert_eq!(response.total_duration(), 100.0);
    }

    /// テスト用にダミーのDurationEntryを作成する。
    fn dummy_entry(duration: f64) -> DurationEntry {
        DurationEntry {
            entity: "/home/dev/sipe-web/src/app.ts".to_string(),
            entry_type: "file".to_string(),
            time: 1729518000.0,
            project: "sipe-web".to_string(),
            project_root_count: 1,
            branch: "main".to_string(),
            language: "TypeScript".to_string(),
            dependencies: vec![],
            duration,
        }
    }

    /// テスト用にダミーのDurationsResponseを作成する。
    fn dummy_response(data: Vec<DurationEntry>) -> DurationsResponse {
        DurationsResponse {
            data,
            start: Utc.with_ymd_and_hms(2024, 10, 21, 3, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 10, 22, 3, 0, 0).unwrap(),
            timezone: "America/Sao_Paulo".to_string(),
            color: None,
            branches: vec!["main".to_string()],
            available_branches: vec!["main".to_string()],
        }
    }
}
