use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// 曜日のポルトガル語の略称。月曜始まり。
const WEEKDAY_ABBREVS: [&str; 7] = ["seg", "ter", "qua", "qui", "sex", "sab", "dom"];

/// 現在のUTC時間を取得する。
#[cfg(not(test))]
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// 秒数を`HH:MM:SS`形式の文字列にフォーマットする。
///
/// 小数点以下の秒は切り捨てる。負の値は0秒として扱う。
///
/// # Examples
///
/// ```
/// assert_eq!(format_duration(3661.0), "01:01:01");
/// ```
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// 日付に対応する曜日の略称を返す。
pub fn weekday_abbrev(date: NaiveDate) -> &'static str {
    WEEKDAY_ABBREVS[date.weekday().num_days_from_monday() as usize]
}


#[cfg(test)]
pub use mock_datetime::now;
