use std::env;

use anyhow::{Context, Result};

/// 生成APIのキーを渡す環境変数名。
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";

/// WakaTime APIのキーを渡す環境変数名。
pub const WAKATIME_TOKEN_VAR: &str = "WAKATIME_TOKEN";

/// アプリケーション全体の設定。
///
/// 起動時に一度だけ構築し、各クライアントへ渡す。
#[derive(Clone, Debug)]
pub struct Config {
    pub openai_api_key: String,
    pub wakatime_token: String,
}

impl Config {
    /// 環境変数から設定を読み込む。
    ///
    /// 必要な環境変数が設定されていない場合はエラーを返す。
    ///
    /// # Examples
    ///
    /// ```
    /// let config = Config::from_env().unwrap();
    /// ```
    pub fn from_env() -> Result<Self> {
        let openai_api_key = env::var(OPENAI_API_KEY_VAR)
            .with_context(|| format!("{} must be set", OPENAI_API_KEY_VAR))?;
        let wakatime_token = env::var(WAKATIME_TOKEN_VAR)
            .with_context(|| format!("{} must be set", WAKATIME_TOKEN_VAR))?;

        Ok(Self {
            openai_api_key,
            wakatime_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;

    use super::{Config, OPENAI_API_KEY_VAR, WAKATIME_TOKEN_VAR};

    /// 環境変数を書き換えるテストを直列化するためのロック。
    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(Mutex::default);

    /// 両方の環境変数が設定されている場合に設定を読み込めることを確認する。
    #[test]
    fn test_from_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var(OPENAI_API_KEY_VAR, "openai-key");
        env::set_var(WAKATIME_TOKEN_VAR, "wakatime-key");

        let config = Config::from_env().unwrap();

        assert_eq!(config.openai_api_key, "openai-key");
        assert_eq!(config.wakatime_token, "wakatime-key");
    }

    /// OPENAI_API_KEYが未設定の場合にエラーとなることを確認する。
    #[test]
    fn test_from_env_without_openai_api_key() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::remove_var(OPENAI_API_KEY_VAR);
        env::set_var(WAKATIME_TOKEN_VAR, "wakatime-key");

        let result = Config::from_env();

        assert!(result
            .unwrap_err()
            .to_string()
            .contains(OPENAI_API_KEY_VAR));
    }

    /// WAKATIME_TOKENが未設定の場合にエラーとなることを確認する。
    #[test]
    fn test_from_env_without_wakatime_token() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var(OPENAI_API_KEY_VAR, "openai-key");
        env::remove_var(WAKATIME_TOKEN_VAR);

        let result = Config::from_env();

        assert!(result
            .unwrap_err()
            .to_string()
            .contains(WAKATIME_TOKEN_VAR));
    }
}
