use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::datetime::format_duration;
use crate::durations::DurationEntry;

#[cfg(test)]
use mockall::automock;

/// OpenAI APIのURL。
const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// 要約に利用するチャットモデル。
const CHAT_MODEL: &str = "gpt-3.5-turbo";

/// チャットモデルへ渡すsystemメッセージ。
const SYSTEM_PROMPT: &str = "You are a technical writer summarizing development work.";

/// プロンプトに含める作業時間の下限(秒)。これ未満のエントリーはノイズとして除外する。
const MIN_ENTRY_DURATION_SECONDS: f64 = 60.0;

/// chat completionsリクエストをシリアライズするための構造体。
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatRequestMessage<'a>>,
}

/// chat completionsリクエストの1メッセージをシリアライズするための構造体。
#[derive(Debug, Serialize)]
struct ChatRequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// chat completionsレスポンスをデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

/// chat completionsレスポンスの1候補をデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// chat completionsレスポンスのメッセージをデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// 作業内容の説明文を生成するためのtrait。
#[cfg_attr(test, automock)]
pub trait DescriptionGenerator {
    /// 1日分のエントリーから作業内容の説明文を生成する。
    ///
    /// # Arguments
    ///
    /// * `entries` - 対象日の全プロジェクトのエントリー
    /// * `project_label` - プロンプトに埋め込むプロジェクト名
    async fn generate_description(
        &self,
        entries: &[DurationEntry],
        project_label: &str,
    ) -> Result<String>;
}

/// OpenAI APIと通信するためのクライアント。
///
/// # Examples
///
/// ```
/// let client = OpenAiClient::new(&config.openai_api_key);
/// let description = client.generate_description(&entries, "sipe-web").await.unwrap();
/// ```
pub struct OpenAiClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl OpenAiClient {
    /// 新しい`OpenAiClient`を返す。
    pub fn new(api_key: &str) -> Self {
        Self::with_api_url(api_key, OPENAI_API_URL)
    }

    /// APIのURLを指定して新しい`OpenAiClient`を返す。
    pub fn with_api_url(api_key: &str, api_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

impl DescriptionGenerator for OpenAiClient {
    // エントリーからプロンプトを組み立ててchat completionsエンドポイントを呼び出す。
    async fn generate_description(
        &self,
        entries: &[DurationEntry],
        project_label: &str,
    ) -> Result<String> {
        let prompt = build_prompt(entries, project_label);
        let request = ChatCompletionRequest {
            model: CHAT_MODEL,
            messages: vec![
                ChatRequestMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatRequestMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to send request to OpenAI API at {}", self.api_url))?
            .error_for_status()
            .context("Request returned an error status")?
            .json::<ChatCompletionResponse>()
            .await
            .context("Failed to deserialize response")?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .context("OpenAI response did not include a message content")
    }
}

/// エントリーからプロンプトに載せるファイル名と作業時間の組を集める。
///
/// `src/`を含まないパスと作業時間が下限未満のエントリーは除外する。ファイル名は
/// 最初の`src/`より後ろの部分とし、重複する組は最初の出現だけを残す。
fn collect_worked_files(entries: &[DurationEntry]) -> Vec<(String, String)> {
    let mut worked_files: Vec<(String, String)> = Vec::new();
    for entry in entries {
        let name = match entry.entity.split_once("src/") {
            Some((_, name)) => name,
            None => continue,
        };
        if entry.duration < MIN_ENTRY_DURATION_SECONDS {
            continue;
        }

        let worked_file = (name.to_string(), format_duration(entry.duration));
        if !worked_files.contains(&worked_file) {
            worked_files.push(worked_file);
        }
    }

    worked_files
}

/// エントリーからchat completionsへ渡すプロンプトを組み立てる。
fn build_prompt(entries: &[DurationEntry], project_label: &str) -> String {
    let worked_files = collect_worked_files(entries)
        .into_iter()
        .map(|(name, duration)| format!("{} ({})", name, duration))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Based on the following information from the {project} project, 
    provide a brief (max 300 chars) summary in brazilian portuguese of the work done:

    - DON'T use words like “several”, “various”. You should be precise and say exactly what was done.
    - DON'T mention what the project is about (for example, saying that SIPE is HR software)
    - DON'T mention the duration of the work in each file 

    Good description: "Listar empresas cadastradas, cadastrar dispositivos e permitir autenticação via token. Também foram feitas modificações nos processos de autorização e na seleção de métodos de pagamento na assinatura.", "Alterações nos arquivos relacionados à gestão de assinaturas e locatários, incluindo otimizações em endpoints, validações de dados e definição de preço para plano experimental como zero. Novas funcionalidades como tratamento de erros para tenantes inexistentes e verificação de duplicidade de CNPJ.
    Bad description exercepts: "Este trabalho contribui para aprimorar a integridade e funcionalidade dos serviços SIPE, um software de RH para controle de ponto dos colaboradores.", "Foram feitas diversas atualizações nos arquivos de código-fonte de diversos componentes do projeto SIPE"

    Files worked on (with duration):
    {files}
    
    Note: This is part of a microservices architecture where:
    - sipe-web is the frontend service
    - sipe-api is the backend service

    Also, SIPE is HR software for employees to clock in and out.
    
    Summary:
    "#,
        project = project_label,
        files = worked_files
    )
}
