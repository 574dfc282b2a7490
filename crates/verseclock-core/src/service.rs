//! Text-generation service seam and its OpenAI-compatible HTTP implementation.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::config::ServiceSettings;
use crate::error::ServiceError;
use crate::prompts::{
    SELECTION_SYSTEM_PROMPT, STATEMENT_USER_PROMPT, selection_user_prompt,
    statement_system_prompt,
};

/// The two operations the schedule needs from a language model.
pub trait TextService {
    /// Produce one short encouraging statement that avoids repeating `recent`
    /// (oldest first).
    fn generate_statement(&self, recent: &[String]) -> Result<String, ServiceError>;

    /// Pick among `candidates`; the reply is expected to be a 1-based index or `none`.
    fn choose_candidate(&self, candidates: &[&str]) -> Result<String, ServiceError>;
}

impl<T: TextService + ?Sized> TextService for &T {
    fn generate_statement(&self, recent: &[String]) -> Result<String, ServiceError> {
        (**self).generate_statement(recent)
    }

    fn choose_candidate(&self, candidates: &[&str]) -> Result<String, ServiceError> {
        (**self).choose_candidate(candidates)
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Trimmed content of the first choice. An empty string is passed through; only a
/// missing choice or missing content is an error.
fn first_choice_content(completion: CompletionResponse) -> Result<String, ServiceError> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or(ServiceError::EmptyResponse)
}

/// Blocking client for a `/chat/completions` endpoint.
pub struct ChatCompletionService {
    client: Client,
    settings: ServiceSettings,
    api_key: Option<String>,
}

impl ChatCompletionService {
    pub fn new(settings: ServiceSettings, api_key: Option<String>) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .user_agent(concat!("verseclock/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            settings,
            api_key,
        })
    }

    /// Build a client reading the API key from the configured environment variable.
    pub fn from_env(settings: ServiceSettings) -> Result<Self, ServiceError> {
        let api_key = settings.resolve_api_key();
        Self::new(settings, api_key)
    }

    pub fn api_key_env(&self) -> &str {
        &self.settings.api_key_env
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
        top_p: Option<f32>,
    ) -> Result<String, ServiceError> {
        #[derive(Serialize)]
        struct CompletionRequest<'a> {
            model: &'a str,
            messages: Vec<Message<'a>>,
            temperature: f32,
            #[serde(skip_serializing_if = "Option::is_none")]
            top_p: Option<f32>,
        }

        #[derive(Serialize)]
        struct Message<'a> {
            role: &'a str,
            content: &'a str,
        }

        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ServiceError::MissingCredential(self.settings.api_key_env.clone()))?;

        let request_body = CompletionRequest {
            model: &self.settings.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
            temperature,
            top_p,
        };

        let response = self
            .client
            .post(&self.settings.endpoint)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        first_choice_content(response.json()?)
    }
}

impl TextService for ChatCompletionService {
    fn generate_statement(&self, recent: &[String]) -> Result<String, ServiceError> {
        let statement = self.complete(
            &statement_system_prompt(recent),
            STATEMENT_USER_PROMPT,
            self.settings.generation_temperature,
            Some(self.settings.generation_top_p),
        )?;
        if statement.is_empty() {
            return Err(ServiceError::EmptyResponse);
        }
        Ok(statement)
    }

    // An empty reply is still a reply; the selector maps it to the first candidate.

    fn choose_candidate(&self, candidates: &[&str]) -> Result<String, ServiceError> {
        self.complete(
            SELECTION_SYSTEM_PROMPT,
            &selection_user_prompt(candidates),
            self.settings.selection_temperature,
            None,
        )
    }
}
