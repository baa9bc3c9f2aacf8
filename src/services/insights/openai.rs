use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest, Role,
    },
    Client,
};
use futures::future::{BoxFuture, FutureExt};
use once_cell::sync::Lazy;
use regex::Regex;
use super::InsightGenerator;
use crate::error::AppError;
use crate::models::{InsightReport, Profile};

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[\w-]*[ \t]*\r?\n(.*?)\r?\n?[ \t]*```$").expect("code fence pattern is valid")
});

/// Asks an OpenAI chat model to judge the profile.
pub struct OpenAiInsightGenerator {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiInsightGenerator {
    pub fn new(api_key: &str, model: &str) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }

    async fn request_insights(&self, profile: &Profile) -> Result<InsightReport, AppError> {
        let start = std::time::Instant::now();
        let prompt = build_prompt(profile)?;

        let messages = vec![ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(prompt),
                name: None,
                role: Role::User,
            },
        )];

        let request = CreateChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(0.2),
            ..Default::default()
        };

        let response = self.client
            .chat()
            .create(request)
            .await
            .map_err(|e| {
                tracing::error!("Insight request failed: {}", e);
                AppError::LlmError(e.to_string())
            })?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| AppError::LlmError("Empty response from insight model".to_string()))?;

        tracing::info!("Insight model answered in {:?}", start.elapsed());
        parse_insight_response(&content)
    }
}

impl InsightGenerator for OpenAiInsightGenerator {
    fn generate_insights<'a>(
        &'a self,
        profile: &'a Profile,
    ) -> BoxFuture<'a, Result<InsightReport, AppError>> {
        self.request_insights(profile).boxed()
    }
}

fn build_prompt(profile: &Profile) -> Result<String, AppError> {
    let profile_json = serde_json::to_string_pretty(profile)?;

    Ok(format!(
        r#"You are a data quality expert. Analyze the following dataset profile and provide insights.

Data Profile:
{}

Provide your analysis in JSON format with these exact keys:
- "insights": A 2-3 sentence summary of overall data quality
- "quality_score": A number from 0-100 representing overall quality
- "recommendations": A list of 2-5 actionable recommendations for improvement

IMPORTANT: Respond with ONLY the raw JSON object. Do NOT wrap it in markdown code blocks or add any other text."#,
        profile_json
    ))
}

/// Removes a surrounding markdown code fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    CODE_FENCE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map_or(trimmed, |m| m.as_str())
}

pub fn parse_insight_response(text: &str) -> Result<InsightReport, AppError> {
    let body = strip_code_fences(text);
    serde_json::from_str(body).map_err(|e| {
        tracing::warn!("Unparseable insight response: {}", body);
        AppError::LlmError(format!("Failed to parse insight response as JSON: {}", e))
    })
}
