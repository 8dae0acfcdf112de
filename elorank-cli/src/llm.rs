/// OpenAI-compatible API client for LLM-judged comparisons.
use anyhow::{anyhow, bail, Context, Result};
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::parse::{parse_verdict, Verdict};
use crate::prompt::build_prompt;

/// Configuration for the LLM endpoint.
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    content: Option<String>,
}

/// Result of a single LLM comparison call.
pub struct LlmComparison {
    /// Verdict in terms of the options as presented. None if unparseable.
    pub verdict: Option<Verdict>,
    pub response_text: String,
    pub retries_used: usize,
}

/// Apply normal jitter to temperature: N(1.0, 0.1) clamped to [0.8, 1.2].
/// Uses Box-Muller transform to avoid an extra crate dependency.
fn jittered_temperature(base: f64) -> f64 {
    let mut rng = rand::rng();
    let u1: f64 = rng.random();
    let u2: f64 = rng.random();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    let multiplier = (1.0 + 0.1 * z).clamp(0.8, 1.2);
    base * multiplier
}

/// Send one HTTP request to the LLM. Returns the raw response text.
/// Errors only on HTTP/network failures and malformed response bodies.
async fn send_comparison_request(client: &Client, config: &LlmConfig, prompt: &str) -> Result<String> {
    let request = ChatCompletionRequest {
        model: config.model.clone(),
        messages: vec![ChatMessage {
            role: "user",
            content: prompt.to_string(),
        }],
        temperature: jittered_temperature(config.temperature),
        max_tokens: 2000,
    };

    let url = format!("{}/v1/chat/completions", config.endpoint.trim_end_matches('/'));

    let mut req_builder = client.post(&url).json(&request);
    if let Some(ref key) = config.api_key {
        req_builder = req_builder.bearer_auth(key);
    }

    let resp = req_builder
        .send()
        .await
        .with_context(|| format!("HTTP request to {url} failed"))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        bail!("LLM API returned {status}: {snippet}");
    }

    let data: ChatCompletionResponse = resp
        .json()
        .await
        .context("Failed to parse LLM response JSON")?;

    let choice = data
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("No choices in LLM response"))?;

    Ok(choice.message.content.unwrap_or_default())
}

/// Ask the LLM which of two options wins, with retries on HTTP errors.
///
/// Retries up to `max_retries` times with a 1-second delay between attempts.
/// Only HTTP/network errors trigger retries — unparseable verdicts do not.
pub async fn compare_pair(
    client: &Client,
    config: &LlmConfig,
    template: &str,
    criterion: &str,
    option1: &str,
    option2: &str,
    max_retries: usize,
) -> Result<LlmComparison> {
    let prompt = build_prompt(template, criterion, option1, option2);

    let mut last_err = None;
    for attempt in 0..=max_retries {
        match send_comparison_request(client, config, &prompt).await {
            Ok(content) => {
                return Ok(LlmComparison {
                    verdict: parse_verdict(&content),
                    response_text: content,
                    retries_used: attempt,
                });
            }
            Err(e) => {
                if attempt < max_retries {
                    warn!(
                        "Retry {}/{} for {} vs {}: {:#}",
                        attempt + 1, max_retries, option1, option2, e
                    );
                    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                }
                last_err = Some(e);
            }
        }
    }

    Err(last_err
        .unwrap_or_else(|| anyhow!("no attempts made"))
        .context(format!("comparison failed after {max_retries} retries")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jittered_temperature_bounds() {
        for _ in 0..1000 {
            let t = jittered_temperature(0.5);
            assert!((0.4..=0.6).contains(&t), "temperature {t} out of range");
        }
    }

    #[test]
    fn test_response_deserialization() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Verdict:\nA"}}]}"#;
        let data: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        let content = data.choices[0].message.content.as_deref().unwrap();
        assert_eq!(parse_verdict(content), Some(Verdict::OptionA));
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatCompletionRequest {
            model: "test-model".to_string(),
            messages: vec![ChatMessage { role: "user", content: "hi".to_string() }],
            temperature: 0.3,
            max_tokens: 2000,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "test-model");
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
