//! ASI-1 vision chat completions.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{ReceiptImage, ReceiptScanner, ScanError};
use crate::domain::ReceiptData;

const MODEL: &str = "asi1-mini";

const SYSTEM_PROMPT: &str = "Extract receipt data. Return valid JSON only.";

const USER_PROMPT: &str = r#"Parse this receipt and extract all items with prices.

Return this JSON format (no markdown):
{
  "merchant": "store name",
  "date": "YYYY-MM-DD",
  "items": [
    { "name": "item name", "quantity": number, "price": unit price, "total": line total }
  ],
  "subtotal": number,
  "tax": number,
  "tip": number,
  "total": number
}"#;

#[derive(Debug, Clone)]
pub struct AsiScanner {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl AsiScanner {
    pub fn new(client: reqwest::Client, url: String, api_key: String) -> Self {
        Self {
            client,
            url,
            api_key,
        }
    }

    fn request_body(image: &ReceiptImage) -> serde_json::Value {
        json!({
            "model": MODEL,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": USER_PROMPT },
                        { "type": "image_url", "image_url": { "url": image.data_url() } }
                    ]
                }
            ],
            "temperature": 0.1,
            "max_tokens": 2000,
            "stream": false
        })
    }
}

#[async_trait]
impl ReceiptScanner for AsiScanner {
    fn name(&self) -> &'static str {
        "asi1"
    }

    async fn scan(&self, image: &ReceiptImage) -> Result<ReceiptData, ScanError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .json(&Self::request_body(image))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("ASI-1 error body: {}", body);
            return Err(ScanError::Status(status.as_u16()));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ScanError::Response("empty completion".to_string()))?;

        parse_completion(&content)
    }
}

/// Pull the receipt object out of a completion that may wrap it in a
/// fenced block or surround it with prose.
pub fn extract_json(content: &str) -> Result<&str, ScanError> {
    let fenced = Regex::new(r"```(?:json)?\s*(\{[\s\S]*?\})\s*```")
        .map_err(|e| ScanError::Response(e.to_string()))?;
    if let Some(m) = fenced.captures(content).and_then(|c| c.get(1)) {
        return Ok(m.as_str());
    }

    let bare = Regex::new(r"\{[\s\S]*\}").map_err(|e| ScanError::Response(e.to_string()))?;
    bare.find(content)
        .map(|m| m.as_str())
        .ok_or_else(|| ScanError::Response("no JSON object in completion".to_string()))
}

pub fn parse_completion(content: &str) -> Result<ReceiptData, ScanError> {
    let json = extract_json(content)?;
    serde_json::from_str(json)
        .map_err(|e| ScanError::Response(format!("invalid receipt JSON: {}", e)))
}
