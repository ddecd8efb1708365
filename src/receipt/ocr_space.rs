//! OCR.space text extraction followed by heuristic parsing.

use async_trait::async_trait;
use reqwest::multipart::Form;
use serde::Deserialize;

use super::text_parser::ReceiptTextParser;
use super::{today, ReceiptImage, ReceiptScanner, ScanError};
use crate::domain::ReceiptData;

#[derive(Debug, Clone)]
pub struct OcrSpaceScanner {
    client: reqwest::Client,
    url: String,
    api_key: String,
    parser: ReceiptTextParser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrResponse {
    #[serde(default)]
    parsed_results: Vec<ParsedResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    parsed_text: String,
}

impl OcrSpaceScanner {
    pub fn new(
        client: reqwest::Client,
        url: String,
        api_key: String,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            client,
            url,
            api_key,
            parser: ReceiptTextParser::new()?,
        })
    }
}

#[async_trait]
impl ReceiptScanner for OcrSpaceScanner {
    fn name(&self) -> &'static str {
        "ocr_space"
    }

    async fn scan(&self, image: &ReceiptImage) -> Result<ReceiptData, ScanError> {
        let form = Form::new()
            .text("base64Image", image.data_url())
            .text("language", "eng")
            .text("detectOrientation", "true")
            .text("scale", "true")
            .text("OCREngine", "2");

        let response = self
            .client
            .post(&self.url)
            .header("apikey", &self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::Status(status.as_u16()));
        }

        let body: OcrResponse = response.json().await?;
        let text = first_text(body)
            .ok_or_else(|| ScanError::Response("no text recognised".to_string()))?;
        Ok(self.parser.parse(&text, &today()))
    }
}

fn first_text(body: OcrResponse) -> Option<String> {
    body.parsed_results
        .into_iter()
        .next()
        .map(|r| r.parsed_text)
        .filter(|t| !t.trim().is_empty())
}
