//! Receipt scanning through an ordered chain of external services.
//!
//! Every scanner's output is untrusted: totals are re-checked before a
//! receipt leaves the chain, and when every scanner fails the static demo
//! receipt is returned so a scan never hard-fails.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::domain::ReceiptData;

pub mod asi;
pub mod ocr_space;
pub mod text_parser;

pub use asi::AsiScanner;
pub use ocr_space::OcrSpaceScanner;

/// An uploaded receipt image.
#[derive(Debug, Clone)]
pub struct ReceiptImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ReceiptImage {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// `data:<mime>;base64,<payload>`, the form both services accept.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("service returned HTTP {0}")]
    Status(u16),
    #[error("unusable response: {0}")]
    Response(String),
    #[error("no answer within {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for ScanError {
    fn from(err: reqwest::Error) -> Self {
        ScanError::Request(err.to_string())
    }
}

#[async_trait]
pub trait ReceiptScanner: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    async fn scan(&self, image: &ReceiptImage) -> Result<ReceiptData, ScanError>;
}

/// Where a scanned receipt came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanSource {
    Service(&'static str),
    Demo,
}

impl ScanSource {
    pub fn label(&self) -> &'static str {
        match self {
            ScanSource::Service(name) => name,
            ScanSource::Demo => "demo",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub receipt: ReceiptData,
    pub source: ScanSource,
    pub total_corrected: bool,
}

const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(30);

/// Tries each scanner in order, ending in the demo receipt.
///
/// Each scanner gets at most `scan_timeout`; one that hangs is treated
/// like one that failed.
#[derive(Debug, Clone)]
pub struct ScanChain {
    scanners: Vec<Arc<dyn ReceiptScanner>>,
    scan_timeout: Duration,
}

impl Default for ScanChain {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ScanChain {
    pub fn new(scanners: Vec<Arc<dyn ReceiptScanner>>) -> Self {
        Self {
            scanners,
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
        }
    }

    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    /// Chain of the services that have API keys configured.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let mut scanners: Vec<Arc<dyn ReceiptScanner>> = Vec::new();
        if let Some(key) = &config.asi_api_key {
            scanners.push(Arc::new(AsiScanner::new(
                client.clone(),
                config.asi_api_url.clone(),
                key.clone(),
            )));
        }
        if let Some(key) = &config.ocr_space_api_key {
            match OcrSpaceScanner::new(client, config.ocr_space_url.clone(), key.clone()) {
                Ok(scanner) => scanners.push(Arc::new(scanner)),
                Err(e) => warn!("OCR.space scanner disabled: {}", e),
            }
        }
        Ok(Self::new(scanners).with_scan_timeout(config.scan_timeout))
    }

    pub fn len(&self) -> usize {
        self.scanners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scanners.is_empty()
    }

    pub async fn scan(&self, image: &ReceiptImage) -> ScanOutcome {
        for scanner in &self.scanners {
            let result = tokio::time::timeout(self.scan_timeout, scanner.scan(image))
                .await
                .unwrap_or(Err(ScanError::Timeout(self.scan_timeout)));
            match result {
                Ok(mut receipt) => {
                    let total_corrected = receipt.reconcile_totals();
                    info!(
                        "Receipt scanned by {}: {} with {} items",
                        scanner.name(),
                        receipt.merchant,
                        receipt.items.len()
                    );
                    return ScanOutcome {
                        receipt,
                        source: ScanSource::Service(scanner.name()),
                        total_corrected,
                    };
                }
                Err(e) => warn!("Receipt scanner {} failed: {}", scanner.name(), e),
            }
        }

        warn!("No receipt scanner succeeded, using demo receipt");
        ScanOutcome {
            receipt: ReceiptData::demo(today()),
            source: ScanSource::Demo,
            total_corrected: false,
        }
    }
}

pub(crate) fn today() -> String {
    chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string()
}
