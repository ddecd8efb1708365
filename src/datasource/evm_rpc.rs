//! Ledger and score contracts over EVM JSON-RPC.

use super::abi;
use super::{DataSourceError, DebtReadResult, LedgerSource, LedgerWriter, ScoreSource};
use crate::domain::decimal::BORROWING_POWER_DECIMALS;
use crate::domain::{Address, DebtId, Decimal, ScoreSnapshot, TxHash};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// JSON-RPC client bound to the two deployed contracts.
///
/// Writes go through `eth_sendTransaction`, so the node (or the wallet
/// behind it) owns the sending account and signs.
#[derive(Debug, Clone)]
pub struct EvmRpcSource {
    client: Client,
    rpc_url: String,
    debt_tracker: Address,
    circle_score: Address,
    confirmation_timeout: Duration,
    receipt_poll_interval: Duration,
}

impl EvmRpcSource {
    /// Every request, retried or not, is bounded by `request_timeout`, so a
    /// stalled node surfaces as a `NetworkError` instead of hanging a poll.
    pub fn new(
        rpc_url: String,
        debt_tracker: Address,
        circle_score: Address,
        request_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(request_timeout.min(CONNECT_TIMEOUT))
            .build()?;
        Ok(Self {
            client,
            rpc_url,
            debt_tracker,
            circle_score,
            confirmation_timeout: Duration::from_secs(60),
            receipt_poll_interval: Duration::from_secs(1),
        })
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    /// POST a JSON-RPC payload, retrying transient failures.
    ///
    /// Only used for reads: a retried send could submit twice.
    async fn post_with_retry(&self, payload: &Value) -> Result<Value, DataSourceError> {
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        retry(backoff, || async {
            self.post_once(payload).await.map_err(|e| match e {
                DataSourceError::NetworkError(_)
                | DataSourceError::RateLimited
                | DataSourceError::HttpError { status: 500..=599, .. } => {
                    backoff::Error::transient(e)
                }
                other => backoff::Error::permanent(other),
            })
        })
        .await
    }

    async fn post_once(&self, payload: &Value) -> Result<Value, DataSourceError> {
        let response = self
            .client
            .post(&self.rpc_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| DataSourceError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == 429 {
            return Err(DataSourceError::RateLimited);
        }
        if status.is_server_error() {
            return Err(DataSourceError::HttpError {
                status: status.as_u16(),
                message: "Server error".to_string(),
            });
        }
        if !status.is_success() {
            return Err(DataSourceError::HttpError {
                status: status.as_u16(),
                message: "Client error".to_string(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| DataSourceError::ParseError(e.to_string()))
    }

    async fn eth_call(
        &self,
        to: &Address,
        data: String,
        from: Option<&Address>,
    ) -> Result<String, DataSourceError> {
        let mut call = json!({ "to": to, "data": data });
        if let Some(from) = from {
            call["from"] = json!(from);
        }
        let payload = rpc_request(1, "eth_call", json!([call, "latest"]));
        let response = self.post_with_retry(&payload).await?;
        result_string(&rpc_result(&response)?)
    }

    async fn send_transaction(
        &self,
        from: &Address,
        to: &Address,
        data: String,
    ) -> Result<TxHash, DataSourceError> {
        let tx = json!({ "from": from, "to": to, "data": data });
        let payload = rpc_request(1, "eth_sendTransaction", json!([tx]));
        let response = self.post_once(&payload).await?;
        let hash = TxHash::new(result_string(&rpc_result(&response)?)?);
        info!("Submitted transaction {} from {}", hash, from);
        self.wait_for_receipt(&hash).await?;
        Ok(hash)
    }

    async fn wait_for_receipt(&self, hash: &TxHash) -> Result<(), DataSourceError> {
        tokio::time::timeout(self.confirmation_timeout, self.poll_receipt(hash))
            .await
            .map_err(|_| DataSourceError::Timeout(format!("no receipt for {}", hash)))?
    }

    async fn poll_receipt(&self, hash: &TxHash) -> Result<(), DataSourceError> {
        loop {
            let payload = rpc_request(1, "eth_getTransactionReceipt", json!([hash.as_str()]));
            let response = self.post_with_retry(&payload).await?;
            let receipt = rpc_result(&response)?;
            if let Some(succeeded) = receipt_status(&receipt)? {
                if !succeeded {
                    return Err(DataSourceError::Reverted(hash.clone()));
                }
                info!("Transaction {} confirmed", hash);
                return Ok(());
            }
            tokio::time::sleep(self.receipt_poll_interval).await;
        }
    }

    async fn score_call(&self, data: String) -> Result<String, DataSourceError> {
        self.eth_call(&self.circle_score, data, None).await
    }
}

#[async_trait]
impl LedgerSource for EvmRpcSource {
    async fn fetch_debt_ids(&self, owner: &Address) -> Result<Vec<DebtId>, DataSourceError> {
        debug!("Fetching debt ids for owner={}", owner);
        let raw = self
            .eth_call(&self.debt_tracker, abi::get_my_debts(), Some(owner))
            .await?;
        abi::decode_debt_ids(&raw)
    }

    async fn fetch_debts(&self, ids: &[DebtId]) -> Result<Vec<DebtReadResult>, DataSourceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        debug!("Fetching {} debts in one batch", ids.len());

        let mut batch = Vec::with_capacity(ids.len());
        for (index, id) in ids.iter().enumerate() {
            let call = json!({ "to": self.debt_tracker, "data": abi::get_debt(*id) });
            batch.push(rpc_request(index as u64, "eth_call", json!([call, "latest"])));
        }

        let response = self.post_with_retry(&Value::Array(batch)).await?;
        Ok(split_batch_response(ids, &response)?
            .into_iter()
            .map(|(id, raw)| (id, raw.and_then(|r| abi::decode_debt(id, &r))))
            .collect())
    }
}

#[async_trait]
impl LedgerWriter for EvmRpcSource {
    async fn add_debt(
        &self,
        from: &Address,
        creditor: &Address,
        debtor: &Address,
        amount: Decimal,
    ) -> Result<TxHash, DataSourceError> {
        let wei = amount
            .to_wei()
            .map_err(|e| DataSourceError::Other(format!("Invalid amount {}: {}", amount, e)))?;
        let data = abi::add_debt(creditor, debtor, wei);
        self.send_transaction(from, &self.debt_tracker, data).await
    }

    async fn settle_debt(&self, from: &Address, id: DebtId) -> Result<TxHash, DataSourceError> {
        self.send_transaction(from, &self.debt_tracker, abi::settle_debt(id)).await
    }
}

#[async_trait]
impl ScoreSource for EvmRpcSource {
    async fn fetch_score(&self, user: &Address) -> Result<u32, DataSourceError> {
        let raw = self.score_call(abi::get_score(user)).await?;
        abi::decode_score(&raw)
    }

    async fn fetch_score_details(&self, user: &Address) -> Result<ScoreSnapshot, DataSourceError> {
        let raw = self.score_call(abi::get_score_details(user)).await?;
        abi::decode_score_details(&raw)
    }

    async fn fetch_borrowing_power(&self, user: &Address) -> Result<Decimal, DataSourceError> {
        let raw = self.score_call(abi::calculate_borrowing_power(user)).await?;
        let units = abi::decode_borrowing_power(&raw)?;
        Decimal::from_base_units(units, BORROWING_POWER_DECIMALS)
            .map_err(|e| DataSourceError::ParseError(e.to_string()))
    }
}

fn rpc_request(id: u64, method: &str, params: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params })
}

/// Extract `result` from a JSON-RPC response, surfacing `error` objects.
fn rpc_result(response: &Value) -> Result<Value, DataSourceError> {
    if let Some(error) = response.get("error") {
        return Err(DataSourceError::RpcError {
            code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
            message: error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        });
    }
    response
        .get("result")
        .cloned()
        .ok_or_else(|| DataSourceError::ParseError("Missing result field".to_string()))
}

fn result_string(result: &Value) -> Result<String, DataSourceError> {
    result
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| DataSourceError::ParseError("Expected string result".to_string()))
}

/// `None` while pending, else whether the receipt reports success.
fn receipt_status(receipt: &Value) -> Result<Option<bool>, DataSourceError> {
    if receipt.is_null() {
        return Ok(None);
    }
    let status = receipt
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| DataSourceError::ParseError("Missing receipt status".to_string()))?;
    Ok(Some(status == "0x1"))
}

/// Match batch responses back to ids by JSON-RPC id.
///
/// Responses may arrive in any order; an id with no response is a
/// per-entry failure, not a batch failure.
fn split_batch_response(
    ids: &[DebtId],
    response: &Value,
) -> Result<Vec<(DebtId, Result<String, DataSourceError>)>, DataSourceError> {
    let entries = match response.as_array() {
        Some(entries) => entries,
        None => {
            // Some nodes answer a whole rejected batch with a single error.
            rpc_result(response)?;
            return Err(DataSourceError::ParseError(
                "Expected array response".to_string(),
            ));
        }
    };

    let mut by_index: HashMap<u64, &Value> = HashMap::with_capacity(entries.len());
    for entry in entries {
        match entry.get("id").and_then(Value::as_u64) {
            Some(index) => {
                by_index.insert(index, entry);
            }
            None => warn!("Batch response entry without id: {}", entry),
        }
    }

    Ok(ids
        .iter()
        .enumerate()
        .map(|(index, id)| {
            let raw = match by_index.get(&(index as u64)) {
                Some(entry) => rpc_result(entry).and_then(|r| result_string(&r)),
                None => Err(DataSourceError::ParseError(format!(
                    "No batch response for debt {}",
                    id
                ))),
            };
            (*id, raw)
        })
        .collect())
}
