//! Call encoding and return decoding for the ledger and score contracts.

use alloy_primitives::{hex, U256};
use alloy_sol_types::{sol, SolCall};

use super::DataSourceError;
use crate::domain::{Address, DebtId, DebtRecord, ScoreSnapshot, TimeSecs};

sol! {
    function getMyDebts() external view returns (uint256[] memory);
    function getDebt(uint256 id) external view returns (
        address creditor,
        address debtor,
        uint256 amount,
        uint256 timestamp,
        bool settled
    );
    function addDebt(address creditor, address debtor, uint256 amount) external;
    function settleDebt(uint256 id) external;

    function getScore(address user) external view returns (uint256);
    function getScoreDetails(address user) external view returns (
        uint256 totalScore,
        uint256 billsSplit,
        uint256 loansRepaid,
        uint256 latePayments,
        uint256 onTimePayments,
        uint256 lastActivityTimestamp
    );
    function calculateBorrowingPower(address user) external view returns (uint256);
}

/// `0x`-prefixed calldata for a call.
pub fn calldata<C: SolCall>(call: &C) -> String {
    hex::encode_prefixed(call.abi_encode())
}

pub fn get_my_debts() -> String {
    calldata(&getMyDebtsCall {})
}

pub fn get_debt(id: DebtId) -> String {
    calldata(&getDebtCall { id: id.as_uint() })
}

pub fn add_debt(creditor: &Address, debtor: &Address, amount: U256) -> String {
    calldata(&addDebtCall {
        creditor: creditor.inner(),
        debtor: debtor.inner(),
        amount,
    })
}

pub fn settle_debt(id: DebtId) -> String {
    calldata(&settleDebtCall { id: id.as_uint() })
}

pub fn get_score(user: &Address) -> String {
    calldata(&getScoreCall { user: user.inner() })
}

pub fn get_score_details(user: &Address) -> String {
    calldata(&getScoreDetailsCall { user: user.inner() })
}

pub fn calculate_borrowing_power(user: &Address) -> String {
    calldata(&calculateBorrowingPowerCall { user: user.inner() })
}

fn return_bytes(return_data: &str) -> Result<Vec<u8>, DataSourceError> {
    hex::decode(return_data)
        .map_err(|e| DataSourceError::ParseError(format!("Invalid hex: {}", e)))
}

fn decode_returns<C: SolCall>(data: &[u8]) -> Result<C::Return, DataSourceError> {
    C::abi_decode_returns(data, true)
        .map_err(|e| DataSourceError::ParseError(format!("{}: {}", C::SIGNATURE, e)))
}

fn narrow<T: TryFrom<U256>>(value: U256, what: &str) -> Result<T, DataSourceError> {
    T::try_from(value)
        .map_err(|_| DataSourceError::ParseError(format!("{} {} out of range", what, value)))
}

/// Decode `getDebt(uint256)`.
pub fn decode_debt(id: DebtId, return_data: &str) -> Result<DebtRecord, DataSourceError> {
    let data = return_bytes(return_data)?;
    if data.is_empty() {
        return Err(DataSourceError::ParseError(format!(
            "Empty return data for debt {}",
            id
        )));
    }
    let ret = decode_returns::<getDebtCall>(&data)?;
    Ok(DebtRecord::new(
        id,
        Address::from(ret.creditor),
        Address::from(ret.debtor),
        ret.amount,
        TimeSecs::new(narrow(ret.timestamp, "Timestamp")?),
        ret.settled,
    ))
}

/// Decode `getMyDebts()`. No return data means no debts.
pub fn decode_debt_ids(return_data: &str) -> Result<Vec<DebtId>, DataSourceError> {
    let data = return_bytes(return_data)?;
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let ret = decode_returns::<getMyDebtsCall>(&data)?;
    Ok(ret._0.into_iter().map(DebtId::from_uint).collect())
}

pub fn decode_score(return_data: &str) -> Result<u32, DataSourceError> {
    let ret = decode_returns::<getScoreCall>(&return_bytes(return_data)?)?;
    narrow(ret._0, "Score")
}

pub fn decode_score_details(return_data: &str) -> Result<ScoreSnapshot, DataSourceError> {
    let ret = decode_returns::<getScoreDetailsCall>(&return_bytes(return_data)?)?;
    Ok(ScoreSnapshot {
        total_score: narrow(ret.totalScore, "Score")?,
        bills_split: narrow(ret.billsSplit, "Counter")?,
        loans_repaid: narrow(ret.loansRepaid, "Counter")?,
        late_payments: narrow(ret.latePayments, "Counter")?,
        on_time_payments: narrow(ret.onTimePayments, "Counter")?,
        last_activity_timestamp: narrow(ret.lastActivityTimestamp, "Timestamp")?,
    })
}

/// Raw borrowing power units, before decimal conversion.
pub fn decode_borrowing_power(return_data: &str) -> Result<U256, DataSourceError> {
    let ret = decode_returns::<calculateBorrowingPowerCall>(&return_bytes(return_data)?)?;
    Ok(ret._0)
}
