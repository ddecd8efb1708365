//! Bill-share arithmetic used before writing debts to the ledger.

use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::{Decimal, ReceiptData};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShareError {
    #[error("at least one participant is required")]
    NoParticipants,
    #[error("amount must be positive")]
    NonPositive,
    #[error("item index {0} is out of range")]
    UnknownItem(usize),
    #[error("amount is too large to split")]
    Overflow,
}

/// Split `total` into `participants` shares in whole cents.
///
/// Leftover cents go to the first shares, so the shares always add up to
/// the total rounded to cents.
pub fn equal_shares(total: Decimal, participants: usize) -> Result<Vec<Decimal>, ShareError> {
    if participants == 0 {
        return Err(ShareError::NoParticipants);
    }
    if !total.is_positive() {
        return Err(ShareError::NonPositive);
    }

    let cents = (total.round_cents() * Decimal::from(100u32))
        .inner()
        .to_i64()
        .ok_or(ShareError::Overflow)?;
    let n = participants as i64;
    let base = cents / n;
    let remainder = cents % n;

    Ok((0..n)
        .map(|i| {
            let share = base + if i < remainder { 1 } else { 0 };
            Decimal::new(rust_decimal::Decimal::new(share, 2))
        })
        .collect())
}

/// The user's part of a receipt: selected line totals plus the same
/// proportion of tax and tip.
pub fn itemized_share(receipt: &ReceiptData, selected: &[usize]) -> Result<Decimal, ShareError> {
    let mut items_total = Decimal::zero();
    let mut seen = Vec::with_capacity(selected.len());
    for &index in selected {
        if seen.contains(&index) {
            continue;
        }
        let item = receipt
            .items
            .get(index)
            .ok_or(ShareError::UnknownItem(index))?;
        items_total = items_total + item.total;
        seen.push(index);
    }

    let ratio = if receipt.subtotal.is_zero() {
        Decimal::zero()
    } else {
        items_total
            .checked_div(receipt.subtotal)
            .ok_or(ShareError::Overflow)?
    };

    Ok(items_total + receipt.tax * ratio + receipt.tip * ratio)
}

/// Display currencies with fixed conversion rates (units per USD).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Inr,
    Eur,
    Gbp,
    Jpy,
    Aud,
    Cad,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Inr => "INR",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Aud => "AUD",
            Currency::Cad => "CAD",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Inr => "₹",
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Jpy => "¥",
            Currency::Aud => "A$",
            Currency::Cad => "C$",
        }
    }

    /// Units of this currency per US dollar.
    pub fn rate(&self) -> Decimal {
        let rate = match self {
            Currency::Usd => "1",
            Currency::Inr => "83",
            Currency::Eur => "0.92",
            Currency::Gbp => "0.79",
            Currency::Jpy => "150",
            Currency::Aud => "1.52",
            Currency::Cad => "1.36",
        };
        Decimal::from_str_canonical(rate).unwrap_or_else(|_| Decimal::from(1u32))
    }

    /// Convert an amount in this currency to US dollars, in cents.
    pub fn to_usd(&self, amount: Decimal) -> Decimal {
        amount
            .checked_div(self.rate())
            .unwrap_or_default()
            .round_cents()
    }

    pub fn format(&self, amount: Decimal) -> String {
        format!("{}{}", self.symbol(), amount.to_cents_string())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "INR" => Ok(Currency::Inr),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "JPY" => Ok(Currency::Jpy),
            "AUD" => Ok(Currency::Aud),
            "CAD" => Ok(Currency::Cad),
            other => Err(format!("unsupported currency {}", other)),
        }
    }
}
