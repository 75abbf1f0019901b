use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::token::Token;

/// Represents one collected (token, day) price. The (token, date) pair is
/// the primary key; a record is immutable once stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub token: Token,
    pub date: NaiveDate,
    pub price: f64,
}

impl PriceRecord {
    pub fn new(token: Token, date: NaiveDate, price: f64) -> Self {
        Self { token, date, price }
    }
}
