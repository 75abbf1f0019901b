use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date format used everywhere: the CoinGecko history endpoint, the
/// `INITIAL_DATE` env var and the `date` column all use dd-mm-yyyy.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// The closed set of tokens this service collects prices for.
///
/// Table names and API identifiers are derived from this enum only, so no
/// SQL identifier is ever built from caller-supplied input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Token {
    Dot,
    Glmr,
    Ksm,
    Movr,
}

impl Token {
    pub const ALL: [Token; 4] = [Token::Dot, Token::Glmr, Token::Ksm, Token::Movr];

    /// Short lowercase symbol, used in logs and metric labels.
    pub fn symbol(&self) -> &'static str {
        match self {
            Token::Dot => "dot",
            Token::Glmr => "glmr",
            Token::Ksm => "ksm",
            Token::Movr => "movr",
        }
    }

    /// CoinGecko coin identifier for the history endpoint.
    pub fn api_id(&self) -> &'static str {
        match self {
            Token::Dot => "polkadot",
            Token::Glmr => "moonbeam",
            Token::Ksm => "kusama",
            Token::Movr => "moonriver",
        }
    }

    /// Postgres table holding this token's daily prices.
    pub fn table(&self) -> &'static str {
        match self {
            Token::Dot => "token_price_dot",
            Token::Glmr => "token_price_glmr",
            Token::Ksm => "token_price_ksm",
            Token::Movr => "token_price_movr",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Format a date in the dd-mm-yyyy wire/storage form.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a dd-mm-yyyy date string.
pub fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_identifiers_match_deployment() {
        assert_eq!(Token::Dot.api_id(), "polkadot");
        assert_eq!(Token::Glmr.api_id(), "moonbeam");
        assert_eq!(Token::Ksm.api_id(), "kusama");
        assert_eq!(Token::Movr.api_id(), "moonriver");
    }

    #[test]
    fn table_names_follow_symbol() {
        for token in Token::ALL {
            assert_eq!(token.table(), format!("token_price_{}", token.symbol()));
        }
    }

    #[test]
    fn date_round_trip() {
        let date = parse_date("01-01-2023").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(format_date(date), "01-01-2023");
    }

    #[test]
    fn rejects_iso_dates() {
        assert!(parse_date("2023-01-01").is_err());
    }
}
