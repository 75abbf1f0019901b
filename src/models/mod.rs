mod price_record;
mod token;

pub use price_record::PriceRecord;
pub use token::{format_date, parse_date, Token, DATE_FORMAT};
