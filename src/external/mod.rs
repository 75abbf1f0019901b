pub mod coingecko;
pub mod price_provider;

pub use coingecko::{CoinGeckoProvider, DEFAULT_BASE_URL};
pub use price_provider::{PriceProvider, PriceProviderError};
