//! Scrapes free-market exchange rates, coin, gold and bitcoin quotes from
//! bonbast.com, which has no public API.
//!
//! ```no_run
//! # async fn run() -> Result<(), bonbast_crawler::crawler::CrawlerError> {
//! let prices = bonbast_crawler::crawler::bonbast::fetch_all_prices().await?;
//! if let Some(usd) = prices.get("US Dollar") {
//!     println!("sell {} buy {:?}", usd.sell, usd.buy);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod crawler;
pub mod declare;
pub mod logging;
pub mod util;

pub use crawler::{bonbast::Bonbast, CrawlerError};
pub use declare::{Instrument, InstrumentKind, PriceSet, Quote, INSTRUMENTS};
