//! # Bonbast 報價採集模組
//!
//! bonbast.com 沒有公開 API，取價分三步：
//!
//! 1. `homepage`：抓首頁 HTML。
//! 2. `token`：從首頁內嵌的 script 取出一次性的 `param` token。
//! 3. `price`：帶著 token 呼叫 `/json`，
//!    再依 `declare::INSTRUMENTS` 整理成固定格式。
//!
//! 每次取價都會重跑三個步驟，token 不快取也不重用。

use std::time::Duration;

use concat_string::concat_string;
use reqwest::{header::HeaderValue, Client};

use crate::{
    config::{self, SETTINGS},
    crawler::{
        bonbast::token::{PatternExtractor, TokenExtractor},
        CrawlerError,
    },
    declare::PriceSet,
    logging, util,
};

/// 首頁
pub mod homepage;
/// 取價與正規化
pub mod price;
/// 首頁 token 擷取
pub mod token;

#[cfg(test)]
pub(crate) mod mock;

/// Client for one rate site.
///
/// Holds nothing between runs except the HTTP client and the extraction
/// strategy, so a single instance can serve concurrent callers.
pub struct Bonbast {
    client: Client,
    base_uri: String,
    user_agent: HeaderValue,
    /// `{base_uri}/`
    referer: HeaderValue,
    extractor: Box<dyn TokenExtractor>,
}

impl Bonbast {
    /// Creates a client that extracts the token with [`PatternExtractor`].
    pub fn new(settings: &config::Bonbast) -> Result<Self, CrawlerError> {
        Self::with_extractor(settings, Box::new(PatternExtractor))
    }

    /// # Errors
    /// * `InvalidHeader` - the user-agent or base URI can't be sent as a header
    /// * `Transport` - the HTTP client could not be built
    pub fn with_extractor(
        settings: &config::Bonbast,
        extractor: Box<dyn TokenExtractor>,
    ) -> Result<Self, CrawlerError> {
        let base_uri = settings.base_uri.trim_end_matches('/').to_string();
        let user_agent = header_value("user-agent", &settings.user_agent)?;
        let referer = header_value("referer", &concat_string!(&base_uri, "/"))?;

        Ok(Bonbast {
            client: util::http::build_client(settings)?,
            base_uri,
            user_agent,
            referer,
            extractor,
        })
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Runs homepage → token → prices once. The first failing step ends the
    /// run; nothing partial is returned and nothing is retried.
    pub async fn fetch_all_prices(&self) -> Result<PriceSet, CrawlerError> {
        let homepage = self.fetch_homepage().await?;
        let token = self.extractor.extract(&homepage)?;
        let prices = self.fetch_prices(&token).await?;

        logging::info_file_async(format!(
            "fetched {} quotes from {}",
            prices.len(),
            self.base_uri
        ));

        Ok(prices)
    }

    /// Same as [`Bonbast::fetch_all_prices`] but gives up once `limit` elapses.
    pub async fn fetch_all_prices_within(
        &self,
        limit: Duration,
    ) -> Result<PriceSet, CrawlerError> {
        tokio::time::timeout(limit, self.fetch_all_prices())
            .await
            .map_err(|_| CrawlerError::Timeout(limit))?
    }
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, CrawlerError> {
    HeaderValue::from_str(value).map_err(|_| CrawlerError::InvalidHeader {
        name,
        value: value.to_string(),
    })
}

/// Fetches every quote once using the global settings.
pub async fn fetch_all_prices() -> Result<PriceSet, CrawlerError> {
    let bonbast = Bonbast::new(&SETTINGS.bonbast)?;
    bonbast.fetch_all_prices().await.inspect_err(|why| {
        logging::error_file_async(format!("Failed to fetch_all_prices because {:?}", why));
    })
}
