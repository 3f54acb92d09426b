use concat_string::concat_string;
use reqwest::header::{self, HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::{
    crawler::{bonbast::Bonbast, check_status, CrawlerError},
    declare::{Instrument, PriceSet, Quote, INSTRUMENTS},
    util::{self, text},
};

/// 網站要求固定帶上的 cookie
const COOKIE: &str = "st_bb=0";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";
/// 回應帶有這個欄位代表 token 已失效
const RESET_FIELD: &str = "reset";

impl Bonbast {
    /// Posts `token` to the `/json` endpoint and normalizes the answer
    /// against the full instrument table.
    pub async fn fetch_prices(&self, token: &str) -> Result<PriceSet, CrawlerError> {
        let url = concat_string!(self.base_uri, "/json");
        let res = util::http::post_form(
            &self.client,
            &url,
            Some(self.price_headers()),
            &[("param", token)],
        )
        .await?;
        check_status(res.status())?;

        let body = res.text().await?;
        let raw = parse_response(&body)?;

        normalize(&raw, INSTRUMENTS.iter())
    }

    fn price_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, self.user_agent.clone());
        headers.insert(header::REFERER, self.referer.clone());
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(FORM_CONTENT_TYPE),
        );
        headers.insert(header::COOKIE, HeaderValue::from_static(COOKIE));
        headers
    }
}

/// Decodes the `/json` body into its field map.
///
/// # Errors
/// * `MalformedResponse` - the body is not a JSON object; the body is kept.
/// * `InvalidToken` - the object carries a `reset` field. Checked before
///   anything else looks at the fields.
pub fn parse_response(body: &str) -> Result<Map<String, Value>, CrawlerError> {
    let raw = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => {
            return Err(CrawlerError::MalformedResponse {
                body: body.to_string(),
            })
        }
    };

    if raw.contains_key(RESET_FIELD) {
        return Err(CrawlerError::InvalidToken);
    }

    Ok(raw)
}

/// Builds one quote per mapping row, in mapping order.
///
/// `buy` is only set for rows that define a buy key; it is never defaulted.
pub fn normalize<I>(raw: &Map<String, Value>, mapping: I) -> Result<PriceSet, CrawlerError>
where
    I: IntoIterator<Item = &'static Instrument>,
{
    let mapping = mapping.into_iter();
    let mut prices = PriceSet::with_capacity(mapping.size_hint().0);

    for instrument in mapping {
        let sell = field_value(raw, instrument.sell_key)?;
        let buy = match instrument.buy_key {
            Some(key) => Some(field_value(raw, key)?),
            None => None,
        };

        prices.push(instrument, Quote { sell, buy });
    }

    Ok(prices)
}

fn field_value(raw: &Map<String, Value>, key: &str) -> Result<Decimal, CrawlerError> {
    let value = raw.get(key).ok_or_else(|| CrawlerError::MissingField {
        field_key: key.to_string(),
    })?;

    let parsed = match value {
        Value::Number(n) => text::parse_decimal(&n.to_string(), None).ok(),
        Value::String(s) => text::parse_decimal(s, None).ok(),
        _ => None,
    };

    parsed.ok_or_else(|| CrawlerError::InvalidFieldValue {
        field_key: key.to_string(),
        value: value.to_string(),
    })
}
