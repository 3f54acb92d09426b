use std::time::{Duration, Instant};

use once_cell::sync::{Lazy, OnceCell};
use reqwest::{header, Client, Method, RequestBuilder, Response};

use crate::{config, logging::Logger};

/// 確保 rustls 的 crypto provider 只安裝一次
static TLS_PROVIDER: OnceCell<()> = OnceCell::new();

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("http"));

/// Builds a reqwest client for the rate site.
///
/// There is no cookie store and no default headers beyond the user-agent;
/// each request sets exactly the headers the site expects. Redirects are
/// never followed, the 3xx response is returned as is.
///
/// # Arguments
///
/// * `settings`: user-agent, timeouts and whether certificate verification is skipped.
///
/// # Returns
///
/// * `Result<Client, reqwest::Error>`: The client, or the builder error.
pub fn build_client(settings: &config::Bonbast) -> Result<Client, reqwest::Error> {
    TLS_PROVIDER.get_or_init(|| {
        // 已經有其他地方安裝過 provider 時會回傳 Err，忽略即可
        let _ = rustls::crypto::ring::default_provider().install_default();
    });

    if settings.accept_invalid_certs {
        LOGGER.warn(format!(
            "TLS certificate verification is disabled for {}",
            settings.base_uri
        ));
    }

    let mut builder = Client::builder();
    if !settings.use_system_proxy {
        builder = builder.no_proxy();
    }

    builder
        // ===== 壓縮 =====
        .brotli(true)
        .gzip(true)
        .zstd(true)
        // ===== 超時設置 =====
        .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .timeout(Duration::from_secs(settings.timeout_secs))
        .tcp_nodelay(true)
        // ===== 重定向 =====
        // 3xx 要交給呼叫端當成錯誤處理，不可自動跟隨
        .redirect(reqwest::redirect::Policy::none())
        // ===== TLS =====
        .danger_accept_invalid_certs(settings.accept_invalid_certs)
        // ===== Headers =====
        .user_agent(settings.user_agent.as_str())
        .build()
}

/// Waits for the request log to drain.
pub fn flush_log(timeout: Duration) {
    LOGGER.flush(timeout);
}

/// Performs an HTTP GET request and returns the raw response.
pub async fn get(
    client: &Client,
    url: &str,
    headers: Option<header::HeaderMap>,
) -> Result<Response, reqwest::Error> {
    send(client, Method::GET, url, headers, None::<fn(_) -> _>).await
}

/// Performs an HTTP POST request with a form-encoded body and returns the raw response.
///
/// # Arguments
///
/// * `client`: The client to send with.
/// * `url`: The URL to send the POST request to.
/// * `headers`: Headers to include; a `content-type` given here wins over the form default.
/// * `params`: Form key-value pairs.
pub async fn post_form(
    client: &Client,
    url: &str,
    headers: Option<header::HeaderMap>,
    params: &[(&str, &str)],
) -> Result<Response, reqwest::Error> {
    send(
        client,
        Method::POST,
        url,
        headers,
        Some(|rb: RequestBuilder| rb.form(params)),
    )
    .await
}

/// Sends a single request. No retries; the outcome and elapsed time are logged.
async fn send(
    client: &Client,
    method: Method,
    url: &str,
    headers: Option<header::HeaderMap>,
    body: Option<impl FnOnce(RequestBuilder) -> RequestBuilder>,
) -> Result<Response, reqwest::Error> {
    let visit_log = format!("{method}:{url}");
    let mut rb = client.request(method, url);

    if let Some(body_fn) = body {
        rb = body_fn(rb);
    }

    // 自訂 headers 放在 body 之後，才能覆蓋 form() 預設的 content-type
    if let Some(h) = headers {
        rb = rb.headers(h);
    }

    let start = Instant::now();
    let res = rb.send().await;
    let elapsed = start.elapsed().as_millis();

    match &res {
        Ok(response) => {
            LOGGER.info(format!("{} {} {} ms", visit_log, response.status(), elapsed));
        }
        Err(why) => {
            LOGGER.error(format!("{} failed because {:?}. {} ms", visit_log, why, elapsed));
        }
    }

    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client() {
        let settings = config::Bonbast::default();
        assert!(build_client(&settings).is_ok());

        let insecure = config::Bonbast {
            accept_invalid_certs: true,
            use_system_proxy: false,
            ..Default::default()
        };
        assert!(build_client(&insecure).is_ok());
    }
}
