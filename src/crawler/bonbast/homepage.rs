use concat_string::concat_string;
use reqwest::header;

use crate::{
    crawler::{bonbast::Bonbast, check_status, CrawlerError},
    util,
};

impl Bonbast {
    /// 抓取首頁 HTML
    ///
    /// # Errors
    /// * `Transport` - 連線失敗
    /// * `Blocked` - 網站回 403，來源 IP 被封鎖
    /// * `HttpStatus` - 其他非 2xx 狀態
    pub async fn fetch_homepage(&self) -> Result<String, CrawlerError> {
        let url = concat_string!(self.base_uri, "/");
        let mut headers = header::HeaderMap::new();
        headers.insert(header::USER_AGENT, self.user_agent.clone());

        let res = util::http::get(&self.client, &url, Some(headers)).await?;
        check_status(res.status())?;

        Ok(res.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;
    use crate::{config, crawler::bonbast::mock::MockSite};

    #[tokio::test]
    async fn test_fetch_homepage() {
        let site =
            MockSite::start((StatusCode::OK, "<html>home</html>"), (StatusCode::OK, "{}")).await;
        let settings = config::Bonbast {
            base_uri: site.base_uri.clone(),
            use_system_proxy: false,
            user_agent: "rate-client/1.0".to_string(),
            ..Default::default()
        };
        let bonbast = Bonbast::new(&settings).unwrap();

        let body = bonbast.fetch_homepage().await.unwrap();

        assert_eq!(body, "<html>home</html>");
        let recorded = site.last_homepage_request().unwrap();
        assert_eq!(recorded.header("user-agent"), Some("rate-client/1.0"));
    }

    #[tokio::test]
    async fn test_fetch_homepage_status() {
        let site = MockSite::start((StatusCode::FORBIDDEN, ""), (StatusCode::OK, "{}")).await;
        let settings = config::Bonbast {
            base_uri: site.base_uri.clone(),
            use_system_proxy: false,
            ..Default::default()
        };
        let bonbast = Bonbast::new(&settings).unwrap();

        assert!(matches!(
            bonbast.fetch_homepage().await,
            Err(CrawlerError::Blocked)
        ));
    }

    #[tokio::test]
    async fn test_fetch_homepage_redirect() {
        let site =
            MockSite::start((StatusCode::MOVED_PERMANENTLY, ""), (StatusCode::OK, "{}")).await;
        let settings = config::Bonbast {
            base_uri: site.base_uri.clone(),
            use_system_proxy: false,
            ..Default::default()
        };
        let bonbast = Bonbast::new(&settings).unwrap();

        match bonbast.fetch_homepage().await {
            Err(CrawlerError::HttpStatus { code }) => assert_eq!(code, 301),
            other => panic!("301 was followed: {:?}", other),
        }
    }
}
