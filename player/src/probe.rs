use async_trait::async_trait;
use log::debug;
use playgate_core::embed::{EmbedAttempt, EmbedFailure, EmbedLoader};
use reqwest::header::USER_AGENT;

/// Loads embed URLs over HTTP. A response below 400 counts as loaded.
pub struct HttpEmbedLoader {
    client: reqwest::Client,
}

impl HttpEmbedLoader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmbedLoader for HttpEmbedLoader {
    async fn load(&self, attempt: &EmbedAttempt) -> Result<(), EmbedFailure> {
        let mut request = self.client.get(&attempt.url);
        for (name, value) in &attempt.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(user_agent) = attempt.user_agent {
            request = request.header(USER_AGENT, user_agent);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EmbedFailure::load_error(e.to_string()))?;
        let status = response.status().as_u16();
        debug!("{} answered {status} for {}", attempt.strategy, attempt.url);

        match EmbedFailure::from_http_status(status) {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn attempt(url: String) -> EmbedAttempt {
        EmbedAttempt {
            index: 0,
            strategy: "oembed",
            url,
            headers: HashMap::from([("Referer".to_string(), "https://www.tiktok.com/".to_string())]),
            user_agent: Some("Mozilla/5.0 (iPhone)"),
        }
    }

    #[tokio::test]
    async fn test_load_sends_strategy_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/embed/1"))
            .and(header("Referer", "https://www.tiktok.com/"))
            .and(header("User-Agent", "Mozilla/5.0 (iPhone)"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let loader = HttpEmbedLoader::new(reqwest::Client::new());
        assert!(loader.load(&attempt(format!("{}/embed/1", server.uri()))).await.is_ok());
    }

    #[tokio::test]
    async fn test_error_status_fails_the_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let loader = HttpEmbedLoader::new(reqwest::Client::new());
        let failure = loader
            .load(&attempt(format!("{}/embed/1", server.uri())))
            .await
            .unwrap_err();
        assert_eq!(failure.http_status, Some(403));
        assert_eq!(failure.message, "HTTP 403");
    }

    #[tokio::test]
    async fn test_no_content_is_loaded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let loader = HttpEmbedLoader::new(reqwest::Client::new());
        assert!(loader.load(&attempt(server.uri())).await.is_ok());
    }
}
