use anyhow::{Context as AnyhowContext, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tally_core::{ByteSource, TallyError};

/// Build the client shared by every URL of a batch.
pub fn build_client(timeout: Duration, user_agent: &str) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .context("Failed to build HTTP client")
}

/// A remote document fetched with a single `GET`.
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ByteSource for HttpSource {
    fn origin(&self) -> &str {
        &self.url
    }

    async fn read_all(&self) -> tally_core::Result<Vec<u8>> {
        let url = Url::parse(&self.url)
            .map_err(|e| TallyError::fetch(&self.url, format!("invalid URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TallyError::fetch(
                &self.url,
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| TallyError::fetch(&self.url, e.to_string()))?;
        let body = response
            .bytes()
            .await
            .map_err(|e| TallyError::fetch(&self.url, format!("failed to read body: {e}")))?;
        Ok(body.to_vec())
    }
}

/// Split a newline-separated URL list, dropping blank entries.
pub fn parse_url_list(raw: &str) -> Vec<String> {
    raw.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn client() -> Client {
        build_client(Duration::from_secs(1), "tally-test").unwrap()
    }

    #[test]
    fn url_list_is_trimmed_and_compacted() {
        assert_eq!(
            parse_url_list("https://a.example/x.txt\r\n\n   \nhttps://b.example/y.txt  "),
            vec![
                "https://a.example/x.txt".to_string(),
                "https://b.example/y.txt".to_string()
            ]
        );
        assert!(parse_url_list("\n \n").is_empty());
    }

    #[tokio::test]
    async fn malformed_url_is_a_fetch_error() {
        let source = HttpSource::new(client(), "not a url");
        let err = source.read_all().await.unwrap_err();
        assert!(
            matches!(&err, TallyError::Fetch { origin, message } if origin == "not a url" && message.starts_with("invalid URL"))
        );
    }

    #[tokio::test]
    async fn non_http_scheme_is_refused() {
        let source = HttpSource::new(client(), "file:///etc/passwd");
        let err = source.read_all().await.unwrap_err();
        assert!(err.to_string().contains("unsupported scheme 'file'"));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_fetch_error() {
        // Nothing listens on the loopback discard port.
        let source = HttpSource::new(client(), "http://127.0.0.1:9/stock.txt");
        let err = source.read_all().await.unwrap_err();
        assert!(matches!(err, TallyError::Fetch { .. }));
        assert_eq!(source.origin(), "http://127.0.0.1:9/stock.txt");
    }
}
