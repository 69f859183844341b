use std::future::Future;

use reqwest::Client;
use thiserror::Error;

use crate::config::MonitorConfig;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("http error: {0}")]
    Http(String),
    #[error("parse error: {0}")]
    Parse(String),
}

/// Where the poller gets the raw feed document from.
pub trait FeedSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<String, FeedError>> + Send;
}

pub struct HttpFeed {
    client: Client,
    url: String,
}

impl HttpFeed {
    pub fn from_config(config: &MonitorConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|err| FeedError::Http(err.to_string()))?;
        Ok(Self {
            client,
            url: config.feed_url.clone(),
        })
    }
}

impl FeedSource for HttpFeed {
    async fn fetch(&self) -> Result<String, FeedError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|err| FeedError::Http(format!("request failed for {}: {err}", self.url)))?;
        let response = response
            .error_for_status()
            .map_err(|err| FeedError::Http(format!("non-success status: {err}")))?;
        response
            .text()
            .await
            .map_err(|err| FeedError::Http(format!("unable to read response body: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.expect("read request");
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket
                .write_all(response.as_bytes())
                .await
                .expect("write response");
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/DataMKG/TEWS/autogempa.json")
    }

    fn config_for(url: String) -> MonitorConfig {
        MonitorConfig {
            feed_url: url,
            fetch_timeout: Duration::from_secs(5),
            ..MonitorConfig::default()
        }
    }

    #[tokio::test]
    async fn fetches_body_text() {
        let url = serve_once("200 OK", r#"{"Infogempa":{}}"#).await;
        let feed = HttpFeed::from_config(&config_for(url)).expect("client");
        let body = feed.fetch().await.expect("fetch");
        assert_eq!(body, r#"{"Infogempa":{}}"#);
    }

    #[tokio::test]
    async fn error_status_is_a_fetch_failure() {
        let url = serve_once("503 Service Unavailable", "down").await;
        let feed = HttpFeed::from_config(&config_for(url)).expect("client");
        assert!(matches!(feed.fetch().await, Err(FeedError::Http(_))));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_fetch_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);
        let feed = HttpFeed::from_config(&config_for(format!("http://{addr}/feed.json")))
            .expect("client");
        assert!(matches!(feed.fetch().await, Err(FeedError::Http(_))));
    }
}
