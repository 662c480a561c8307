//! Concrete [`HttpFetchPort`] adapter: re-downloads media the runtime
//! receives only as a URL.

use crate::ports::HttpFetchPort;
use crate::util::from_reqwest;
use agentrt_domain::error::Result;
use async_trait::async_trait;

pub struct HttpFetchAdapter {
    client: reqwest::Client,
}

impl HttpFetchAdapter {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("reqwest client builds with default TLS backend"),
        }
    }
}

impl Default for HttpFetchAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpFetchPort for HttpFetchAdapter {
    async fn fetch(&self, url: &str) -> Result<(Vec<u8>, String)> {
        let resp = self.client.get(url).send().await.map_err(|e| from_reqwest("http_fetch", e))?;
        let mime_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = resp.bytes().await.map_err(|e| from_reqwest("http_fetch", e))?;
        Ok((bytes.to_vec(), mime_type))
    }
}
