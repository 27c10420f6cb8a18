//! HTTP access to the data and admin APIs.

mod basic;
mod client;
mod variables;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use variables::{DataEndpoint, VariableStore};

use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// GETs `url` and returns the body. Non-success statuses are errors.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Bytes> {
    let req = Request::new(Method::GET, url.parse()?);
    let resp = checked(client.execute(req).await?).await?;
    Ok(resp.bytes().await?)
}

/// GETs `url` and decodes the JSON body.
pub async fn fetch_json<C: HttpClient, T: DeserializeOwned>(client: &C, url: &str) -> Result<T> {
    let bytes = fetch_bytes(client, url).await?;
    serde_json::from_slice(&bytes).with_context(|| format!("Failed to parse JSON from {url}"))
}

/// Sends `body` as JSON with `method` and decodes the JSON response.
pub async fn send_json<C, B, T>(client: &C, method: Method, url: &str, body: &B) -> Result<T>
where
    C: HttpClient,
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let mut req = Request::new(method, url.parse()?);
    req.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    *req.body_mut() = Some(serde_json::to_vec(body)?.into());

    let resp = checked(client.execute(req).await?).await?;
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).with_context(|| format!("Failed to parse JSON from {url}"))
}

async fn checked(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(anyhow!("{url} returned status {status}: {body}"))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::HttpClient;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// A request as seen by [`StaticClient`].
    #[derive(Debug, Clone)]
    pub struct Recorded {
        pub method: String,
        pub url: String,
        pub body: Option<String>,
    }

    /// Answers every request with the same status and body.
    pub struct StaticClient {
        status: u16,
        body: &'static str,
        pub requests: Mutex<Vec<Recorded>>,
    }

    impl StaticClient {
        pub fn new(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn recorded(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpClient for StaticClient {
        async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            self.requests.lock().unwrap().push(Recorded {
                method: req.method().to_string(),
                url: req.url().to_string(),
                body: req
                    .body()
                    .and_then(|b| b.as_bytes())
                    .map(|b| String::from_utf8_lossy(b).into_owned()),
            });

            let resp = http::Response::builder()
                .status(self.status)
                .body(self.body)
                .unwrap();
            Ok(reqwest::Response::from(resp))
        }
    }
}
