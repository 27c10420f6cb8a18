use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes prepared requests. Implemented by [`super::BasicClient`] and by
/// in-memory fakes in tests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
