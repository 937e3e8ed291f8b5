use crate::error::{HueError, Result};
use crate::protocol::first_error;
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Low-level HTTP request handling for bridge REST calls
///
/// Cheap to clone; all clones share one connection pool, so concurrent
/// requests from different lights are fine.
#[derive(Clone)]
pub struct Connection {
    http: Client,
}

impl Connection {
    /// Build a connection whose every request gives up after `request_timeout`
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(request_timeout).build()?;
        Ok(Self { http })
    }

    pub async fn get(&self, url: &str) -> Result<Value> {
        self.send_request::<()>(Method::GET, url, None).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<Value> {
        self.send_request(Method::PUT, url, Some(body)).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<Value> {
        self.send_request(Method::POST, url, Some(body)).await
    }

    /// Send a request and decode the JSON answer, surfacing bridge error entries
    async fn send_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<Value> {
        let mut request = self.http.request(method.clone(), url);
        if let Some(body) = body {
            tracing::debug!("Sending {} {}: {}", method, url, serde_json::to_string(body)?);
            request = request.json(body);
        } else {
            tracing::debug!("Sending {} {}", method, url);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_server_error() {
            return Err(HueError::TransientController {
                detail: format!("{} answered {}", url, status),
            });
        }

        let body: Value = response.json().await?;
        tracing::debug!("Received: {}", body);

        // The bridge reports failures as 200 OK with error entries in the body
        if let Some(error) = first_error(&body) {
            return Err(error.into());
        }

        Ok(body)
    }
}
