//! JSON HTTP client, shared by the LCD client and the market data sources

use crate::{prelude::*, Error, ErrorKind};
use bytes::buf::ext::BufExt;
use hyper::{
    client::{Client, HttpConnector},
    header, Body, Request,
};
use hyper_rustls::HttpsConnector;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tokio::time::timeout;

/// User-Agent to send in HTTP requests
pub const USER_AGENT: &str = "pythia";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// JSON HTTP client for a single remote endpoint
pub struct HttpClient {
    http_client: Client<HttpsConnector<HttpConnector>>,
    base_uri: String,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new client for the endpoint at `base_uri` (scheme + authority)
    pub fn new(base_uri: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http_client: Client::builder().build(HttpsConnector::new()),
            base_uri: base_uri.into(),
            timeout,
        }
    }

    /// HTTP GET request that gets json
    pub async fn get_json<T>(&self, path: &str) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let request = self.request_builder("GET", path).body(Body::empty())?;
        self.send(request).await
    }

    /// HTTP POST request with a json body that gets json back
    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let body = serde_json::to_vec(body)?;
        let request = self.request_builder("POST", path).body(Body::from(body))?;
        self.send(request).await
    }

    fn request_builder(&self, method: &str, path: &str) -> http::request::Builder {
        let uri = format!("{}{}", self.base_uri.trim_end_matches('/'), path);

        Request::builder()
            .method(method)
            .uri(&uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(
                header::USER_AGENT,
                format!("{}/{}", USER_AGENT, env!("CARGO_PKG_VERSION")),
            )
    }

    async fn send<T>(&self, request: Request<Body>) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let response = timeout(self.timeout, self.http_client.request(request))
            .await
            .map_err(|e| ErrorKind::Http.context(e))??;

        let status = response.status();
        if !status.is_success() {
            fail!(ErrorKind::Http, "unexpected response status: {}", status);
        }

        let body = hyper::body::aggregate(response.into_body()).await?;
        serde_json::from_reader(body.reader()).map_err(|e| ErrorKind::Decode.context(e).into())
    }
}
