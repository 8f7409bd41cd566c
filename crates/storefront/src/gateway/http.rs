//! Hosted entity API backend.
//!
//! Uses `reqwest` 0.13 with JSON bodies against
//! `{api_url}/apps/{app_id}/entities/{Entity}`.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::{debug, error};

use super::{EntityStore, Filter, GatewayError};
use crate::config::EntityApiConfig;

/// Client for the hosted entity API.
#[derive(Clone)]
pub struct HttpEntityStore {
    inner: Arc<HttpEntityStoreInner>,
}

struct HttpEntityStoreInner {
    client: reqwest::Client,
    base: String,
    api_key: String,
}

impl HttpEntityStore {
    /// Create a new entity API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &EntityApiConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let base = format!(
            "{}/apps/{}/entities",
            config.api_url.as_str().trim_end_matches('/'),
            config.app_id
        );

        Ok(Self {
            inner: Arc::new(HttpEntityStoreInner {
                client,
                base,
                api_key: config.api_key.expose_secret().to_string(),
            }),
        })
    }

    fn request(&self, method: Method, entity: &str, id: Option<&str>) -> RequestBuilder {
        let url = match id {
            Some(id) => format!("{}/{entity}/{id}", self.inner.base),
            None => format!("{}/{entity}", self.inner.base),
        };
        self.inner
            .client
            .request(method, url)
            .header("api_key", &self.inner.api_key)
            .header("Content-Type", "application/json")
    }

    /// Send a request and return the parsed JSON body.
    async fn execute(
        &self,
        request: RequestBuilder,
        target: &str,
    ) -> Result<Value, GatewayError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(GatewayError::RateLimited(retry_after));
        }

        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(target.to_string()));
        }

        let body = response.text().await?;

        if !status.is_success() {
            error!(
                status = %status,
                target,
                body = %body.chars().take(500).collect::<String>(),
                "Entity API returned non-success status"
            );
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| {
            error!(
                error = %e,
                target,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse entity API response"
            );
            GatewayError::Parse(e)
        })
    }

    async fn fetch_list(
        &self,
        request: RequestBuilder,
        entity: &str,
    ) -> Result<Vec<Value>, GatewayError> {
        match self.execute(request, entity).await? {
            Value::Array(records) => {
                debug!(entity, count = records.len(), "Fetched records");
                Ok(records)
            }
            Value::Null => Ok(Vec::new()),
            other => Err(GatewayError::Api {
                status: 200,
                message: format!("expected a JSON array, got {}", json_kind(&other)),
            }),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl EntityStore for HttpEntityStore {
    fn backend_tag(&self) -> &'static str {
        "http"
    }

    async fn list(&self, entity: &str) -> Result<Vec<Value>, GatewayError> {
        let request = self.request(Method::GET, entity, None);
        self.fetch_list(request, entity).await
    }

    async fn filter(&self, entity: &str, filter: &Filter) -> Result<Vec<Value>, GatewayError> {
        let q = serde_json::to_string(&filter.to_json())?;
        let request = self
            .request(Method::GET, entity, None)
            .query(&[("q", q.as_str())]);
        self.fetch_list(request, entity).await
    }

    async fn create(&self, entity: &str, fields: Value) -> Result<Value, GatewayError> {
        let request = self.request(Method::POST, entity, None).json(&fields);
        self.execute(request, entity).await
    }

    async fn update(&self, entity: &str, id: &str, patch: Value) -> Result<Value, GatewayError> {
        let request = self.request(Method::PUT, entity, Some(id)).json(&patch);
        self.execute(request, &format!("{entity}/{id}")).await
    }

    async fn delete(&self, entity: &str, id: &str) -> Result<(), GatewayError> {
        let request = self.request(Method::DELETE, entity, Some(id));
        self.execute(request, &format!("{entity}/{id}")).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use std::time::Duration;
    use url::Url;

    fn config(api_url: &str) -> EntityApiConfig {
        EntityApiConfig {
            api_url: Url::parse(api_url).unwrap(),
            app_id: "app123".to_string(),
            api_key: SecretString::from("k3y-Value-with-entropy-42"),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let store = HttpEntityStore::new(&config("https://entities.example.com/api/")).unwrap();
        assert_eq!(
            store.inner.base,
            "https://entities.example.com/api/apps/app123/entities"
        );
    }

    #[test]
    fn test_record_url_includes_id() {
        let store = HttpEntityStore::new(&config("https://entities.example.com/api")).unwrap();
        let request = store
            .request(Method::PUT, "CartItem", Some("abc"))
            .build()
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://entities.example.com/api/apps/app123/entities/CartItem/abc"
        );
        assert_eq!(request.method(), Method::PUT);
        assert!(request.headers().contains_key("api_key"));
    }

    #[test]
    fn test_json_kind() {
        assert_eq!(json_kind(&Value::Null), "null");
        assert_eq!(json_kind(&serde_json::json!({})), "an object");
    }
}
