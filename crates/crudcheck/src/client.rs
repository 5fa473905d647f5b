//! HTTP client for the hosted CRUD collection

use std::time::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CrudError, CrudResult};
use crate::record::BookFields;

/// Status and raw body of one HTTP exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    /// Parse the body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> CrudResult<T> {
        serde_json::from_str(&self.body).map_err(CrudError::from)
    }

    /// Fail unless the status is one of `accepted`
    pub fn expect_status(&self, step: &str, accepted: &[u16]) -> CrudResult<()> {
        if accepted.contains(&self.status) {
            Ok(())
        } else {
            Err(CrudError::unexpected_status(step, accepted, self.status, &self.body))
        }
    }
}

/// Client bound to one collection URL
pub struct CrudClient {
    http: reqwest::Client,
    collection_url: String,
}

impl CrudClient {
    pub fn new(config: &ApiConfig) -> CrudResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("crudcheck/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            collection_url: config.collection_url()?,
        })
    }

    pub fn collection_url(&self) -> &str {
        &self.collection_url
    }

    pub fn item_url(&self, id: &str) -> String {
        format!("{}/{}", self.collection_url, id)
    }

    /// `POST /collection`
    pub async fn create(&self, fields: &BookFields) -> CrudResult<ApiResponse> {
        let url = self.collection_url.clone();
        info!("Request: POST {}", url);
        info!("Payload: {}", serde_json::to_string(fields)?);
        let resp = self.http.post(&url).json(fields).send().await?;
        Self::finish("POST", url, resp).await
    }

    /// `GET /collection`
    pub async fn list(&self) -> CrudResult<ApiResponse> {
        let url = self.collection_url.clone();
        info!("Request: GET {}", url);
        let resp = self.http.get(&url).send().await?;
        Self::finish("GET", url, resp).await
    }

    /// `GET /collection/{id}`
    pub async fn get(&self, id: &str) -> CrudResult<ApiResponse> {
        let url = self.item_url(id);
        info!("Request: GET {}", url);
        let resp = self.http.get(&url).send().await?;
        Self::finish("GET", url, resp).await
    }

    /// `PUT /collection/{id}`
    pub async fn update(&self, id: &str, fields: &BookFields) -> CrudResult<ApiResponse> {
        let url = self.item_url(id);
        info!("Request: PUT {}", url);
        info!("Payload: {}", serde_json::to_string(fields)?);
        let resp = self.http.put(&url).json(fields).send().await?;
        Self::finish("PUT", url, resp).await
    }

    /// `DELETE /collection/{id}`
    pub async fn delete(&self, id: &str) -> CrudResult<ApiResponse> {
        let url = self.item_url(id);
        info!("Request: DELETE {}", url);
        let resp = self.http.delete(&url).send().await?;
        Self::finish("DELETE", url, resp).await
    }

    async fn finish(method: &str, url: String, resp: reqwest::Response) -> CrudResult<ApiResponse> {
        let status = resp.status().as_u16();
        let body = resp.text().await?;

        info!("Response Status Code: {}", status);
        debug!("Response Body: {}", body);

        Ok(ApiResponse {
            method: method.to_string(),
            url,
            status,
            body,
        })
    }
}

/// Where the collection lives and how to talk to it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Service root, without the access key
    pub base_url: String,

    /// Access key embedded in the URL path
    pub api_key: String,

    /// Collection name
    pub collection: String,

    /// Per-request timeout
    pub timeout_secs: u64,

    /// Also require the created record to appear in the listing
    pub strict_listing: bool,
}

impl ApiConfig {
    /// `<base_url>/<api_key>/<collection>`, or `<base_url>/<collection>` when no key is set
    pub fn collection_url(&self) -> CrudResult<String> {
        let base = self.base_url.trim_end_matches('/');
        if base.is_empty() {
            return Err(CrudError::InvalidConfig("api.base_url is empty".to_string()));
        }

        let collection = self.collection.trim_matches('/');
        if collection.is_empty() {
            return Err(CrudError::InvalidConfig("api.collection is empty".to_string()));
        }

        let key = self.api_key.trim_matches('/');
        if key.is_empty() {
            Ok(format!("{}/{}", base, collection))
        } else {
            Ok(format!("{}/{}/{}", base, key, collection))
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://crudcrud.com/api".to_string(),
            api_key: "c1eca691026a4713b242906ec2a3ce76".to_string(),
            collection: "books".to_string(),
            timeout_secs: 30,
            strict_listing: false,
        }
    }
}
