//! Thin async client for the user service REST API.

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const X_CORRELATION_ID: &str = "X-Correlation-Id";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub password: String,
    /// `CUSTOMER` or `ADMIN`; the service defaults to `CUSTOMER`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub timestamp: String,
    pub status: u16,
    pub error_code: String,
    pub message: String,
    pub correlation_id: String,
}

/// Raw outcome of one call: status, echoed correlation id and JSON body.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub correlation_id: Option<String>,
    pub body: Option<Value>,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.body.clone().unwrap_or(Value::Null))
    }

    async fn read(resp: Response) -> Result<Self, reqwest::Error> {
        let status = resp.status().as_u16();
        let correlation_id = resp
            .headers()
            .get(X_CORRELATION_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = resp.text().await?;
        let body = if text.is_empty() {
            None
        } else {
            Some(serde_json::from_str(&text).unwrap_or(Value::String(text)))
        };
        Ok(Self {
            status,
            correlation_id,
            body,
        })
    }
}

pub struct UserClient {
    client: Client,
    base_url: String,
    correlation_id: Option<String>,
}

impl UserClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            correlation_id: None,
        }
    }

    /// Send `id` as `X-Correlation-Id` on every call.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<Reply, reqwest::Error> {
        self.send(self.client.post(self.url("/api/users")).json(user)).await
    }

    pub async fn get_user(&self, id: &str) -> Result<Reply, reqwest::Error> {
        self.send(self.client.get(self.url(&format!("/api/users/{id}")))).await
    }

    pub async fn find_user(&self, email: &str) -> Result<Reply, reqwest::Error> {
        let request = self
            .client
            .get(self.url("/api/users/by-email"))
            .query(&[("email", email)]);
        self.send(request).await
    }

    pub async fn list_users(
        &self,
        page: u32,
        size: u32,
        sort: Option<&str>,
    ) -> Result<Reply, reqwest::Error> {
        let mut query = vec![("page", page.to_string()), ("size", size.to_string())];
        if let Some(sort) = sort {
            query.push(("sort", sort.to_string()));
        }
        self.send(self.client.get(self.url("/api/users")).query(&query)).await
    }

    pub async fn delete_user(&self, id: &str) -> Result<Reply, reqwest::Error> {
        self.send(self.client.delete(self.url(&format!("/api/users/{id}")))).await
    }

    pub async fn health(&self) -> Result<Reply, reqwest::Error> {
        self.send(self.client.get(self.url("/health"))).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Reply, reqwest::Error> {
        let request = match &self.correlation_id {
            Some(id) => request.header(X_CORRELATION_ID, id),
            None => request,
        };
        Reply::read(request.send().await?).await
    }
}
