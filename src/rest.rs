//! HTTP clients for the hosted real-time database and its identity service.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::{Credentials, IdentityProvider};
use crate::config::Config;
use crate::errors::{AuthError, StoreError};
use crate::models::{Session, TaskRecord};
use crate::paths::split_parent;
use crate::push_id::PushIdGenerator;
use crate::store::{Fields, TaskStore};

fn build_client(timeout_secs: u64) -> Result<Client, String> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|err| format!("failed to build http client: {err}"))
}

/// `GET/PUT/PATCH/DELETE {database_url}/{path}.json?auth={token}`.
pub struct RestTaskStore {
    client: Client,
    base_url: String,
    ids: PushIdGenerator,
    token: RwLock<Option<String>>,
}

impl RestTaskStore {
    pub fn new(config: &Config) -> Result<Self, StoreError> {
        let client = build_client(config.request_timeout_secs).map_err(StoreError::Network)?;
        Ok(Self {
            client,
            base_url: config.database_url.trim_end_matches('/').to_string(),
            ids: PushIdGenerator::new(),
            token: RwLock::new(None),
        })
    }

    /// Token sent with every request; set after sign-in.
    pub fn set_token(&self, token: Option<String>) {
        let mut guard = self
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = token;
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path.trim_matches('/'))
    }

    /// URL of a single record. Refuses paths that would address a whole collection.
    fn record_url(&self, path: &str) -> Result<String, StoreError> {
        split_parent(path).ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;
        Ok(self.url(path))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let guard = self
            .token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match guard.as_deref() {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, StoreError> {
        let resp = self
            .authorized(request)
            .send()
            .await
            .map_err(|err| StoreError::Network(err.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|err| StoreError::Network(err.to_string()))?;
        check_status(status, text)
    }
}

fn check_status(status: StatusCode, body: String) -> Result<String, StoreError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(StoreError::Unauthorized);
    }
    if !status.is_success() {
        return Err(StoreError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

/// Turns a collection read into key-ordered pairs. `null` means nothing is there.
fn decode_children(body: &str) -> Result<Option<Vec<(String, TaskRecord)>>, StoreError> {
    let value: Value = serde_json::from_str(body)?;
    match value {
        Value::Null => Ok(None),
        Value::Object(map) => {
            let mut children = Vec::with_capacity(map.len());
            for (key, value) in map {
                children.push((key, serde_json::from_value(value)?));
            }
            children.sort_by(|a, b| a.0.cmp(&b.0));
            Ok(Some(children))
        }
        other => Err(StoreError::Decode(format!(
            "expected an object of tasks, got {other}"
        ))),
    }
}

#[async_trait]
impl TaskStore for RestTaskStore {
    fn generate_key(&self) -> String {
        self.ids.generate()
    }

    async fn set(&self, path: &str, record: &TaskRecord) -> Result<(), StoreError> {
        let url = self.record_url(path)?;
        self.send(self.client.put(url).json(record)).await?;
        Ok(())
    }

    async fn update(&self, path: &str, fields: Fields) -> Result<(), StoreError> {
        let url = self.record_url(path)?;
        self.send(self.client.patch(url).json(&fields)).await?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        let url = self.record_url(path)?;
        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    async fn children(&self, path: &str) -> Result<Option<Vec<(String, TaskRecord)>>, StoreError> {
        let body = self.send(self.client.get(self.url(path))).await?;
        decode_children(&body)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    id_token: Option<String>,
}

/// Email/password accounts through the identity toolkit REST API.
pub struct RestIdentityProvider {
    client: Client,
    auth_url: String,
    api_key: String,
}

impl RestIdentityProvider {
    pub fn new(config: &Config) -> Result<Self, AuthError> {
        let client = build_client(config.request_timeout_secs).map_err(AuthError::Network)?;
        Ok(Self {
            client,
            auth_url: config.auth_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn call(
        &self,
        endpoint: &str,
        credentials: &Credentials,
    ) -> Result<AuthResponse, AuthError> {
        let payload = serde_json::json!({
            "email": credentials.email,
            "password": credentials.password,
            "returnSecureToken": true,
        });
        let resp = self
            .client
            .post(format!("{}/accounts:{endpoint}", self.auth_url))
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(|err| AuthError::Network(err.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|err| AuthError::Network(err.to_string()))?;
        if !status.is_success() {
            return Err(map_auth_error(&text));
        }
        serde_json::from_str(&text).map_err(|err| AuthError::Decode(err.to_string()))
    }
}

/// Maps the provider's `{"error":{"message":"CODE : detail"}}` body to an error.
fn map_auth_error(body: &str) -> AuthError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string());
    let code = message.split(':').next().unwrap_or("").trim();
    match code {
        "EMAIL_EXISTS" => AuthError::EmailInUse,
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED"
        | "INVALID_EMAIL" | "WEAK_PASSWORD" => AuthError::InvalidCredentials(message),
        "MISSING_EMAIL" | "MISSING_PASSWORD" => AuthError::MissingCredentials,
        _ => AuthError::Network(message),
    }
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        credentials.validate()?;
        let resp = self.call("signInWithPassword", credentials).await?;
        let email = if resp.email.is_empty() {
            credentials.email.clone()
        } else {
            resp.email
        };
        Ok(Session {
            user_id: Some(resp.local_id),
            email,
            id_token: resp.id_token,
        })
    }

    async fn create_account(&self, credentials: &Credentials) -> Result<(), AuthError> {
        credentials.validate()?;
        self.call("signUp", credentials).await?;
        Ok(())
    }
}
