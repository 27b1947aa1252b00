//! reqwest-backed client for the Okapi gateway

use super::{query, ApiError, ApiResponse, FolioApi};
use crate::config::OkapiSettings;
use crate::error::{ErrorCode, PolBatchError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, trace};

const TENANT_HEADER: &str = "x-okapi-tenant";
const TOKEN_HEADER: &str = "x-okapi-token";

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// An authenticated Okapi session
pub struct OkapiClient {
    client: Client,
    base_url: String,
    tenant: String,
    token: String,
    page_size: u32,
}

impl OkapiClient {
    /// Build the HTTP client and log in.
    ///
    /// Any failure here is fatal for the run: an unreachable host maps to a
    /// connection error, a refused login to an authentication error.
    pub async fn connect(settings: &OkapiSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| {
                PolBatchError::connection_with_code(
                    ErrorCode::CONNECTION_CLIENT_BUILD,
                    "failed to create HTTP client",
                    None,
                )
                .with_source(e)
            })?;

        let login_url = format!("{}/authn/login", settings.url);
        info!(
            "Logging in to {} as {} (tenant {})",
            settings.url, settings.username, settings.tenant_id
        );

        let response = client
            .post(&login_url)
            .header(TENANT_HEADER, &settings.tenant_id)
            .json(&LoginRequest {
                username: &settings.username,
                password: &settings.password,
            })
            .send()
            .await
            .map_err(|e| {
                let code = if e.is_timeout() {
                    ErrorCode::CONNECTION_TIMEOUT
                } else {
                    ErrorCode::CONNECTION_UNREACHABLE
                };
                PolBatchError::connection_with_code(code, e.to_string(), Some(settings.url.clone()))
            })?;

        let status = response.status();
        let header_token = response
            .headers()
            .get(TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(PolBatchError::auth_with_code(
                ErrorCode::AUTH_REJECTED,
                format!("login returned {}: {}", status, body.trim()),
            ));
        }

        let token = header_token
            .or_else(|| token_from_body(&body))
            .ok_or_else(|| {
                PolBatchError::auth_with_code(ErrorCode::AUTH_NO_TOKEN, "login response carried no token")
            })?;
        debug!("Okapi login succeeded");

        Ok(Self {
            client,
            base_url: settings.url.clone(),
            tenant: settings.tenant_id.clone(),
            token,
            page_size: settings.page_size,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(TENANT_HEADER, &self.tenant)
            .header(TOKEN_HEADER, &self.token)
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> std::result::Result<Response, ApiError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Unauthorized { status, body });
        }
        Ok(response)
    }

    async fn into_api_response(
        url: &str,
        response: Response,
    ) -> std::result::Result<ApiResponse, ApiError> {
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| transport_error(url, e))?;
        trace!("{} -> {} {}", url, status, body);
        Ok(ApiResponse { status, body })
    }

    async fn get_page(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> std::result::Result<Value, ApiError> {
        let url = self.url(path);
        debug!("GET {} {:?}", url, params);
        let response = self.send(&url, self.client.get(&url).query(params)).await?;
        let reply = Self::into_api_response(&url, response).await?;
        if !reply.is_success() {
            return Err(ApiError::Status {
                status: reply.status,
                body: reply.body,
            });
        }
        serde_json::from_str(&reply.body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn token_from_body(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("okapiToken")?
        .as_str()
        .map(str::to_string)
}

fn transport_error(url: &str, err: reqwest::Error) -> ApiError {
    let message = if err.is_timeout() {
        format!("timed out: {}", err)
    } else {
        err.to_string()
    };
    ApiError::Transport {
        url: url.to_string(),
        message,
    }
}

#[async_trait]
impl FolioApi for OkapiClient {
    async fn get_json(&self, path: &str, query: Option<&str>) -> std::result::Result<Value, ApiError> {
        let mut params = Vec::new();
        if let Some(q) = query {
            params.push(("query", q.to_string()));
        }
        self.get_page(path, &params).await
    }

    async fn get_all(
        &self,
        path: &str,
        key: &str,
        query: Option<&str>,
    ) -> std::result::Result<Vec<Value>, ApiError> {
        let cql = match query {
            Some(q) => format!("{} sortBy id", q),
            None => query::ALL_RECORDS.to_string(),
        };
        let limit = self.page_size as usize;
        let mut records = Vec::new();
        let mut offset = 0usize;

        loop {
            let params = [
                ("query", cql.clone()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ];
            let page = self.get_page(path, &params).await?;
            let items = match page.get(key) {
                Some(Value::Array(items)) => items.clone(),
                _ => {
                    return Err(ApiError::Decode(format!(
                        "response from {} has no '{}' array",
                        path, key
                    )))
                }
            };
            let count = items.len();
            records.extend(items);
            // a full page can still be the last one; trust the total when given
            let done = match page.get("totalRecords").and_then(Value::as_u64) {
                Some(total) => count == 0 || records.len() as u64 >= total,
                None => count < limit,
            };
            if done {
                break;
            }
            offset += count;
        }

        debug!("Fetched {} records from {}", records.len(), path);
        Ok(records)
    }

    async fn put_json(&self, path: &str, body: &Value) -> std::result::Result<ApiResponse, ApiError> {
        let url = self.url(path);
        debug!("PUT {}", url);
        let response = self.send(&url, self.client.put(&url).json(body)).await?;
        Self::into_api_response(&url, response).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> std::result::Result<ApiResponse, ApiError> {
        let url = self.url(path);
        debug!("POST {}", url);
        let response = self.send(&url, self.client.post(&url).json(body)).await?;
        Self::into_api_response(&url, response).await
    }
}
