mod categories;
mod goods;
mod todos;
mod trades;

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::domain::model::{AppError, AppResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the remote data store. One instance per authenticated
/// session; every request carries the session token, and the store scopes
/// rows to the owner behind it. Implements all four repository traits (see
/// the sibling modules).
#[derive(Debug, Clone)]
pub struct RestStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    access_token: String,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: &str, access_token: &str) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(format!("http client: {e}")))?;
        info!(base_url, "remote store client ready");
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            access_token: access_token.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.with_auth(self.http.get(self.url(path)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.with_auth(self.http.post(self.url(path)))
    }

    fn patch(&self, path: &str) -> RequestBuilder {
        self.with_auth(self.http.patch(self.url(path)))
    }

    fn delete_req(&self, path: &str) -> RequestBuilder {
        self.with_auth(self.http.delete(self.url(path)))
    }

    fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.access_token)
    }

    /// Send and decode a JSON body, mapping HTTP failures onto the error
    /// taxonomy.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> AppResult<T> {
        let resp = self.checked(builder).await?;
        resp.json::<T>()
            .await
            .map_err(|e| AppError::Internal(format!("decode error: {e}")))
    }

    /// Like `send`, but a 404 becomes `Ok(None)` (detail lookups).
    async fn send_opt<T: DeserializeOwned>(&self, builder: RequestBuilder) -> AppResult<Option<T>> {
        match self.send(builder).await {
            Ok(value) => Ok(Some(value)),
            Err(AppError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Send discarding the body (deletes, batch writes).
    async fn send_unit(&self, builder: RequestBuilder) -> AppResult<()> {
        self.checked(builder).await.map(|_| ())
    }

    async fn checked(&self, builder: RequestBuilder) -> AppResult<Response> {
        let resp = builder.send().await.map_err(transport_error)?;
        let status = resp.status();
        if status.is_success() {
            debug!(%status, "store request ok");
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }
}

fn transport_error(err: reqwest::Error) -> AppError {
    AppError::Transport(err.to_string())
}

fn status_error(status: StatusCode, body: &str) -> AppError {
    match status {
        StatusCode::NOT_FOUND | StatusCode::NOT_ACCEPTABLE => AppError::NotFound,
        StatusCode::CONFLICT => AppError::Conflict(body.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Unauthorized,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            AppError::Validation(body.to_string())
        }
        s if s.is_server_error() => AppError::Transport(format!("{s}: {body}")),
        s => AppError::Internal(format!("{s}: {body}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_covers_the_taxonomy() {
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, ""),
            AppError::NotFound
        ));
        assert!(matches!(
            status_error(StatusCode::CONFLICT, "duplicate"),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, ""),
            AppError::Unauthorized
        ));
        assert!(matches!(
            status_error(StatusCode::UNPROCESSABLE_ENTITY, "bad"),
            AppError::Validation(_)
        ));
        // 5xx is transport-classified, so the cache's bounded retry applies.
        assert!(status_error(StatusCode::BAD_GATEWAY, "").is_retryable());
        assert!(!status_error(StatusCode::IM_A_TEAPOT, "").is_retryable());
    }
}
