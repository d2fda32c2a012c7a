use super::error::{ApiError, ApiResult};
use super::logging::{debug_payload_enabled, emit_debug_payload};
use super::transport::{ByteStream, ChatTransport};
use crate::config::Config;
use crate::types::{ApiKeyRequest, ChatRequest, Conversation, ConversationMessage};
use crate::util::is_local_endpoint_url;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

/// HTTP adapter for the reasoning backend. No retries: every failure is
/// returned to the caller once.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> ApiResult<Self> {
        let http = reqwest::Client::builder().build().map_err(|error| ApiError::Request {
            url: config.api_url.clone(),
            message: error.to_string(),
        })?;
        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> ApiResult<String> {
        let mut url = Url::parse(&self.base_url).map_err(|error| ApiError::Request {
            url: self.base_url.clone(),
            message: error.to_string(),
        })?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Request {
                url: self.base_url.clone(),
                message: "base URL cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url.to_string())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> ApiResult<T> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|error| map_api_request_error(error, url))?;
        let response = check_status(response, url, what)?;
        response
            .json::<T>()
            .await
            .map_err(|error| ApiError::Decode {
                url: url.to_string(),
                message: error.to_string(),
            })
    }
}

#[async_trait]
impl ChatTransport for ApiClient {
    async fn open_chat_stream(&self, request: &ChatRequest) -> ApiResult<ByteStream> {
        let request_url = self.endpoint(&["chat"])?;
        if debug_payload_enabled() {
            emit_debug_payload(&request_url, request);
        }

        let response = self
            .http
            .post(&request_url)
            .header("accept", "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(|error| map_api_request_error(error, &request_url))?
            .error_for_status()
            .map_err(|error| map_api_request_error(error, &request_url))?;

        let request_url_for_stream = request_url.clone();
        let stream = response.bytes_stream().map(move |item| {
            item.map_err(|error| map_api_request_error(error, &request_url_for_stream))
        });
        Ok(Box::pin(stream))
    }

    async fn get_conversations(&self) -> ApiResult<Vec<Conversation>> {
        let url = self.endpoint(&["conversations"])?;
        self.get_json(&url, "conversation list").await
    }

    async fn get_conversation_messages(
        &self,
        conversation_id: &str,
    ) -> ApiResult<Vec<ConversationMessage>> {
        let url = self.endpoint(&["conversations", conversation_id, "messages"])?;
        self.get_json(&url, &format!("conversation {conversation_id}"))
            .await
    }

    async fn delete_conversation(&self, conversation_id: &str) -> ApiResult<bool> {
        let url = self.endpoint(&["conversations", conversation_id])?;
        let response = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(|error| map_api_request_error(error, &url))?;
        check_status(response, &url, &format!("conversation {conversation_id}"))?;
        Ok(true)
    }

    async fn save_api_key(&self, model: &str, key: &str) -> ApiResult<bool> {
        let url = self.endpoint(&["config", "api-key"])?;
        let body = ApiKeyRequest {
            model: model.to_string(),
            key: key.to_string(),
        };
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|error| map_api_request_error(error, &url))?;
        Ok(response.status().is_success())
    }
}

fn check_status(response: reqwest::Response, url: &str, what: &str) -> ApiResult<reqwest::Response> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound {
            what: what.to_string(),
        });
    }
    if !status.is_success() {
        return Err(ApiError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}

pub(crate) fn map_api_request_error(error: reqwest::Error, request_url: &str) -> ApiError {
    let url = request_url.to_string();
    let message = error.to_string();
    if error.is_connect() && is_local_endpoint_url(request_url) {
        return ApiError::LocalUnreachable { url, message };
    }
    if error.is_connect() {
        return ApiError::Connect { url, message };
    }
    if error.is_timeout() {
        return ApiError::Timeout { url, message };
    }
    if let Some(status) = error.status() {
        return ApiError::Status {
            url,
            status: status.as_u16(),
        };
    }
    ApiError::Request { url, message }
}
