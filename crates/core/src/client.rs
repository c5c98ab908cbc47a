//! Typed client surface
//!
//! One operation per HTTP verb plus `upload`. Every call resolves to a
//! [`ResponseEnvelope`]; callers check `error` instead of handling a
//! `Result`.

use std::sync::Arc;

use meridian_domain::constants::{CONTENT_TYPE_JSON, HEADER_ACCEPT};
use meridian_domain::{
    ApiError, HttpMethod, MultipartBody, RequestBody, RequestConfig, RequestDescriptor,
    ResponseEnvelope,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::pipeline::RequestPipeline;

/// Façade over the [`RequestPipeline`]
///
/// Cheap to share behind an `Arc`; holds no per-call state.
#[derive(Clone)]
pub struct ApiClient {
    pipeline: Arc<RequestPipeline>,
}

impl ApiClient {
    pub fn new(pipeline: Arc<RequestPipeline>) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        config: Option<RequestConfig>,
    ) -> ResponseEnvelope<T> {
        self.pipeline.dispatch(Self::descriptor(HttpMethod::Get, url, config)).await
    }

    pub async fn post<T, B>(
        &self,
        url: &str,
        body: Option<&B>,
        config: Option<RequestConfig>,
    ) -> ResponseEnvelope<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(HttpMethod::Post, url, body, config).await
    }

    pub async fn put<T, B>(
        &self,
        url: &str,
        body: Option<&B>,
        config: Option<RequestConfig>,
    ) -> ResponseEnvelope<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(HttpMethod::Put, url, body, config).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        url: &str,
        config: Option<RequestConfig>,
    ) -> ResponseEnvelope<T> {
        self.pipeline.dispatch(Self::descriptor(HttpMethod::Delete, url, config)).await
    }

    /// Send a multipart form with `POST`.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        url: &str,
        form: MultipartBody,
        config: Option<RequestConfig>,
    ) -> ResponseEnvelope<T> {
        let request =
            Self::descriptor(HttpMethod::Post, url, config).with_body(RequestBody::Multipart(form));
        self.pipeline.dispatch(request).await
    }

    async fn send_json<T, B>(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&B>,
        config: Option<RequestConfig>,
    ) -> ResponseEnvelope<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = Self::descriptor(method, url, config);

        match body.map(serde_json::to_value).transpose() {
            Ok(Some(json)) => self.pipeline.dispatch(request.with_body(RequestBody::Json(json))).await,
            Ok(None) => self.pipeline.dispatch(request).await,
            Err(err) => {
                let error = ApiError::InvalidRequest(format!("failed to serialize request body: {err}"));
                ResponseEnvelope::from_outcome(self.pipeline.reject(request, error).await)
            }
        }
    }

    fn descriptor(method: HttpMethod, url: &str, config: Option<RequestConfig>) -> RequestDescriptor {
        let mut request = RequestDescriptor::new(method, url);
        request.set_header(HEADER_ACCEPT, CONTENT_TYPE_JSON);
        match config {
            Some(config) => request.with_config(config),
            None => request,
        }
    }
}
