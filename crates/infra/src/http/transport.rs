//! reqwest-backed [`Transport`]
//!
//! Resolves request URLs against the configured API base, encodes JSON or
//! multipart bodies and classifies the answer: any status >= 400 becomes an
//! [`ApiError`] carrying the server's message when it sent one.

use std::collections::BTreeMap;

use async_trait::async_trait;
use meridian_core::Transport;
use meridian_domain::{
    ApiConfig, ApiError, HttpMethod, MeridianError, MultipartBody, MultipartPart, RawResponse,
    RequestBody, RequestDescriptor,
};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use super::client::HttpClient;
use crate::errors::IntoApiError;

/// Production transport talking to the remote API
#[derive(Clone)]
pub struct ReqwestTransport {
    client: HttpClient,
    base_url: Url,
}

impl ReqwestTransport {
    /// # Errors
    /// Returns `MeridianError::Config` if `base_url` is not an absolute URL.
    pub fn new(client: HttpClient, base_url: &str) -> Result<Self, MeridianError> {
        let mut base = Url::parse(base_url.trim()).map_err(|err| {
            MeridianError::Config(format!("invalid API base URL '{base_url}': {err}"))
        })?;
        if base.cannot_be_a_base() {
            return Err(MeridianError::Config(format!("API base URL '{base_url}' cannot be a base")));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { client, base_url: base })
    }

    /// Transport with timeout, attempts and user agent taken from `config`.
    pub fn from_config(config: &ApiConfig) -> Result<Self, MeridianError> {
        let mut builder =
            HttpClient::builder().timeout(config.timeout()).max_attempts(config.max_attempts);
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        Self::new(builder.build()?, &config.base_url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for a request; relative paths are joined onto the base.
    pub fn resolve(&self, url: &str) -> Result<Url, ApiError> {
        if let Ok(absolute) = Url::parse(url) {
            if absolute.has_host() {
                return Ok(absolute);
            }
        }
        self.base_url
            .join(url.trim_start_matches('/'))
            .map_err(|err| ApiError::InvalidRequest(format!("invalid request URL '{url}': {err}")))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(
        skip_all,
        fields(method = %request.method, url = %request.url, request_id = request.request_id())
    )]
    async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse, ApiError> {
        let mut url = self.resolve(&request.url)?;
        append_query(&mut url, &request.params);

        let mut builder = self.client.request(method_of(request.method), url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Multipart(body) => builder.multipart(multipart_form(body)?),
        };

        let timeout = request.timeout.unwrap_or_else(|| self.client.timeout());
        let response = self.client.send(builder).await?;

        let status = response.status().as_u16();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let text = response.text().await.map_err(|err| err.into_api_error(timeout))?;
        let body = parse_body(&text);

        debug!(status, "transport answered");

        if status >= 400 {
            return Err(ApiError::from_status(status, &body));
        }

        Ok(RawResponse { status, headers, body })
    }
}

fn method_of(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Query parameters; `null` is skipped and arrays repeat the key.
fn append_query(url: &mut Url, params: &BTreeMap<String, Value>) {
    if params.values().all(Value::is_null) {
        return;
    }
    let mut pairs = url.query_pairs_mut();
    for (name, value) in params {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    if let Some(text) = query_value(item) {
                        pairs.append_pair(name, &text);
                    }
                }
            }
            other => {
                if let Some(text) = query_value(other) {
                    pairs.append_pair(name, &text);
                }
            }
        }
    }
}

fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn multipart_form(body: &MultipartBody) -> Result<Form, ApiError> {
    let mut form = Form::new();
    for part in body.parts() {
        form = match part {
            MultipartPart::Text { name, value } => form.text(name.clone(), value.clone()),
            MultipartPart::File { name, file_name, content_type, bytes } => {
                let mut file = Part::bytes(bytes.clone()).file_name(file_name.clone());
                if let Some(content_type) = content_type {
                    file = file.mime_str(content_type).map_err(|err| {
                        ApiError::InvalidRequest(format!(
                            "invalid content type '{content_type}' for part '{name}': {err}"
                        ))
                    })?;
                }
                form.part(name.clone(), file)
            }
        };
    }
    Ok(form)
}

/// JSON when the body parses as JSON, the raw text otherwise, `null` when
/// empty.
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn transport(base: &str) -> ReqwestTransport {
        ReqwestTransport::new(HttpClient::new().unwrap(), base).unwrap()
    }

    #[test]
    fn relative_urls_join_onto_base_path() {
        let transport = transport("http://localhost:3000/api");

        assert_eq!(
            transport.resolve("/users/profile").unwrap().as_str(),
            "http://localhost:3000/api/users/profile"
        );
        assert_eq!(
            transport.resolve("investments").unwrap().as_str(),
            "http://localhost:3000/api/investments"
        );
        assert_eq!(
            transport.resolve("https://cdn.example.com/a.png").unwrap().as_str(),
            "https://cdn.example.com/a.png"
        );
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        let result = ReqwestTransport::new(HttpClient::new().unwrap(), "not a url");
        assert!(matches!(result, Err(MeridianError::Config(_))));
    }

    #[test]
    fn query_skips_null_and_repeats_arrays() {
        let mut url = Url::parse("http://localhost/api/investments").unwrap();
        let params = BTreeMap::from([
            ("category".to_string(), json!("energy")),
            ("page".to_string(), json!(2)),
            ("skip".to_string(), Value::Null),
            ("tag".to_string(), json!(["a", "b"])),
        ]);

        append_query(&mut url, &params);

        assert_eq!(url.query(), Some("category=energy&page=2&tag=a&tag=b"));
    }

    #[test]
    fn body_parsing_falls_back_to_text() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body(r#"{"ok":true}"#), json!({"ok": true}));
        assert_eq!(parse_body("Bad Gateway"), json!("Bad Gateway"));
    }

    #[test]
    fn bad_part_content_type_is_rejected_locally() {
        let body = MultipartBody::new().file("file", "a.bin", Some("not a mime".into()), vec![1]);
        let err = multipart_form(&body).unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }
}
