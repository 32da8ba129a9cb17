use async_trait::async_trait;
use serde_json::Value;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use crate::api::{ApiConfig, ApiRequest, Transport};
use crate::error::{CoreError, Result};

/// ブラウザのfetch APIを使うTransport
pub struct FetchTransport {
    config: ApiConfig,
}

impl FetchTransport {
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }

    fn build_request(&self, request: &ApiRequest) -> Result<Request> {
        let url = self.config.endpoint(request)?;

        let init = RequestInit::new();
        init.set_method(request.method.as_str());
        init.set_mode(RequestMode::Cors);
        if let Some(body) = &request.body {
            init.set_body(&JsValue::from_str(&body.to_string()));
        }

        let req = Request::new_with_str_and_init(url.as_str(), &init)?;
        let headers = req.headers();
        headers.set("Accept", "application/json")?;
        if request.body.is_some() {
            headers.set("Content-Type", "application/json")?;
        }
        if let Some(bearer) = self.config.bearer() {
            headers.set("Authorization", &bearer)?;
        }
        Ok(req)
    }
}

#[async_trait(?Send)]
impl Transport for FetchTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value> {
        let req = self.build_request(&request)?;
        let window = web_sys::window().ok_or_else(|| CoreError::JsError("No window".to_string()))?;

        let response: Response = JsFuture::from(window.fetch_with_request(&req))
            .await
            .map_err(|e| CoreError::NetworkError(format!("{:?}", e)))?
            .dyn_into()?;

        let text = JsFuture::from(response.text()?)
            .await?
            .as_string()
            .unwrap_or_default();

        if !response.ok() {
            // エラー時もサーバーは {"message": ...} を返すことがある
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v["message"].as_str().map(str::to_string))
                .unwrap_or_else(|| response.status_text());
            log::warn!(
                "{} {} failed: {} {}",
                request.method.as_str(),
                request.path,
                response.status(),
                message
            );
            return Err(CoreError::HttpError {
                status: response.status(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}
