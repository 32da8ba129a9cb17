use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("JavaScript error: {0}")]
    JsError(String),

    #[error("HTTP {status}: {message}")]
    HttpError { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("{0}")]
    Other(String),
}

impl CoreError {
    /// サーバーが返したエラーか（通信断ではない）
    pub fn is_http(&self) -> bool {
        matches!(self, CoreError::HttpError { .. })
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for CoreError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        if let Some(s) = value.as_string() {
            CoreError::JsError(s)
        } else {
            CoreError::JsError(format!("{:?}", value))
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl From<CoreError> for wasm_bindgen::JsValue {
    fn from(error: CoreError) -> Self {
        wasm_bindgen::JsValue::from_str(&error.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(error: serde_json::Error) -> Self {
        CoreError::ParseError(error.to_string())
    }
}

/// トグル開始時のエラー
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleError {
    #[error("a toggle is already in flight")]
    InFlight,

    #[error("no toggle registered for this resource")]
    UnknownResource,
}

pub type Result<T> = std::result::Result<T, CoreError>;
