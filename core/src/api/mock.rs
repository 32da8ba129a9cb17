use async_trait::async_trait;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use crate::api::{ApiRequest, Method, Transport};
use crate::error::{CoreError, Result};

type Reply = std::result::Result<Value, (u16, String)>;

/// テスト用のモックTransport
///
/// `(method, path)` ごとに応答を積んでおき、呼ばれた順に返す。
/// 応答が積まれていなければ `{"data": null}` で成功する。
#[derive(Default)]
pub struct MockTransport {
    replies: RefCell<HashMap<(Method, String), VecDeque<Reply>>>,
    calls: RefCell<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// `data` を包んだ成功レスポンスを積む
    pub fn reply(&self, method: Method, path: &str, data: Value) {
        self.push(method, path, Ok(json!({ "data": data, "success": true })));
    }

    /// HTTPエラーを積む
    pub fn fail(&self, method: Method, path: &str, status: u16, message: &str) {
        self.push(method, path, Err((status, message.to_string())));
    }

    /// これまでに送られたリクエスト
    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self, method: Method, path: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    fn push(&self, method: Method, path: &str, reply: Reply) {
        self.replies
            .borrow_mut()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }
}

#[async_trait(?Send)]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value> {
        let key = (request.method, request.path.clone());
        self.calls.borrow_mut().push(request);

        let reply = self
            .replies
            .borrow_mut()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);

        match reply {
            Some(Ok(value)) => Ok(value),
            Some(Err((status, message))) => Err(CoreError::HttpError { status, message }),
            None => Ok(json!({ "data": null })),
        }
    }
}
