#[cfg(target_arch = "wasm32")]
pub mod fetch;
pub mod mock;

use std::rc::Rc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use url::Url;

use crate::error::{CoreError, Result};
use crate::types::{ApiResponse, Channel, Comment, Page, SubscribedChannels, Tweet, Video};

/// 動画一覧の1回の取得件数
pub const VIDEO_PAGE_SIZE: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// RESTリクエスト
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// HTTP送信の抽象trait
///
/// WASM環境ではシングルスレッドのため、Send + Sync要件なし
#[async_trait(?Send)]
pub trait Transport {
    /// リクエストを送りレスポンスのJSONを返す。2xx以外はエラー
    async fn send(&self, request: ApiRequest) -> Result<Value>;
}

/// APIの接続設定
#[derive(Debug, Clone)]
pub struct ApiConfig {
    base_url: Url,
    token: Option<String>,
}

impl ApiConfig {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CoreError::ParseError(format!("Invalid base URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(CoreError::ParseError(format!(
                "Base URL cannot have paths: {}",
                base_url
            )));
        }
        Ok(Self {
            base_url,
            token: None,
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// Authorizationヘッダーの値
    pub fn bearer(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {}", t))
    }

    /// リクエストの完全なURL
    pub fn endpoint(&self, request: &ApiRequest) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| CoreError::Other(format!("Unusable base URL: {}", self.base_url)))?;
            segments.pop_if_empty();
            segments.extend(request.path.split('/').filter(|s| !s.is_empty()));
        }
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }
}

/// いいね対象
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LikeTarget {
    Video(String),
    Comment(String),
    Tweet(String),
}

impl LikeTarget {
    pub fn path(&self) -> String {
        match self {
            LikeTarget::Video(id) => format!("/likes/toggle/v/{}", id),
            LikeTarget::Comment(id) => format!("/likes/toggle/c/{}", id),
            LikeTarget::Tweet(id) => format!("/likes/toggle/t/{}", id),
        }
    }
}

/// 動画一覧の検索条件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoQuery {
    pub query: Option<String>,
    pub user_id: Option<String>,
    pub limit: Option<u32>,
}

impl VideoQuery {
    fn request(&self, page: u32) -> ApiRequest {
        let mut request = ApiRequest::new(Method::Get, "/videos")
            .query("page", page)
            .query("limit", self.limit.unwrap_or(VIDEO_PAGE_SIZE));
        if let Some(query) = &self.query {
            request = request.query("query", query);
        }
        if let Some(user_id) = &self.user_id {
            request = request.query("userId", user_id);
        }
        request
    }
}

/// ClipprX REST APIクライアント
#[derive(Clone)]
pub struct Api {
    transport: Rc<dyn Transport>,
}

impl Api {
    pub fn new(transport: Rc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn list_videos(&self, query: &VideoQuery, page: u32) -> Result<Page<Video>> {
        self.fetch(query.request(page)).await
    }

    pub async fn get_video(&self, video_id: &str) -> Result<Video> {
        self.fetch(ApiRequest::new(Method::Get, format!("/videos/{}", video_id)))
            .await
    }

    /// 再生回数を加算
    pub async fn increment_view(&self, video_id: &str) -> Result<()> {
        self.execute(ApiRequest::new(
            Method::Patch,
            format!("/videos/{}/view", video_id),
        ))
        .await
    }

    pub async fn list_comments(&self, video_id: &str) -> Result<Page<Comment>> {
        self.fetch(ApiRequest::new(Method::Get, format!("/comments/{}", video_id)))
            .await
    }

    pub async fn add_comment(&self, video_id: &str, content: &str) -> Result<Comment> {
        self.fetch(
            ApiRequest::new(Method::Post, format!("/comments/{}", video_id))
                .body(json!({ "content": content })),
        )
        .await
    }

    pub async fn delete_comment(&self, comment_id: &str) -> Result<()> {
        self.execute(ApiRequest::new(
            Method::Delete,
            format!("/comments/c/{}", comment_id),
        ))
        .await
    }

    pub async fn list_tweets(&self) -> Result<Page<Tweet>> {
        self.fetch(ApiRequest::new(Method::Get, "/tweets")).await
    }

    pub async fn create_tweet(&self, content: &str) -> Result<Tweet> {
        self.fetch(ApiRequest::new(Method::Post, "/tweets").body(json!({ "content": content })))
            .await
    }

    pub async fn delete_tweet(&self, tweet_id: &str) -> Result<()> {
        self.execute(ApiRequest::new(Method::Delete, format!("/tweets/{}", tweet_id)))
            .await
    }

    pub async fn toggle_like(&self, target: &LikeTarget) -> Result<()> {
        self.execute(ApiRequest::new(Method::Post, target.path()))
            .await
    }

    pub async fn toggle_subscription(&self, channel_id: &str) -> Result<()> {
        self.execute(ApiRequest::new(
            Method::Post,
            format!("/subscriptions/c/{}", channel_id),
        ))
        .await
    }

    /// ユーザー名からチャンネル情報を取得（登録状態と登録者数つき）
    pub async fn get_channel(&self, username: &str) -> Result<Channel> {
        self.fetch(ApiRequest::new(
            Method::Post,
            format!("/users/channel/{}", username),
        ))
        .await
    }

    pub async fn search_channels(&self, query: &str) -> Result<Vec<Channel>> {
        self.fetch(ApiRequest::new(Method::Get, "/users/search").query("query", query))
            .await
    }

    pub async fn list_subscriptions(&self, user_id: &str) -> Result<SubscribedChannels> {
        self.fetch(ApiRequest::new(
            Method::Get,
            format!("/subscriptions/u/{}", user_id),
        ))
        .await
    }

    async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let value = self.transport.send(request).await?;
        let response: ApiResponse<T> = serde_json::from_value(value)?;
        Ok(response.data)
    }

    async fn execute(&self, request: ApiRequest) -> Result<()> {
        self.transport.send(request).await.map(|_| ())
    }
}
