use serde::{Deserialize, Deserializer, Serialize};

use crate::toggle::ToggleState;

/// APIレスポンスの共通エンベロープ
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub status_code: Option<u16>,
}

/// 投稿者
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// 投稿者フィールド。未展開のときはIDだけが返ってくる
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OwnerRef {
    User(Owner),
    Id(String),
}

impl OwnerRef {
    pub fn id(&self) -> &str {
        match self {
            OwnerRef::User(owner) => &owner.id,
            OwnerRef::Id(id) => id,
        }
    }

    pub fn user(&self) -> Option<&Owner> {
        match self {
            OwnerRef::User(owner) => Some(owner),
            OwnerRef::Id(_) => None,
        }
    }
}

/// 未展開の投稿者をログイン中のユーザーで補完
pub fn fill_owner(owner: &mut Option<OwnerRef>, current_user: Option<&Owner>) {
    let Some(user) = current_user else {
        return;
    };
    if !matches!(owner, Some(OwnerRef::User(_))) {
        *owner = Some(OwnerRef::User(user.clone()));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub video_file: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub owner: Option<OwnerRef>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub is_subscribed: bool,
}

impl Video {
    pub fn like_state(&self) -> ToggleState {
        ToggleState::new(self.is_liked, self.likes_count)
    }

    pub fn owner_id(&self) -> Option<&str> {
        self.owner.as_ref().map(OwnerRef::id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub owner: Option<OwnerRef>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub is_liked: bool,
}

impl Comment {
    pub fn like_state(&self) -> ToggleState {
        ToggleState::new(self.is_liked, self.likes_count)
    }
}

/// コミュニティ投稿
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub owner: Option<OwnerRef>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub is_liked: bool,
}

impl Tweet {
    pub fn like_state(&self) -> ToggleState {
        ToggleState::new(self.is_liked, self.likes_count)
    }
}

/// チャンネル（検索結果・プロフィール）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default, alias = "subscribersCount")]
    pub subscriber_count: u64,
    #[serde(default)]
    pub is_subscribed: bool,
    #[serde(default)]
    pub video_count: u64,
}

impl Channel {
    pub fn subscription_state(&self) -> ToggleState {
        ToggleState::new(self.is_subscribed, self.subscriber_count)
    }
}

/// 登録中チャンネルの1件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub channel: Option<Channel>,
}

/// ユーザーの登録チャンネル一覧
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribedChannels {
    #[serde(default)]
    pub subscribed_channel: Vec<Subscription>,
    #[serde(default)]
    pub total_subscribed_channel: u64,
}

impl SubscribedChannels {
    /// 一覧から外し、合計を1減らす
    pub fn remove_channel(&mut self, channel_id: &str) {
        let before = self.subscribed_channel.len();
        self.subscribed_channel
            .retain(|s| s.channel.as_ref().map(|c| c.id.as_str()) != Some(channel_id));
        if self.subscribed_channel.len() < before {
            self.total_subscribed_channel = self.total_subscribed_channel.saturating_sub(1);
        }
    }
}

/// 一覧レスポンスの1ページ
///
/// サーバーは素の配列か `{docs, hasNextPage, ...}` のどちらかを返す。
/// 素の配列は続きなしとして扱う。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub docs: Vec<T>,
    pub has_next_page: bool,
    pub page: Option<u32>,
    pub total_docs: Option<u64>,
}

impl<T> Page<T> {
    pub fn new(docs: Vec<T>, has_next_page: bool) -> Self {
        Self {
            docs,
            has_next_page,
            page: None,
            total_docs: None,
        }
    }

    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.docs.retain(keep);
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::new(Vec::new(), false)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PagePayload<T> {
    Items(Vec<T>),
    #[serde(rename_all = "camelCase")]
    Paged {
        #[serde(default = "Vec::new")]
        docs: Vec<T>,
        #[serde(default)]
        has_next_page: bool,
        #[serde(default)]
        page: Option<u32>,
        #[serde(default)]
        total_docs: Option<u64>,
    },
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Page<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match PagePayload::<T>::deserialize(deserializer)? {
            PagePayload::Items(docs) => Page::new(docs, false),
            PagePayload::Paged {
                docs,
                has_next_page,
                page,
                total_docs,
            } => Page {
                docs,
                has_next_page,
                page,
                total_docs,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_from_bare_array() {
        let page: Page<Tweet> = serde_json::from_value(json!([
            {"_id": "t1", "content": "hello", "likesCount": 2, "isLiked": true}
        ]))
        .unwrap();

        assert_eq!(page.docs.len(), 1);
        assert!(!page.has_next_page);
        assert_eq!(page.docs[0].like_state(), ToggleState::new(true, 2));
    }

    #[test]
    fn test_page_from_paginated_object() {
        let page: Page<Video> = serde_json::from_value(json!({
            "docs": [{"_id": "v1", "title": "intro", "duration": 65.2}],
            "hasNextPage": true,
            "page": 1,
            "totalDocs": 40
        }))
        .unwrap();

        assert!(page.has_next_page);
        assert_eq!(page.page, Some(1));
        assert_eq!(page.total_docs, Some(40));
        assert_eq!(page.docs[0].views, 0);
        assert!(page.docs[0].owner.is_none());
    }

    #[test]
    fn test_object_without_docs_is_empty() {
        let page: Page<Comment> = serde_json::from_value(json!({"totalDocs": 0})).unwrap();
        assert!(page.docs.is_empty());
        assert!(!page.has_next_page);
    }

    #[test]
    fn test_owner_as_id_or_object() {
        let comment: Comment = serde_json::from_value(json!({
            "_id": "c1", "content": "nice", "owner": "u1"
        }))
        .unwrap();
        assert_eq!(comment.owner, Some(OwnerRef::Id("u1".to_string())));

        let video: Video = serde_json::from_value(json!({
            "_id": "v1",
            "owner": {"_id": "u2", "username": "ana", "fullName": "Ana"}
        }))
        .unwrap();
        assert_eq!(video.owner_id(), Some("u2"));
        assert_eq!(video.owner.unwrap().user().unwrap().username, "ana");
    }

    #[test]
    fn test_fill_owner() {
        let me = Owner {
            id: "u1".to_string(),
            username: "me".to_string(),
            full_name: "Me".to_string(),
            avatar: None,
        };

        let mut owner = Some(OwnerRef::Id("u1".to_string()));
        fill_owner(&mut owner, Some(&me));
        assert_eq!(owner, Some(OwnerRef::User(me.clone())));

        let mut missing = None;
        fill_owner(&mut missing, None);
        assert_eq!(missing, None);
    }

    #[test]
    fn test_channel_subscriber_count_alias() {
        let channel: Channel = serde_json::from_value(json!({
            "_id": "c1", "username": "ana", "subscribersCount": 12, "isSubscribed": true
        }))
        .unwrap();
        assert_eq!(channel.subscription_state(), ToggleState::new(true, 12));
    }

    #[test]
    fn test_subscribed_channels_remove() {
        let mut list: SubscribedChannels = serde_json::from_value(json!({
            "subscribedChannel": [
                {"_id": "s1", "channel": {"_id": "c1", "username": "ana"}},
                {"_id": "s2", "channel": {"_id": "c2", "username": "bo"}}
            ],
            "totalSubscribedChannel": 2
        }))
        .unwrap();

        list.remove_channel("c1");
        assert_eq!(list.subscribed_channel.len(), 1);
        assert_eq!(list.total_subscribed_channel, 1);

        // 一覧にないチャンネルでは合計は変わらない
        list.remove_channel("c9");
        assert_eq!(list.total_subscribed_channel, 1);
    }
}
