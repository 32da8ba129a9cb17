use clipprx_core::format::{format_count, format_duration};
use clipprx_core::toggle::{OptimisticToggle, ToggleState};
use clipprx_core::types::{OwnerRef, Video};

use crate::shared::Route;

/// いいねボタンのラベル
pub fn like_label(state: ToggleState) -> String {
    let heart = if state.active { "♥" } else { "♡" };
    format!("{} {}", heart, state.count)
}

pub fn subscribe_label(subscribed: bool) -> &'static str {
    if subscribed {
        "Subscribed"
    } else {
        "Subscribe"
    }
}

/// 投稿者名。未展開なら "Unknown"
pub fn owner_name(owner: Option<&OwnerRef>) -> String {
    match owner.and_then(OwnerRef::user) {
        Some(user) if !user.full_name.is_empty() => user.full_name.clone(),
        Some(user) => format!("@{}", user.username),
        None => "Unknown".to_string(),
    }
}

/// 投稿者名。展開済みならチャンネルへのリンクにする
pub fn owner_link(ui: &mut egui::Ui, owner: Option<&OwnerRef>) -> Option<Route> {
    let name = owner_name(owner);
    match owner.and_then(OwnerRef::user) {
        Some(user) if !user.username.is_empty() => ui
            .link(egui::RichText::new(name).strong())
            .clicked()
            .then(|| Route::Channel(user.username.clone())),
        _ => {
            ui.strong(name);
            None
        }
    }
}

/// 動画カード下の "12 views • 3:05 • 2 hours ago"
pub fn video_meta(video: &Video, uploaded: &str) -> String {
    format!(
        "{} • {} • {}",
        format_count(video.views, "view", "views"),
        format_duration(video.duration),
        uploaded
    )
}

/// いいねボタン。押されたら true
///
/// 応答待ちの間は押せない。
pub fn like_button(ui: &mut egui::Ui, toggle: &OptimisticToggle) -> bool {
    ui.add_enabled(
        !toggle.is_pending(),
        egui::Button::new(like_label(toggle.state())).small(),
    )
    .clicked()
}

pub fn subscribe_button(ui: &mut egui::Ui, toggle: &OptimisticToggle) -> bool {
    ui.add_enabled(
        !toggle.is_pending(),
        egui::Button::new(subscribe_label(toggle.is_active())),
    )
    .clicked()
}

/// チャンネルカードの "12 subscribers • 3 videos"
pub fn channel_meta(subscription: ToggleState, video_count: u64) -> String {
    format!(
        "{} • {}",
        format_count(subscription.count, "subscriber", "subscribers"),
        format_count(video_count, "video", "videos")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipprx_core::types::Owner;

    #[test]
    fn test_like_label() {
        assert_eq!(like_label(ToggleState::new(true, 6)), "♥ 6");
        assert_eq!(like_label(ToggleState::new(false, 0)), "♡ 0");
    }

    #[test]
    fn test_owner_name() {
        assert_eq!(owner_name(None), "Unknown");
        assert_eq!(owner_name(Some(&OwnerRef::Id("u1".to_string()))), "Unknown");

        let mut owner = Owner {
            id: "u1".to_string(),
            username: "ana".to_string(),
            full_name: String::new(),
            avatar: None,
        };
        assert_eq!(owner_name(Some(&OwnerRef::User(owner.clone()))), "@ana");

        owner.full_name = "Ana Lima".to_string();
        assert_eq!(owner_name(Some(&OwnerRef::User(owner))), "Ana Lima");
    }

    #[test]
    fn test_video_meta() {
        let video: Video = serde_json::from_value(serde_json::json!({
            "_id": "v1", "views": 1, "duration": 185.0
        }))
        .unwrap();
        assert_eq!(video_meta(&video, "Just now"), "1 view • 3:05 • Just now");
    }

    #[test]
    fn test_channel_meta() {
        assert_eq!(channel_meta(ToggleState::new(true, 1), 0), "1 subscriber • 0 videos");
        assert_eq!(channel_meta(ToggleState::new(false, 12), 3), "12 subscribers • 3 videos");
    }
}
