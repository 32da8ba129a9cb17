use std::cell::RefCell;
use std::rc::Rc;

use clipprx_core::api::LikeTarget;
use clipprx_core::pagination::Paginator;
use clipprx_core::toggle::{OptimisticToggle, ToggleBoard, ToggleState};
use clipprx_core::types::{fill_owner, Comment, Owner, Video};

use crate::composer::Composer;
use crate::shared::{Load, Route, Shared};
use crate::widgets::{like_button, owner_link, owner_name, subscribe_button, video_meta};

/// 動画視聴画面
pub struct WatchPage {
    video_id: String,
    video: Rc<RefCell<Load<Video>>>,
    like: Rc<RefCell<OptimisticToggle>>,
    subscription: Rc<RefCell<OptimisticToggle>>,
    comments: Rc<RefCell<Vec<Comment>>>,
    comment_likes: Rc<RefCell<ToggleBoard<String>>>,
    suggestions: Rc<RefCell<Paginator<Video>>>,
    composer: Composer,
}

impl WatchPage {
    /// 動画を開いて詳細・コメント・関連動画を読み込む
    pub fn open(shared: &Shared, video_id: String) -> Self {
        let page = Self {
            video_id,
            video: Rc::new(RefCell::new(Load::Loading)),
            like: Rc::new(RefCell::new(OptimisticToggle::default())),
            subscription: Rc::new(RefCell::new(OptimisticToggle::default())),
            comments: Rc::new(RefCell::new(Vec::new())),
            comment_likes: Rc::new(RefCell::new(ToggleBoard::new())),
            suggestions: Rc::new(RefCell::new(Paginator::new())),
            composer: Composer::new("Add a comment...", "Comment"),
        };
        page.load(shared);
        page
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    fn load(&self, shared: &Shared) {
        log::info!("Opening video: {}", self.video_id);

        let core = shared.core.clone();
        let id = self.video_id.clone();
        let video = self.video.clone();
        let like = self.like.clone();
        let subscription = self.subscription.clone();
        let comments = self.comments.clone();
        let comment_likes = self.comment_likes.clone();
        let suggestions = self.suggestions.clone();

        let viewer = core.clone();
        let viewed_id = id.clone();
        shared.spawn(async move {
            let _ = viewer.record_view(&viewed_id).await;
        });

        shared.spawn(async move {
            match core.api().get_video(&id).await {
                Ok(v) => {
                    like.borrow_mut().reset(v.like_state());
                    subscription
                        .borrow_mut()
                        .reset(ToggleState::new(v.is_subscribed, 0));
                    *video.borrow_mut() = Load::Ready(v);
                }
                Err(e) => {
                    log::error!("Error fetching video: {}", e);
                    *video.borrow_mut() = Load::Failed(
                        "Failed to load video. It may not exist or is private.".to_string(),
                    );
                    return;
                }
            }

            match core.api().list_comments(&id).await {
                Ok(page) => {
                    let mut board = comment_likes.borrow_mut();
                    board.clear();
                    for c in &page.docs {
                        board.insert(c.id.clone(), c.like_state());
                    }
                    *comments.borrow_mut() = page.docs;
                }
                Err(e) => {
                    log::error!("Failed to fetch comments: {}", e);
                    comments.borrow_mut().clear();
                }
            }

            let _ = core.load_suggestions(&suggestions, &id, true).await;
        });
    }

    /// 画面を表示。関連動画や投稿者が押されたら遷移先を返す
    pub fn show(&mut self, ui: &mut egui::Ui, shared: &Shared) -> Option<Route> {
        let mut open = None;

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                let ready = match &*self.video.borrow() {
                    Load::Loading => {
                        ui.spinner();
                        false
                    }
                    Load::Failed(message) => {
                        ui.colored_label(egui::Color32::LIGHT_RED, message);
                        false
                    }
                    Load::Ready(video) => {
                        open = self.show_header(ui, shared, video);
                        true
                    }
                };
                if !ready {
                    return;
                }

                ui.separator();
                open = self.show_comments(ui, shared).or(open.take());
                ui.separator();
                open = self.show_suggestions(ui, shared).or(open.take());
            });

        open
    }

    fn show_header(&self, ui: &mut egui::Ui, shared: &Shared, video: &Video) -> Option<Route> {
        ui.heading(&video.title);
        ui.label(video_meta(video, &shared.core.time_ago(video.created_at.as_deref())));

        let mut open = None;
        ui.horizontal(|ui| {
            open = owner_link(ui, video.owner.as_ref());

            if let Some(owner_id) = channel_to_subscribe(video, shared.current_user.as_deref()) {
                if subscribe_button(ui, &self.subscription.borrow()) {
                    let core = shared.core.clone();
                    let cell = self.subscription.clone();
                    let channel_id = owner_id.to_string();
                    let hook = shared.error_hook("Failed to subscribe");
                    shared.spawn(async move {
                        core.toggle_subscription(&cell, &channel_id, hook).await;
                    });
                }
            }

            if like_button(ui, &self.like.borrow()) {
                let core = shared.core.clone();
                let cell = self.like.clone();
                let target = LikeTarget::Video(video.id.clone());
                let hook = shared.error_hook("Failed to toggle like");
                shared.spawn(async move {
                    core.toggle_like(&cell, &target, hook).await;
                });
            }
        });

        if !video.description.is_empty() {
            ui.label(&video.description);
        }
        open
    }

    fn show_comments(&mut self, ui: &mut egui::Ui, shared: &Shared) -> Option<Route> {
        ui.strong(format!("{} Comments", self.comments.borrow().len()));

        if let Some(content) = self.composer.show(ui) {
            self.add_comment(shared, content);
        }

        let mut open = None;
        let mut delete = None;
        for comment in self.comments.borrow().iter() {
            ui.horizontal(|ui| {
                if let Some(route) = owner_link(ui, comment.owner.as_ref()) {
                    open = Some(route);
                }
                ui.weak(shared.core.time_ago(comment.created_at.as_deref()));
            });
            ui.label(&comment.content);

            ui.horizontal(|ui| {
                if let Some(toggle) = self.comment_likes.borrow().get(&comment.id) {
                    if like_button(ui, toggle) {
                        self.toggle_comment_like(shared, comment.id.clone());
                    }
                }
                let owner_id = comment.owner.as_ref().map(|o| o.id());
                if shared.is_me(owner_id) && ui.small_button("Delete").clicked() {
                    delete = Some(comment.id.clone());
                }
            });
        }

        if let Some(comment_id) = delete {
            self.delete_comment(shared, comment_id);
        }
        open
    }

    fn toggle_comment_like(&self, shared: &Shared, comment_id: String) {
        let core = shared.core.clone();
        let board = self.comment_likes.clone();
        let hook = shared.error_hook("Failed to toggle comment like");
        shared.spawn(async move {
            let target = LikeTarget::Comment(comment_id.clone());
            core.toggle_like_in(&board, &comment_id, &target, hook).await;
        });
    }

    fn add_comment(&self, shared: &Shared, content: String) {
        let core = shared.core.clone();
        let video_id = self.video_id.clone();
        let comments = self.comments.clone();
        let comment_likes = self.comment_likes.clone();
        let sending = self.composer.sending_flag();
        let me = shared.current_user.clone();
        let reporter = shared.clone();

        sending.set(true);
        shared.spawn(async move {
            match core.api().add_comment(&video_id, &content).await {
                Ok(mut comment) => {
                    fill_owner(&mut comment.owner, me.as_deref());
                    comment_likes
                        .borrow_mut()
                        .insert(comment.id.clone(), comment.like_state());
                    comments.borrow_mut().insert(0, comment);
                }
                Err(e) => {
                    log::error!("Failed to add comment: {}", e);
                    reporter.report(format!("Failed to add comment: {}", e));
                }
            }
            sending.set(false);
        });
    }

    fn delete_comment(&self, shared: &Shared, comment_id: String) {
        let core = shared.core.clone();
        let comments = self.comments.clone();
        let comment_likes = self.comment_likes.clone();

        shared.spawn(async move {
            match core.api().delete_comment(&comment_id).await {
                Ok(()) => {
                    comments.borrow_mut().retain(|c| c.id != comment_id);
                    comment_likes.borrow_mut().remove(&comment_id);
                }
                Err(e) => log::error!("Failed to delete comment: {}", e),
            }
        });
    }

    fn show_suggestions(&self, ui: &mut egui::Ui, shared: &Shared) -> Option<Route> {
        let mut open = None;
        ui.strong("Up next");

        let list = self.suggestions.borrow();
        for video in list.items() {
            if ui.link(&video.title).clicked() {
                open = Some(Route::Video(video.id.clone()));
            }
            ui.weak(format!(
                "{} • {}",
                owner_name(video.owner.as_ref()),
                video_meta(video, &shared.core.time_ago(video.created_at.as_deref()))
            ));
        }

        if list.is_loading() {
            ui.spinner();
        } else if list.has_more() && ui.button("Show more").clicked() {
            let core = shared.core.clone();
            let suggestions = self.suggestions.clone();
            let id = self.video_id.clone();
            shared.spawn(async move {
                let _ = core.load_suggestions(&suggestions, &id, false).await;
            });
        }

        open
    }
}

/// 登録ボタンの対象チャンネル。自分の動画なら None
fn channel_to_subscribe<'a>(video: &'a Video, current_user: Option<&Owner>) -> Option<&'a str> {
    video
        .owner_id()
        .filter(|id| current_user.map_or(true, |me| me.id != *id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_by(owner: &str) -> Video {
        serde_json::from_value(serde_json::json!({"_id": "v1", "owner": owner})).unwrap()
    }

    #[test]
    fn test_no_subscribe_button_on_own_video() {
        let me = Owner {
            id: "u1".to_string(),
            username: "me".to_string(),
            full_name: String::new(),
            avatar: None,
        };

        assert_eq!(channel_to_subscribe(&video_by("u1"), Some(&me)), None);
        assert_eq!(channel_to_subscribe(&video_by("u2"), Some(&me)), Some("u2"));
        assert_eq!(channel_to_subscribe(&video_by("u1"), None), Some("u1"));
    }
}
