use std::cell::RefCell;
use std::rc::Rc;

use clipprx_core::api::LikeTarget;
use clipprx_core::toggle::ToggleBoard;
use clipprx_core::types::{fill_owner, Tweet};

use crate::composer::Composer;
use crate::shared::{Route, Shared};
use crate::widgets::{like_button, owner_link};

/// コミュニティ投稿のタイムライン
pub struct CommunityFeed {
    tweets: Rc<RefCell<Vec<Tweet>>>,
    likes: Rc<RefCell<ToggleBoard<String>>>,
    loading: Rc<RefCell<bool>>,
    composer: Composer,
}

impl CommunityFeed {
    pub fn new() -> Self {
        Self {
            tweets: Rc::new(RefCell::new(Vec::new())),
            likes: Rc::new(RefCell::new(ToggleBoard::new())),
            loading: Rc::new(RefCell::new(false)),
            composer: Composer::new("What's happening?", "Post"),
        }
    }

    /// 投稿を読み込み直す
    pub fn reload(&self, shared: &Shared) {
        if *self.loading.borrow() {
            return;
        }
        *self.loading.borrow_mut() = true;

        let core = shared.core.clone();
        let tweets = self.tweets.clone();
        let likes = self.likes.clone();
        let loading = self.loading.clone();

        shared.spawn(async move {
            match core.api().list_tweets().await {
                Ok(page) => {
                    let mut board = likes.borrow_mut();
                    board.retain(|id| page.docs.iter().any(|t| &t.id == id));
                    for t in &page.docs {
                        board.insert(t.id.clone(), t.like_state());
                    }
                    *tweets.borrow_mut() = page.docs;
                }
                Err(e) => log::error!("Failed to fetch tweets: {}", e),
            }
            *loading.borrow_mut() = false;
        });
    }

    /// タイムライン表示。投稿者が押されたらそのチャンネルを返す
    pub fn show(&mut self, ui: &mut egui::Ui, shared: &Shared) -> Option<Route> {
        if let Some(content) = self.composer.show(ui) {
            self.post(shared, content);
        }
        ui.separator();

        if *self.loading.borrow() {
            ui.spinner();
        }

        let mut open = None;
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                let tweets = self.tweets.borrow();
                if tweets.is_empty() && !*self.loading.borrow() {
                    ui.centered_and_justified(|ui| {
                        ui.label("No posts yet. Start a conversation!");
                    });
                    return;
                }

                let mut delete = None;
                for tweet in tweets.iter() {
                    if self.show_tweet(ui, shared, tweet, &mut open) {
                        delete = Some(tweet.id.clone());
                    }
                    ui.separator();
                }
                drop(tweets);

                if let Some(id) = delete {
                    self.delete(shared, id);
                }
            });

        open
    }

    /// 1件表示。削除が押されたら true
    fn show_tweet(
        &self,
        ui: &mut egui::Ui,
        shared: &Shared,
        tweet: &Tweet,
        open: &mut Option<Route>,
    ) -> bool {
        let mut delete = false;

        ui.horizontal(|ui| {
            if let Some(route) = owner_link(ui, tweet.owner.as_ref()) {
                *open = Some(route);
            }
            ui.weak(shared.core.time_ago(tweet.created_at.as_deref()));
        });
        ui.label(&tweet.content);

        ui.horizontal(|ui| {
            if let Some(toggle) = self.likes.borrow().get(&tweet.id) {
                if like_button(ui, toggle) {
                    let core = shared.core.clone();
                    let board = self.likes.clone();
                    let id = tweet.id.clone();
                    let hook = shared.error_hook("Failed to toggle like");
                    shared.spawn(async move {
                        let target = LikeTarget::Tweet(id.clone());
                        core.toggle_like_in(&board, &id, &target, hook).await;
                    });
                }
            }

            let owner_id = tweet.owner.as_ref().map(|o| o.id());
            if shared.is_me(owner_id) && ui.small_button("Delete").clicked() {
                delete = true;
            }
        });

        delete
    }

    fn post(&self, shared: &Shared, content: String) {
        let core = shared.core.clone();
        let tweets = self.tweets.clone();
        let likes = self.likes.clone();
        let sending = self.composer.sending_flag();
        let me = shared.current_user.clone();
        let reporter = shared.clone();

        sending.set(true);
        shared.spawn(async move {
            match core.api().create_tweet(&content).await {
                Ok(mut tweet) => {
                    fill_owner(&mut tweet.owner, me.as_deref());
                    likes.borrow_mut().insert(tweet.id.clone(), tweet.like_state());
                    tweets.borrow_mut().insert(0, tweet);
                }
                Err(e) => {
                    log::error!("Failed to post: {}", e);
                    reporter.report(format!("Failed to post: {}", e));
                }
            }
            sending.set(false);
        });
    }

    fn delete(&self, shared: &Shared, tweet_id: String) {
        let core = shared.core.clone();
        let tweets = self.tweets.clone();
        let likes = self.likes.clone();

        shared.spawn(async move {
            match core.api().delete_tweet(&tweet_id).await {
                Ok(()) => {
                    tweets.borrow_mut().retain(|t| t.id != tweet_id);
                    likes.borrow_mut().remove(&tweet_id);
                }
                Err(e) => log::error!("Failed to delete tweet: {}", e),
            }
        });
    }
}
