use std::cell::RefCell;
use std::rc::Rc;

use clipprx_core::api::VideoQuery;
use clipprx_core::pagination::Paginator;
use clipprx_core::toggle::ToggleBoard;
use clipprx_core::types::{Channel, Video};

use crate::shared::{Route, Shared};
use crate::widgets::{channel_meta, owner_link, subscribe_button, video_meta};

/// 動画一覧（検索つき）
pub struct HomePage {
    videos: Rc<RefCell<Paginator<Video>>>,
    channels: Rc<RefCell<Vec<Channel>>>,
    subscriptions: Rc<RefCell<ToggleBoard<String>>>,
    search: String,
    query: VideoQuery,
}

impl HomePage {
    pub fn new() -> Self {
        Self {
            videos: Rc::new(RefCell::new(Paginator::new())),
            channels: Rc::new(RefCell::new(Vec::new())),
            subscriptions: Rc::new(RefCell::new(ToggleBoard::new())),
            search: String::new(),
            query: VideoQuery::default(),
        }
    }

    /// 1ページ目から読み込み直す。検索中ならチャンネルも探す
    pub fn reload(&self, shared: &Shared) {
        self.load(shared, true);

        let channels = self.channels.clone();
        let subscriptions = self.subscriptions.clone();
        let Some(query) = self.query.query.clone() else {
            channels.borrow_mut().clear();
            subscriptions.borrow_mut().clear();
            return;
        };

        let core = shared.core.clone();
        shared.spawn(async move {
            match core.api().search_channels(&query).await {
                Ok(found) => {
                    let mut board = subscriptions.borrow_mut();
                    board.retain(|id| found.iter().any(|c| &c.id == id));
                    for c in &found {
                        board.insert(c.id.clone(), c.subscription_state());
                    }
                    *channels.borrow_mut() = found;
                }
                Err(e) => log::error!("Failed to search channels: {}", e),
            }
        });
    }

    fn load(&self, shared: &Shared, reload: bool) {
        let core = shared.core.clone();
        let videos = self.videos.clone();
        let query = self.query.clone();
        shared.spawn(async move {
            let _ = core.load_videos(&videos, &query, reload).await;
        });
    }

    /// 一覧を表示。動画かチャンネルが押されたら遷移先を返す
    pub fn show(&mut self, ui: &mut egui::Ui, shared: &Shared) -> Option<Route> {
        let mut open = None;

        let search = ui
            .horizontal(|ui| {
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.search).hint_text("Search videos"),
                );
                let submitted =
                    response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                ui.button("Search").clicked() || submitted
            })
            .inner;
        if search {
            self.query = search_query(&self.search);
            self.reload(shared);
        }
        ui.separator();

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                if let Some(route) = self.show_channels(ui, shared) {
                    open = Some(route);
                }

                let list = self.videos.borrow();
                if list.items().is_empty() && !list.is_loading() {
                    ui.centered_and_justified(|ui| {
                        ui.label("No videos found.");
                    });
                    return;
                }

                for video in list.items() {
                    if ui.link(&video.title).clicked() {
                        open = Some(Route::Video(video.id.clone()));
                    }
                    ui.horizontal(|ui| {
                        if let Some(route) = owner_link(ui, video.owner.as_ref()) {
                            open = Some(route);
                        }
                        ui.weak(video_meta(
                            video,
                            &shared.core.time_ago(video.created_at.as_deref()),
                        ));
                    });
                    ui.add_space(8.0);
                }

                if list.is_loading() {
                    ui.spinner();
                } else if list.has_more() && ui.button("Load more").clicked() {
                    self.load(shared, false);
                }
            });

        open
    }

    /// 検索に一致したチャンネル
    fn show_channels(&self, ui: &mut egui::Ui, shared: &Shared) -> Option<Route> {
        let channels = self.channels.borrow();
        if channels.is_empty() {
            return None;
        }

        let mut open = None;
        ui.strong("Channels");
        for channel in channels.iter() {
            let Some(toggle) = self.subscriptions.borrow().get(&channel.id).cloned() else {
                continue;
            };

            ui.horizontal(|ui| {
                if ui.link(&channel.full_name).clicked() {
                    open = Some(Route::Channel(channel.username.clone()));
                }
                ui.weak(format!("@{}", channel.username));
                ui.weak(channel_meta(toggle.state(), channel.video_count));

                if !shared.is_me(Some(channel.id.as_str())) && subscribe_button(ui, &toggle) {
                    let core = shared.core.clone();
                    let board = self.subscriptions.clone();
                    let id = channel.id.clone();
                    let hook = shared.error_hook("Failed to subscribe");
                    shared.spawn(async move {
                        core.toggle_subscription_in(&board, &id, &id, hook).await;
                    });
                }
            });
        }
        ui.separator();

        open
    }
}

/// 検索欄の入力から検索条件を作る
fn search_query(input: &str) -> VideoQuery {
    let trimmed = input.trim();
    VideoQuery {
        query: (!trimmed.is_empty()).then(|| trimmed.to_string()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query() {
        assert_eq!(search_query("  "), VideoQuery::default());
        assert_eq!(search_query(" cats ").query.as_deref(), Some("cats"));
    }
}
