use std::cell::RefCell;
use std::rc::Rc;

use clipprx_core::api::VideoQuery;
use clipprx_core::pagination::Paginator;
use clipprx_core::toggle::OptimisticToggle;
use clipprx_core::types::{Channel, Video};

use crate::shared::{Load, Route, Shared};
use crate::widgets::{channel_meta, subscribe_button, video_meta};

/// チャンネル（プロフィール）画面
pub struct ChannelPage {
    username: String,
    channel: Rc<RefCell<Load<Channel>>>,
    subscription: Rc<RefCell<OptimisticToggle>>,
    videos: Rc<RefCell<Paginator<Video>>>,
    query: Rc<RefCell<VideoQuery>>,
}

impl ChannelPage {
    pub fn open(shared: &Shared, username: String) -> Self {
        let page = Self {
            username,
            channel: Rc::new(RefCell::new(Load::Loading)),
            subscription: Rc::new(RefCell::new(OptimisticToggle::default())),
            videos: Rc::new(RefCell::new(Paginator::new())),
            query: Rc::new(RefCell::new(VideoQuery::default())),
        };
        page.load(shared);
        page
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    fn load(&self, shared: &Shared) {
        log::info!("Opening channel: {}", self.username);

        let core = shared.core.clone();
        let username = self.username.clone();
        let channel = self.channel.clone();
        let subscription = self.subscription.clone();
        let videos = self.videos.clone();
        let query = self.query.clone();

        shared.spawn(async move {
            let found = match core.api().get_channel(&username).await {
                Ok(found) => found,
                Err(e) => {
                    log::error!("Failed to fetch channel {}: {}", username, e);
                    *channel.borrow_mut() =
                        Load::Failed("Failed to load profile. User might not exist.".to_string());
                    return;
                }
            };

            subscription.borrow_mut().reset(found.subscription_state());
            let videos_query = VideoQuery {
                user_id: Some(found.id.clone()),
                ..Default::default()
            };
            *query.borrow_mut() = videos_query.clone();
            *channel.borrow_mut() = Load::Ready(found);

            let _ = core.load_videos(&videos, &videos_query, true).await;
        });
    }

    /// 画面を表示。動画が押されたら遷移先を返す
    pub fn show(&self, ui: &mut egui::Ui, shared: &Shared) -> Option<Route> {
        let mut open = None;

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                let ready = match &*self.channel.borrow() {
                    Load::Loading => {
                        ui.spinner();
                        false
                    }
                    Load::Failed(message) => {
                        ui.colored_label(egui::Color32::LIGHT_RED, message);
                        false
                    }
                    Load::Ready(channel) => {
                        self.show_header(ui, shared, channel);
                        true
                    }
                };
                if !ready {
                    return;
                }

                ui.separator();
                open = self.show_videos(ui, shared);
            });

        open
    }

    fn show_header(&self, ui: &mut egui::Ui, shared: &Shared, channel: &Channel) {
        ui.heading(&channel.full_name);
        ui.horizontal(|ui| {
            ui.weak(format!("@{}", channel.username));
            let toggle = self.subscription.borrow().clone();
            ui.weak(channel_meta(toggle.state(), channel.video_count));

            if !shared.is_me(Some(channel.id.as_str())) && subscribe_button(ui, &toggle) {
                let core = shared.core.clone();
                let cell = self.subscription.clone();
                let channel_id = channel.id.clone();
                let hook = shared.error_hook("Failed to subscribe");
                shared.spawn(async move {
                    core.toggle_subscription(&cell, &channel_id, hook).await;
                });
            }
        });
    }

    fn show_videos(&self, ui: &mut egui::Ui, shared: &Shared) -> Option<Route> {
        let mut open = None;
        let list = self.videos.borrow();

        if list.items().is_empty() && !list.is_loading() {
            ui.label("This channel has no videos yet.");
            return None;
        }

        for video in list.items() {
            if ui.link(&video.title).clicked() {
                open = Some(Route::Video(video.id.clone()));
            }
            ui.weak(video_meta(
                video,
                &shared.core.time_ago(video.created_at.as_deref()),
            ));
            ui.add_space(8.0);
        }

        if list.is_loading() {
            ui.spinner();
        } else if list.has_more() && ui.button("Load more").clicked() {
            let core = shared.core.clone();
            let videos = self.videos.clone();
            let query = self.query.borrow().clone();
            shared.spawn(async move {
                let _ = core.load_videos(&videos, &query, false).await;
            });
        }

        open
    }
}
