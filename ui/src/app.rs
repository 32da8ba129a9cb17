use std::rc::Rc;

use clipprx_core::types::Owner;
use clipprx_core::CoreHandle;

use crate::channel::ChannelPage;
use crate::feed::CommunityFeed;
use crate::home::HomePage;
use crate::shared::{Route, Shared};
use crate::subscriptions::SubscriptionsPage;
use crate::watch::WatchPage;

/// 上部のタブ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Home,
    Watch,
    Channel,
    Subscriptions,
    Community,
}

/// メインアプリケーション
pub struct ClipprApp {
    shared: Shared,
    tab: Tab,
    home: HomePage,
    watch: Option<WatchPage>,
    channel: Option<ChannelPage>,
    subscriptions: SubscriptionsPage,
    community: CommunityFeed,
    community_loaded: bool,
}

impl ClipprApp {
    pub fn new(ctx: egui::Context, core: CoreHandle, current_user: Option<Owner>) -> Self {
        let shared = Shared::new(Rc::new(core), ctx, current_user);
        let home = HomePage::new();
        home.reload(&shared);

        Self {
            shared,
            tab: Tab::Home,
            home,
            watch: None,
            channel: None,
            subscriptions: SubscriptionsPage::new(),
            community: CommunityFeed::new(),
            community_loaded: false,
        }
    }

    /// 動画を開く（同じ動画なら読み込み直さない）
    fn open_video(&mut self, video_id: String) {
        let already_open = self
            .watch
            .as_ref()
            .is_some_and(|w| w.video_id() == video_id);
        if !already_open {
            self.watch = Some(WatchPage::open(&self.shared, video_id));
        }
        self.tab = Tab::Watch;
    }

    /// チャンネルを開く（同じチャンネルなら読み込み直さない）
    fn open_channel(&mut self, username: String) {
        let already_open = self
            .channel
            .as_ref()
            .is_some_and(|c| c.username() == username);
        if !already_open {
            self.channel = Some(ChannelPage::open(&self.shared, username));
        }
        self.tab = Tab::Channel;
    }

    fn navigate(&mut self, route: Route) {
        match route {
            Route::Video(video_id) => self.open_video(video_id),
            Route::Channel(username) => self.open_channel(username),
        }
    }

    /// 1フレーム分の描画
    pub fn update_ui(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("nav").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("ClipprX");
                ui.separator();
                ui.selectable_value(&mut self.tab, Tab::Home, "Home");
                if self.watch.is_some() {
                    ui.selectable_value(&mut self.tab, Tab::Watch, "Watch");
                }
                if self.channel.is_some() {
                    ui.selectable_value(&mut self.tab, Tab::Channel, "Channel");
                }
                if self.shared.current_user.is_some()
                    && ui
                        .selectable_label(self.tab == Tab::Subscriptions, "Subscriptions")
                        .clicked()
                {
                    self.tab = Tab::Subscriptions;
                    self.subscriptions.reload(&self.shared);
                }
                ui.selectable_value(&mut self.tab, Tab::Community, "Community");

                if let Some(user) = &self.shared.current_user {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(format!("@{}", user.username));
                    });
                }
            });
        });

        if let Some(status) = self.shared.status() {
            egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(egui::Color32::LIGHT_RED, status);
                    if ui.small_button("✕").clicked() {
                        self.shared.clear_status();
                    }
                });
            });
        }

        if self.tab == Tab::Community && !self.community_loaded {
            self.community.reload(&self.shared);
            self.community_loaded = true;
        }

        let mut open = None;
        egui::CentralPanel::default().show(ctx, |ui| match self.tab {
            Tab::Home => open = self.home.show(ui, &self.shared),
            Tab::Watch => match self.watch.as_mut() {
                Some(watch) => open = watch.show(ui, &self.shared),
                None => {
                    ui.label("Pick a video to watch.");
                }
            },
            Tab::Channel => match self.channel.as_ref() {
                Some(channel) => open = channel.show(ui, &self.shared),
                None => {
                    ui.label("Pick a channel.");
                }
            },
            Tab::Subscriptions => open = self.subscriptions.show(ui, &self.shared),
            Tab::Community => open = self.community.show(ui, &self.shared),
        });

        if let Some(route) = open {
            self.navigate(route);
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl eframe::App for ClipprApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_ui(ctx);
    }
}

/// ホストから渡されたユーザーJSONを読む
pub fn parse_user(json: Option<&str>) -> Option<Owner> {
    let json = json?;
    match serde_json::from_str(json) {
        Ok(user) => Some(user),
        Err(e) => {
            log::error!("Failed to parse user: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user() {
        let user = parse_user(Some(r#"{"_id":"u1","username":"ana","fullName":"Ana"}"#)).unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.full_name, "Ana");

        assert!(parse_user(None).is_none());
        assert!(parse_user(Some("{not json")).is_none());
    }
}
