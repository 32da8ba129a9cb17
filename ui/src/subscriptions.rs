use std::cell::{Cell, RefCell};
use std::rc::Rc;

use clipprx_core::toggle::{ToggleBoard, ToggleOutcome, ToggleState};
use clipprx_core::types::SubscribedChannels;

use crate::shared::{Route, Shared};

/// 登録中チャンネルの一覧
pub struct SubscriptionsPage {
    list: Rc<RefCell<SubscribedChannels>>,
    unsubscribing: Rc<RefCell<ToggleBoard<String>>>,
    loading: Rc<Cell<bool>>,
}

impl SubscriptionsPage {
    pub fn new() -> Self {
        Self {
            list: Rc::new(RefCell::new(SubscribedChannels::default())),
            unsubscribing: Rc::new(RefCell::new(ToggleBoard::new())),
            loading: Rc::new(Cell::new(false)),
        }
    }

    pub fn reload(&self, shared: &Shared) {
        let Some(me) = shared.current_user.clone() else {
            return;
        };
        if self.loading.replace(true) {
            return;
        }

        let core = shared.core.clone();
        let list = self.list.clone();
        let board = self.unsubscribing.clone();
        let loading = self.loading.clone();

        shared.spawn(async move {
            match core.api().list_subscriptions(&me.id).await {
                Ok(found) => {
                    let mut board = board.borrow_mut();
                    board.clear();
                    for channel in found.subscribed_channel.iter().filter_map(|s| s.channel.as_ref()) {
                        board.insert(channel.id.clone(), ToggleState::new(true, 0));
                    }
                    *list.borrow_mut() = found;
                }
                Err(e) => log::error!("Failed to fetch subscriptions: {}", e),
            }
            loading.set(false);
        });
    }

    /// 一覧を表示。チャンネルが押されたら遷移先を返す
    pub fn show(&self, ui: &mut egui::Ui, shared: &Shared) -> Option<Route> {
        if shared.current_user.is_none() {
            ui.label("Sign in to see your subscriptions.");
            return None;
        }

        let list = self.list.borrow();
        ui.horizontal(|ui| {
            ui.heading("Subscriptions");
            ui.weak(format!("{} channels", list.total_subscribed_channel));
        });
        ui.separator();

        if self.loading.get() {
            ui.spinner();
            return None;
        }
        if list.subscribed_channel.is_empty() {
            ui.label("You haven't subscribed to any channels yet.");
            return None;
        }

        let mut open = None;
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for channel in list.subscribed_channel.iter().filter_map(|s| s.channel.as_ref()) {
                    let pending = self
                        .unsubscribing
                        .borrow()
                        .get(&channel.id)
                        .map_or(true, |t| t.is_pending());

                    ui.horizontal(|ui| {
                        let name = if channel.full_name.is_empty() {
                            "Unknown"
                        } else {
                            &channel.full_name
                        };
                        if ui.link(name).clicked() {
                            open = Some(Route::Channel(channel.username.clone()));
                        }
                        ui.weak(format!("@{}", channel.username));

                        if ui.add_enabled(!pending, egui::Button::new("Unsubscribe")).clicked() {
                            self.unsubscribe(shared, channel.id.clone());
                        }
                    });
                }
            });

        open
    }

    /// 登録解除。成功したら一覧から外す
    fn unsubscribe(&self, shared: &Shared, channel_id: String) {
        let core = shared.core.clone();
        let list = self.list.clone();
        let board = self.unsubscribing.clone();
        let hook = shared.error_hook("Failed to unsubscribe");

        shared.spawn(async move {
            let outcome = core
                .toggle_subscription_in(&board, &channel_id, &channel_id, hook)
                .await;
            if outcome == ToggleOutcome::Confirmed {
                list.borrow_mut().remove_channel(&channel_id);
                board.borrow_mut().remove(&channel_id);
            }
        });
    }
}
