use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use clipprx_core::types::Owner;
use clipprx_core::{CoreError, CoreHandle};

/// 画面遷移先
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Video(String),
    /// ユーザー名で開くチャンネル
    Channel(String),
}

/// 非同期で読み込む値
pub enum Load<T> {
    Loading,
    Ready(T),
    Failed(String),
}

/// 各画面で共有するハンドル
#[derive(Clone)]
pub struct Shared {
    pub core: Rc<CoreHandle>,
    pub ctx: egui::Context,
    pub current_user: Option<Rc<Owner>>,
    status: Rc<RefCell<Option<String>>>,
}

impl Shared {
    pub fn new(core: Rc<CoreHandle>, ctx: egui::Context, current_user: Option<Owner>) -> Self {
        Self {
            core,
            ctx,
            current_user: current_user.map(Rc::new),
            status: Rc::new(RefCell::new(None)),
        }
    }

    /// 非同期処理を起動し、完了後に再描画する
    pub fn spawn(&self, task: impl Future<Output = ()> + 'static) {
        let ctx = self.ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            task.await;
            ctx.request_repaint();
        });
    }

    /// トグル失敗をステータス行に出すフック
    pub fn error_hook(&self, what: &'static str) -> impl FnOnce(&CoreError) + 'static {
        let status = self.status.clone();
        move |e| *status.borrow_mut() = Some(format!("{}: {}", what, e))
    }

    pub fn report(&self, message: impl Into<String>) {
        *self.status.borrow_mut() = Some(message.into());
    }

    pub fn status(&self) -> Option<String> {
        self.status.borrow().clone()
    }

    pub fn clear_status(&self) {
        self.status.borrow_mut().take();
    }

    /// ログイン中のユーザーが投稿者か
    pub fn is_me(&self, owner_id: Option<&str>) -> bool {
        match (&self.current_user, owner_id) {
            (Some(me), Some(id)) => me.id == id,
            _ => false,
        }
    }
}
