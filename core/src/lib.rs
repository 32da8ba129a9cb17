pub mod api;
pub mod clock;
pub mod error;
pub mod format;
pub mod pagination;
pub mod time_ago;
pub mod toggle;
pub mod types;

use std::cell::RefCell;
use std::hash::Hash;
use std::rc::Rc;

pub use error::{CoreError, Result, ToggleError};

use crate::api::{Api, LikeTarget, Transport, VideoQuery};
use crate::clock::{Clock, SystemClock};
use crate::pagination::Paginator;
use crate::toggle::{run_board_toggle, run_toggle, OptimisticToggle, ToggleBoard, ToggleOutcome};
use crate::types::Video;

/// 関連動画の1回の取得件数
pub const SUGGESTION_PAGE_SIZE: u32 = 5;

/// CoreHandle: UIから使用されるメインAPI
pub struct CoreHandle {
    api: Api,
    clock: Rc<dyn Clock>,
    last_viewed: RefCell<Option<String>>,
}

impl CoreHandle {
    pub fn new(transport: Rc<dyn Transport>) -> Self {
        Self::with_clock(transport, Rc::new(SystemClock))
    }

    pub fn with_clock(transport: Rc<dyn Transport>, clock: Rc<dyn Clock>) -> Self {
        Self {
            api: Api::new(transport),
            clock,
            last_viewed: RefCell::new(None),
        }
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    /// 相対時刻ラベル
    pub fn time_ago(&self, timestamp: Option<&str>) -> String {
        time_ago::format_time_ago(timestamp, self.clock.as_ref())
    }

    /// いいねを楽観的にトグル
    pub async fn toggle_like(
        &self,
        cell: &RefCell<OptimisticToggle>,
        target: &LikeTarget,
        on_error: impl FnOnce(&CoreError),
    ) -> ToggleOutcome {
        run_toggle(cell, || self.api.toggle_like(target), on_error).await
    }

    /// 一覧中の1件のいいねをトグル
    pub async fn toggle_like_in<K: Eq + Hash>(
        &self,
        board: &RefCell<ToggleBoard<K>>,
        key: &K,
        target: &LikeTarget,
        on_error: impl FnOnce(&CoreError),
    ) -> ToggleOutcome {
        run_board_toggle(board, key, || self.api.toggle_like(target), on_error).await
    }

    /// チャンネル登録を楽観的にトグル
    pub async fn toggle_subscription(
        &self,
        cell: &RefCell<OptimisticToggle>,
        channel_id: &str,
        on_error: impl FnOnce(&CoreError),
    ) -> ToggleOutcome {
        run_toggle(cell, || self.api.toggle_subscription(channel_id), on_error).await
    }

    /// 一覧中の1チャンネルの登録をトグル
    pub async fn toggle_subscription_in<K: Eq + Hash>(
        &self,
        board: &RefCell<ToggleBoard<K>>,
        key: &K,
        channel_id: &str,
        on_error: impl FnOnce(&CoreError),
    ) -> ToggleOutcome {
        run_board_toggle(
            board,
            key,
            || self.api.toggle_subscription(channel_id),
            on_error,
        )
        .await
    }

    /// 動画一覧を読み込む
    ///
    /// `reload` なら1ページ目から、そうでなければ次のページ。
    /// 読み込み中か続きがない場合は何もせず `Ok(false)`。
    pub async fn load_videos(
        &self,
        list: &RefCell<Paginator<Video>>,
        query: &VideoQuery,
        reload: bool,
    ) -> Result<bool> {
        self.load_videos_excluding(list, query, reload, None).await
    }

    /// 視聴中の動画を除いた関連動画を読み込む
    pub async fn load_suggestions(
        &self,
        list: &RefCell<Paginator<Video>>,
        current_video_id: &str,
        reload: bool,
    ) -> Result<bool> {
        let query = VideoQuery {
            limit: Some(SUGGESTION_PAGE_SIZE),
            ..Default::default()
        };
        self.load_videos_excluding(list, &query, reload, Some(current_video_id))
            .await
    }

    async fn load_videos_excluding(
        &self,
        list: &RefCell<Paginator<Video>>,
        query: &VideoQuery,
        reload: bool,
        exclude: Option<&str>,
    ) -> Result<bool> {
        let request = {
            let mut list = list.borrow_mut();
            if reload {
                Some(list.start_reload())
            } else {
                list.next_page()
            }
        };
        let Some(request) = request else {
            return Ok(false);
        };

        match self.api.list_videos(query, request.page).await {
            Ok(mut page) => {
                if let Some(id) = exclude {
                    page.retain(|v| v.id != id);
                }
                Ok(list.borrow_mut().apply(request, page))
            }
            Err(e) => {
                log::error!("Failed to fetch videos (page {}): {}", request.page, e);
                list.borrow_mut().fail(request);
                Err(e)
            }
        }
    }

    /// 再生回数を加算。同じ動画が続けて開かれた場合は送らない
    pub async fn record_view(&self, video_id: &str) -> Result<bool> {
        if self.last_viewed.borrow().as_deref() == Some(video_id) {
            return Ok(false);
        }
        *self.last_viewed.borrow_mut() = Some(video_id.to_string());

        if let Err(e) = self.api.increment_view(video_id).await {
            log::error!("Failed to increment view for {}: {}", video_id, e);
            return Err(e);
        }
        Ok(true)
    }
}
