use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;

use crate::error::{CoreError, Result, ToggleError};

/// 表示中のトグル状態（いいね・登録とその件数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToggleState {
    pub active: bool,
    pub count: u64,
}

impl ToggleState {
    pub fn new(active: bool, count: u64) -> Self {
        Self { active, count }
    }

    /// 反転後の状態。件数は反転前の `active` から増減する
    pub fn flipped(self) -> Self {
        Self {
            active: !self.active,
            count: if self.active {
                self.count.saturating_sub(1)
            } else {
                self.count + 1
            },
        }
    }
}

/// トグルのフェーズ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TogglePhase {
    Idle,
    /// 楽観的な値を表示中、サーバー応答待ち
    Pending,
    Confirmed,
    RolledBack,
}

/// 1回のトグル操作の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Confirmed,
    RolledBack,
    /// 処理中の操作がある、またはリセット済みで無視された
    Ignored,
}

/// `begin` が返す保留中の操作
#[derive(Debug)]
#[must_use = "a pending toggle must be settled"]
pub struct ToggleTicket {
    previous: ToggleState,
    generation: u64,
}

/// 楽観的更新つきトグル
///
/// `begin` で即座に表示を反転し、リクエスト完了後に `settle` で確定または巻き戻す。
/// 処理中に次の `begin` が来た場合は `ToggleError::InFlight` で拒否する。
#[derive(Debug, Clone)]
pub struct OptimisticToggle {
    state: ToggleState,
    phase: TogglePhase,
    generation: u64,
}

impl OptimisticToggle {
    pub fn new(active: bool, count: u64) -> Self {
        Self::from_state(ToggleState::new(active, count))
    }

    pub fn from_state(state: ToggleState) -> Self {
        Self {
            state,
            phase: TogglePhase::Idle,
            generation: 0,
        }
    }

    pub fn state(&self) -> ToggleState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn count(&self) -> u64 {
        self.state.count
    }

    pub fn phase(&self) -> TogglePhase {
        self.phase
    }

    pub fn is_pending(&self) -> bool {
        self.phase == TogglePhase::Pending
    }

    /// 表示を反転してリクエスト待ちに入る
    pub fn begin(&mut self) -> std::result::Result<ToggleTicket, ToggleError> {
        if self.is_pending() {
            return Err(ToggleError::InFlight);
        }

        let previous = self.state;
        self.state = previous.flipped();
        self.phase = TogglePhase::Pending;

        Ok(ToggleTicket {
            previous,
            generation: self.generation,
        })
    }

    /// 楽観的な値を確定
    pub fn confirm(&mut self, ticket: ToggleTicket) -> ToggleOutcome {
        if !self.accepts(&ticket) {
            return ToggleOutcome::Ignored;
        }
        self.phase = TogglePhase::Confirmed;
        ToggleOutcome::Confirmed
    }

    /// 反転前の状態に戻す
    pub fn roll_back(&mut self, ticket: ToggleTicket) -> ToggleOutcome {
        if !self.accepts(&ticket) {
            return ToggleOutcome::Ignored;
        }
        self.state = ticket.previous;
        self.phase = TogglePhase::RolledBack;
        ToggleOutcome::RolledBack
    }

    /// リクエスト結果に応じて確定または巻き戻し
    pub fn settle<T, E>(
        &mut self,
        ticket: ToggleTicket,
        result: &std::result::Result<T, E>,
    ) -> ToggleOutcome {
        match result {
            Ok(_) => self.confirm(ticket),
            Err(_) => self.roll_back(ticket),
        }
    }

    /// サーバーから取得した最新の状態で上書き
    ///
    /// 処理中の操作があればその応答は以後無視される。
    pub fn reset(&mut self, state: ToggleState) {
        self.state = state;
        self.phase = TogglePhase::Idle;
        self.generation += 1;
    }

    fn accepts(&self, ticket: &ToggleTicket) -> bool {
        if ticket.generation != self.generation || !self.is_pending() {
            log::debug!(
                "Ignoring stale toggle response (generation {} != {})",
                ticket.generation,
                self.generation
            );
            return false;
        }
        true
    }
}

impl Default for OptimisticToggle {
    fn default() -> Self {
        Self::from_state(ToggleState::default())
    }
}

/// リソースIDごとのトグル（コメント一覧・ツイート一覧用）
#[derive(Debug, Clone)]
pub struct ToggleBoard<K> {
    toggles: HashMap<K, OptimisticToggle>,
}

impl<K: Eq + Hash> ToggleBoard<K> {
    pub fn new() -> Self {
        Self {
            toggles: HashMap::new(),
        }
    }

    /// 登録または状態のリセット
    pub fn insert(&mut self, key: K, state: ToggleState) {
        match self.toggles.get_mut(&key) {
            Some(toggle) => toggle.reset(state),
            None => {
                self.toggles.insert(key, OptimisticToggle::from_state(state));
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&OptimisticToggle> {
        self.toggles.get(key)
    }

    pub fn state(&self, key: &K) -> Option<ToggleState> {
        self.toggles.get(key).map(OptimisticToggle::state)
    }

    pub fn begin(&mut self, key: &K) -> std::result::Result<ToggleTicket, ToggleError> {
        self.toggles
            .get_mut(key)
            .ok_or(ToggleError::UnknownResource)?
            .begin()
    }

    pub fn settle<T, E>(
        &mut self,
        key: &K,
        ticket: ToggleTicket,
        result: &std::result::Result<T, E>,
    ) -> ToggleOutcome {
        match self.toggles.get_mut(key) {
            Some(toggle) => toggle.settle(ticket, result),
            // 応答待ちの間に一覧から消えた
            None => ToggleOutcome::Ignored,
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<OptimisticToggle> {
        self.toggles.remove(key)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) {
        self.toggles.retain(|k, _| keep(k));
    }

    pub fn clear(&mut self) {
        self.toggles.clear();
    }
}

impl<K: Eq + Hash> Default for ToggleBoard<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// トグルを1回実行する
///
/// 表示を即座に反転し、`request` の完了を待って確定または巻き戻す。
/// 待機中は `cell` を借用しないので、UI側は途中の状態を描画できる。
/// 失敗はログに出し、巻き戻した場合のみ `on_error` を呼ぶ。
pub async fn run_toggle<F, Fut, T>(
    cell: &RefCell<OptimisticToggle>,
    request: F,
    on_error: impl FnOnce(&CoreError),
) -> ToggleOutcome
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let begun = cell.borrow_mut().begin();
    let ticket = match begun {
        Ok(ticket) => ticket,
        Err(e) => {
            log::debug!("Toggle skipped: {}", e);
            return ToggleOutcome::Ignored;
        }
    };

    let result = request().await;
    let outcome = cell.borrow_mut().settle(ticket, &result);
    report(result.err(), outcome, on_error);
    outcome
}

/// [`ToggleBoard`] 上のトグルを1回実行する
pub async fn run_board_toggle<K, F, Fut, T>(
    board: &RefCell<ToggleBoard<K>>,
    key: &K,
    request: F,
    on_error: impl FnOnce(&CoreError),
) -> ToggleOutcome
where
    K: Eq + Hash,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let begun = board.borrow_mut().begin(key);
    let ticket = match begun {
        Ok(ticket) => ticket,
        Err(e) => {
            log::debug!("Toggle skipped: {}", e);
            return ToggleOutcome::Ignored;
        }
    };

    let result = request().await;
    let outcome = board.borrow_mut().settle(key, ticket, &result);
    report(result.err(), outcome, on_error);
    outcome
}

fn report(error: Option<CoreError>, outcome: ToggleOutcome, on_error: impl FnOnce(&CoreError)) {
    if let Some(e) = error {
        log::error!("Toggle request failed: {}", e);
        if outcome == ToggleOutcome::RolledBack {
            on_error(&e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tokio::sync::oneshot;

    fn network_error() -> CoreError {
        CoreError::NetworkError("connection reset".to_string())
    }

    #[test]
    fn test_like_then_failure_reverts() {
        let mut toggle = OptimisticToggle::new(false, 5);

        let ticket = toggle.begin().unwrap();
        assert_eq!(toggle.state(), ToggleState::new(true, 6));
        assert_eq!(toggle.phase(), TogglePhase::Pending);

        assert_eq!(toggle.roll_back(ticket), ToggleOutcome::RolledBack);
        assert_eq!(toggle.state(), ToggleState::new(false, 5));
        assert_eq!(toggle.phase(), TogglePhase::RolledBack);
    }

    #[test]
    fn test_like_then_success_keeps_optimistic_value() {
        let mut toggle = OptimisticToggle::new(false, 5);

        let ticket = toggle.begin().unwrap();
        assert_eq!(toggle.confirm(ticket), ToggleOutcome::Confirmed);
        assert_eq!(toggle.state(), ToggleState::new(true, 6));
        assert_eq!(toggle.phase(), TogglePhase::Confirmed);
    }

    #[test]
    fn test_unlike_then_failure_reverts() {
        let mut toggle = OptimisticToggle::new(true, 5);

        let ticket = toggle.begin().unwrap();
        assert_eq!(toggle.state(), ToggleState::new(false, 4));

        let result: Result<()> = Err(network_error());
        assert_eq!(toggle.settle(ticket, &result), ToggleOutcome::RolledBack);
        assert_eq!(toggle.state(), ToggleState::new(true, 5));
    }

    #[test]
    fn test_unlike_at_zero_saturates() {
        let mut toggle = OptimisticToggle::new(true, 0);
        let ticket = toggle.begin().unwrap();
        assert_eq!(toggle.state(), ToggleState::new(false, 0));
        assert_eq!(toggle.roll_back(ticket), ToggleOutcome::RolledBack);
        assert_eq!(toggle.state(), ToggleState::new(true, 0));
    }

    #[test]
    fn test_second_begin_while_pending_is_rejected() {
        let mut toggle = OptimisticToggle::new(false, 1);
        let ticket = toggle.begin().unwrap();

        assert_eq!(toggle.begin().unwrap_err(), ToggleError::InFlight);
        assert_eq!(toggle.state(), ToggleState::new(true, 2));

        let _ = toggle.confirm(ticket);
        // 確定後は再びトグルできる
        let ticket = toggle.begin().unwrap();
        assert_eq!(toggle.state(), ToggleState::new(false, 1));
        let _ = toggle.confirm(ticket);
    }

    #[test]
    fn test_reset_discards_in_flight_response() {
        let mut toggle = OptimisticToggle::new(false, 5);
        let ticket = toggle.begin().unwrap();

        toggle.reset(ToggleState::new(false, 9));
        assert_eq!(toggle.roll_back(ticket), ToggleOutcome::Ignored);
        assert_eq!(toggle.state(), ToggleState::new(false, 9));
        assert_eq!(toggle.phase(), TogglePhase::Idle);
    }

    #[test]
    fn test_board_toggles_are_independent() {
        let mut board = ToggleBoard::new();
        board.insert("c1", ToggleState::new(false, 0));
        board.insert("c2", ToggleState::new(true, 3));

        let t1 = board.begin(&"c1").unwrap();
        let t2 = board.begin(&"c2").unwrap();
        assert_eq!(board.begin(&"c1").unwrap_err(), ToggleError::InFlight);
        assert_eq!(board.begin(&"missing").unwrap_err(), ToggleError::UnknownResource);

        let ok: Result<()> = Ok(());
        let failed: Result<()> = Err(network_error());
        assert_eq!(board.settle(&"c1", t1, &ok), ToggleOutcome::Confirmed);
        assert_eq!(board.settle(&"c2", t2, &failed), ToggleOutcome::RolledBack);

        assert_eq!(board.state(&"c1"), Some(ToggleState::new(true, 1)));
        assert_eq!(board.state(&"c2"), Some(ToggleState::new(true, 3)));
    }

    #[test]
    fn test_board_settle_after_remove_is_ignored() {
        let mut board = ToggleBoard::new();
        board.insert(7u32, ToggleState::new(false, 2));
        let ticket = board.begin(&7).unwrap();
        board.remove(&7);

        let ok: Result<()> = Ok(());
        assert_eq!(board.settle(&7, ticket, &ok), ToggleOutcome::Ignored);
        assert!(board.get(&7).is_none());
    }

    #[test]
    fn test_board_reinsert_discards_in_flight() {
        let mut board = ToggleBoard::new();
        board.insert("t1", ToggleState::new(false, 4));
        let ticket = board.begin(&"t1").unwrap();
        assert_eq!(board.state(&"t1"), Some(ToggleState::new(true, 5)));

        // 一覧の再読み込みで最新の状態が届いた
        board.insert("t1", ToggleState::new(true, 9));
        assert!(!board.get(&"t1").unwrap().is_pending());

        let failed: Result<()> = Err(network_error());
        assert_eq!(board.settle(&"t1", ticket, &failed), ToggleOutcome::Ignored);
        assert_eq!(board.state(&"t1"), Some(ToggleState::new(true, 9)));

        let next = board.begin(&"t1").unwrap();
        let ok: Result<()> = Ok(());
        assert_eq!(board.settle(&"t1", next, &ok), ToggleOutcome::Confirmed);
        assert_eq!(board.state(&"t1"), Some(ToggleState::new(false, 8)));
    }

    #[tokio::test]
    async fn test_run_toggle_shows_optimistic_value_then_rolls_back() {
        let cell = RefCell::new(OptimisticToggle::new(false, 5));
        let (tx, rx) = oneshot::channel::<Result<()>>();
        let reported = Cell::new(false);

        let driver = run_toggle(
            &cell,
            || async move {
                rx.await
                    .unwrap_or_else(|_| Err(CoreError::Other("sender dropped".to_string())))
            },
            |_| reported.set(true),
        );
        let observer = async {
            while !cell.borrow().is_pending() {
                tokio::task::yield_now().await;
            }
            assert_eq!(cell.borrow().state(), ToggleState::new(true, 6));
            tx.send(Err(network_error())).unwrap();
        };

        let (outcome, ()) = tokio::join!(driver, observer);
        assert_eq!(outcome, ToggleOutcome::RolledBack);
        assert_eq!(cell.borrow().state(), ToggleState::new(false, 5));
        assert!(reported.get());
    }

    #[tokio::test]
    async fn test_run_toggle_success_does_not_report() {
        let cell = RefCell::new(OptimisticToggle::new(true, 5));
        let reported = Cell::new(false);

        let outcome = run_toggle(&cell, || async { Ok(()) }, |_| reported.set(true)).await;

        assert_eq!(outcome, ToggleOutcome::Confirmed);
        assert_eq!(cell.borrow().state(), ToggleState::new(false, 4));
        assert!(!reported.get());
    }

    #[tokio::test]
    async fn test_run_toggle_while_pending_is_ignored() {
        let cell = RefCell::new(OptimisticToggle::new(false, 0));
        let _ticket = cell.borrow_mut().begin().unwrap();
        let called = Cell::new(false);

        let outcome = run_toggle(
            &cell,
            || async {
                called.set(true);
                Ok(())
            },
            |_| {},
        )
        .await;

        assert_eq!(outcome, ToggleOutcome::Ignored);
        assert!(!called.get());
        assert_eq!(cell.borrow().state(), ToggleState::new(true, 1));
    }

    #[tokio::test]
    async fn test_run_board_toggle_rolls_back_single_entry() {
        let board = RefCell::new(ToggleBoard::new());
        board.borrow_mut().insert("t1".to_string(), ToggleState::new(false, 10));
        board.borrow_mut().insert("t2".to_string(), ToggleState::new(false, 1));

        let outcome = run_board_toggle(
            &board,
            &"t1".to_string(),
            || async { Err::<(), _>(network_error()) },
            |e| assert!(!e.is_http()),
        )
        .await;

        assert_eq!(outcome, ToggleOutcome::RolledBack);
        assert_eq!(board.borrow().state(&"t1".to_string()), Some(ToggleState::new(false, 10)));
        assert_eq!(board.borrow().state(&"t2".to_string()), Some(ToggleState::new(false, 1)));
    }
}
