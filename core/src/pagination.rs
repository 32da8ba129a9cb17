use crate::types::Page;

/// 読み込み中のページ要求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    generation: u64,
}

/// 「もっと見る」形式の一覧
///
/// 1ページ目は置き換え、2ページ目以降は末尾に追加する。
/// 再読み込み前に発行した要求の応答は捨てる。
#[derive(Debug, Clone)]
pub struct Paginator<T> {
    items: Vec<T>,
    page: u32,
    has_more: bool,
    loading: bool,
    generation: u64,
}

impl<T> Paginator<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            page: 0,
            has_more: true,
            loading: false,
            generation: 0,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// 最後に読み込めたページ番号（未読み込みなら0）
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// 1ページ目から読み直す
    pub fn start_reload(&mut self) -> PageRequest {
        self.generation += 1;
        self.loading = true;
        PageRequest {
            page: 1,
            generation: self.generation,
        }
    }

    /// 次のページを要求。読み込み中か続きがなければ `None`
    pub fn next_page(&mut self) -> Option<PageRequest> {
        if self.loading || !self.has_more {
            return None;
        }
        self.loading = true;
        Some(PageRequest {
            page: self.page + 1,
            generation: self.generation,
        })
    }

    /// 応答を反映。古い要求の応答なら何もせず `false`
    pub fn apply(&mut self, request: PageRequest, page: Page<T>) -> bool {
        if !self.is_current(&request) {
            return false;
        }

        if request.page <= 1 {
            self.items = page.docs;
        } else {
            self.items.extend(page.docs);
        }
        self.page = request.page;
        self.has_more = page.has_next_page;
        self.loading = false;
        true
    }

    /// 読み込み失敗。一覧はそのまま、再試行はしない
    pub fn fail(&mut self, request: PageRequest) {
        if self.is_current(&request) {
            self.loading = false;
        }
    }

    fn is_current(&self, request: &PageRequest) -> bool {
        if request.generation != self.generation {
            log::debug!(
                "Dropping stale page {} (generation {} != {})",
                request.page,
                request.generation,
                self.generation
            );
            return false;
        }
        true
    }
}

impl<T> Default for Paginator<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page_replaces_and_next_appends() {
        let mut list = Paginator::new();
        let stale = list.start_reload();
        list.apply(stale, Page::new(vec![0], true));

        let first = list.start_reload();
        assert_eq!(first.page, 1);
        assert!(list.apply(first, Page::new(vec![1, 2], true)));
        assert_eq!(list.items(), &[1, 2]);

        let second = list.next_page().unwrap();
        assert_eq!(second.page, 2);
        assert!(list.apply(second, Page::new(vec![3], false)));
        assert_eq!(list.items(), &[1, 2, 3]);
        assert_eq!(list.page(), 2);

        assert!(!list.has_more());
        assert!(list.next_page().is_none());
    }

    #[test]
    fn test_no_next_page_while_loading() {
        let mut list: Paginator<u8> = Paginator::new();
        let _first = list.start_reload();
        assert!(list.is_loading());
        assert!(list.next_page().is_none());
    }

    #[test]
    fn test_failure_keeps_items_and_allows_retry() {
        let mut list = Paginator::new();
        let first = list.start_reload();
        list.apply(first, Page::new(vec!["a"], true));

        let second = list.next_page().unwrap();
        list.fail(second);
        assert!(!list.is_loading());
        assert_eq!(list.items(), &["a"]);
        assert_eq!(list.next_page().unwrap().page, 2);
    }

    #[test]
    fn test_stale_response_after_reload_is_dropped() {
        let mut list = Paginator::new();
        let first = list.start_reload();
        list.apply(first, Page::new(vec![1], true));

        let old = list.next_page().unwrap();
        let reload = list.start_reload();

        assert!(!list.apply(old, Page::new(vec![99], true)));
        assert!(list.is_loading());
        assert!(list.apply(reload, Page::new(vec![5], false)));
        assert_eq!(list.items(), &[5]);
    }
}
