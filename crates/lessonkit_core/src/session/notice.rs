//! Inline, dismissible user notices with bounded lifetime.

use crate::model::block::BlockId;
use std::time::{Duration, Instant};

/// Default time a notice stays visible.
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(5);

pub type NoticeId = u64;

/// One user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: NoticeId,
    pub message: String,
    /// Block the notice is about, if any.
    pub block_id: Option<BlockId>,
    pub raised_at: Instant,
}

/// Notice list whose entries auto-expire after `ttl`.
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    ttl: Duration,
    next_id: NoticeId,
    notices: Vec<Notice>,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new(DEFAULT_NOTICE_TTL)
    }
}

impl NoticeBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            next_id: 1,
            notices: Vec::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Adds a notice and returns its id; expired notices are dropped first.
    pub fn raise(
        &mut self,
        message: impl Into<String>,
        block_id: Option<BlockId>,
        now: Instant,
    ) -> NoticeId {
        self.prune(now);
        let id = self.next_id;
        self.next_id += 1;
        self.notices.push(Notice {
            id,
            message: message.into(),
            block_id,
            raised_at: now,
        });
        id
    }

    /// Notices still visible at `now`, oldest first.
    pub fn active(&self, now: Instant) -> Vec<&Notice> {
        self.notices
            .iter()
            .filter(|notice| self.is_live(notice, now))
            .collect()
    }

    /// Removes one notice; returns whether it existed.
    pub fn dismiss(&mut self, id: NoticeId) -> bool {
        let before = self.notices.len();
        self.notices.retain(|notice| notice.id != id);
        self.notices.len() != before
    }

    /// Drops expired notices and returns how many were removed.
    pub fn prune(&mut self, now: Instant) -> usize {
        let before = self.notices.len();
        let ttl = self.ttl;
        self.notices
            .retain(|notice| now.saturating_duration_since(notice.raised_at) < ttl);
        before - self.notices.len()
    }

    pub fn clear(&mut self) {
        self.notices.clear();
    }

    fn is_live(&self, notice: &Notice, now: Instant) -> bool {
        now.saturating_duration_since(notice.raised_at) < self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::NoticeBoard;
    use std::time::{Duration, Instant};

    #[test]
    fn notices_expire_after_ttl() {
        let mut board = NoticeBoard::new(Duration::from_secs(2));
        let start = Instant::now();
        board.raise("upload failed", None, start);

        assert_eq!(board.active(start + Duration::from_secs(1)).len(), 1);
        assert!(board.active(start + Duration::from_secs(2)).is_empty());
        assert_eq!(board.prune(start + Duration::from_secs(3)), 1);
    }

    #[test]
    fn raising_drops_expired_notices() {
        let mut board = NoticeBoard::new(Duration::from_secs(2));
        let start = Instant::now();
        for offset in 0..10 {
            board.raise("upload failed", None, start + Duration::from_secs(offset));
        }

        assert_eq!(board.prune(start + Duration::from_secs(9)), 0);
        assert_eq!(board.active(start + Duration::from_secs(9)).len(), 2);
    }

    #[test]
    fn dismiss_removes_only_the_target() {
        let mut board = NoticeBoard::default();
        let now = Instant::now();
        let first = board.raise("one", None, now);
        let second = board.raise("two", None, now);

        assert!(board.dismiss(first));
        assert!(!board.dismiss(first));
        let active = board.active(now);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second);
    }
}
