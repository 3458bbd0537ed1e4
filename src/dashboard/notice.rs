use chrono::{DateTime, TimeDelta, Utc};
use crate::util::time;

/// How long a transient notice stays on screen, in seconds.
pub const NOTICE_DURATION_SECS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Toast-like message shown after an action.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    pub shown_at: DateTime<Utc>,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self::new(NoticeKind::Success, text.into())
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(NoticeKind::Error, text.into())
    }

    fn new(kind: NoticeKind, text: String) -> Self {
        Self {
            kind,
            text,
            shown_at: time::helper::get_utc_now(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.shown_at >= TimeDelta::seconds(NOTICE_DURATION_SECS)
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            NoticeKind::Success => write!(f, "[ok] {}", self.text),
            NoticeKind::Error => write!(f, "[error] {}", self.text),
        }
    }
}

/// Slot holding at most one notice, cleared once it expires.
#[derive(Debug, Default)]
pub struct NoticeSlot(Option<Notice>);

impl NoticeSlot {
    pub fn show(&mut self, notice: Notice) {
        self.0 = Some(notice);
    }

    /// the notice still on screen, if any
    pub fn current(&mut self) -> Option<&Notice> {
        let now = time::helper::get_utc_now();
        if self.0.as_ref().is_some_and(|n| n.is_expired(now)) {
            self.0 = None;
        }
        self.0.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::time::helper::set_utc_now;

    #[test]
    fn notice_expires_after_fixed_duration() {
        let start = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        set_utc_now(start);
        let mut slot = NoticeSlot::default();
        slot.show(Notice::error("failed to close account"));

        set_utc_now(start + TimeDelta::seconds(2));
        assert_eq!(
            slot.current().map(|n| n.to_string()),
            Some("[error] failed to close account".to_string())
        );

        set_utc_now(start + TimeDelta::seconds(NOTICE_DURATION_SECS));
        assert!(slot.current().is_none());
    }
}
