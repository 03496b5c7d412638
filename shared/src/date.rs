//! 时间窗口模块
//!
//! 活动的时间判断集中在这里：
//! - `cutoff`: 结束时间，缺失时退回开始时间
//! - `EventPhase`: 即将开始 / 进行中 / 已结束

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 截止时间：`end` 优先，否则 `start`
#[inline]
pub fn cutoff(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    end.or(start)
}

/// 截止时间是否已到（`cutoff <= now`），没有任何时间的活动视为未过期
#[inline]
pub fn is_past(cutoff: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    cutoff.is_some_and(|c| c <= now)
}

/// 活动阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPhase {
    Upcoming,
    Ongoing,
    Ended,
}

impl EventPhase {
    /// 计算阶段
    ///
    /// - 有结束时间且 `end < now` 为已结束（没有结束时间则永不结束）
    /// - 开始时间晚于 `now` 为即将开始
    /// - 其余为进行中
    pub fn at(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        if end.is_some_and(|e| e < now) {
            EventPhase::Ended
        } else if start.is_some_and(|s| s > now) {
            EventPhase::Upcoming
        } else {
            EventPhase::Ongoing
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EventPhase::Upcoming => "Urmează",
            EventPhase::Ongoing => "În desfășurare",
            EventPhase::Ended => "Încheiat",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn cutoff_prefers_end_date() {
        let now = Utc::now();
        let start = now - Duration::hours(2);
        let end = now + Duration::hours(2);

        assert_eq!(cutoff(Some(start), Some(end)), Some(end));
        assert_eq!(cutoff(Some(start), None), Some(start));
        assert_eq!(cutoff(None, None), None);
    }

    #[test]
    fn past_is_inclusive() {
        let now = Utc::now();
        assert!(is_past(Some(now), now));
        assert!(!is_past(Some(now + Duration::seconds(1)), now));
        assert!(!is_past(None, now));
    }

    #[test]
    fn phases() {
        let now = Utc::now();
        let h = Duration::hours(1);

        assert_eq!(EventPhase::at(Some(now + h), Some(now + h * 2), now), EventPhase::Upcoming);
        assert_eq!(EventPhase::at(Some(now - h), Some(now + h), now), EventPhase::Ongoing);
        assert_eq!(EventPhase::at(Some(now - h * 2), Some(now - h), now), EventPhase::Ended);
        assert_eq!(EventPhase::at(Some(now - h), None, now), EventPhase::Ongoing);
        assert_eq!(EventPhase::at(None, None, now), EventPhase::Ongoing);
    }
}
