//! 统计页：已结束的已发布活动

use crate::api::UniEventApi;
use crate::clock::Clock;
use crate::controllers::page_message;
use crate::error::ClientResult;
use crate::request::HttpClient;
use chrono::{DateTime, Utc};
use std::rc::Rc;
use unievent_shared::protocol::{EventStatsRequest, MyEventsRequest};
use unievent_shared::{Event, EventId, EventStats, EventStatus, User};

/// 已发布且结束时间早于 `now`，最近结束的在前
pub fn ended_events(events: &[Event], now: DateTime<Utc>) -> Vec<&Event> {
    let mut ended: Vec<&Event> = events
        .iter()
        .filter(|e| e.status == EventStatus::Published)
        .filter(|e| e.end_date.is_some_and(|end| end < now))
        .collect();
    ended.sort_by(|a, b| b.end_date.cmp(&a.end_date));
    ended
}

/// 0.42 -> "42%"
pub fn percent(rate: f64) -> String {
    format!("{}%", (rate * 100.0).round() as i64)
}

pub fn average(avg: Option<f64>) -> String {
    format!("{:.1}", avg.unwrap_or(0.0))
}

/// 评分分布：返回 5 到 1 星的 (星级, 数量, 占比百分数)
pub fn rating_bars(stats: &EventStats) -> Vec<(u8, u32, u32)> {
    let total: u32 = stats.rating_breakdown.values().sum();
    (1..=5u8)
        .rev()
        .map(|star| {
            let count = stats
                .rating_breakdown
                .get(&star.to_string())
                .copied()
                .unwrap_or(0);
            let width = if total == 0 { 0 } else { count * 100 / total };
            (star, count, width)
        })
        .collect()
}

/// 评论作者的首字母
pub fn initials(user: Option<&User>) -> String {
    let Some(user) = user else {
        return "U".to_string();
    };
    let mut parts = [user.first_name.as_str(), user.last_name.as_str()]
        .into_iter()
        .flat_map(str::split_whitespace);
    let first = parts.next().and_then(|p| p.chars().next());
    let second = parts.next().and_then(|p| p.chars().next());
    match (first, second) {
        (None, _) => "U".to_string(),
        (Some(a), None) => a.to_string(),
        (Some(a), Some(b)) => format!("{a}{b}"),
    }
}

pub struct StatsController<C> {
    api: UniEventApi<C>,
    clock: Rc<dyn Clock>,
}

impl<C: HttpClient> StatsController<C> {
    pub fn new(api: UniEventApi<C>, clock: Rc<dyn Clock>) -> Self {
        Self { api, clock }
    }

    pub async fn load_ended(&self) -> ClientResult<Vec<Event>> {
        let events = self.api.send(&MyEventsRequest).await.map_err(|e| {
            let message = page_message(&e, "Nu am putut încărca evenimentele.");
            e.with_message(message).in_op("stats.load_events")
        })?;
        Ok(ended_events(&events, self.clock.now())
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn load_stats(&self, event: EventId) -> ClientResult<EventStats> {
        self.api.send(&EventStatsRequest { id: event }).await.map_err(|e| {
            let message = page_message(&e, "Nu am putut încărca statisticile.");
            e.with_message(message).in_op_with("stats.load", event.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::Harness;
    use crate::clock::FixedClock;
    use crate::request::HttpMethod;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn ended_published_most_recent_first() {
        let h = Harness::logged_in("a", "r");
        let d = Duration::days(1);
        h.client.mock_response(
            HttpMethod::Get,
            "/api/events/my/",
            200,
            json!([
                {"id": 1, "status": "published", "end_date": now() - d * 3},
                {"id": 2, "status": "published", "end_date": now() - d},
                {"id": 3, "status": "draft", "end_date": now() - d},
                {"id": 4, "status": "published", "end_date": now() + d},
                {"id": 5, "status": "published"}
            ]),
        );

        let ctl = StatsController::new(h.api.clone(), Rc::new(FixedClock::at(now())));
        let ids: Vec<u64> = ctl.load_ended().await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn stats_payload() {
        let h = Harness::logged_in("a", "r");
        h.client.mock_response(
            HttpMethod::Get,
            "/api/events/2/stats/",
            200,
            json!({
                "tickets_total": 40,
                "checked_in_total": 30,
                "checkin_rate": 0.75,
                "avg_rating": 4.33,
                "reviews_count": 4,
                "rating_breakdown": {"5": 2, "4": 1, "3": 1},
                "latest_reviews": []
            }),
        );

        let ctl = StatsController::new(h.api.clone(), Rc::new(FixedClock::at(now())));
        let stats = ctl.load_stats(2).await.unwrap();
        assert_eq!(percent(stats.checkin_rate), "75%");
        assert_eq!(average(stats.avg_rating), "4.3");
        assert_eq!(average(None), "0.0");
        assert_eq!(
            rating_bars(&stats),
            vec![(5, 2, 50), (4, 1, 25), (3, 1, 25), (2, 0, 0), (1, 0, 0)]
        );
    }

    #[test]
    fn initials_from_names() {
        let user: User = serde_json::from_value(json!({
            "id": 1, "email": "a@b.c", "first_name": "Ana Maria", "last_name": "Pop"
        }))
        .unwrap();
        assert_eq!(initials(Some(&user)), "AM");
        assert_eq!(initials(None), "U");
    }
}
