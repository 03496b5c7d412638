//! 组织者扫码签到
//!
//! - `scannable_events`: 可扫码的活动列表
//! - `ScanDeduper`: 同一文本在冷却时间内只提交一次
//! - `ScanSession`: 摄像头会话锁，启动中/运行中时拒绝再次启动

use crate::api::UniEventApi;
use crate::clock::Clock;
use crate::controllers::page_message;
use crate::error::{ClientError, ClientErrorKind, ClientResult};
use crate::qr;
use crate::request::HttpClient;
use chrono::{DateTime, Duration, Utc};
use std::rc::Rc;
use unievent_shared::date::EventPhase;
use unievent_shared::protocol::{CheckinRequest, MyEventsRequest};
use unievent_shared::{CheckinResult, Event, EventId, EventStatus};

/// 已发布且未结束
pub fn can_scan(event: &Event, now: DateTime<Utc>) -> bool {
    event.status == EventStatus::Published && event.phase(now) != EventPhase::Ended
}

/// 可扫码活动，按开始时间升序（没有开始时间的排在最后）
pub fn scannable_events(events: &[Event], now: DateTime<Utc>) -> Vec<(&Event, EventPhase)> {
    let mut list: Vec<&Event> = events.iter().filter(|e| can_scan(e, now)).collect();
    list.sort_by_key(|e| (e.start_date.is_none(), e.start_date));
    list.into_iter().map(|e| (e, e.phase(now))).collect()
}

// =========================================================
// 去重
// =========================================================

#[derive(Debug, Clone)]
pub struct ScanDeduper {
    cooldown: Duration,
    last: Option<(String, DateTime<Utc>)>,
}

impl ScanDeduper {
    pub fn new(cooldown_ms: u64) -> Self {
        Self {
            cooldown: Duration::milliseconds(i64::try_from(cooldown_ms).unwrap_or(i64::MAX)),
            last: None,
        }
    }

    /// 返回 false 表示这次解码应被忽略
    pub fn accept(&mut self, text: &str, now: DateTime<Utc>) -> bool {
        if let Some((last, at)) = &self.last {
            if last == text && now - *at < self.cooldown {
                return false;
            }
        }
        self.last = Some((text.to_string(), now));
        true
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

// =========================================================
// 摄像头会话
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Starting,
    Running,
}

#[derive(Debug, Default)]
pub struct ScanSession {
    state: SessionState,
}

impl ScanSession {
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 已经在启动或运行时返回 false
    pub fn begin(&mut self) -> bool {
        if self.state != SessionState::Idle {
            tracing::debug!(state = ?self.state, "scan session already active");
            return false;
        }
        self.state = SessionState::Starting;
        true
    }

    pub fn started(&mut self) {
        if self.state == SessionState::Starting {
            self.state = SessionState::Running;
        }
    }

    /// 启动失败或用户停止
    pub fn stop(&mut self) {
        self.state = SessionState::Idle;
    }

    pub fn is_active(&self) -> bool {
        self.state != SessionState::Idle
    }
}

// =========================================================
// 签到结果
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanVerdict {
    CheckedIn,
    AlreadyCheckedIn,
    Refused,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub verdict: ScanVerdict,
    pub message: String,
    pub attendee: Option<String>,
}

impl ScanOutcome {
    fn from_result(result: CheckinResult) -> Self {
        let verdict = if result.already_checked {
            ScanVerdict::AlreadyCheckedIn
        } else if result.ok {
            ScanVerdict::CheckedIn
        } else {
            ScanVerdict::Refused
        };
        Self {
            verdict,
            message: result
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Scanare procesată.".to_string()),
            attendee: result.user.as_ref().map(|u| u.display_name()),
        }
    }

    fn refused(message: impl Into<String>) -> Self {
        Self {
            verdict: ScanVerdict::Refused,
            message: message.into(),
            attendee: None,
        }
    }
}

// =========================================================
// 控制器
// =========================================================

pub struct ScannerController<C> {
    api: UniEventApi<C>,
    clock: Rc<dyn Clock>,
}

impl<C: HttpClient> ScannerController<C> {
    pub fn new(api: UniEventApi<C>, clock: Rc<dyn Clock>) -> Self {
        Self { api, clock }
    }

    pub fn deduper(&self) -> ScanDeduper {
        ScanDeduper::new(self.api.config().scan_cooldown_ms)
    }

    pub async fn load_scannable(&self) -> ClientResult<Vec<Event>> {
        let events = self.api.send(&MyEventsRequest).await.map_err(|e| {
            let message = page_message(&e, "Nu am putut încărca evenimentele.");
            e.with_message(message).in_op("scanner.load_events")
        })?;
        Ok(scannable_events(&events, self.clock.now())
            .into_iter()
            .map(|(e, _)| e.clone())
            .collect())
    }

    /// 从组织者自己的活动里找到目标活动
    pub async fn load_event(&self, id: EventId) -> ClientResult<Event> {
        let op = "scanner.load_event";
        let events = self.api.send(&MyEventsRequest).await.map_err(|e| {
            let message = page_message(&e, "Nu am putut încărca evenimentul.");
            e.with_message(message).in_op_with(op, id.to_string())
        })?;

        events.into_iter().find(|e| e.id == id).ok_or_else(|| {
            ClientError::new(
                ClientErrorKind::NotFound,
                "Evenimentul nu există sau nu îți aparține.",
            )
            .in_op_with(op, id.to_string())
        })
    }

    /// 提交一次扫码；活动不可扫码或文本为空时不发请求
    pub async fn checkin(&self, event: &Event, text: &str) -> ScanOutcome {
        if !can_scan(event, self.clock.now()) {
            return ScanOutcome::refused(
                "Scanarea nu este disponibilă pentru acest eveniment (nepublicat sau încheiat).",
            );
        }

        let payload = match qr::parse_payload(text) {
            Ok(payload) => payload,
            Err(e) => return ScanOutcome::refused(e.message()),
        };

        let result = self
            .api
            .send(&CheckinRequest {
                event_id: event.id,
                qr_code_data: payload.to_string(),
            })
            .await;

        match result {
            Ok(result) => {
                let outcome = ScanOutcome::from_result(result);
                tracing::info!(event = event.id, verdict = ?outcome.verdict, "checkin processed");
                outcome
            }
            Err(e) => {
                let e = e.in_op_with("scanner.checkin", event.id.to_string());
                tracing::warn!(error = %e, "checkin failed");
                ScanOutcome::refused(page_message(&e, "Nu am putut procesa scanarea."))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::Harness;
    use crate::clock::FixedClock;
    use crate::request::{HttpMethod, MockHttpClient};
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0).unwrap()
    }

    fn controller(h: &Harness) -> ScannerController<MockHttpClient> {
        ScannerController::new(h.api.clone(), Rc::new(FixedClock::at(now())))
    }

    fn event(id: u64, status: &str, start_h: i64, end_h: i64) -> serde_json::Value {
        json!({
            "id": id,
            "status": status,
            "start_date": now() + Duration::hours(start_h),
            "end_date": now() + Duration::hours(end_h)
        })
    }

    fn published_now() -> Event {
        serde_json::from_value(event(1, "published", -1, 2)).unwrap()
    }

    #[tokio::test]
    async fn scannable_list_is_ordered_by_start() {
        let h = Harness::logged_in("a", "r");
        h.client.mock_response(
            HttpMethod::Get,
            "/api/events/my/",
            200,
            json!([
                event(1, "published", 48, 50),
                event(2, "published", -1, 1),
                event(3, "published", -5, -2),
                event(4, "draft", 1, 2),
                event(5, "published", 2, 3)
            ]),
        );

        let events = controller(&h).load_scannable().await.unwrap();
        let ids: Vec<u64> = events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 5, 1]);

        let phases: Vec<EventPhase> = scannable_events(&events, now())
            .into_iter()
            .map(|(_, p)| p)
            .collect();
        assert_eq!(
            phases,
            vec![EventPhase::Ongoing, EventPhase::Upcoming, EventPhase::Upcoming]
        );
    }

    #[tokio::test]
    async fn load_event_not_owned() {
        let h = Harness::logged_in("a", "r");
        h.client.mock_response(
            HttpMethod::Get,
            "/api/events/my/",
            200,
            json!([event(1, "published", 1, 2)]),
        );

        let err = controller(&h).load_event(9).await.unwrap_err();
        assert_eq!(err.kind, ClientErrorKind::NotFound);
        assert_eq!(err.message(), "Evenimentul nu există sau nu îți aparține.");
        assert_eq!(controller(&h).load_event(1).await.unwrap().id, 1);
    }

    #[tokio::test]
    async fn checkin_sends_the_scanned_payload() {
        let h = Harness::logged_in("a", "r");
        h.client.mock_response(
            HttpMethod::Post,
            "/api/interactions/tickets/checkin/",
            200,
            json!({"ok": true, "user": {"id": 3, "email": "s@usv.ro", "first_name": "Ion", "last_name": "Rus"}}),
        );

        let outcome = controller(&h)
            .checkin(&published_now(), " UNIEVENT:TICKET:V1:abc-1\n")
            .await;
        assert_eq!(outcome.verdict, ScanVerdict::CheckedIn);
        assert_eq!(outcome.message, "Scanare procesată.");
        assert_eq!(outcome.attendee.as_deref(), Some("Ion Rus"));
        assert_eq!(
            h.client.last().unwrap().body_json(),
            json!({"event_id": 1, "qr_code_data": "UNIEVENT:TICKET:V1:abc-1"})
        );

        // 其他格式也交给后端判断
        controller(&h).checkin(&published_now(), "OTHER:abc").await;
        assert_eq!(h.client.count("/api/interactions/tickets/checkin/"), 2);
        assert_eq!(h.client.last().unwrap().body_json()["qr_code_data"], "OTHER:abc");
    }

    #[tokio::test]
    async fn already_checked_in() {
        let h = Harness::logged_in("a", "r");
        h.client.mock_response(
            HttpMethod::Post,
            "/api/interactions/tickets/checkin/",
            200,
            json!({"ok": false, "already_checked": true, "message": "Bilet deja scanat."}),
        );

        let outcome = controller(&h).checkin(&published_now(), "abc-1").await;
        assert_eq!(outcome.verdict, ScanVerdict::AlreadyCheckedIn);
        assert_eq!(outcome.message, "Bilet deja scanat.");
    }

    #[tokio::test]
    async fn refused_without_request() {
        let h = Harness::logged_in("a", "r");
        let outcome = controller(&h).checkin(&published_now(), "   ").await;
        assert_eq!(outcome.verdict, ScanVerdict::Refused);
        assert_eq!(outcome.message, "Cod QR invalid.");

        let ended: Event = serde_json::from_value(event(2, "published", -5, -1)).unwrap();
        let outcome = controller(&h).checkin(&ended, "abc-1").await;
        assert_eq!(outcome.verdict, ScanVerdict::Refused);
        assert!(outcome.message.starts_with("Scanarea nu este disponibilă"));
        assert!(h.client.requests().is_empty());
    }

    #[tokio::test]
    async fn backend_rejection_message_is_shown() {
        let h = Harness::logged_in("a", "r");
        h.client.mock_response(
            HttpMethod::Post,
            "/api/interactions/tickets/checkin/",
            400,
            json!({"detail": "Biletul nu aparține acestui eveniment."}),
        );

        let outcome = controller(&h).checkin(&published_now(), "abc-1").await;
        assert_eq!(outcome.verdict, ScanVerdict::Refused);
        assert_eq!(outcome.message, "Biletul nu aparține acestui eveniment.");
    }

    #[test]
    fn deduper_ignores_repeats_within_cooldown() {
        let mut dedup = ScanDeduper::new(1400);
        let t = now();
        assert!(dedup.accept("abc", t));
        assert!(!dedup.accept("abc", t + Duration::milliseconds(1399)));
        assert!(dedup.accept("other", t + Duration::milliseconds(1399)));
        assert!(dedup.accept("abc", t + Duration::milliseconds(2000)));
        assert!(!dedup.accept("abc", t + Duration::milliseconds(2100)));
        assert!(dedup.accept("abc", t + Duration::milliseconds(3400)));

        // 重新开始扫码后同一张票可以立即再次提交
        dedup.reset();
        assert!(dedup.accept("abc", t + Duration::milliseconds(3401)));
    }

    #[test]
    fn session_latch_refuses_second_start() {
        let mut session = ScanSession::default();
        assert!(session.begin());
        assert!(!session.begin());
        session.started();
        assert_eq!(session.state(), SessionState::Running);
        assert!(!session.begin());
        session.stop();
        assert!(!session.is_active());
        assert!(session.begin());
    }
}
