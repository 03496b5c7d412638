use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod date;
pub mod protocol;

pub use date::EventPhase;

// =========================================================
// 常量定义 (Constants)
// =========================================================

/// 二维码载荷前缀，后接不透明的票据编码
pub const QR_PAYLOAD_PREFIX: &str = "UNIEVENT:TICKET:V1:";
pub const HEADER_AUTHORIZATION: &str = "Authorization";

pub type EventId = u64;
pub type TicketId = u64;
pub type FavoriteId = u64;

// =========================================================
// 会话 (Session)
// =========================================================

/// 访问令牌 + 刷新令牌
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// `/api/token/refresh/` 的响应，后端开启轮换时才会返回新的 refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshedToken {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

// =========================================================
// 用户 (Users)
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_student: bool,
    #[serde(default)]
    pub is_organizer: bool,
    #[serde(default)]
    pub date_joined: Option<DateTime<Utc>>,
}

impl User {
    /// 姓名优先，其次邮箱
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RegisteredUser {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizerRequest {
    pub id: u64,
    pub organization_name: String,
    #[serde(default)]
    pub details: String,
    /// pending / approved / rejected
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// 只携带 `detail` 消息的通用响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Detail {
    #[serde(default)]
    pub detail: Option<String>,
}

// =========================================================
// 参考数据 (Reference data)
// =========================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faculty {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub abbreviation: Option<String>,
}

impl Faculty {
    /// 下拉框中的显示文本，有缩写时缩写在前
    pub fn label(&self) -> String {
        match self.abbreviation.as_deref() {
            Some(abbr) if !abbr.is_empty() => format!("{} — {}", abbr, self.name),
            _ => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub faculty: Option<Faculty>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub google_maps_link: String,
}

// =========================================================
// 活动 (Events)
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Draft,
    Pending,
    Published,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl EventStatus {
    /// 未知状态按草稿归类
    pub fn bucket(self) -> Self {
        match self {
            EventStatus::Unknown => EventStatus::Draft,
            other => other,
        }
    }

    pub fn label(self) -> &'static str {
        match self.bucket() {
            EventStatus::Draft | EventStatus::Unknown => "Draft",
            EventStatus::Pending => "În așteptare",
            EventStatus::Published => "Publicat",
            EventStatus::Rejected => "Respins",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self.bucket() {
            EventStatus::Draft | EventStatus::Unknown => "draft",
            EventStatus::Pending => "pending",
            EventStatus::Published => "published",
            EventStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    #[serde(default)]
    pub organizer: Option<User>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub faculty: Option<Faculty>,
    #[serde(default)]
    pub department: Option<Department>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_participants: Option<u32>,
    #[serde(default)]
    pub tickets_count: Option<u32>,
    #[serde(default)]
    pub seats_left: Option<u32>,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Event {
    pub fn tickets_sold(&self) -> u32 {
        self.tickets_count.unwrap_or(0)
    }

    pub fn is_full(&self) -> bool {
        matches!(self.max_participants, Some(max) if self.tickets_sold() >= max)
    }

    pub fn location_name(&self) -> &str {
        self.location
            .as_ref()
            .map(|l| l.name.as_str())
            .unwrap_or("Locație necunoscută")
    }

    pub fn organizer_name(&self) -> String {
        self.organizer
            .as_ref()
            .map(User::display_name)
            .unwrap_or_else(|| "Organizator".to_string())
    }

    /// 截止时间：结束时间，缺失时退回开始时间
    pub fn cutoff(&self) -> Option<DateTime<Utc>> {
        date::cutoff(self.start_date, self.end_date)
    }

    pub fn phase(&self, now: DateTime<Utc>) -> EventPhase {
        EventPhase::at(self.start_date, self.end_date, now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventStats {
    #[serde(default)]
    pub tickets_total: u32,
    #[serde(default)]
    pub checked_in_total: u32,
    #[serde(default)]
    pub checkin_rate: f64,
    #[serde(default)]
    pub avg_rating: Option<f64>,
    #[serde(default)]
    pub reviews_count: u32,
    /// 键为 "1".."5"
    #[serde(default)]
    pub rating_breakdown: HashMap<String, u32>,
    #[serde(default)]
    pub latest_reviews: Vec<Review>,
}

// =========================================================
// 互动 (Interactions)
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub event: Event,
    #[serde(default)]
    pub qr_code_data: Option<String>,
    #[serde(default)]
    pub is_checked_in: bool,
    #[serde(default)]
    pub purchased_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub has_review: bool,
}

/// 购票接口的响应（事件只以写入字段出现）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketReceipt {
    pub id: TicketId,
    #[serde(default)]
    pub qr_code_data: Option<String>,
    #[serde(default)]
    pub is_checked_in: bool,
    #[serde(default)]
    pub purchased_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: FavoriteId,
    #[serde(default)]
    pub event: Option<Event>,
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: u64,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub event: Option<Event>,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CheckinResult {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub already_checked: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub ticket_id: Option<TicketId>,
    #[serde(default)]
    pub user: Option<User>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_deserializes_backend_shape() {
        let raw = r#"{
            "id": 7,
            "organizer": {"id": 1, "email": "org@usv.ro", "first_name": "Ana", "last_name": "Pop", "is_student": false, "is_organizer": true, "date_joined": "2025-01-01T10:00:00Z"},
            "title": "Hackathon",
            "description": "48h",
            "faculty": {"id": 2, "name": "Inginerie", "abbreviation": "FIESC"},
            "department": null,
            "category": {"id": 3, "name": "Tech"},
            "location": {"id": 4, "name": "Aula", "address": "Str. Universitatii 13", "google_maps_link": ""},
            "start_date": "2025-05-01T10:00:00+03:00",
            "end_date": "2025-05-02T10:00:00Z",
            "max_participants": 10,
            "tickets_count": 3,
            "seats_left": 7,
            "status": "published",
            "image": null,
            "file": null,
            "created_at": "2025-04-01T10:00:00Z",
            "updated_at": "2025-04-01T10:00:00Z"
        }"#;

        let event: Event = serde_json::from_str(raw).unwrap();
        assert_eq!(event.id, 7);
        assert_eq!(event.status, EventStatus::Published);
        assert_eq!(event.location_name(), "Aula");
        assert_eq!(event.organizer_name(), "Ana Pop");
        assert_eq!(
            event.start_date.unwrap().to_rfc3339(),
            "2025-05-01T07:00:00+00:00"
        );
        assert!(!event.is_full());
    }

    #[test]
    fn unknown_status_is_bucketed_as_draft() {
        let event: Event = serde_json::from_str(r#"{"id": 1, "status": "archived"}"#).unwrap();
        assert_eq!(event.status, EventStatus::Unknown);
        assert_eq!(event.status.bucket(), EventStatus::Draft);

        let event: Event = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert_eq!(event.status, EventStatus::Draft);
    }

    #[test]
    fn full_event_detection() {
        let mut event: Event = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert!(!event.is_full());

        event.max_participants = Some(10);
        event.tickets_count = Some(10);
        assert!(event.is_full());

        event.tickets_count = None;
        assert!(!event.is_full());
    }

    #[test]
    fn faculty_label() {
        let f = Faculty {
            id: 1,
            name: "Litere".into(),
            abbreviation: Some("FLSC".into()),
        };
        assert_eq!(f.label(), "FLSC — Litere");

        let f = Faculty {
            abbreviation: None,
            ..f
        };
        assert_eq!(f.label(), "Litere");
    }
}
