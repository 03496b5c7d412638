//! 组织者面板：我的活动、创建与编辑草稿

use crate::api::UniEventApi;
use crate::clock::Clock;
use crate::controllers::page_message;
use crate::error::{ClientError, ClientResult, FieldErrors};
use crate::request::HttpClient;
use chrono::{DateTime, Utc};
use std::rc::Rc;
use unievent_shared::protocol::{
    CreateEventRequest, DeleteEventRequest, EventFiles, EventPayload, FileUpload, MyEventsRequest,
    UpdateEventRequest,
};
use unievent_shared::{Event, EventStatus};

const MIN_TEXT_LEN: usize = 5;

// =========================================================
// 按状态分组
// =========================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusGroups {
    pub draft: Vec<Event>,
    pub pending: Vec<Event>,
    pub published: Vec<Event>,
    pub rejected: Vec<Event>,
}

impl StatusGroups {
    /// 未知状态归入草稿
    pub fn from_events(events: Vec<Event>) -> Self {
        let mut groups = Self::default();
        for event in events {
            match event.status.bucket() {
                EventStatus::Pending => groups.pending.push(event),
                EventStatus::Published => groups.published.push(event),
                EventStatus::Rejected => groups.rejected.push(event),
                EventStatus::Draft | EventStatus::Unknown => groups.draft.push(event),
            }
        }
        groups
    }

    pub fn sections(&self) -> [(&'static str, &[Event]); 4] {
        [
            ("Draft-uri (în lucru)", &self.draft),
            ("În așteptare validare", &self.pending),
            ("Publicate", &self.published),
            ("Respinse", &self.rejected),
        ]
    }

    pub fn total(&self) -> usize {
        self.draft.len() + self.pending.len() + self.published.len() + self.rejected.len()
    }
}

// =========================================================
// 活动表单
// =========================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub faculty: Option<u64>,
    pub department: Option<u64>,
    pub category: Option<u64>,
    pub location_name: String,
    pub location_address: String,
    pub google_maps_link: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub max_participants: Option<u32>,
    /// 新选的封面图；编辑时不选就保留服务器上的
    pub image: Option<FileUpload>,
    pub file: Option<FileUpload>,
}

impl EventDraft {
    /// 编辑已有草稿时回填表单
    pub fn from_event(event: &Event) -> Self {
        let location = event.location.as_ref();
        Self {
            title: event.title.clone(),
            description: event.description.clone(),
            faculty: event.faculty.as_ref().map(|f| f.id),
            department: event.department.as_ref().map(|d| d.id),
            category: event.category.as_ref().map(|c| c.id),
            location_name: location.map(|l| l.name.clone()).unwrap_or_default(),
            location_address: location.map(|l| l.address.clone()).unwrap_or_default(),
            google_maps_link: location.map(|l| l.google_maps_link.clone()).unwrap_or_default(),
            start_date: event.start_date,
            end_date: event.end_date,
            max_participants: event.max_participants,
            image: None,
            file: None,
        }
    }

    /// 与后端一致的校验：提交审核（pending）时要求完整信息
    pub fn validate(&self, status: EventStatus, now: DateTime<Utc>) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.max_participants.is_some_and(|max| max < 1) {
            errors.push("max_participants", "Numărul de participanți trebuie să fie cel puțin 1.");
        }

        if status == EventStatus::Pending {
            if self.title.trim().chars().count() < MIN_TEXT_LEN {
                errors.push("title", "Titlul trebuie să aibă cel puțin 5 caractere.");
            }
            if self.description.trim().chars().count() < MIN_TEXT_LEN {
                errors.push("description", "Descrierea trebuie să aibă cel puțin 5 caractere.");
            }
            if self.category.is_none() {
                errors.push("category", "Categoria este obligatorie pentru trimitere la validare.");
            }
            if self.location_name.trim().is_empty() {
                errors.push("location_name", "Numele locației este obligatoriu.");
            }
            if self.location_address.trim().is_empty() {
                errors.push(
                    "location_address",
                    "Adresa locației este obligatorie pentru trimitere la validare.",
                );
            }
            match self.start_date {
                None => errors.push("start_date", "Data de început este obligatorie."),
                Some(start) if start < now => {
                    errors.push("start_date", "Data de început nu poate fi în trecut.")
                }
                Some(_) => {}
            }
            match (self.start_date, self.end_date) {
                (_, None) => errors.push("end_date", "Data de sfârșit este obligatorie."),
                (Some(start), Some(end)) if end <= start => errors.push(
                    "end_date",
                    "Data de sfârșit trebuie să fie după data de început.",
                ),
                _ => {}
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    pub fn to_payload(&self, status: EventStatus) -> EventPayload {
        EventPayload {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            faculty: self.faculty,
            department: self.department,
            category: self.category,
            location_name: self.location_name.trim().to_string(),
            location_address: self.location_address.trim().to_string(),
            google_maps_link: self.google_maps_link.trim().to_string(),
            start_date: self.start_date,
            end_date: self.end_date,
            max_participants: self.max_participants,
            status,
        }
    }

    pub fn files(&self) -> EventFiles {
        EventFiles {
            image: self.image.clone(),
            file: self.file.clone(),
        }
    }
}

// =========================================================
// 控制器
// =========================================================

pub struct OrganizerController<C> {
    api: UniEventApi<C>,
    clock: Rc<dyn Clock>,
}

impl<C: HttpClient> OrganizerController<C> {
    pub fn new(api: UniEventApi<C>, clock: Rc<dyn Clock>) -> Self {
        Self { api, clock }
    }

    pub async fn load_mine(&self) -> ClientResult<Vec<Event>> {
        self.api.send(&MyEventsRequest).await.map_err(|e| {
            let message = page_message(&e, "Nu am putut încărca evenimentele tale.");
            e.with_message(message).in_op("organizer.load")
        })
    }

    pub async fn load_groups(&self) -> ClientResult<StatusGroups> {
        Ok(StatusGroups::from_events(self.load_mine().await?))
    }

    /// 新建活动，`status` 只能是草稿或待审核
    pub async fn create(&self, draft: &EventDraft, status: EventStatus) -> ClientResult<()> {
        let status = submit_status(status)?;
        draft
            .validate(status, self.clock.now())
            .map_err(|e| ClientError::validation(e).in_op("organizer.create"))?;

        self.api
            .send(&CreateEventRequest {
                payload: draft.to_payload(status),
                files: draft.files(),
            })
            .await
            .map_err(|e| e.in_op("organizer.create"))?;

        tracing::info!(status = status.as_str(), "event created");
        Ok(())
    }

    /// 只有草稿可以编辑
    pub async fn update_draft(
        &self,
        event: &Event,
        draft: &EventDraft,
        status: EventStatus,
    ) -> ClientResult<()> {
        let op = "organizer.update_draft";
        ensure_draft(event).map_err(|e| e.in_op_with(op, event.id.to_string()))?;
        let status = submit_status(status)?;
        draft
            .validate(status, self.clock.now())
            .map_err(|e| ClientError::validation(e).in_op_with(op, event.id.to_string()))?;

        self.api
            .send(&UpdateEventRequest {
                id: event.id,
                payload: draft.to_payload(status),
                files: draft.files(),
            })
            .await
            .map_err(|e| e.in_op_with(op, event.id.to_string()))?;
        Ok(())
    }

    /// 删除草稿后重新拉取列表
    pub async fn delete_draft(&self, event: &Event) -> ClientResult<StatusGroups> {
        let op = "organizer.delete_draft";
        ensure_draft(event).map_err(|e| e.in_op_with(op, event.id.to_string()))?;

        self.api
            .send(&DeleteEventRequest { id: event.id })
            .await
            .map_err(|e| {
                e.with_message("Nu s-a putut șterge draft-ul.")
                    .in_op_with(op, event.id.to_string())
            })?;

        tracing::info!(event = event.id, "draft deleted");
        self.load_groups().await
    }
}

fn ensure_draft(event: &Event) -> ClientResult<()> {
    if event.status.bucket() == EventStatus::Draft {
        Ok(())
    } else {
        Err(ClientError::rejected("Doar draft-urile pot fi modificate."))
    }
}

fn submit_status(status: EventStatus) -> ClientResult<EventStatus> {
    match status {
        EventStatus::Draft | EventStatus::Pending => Ok(status),
        _ => Err(ClientError::rejected(
            "Evenimentul poate fi salvat doar ca draft sau trimis la validare.",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::Harness;
    use crate::clock::FixedClock;
    use crate::error::ClientErrorKind;
    use crate::request::{HttpMethod, MockHttpClient, PartValue};
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0).unwrap()
    }

    fn controller(h: &Harness) -> OrganizerController<MockHttpClient> {
        OrganizerController::new(h.api.clone(), Rc::new(FixedClock::at(now())))
    }

    fn complete_draft() -> EventDraft {
        EventDraft {
            title: "Zilele Carierei".into(),
            description: "Întâlniri cu angajatori".into(),
            category: Some(2),
            location_name: "Aula".into(),
            location_address: "Str. Universității 13".into(),
            start_date: Some(now() + Duration::days(3)),
            end_date: Some(now() + Duration::days(3) + Duration::hours(4)),
            max_participants: Some(100),
            ..Default::default()
        }
    }

    fn event(id: u64, status: &str) -> Event {
        serde_json::from_value(json!({"id": id, "status": status})).unwrap()
    }

    #[test]
    fn grouping_buckets_unknown_as_draft() {
        let groups = StatusGroups::from_events(vec![
            event(1, "draft"),
            event(2, "pending"),
            event(3, "published"),
            event(4, "rejected"),
            event(5, "archived"),
        ]);
        let ids = |v: &[Event]| v.iter().map(|e| e.id).collect::<Vec<_>>();
        assert_eq!(ids(&groups.draft), vec![1, 5]);
        assert_eq!(ids(&groups.pending), vec![2]);
        assert_eq!(ids(&groups.published), vec![3]);
        assert_eq!(ids(&groups.rejected), vec![4]);
        assert_eq!(groups.total(), 5);
    }

    #[test]
    fn draft_needs_only_valid_capacity() {
        let draft = EventDraft {
            max_participants: Some(0),
            ..Default::default()
        };
        let errors = draft.validate(EventStatus::Draft, now()).unwrap_err();
        assert_eq!(errors.fields().count(), 1);
        assert!(!errors.field("max_participants").is_empty());

        assert!(EventDraft::default().validate(EventStatus::Draft, now()).is_ok());
    }

    #[test]
    fn pending_requires_complete_event() {
        let errors = EventDraft::default()
            .validate(EventStatus::Pending, now())
            .unwrap_err();
        for field in [
            "title",
            "description",
            "category",
            "location_name",
            "location_address",
            "start_date",
            "end_date",
        ] {
            assert!(!errors.field(field).is_empty(), "{field}");
        }

        let mut draft = complete_draft();
        assert!(draft.validate(EventStatus::Pending, now()).is_ok());

        draft.start_date = Some(now() - Duration::minutes(1));
        let errors = draft.validate(EventStatus::Pending, now()).unwrap_err();
        assert_eq!(errors.field("start_date"), ["Data de început nu poate fi în trecut."]);

        let mut draft = complete_draft();
        draft.end_date = draft.start_date;
        let errors = draft.validate(EventStatus::Pending, now()).unwrap_err();
        assert_eq!(
            errors.field("end_date"),
            ["Data de sfârșit trebuie să fie după data de început."]
        );
    }

    #[tokio::test]
    async fn create_posts_the_payload() {
        let h = Harness::logged_in("a", "r");
        h.client
            .mock_response(HttpMethod::Post, "/api/events/", 201, json!({"id": 11}));

        controller(&h)
            .create(&complete_draft(), EventStatus::Pending)
            .await
            .unwrap();

        let body = h.client.last().unwrap().body_json();
        assert_eq!(body["status"], "pending");
        assert_eq!(body["title"], "Zilele Carierei");
        assert_eq!(body["location_name"], "Aula");
        assert_eq!(body["max_participants"], 100);
    }

    #[tokio::test]
    async fn create_uploads_image_and_file_as_form() {
        let h = Harness::logged_in("a", "r");
        h.client
            .mock_response(HttpMethod::Post, "/api/events/", 201, json!({"id": 12}));

        let image = FileUpload::new("afis.jpg", "image/jpeg", vec![0xff, 0xd8]);
        let file = FileUpload::new("program.pdf", "application/pdf", b"%PDF".to_vec());
        let draft = EventDraft {
            image: Some(image.clone()),
            file: Some(file.clone()),
            ..complete_draft()
        };
        controller(&h).create(&draft, EventStatus::Draft).await.unwrap();

        let req = h.client.last().unwrap();
        let form = req.form().unwrap();
        assert_eq!(form.text_value("title"), Some("Zilele Carierei"));
        assert_eq!(form.text_value("status"), Some("draft"));
        assert_eq!(form.text_value("max_participants"), Some("100"));
        assert_eq!(form.get("image"), Some(&PartValue::File(image)));
        assert_eq!(form.get("file"), Some(&PartValue::File(file)));
        assert!(form.get("faculty").is_none());
    }

    #[tokio::test]
    async fn invalid_create_sends_nothing() {
        let h = Harness::logged_in("a", "r");
        let err = controller(&h)
            .create(&EventDraft::default(), EventStatus::Pending)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ClientErrorKind::Validation);
        assert!(h.client.requests().is_empty());

        let err = controller(&h)
            .create(&complete_draft(), EventStatus::Published)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ClientErrorKind::Rejected);
    }

    #[tokio::test]
    async fn only_drafts_are_editable() {
        let h = Harness::logged_in("a", "r");
        let published = event(3, "published");

        let err = controller(&h)
            .update_draft(&published, &complete_draft(), EventStatus::Draft)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ClientErrorKind::Rejected);

        let err = controller(&h).delete_draft(&published).await.unwrap_err();
        assert_eq!(err.kind, ClientErrorKind::Rejected);
        assert!(h.client.requests().is_empty());
    }

    #[tokio::test]
    async fn update_draft_patches() {
        let h = Harness::logged_in("a", "r");
        h.client
            .mock_response(HttpMethod::Patch, "/api/events/1/", 200, json!({"id": 1}));

        let draft = EventDraft {
            title: "Nou".into(),
            ..Default::default()
        };
        controller(&h)
            .update_draft(&event(1, "draft"), &draft, EventStatus::Draft)
            .await
            .unwrap();

        let req = h.client.last().unwrap();
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.body_json()["title"], "Nou");
        assert!(req.form().is_none());
    }

    #[tokio::test]
    async fn delete_draft_refetches() {
        let h = Harness::logged_in("a", "r");
        h.client.mock_empty(HttpMethod::Delete, "/api/events/1/", 204);
        h.client.mock_response(
            HttpMethod::Get,
            "/api/events/my/",
            200,
            json!([{"id": 2, "status": "published"}]),
        );

        let groups = controller(&h).delete_draft(&event(1, "draft")).await.unwrap();
        assert!(groups.draft.is_empty());
        assert_eq!(groups.published.len(), 1);
        assert_eq!(h.client.count("/api/events/my/"), 1);
    }

    #[test]
    fn draft_roundtrips_from_event() {
        let event: Event = serde_json::from_value(json!({
            "id": 1,
            "title": "T",
            "category": {"id": 4, "name": "Sport"},
            "location": {"id": 9, "name": "Sala", "address": "Adr", "google_maps_link": "g"}
        }))
        .unwrap();
        let draft = EventDraft::from_event(&event);
        assert_eq!(draft.category, Some(4));
        assert_eq!(draft.location_address, "Adr");
        assert_eq!(draft.google_maps_link, "g");
    }
}
