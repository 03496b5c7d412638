use crate::{
    Category, CheckinResult, Department, Detail, Event, EventId, EventStats, EventStatus,
    Faculty, Favorite, FavoriteId, OrganizerRequest, RefreshedToken, RegisteredUser, Review,
    Ticket, TicketId, TicketReceipt, TokenPair, User,
};
use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// HTTP Methods for API Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether the request body carries the serialized request.
    pub fn carries_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

/// A trait that defines the request-response relationship and metadata for an API endpoint.
///
/// Path parameters are struct fields marked `#[serde(skip)]`, so only the
/// remaining fields end up in the JSON body.
pub trait ApiRequest: Serialize {
    /// The response type returned by this request.
    type Response: DeserializeOwned;
    /// The HTTP method.
    const METHOD: HttpMethod;
    /// The URL path, relative to the API base URL.
    fn path(&self) -> String;
    /// Query string parameters (already filtered, values unencoded).
    fn query(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
    /// Files sent alongside the body. A non-empty list switches the request
    /// from JSON to `multipart/form-data`.
    fn attachments(&self) -> Vec<(&'static str, &FileUpload)> {
        Vec::new()
    }
}

/// A file picked in the browser, held in memory until upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

macro_rules! fixed_path {
    ($path:expr) => {
        fn path(&self) -> String {
            $path.to_string()
        }
    };
}

// =========================================================
// Authentication
// =========================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObtainTokenRequest {
    pub email: String,
    pub password: String,
}

impl ApiRequest for ObtainTokenRequest {
    type Response = TokenPair;
    const METHOD: HttpMethod = HttpMethod::Post;
    fixed_path!("/api/token/");
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh: String,
}

impl ApiRequest for RefreshTokenRequest {
    type Response = RefreshedToken;
    const METHOD: HttpMethod = HttpMethod::Post;
    fixed_path!("/api/token/refresh/");
}

/// Exchange a Google ID token for a local token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleLoginRequest {
    pub token: String,
}

impl ApiRequest for GoogleLoginRequest {
    type Response = TokenPair;
    const METHOD: HttpMethod = HttpMethod::Post;
    fixed_path!("/api/users/google/");
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub password2: String,
}

impl ApiRequest for RegisterRequest {
    type Response = RegisteredUser;
    const METHOD: HttpMethod = HttpMethod::Post;
    fixed_path!("/api/users/register/");
}

// =========================================================
// Profile
// =========================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRequest;

impl ApiRequest for ProfileRequest {
    type Response = User;
    const METHOD: HttpMethod = HttpMethod::Get;
    fixed_path!("/api/users/profile/");
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub new_password2: String,
}

impl ApiRequest for ChangePasswordRequest {
    type Response = Detail;
    const METHOD: HttpMethod = HttpMethod::Post;
    fixed_path!("/api/users/change-password/");
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateOrganizerRequest {
    pub organization_name: String,
    pub details: String,
}

impl ApiRequest for CreateOrganizerRequest {
    type Response = OrganizerRequest;
    const METHOD: HttpMethod = HttpMethod::Post;
    fixed_path!("/api/users/organizer-request/");
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MyOrganizerRequest;

impl ApiRequest for MyOrganizerRequest {
    type Response = OrganizerRequest;
    const METHOD: HttpMethod = HttpMethod::Get;
    fixed_path!("/api/users/organizer-request/me/");
}

// =========================================================
// Events
// =========================================================

/// Public event list with the filters the backend understands.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ListEventsRequest {
    #[serde(skip)]
    pub search: Option<String>,
    #[serde(skip)]
    pub faculty: Option<u64>,
    #[serde(skip)]
    pub category: Option<u64>,
}

impl ApiRequest for ListEventsRequest {
    type Response = Vec<Event>;
    const METHOD: HttpMethod = HttpMethod::Get;
    fixed_path!("/api/events/");

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        if let Some(faculty) = self.faculty {
            params.push(("faculty", faculty.to_string()));
        }
        if let Some(category) = self.category {
            params.push(("category", category.to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetEventRequest {
    #[serde(skip)]
    pub id: EventId,
}

impl ApiRequest for GetEventRequest {
    type Response = Event;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        format!("/api/events/{}/", self.id)
    }
}

/// Write-side event shape (create and draft update).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EventPayload {
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
    pub status: EventStatus,
}

/// Cover image and attached document of an event; both optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFiles {
    pub image: Option<FileUpload>,
    pub file: Option<FileUpload>,
}

impl EventFiles {
    pub fn parts(&self) -> Vec<(&'static str, &FileUpload)> {
        let mut parts = Vec::new();
        if let Some(image) = &self.image {
            parts.push(("image", image));
        }
        if let Some(file) = &self.file {
            parts.push(("file", file));
        }
        parts
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    #[serde(flatten)]
    pub payload: EventPayload,
    #[serde(skip)]
    pub files: EventFiles,
}

impl ApiRequest for CreateEventRequest {
    type Response = IgnoredAny;
    const METHOD: HttpMethod = HttpMethod::Post;
    fixed_path!("/api/events/");

    fn attachments(&self) -> Vec<(&'static str, &FileUpload)> {
        self.files.parts()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    #[serde(skip)]
    pub id: EventId,
    #[serde(flatten)]
    pub payload: EventPayload,
    #[serde(skip)]
    pub files: EventFiles,
}

impl ApiRequest for UpdateEventRequest {
    type Response = IgnoredAny;
    const METHOD: HttpMethod = HttpMethod::Patch;

    fn path(&self) -> String {
        format!("/api/events/{}/", self.id)
    }

    fn attachments(&self) -> Vec<(&'static str, &FileUpload)> {
        self.files.parts()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteEventRequest {
    #[serde(skip)]
    pub id: EventId,
}

impl ApiRequest for DeleteEventRequest {
    type Response = ();
    const METHOD: HttpMethod = HttpMethod::Delete;

    fn path(&self) -> String {
        format!("/api/events/{}/", self.id)
    }
}

/// Events owned by the current organizer, every status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MyEventsRequest;

impl ApiRequest for MyEventsRequest {
    type Response = Vec<Event>;
    const METHOD: HttpMethod = HttpMethod::Get;
    fixed_path!("/api/events/my/");
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventStatsRequest {
    #[serde(skip)]
    pub id: EventId,
}

impl ApiRequest for EventStatsRequest {
    type Response = EventStats;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        format!("/api/events/{}/stats/", self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFacultiesRequest;

impl ApiRequest for ListFacultiesRequest {
    type Response = Vec<Faculty>;
    const METHOD: HttpMethod = HttpMethod::Get;
    fixed_path!("/api/events/faculties/");
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDepartmentsRequest;

impl ApiRequest for ListDepartmentsRequest {
    type Response = Vec<Department>;
    const METHOD: HttpMethod = HttpMethod::Get;
    fixed_path!("/api/events/departments/");
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListCategoriesRequest;

impl ApiRequest for ListCategoriesRequest {
    type Response = Vec<Category>;
    const METHOD: HttpMethod = HttpMethod::Get;
    fixed_path!("/api/events/categories/");
}

// =========================================================
// Interactions
// =========================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFavoritesRequest;

impl ApiRequest for ListFavoritesRequest {
    type Response = Vec<Favorite>;
    const METHOD: HttpMethod = HttpMethod::Get;
    fixed_path!("/api/interactions/favorites/");
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddFavoriteRequest {
    pub event_id: EventId,
}

impl ApiRequest for AddFavoriteRequest {
    type Response = Favorite;
    const METHOD: HttpMethod = HttpMethod::Post;
    fixed_path!("/api/interactions/favorites/");
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveFavoriteRequest {
    #[serde(skip)]
    pub favorite_id: FavoriteId,
}

impl ApiRequest for RemoveFavoriteRequest {
    type Response = ();
    const METHOD: HttpMethod = HttpMethod::Delete;

    fn path(&self) -> String {
        format!("/api/interactions/favorites/{}/", self.favorite_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTicketsRequest;

impl ApiRequest for ListTicketsRequest {
    type Response = Vec<Ticket>;
    const METHOD: HttpMethod = HttpMethod::Get;
    fixed_path!("/api/interactions/tickets/");
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyTicketRequest {
    pub event_id: EventId,
}

impl ApiRequest for BuyTicketRequest {
    type Response = TicketReceipt;
    const METHOD: HttpMethod = HttpMethod::Post;
    fixed_path!("/api/interactions/tickets/buy/");
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelTicketRequest {
    #[serde(skip)]
    pub ticket_id: TicketId,
}

impl ApiRequest for CancelTicketRequest {
    type Response = ();
    const METHOD: HttpMethod = HttpMethod::Delete;

    fn path(&self) -> String {
        format!("/api/interactions/tickets/{}/", self.ticket_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinRequest {
    pub event_id: EventId,
    pub qr_code_data: String,
}

impl ApiRequest for CheckinRequest {
    type Response = CheckinResult;
    const METHOD: HttpMethod = HttpMethod::Post;
    fixed_path!("/api/interactions/tickets/checkin/");
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReviewRequest {
    pub event_id: EventId,
    pub rating: u8,
    pub comment: String,
}

impl ApiRequest for CreateReviewRequest {
    type Response = Review;
    const METHOD: HttpMethod = HttpMethod::Post;
    fixed_path!("/api/interactions/reviews/");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_events_query_skips_empty_filters() {
        let req = ListEventsRequest {
            search: Some("  hack ".into()),
            faculty: Some(2),
            category: None,
        };
        assert_eq!(
            req.query(),
            vec![("search", "hack".to_string()), ("faculty", "2".to_string())]
        );

        let req = ListEventsRequest {
            search: Some("   ".into()),
            ..Default::default()
        };
        assert!(req.query().is_empty());
    }

    #[test]
    fn path_params_stay_out_of_the_body() {
        let req = RemoveFavoriteRequest { favorite_id: 42 };
        assert_eq!(req.path(), "/api/interactions/favorites/42/");
        assert_eq!(serde_json::to_string(&req).unwrap(), "{}");

        let req = UpdateEventRequest {
            id: 9,
            payload: EventPayload {
                title: "Draft".into(),
                ..Default::default()
            },
            files: EventFiles::default(),
        };
        assert_eq!(req.path(), "/api/events/9/");
        let body = serde_json::to_value(&req).unwrap();
        assert!(body.get("id").is_none());
        assert_eq!(body["title"], "Draft");
        assert_eq!(body["status"], "draft");
    }

    #[test]
    fn event_files_become_attachments_in_order() {
        let req = CreateEventRequest {
            payload: EventPayload::default(),
            files: EventFiles {
                image: Some(FileUpload::new("cover.png", "image/png", vec![1, 2])),
                file: Some(FileUpload::new("agenda.pdf", "application/pdf", vec![3])),
            },
        };
        let names: Vec<_> = req
            .attachments()
            .iter()
            .map(|(name, f)| (*name, f.file_name.as_str()))
            .collect();
        assert_eq!(names, [("image", "cover.png"), ("file", "agenda.pdf")]);
        assert!(serde_json::to_value(&req).unwrap().get("image").is_none());

        let bare = CreateEventRequest {
            payload: EventPayload::default(),
            files: EventFiles::default(),
        };
        assert!(bare.attachments().is_empty());
    }

    #[test]
    fn only_writes_carry_a_body() {
        assert!(HttpMethod::Post.carries_body());
        assert!(HttpMethod::Patch.carries_body());
        assert!(!HttpMethod::Get.carries_body());
        assert!(!HttpMethod::Delete.carries_body());
    }
}
