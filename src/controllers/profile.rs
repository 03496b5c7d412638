use crate::api::UniEventApi;
use crate::controllers::page_message;
use crate::error::{ClientError, ClientErrorKind, ClientResult};
use crate::request::HttpClient;
use unievent_shared::protocol::{
    ChangePasswordRequest, CreateOrganizerRequest, MyOrganizerRequest, ProfileRequest,
};
use unievent_shared::{OrganizerRequest, User};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PasswordForm {
    pub old_password: String,
    pub new_password: String,
    pub new_password2: String,
}

impl PasswordForm {
    pub fn validate(&self) -> ClientResult<ChangePasswordRequest> {
        if [&self.old_password, &self.new_password, &self.new_password2]
            .iter()
            .any(|v| v.is_empty())
        {
            return Err(ClientError::rejected("Completează toate câmpurile."));
        }
        if self.new_password != self.new_password2 {
            return Err(ClientError::invalid_field(
                "new_password2",
                "Parolele noi nu se potrivesc.",
            ));
        }
        Ok(ChangePasswordRequest {
            old_password: self.old_password.clone(),
            new_password: self.new_password.clone(),
            new_password2: self.new_password2.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrganizerForm {
    pub organization_name: String,
    pub details: String,
}

pub struct ProfileController<C> {
    api: UniEventApi<C>,
}

impl<C: HttpClient> ProfileController<C> {
    pub fn new(api: UniEventApi<C>) -> Self {
        Self { api }
    }

    pub async fn load_profile(&self) -> ClientResult<User> {
        self.api.send(&ProfileRequest).await.map_err(|e| {
            let message = page_message(&e, "Nu am putut încărca profilul.");
            e.with_message(message).in_op("profile.load")
        })
    }

    /// 成功时返回后端提示
    pub async fn change_password(&self, form: &PasswordForm) -> ClientResult<String> {
        let request = form.validate().map_err(|e| e.in_op("profile.change_password"))?;
        let reply = self.api.send(&request).await.map_err(|e| {
            let message = page_message(&e, "Nu am putut schimba parola.");
            e.with_message(message).in_op("profile.change_password")
        })?;

        tracing::info!("password changed");
        Ok(reply
            .detail
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| "Parola a fost schimbată.".to_string()))
    }

    pub async fn submit_organizer_request(
        &self,
        form: &OrganizerForm,
    ) -> ClientResult<OrganizerRequest> {
        let op = "profile.organizer_request";
        let organization_name = form.organization_name.trim();
        if organization_name.is_empty() {
            return Err(ClientError::invalid_field(
                "organization_name",
                "Completează numele organizației.",
            )
            .in_op(op));
        }

        self.api
            .send(&CreateOrganizerRequest {
                organization_name: organization_name.to_string(),
                details: form.details.trim().to_string(),
            })
            .await
            .map_err(|e| {
                let message = page_message(&e, "Nu am putut trimite cererea.");
                e.with_message(message).in_op(op)
            })
    }

    /// 404 表示还没有提交过申请
    pub async fn my_organizer_request(&self) -> ClientResult<Option<OrganizerRequest>> {
        match self.api.send(&MyOrganizerRequest).await {
            Ok(request) => Ok(Some(request)),
            Err(e) if e.kind == ClientErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.in_op("profile.my_organizer_request")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::Harness;
    use crate::request::HttpMethod;
    use serde_json::json;

    fn form(old: &str, new: &str, new2: &str) -> PasswordForm {
        PasswordForm {
            old_password: old.into(),
            new_password: new.into(),
            new_password2: new2.into(),
        }
    }

    #[tokio::test]
    async fn password_client_checks() {
        let h = Harness::logged_in("a", "r");
        let ctl = ProfileController::new(h.api.clone());

        let err = ctl.change_password(&form("", "x", "x")).await.unwrap_err();
        assert_eq!(err.message(), "Completează toate câmpurile.");

        let err = ctl.change_password(&form("o", "x", "y")).await.unwrap_err();
        assert_eq!(err.kind, ClientErrorKind::Validation);
        assert_eq!(
            err.field_errors().field("new_password2"),
            ["Parolele noi nu se potrivesc."]
        );
        assert!(h.client.requests().is_empty());
    }

    #[tokio::test]
    async fn password_changed() {
        let h = Harness::logged_in("a", "r");
        h.client.mock_response(
            HttpMethod::Post,
            "/api/users/change-password/",
            200,
            json!({}),
        );

        let ctl = ProfileController::new(h.api.clone());
        let message = ctl.change_password(&form("o", "n", "n")).await.unwrap();
        assert_eq!(message, "Parola a fost schimbată.");
        assert_eq!(
            h.client.last().unwrap().body_json(),
            json!({"old_password": "o", "new_password": "n", "new_password2": "n"})
        );
    }

    #[tokio::test]
    async fn wrong_old_password_keeps_backend_message() {
        let h = Harness::logged_in("a", "r");
        h.client.mock_response(
            HttpMethod::Post,
            "/api/users/change-password/",
            400,
            json!({"old_password": ["Parola veche este greșită."]}),
        );

        let ctl = ProfileController::new(h.api.clone());
        let err = ctl.change_password(&form("o", "n", "n")).await.unwrap_err();
        assert_eq!(
            err.field_errors().field("old_password"),
            ["Parola veche este greșită."]
        );
    }

    #[tokio::test]
    async fn organizer_request_needs_a_name() {
        let h = Harness::logged_in("a", "r");
        let ctl = ProfileController::new(h.api.clone());
        let err = ctl
            .submit_organizer_request(&OrganizerForm {
                organization_name: "   ".into(),
                details: String::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Completează numele organizației.");
        assert!(h.client.requests().is_empty());
    }

    #[tokio::test]
    async fn organizer_request_roundtrip() {
        let h = Harness::logged_in("a", "r");
        h.client.mock_response(
            HttpMethod::Post,
            "/api/users/organizer-request/",
            201,
            json!({"id": 4, "organization_name": "LSUSV", "status": "pending"}),
        );

        let ctl = ProfileController::new(h.api.clone());
        assert_eq!(ctl.my_organizer_request().await.unwrap(), None);

        let request = ctl
            .submit_organizer_request(&OrganizerForm {
                organization_name: " LSUSV ".into(),
                details: "Liga studenților".into(),
            })
            .await
            .unwrap();
        assert_eq!(request.status, "pending");
        assert_eq!(h.client.last().unwrap().body_json()["organization_name"], "LSUSV");
    }

    #[tokio::test]
    async fn profile_loads() {
        let h = Harness::logged_in("a", "r");
        h.client.mock_response(
            HttpMethod::Get,
            "/api/users/profile/",
            200,
            json!({"id": 1, "email": "ana@usv.ro", "first_name": "Ana", "last_name": "Pop"}),
        );
        let user = ProfileController::new(h.api.clone()).load_profile().await.unwrap();
        assert_eq!(user.display_name(), "Ana Pop");
    }
}
