//! 登录 / 注册 / 登出

use crate::api::UniEventApi;
use crate::error::{ClientError, ClientErrorKind, ClientResult, FieldErrors};
use crate::request::HttpClient;
use crate::token::Identity;
use unievent_shared::protocol::{GoogleLoginRequest, ObtainTokenRequest, RegisterRequest};
use unievent_shared::{RegisteredUser, TokenPair};

/// 登录后的落地页
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landing {
    Events,
    OrganizerDashboard,
}

impl Landing {
    pub fn for_identity(identity: &Identity) -> Self {
        if identity.role.is_organizer() {
            Landing::OrganizerDashboard
        } else {
            Landing::Events
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Landing::Events => "/",
            Landing::OrganizerDashboard => "/organizer/dashboard",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub password2: String,
}

impl RegisterForm {
    /// 提交前的客户端检查，字段错误与后端格式一致
    pub fn validate(&self) -> ClientResult<RegisterRequest> {
        let mut errors = FieldErrors::new();
        let required = [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email", &self.email),
            ("password", &self.password),
            ("password2", &self.password2),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                errors.push(field, "Câmp obligatoriu.");
            }
        }
        let email = self.email.trim();
        if !email.is_empty() && !email.contains('@') {
            errors.push("email", "Adresă de email invalidă.");
        }
        if self.password != self.password2 {
            errors.push("password2", "Parolele nu se potrivesc.");
        }

        if !errors.is_empty() {
            return Err(ClientError::validation(errors));
        }

        Ok(RegisterRequest {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: email.to_string(),
            password: self.password.clone(),
            password2: self.password2.clone(),
        })
    }
}

pub struct AuthController<C> {
    api: UniEventApi<C>,
}

impl<C: HttpClient> AuthController<C> {
    pub fn new(api: UniEventApi<C>) -> Self {
        Self { api }
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Identity> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ClientError::invalid_field(
                "email",
                "Completează emailul și parola.",
            ));
        }

        let pair = self
            .api
            .send(&ObtainTokenRequest {
                email: email.trim().to_string(),
                password: password.to_string(),
            })
            .await
            .map_err(|e| match e.kind {
                ClientErrorKind::Authentication | ClientErrorKind::Validation => {
                    e.with_message("Email sau parolă incorectă!")
                }
                _ => e,
            })
            .map_err(|e| e.in_op("auth.login"))?;

        self.establish(pair).map_err(|e| e.in_op("auth.login"))
    }

    /// 用 Google 返回的 credential 换取本地令牌
    pub async fn google_login(&self, credential: &str) -> ClientResult<Identity> {
        let pair = self
            .api
            .send(&GoogleLoginRequest {
                token: credential.to_string(),
            })
            .await
            .map_err(|e| {
                e.with_message("Autentificarea cu Google a eșuat.")
                    .in_op("auth.google_login")
            })?;

        self.establish(pair).map_err(|e| e.in_op("auth.google_login"))
    }

    /// 注册不会自动登录
    pub async fn register(&self, form: &RegisterForm) -> ClientResult<RegisteredUser> {
        let request = form.validate().map_err(|e| e.in_op("auth.register"))?;
        let user = self
            .api
            .send(&request)
            .await
            .map_err(|e| e.in_op("auth.register"))?;
        tracing::info!(email = %user.email, "account registered");
        Ok(user)
    }

    pub fn logout(&self) {
        self.api.session().clear();
    }

    fn establish(&self, pair: TokenPair) -> ClientResult<Identity> {
        let identity = match Identity::from_token(&pair.access) {
            Ok(identity) => identity,
            Err(err) => {
                self.api.session().clear();
                return Err(err.into());
            }
        };
        self.api.session().set_tokens(&pair);
        tracing::info!(email = %identity.email, role = ?identity.role, "logged in");
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::Harness;
    use crate::request::HttpMethod;
    use crate::session::TokenStore;
    use crate::token::testing::token;
    use chrono::{Duration, Utc};
    use serde_json::json;

    #[tokio::test]
    async fn login_stores_tokens_and_lands_by_role() {
        let h = Harness::new();
        let access = token(Utc::now() + Duration::minutes(5), true);
        h.client.mock_response(
            HttpMethod::Post,
            "/api/token/",
            200,
            json!({"access": access, "refresh": "r"}),
        );

        let auth = AuthController::new(h.api.clone());
        let identity = auth.login(" ana@usv.ro ", "secret").await.unwrap();

        assert_eq!(Landing::for_identity(&identity), Landing::OrganizerDashboard);
        assert_eq!(h.store.get("access").as_deref(), Some(access.as_str()));
        assert_eq!(h.store.get("refresh").as_deref(), Some("r"));
        assert_eq!(
            h.client.last().unwrap().body_json(),
            json!({"email": "ana@usv.ro", "password": "secret"})
        );
    }

    #[tokio::test]
    async fn wrong_credentials() {
        let h = Harness::new();
        h.client.mock_response(
            HttpMethod::Post,
            "/api/token/",
            401,
            json!({"detail": "No active account found with the given credentials"}),
        );

        let auth = AuthController::new(h.api.clone());
        let err = auth.login("ana@usv.ro", "wrong").await.unwrap_err();
        assert_eq!(err.message(), "Email sau parolă incorectă!");
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn undecodable_token_is_not_stored() {
        let h = Harness::new();
        h.client.mock_response(
            HttpMethod::Post,
            "/api/users/google/",
            200,
            json!({"access": "garbage", "refresh": "r"}),
        );

        let auth = AuthController::new(h.api.clone());
        let err = auth.google_login("google-credential").await.unwrap_err();
        assert_eq!(err.kind, ClientErrorKind::Decode);
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn register_checks_passwords_before_sending() {
        let h = Harness::new();
        let auth = AuthController::new(h.api.clone());
        let form = RegisterForm {
            first_name: "Ana".into(),
            last_name: "Pop".into(),
            email: "ana@usv.ro".into(),
            password: "parola123".into(),
            password2: "parola321".into(),
        };

        let err = auth.register(&form).await.unwrap_err();
        assert_eq!(err.field_errors().field("password2"), ["Parolele nu se potrivesc."]);
        assert!(h.client.requests().is_empty());
    }

    #[tokio::test]
    async fn register_surfaces_backend_field_errors() {
        let h = Harness::new();
        h.client.mock_response(
            HttpMethod::Post,
            "/api/users/register/",
            400,
            json!({"email": ["user with this email already exists."]}),
        );

        let auth = AuthController::new(h.api.clone());
        let form = RegisterForm {
            first_name: "Ana".into(),
            last_name: "Pop".into(),
            email: "ana@usv.ro".into(),
            password: "parola123".into(),
            password2: "parola123".into(),
        };

        let err = auth.register(&form).await.unwrap_err();
        assert_eq!(err.kind, ClientErrorKind::Validation);
        assert_eq!(
            err.field_errors().field("email"),
            ["user with this email already exists."]
        );
        // 注册不登录
        assert!(h.store.is_empty());
    }

    #[test]
    fn register_form_reports_every_missing_field() {
        let err = RegisterForm::default().validate().unwrap_err();
        for field in ["first_name", "last_name", "email", "password", "password2"] {
            assert!(!err.field_errors().field(field).is_empty(), "{field}");
        }
    }

    #[tokio::test]
    async fn logout_clears_the_store() {
        let h = Harness::logged_in("a", "r");
        AuthController::new(h.api.clone()).logout();
        assert!(h.store.is_empty());
    }
}
