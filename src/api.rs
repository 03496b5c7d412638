use crate::config::ClientConfig;
use crate::error::{ClientError, ClientErrorKind, ClientResult};
use crate::request::{HttpClient, HttpRequest, MultipartForm};
use crate::session::Session;
use std::rc::Rc;
use unievent_shared::HEADER_AUTHORIZATION;
use unievent_shared::protocol::ApiRequest;

// =========================================================
// 导航抽象 (Navigator)
// =========================================================

/// 强制登出后的跳转目标由宿主决定（浏览器里是 `/auth`）
pub trait Navigator {
    fn redirect_to_login(&self);
}

/// 不做任何跳转（原生环境）
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn redirect_to_login(&self) {}
}

// =========================================================
// API 客户端
// =========================================================

/// 后端 API 客户端
///
/// - 有访问令牌就附加 `Authorization: Bearer <access>`，没有也照常发送
/// - 任何 401 响应都会清空会话并跳转到登录页（与发起请求的页面无关）
/// - 这一层不做刷新
pub struct UniEventApi<C> {
    client: C,
    config: Rc<ClientConfig>,
    session: Session,
    navigator: Rc<dyn Navigator>,
}

impl<C: Clone> Clone for UniEventApi<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            config: self.config.clone(),
            session: self.session.clone(),
            navigator: self.navigator.clone(),
        }
    }
}

impl<C: HttpClient> UniEventApi<C> {
    pub fn new(
        client: C,
        config: Rc<ClientConfig>,
        session: Session,
        navigator: Rc<dyn Navigator>,
    ) -> Self {
        Self {
            client,
            config,
            session,
            navigator,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn build<R: ApiRequest>(&self, req: &R) -> ClientResult<HttpRequest> {
        let mut url = self.config.url(&req.path());
        let query = req.query();
        if !query.is_empty() {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())))
                .finish();
            url.push('?');
            url.push_str(&encoded);
        }

        let mut http = HttpRequest::new(&url, R::METHOD).with_header("Accept", "application/json");

        if let Some(token) = self.session.access() {
            http = http.with_header(HEADER_AUTHORIZATION, &format!("Bearer {}", token));
        }

        if R::METHOD.carries_body() {
            let attachments = req.attachments();
            if attachments.is_empty() {
                http = http
                    .with_header("Content-Type", "application/json")
                    .with_body(serde_json::to_value(req)?);
            } else {
                // 带文件时走 multipart，Content-Type 留给传输层带上 boundary
                let mut form = MultipartForm::from_json_fields(serde_json::to_value(req)?)?;
                for (name, file) in attachments {
                    form = form.file(name, file.clone());
                }
                http = http.with_form(form);
            }
        }

        Ok(http)
    }

    /// 发送一个类型化请求
    pub async fn send<R: ApiRequest>(&self, req: &R) -> ClientResult<R::Response> {
        let path = req.path();
        let op = R::METHOD.as_str();

        let http = self.build(req).map_err(|e| e.in_op_with("api.build", &path))?;
        let resp = self
            .client
            .send(http)
            .await
            .map_err(|e| e.in_op_with(format!("api.{}", op), &path))?;

        if resp.status == 401 {
            self.force_logout(&path);
            return Err(ClientError::from_response(resp.status, &resp.body)
                .with_message("Sesiune expirată. Autentifică-te din nou.")
                .in_op_with(format!("api.{}", op), &path));
        }

        if !resp.is_success() {
            let err = ClientError::from_response(resp.status, &resp.body);
            tracing::warn!(status = resp.status, path = %path, code = err.error_code(), "request failed");
            return Err(err.in_op_with(format!("api.{}", op), &path));
        }

        resp.json::<R::Response>()
            .map_err(|e| e.in_op_with(format!("api.{}", op), &path))
    }

    /// 全局副作用：清空会话并跳转登录页
    fn force_logout(&self, path: &str) {
        tracing::warn!(path = %path, "received 401, logging out");
        self.session.clear();
        self.navigator.redirect_to_login();
    }
}

/// 401 已经被全局处理过时，页面只需要静默忽略
pub fn is_handled_globally(err: &ClientError) -> bool {
    err.kind == ClientErrorKind::Authentication && err.status() == Some(401)
}

// =========================================================
// 测试工具
// =========================================================

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::request::MockHttpClient;
    use crate::session::MemoryTokenStore;
    use std::cell::Cell;

    #[derive(Debug, Default)]
    pub struct RecordingNavigator {
        pub redirects: Cell<usize>,
    }

    impl Navigator for RecordingNavigator {
        fn redirect_to_login(&self) {
            self.redirects.set(self.redirects.get() + 1);
        }
    }

    /// 一组相互连通的测试替身
    pub struct Harness {
        pub api: UniEventApi<MockHttpClient>,
        pub client: MockHttpClient,
        pub store: MemoryTokenStore,
        pub navigator: Rc<RecordingNavigator>,
    }

    impl Harness {
        pub fn new() -> Self {
            let client = MockHttpClient::new();
            let store = MemoryTokenStore::new();
            let navigator = Rc::new(RecordingNavigator::default());
            let config = Rc::new(ClientConfig::default());
            let session = Session::new(Rc::new(store.clone()), &config);
            let api = UniEventApi::new(client.clone(), config, session, navigator.clone());
            Self {
                api,
                client,
                store,
                navigator,
            }
        }

        pub fn logged_in(access: &str, refresh: &str) -> Self {
            let harness = Self::new();
            harness.api.session().set_tokens(&unievent_shared::TokenPair {
                access: access.into(),
                refresh: refresh.into(),
            });
            harness
        }

        pub fn redirects(&self) -> usize {
            self.navigator.redirects.get()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use crate::request::HttpMethod;
    use crate::session::TokenStore;
    use serde_json::json;
    use crate::request::PartValue;
    use unievent_shared::protocol::{
        BuyTicketRequest, CreateEventRequest, DeleteEventRequest, EventFiles, EventPayload,
        FileUpload, ListEventsRequest, ListTicketsRequest,
    };

    #[tokio::test]
    async fn attaches_bearer_when_logged_in() {
        let h = Harness::logged_in("tok-a", "tok-r");
        h.client
            .mock_response(HttpMethod::Get, "/api/interactions/tickets/", 200, json!([]));

        let tickets = h.api.send(&ListTicketsRequest).await.unwrap();
        assert!(tickets.is_empty());

        let req = h.client.last().unwrap();
        assert_eq!(req.headers.get("Authorization").unwrap(), "Bearer tok-a");
        assert!(req.body.is_none());
    }

    #[tokio::test]
    async fn sends_without_token_when_absent() {
        let h = Harness::new();
        h.client.mock_response(HttpMethod::Get, "/api/events/", 200, json!([]));

        h.api.send(&ListEventsRequest::default()).await.unwrap();
        assert!(!h.client.last().unwrap().headers.contains_key("Authorization"));
    }

    #[tokio::test]
    async fn query_is_url_encoded() {
        let h = Harness::new();
        h.client.mock_response(
            HttpMethod::Get,
            "/api/events/?search=zi+deschisa&category=3",
            200,
            json!([]),
        );

        let req = ListEventsRequest {
            search: Some("zi deschisa".into()),
            category: Some(3),
            ..Default::default()
        };
        h.api.send(&req).await.unwrap();
        assert_eq!(
            h.client.last().unwrap().url,
            "http://localhost:8000/api/events/?search=zi+deschisa&category=3"
        );
    }

    #[tokio::test]
    async fn any_401_clears_session_and_redirects() {
        let h = Harness::logged_in("tok-a", "tok-r");
        h.client.mock_response(
            HttpMethod::Post,
            "/api/interactions/tickets/buy/",
            401,
            json!({"detail": "Given token not valid for any token type"}),
        );

        let err = h.api.send(&BuyTicketRequest { event_id: 7 }).await.unwrap_err();
        assert!(err.is_authentication());
        assert!(super::is_handled_globally(&err));
        assert!(h.store.get("access").is_none());
        assert!(h.store.get("refresh").is_none());
        assert_eq!(h.redirects(), 1);

        let body = h.client.last().unwrap().body_json();
        assert_eq!(body, json!({"event_id": 7}));
    }

    #[tokio::test]
    async fn attachments_switch_to_multipart() {
        let h = Harness::logged_in("tok-a", "tok-r");
        h.client
            .mock_response(HttpMethod::Post, "/api/events/", 201, json!({"id": 5}));

        let cover = FileUpload::new("cover.png", "image/png", vec![137, 80, 78, 71]);
        let req = CreateEventRequest {
            payload: EventPayload {
                title: "Gala".into(),
                category: Some(3),
                ..Default::default()
            },
            files: EventFiles {
                image: Some(cover.clone()),
                file: None,
            },
        };
        h.api.send(&req).await.unwrap();

        let sent = h.client.last().unwrap();
        assert_eq!(sent.headers.get("Authorization").unwrap(), "Bearer tok-a");
        assert!(!sent.headers.contains_key("Content-Type"));
        assert_eq!(sent.body_json(), serde_json::Value::Null);

        let form = sent.form().unwrap();
        assert_eq!(form.text_value("title"), Some("Gala"));
        assert_eq!(form.text_value("category"), Some("3"));
        assert_eq!(form.text_value("status"), Some("draft"));
        assert!(form.get("faculty").is_none());
        assert_eq!(form.get("image"), Some(&PartValue::File(cover)));
        assert!(form.get("file").is_none());
    }

    #[tokio::test]
    async fn other_errors_keep_the_session() {
        let h = Harness::logged_in("tok-a", "tok-r");
        h.client.mock_response(
            HttpMethod::Post,
            "/api/interactions/tickets/buy/",
            400,
            json!({"detail": "Nu mai sunt locuri."}),
        );
        h.client
            .mock_network_error(HttpMethod::Get, "/api/interactions/tickets/");

        let err = h.api.send(&BuyTicketRequest { event_id: 7 }).await.unwrap_err();
        assert_eq!(err.message(), "Nu mai sunt locuri.");
        assert_eq!(
            err.to_string(),
            "[VALIDATION] Nu mai sunt locuri. | trace: api.POST(/api/interactions/tickets/buy/)"
        );

        let err = h.api.send(&ListTicketsRequest).await.unwrap_err();
        assert_eq!(err.kind, crate::error::ClientErrorKind::Network);

        assert!(h.api.session().is_logged_in());
        assert_eq!(h.redirects(), 0);
    }

    #[tokio::test]
    async fn no_content_response_is_ok() {
        let h = Harness::logged_in("tok-a", "tok-r");
        h.client.mock_empty(HttpMethod::Delete, "/api/events/5/", 204);
        h.api.send(&DeleteEventRequest { id: 5 }).await.unwrap();
        assert_eq!(h.client.last().unwrap().method, HttpMethod::Delete);
    }
}
