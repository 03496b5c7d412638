use crate::error::{ClientError, ClientResult};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

pub use unievent_shared::protocol::{FileUpload, HttpMethod};

#[cfg(test)]
use std::{cell::RefCell, collections::VecDeque, rc::Rc};

// =========================================================
// 核心抽象层 (HTTP Interface Abstraction)
// =========================================================

/// 请求体：JSON 文本或 multipart 表单
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(String),
    Multipart(MultipartForm),
}

/// multipart 表单的一个字段值
#[derive(Debug, Clone, PartialEq)]
pub enum PartValue {
    Text(String),
    File(FileUpload),
}

/// 按添加顺序排列的 multipart 字段
///
/// 不带 Content-Type 头，boundary 由传输层生成。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    parts: Vec<(String, PartValue)>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parts.push((name.to_string(), PartValue::Text(value.into())));
        self
    }

    pub fn file(mut self, name: &str, file: FileUpload) -> Self {
        self.parts.push((name.to_string(), PartValue::File(file)));
        self
    }

    pub fn parts(&self) -> &[(String, PartValue)] {
        &self.parts
    }

    pub fn get(&self, name: &str) -> Option<&PartValue> {
        self.parts.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// 文本字段的值
    pub fn text_value(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            PartValue::Text(text) => Some(text),
            PartValue::File(_) => None,
        }
    }

    /// 把 JSON 对象展开成文本字段：字符串原样，`null` 省略，其余取 JSON 文本
    pub fn from_json_fields(value: serde_json::Value) -> ClientResult<Self> {
        let serde_json::Value::Object(map) = value else {
            return Err(ClientError::serialization(
                "Cererea nu poate fi trimisă ca formular.",
            ));
        };

        let mut form = Self::new();
        for (name, value) in map {
            form = match value {
                serde_json::Value::Null => form,
                serde_json::Value::String(text) => form.text(&name, text),
                other => form.text(&name, other.to_string()),
            };
        }
        Ok(form)
    }
}

/// 通用 HTTP 请求结构
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    pub fn new(url: &str, method: HttpMethod) -> Self {
        Self {
            url: url.to_string(),
            method,
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(body.to_string()));
        self
    }

    pub fn with_form(mut self, form: MultipartForm) -> Self {
        self.body = Some(RequestBody::Multipart(form));
        self
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }
}

/// 通用 HTTP 响应结构
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 解析响应体；204 等空响应按 `null` 处理，便于 `()` 之类的类型
    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        let body = self.body.trim();
        let body = if body.is_empty() { "null" } else { body };
        Ok(serde_json::from_str(body)?)
    }
}

/// HTTP 客户端特性 (Trait)
/// (?Send) 是因为浏览器环境下 fetch 的 Future 不是 Send 的
#[async_trait::async_trait(?Send)]
pub trait HttpClient {
    /// 只有传输失败才返回 Err，任何状态码都作为响应返回
    async fn send(&self, req: HttpRequest) -> ClientResult<HttpResponse>;
}

// =========================================================
// 实现层: Reqwest 客户端 (Native)
// =========================================================

#[cfg(feature = "reqwest-client")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

#[cfg(feature = "reqwest-client")]
impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[cfg(feature = "reqwest-client")]
#[async_trait::async_trait(?Send)]
impl HttpClient for ReqwestHttpClient {
    async fn send(&self, req: HttpRequest) -> ClientResult<HttpResponse> {
        let method = match req.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &req.url);

        for (k, v) in req.headers {
            builder = builder.header(k, v);
        }

        builder = match req.body {
            Some(RequestBody::Json(body)) => builder.body(body),
            Some(RequestBody::Multipart(form)) => builder.multipart(reqwest_form(form)?),
            None => builder,
        };

        let resp = builder.send().await.map_err(|e| {
            ClientError::network("Eroare de conexiune. Verifică serverul.")
                .with_source(e)
                .in_op("http.send")
        })?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| {
            ClientError::network("Eroare de conexiune. Verifică serverul.")
                .with_source(e)
                .in_op("http.read_body")
        })?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(feature = "reqwest-client")]
fn reqwest_form(form: MultipartForm) -> ClientResult<reqwest::multipart::Form> {
    let mut out = reqwest::multipart::Form::new();
    for (name, value) in form.parts {
        out = match value {
            PartValue::Text(text) => out.text(name, text),
            PartValue::File(file) => {
                let part = reqwest::multipart::Part::bytes(file.bytes)
                    .file_name(file.file_name)
                    .mime_str(&file.content_type)
                    .map_err(|e| {
                        ClientError::serialization("Tip de fișier invalid.")
                            .with_source(e)
                            .in_op("http.multipart")
                    })?;
                out.part(name, part)
            }
        };
    }
    Ok(out)
}

// =========================================================
// 测试工具: MockHttpClient
// =========================================================

/// 被记录的请求 (Method, URL, Headers, Body)
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<RequestBody>,
}

#[cfg(test)]
impl RecordedRequest {
    pub fn body_json(&self) -> serde_json::Value {
        match &self.body {
            Some(RequestBody::Json(b)) => serde_json::from_str(b).unwrap(),
            _ => serde_json::Value::Null,
        }
    }

    pub fn form(&self) -> Option<&MultipartForm> {
        match &self.body {
            Some(RequestBody::Multipart(form)) => Some(form),
            _ => None,
        }
    }
}

#[cfg(test)]
enum MockReply {
    Response(u16, String),
    NetworkError,
}

/// 以 "METHOD URL" 为键的脚本化响应队列
///
/// 同一个键可以排队多个响应（按顺序消费，最后一个会一直重复），
/// 没有匹配时返回 404。克隆共享同一份内部状态，测试可以在把客户端
/// 交给被测对象之后继续检查请求记录。
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MockHttpClient {
    base_url: Rc<String>,
    responses: Rc<RefCell<HashMap<String, VecDeque<MockReply>>>>,
    pub requests: Rc<RefCell<Vec<RecordedRequest>>>,
}

#[cfg(test)]
impl MockHttpClient {
    pub fn new() -> Self {
        Self::with_base_url(crate::config::DEFAULT_API_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: Rc::new(base_url.trim_end_matches('/').to_string()),
            ..Default::default()
        }
    }

    fn key(&self, method: HttpMethod, path: &str) -> String {
        format!("{} {}{}", method.as_str(), self.base_url, path)
    }

    fn push(&self, method: HttpMethod, path: &str, reply: MockReply) {
        self.responses
            .borrow_mut()
            .entry(self.key(method, path))
            .or_default()
            .push_back(reply);
    }

    /// 为 `path`（相对 base url，可含查询串）登记一个响应
    pub fn mock_response(&self, method: HttpMethod, path: &str, status: u16, body: serde_json::Value) {
        self.push(method, path, MockReply::Response(status, body.to_string()));
    }

    pub fn mock_empty(&self, method: HttpMethod, path: &str, status: u16) {
        self.push(method, path, MockReply::Response(status, String::new()));
    }

    pub fn mock_network_error(&self, method: HttpMethod, path: &str) {
        self.push(method, path, MockReply::NetworkError);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.borrow().clone()
    }

    /// 发往 `path` 的请求次数（忽略方法）
    pub fn count(&self, path: &str) -> usize {
        let url = format!("{}{}", self.base_url, path);
        self.requests.borrow().iter().filter(|r| r.url == url).count()
    }

    pub fn last(&self) -> Option<RecordedRequest> {
        self.requests.borrow().last().cloned()
    }
}

#[cfg(test)]
#[async_trait::async_trait(?Send)]
impl HttpClient for MockHttpClient {
    async fn send(&self, req: HttpRequest) -> ClientResult<HttpResponse> {
        self.requests.borrow_mut().push(RecordedRequest {
            method: req.method,
            url: req.url.clone(),
            headers: req.headers.clone(),
            body: req.body.clone(),
        });

        let key = format!("{} {}", req.method.as_str(), req.url);
        let mut responses = self.responses.borrow_mut();
        let Some(queue) = responses.get_mut(&key) else {
            return Ok(HttpResponse {
                status: 404,
                body: r#"{"detail": "Not found."}"#.to_string(),
            });
        };

        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().map(|r| match r {
                MockReply::Response(s, b) => MockReply::Response(*s, b.clone()),
                MockReply::NetworkError => MockReply::NetworkError,
            })
        };

        match reply {
            Some(MockReply::Response(status, body)) => Ok(HttpResponse { status, body }),
            Some(MockReply::NetworkError) | None => Err(ClientError::network(
                "Eroare de conexiune. Verifică serverul.",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_body_parses_as_unit() {
        let resp = HttpResponse {
            status: 204,
            body: String::new(),
        };
        assert!(resp.is_success());
        resp.json::<()>().unwrap();
        resp.json::<serde::de::IgnoredAny>().unwrap();
    }

    #[test]
    fn bad_body_is_a_serialization_error() {
        let resp = HttpResponse {
            status: 200,
            body: "{not json".into(),
        };
        let err = resp.json::<Vec<u32>>().unwrap_err();
        assert_eq!(err.kind, crate::error::ClientErrorKind::Serialization);
    }

    #[tokio::test]
    async fn mock_replays_queue_then_repeats_last() {
        let client = MockHttpClient::with_base_url("http://api.test");
        client.mock_response(HttpMethod::Get, "/a/", 500, json!({}));
        client.mock_response(HttpMethod::Get, "/a/", 200, json!([1]));

        let req = || HttpRequest::new("http://api.test/a/", HttpMethod::Get);
        assert_eq!(client.send(req()).await.unwrap().status, 500);
        assert_eq!(client.send(req()).await.unwrap().status, 200);
        assert_eq!(client.send(req()).await.unwrap().status, 200);
        assert_eq!(client.count("/a/"), 3);

        let missing = HttpRequest::new("http://api.test/b/", HttpMethod::Get);
        assert_eq!(client.send(missing).await.unwrap().status, 404);
    }

    /// 本地单连接 HTTP 服务：记录收到的原始请求，回一个固定响应
    #[cfg(feature = "reqwest-client")]
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                let Some(end) = raw.windows(4).position(|w| w == b"\r\n\r\n") else {
                    continue;
                };
                let head = String::from_utf8_lossy(&raw[..end]).to_lowercase();
                let len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .map(|v| v.trim().parse::<usize>().unwrap())
                    .unwrap_or(0);
                if raw.len() >= end + 4 + len {
                    break;
                }
            }

            let reply = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&raw).into_owned()
        });

        (base, handle)
    }

    #[cfg(feature = "reqwest-client")]
    #[tokio::test]
    async fn reqwest_client_sends_json_and_reads_status() {
        let (base, server) = serve_once("201 Created", r#"{"id":5}"#).await;

        let req = HttpRequest::new(&format!("{}/api/events/", base), HttpMethod::Post)
            .with_header("Authorization", "Bearer tok-a")
            .with_header("Content-Type", "application/json")
            .with_body(json!({"title": "Gala"}));
        let resp = ReqwestHttpClient::new().send(req).await.unwrap();

        assert_eq!(resp.status, 201);
        assert!(resp.is_success());
        assert_eq!(resp.json::<serde_json::Value>().unwrap(), json!({"id": 5}));

        let raw = server.await.unwrap();
        let lower = raw.to_lowercase();
        assert!(raw.starts_with("POST /api/events/ HTTP/1.1\r\n"));
        assert!(lower.contains("authorization: bearer tok-a"));
        assert!(lower.contains("content-type: application/json"));
        assert!(raw.ends_with(r#"{"title":"Gala"}"#));
    }

    #[cfg(feature = "reqwest-client")]
    #[tokio::test]
    async fn reqwest_client_sends_multipart_parts() {
        let (base, server) = serve_once("400 Bad Request", r#"{"title":["Prea scurt."]}"#).await;

        let form = MultipartForm::new()
            .text("title", "Gala")
            .file("image", FileUpload::new("cover.png", "image/png", b"PNG".to_vec()));
        let req = HttpRequest::new(&format!("{}/api/events/3/", base), HttpMethod::Patch)
            .with_form(form);
        let resp = ReqwestHttpClient::new().send(req).await.unwrap();

        // 非 2xx 依然是响应，不是传输错误
        assert_eq!(resp.status, 400);
        assert!(!resp.is_success());

        let raw = server.await.unwrap();
        let lower = raw.to_lowercase();
        assert!(raw.starts_with("PATCH /api/events/3/ HTTP/1.1\r\n"));
        assert!(lower.contains("content-type: multipart/form-data; boundary="));
        assert!(raw.contains(r#"name="title""#));
        assert!(raw.contains("Gala"));
        assert!(raw.contains(r#"name="image"; filename="cover.png""#));
        assert!(lower.contains("content-type: image/png"));
    }

    #[cfg(feature = "reqwest-client")]
    #[tokio::test]
    async fn reqwest_client_maps_refused_connection_to_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/api/events/", listener.local_addr().unwrap());
        drop(listener);

        let err = ReqwestHttpClient::new()
            .send(HttpRequest::new(&url, HttpMethod::Get))
            .await
            .unwrap_err();
        assert_eq!(err.kind, crate::error::ClientErrorKind::Network);
    }

    #[test]
    fn json_object_flattens_into_text_fields() {
        let form = MultipartForm::from_json_fields(json!({
            "title": "Gala",
            "category": 3,
            "faculty": null,
            "start_date": "2025-10-04T09:00:00Z",
        }))
        .unwrap();
        assert_eq!(form.text_value("title"), Some("Gala"));
        assert_eq!(form.text_value("category"), Some("3"));
        assert_eq!(form.text_value("start_date"), Some("2025-10-04T09:00:00Z"));
        assert!(form.get("faculty").is_none());

        let err = MultipartForm::from_json_fields(json!([1, 2])).unwrap_err();
        assert_eq!(err.kind, crate::error::ClientErrorKind::Serialization);
    }
}
