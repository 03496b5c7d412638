use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

// =========================================================
// 错误类别枚举
// =========================================================

/// 错误类别
///
/// 决定错误的传播方式：认证类错误全局生效（强制登出），
/// 其余错误都被限制在发起请求的组件内部。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    /// 401 / 令牌缺失 / 刷新失败
    Authentication,
    /// 403: 会话有效但角色不符
    Authorization,
    /// 400: 表单校验失败（客户端或后端字段错误）
    Validation,
    /// 404
    NotFound,
    /// 传输层失败（无响应）
    Network,
    /// 5xx 及其他非预期状态码
    Server,
    /// 令牌无法解析
    Decode,
    /// 响应体与预期结构不符
    Serialization,
    /// 客户端规则拒绝了该操作（如取消已结束活动的票）
    Rejected,
}

impl ClientErrorKind {
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientErrorKind::Authentication => "AUTHENTICATION",
            ClientErrorKind::Authorization => "AUTHORIZATION",
            ClientErrorKind::Validation => "VALIDATION",
            ClientErrorKind::NotFound => "NOT_FOUND",
            ClientErrorKind::Network => "NETWORK",
            ClientErrorKind::Server => "SERVER",
            ClientErrorKind::Decode => "TOKEN_DECODE",
            ClientErrorKind::Serialization => "RESPONSE_PARSE",
            ClientErrorKind::Rejected => "REJECTED",
        }
    }

    /// 按 HTTP 状态码归类
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ClientErrorKind::Authentication,
            403 => ClientErrorKind::Authorization,
            404 => ClientErrorKind::NotFound,
            400..=499 => ClientErrorKind::Validation,
            _ => ClientErrorKind::Server,
        }
    }

    /// 是否需要清空会话（解码错误与认证错误同等处理）
    pub fn ends_session(&self) -> bool {
        matches!(self, ClientErrorKind::Authentication | ClientErrorKind::Decode)
    }
}

// =========================================================
// 字段错误
// =========================================================

/// 后端返回的字段级错误
///
/// 兼容 DRF 的几种形态：
/// - `{"detail": "..."}`
/// - `{"field": ["msg", ...]}` 或 `{"field": "msg"}`
/// - `{"non_field_errors": [...]}`
/// - 纯字符串 / 字符串数组
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    general: Vec<String>,
    fields: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.general.is_empty() && self.fields.is_empty()
    }

    pub fn push_general(&mut self, msg: impl Into<String>) {
        self.general.push(msg.into());
    }

    pub fn push(&mut self, field: impl Into<String>, msg: impl Into<String>) {
        self.fields.entry(field.into()).or_default().push(msg.into());
    }

    pub fn general(&self) -> &[String] {
        &self.general
    }

    pub fn field(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// 第一条可展示的消息：先 general，再按字段名顺序
    pub fn first_message(&self) -> Option<&str> {
        self.general
            .first()
            .or_else(|| self.fields.values().flat_map(|v| v.first()).next())
            .map(String::as_str)
    }

    /// 解析响应体，无法识别时返回空集合
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::from_value(&value),
            Err(_) => Self::default(),
        }
    }

    pub fn from_value(value: &Value) -> Self {
        let mut errors = Self::default();
        match value {
            Value::String(s) => errors.push_general(s.clone()),
            Value::Array(items) => {
                for msg in items.iter().filter_map(message_of) {
                    errors.push_general(msg);
                }
            }
            Value::Object(map) => {
                for (key, val) in map {
                    let messages: Vec<String> = match val {
                        Value::Array(items) => items.iter().filter_map(message_of).collect(),
                        other => message_of(other).into_iter().collect(),
                    };
                    for msg in messages {
                        if key == "detail" || key == "non_field_errors" || key == "error" {
                            errors.push_general(msg);
                        } else {
                            errors.push(key.clone(), msg);
                        }
                    }
                }
            }
            _ => {}
        }
        errors
    }
}

fn message_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// =========================================================
// 错误上下文追踪
// =========================================================

/// 记录错误发生时的操作，如 "tickets.cancel"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSpan {
    pub operation: String,
    pub detail: Option<String>,
}

// =========================================================
// 核心错误类型
// =========================================================

/// 客户端错误
///
/// - kind: 错误类别（决定传播方式）
/// - message: 面向用户的消息
/// - status: 原始 HTTP 状态码（如有）
/// - field_errors: 字段级错误（校验失败时）
/// - spans: 操作追踪
#[derive(Debug)]
pub struct ClientError {
    pub kind: ClientErrorKind,
    pub message: String,
    status: Option<u16>,
    field_errors: FieldErrors,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    spans: Vec<ErrorSpan>,
}

impl ClientError {
    pub fn new(kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            field_errors: FieldErrors::default(),
            source: None,
            spans: Vec::new(),
        }
    }

    // --- Convenience constructors ---

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Authentication, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Authorization, message)
    }

    pub fn validation(errors: FieldErrors) -> Self {
        let message = errors
            .first_message()
            .unwrap_or("Date invalide.")
            .to_string();
        Self::new(ClientErrorKind::Validation, message).with_field_errors(errors)
    }

    /// 单字段校验错误
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.push(field, message);
        Self::validation(errors)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Network, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Decode, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Serialization, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Rejected, message)
    }

    /// 由非 2xx 响应构造错误，尽量保留后端给出的消息
    pub fn from_response(status: u16, body: &str) -> Self {
        let kind = ClientErrorKind::from_status(status);
        let field_errors = FieldErrors::from_body(body);
        let message = field_errors
            .first_message()
            .map(str::to_string)
            .unwrap_or_else(|| default_message(kind).to_string());

        let mut err = Self::new(kind, message).with_field_errors(field_errors);
        err.status = Some(status);
        err
    }

    // --- Context builders ---

    pub fn in_op(mut self, operation: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan {
            operation: operation.into(),
            detail: None,
        });
        self
    }

    pub fn in_op_with(mut self, operation: impl Into<String>, detail: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan {
            operation: operation.into(),
            detail: Some(detail.into()),
        });
        self
    }

    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn with_field_errors(mut self, errors: FieldErrors) -> Self {
        self.field_errors = errors;
        self
    }

    /// 用给定文案替换通用消息（保留字段错误）
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    // --- Accessors ---

    pub fn error_code(&self) -> &'static str {
        self.kind.error_code()
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    pub fn spans(&self) -> &[ErrorSpan] {
        &self.spans
    }

    pub fn is_authentication(&self) -> bool {
        self.kind.ends_session()
    }
}

fn default_message(kind: ClientErrorKind) -> &'static str {
    match kind {
        ClientErrorKind::Authentication => "Sesiune expirată. Autentifică-te din nou.",
        ClientErrorKind::Authorization => "Nu ai drepturi pentru această acțiune.",
        ClientErrorKind::Validation => "Date invalide.",
        ClientErrorKind::NotFound => "Resursa nu a fost găsită.",
        ClientErrorKind::Network => "Eroare de conexiune. Verifică serverul.",
        ClientErrorKind::Server => "Eroare de server. Încearcă din nou.",
        ClientErrorKind::Decode => "Token invalid.",
        ClientErrorKind::Serialization => "Răspuns neașteptat de la server.",
        ClientErrorKind::Rejected => "Acțiune indisponibilă.",
    }
}

// =========================================================
// Display & Error trait 实现
// =========================================================

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.error_code(), self.message)?;

        if !self.spans.is_empty() {
            write!(f, " | trace: ")?;
            for (i, span) in self.spans.iter().enumerate() {
                if i > 0 {
                    write!(f, " -> ")?;
                }
                write!(f, "{}", span.operation)?;
                if let Some(detail) = &span.detail {
                    write!(f, "({})", detail)?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::serialization(default_message(ClientErrorKind::Serialization)).with_source(e)
    }
}

impl From<crate::token::DecodeError> for ClientError {
    fn from(e: crate::token::DecodeError) -> Self {
        ClientError::decode(e.to_string()).with_source(e)
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
