//! UniEvent 客户端核心
//!
//! 与 UI 无关的部分都在这里，前端只负责渲染和浏览器适配：
//! - `session` / `token`: 令牌存储与 JWT 声明解析
//! - `api`: 带鉴权头的请求、401 统一登出
//! - `guard`: 路由守卫（过期时刷新一次）
//! - `rules` / `filter` / `qr`: 纯业务规则
//! - `controllers`: 各页面的加载与确认后本地更新

pub mod api;
pub mod clock;
pub mod config;
pub mod controllers;
pub mod error;
pub mod filter;
pub mod guard;
pub mod qr;
pub mod request;
pub mod rules;
pub mod session;
pub mod token;

pub use api::{Navigator, NoopNavigator, UniEventApi};
pub use clock::{Clock, SystemClock};
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, ClientErrorKind, ClientResult, FieldErrors};
pub use guard::{DenyReason, GuardState, RequiredRole, RouteGuard};
pub use request::{
    HttpClient, HttpRequest, HttpResponse, MultipartForm, PartValue, RequestBody,
};
pub use session::{MemoryTokenStore, Session, TokenStore};
pub use token::{Claims, Identity, Role};

#[cfg(feature = "reqwest-client")]
pub use request::ReqwestHttpClient;
