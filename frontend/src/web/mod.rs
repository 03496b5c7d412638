//! 浏览器适配层
//!
//! - `route`: 路由定义（领域模型，无 DOM 依赖）
//! - `router`: History API 路由服务
//! - `http` / `storage`: 核心库 `HttpClient` / `TokenStore` 的浏览器实现
//! - `file`: 上传前读取本地文件

pub mod file;
mod http;
pub mod route;
pub mod router;
mod storage;

pub use http::FetchHttpClient;
pub use storage::BrowserTokenStore;
