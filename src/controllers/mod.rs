//! 页面控制器
//!
//! 每个页面一个控制器：负责请求数据、维护本地视图状态，
//! 以及“先确认再修补”的本地更新：
//!
//! 1. 发送唯一的一个后端变更请求
//! 2. 成功后只修补受影响的实体或关系
//! 3. 失败则状态保持不变，错误只在发起操作的组件内展示
//!
//! 控制器本身不持有视图状态，状态结构体（`*State`）是普通数据，
//! 由调用方（组件里的信号）保存，控制器返回需要应用的变更。

pub mod auth;
pub mod events;
pub mod favorites;
pub mod organizer;
pub mod profile;
pub mod scanner;
pub mod stats;
pub mod tickets;

use crate::error::ClientError;

/// 页面级加载状态
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Loadable<T> {
    #[default]
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Loadable<T> {
    pub fn from_result(result: Result<T, ClientError>, fallback: &str) -> Self {
        match result {
            Ok(value) => Loadable::Ready(value),
            Err(err) => {
                tracing::warn!(error = %err, "page load failed");
                Loadable::Failed(page_message(&err, fallback))
            }
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Loadable::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn ready_mut(&mut self) -> Option<&mut T> {
        match self {
            Loadable::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// 页面级错误文案：网络和服务器错误使用页面自己的提示，
/// 其余情况优先显示后端给出的消息
pub fn page_message(err: &ClientError, fallback: &str) -> String {
    use crate::error::ClientErrorKind::*;
    match err.kind {
        Network | Server | Serialization => fallback.to_string(),
        Authentication => "Trebuie să fii autentificat.".to_string(),
        _ => err.message().to_string(),
    }
}
