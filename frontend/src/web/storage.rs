//! LocalStorage 令牌存储
//!
//! 令牌按原始字符串保存（不做 JSON 编码），与后端签发的格式一致。

use gloo_storage::{LocalStorage, Storage};
use unievent::TokenStore;

/// 基于浏览器 LocalStorage 的 `TokenStore`
///
/// 存储不可用（隐私模式等）时读取返回 `None`，写入失败只记录日志。
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserTokenStore;

impl TokenStore for BrowserTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        LocalStorage::raw().get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(e) = LocalStorage::raw().set_item(key, value) {
            tracing::warn!(key, error = ?e, "failed to persist token");
        }
    }

    fn remove(&self, key: &str) {
        LocalStorage::delete(key);
    }
}
