//! 会话模块
//!
//! 访问令牌和刷新令牌是整个客户端唯一共享的可变状态。
//! 所有读写都经过 `Session`，底层存储通过 `TokenStore` 注入：
//! 浏览器里是 localStorage，测试里是内存 Map。

use crate::config::ClientConfig;
use crate::token::{DecodeError, Identity};
use chrono::{DateTime, Utc};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use unievent_shared::TokenPair;

// =========================================================
// 存储抽象 (Token Store)
// =========================================================

pub trait TokenStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// 内存存储，克隆后共享同一份数据
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    items: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.items.borrow_mut().remove(key);
    }
}

// =========================================================
// 会话 (Session)
// =========================================================

#[derive(Clone)]
pub struct Session {
    store: Rc<dyn TokenStore>,
    access_key: Rc<str>,
    refresh_key: Rc<str>,
    refreshing: Rc<Cell<bool>>,
}

impl Session {
    pub fn new(store: Rc<dyn TokenStore>, config: &ClientConfig) -> Self {
        Self {
            store,
            access_key: Rc::from(config.access_key.as_str()),
            refresh_key: Rc::from(config.refresh_key.as_str()),
            refreshing: Rc::new(Cell::new(false)),
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        self.store.get(key).filter(|v| !v.trim().is_empty())
    }

    pub fn access(&self) -> Option<String> {
        self.read(&self.access_key)
    }

    pub fn refresh(&self) -> Option<String> {
        self.read(&self.refresh_key)
    }

    /// 两个令牌都存在时才返回
    pub fn tokens(&self) -> Option<TokenPair> {
        Some(TokenPair {
            access: self.access()?,
            refresh: self.refresh()?,
        })
    }

    pub fn set_tokens(&self, pair: &TokenPair) {
        self.store.set(&self.access_key, &pair.access);
        self.store.set(&self.refresh_key, &pair.refresh);
        tracing::debug!("session tokens stored");
    }

    /// 静默刷新后只替换访问令牌
    pub fn set_access(&self, access: &str) {
        self.store.set(&self.access_key, access);
    }

    pub fn set_refresh(&self, refresh: &str) {
        self.store.set(&self.refresh_key, refresh);
    }

    pub fn clear(&self) {
        self.store.remove(&self.access_key);
        self.store.remove(&self.refresh_key);
        tracing::info!("session cleared");
    }

    pub fn is_logged_in(&self) -> bool {
        self.access().is_some()
    }

    /// 从当前访问令牌解出身份（不判断过期）
    pub fn identity(&self) -> Option<Result<Identity, DecodeError>> {
        self.access().map(|token| Identity::from_token(&token))
    }

    /// 未过期的身份；过期的令牌要等路由守卫刷新后才算登录
    pub fn live_identity(&self, now: DateTime<Utc>) -> Option<Identity> {
        self.identity()
            .and_then(Result::ok)
            .filter(|identity| identity.expires_at > now)
    }

    // --- 刷新互斥 ---

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.get()
    }

    /// 占用刷新标志；已有刷新在进行时返回 None
    pub fn begin_refresh(&self) -> Option<RefreshLatch> {
        if self.refreshing.replace(true) {
            return None;
        }
        Some(RefreshLatch {
            flag: self.refreshing.clone(),
        })
    }
}

/// 刷新标志，离开作用域时自动释放
#[must_use]
pub struct RefreshLatch {
    flag: Rc<Cell<bool>>,
}

impl Drop for RefreshLatch {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}
