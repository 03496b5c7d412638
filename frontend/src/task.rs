//! 异步任务辅助
//!
//! 组件卸载后返回的请求结果不能再写状态：每个组件持有一个 `CancelFlag`，
//! 在 `on_cleanup` 时置位，异步回调写状态前检查它。

use leptos::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// 创建随当前组件一起失效的取消标记
pub fn use_cancel_flag() -> CancelFlag {
    let flag = CancelFlag::new();
    let on_drop = flag.clone();
    on_cleanup(move || on_drop.cancel());
    flag
}
