use chrono::{DateTime, Utc};

/// 时间来源
///
/// 令牌过期判断、票据分组和统计页面都依赖“当前时间”，
/// 通过注入时钟让这些逻辑可以在测试中固定时间。
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
pub use testing::FixedClock;

#[cfg(test)]
mod testing {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// 可手动推进的时钟
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        now: Rc<Cell<DateTime<Utc>>>,
    }

    impl FixedClock {
        pub fn at(now: DateTime<Utc>) -> Self {
            Self {
                now: Rc::new(Cell::new(now)),
            }
        }

        pub fn advance(&self, by: chrono::Duration) {
            self.now.set(self.now.get() + by);
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.now.get()
        }
    }
}
