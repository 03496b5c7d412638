//! 路由定义模块 - 领域模型
//!
//! 纯业务逻辑，不依赖 DOM，可以在宿主机上测试。

use std::fmt::Display;
use unievent::RequiredRole;
use unievent_shared::EventId;

/// 应用路由枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppRoute {
    /// 活动列表（首页）
    #[default]
    Events,
    /// 登录 / 注册；进入时清空会话
    Auth,
    /// 清空会话后回到首页
    Logout,
    MyTickets,
    Favorites,
    Profile,
    OrganizerDashboard,
    /// 已结束活动的统计
    OrganizerStats,
    /// 可扫码的活动列表
    OrganizerScan,
    OrganizerScanEvent(EventId),
    NotFound,
}

impl AppRoute {
    /// 将 URL path 解析为路由枚举（结尾的 `/` 可有可无）
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Self::Events,
            ["auth"] => Self::Auth,
            ["logout"] => Self::Logout,
            ["my-tickets"] => Self::MyTickets,
            ["favorites"] => Self::Favorites,
            ["profile"] => Self::Profile,
            ["organizer", "dashboard"] => Self::OrganizerDashboard,
            ["organizer", "stats"] => Self::OrganizerStats,
            ["organizer", "scan"] => Self::OrganizerScan,
            ["organizer", "scan", id] => id
                .parse()
                .map(Self::OrganizerScanEvent)
                .unwrap_or(Self::NotFound),
            _ => Self::NotFound,
        }
    }

    pub fn to_path(&self) -> String {
        match self {
            Self::Events => "/".to_string(),
            Self::Auth => "/auth".to_string(),
            Self::Logout => "/logout".to_string(),
            Self::MyTickets => "/my-tickets".to_string(),
            Self::Favorites => "/favorites".to_string(),
            Self::Profile => "/profile".to_string(),
            Self::OrganizerDashboard => "/organizer/dashboard".to_string(),
            Self::OrganizerStats => "/organizer/stats".to_string(),
            Self::OrganizerScan => "/organizer/scan".to_string(),
            Self::OrganizerScanEvent(id) => format!("/organizer/scan/{id}"),
            Self::NotFound => "/404".to_string(),
        }
    }

    /// **核心守卫逻辑：该路由要求的角色**，`None` 表示无需会话的页面
    pub fn required_role(&self) -> Option<RequiredRole> {
        match self {
            Self::Events | Self::MyTickets | Self::Favorites | Self::Profile => {
                Some(RequiredRole::None)
            }
            Self::OrganizerDashboard
            | Self::OrganizerStats
            | Self::OrganizerScan
            | Self::OrganizerScanEvent(_) => Some(RequiredRole::Organizer),
            Self::Auth | Self::Logout | Self::NotFound => None,
        }
    }

    /// 进入该路由时需要清空会话
    pub fn clears_session(&self) -> bool {
        matches!(self, Self::Auth | Self::Logout)
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unievent::controllers::auth::Landing;

    #[test]
    fn paths_roundtrip() {
        for route in [
            AppRoute::Events,
            AppRoute::Auth,
            AppRoute::MyTickets,
            AppRoute::Favorites,
            AppRoute::OrganizerDashboard,
            AppRoute::OrganizerScan,
            AppRoute::OrganizerScanEvent(12),
        ] {
            assert_eq!(AppRoute::from_path(&route.to_path()), route);
        }
        assert_eq!(AppRoute::from_path("/organizer/scan/12/"), AppRoute::OrganizerScanEvent(12));
        assert_eq!(AppRoute::from_path("/organizer/scan/abc"), AppRoute::NotFound);
        assert_eq!(AppRoute::from_path("/nope"), AppRoute::NotFound);
    }

    #[test]
    fn organizer_routes_require_the_role() {
        assert_eq!(AppRoute::Auth.required_role(), None);
        assert_eq!(AppRoute::MyTickets.required_role(), Some(RequiredRole::None));
        assert_eq!(
            AppRoute::OrganizerScanEvent(1).required_role(),
            Some(RequiredRole::Organizer)
        );
        assert!(AppRoute::Auth.clears_session());
        assert!(!AppRoute::Events.clears_session());
    }

    #[test]
    fn landing_page_runs_the_guard() {
        // 首页也要经过守卫，过期的访问令牌才会先被刷新
        assert_eq!(AppRoute::Events.required_role(), Some(RequiredRole::None));
        assert_eq!(AppRoute::from_path(Landing::Events.path()), AppRoute::Events);
        assert_eq!(
            AppRoute::from_path(Landing::OrganizerDashboard.path()),
            AppRoute::OrganizerDashboard
        );
    }
}
