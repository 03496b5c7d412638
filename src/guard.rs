//! 路由守卫
//!
//! 每次挂载受保护页面时执行一次检查（没有后台定时器）：
//!
//! 1. 读取访问令牌，缺失则拒绝
//! 2. 解码，失败则拒绝
//! 3. 未过期：按路由要求的角色判断
//! 4. 已过期：用刷新令牌换新的访问令牌（只尝试一次，
//!    并发检查遇到正在进行的刷新时保持 `Checking`），
//!    成功后先持久化新令牌，再用新令牌的声明重新判断角色；
//!    刷新失败则清空两个令牌
//!
//! 角色不符不会清空会话。

use crate::api::UniEventApi;
use crate::clock::Clock;
use crate::request::HttpClient;
use crate::token::{Claims, Identity, decode_claims};
use std::rc::Rc;
use unievent_shared::protocol::RefreshTokenRequest;

/// 路由要求的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequiredRole {
    #[default]
    None,
    Organizer,
    Admin,
}

impl RequiredRole {
    /// 直接按令牌里的标志位判断
    pub fn permits(self, claims: &Claims) -> bool {
        match self {
            RequiredRole::None => true,
            RequiredRole::Organizer => claims.is_organizer,
            RequiredRole::Admin => claims.is_staff,
        }
    }
}

/// 拒绝原因（只用于日志，不展示给用户）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NoAccessToken,
    Malformed,
    NoRefreshToken,
    RefreshFailed,
    /// 刷新得到的令牌仍然过期
    StillExpired,
    RoleMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    Checking,
    Authorized(Identity),
    Unauthorized(DenyReason),
}

impl GuardState {
    pub fn is_authorized(&self) -> bool {
        matches!(self, GuardState::Authorized(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, GuardState::Unauthorized(_))
    }
}

pub struct RouteGuard<C> {
    api: UniEventApi<C>,
    clock: Rc<dyn Clock>,
}

impl<C: HttpClient> RouteGuard<C> {
    pub fn new(api: UniEventApi<C>, clock: Rc<dyn Clock>) -> Self {
        Self { api, clock }
    }

    pub async fn check(&self, required: RequiredRole) -> GuardState {
        let state = self.evaluate(required).await;
        match &state {
            GuardState::Authorized(identity) => {
                tracing::debug!(email = %identity.email, role = ?identity.role, "route authorized")
            }
            GuardState::Unauthorized(reason) => {
                tracing::info!(?reason, ?required, "route denied")
            }
            GuardState::Checking => tracing::debug!("refresh already in flight"),
        }
        state
    }

    async fn evaluate(&self, required: RequiredRole) -> GuardState {
        let session = self.api.session();

        let Some(access) = session.access() else {
            return GuardState::Unauthorized(DenyReason::NoAccessToken);
        };

        let claims = match decode_claims(&access) {
            Ok(claims) => claims,
            Err(err) => {
                tracing::warn!(error = %err, "access token decode failed");
                return GuardState::Unauthorized(DenyReason::Malformed);
            }
        };

        if !claims.is_expired(self.clock.now()) {
            return authorize(&claims, required);
        }

        // ===== 过期：单次刷新 =====

        let Some(latch) = session.begin_refresh() else {
            return GuardState::Checking;
        };

        let Some(refresh) = session.refresh() else {
            return GuardState::Unauthorized(DenyReason::NoRefreshToken);
        };

        tracing::info!("access token expired, refreshing");
        let refreshed = self.api.send(&RefreshTokenRequest { refresh }).await;
        drop(latch);

        let refreshed = match refreshed {
            Ok(refreshed) => refreshed,
            Err(err) => {
                tracing::warn!(error = %err, "token refresh failed");
                session.clear();
                return GuardState::Unauthorized(DenyReason::RefreshFailed);
            }
        };

        // 先持久化，再用新令牌判断角色
        session.set_access(&refreshed.access);
        if let Some(rotated) = refreshed.refresh.as_deref() {
            session.set_refresh(rotated);
        }

        let claims = match decode_claims(&refreshed.access) {
            Ok(claims) => claims,
            Err(err) => {
                tracing::warn!(error = %err, "refreshed token decode failed");
                return GuardState::Unauthorized(DenyReason::Malformed);
            }
        };

        if claims.is_expired(self.clock.now()) {
            return GuardState::Unauthorized(DenyReason::StillExpired);
        }

        authorize(&claims, required)
    }
}

fn authorize(claims: &Claims, required: RequiredRole) -> GuardState {
    if !required.permits(claims) {
        return GuardState::Unauthorized(DenyReason::RoleMismatch);
    }
    match Identity::from_claims(claims) {
        Ok(identity) => GuardState::Authorized(identity),
        Err(_) => GuardState::Unauthorized(DenyReason::Malformed),
    }
}
