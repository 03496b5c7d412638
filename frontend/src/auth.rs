//! 认证模块
//!
//! 会话保存在 LocalStorage（由核心库的 `Session` 管理），这里只维护一个
//! 身份信号供界面使用，并提供路由守卫组件。

use crate::task::use_cancel_flag;
use crate::web::route::AppRoute;
use crate::web::router::{RouterService, use_router};
use crate::web::{BrowserTokenStore, FetchHttpClient};
use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::rc::Rc;
use unievent::controllers::auth::{AuthController, Landing};
use unievent::{
    ClientConfig, ClientResult, Clock, GuardState, Identity, Navigator, RequiredRole, RouteGuard,
    Session, SystemClock, UniEventApi,
};

pub type Api = UniEventApi<FetchHttpClient>;

const REFRESH_POLL_MS: u32 = 100;

/// 页面共享的服务：API 客户端和时钟
#[derive(Clone)]
pub struct Services {
    pub api: Api,
    pub clock: Rc<dyn Clock>,
}

/// 全局 401 处理：清空身份并跳转到登录页
struct BrowserNavigator {
    router: RouterService,
    identity: RwSignal<Option<Identity>>,
}

impl Navigator for BrowserNavigator {
    fn redirect_to_login(&self) {
        tracing::info!("session ended, redirecting to login");
        self.identity.set(None);
        self.router.redirect(AppRoute::Auth);
    }
}

/// 认证上下文
#[derive(Clone, Copy)]
pub struct AuthContext {
    services: StoredValue<Services, LocalStorage>,
    /// 当前身份（仅用于展示，权限判断以 `ProtectedRoute` 为准）
    pub identity: RwSignal<Option<Identity>>,
}

impl AuthContext {
    pub fn new(config: ClientConfig, router: RouterService) -> Self {
        let config = Rc::new(config);
        let session = Session::new(Rc::new(BrowserTokenStore), &config);
        // 过期的令牌先不显示为已登录，由 `ProtectedRoute` 刷新后再设置
        let identity = RwSignal::new(session.live_identity(SystemClock.now()));

        let navigator = Rc::new(BrowserNavigator { router, identity });
        let api = UniEventApi::new(FetchHttpClient, config, session, navigator);

        Self {
            services: StoredValue::new_local(Services {
                api,
                clock: Rc::new(SystemClock),
            }),
            identity,
        }
    }

    pub fn services(&self) -> Services {
        self.services.get_value()
    }

    pub fn api(&self) -> Api {
        self.services.with_value(|s| s.api.clone())
    }

    pub fn clock(&self) -> Rc<dyn Clock> {
        self.services.with_value(|s| s.clock.clone())
    }

    pub fn is_organizer(&self) -> bool {
        self.identity
            .with(|id| id.as_ref().is_some_and(|id| id.role.is_organizer()))
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<AppRoute> {
        let identity = AuthController::new(self.api()).login(email, password).await?;
        Ok(self.signed_in(identity))
    }

    pub async fn google_login(&self, credential: &str) -> ClientResult<AppRoute> {
        let identity = AuthController::new(self.api()).google_login(credential).await?;
        Ok(self.signed_in(identity))
    }

    pub fn logout(&self) {
        AuthController::new(self.api()).logout();
        self.identity.set(None);
    }

    fn signed_in(&self, identity: Identity) -> AppRoute {
        let landing = AppRoute::from_path(Landing::for_identity(&identity).path());
        self.identity.set(Some(identity));
        landing
    }
}

/// 从 Context 获取认证上下文
pub fn use_auth() -> AuthContext {
    use_context::<AuthContext>().expect("AuthContext should be provided")
}

/// 路由守卫组件
///
/// 挂载时运行一次 `RouteGuard::check`；检查中显示加载状态，
/// 未授权时重定向到 `/auth`。
#[component]
pub fn ProtectedRoute(role: RequiredRole, children: ChildrenFn) -> impl IntoView {
    let auth = use_auth();
    let router = use_router();
    let cancel = use_cancel_flag();
    let (state, set_state) = signal(GuardState::Checking);

    let services = auth.services();
    spawn_local(async move {
        let guard = RouteGuard::new(services.api, services.clock);
        let mut verdict = guard.check(role).await;
        // 另一个守卫正在刷新令牌：等它结束后重新检查
        while verdict == GuardState::Checking && !cancel.is_cancelled() {
            TimeoutFuture::new(REFRESH_POLL_MS).await;
            verdict = guard.check(role).await;
        }
        if cancel.is_cancelled() {
            return;
        }
        match &verdict {
            GuardState::Authorized(identity) => auth.identity.set(Some(identity.clone())),
            GuardState::Unauthorized(_) => router.redirect(AppRoute::Auth),
            GuardState::Checking => {}
        }
        set_state.set(verdict);
    });

    move || match state.get() {
        GuardState::Authorized(_) => children().into_any(),
        GuardState::Checking => view! {
            <div class="flex flex-col items-center justify-center gap-2 py-24">
                <span class="loading loading-spinner loading-lg text-primary"></span>
                <span class="opacity-70">"Se încarcă..."</span>
            </div>
        }
        .into_any(),
        GuardState::Unauthorized(_) => ().into_any(),
    }
}
