//! UniEvent 前端应用
//!
//! 业务逻辑都在核心库 `unievent` 中，这里只负责浏览器适配与渲染：
//! - `web`: History 路由、fetch、localStorage
//! - `auth`: 会话上下文与路由守卫组件
//! - `components`: 各页面

mod auth;
mod components {
    pub mod events;
    pub mod favorites;
    pub mod layout;
    pub mod login;
    pub mod organizer;
    pub mod profile;
    pub mod scanner;
    pub mod stats;
    pub mod tickets;
}
mod task;
mod telemetry;
pub(crate) mod web;

use crate::auth::{AuthContext, ProtectedRoute, use_auth};
use crate::components::events::EventsPage;
use crate::components::favorites::FavoritesPage;
use crate::components::login::AuthPage;
use crate::components::organizer::DashboardPage;
use crate::components::profile::ProfilePage;
use crate::components::scanner::{ScanEventPage, ScanListPage};
use crate::components::stats::StatsPage;
use crate::components::tickets::TicketsPage;

use leptos::prelude::*;
use leptos::task::spawn_local;
use unievent::ClientConfig;
use web::route::AppRoute;
use web::router::{RouterOutlet, provide_router, use_router};

use telemetry::init_telemetry;

/// 会话已在路由匹配时清除，这里只负责回到首页
#[component]
fn LogoutPage() -> impl IntoView {
    let router = use_router();
    // 渲染结束后再改路由
    spawn_local(async move {
        router.redirect(AppRoute::Events);
    });
}

/// 各路由对应的页面
fn page(route: AppRoute) -> AnyView {
    match route {
        AppRoute::Events => view! { <EventsPage /> }.into_any(),
        AppRoute::Auth => view! { <AuthPage /> }.into_any(),
        AppRoute::Logout => view! { <LogoutPage /> }.into_any(),
        AppRoute::MyTickets => view! { <TicketsPage /> }.into_any(),
        AppRoute::Favorites => view! { <FavoritesPage /> }.into_any(),
        AppRoute::Profile => view! { <ProfilePage /> }.into_any(),
        AppRoute::OrganizerDashboard => view! { <DashboardPage /> }.into_any(),
        AppRoute::OrganizerStats => view! { <StatsPage /> }.into_any(),
        AppRoute::OrganizerScan => view! { <ScanListPage /> }.into_any(),
        AppRoute::OrganizerScanEvent(id) => view! { <ScanEventPage id=id /> }.into_any(),
        AppRoute::NotFound => view! {
            <div class="flex items-center justify-center min-h-screen bg-base-200">
                <div class="text-center">
                    <h1 class="text-6xl font-bold text-error">"404"</h1>
                    <p class="text-xl mt-4">"Pagina nu a fost găsită"</p>
                </div>
            </div>
        }
        .into_any(),
    }
}

/// 路由匹配函数
///
/// 需要登录的页面统一包在 `ProtectedRoute` 里；`/auth` 与 `/logout` 先清空会话。
fn route_matcher(route: AppRoute) -> AnyView {
    if route.clears_session() {
        use_auth().logout();
    }
    match route.required_role() {
        Some(role) => view! {
            <ProtectedRoute role=role>{move || page(route)}</ProtectedRoute>
        }
        .into_any(),
        None => page(route),
    }
}

#[component]
pub fn App(config: ClientConfig) -> impl IntoView {
    // 1. 路由服务（监听 popstate）
    let router = provide_router();

    // 2. 认证上下文：401 时通过路由服务跳转到登录页
    let auth_ctx = AuthContext::new(config, router);
    provide_context(auth_ctx);

    view! { <RouterOutlet matcher=route_matcher /> }
}

/// 读取配置、初始化日志并挂载应用
pub fn start() {
    let config = match ClientConfig::from_build_env() {
        Ok(config) => config,
        Err(err) => {
            web_sys::console::error_1(&format!("invalid build configuration: {err}").into());
            ClientConfig::default()
        }
    };
    init_telemetry(&config);
    tracing::info!(api = %config.api_base_url, "starting UniEvent");

    mount_to_body(move || view! { <App config=config.clone() /> });
}
