//! 公共界面元素：导航栏、提示框、加载状态、日期格式

use crate::auth::use_auth;
use crate::web::route::AppRoute;
use crate::web::router::{Link, use_router};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use leptos::prelude::*;
use unievent::controllers::Loadable;

/// 页面内的一次性提示
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub message: String,
    pub is_error: bool,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
        }
    }
}

#[component]
pub fn NoticeBox(notice: RwSignal<Option<Notice>>) -> impl IntoView {
    move || {
        notice.get().map(|n| {
            let class = if n.is_error {
                "alert alert-error shadow"
            } else {
                "alert alert-success shadow"
            };
            view! {
                <div role="alert" class=class>
                    <span>{n.message}</span>
                    <button class="btn btn-ghost btn-xs" on:click=move |_| notice.set(None)>
                        "✕"
                    </button>
                </div>
            }
        })
    }
}

/// 加载中 / 失败 / 内容
#[component]
pub fn LoadableView<T, F, V>(state: RwSignal<Loadable<T>>, ready: F) -> impl IntoView
where
    T: Clone + Send + Sync + 'static,
    F: Fn(T) -> V + Send + Sync + 'static,
    V: IntoView + 'static,
{
    move || match state.get() {
        Loadable::Loading => view! {
            <div class="flex justify-center py-16">
                <span class="loading loading-spinner loading-lg text-primary"></span>
            </div>
        }
        .into_any(),
        Loadable::Failed(message) => view! {
            <div role="alert" class="alert alert-error">
                <span>{message}</span>
            </div>
        }
        .into_any(),
        Loadable::Ready(value) => ready(value).into_any(),
    }
}

#[component]
pub fn NavBar() -> impl IntoView {
    let auth = use_auth();
    let router = use_router();

    let on_logout = move |_| {
        auth.logout();
        router.navigate(AppRoute::Events);
    };

    view! {
        <div class="navbar bg-base-100 shadow mb-6">
            <div class="flex-1 gap-2">
                <Link to=AppRoute::Events class="btn btn-ghost text-xl">"UniEvent"</Link>
            </div>
            <div class="flex-none gap-1">
                {move || match auth.identity.get() {
                    None => view! {
                        <Link to=AppRoute::Auth class="btn btn-primary btn-sm">"Autentificare"</Link>
                    }
                    .into_any(),
                    Some(identity) => {
                        let organizer = identity.role.is_organizer();
                        view! {
                            <Link to=AppRoute::MyTickets class="btn btn-ghost btn-sm">"Biletele mele"</Link>
                            <Link to=AppRoute::Favorites class="btn btn-ghost btn-sm">"Favorite"</Link>
                            <Show when=move || organizer>
                                <Link to=AppRoute::OrganizerDashboard class="btn btn-ghost btn-sm">"Panou organizator"</Link>
                                <Link to=AppRoute::OrganizerScan class="btn btn-ghost btn-sm">"Scanare"</Link>
                                <Link to=AppRoute::OrganizerStats class="btn btn-ghost btn-sm">"Statistici"</Link>
                            </Show>
                            <Link to=AppRoute::Profile class="btn btn-ghost btn-circle avatar placeholder">
                                <div class="bg-neutral text-neutral-content rounded-full w-8">
                                    <span title=identity.display_name.clone()>{identity.initial().to_string()}</span>
                                </div>
                            </Link>
                            <button class="btn btn-outline btn-error btn-sm" on:click=on_logout>
                                "Ieșire"
                            </button>
                        }
                        .into_any()
                    }
                }}
            </div>
        </div>
    }
}

/// 本地时间，`dd.mm.yyyy HH:MM`
pub fn format_date(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|v| v.with_timezone(&Local).format("%d.%m.%Y %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// `<input type="datetime-local">` 的值
pub fn to_input_value(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|v| v.with_timezone(&Local).format("%Y-%m-%dT%H:%M").to_string())
        .unwrap_or_default()
}

pub fn from_input_value(raw: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%dT%H:%M").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

/// `<select>` 的值转成可选 id（空字符串表示“全部”）
pub fn parse_id(raw: &str) -> Option<u64> {
    raw.trim().parse().ok()
}
