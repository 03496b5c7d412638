//! 统计页：选择一个已结束的活动，查看签到率与评价

use crate::auth::use_auth;
use crate::components::layout::{LoadableView, NavBar, format_date};
use crate::task::use_cancel_flag;
use leptos::prelude::*;
use leptos::task::spawn_local;
use unievent::controllers::Loadable;
use unievent::controllers::stats::{StatsController, average, initials, percent, rating_bars};
use unievent_shared::{Event, EventId, EventStats, Review};

#[component]
pub fn StatsPage() -> impl IntoView {
    let auth = use_auth();
    let cancel = use_cancel_flag();

    let events = RwSignal::new(Loadable::<Vec<Event>>::Loading);
    let selected = RwSignal::new(Option::<EventId>::None);
    let stats = RwSignal::new(Option::<Loadable<EventStats>>::None);

    {
        let cancel = cancel.clone();
        spawn_local(async move {
            let result = StatsController::new(auth.api(), auth.clock())
                .load_ended()
                .await;
            if cancel.is_cancelled() {
                return;
            }
            events.set(Loadable::from_result(
                result,
                "Nu am putut încărca evenimentele.",
            ));
        });
    }

    let on_select = Callback::new(move |id: EventId| {
        selected.set(Some(id));
        stats.set(Some(Loadable::Loading));
        let cancel = cancel.clone();
        spawn_local(async move {
            let result = StatsController::new(auth.api(), auth.clock())
                .load_stats(id)
                .await;
            // 用户可能已经切换到另一个活动
            if cancel.is_cancelled() || selected.get_untracked() != Some(id) {
                return;
            }
            stats.set(Some(Loadable::from_result(
                result,
                "Nu am putut încărca statisticile.",
            )));
        });
    });

    view! {
        <NavBar />
        <div class="max-w-6xl mx-auto p-4 grid md:grid-cols-3 gap-6">
            <div class="space-y-2">
                <h1 class="text-2xl font-bold">"Statistici"</h1>
                <LoadableView state=events ready={move |list: Vec<Event>| {
                    if list.is_empty() {
                        return view! {
                            <p class="opacity-70">"Nu ai evenimente încheiate."</p>
                        }
                        .into_any();
                    }
                    list.into_iter()
                        .map(|event| {
                            let id = event.id;
                            let class = move || {
                                if selected.get() == Some(id) {
                                    "btn btn-primary btn-block justify-start"
                                } else {
                                    "btn btn-ghost btn-block justify-start"
                                }
                            };
                            view! {
                                <button class=class on:click=move |_| on_select.run(id)>
                                    <span class="truncate">{event.title.clone()}</span>
                                    <span class="text-xs opacity-60">{format_date(event.end_date)}</span>
                                </button>
                            }
                        })
                        .collect_view()
                        .into_any()
                }} />
            </div>
            <div class="md:col-span-2">
                {move || match stats.get() {
                    None => view! {
                        <p class="opacity-70">"Alege un eveniment pentru a vedea statisticile."</p>
                    }
                    .into_any(),
                    Some(Loadable::Loading) => view! {
                        <span class="loading loading-spinner loading-lg text-primary"></span>
                    }
                    .into_any(),
                    Some(Loadable::Failed(message)) => view! {
                        <div role="alert" class="alert alert-error"><span>{message}</span></div>
                    }
                    .into_any(),
                    Some(Loadable::Ready(s)) => view! { <StatsPanel stats=s /> }.into_any(),
                }}
            </div>
        </div>
    }
}

#[component]
fn StatsPanel(stats: EventStats) -> impl IntoView {
    let bars = rating_bars(&stats)
        .into_iter()
        .map(|(star, count, width)| {
            view! {
                <div class="flex items-center gap-2">
                    <span class="w-8">{star} "★"</span>
                    <progress class="progress progress-warning flex-1" value=width max="100"></progress>
                    <span class="w-8 text-right">{count}</span>
                </div>
            }
        })
        .collect_view();

    let reviews = if stats.latest_reviews.is_empty() {
        view! { <p class="opacity-70">"Nu există recenzii încă."</p> }.into_any()
    } else {
        stats
            .latest_reviews
            .iter()
            .cloned()
            .map(|review| view! { <ReviewItem review=review /> })
            .collect_view()
            .into_any()
    };

    view! {
        <div class="space-y-6">
            <div class="stats shadow w-full">
                <div class="stat">
                    <div class="stat-title">"Bilete"</div>
                    <div class="stat-value">{stats.tickets_total}</div>
                </div>
                <div class="stat">
                    <div class="stat-title">"Prezenți"</div>
                    <div class="stat-value">{stats.checked_in_total}</div>
                    <div class="stat-desc">{percent(stats.checkin_rate)} " rată de prezență"</div>
                </div>
                <div class="stat">
                    <div class="stat-title">"Rating mediu"</div>
                    <div class="stat-value">{average(stats.avg_rating)}</div>
                    <div class="stat-desc">{stats.reviews_count} " recenzii"</div>
                </div>
            </div>
            <div class="card bg-base-100 shadow">
                <div class="card-body">
                    <h2 class="card-title">"Distribuția notelor"</h2>
                    {bars}
                </div>
            </div>
            <div class="card bg-base-100 shadow">
                <div class="card-body space-y-3">
                    <h2 class="card-title">"Ultimele recenzii"</h2>
                    {reviews}
                </div>
            </div>
        </div>
    }
}

#[component]
fn ReviewItem(review: Review) -> impl IntoView {
    let name = review
        .user
        .as_ref()
        .map(|u| u.display_name())
        .unwrap_or_else(|| "Utilizator".to_string());
    let stars = "★".repeat(usize::from(review.rating.min(5)));

    view! {
        <div class="flex gap-3">
            <div class="avatar placeholder">
                <div class="bg-neutral text-neutral-content rounded-full w-10">
                    <span>{initials(review.user.as_ref())}</span>
                </div>
            </div>
            <div>
                <div class="font-semibold">{name} " " <span class="text-warning">{stars}</span></div>
                <div class="text-xs opacity-60">{format_date(review.created_at)}</div>
                <p>{review.comment}</p>
            </div>
        </div>
    }
}
