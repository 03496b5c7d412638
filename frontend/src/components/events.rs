//! 活动列表（首页）

use crate::auth::use_auth;
use crate::components::layout::{NavBar, Notice, NoticeBox, format_date, parse_id};
use crate::task::use_cancel_flag;
use crate::web::route::AppRoute;
use crate::web::router::use_router;
use chrono::Local;
use leptos::prelude::*;
use leptos::task::spawn_local;
use unievent::controllers::events::{EventsController, EventsState};
use unievent::filter::DayFilter;
use unievent::rules;
use unievent_shared::{Event, EventId};

#[component]
pub fn EventsPage() -> impl IntoView {
    let auth = use_auth();
    let router = use_router();
    let cancel = use_cancel_flag();

    let state = RwSignal::new(EventsState::default());
    let loading = RwSignal::new(true);
    let notice = RwSignal::new(Option::<Notice>::None);
    let buying = RwSignal::new(Option::<EventId>::None);
    let day_raw = RwSignal::new((String::new(), String::new()));

    let load_events = {
        let cancel = cancel.clone();
        move || {
            let cancel = cancel.clone();
            let query = state.with_untracked(|s| s.query.clone());
            loading.set(true);
            spawn_local(async move {
                let result = EventsController::new(auth.api()).load_events(&query).await;
                if cancel.is_cancelled() {
                    return;
                }
                loading.set(false);
                match result {
                    Ok(events) => state.update(|s| s.events = events),
                    Err(err) => {
                        tracing::warn!(error = %err, "events load failed");
                        notice.set(Some(Notice::error(
                            "Nu am putut încărca evenimentele. Verifică serverul.",
                        )));
                    }
                }
            });
        }
    };

    // 初始加载：参考数据、（登录时）收藏和票据、活动列表
    {
        let cancel = cancel.clone();
        let logged_in = auth.identity.get_untracked().is_some();
        spawn_local(async move {
            let ctl = EventsController::new(auth.api());
            let reference = ctl.load_reference().await;
            if cancel.is_cancelled() {
                return;
            }
            match reference {
                Ok(reference) => state.update(|s| s.reference = reference),
                Err(err) => tracing::warn!(error = %err, "reference data unavailable"),
            }
            if !logged_in {
                return;
            }
            let (favorites, tickets) = (ctl.load_favorite_map().await, ctl.load_ticket_set().await);
            if cancel.is_cancelled() {
                return;
            }
            state.update(|s| {
                s.favorites = favorites.unwrap_or_default();
                s.tickets = tickets.unwrap_or_default();
            });
        });
    }
    load_events();

    let on_search = {
        let load_events = load_events.clone();
        move |ev: leptos::ev::SubmitEvent| {
            ev.prevent_default();
            load_events();
        }
    };

    let toggle_favorite = {
        let cancel = cancel.clone();
        move |event: EventId| {
            if auth.identity.get_untracked().is_none() {
                router.navigate(AppRoute::Auth);
                return;
            }
            let cancel = cancel.clone();
            let favorites = state.with_untracked(|s| s.favorites.clone());
            spawn_local(async move {
                let result = EventsController::new(auth.api())
                    .toggle_favorite(&favorites, event)
                    .await;
                if cancel.is_cancelled() {
                    return;
                }
                match result {
                    Ok(change) => state.update(|s| s.apply_favorite(change)),
                    Err(err) => notice.set(Some(Notice::error(err.message()))),
                }
            });
        }
    };

    let buy = {
        let cancel = cancel.clone();
        move |event: EventId| {
            if auth.identity.get_untracked().is_none() {
                router.navigate(AppRoute::Auth);
                return;
            }
            if buying.get_untracked().is_some() {
                return;
            }
            buying.set(Some(event));
            let cancel = cancel.clone();
            spawn_local(async move {
                let result = EventsController::new(auth.api()).buy_ticket(event).await;
                if cancel.is_cancelled() {
                    return;
                }
                buying.set(None);
                match result {
                    Ok(_) => {
                        state.update(|s| s.apply_ticket_bought(event));
                        notice.set(Some(Notice::info(
                            "Te-ai înscris! Găsești biletul în „Biletele mele”.",
                        )));
                    }
                    Err(err) => notice.set(Some(Notice::error(err.message()))),
                }
            });
        }
    };

    let visible = move || {
        let now = Local::now();
        state.with(|s| s.visible(&now).into_iter().cloned().collect::<Vec<Event>>())
    };

    view! {
        <NavBar />
        <div class="max-w-6xl mx-auto p-4 space-y-6">
            <NoticeBox notice=notice />

            <form class="flex flex-wrap gap-2 items-end" on:submit=on_search>
                <input
                    type="search"
                    class="input input-bordered flex-1"
                    placeholder="Caută evenimente..."
                    prop:value=move || state.with(|s| s.query.search.clone())
                    on:input=move |ev| {
                        let value = event_target_value(&ev);
                        state.update(|s| s.query.search = value);
                    }
                />
                <select
                    class="select select-bordered"
                    on:change=move |ev| {
                        let faculty = parse_id(&event_target_value(&ev));
                        state.update(|s| s.set_faculty(faculty));
                    }
                >
                    <option value="">"Toate facultățile"</option>
                    {move || state.with(|s| s.reference.faculties.iter().map(|f| {
                        view! { <option value=f.id.to_string()>{f.label()}</option> }
                    }).collect_view())}
                </select>
                <select
                    class="select select-bordered"
                    on:change=move |ev| {
                        let category = parse_id(&event_target_value(&ev));
                        state.update(|s| s.query.category = category);
                    }
                >
                    <option value="">"Toate categoriile"</option>
                    {move || state.with(|s| s.reference.categories.iter().map(|c| {
                        view! { <option value=c.id.to_string()>{c.name.clone()}</option> }
                    }).collect_view())}
                </select>
                <button class="btn btn-primary">"Caută"</button>
            </form>

            <div class="flex flex-wrap gap-2">
                <select
                    class="select select-bordered select-sm"
                    prop:value=move || state.with(|s| s.filter.department.map(|d| d.to_string()).unwrap_or_default())
                    on:change=move |ev| {
                        let department = parse_id(&event_target_value(&ev));
                        state.update(|s| s.filter.department = department);
                    }
                >
                    <option value="">"Toate departamentele"</option>
                    {move || state.with(|s| s.reference.departments_for(s.query.faculty).into_iter().map(|d| {
                        view! { <option value=d.id.to_string()>{d.name.clone()}</option> }
                    }).collect_view())}
                </select>
                <input
                    type="text"
                    class="input input-bordered input-sm"
                    placeholder="Locație"
                    on:input=move |ev| {
                        let value = event_target_value(&ev);
                        state.update(|s| s.filter.location_query = value);
                    }
                />
                <select
                    class="select select-bordered select-sm"
                    on:change=move |ev| {
                        let day = event_target_value(&ev);
                        day_raw.update(|d| d.0 = day);
                        let (day, date) = day_raw.get_untracked();
                        state.update(|s| s.filter.day = DayFilter::from_form(&day, &date));
                    }
                >
                    <option value="">"Oricând"</option>
                    <option value="today">"Azi"</option>
                    <option value="date">"Dată anume"</option>
                </select>
                <Show when=move || day_raw.with(|d| d.0 == "date")>
                    <input
                        type="date"
                        class="input input-bordered input-sm"
                        on:input=move |ev| {
                            let date = event_target_value(&ev);
                            day_raw.update(|d| d.1 = date);
                            let (day, date) = day_raw.get_untracked();
                            state.update(|s| s.filter.day = DayFilter::from_form(&day, &date));
                        }
                    />
                </Show>
            </div>

            <Show when=move || loading.get()>
                <div class="flex justify-center py-8">
                    <span class="loading loading-spinner loading-lg text-primary"></span>
                </div>
            </Show>
            <Show when=move || !loading.get() && visible().is_empty()>
                <p class="text-center text-base-content/60 py-8">"Nu am găsit evenimente."</p>
            </Show>

            <div class="grid gap-4 md:grid-cols-2 lg:grid-cols-3">
                <For
                    each=visible
                    key=|e| (e.id, e.tickets_count)
                    children=move |event| {
                        let id = event.id;
                        let toggle_favorite = toggle_favorite.clone();
                        let buy = buy.clone();
                        view! {
                            <EventCard
                                event=event
                                is_favorite=Signal::derive(move || state.with(|s| s.is_favorite(id)))
                                has_ticket=Signal::derive(move || state.with(|s| s.has_ticket(id)))
                                is_buying=Signal::derive(move || buying.get() == Some(id))
                                on_favorite=Callback::new(move |_| toggle_favorite(id))
                                on_buy=Callback::new(move |_| buy(id))
                            />
                        }
                    }
                />
            </div>
        </div>
    }
}

#[component]
fn EventCard(
    event: Event,
    is_favorite: Signal<bool>,
    has_ticket: Signal<bool>,
    is_buying: Signal<bool>,
    on_favorite: Callback<()>,
    on_buy: Callback<()>,
) -> impl IntoView {
    let auth = use_auth();
    let image = event
        .image
        .as_deref()
        .and_then(|path| auth.api().config().media_url(path));

    let availability = {
        let event = event.clone();
        move || {
            rules::signup_availability(
                &event,
                has_ticket.get(),
                is_buying.get(),
                auth.clock().now(),
            )
        }
    };
    let seats = rules::seats_left(&event);

    view! {
        <div class="card bg-base-100 shadow">
            {image.map(|src| view! { <figure><img src=src alt=event.title.clone() class="h-40 w-full object-cover" /></figure> })}
            <div class="card-body">
                <div class="flex justify-between items-start gap-2">
                    <h2 class="card-title">{event.title.clone()}</h2>
                    <button
                        class="btn btn-ghost btn-sm btn-circle"
                        title="Favorit"
                        on:click=move |_| on_favorite.run(())
                    >
                        {move || if is_favorite.get() { "♥" } else { "♡" }}
                    </button>
                </div>
                <p class="text-sm opacity-70">{format_date(event.start_date)}</p>
                <p class="text-sm">{event.location_name().to_string()}</p>
                <p class="text-sm opacity-70">{event.organizer_name()}</p>
                {event.category.as_ref().map(|c| view! { <span class="badge badge-outline">{c.name.clone()}</span> })}
                <p class="line-clamp-3">{event.description.clone()}</p>
                {seats.map(|left| view! { <p class="text-sm">"Locuri rămase: " {left}</p> })}
                <div class="card-actions justify-end">
                    {
                        let availability = availability.clone();
                        move || {
                            let state = availability();
                            let title = state.err().map(|b| b.hint()).unwrap_or_default();
                            view! {
                                <button
                                    class="btn btn-primary btn-sm"
                                    title=title
                                    disabled=state.is_err()
                                    on:click=move |_| on_buy.run(())
                                >
                                    {rules::signup_label(state)}
                                </button>
                            }
                        }
                    }
                </div>
            </div>
        </div>
    }
}
