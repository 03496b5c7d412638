//! 扫码签到
//!
//! 浏览器端不接摄像头：扫码枪或手动输入把载荷写进输入框，回车提交。
//! 会话锁与去重逻辑都在核心库里。

use crate::auth::use_auth;
use crate::components::layout::{LoadableView, NavBar, format_date};
use crate::task::use_cancel_flag;
use crate::web::route::AppRoute;
use crate::web::router::Link;
use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;
use unievent::controllers::Loadable;
use unievent::controllers::scanner::{
    ScanDeduper, ScanOutcome, ScanSession, ScanVerdict, ScannerController, SessionState,
    scannable_events,
};
use unievent_shared::{Event, EventId};

#[component]
pub fn ScanListPage() -> impl IntoView {
    let auth = use_auth();
    let cancel = use_cancel_flag();
    let events = RwSignal::new(Loadable::<Vec<Event>>::Loading);

    spawn_local(async move {
        let result = ScannerController::new(auth.api(), auth.clock())
            .load_scannable()
            .await;
        if cancel.is_cancelled() {
            return;
        }
        events.set(Loadable::from_result(
            result,
            "Nu am putut încărca evenimentele.",
        ));
    });

    view! {
        <NavBar />
        <div class="max-w-4xl mx-auto p-4 space-y-4">
            <h1 class="text-2xl font-bold">"Scanare bilete"</h1>
            <LoadableView state=events ready={move |list: Vec<Event>| {
                if list.is_empty() {
                    return view! {
                        <p class="opacity-70">"Nu ai evenimente publicate în desfășurare sau viitoare."</p>
                    }
                    .into_any();
                }
                let now = auth.clock().now();
                scannable_events(&list, now)
                    .into_iter()
                    .map(|(event, phase)| view! {
                        <div class="card bg-base-100 shadow-sm">
                            <div class="card-body py-3 flex-row justify-between items-center">
                                <div>
                                    <h3 class="font-semibold">{event.title.clone()}</h3>
                                    <p class="text-sm opacity-70">
                                        {format_date(event.start_date)} " · " {event.location_name().to_string()}
                                    </p>
                                </div>
                                <div class="flex gap-2 items-center">
                                    <span class="badge badge-outline">{phase.label()}</span>
                                    <Link to=AppRoute::OrganizerScanEvent(event.id) class="btn btn-sm btn-primary">
                                        "Scanează"
                                    </Link>
                                </div>
                            </div>
                        </div>
                    })
                    .collect_view()
                    .into_any()
            }} />
        </div>
    }
}

#[component]
pub fn ScanEventPage(id: EventId) -> impl IntoView {
    let auth = use_auth();
    let cancel = use_cancel_flag();

    let event = RwSignal::new(Loadable::<Event>::Loading);
    let session = RwSignal::new(ScanSession::default());
    let deduper = RwSignal::new(ScanDeduper::new(auth.api().config().scan_cooldown_ms));
    let input = RwSignal::new(String::new());
    let outcome = RwSignal::new(Option::<ScanOutcome>::None);
    let processed = RwSignal::new(0u32);

    {
        let cancel = cancel.clone();
        spawn_local(async move {
            let result = ScannerController::new(auth.api(), auth.clock())
                .load_event(id)
                .await;
            if cancel.is_cancelled() {
                return;
            }
            event.set(Loadable::from_result(
                result,
                "Nu am putut încărca evenimentul.",
            ));
        });
    }

    on_cleanup(move || {
        let _ = session.try_update(|s| s.stop());
    });

    let start = move |_| {
        if session.try_update(|s| s.begin()) != Some(true) {
            return;
        }
        deduper.update(|d| d.reset());
        outcome.set(None);
        session.update(|s| s.started());
        tracing::info!(event = id, "scan session started");
    };

    let stop = move |_| {
        session.update(|s| s.stop());
        input.set(String::new());
        tracing::info!(event = id, "scan session stopped");
    };

    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        if session.with_untracked(|s| s.state()) != SessionState::Running {
            return;
        }
        let text = input.get_untracked().trim().to_string();
        input.set(String::new());
        if text.is_empty() {
            return;
        }
        let now = auth.clock().now();
        if deduper.try_update(|d| d.accept(&text, now)) != Some(true) {
            tracing::debug!("duplicate scan ignored");
            return;
        }
        let Some(target) = event.with_untracked(|e| e.ready().cloned()) else {
            return;
        };
        let cancel = cancel.clone();
        spawn_local(async move {
            let result = ScannerController::new(auth.api(), auth.clock())
                .checkin(&target, &text)
                .await;
            if cancel.is_cancelled() {
                return;
            }
            processed.update(|n| *n += 1);
            outcome.set(Some(result));
        });
    };

    let running = move || session.with(|s| s.state()) == SessionState::Running;

    view! {
        <NavBar />
        <div class="max-w-2xl mx-auto p-4 space-y-4">
            <Link to=AppRoute::OrganizerScan class="btn btn-ghost btn-sm">"← Înapoi"</Link>
            <LoadableView state=event ready={move |event: Event| view! {
                <div>
                    <h1 class="text-2xl font-bold">{event.title.clone()}</h1>
                    <p class="opacity-70">{format_date(event.start_date)} " · " {event.location_name().to_string()}</p>
                </div>
            }} />

            <div class="card bg-base-100 shadow">
                <div class="card-body space-y-3">
                    <div class="flex justify-between items-center">
                        <span class="badge">{move || if running() { "Scanare activă" } else { "Scanare oprită" }}</span>
                        <span class="text-sm opacity-70">"Scanări: " {move || processed.get()}</span>
                    </div>
                    <Show
                        when=running
                        fallback=move || view! {
                            <button
                                class="btn btn-primary"
                                disabled=move || !event.with(|e| e.ready().is_some())
                                on:click=start
                            >
                                "Pornește scanarea"
                            </button>
                        }
                    >
                        <form on:submit=on_submit.clone() class="flex gap-2">
                            <input
                                class="input input-bordered flex-1 font-mono"
                                placeholder="Scanează sau introdu codul biletului"
                                autofocus=true
                                prop:value=move || input.get()
                                on:input=move |ev| input.set(event_target_value(&ev))
                            />
                            <button type="submit" class="btn btn-primary">"Trimite"</button>
                        </form>
                        <button class="btn btn-outline" on:click=stop>"Oprește scanarea"</button>
                    </Show>
                    {move || outcome.get().map(|o| view! { <OutcomeCard outcome=o /> })}
                </div>
            </div>
        </div>
    }
}

#[component]
fn OutcomeCard(outcome: ScanOutcome) -> impl IntoView {
    let class = match outcome.verdict {
        ScanVerdict::CheckedIn => "alert alert-success",
        ScanVerdict::AlreadyCheckedIn => "alert alert-warning",
        ScanVerdict::Refused => "alert alert-error",
    };

    view! {
        <div role="alert" class=class>
            <div>
                <p class="font-semibold">{outcome.message}</p>
                {outcome.attendee.map(|name| view! { <p class="text-sm">{name}</p> })}
            </div>
        </div>
    }
}
