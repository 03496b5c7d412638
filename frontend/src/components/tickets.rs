//! 我的票据

use crate::auth::use_auth;
use crate::components::layout::{LoadableView, NavBar, Notice, NoticeBox, format_date};
use crate::task::use_cancel_flag;
use leptos::prelude::*;
use leptos::task::spawn_local;
use unievent::controllers::Loadable;
use unievent::controllers::tickets::{ReviewDraft, TicketsController, TicketsState};
use unievent::rules;
use unievent_shared::{Ticket, TicketId};

/// 浏览器原生确认框；拿不到 window 时按取消处理
pub fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

#[component]
pub fn TicketsPage() -> impl IntoView {
    let auth = use_auth();
    let cancel = use_cancel_flag();

    let state = RwSignal::new(Loadable::<TicketsState>::Loading);
    let notice = RwSignal::new(Option::<Notice>::None);

    {
        let cancel = cancel.clone();
        spawn_local(async move {
            let result = TicketsController::new(auth.api(), auth.clock()).load().await;
            if cancel.is_cancelled() {
                return;
            }
            state.set(Loadable::from_result(
                result.map(|tickets| TicketsState {
                    tickets,
                    expanded: None,
                }),
                "Nu am putut încărca biletele.",
            ));
        });
    }

    let on_cancel = {
        let cancel = cancel.clone();
        move |ticket: Ticket| {
            if !confirm("Sigur vrei să anulezi acest bilet?") {
                return;
            }
            let cancel = cancel.clone();
            spawn_local(async move {
                let result = TicketsController::new(auth.api(), auth.clock())
                    .cancel(&ticket)
                    .await;
                if cancel.is_cancelled() {
                    return;
                }
                match result {
                    Ok(id) => {
                        state.update(|s| {
                            if let Some(s) = s.ready_mut() {
                                s.apply_cancelled(id);
                            }
                        });
                        notice.set(Some(Notice::info("Biletul a fost anulat.")));
                    }
                    Err(err) => notice.set(Some(Notice::error(err.message()))),
                }
            });
        }
    };

    let on_review = {
        let cancel = cancel.clone();
        move |(ticket, draft): (Ticket, ReviewDraft)| {
            let cancel = cancel.clone();
            spawn_local(async move {
                let result = TicketsController::new(auth.api(), auth.clock())
                    .submit_review(&ticket, &draft)
                    .await;
                if cancel.is_cancelled() {
                    return;
                }
                match result {
                    Ok(_) => {
                        state.update(|s| {
                            if let Some(s) = s.ready_mut() {
                                s.apply_reviewed(ticket.event.id);
                            }
                        });
                        notice.set(Some(Notice::info("Mulțumim pentru recenzie!")));
                    }
                    Err(err) => notice.set(Some(Notice::error(err.message()))),
                }
            });
        }
    };

    let on_cancel = Callback::new(on_cancel);
    let on_review = Callback::new(on_review);
    let on_toggle = Callback::new(move |id: TicketId| {
        state.update(|s| {
            if let Some(s) = s.ready_mut() {
                s.toggle_expanded(id);
            }
        })
    });

    view! {
        <NavBar />
        <div class="max-w-4xl mx-auto p-4 space-y-6">
            <h1 class="text-2xl font-bold">"Biletele mele"</h1>
            <NoticeBox notice=notice />
            <LoadableView state=state ready={move |tickets: TicketsState| {
                let now = auth.clock().now();
                let (active, past) = rules::partition_tickets(&tickets.tickets, now);
                let row = |t: &Ticket| view! {
                    <TicketRow
                        ticket=t.clone()
                        expanded=tickets.expanded == Some(t.id)
                        on_toggle=on_toggle
                        on_cancel=on_cancel
                        on_review=on_review
                    />
                };
                let active = active.into_iter().map(row).collect_view();
                let past = past.into_iter().map(row).collect_view();
                view! {
                    <Show when={
                        let empty = tickets.tickets.is_empty();
                        move || empty
                    }>
                        <p class="text-base-content/60">"Nu ai încă bilete."</p>
                    </Show>
                    <section class="space-y-2">
                        <h2 class="text-lg font-semibold">"Evenimente viitoare"</h2>
                        {active}
                    </section>
                    <section class="space-y-2">
                        <h2 class="text-lg font-semibold">"Evenimente trecute"</h2>
                        {past}
                    </section>
                }
            }} />
        </div>
    }
}

#[component]
fn TicketRow(
    ticket: Ticket,
    expanded: bool,
    on_toggle: Callback<TicketId>,
    on_cancel: Callback<Ticket>,
    on_review: Callback<(Ticket, ReviewDraft)>,
) -> impl IntoView {
    let auth = use_auth();
    let ctl = TicketsController::new(auth.api(), auth.clock());
    let now = auth.clock().now();

    let id = ticket.id;
    let qr = ctl.qr_payload(&ticket).map_err(|e| e.message().to_string());
    let can_cancel = rules::check_cancel(&ticket, now).is_ok();
    let can_review = ctl.can_review(&ticket);

    let rating = RwSignal::new(5u8);
    let comment = RwSignal::new(String::new());

    let status = if ticket.is_checked_in {
        "badge badge-success"
    } else {
        "badge badge-ghost"
    };

    let cancel_ticket = ticket.clone();
    let review_ticket = ticket.clone();

    view! {
        <div class="card bg-base-100 shadow-sm">
            <div class="card-body py-4">
                <div class="flex justify-between items-center gap-2">
                    <div>
                        <h3 class="font-semibold">{ticket.event.title.clone()}</h3>
                        <p class="text-sm opacity-70">
                            {format_date(ticket.event.start_date)} " · " {ticket.event.location_name().to_string()}
                        </p>
                    </div>
                    <span class=status>
                        {if ticket.is_checked_in { "Validat" } else { "Nevalidat" }}
                    </span>
                </div>

                <div class="card-actions justify-end">
                    <button class="btn btn-sm" on:click=move |_| on_toggle.run(id)>
                        {if expanded { "Ascunde" } else { "Detalii" }}
                    </button>
                    <Show when=move || can_cancel>
                        {
                            let ticket = cancel_ticket.clone();
                            view! {
                                <button
                                    class="btn btn-sm btn-outline btn-error"
                                    on:click=move |_| on_cancel.run(ticket.clone())
                                >
                                    "Anulează"
                                </button>
                            }
                        }
                    </Show>
                </div>

                <Show when=move || expanded>
                    {
                        let qr = qr.clone();
                        move || match qr.clone() {
                            Ok(payload) => view! {
                                <div class="mockup-code text-xs">
                                    <pre><code>{payload}</code></pre>
                                </div>
                                <p class="text-xs opacity-60">"Arată acest cod organizatorului la intrare."</p>
                            }
                            .into_any(),
                            Err(reason) => view! {
                                <p class="text-sm opacity-70">{reason}</p>
                            }
                            .into_any(),
                        }
                    }
                </Show>

                <Show when=move || can_review>
                    {
                        let ticket = review_ticket.clone();
                        view! {
                            <div class="flex flex-wrap gap-2 items-center">
                                <select
                                    class="select select-bordered select-sm"
                                    on:change=move |ev| {
                                        rating.set(event_target_value(&ev).parse().unwrap_or(0));
                                    }
                                >
                                    {(1..=5u8).rev().map(|r| view! {
                                        <option value=r.to_string() selected=r == 5>{"★".repeat(r as usize)}</option>
                                    }).collect_view()}
                                </select>
                                <input
                                    class="input input-bordered input-sm flex-1"
                                    placeholder="Comentariu (opțional)"
                                    prop:value=comment
                                    on:input=move |ev| comment.set(event_target_value(&ev))
                                />
                                <button
                                    class="btn btn-sm btn-primary"
                                    on:click=move |_| {
                                        let draft = ReviewDraft {
                                            rating: rating.get_untracked(),
                                            comment: comment.get_untracked(),
                                        };
                                        on_review.run((ticket.clone(), draft));
                                    }
                                >
                                    "Trimite recenzia"
                                </button>
                            </div>
                        }
                    }
                </Show>
            </div>
        </div>
    }
}
