//! 组织者面板：按状态分组的活动列表与草稿表单

use crate::auth::use_auth;
use crate::components::layout::{
    LoadableView, NavBar, Notice, NoticeBox, format_date, from_input_value, parse_id,
    to_input_value,
};
use crate::components::tickets::confirm;
use crate::task::use_cancel_flag;
use crate::web::file::{read_upload, selected_file};
use crate::web::route::AppRoute;
use crate::web::router::Link;
use leptos::prelude::*;
use leptos::task::spawn_local;
use unievent::FieldErrors;
use unievent::controllers::Loadable;
use unievent::controllers::events::{EventsController, ReferenceData};
use unievent::controllers::organizer::{EventDraft, OrganizerController, StatusGroups};
use unievent::request::FileUpload;
use unievent_shared::{Event, EventStatus};

/// 表单的打开状态：新建或编辑某个草稿
#[derive(Debug, Clone, PartialEq)]
enum Editing {
    New,
    Draft(Event),
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    let auth = use_auth();
    let cancel = use_cancel_flag();

    let groups = RwSignal::new(Loadable::<StatusGroups>::Loading);
    let reference = RwSignal::new(ReferenceData::default());
    let notice = RwSignal::new(Option::<Notice>::None);
    let editing = RwSignal::new(Option::<Editing>::None);

    let reload = {
        let cancel = cancel.clone();
        move || {
            let cancel = cancel.clone();
            spawn_local(async move {
                let result = OrganizerController::new(auth.api(), auth.clock())
                    .load_groups()
                    .await;
                if cancel.is_cancelled() {
                    return;
                }
                groups.set(Loadable::from_result(
                    result,
                    "Nu am putut încărca evenimentele tale.",
                ));
            });
        }
    };
    reload();

    {
        let cancel = cancel.clone();
        spawn_local(async move {
            let result = EventsController::new(auth.api()).load_reference().await;
            if cancel.is_cancelled() {
                return;
            }
            match result {
                Ok(data) => reference.set(data),
                Err(err) => tracing::warn!(error = %err, "reference data unavailable"),
            }
        });
    }

    let on_delete = Callback::new({
        let cancel = cancel.clone();
        move |event: Event| {
            if !confirm("Sigur vrei să ștergi acest draft?") {
                return;
            }
            let cancel = cancel.clone();
            spawn_local(async move {
                let result = OrganizerController::new(auth.api(), auth.clock())
                    .delete_draft(&event)
                    .await;
                if cancel.is_cancelled() {
                    return;
                }
                match result {
                    Ok(fresh) => groups.set(Loadable::Ready(fresh)),
                    Err(err) => notice.set(Some(Notice::error(err.message()))),
                }
            });
        }
    });

    let on_saved = Callback::new(move |message: String| {
        editing.set(None);
        notice.set(Some(Notice::info(message)));
        reload();
    });

    view! {
        <NavBar />
        <div class="max-w-6xl mx-auto p-4 space-y-6">
            <div class="flex justify-between items-center">
                <h1 class="text-2xl font-bold">"Panou organizator"</h1>
                <div class="flex gap-2">
                    <Link to=AppRoute::OrganizerStats class="btn btn-ghost">"Statistici"</Link>
                    <Link to=AppRoute::OrganizerScan class="btn btn-ghost">"Scanare bilete"</Link>
                    <button class="btn btn-primary" on:click=move |_| editing.set(Some(Editing::New))>
                        "Eveniment nou"
                    </button>
                </div>
            </div>
            <NoticeBox notice=notice />

            {move || editing.get().map(|mode| view! {
                <EventForm
                    mode=mode
                    reference=reference
                    on_saved=on_saved
                    on_close=Callback::new(move |_| editing.set(None))
                />
            })}

            <LoadableView state=groups ready={move |groups: StatusGroups| {
                groups
                    .sections()
                    .into_iter()
                    .map(|(title, events)| {
                        let rows = events
                            .iter()
                            .cloned()
                            .map(|event| view! {
                                <EventRow
                                    event=event
                                    on_edit=Callback::new(move |e: Event| editing.set(Some(Editing::Draft(e))))
                                    on_delete=on_delete
                                />
                            })
                            .collect_view();
                        let count = events.len();
                        view! {
                            <section class="space-y-2">
                                <h2 class="text-lg font-semibold">{title} " (" {count} ")"</h2>
                                {rows}
                            </section>
                        }
                    })
                    .collect_view()
            }} />
        </div>
    }
}

#[component]
fn EventRow(event: Event, on_edit: Callback<Event>, on_delete: Callback<Event>) -> impl IntoView {
    let is_draft = event.status.bucket() == EventStatus::Draft;
    let edit_event = event.clone();
    let delete_event = event.clone();

    view! {
        <div class="card bg-base-100 shadow-sm">
            <div class="card-body py-3 flex-row justify-between items-center">
                <div>
                    <h3 class="font-semibold">{event.title.clone()}</h3>
                    <p class="text-sm opacity-70">
                        {format_date(event.start_date)} " · " {event.location_name().to_string()}
                    </p>
                </div>
                <div class="flex gap-2 items-center">
                    <span class="badge">{event.status.label()}</span>
                    {is_draft.then(|| view! {
                        <button class="btn btn-sm" on:click=move |_| on_edit.run(edit_event.clone())>
                            "Editează"
                        </button>
                        <button
                            class="btn btn-sm btn-outline btn-error"
                            on:click=move |_| on_delete.run(delete_event.clone())
                        >
                            "Șterge"
                        </button>
                    })}
                </div>
            </div>
        </div>
    }
}

#[component]
fn EventForm(
    mode: Editing,
    reference: RwSignal<ReferenceData>,
    on_saved: Callback<String>,
    on_close: Callback<()>,
) -> impl IntoView {
    let auth = use_auth();
    let cancel = use_cancel_flag();

    let (existing, initial) = match mode {
        Editing::New => (None, EventDraft::default()),
        Editing::Draft(event) => {
            let draft = EventDraft::from_event(&event);
            (Some(event), draft)
        }
    };
    let is_new = existing.is_none();
    let draft = RwSignal::new(initial);
    let errors = RwSignal::new(FieldErrors::new());
    let general = RwSignal::new(Option::<String>::None);
    let saving = RwSignal::new(false);

    let save = move |status: EventStatus| {
        if saving.get_untracked() {
            return;
        }
        saving.set(true);
        errors.set(FieldErrors::new());
        general.set(None);
        let cancel = cancel.clone();
        let existing = existing.clone();
        let form = draft.get_untracked();
        spawn_local(async move {
            let ctl = OrganizerController::new(auth.api(), auth.clock());
            let result = match &existing {
                None => ctl.create(&form, status).await,
                Some(event) => ctl.update_draft(event, &form, status).await,
            };
            if cancel.is_cancelled() {
                return;
            }
            saving.set(false);
            match result {
                Ok(()) => on_saved.run(match status {
                    EventStatus::Pending => "Evenimentul a fost trimis la validare.".to_string(),
                    _ => "Draft salvat.".to_string(),
                }),
                Err(err) => {
                    if err.field_errors().fields().next().is_none() {
                        general.set(Some(err.message().to_string()));
                    }
                    errors.set(err.field_errors().clone());
                }
            }
        });
    };
    let save_draft = {
        let save = save.clone();
        move |_| save(EventStatus::Draft)
    };
    let submit = move |_| save(EventStatus::Pending);

    let error_for = move |field: &'static str| {
        move || {
            errors.with(|e| {
                e.field(field)
                    .first()
                    .map(|m| view! { <span class="label-text-alt text-error">{m.clone()}</span> })
            })
        }
    };

    let text_input = move |label: &'static str,
                           field: &'static str,
                           get: fn(&EventDraft) -> String,
                           set: fn(&mut EventDraft, String)| {
        view! {
            <div class="form-control">
                <label class="label"><span class="label-text">{label}</span></label>
                <input
                    class="input input-bordered"
                    prop:value=move || draft.with(get)
                    on:input=move |ev| {
                        let value = event_target_value(&ev);
                        draft.update(|d| set(d, value));
                    }
                />
                <label class="label">{error_for(field)}</label>
            </div>
        }
    };

    let date_input = move |label: &'static str,
                           field: &'static str,
                           get: fn(&EventDraft) -> Option<chrono::DateTime<chrono::Utc>>,
                           set: fn(&mut EventDraft, Option<chrono::DateTime<chrono::Utc>>)| {
        view! {
            <div class="form-control">
                <label class="label"><span class="label-text">{label}</span></label>
                <input
                    type="datetime-local"
                    class="input input-bordered"
                    prop:value=move || to_input_value(draft.with(get))
                    on:change=move |ev| {
                        let value = from_input_value(&event_target_value(&ev));
                        draft.update(|d| set(d, value));
                    }
                />
                <label class="label">{error_for(field)}</label>
            </div>
        }
    };

    let file_input = move |label: &'static str,
                           field: &'static str,
                           accept: &'static str,
                           get: fn(&EventDraft) -> Option<String>,
                           set: fn(&mut EventDraft, Option<FileUpload>)| {
        view! {
            <div class="form-control">
                <label class="label"><span class="label-text">{label}</span></label>
                <input
                    type="file"
                    accept=accept
                    class="file-input file-input-bordered"
                    on:change=move |ev| {
                        let picked = selected_file(&ev);
                        spawn_local(async move {
                            let upload = match picked {
                                Some(file) => read_upload(file).await,
                                None => None,
                            };
                            draft.try_update(|d| set(d, upload));
                        });
                    }
                />
                <label class="label">
                    {move || draft.with(get).map(|name| view! {
                        <span class="label-text-alt">{name}</span>
                    })}
                    {error_for(field)}
                </label>
            </div>
        }
    };

    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body">
                <h2 class="card-title">
                    {if is_new { "Eveniment nou" } else { "Editează draft" }}
                </h2>
                {move || general.get().map(|m| view! {
                    <div role="alert" class="alert alert-error"><span>{m}</span></div>
                })}

                <div class="grid md:grid-cols-2 gap-x-4">
                    {text_input("Titlu", "title", |d| d.title.clone(), |d, v| d.title = v)}
                    <div class="form-control">
                        <label class="label"><span class="label-text">"Categorie"</span></label>
                        <select
                            class="select select-bordered"
                            on:change=move |ev| {
                                let id = parse_id(&event_target_value(&ev));
                                draft.update(|d| d.category = id);
                            }
                        >
                            <option value="">"-"</option>
                            {move || reference.with(|r| r.categories.iter().map(|c| {
                                let selected = draft.with_untracked(|d| d.category == Some(c.id));
                                view! { <option value=c.id.to_string() selected=selected>{c.name.clone()}</option> }
                            }).collect_view())}
                        </select>
                        <label class="label">{error_for("category")}</label>
                    </div>
                    <div class="form-control">
                        <label class="label"><span class="label-text">"Facultate"</span></label>
                        <select
                            class="select select-bordered"
                            on:change=move |ev| {
                                let id = parse_id(&event_target_value(&ev));
                                draft.update(|d| {
                                    if d.faculty != id {
                                        d.department = None;
                                    }
                                    d.faculty = id;
                                });
                            }
                        >
                            <option value="">"-"</option>
                            {move || reference.with(|r| r.faculties.iter().map(|f| {
                                let selected = draft.with_untracked(|d| d.faculty == Some(f.id));
                                view! { <option value=f.id.to_string() selected=selected>{f.label()}</option> }
                            }).collect_view())}
                        </select>
                    </div>
                    <div class="form-control">
                        <label class="label"><span class="label-text">"Departament"</span></label>
                        <select
                            class="select select-bordered"
                            on:change=move |ev| {
                                let id = parse_id(&event_target_value(&ev));
                                draft.update(|d| d.department = id);
                            }
                        >
                            <option value="">"-"</option>
                            {move || {
                                let faculty = draft.with(|d| d.faculty);
                                reference.with(|r| r.departments_for(faculty).into_iter().map(|dep| {
                                    let selected = draft.with_untracked(|d| d.department == Some(dep.id));
                                    view! { <option value=dep.id.to_string() selected=selected>{dep.name.clone()}</option> }
                                }).collect_view())
                            }}
                        </select>
                    </div>
                    {text_input("Locație", "location_name", |d| d.location_name.clone(), |d, v| d.location_name = v)}
                    {text_input("Adresă", "location_address", |d| d.location_address.clone(), |d, v| d.location_address = v)}
                    {text_input("Link Google Maps", "google_maps_link", |d| d.google_maps_link.clone(), |d, v| d.google_maps_link = v)}
                    <div class="form-control">
                        <label class="label"><span class="label-text">"Număr maxim de participanți"</span></label>
                        <input
                            type="number"
                            min="1"
                            class="input input-bordered"
                            prop:value=move || draft.with(|d| d.max_participants.map(|m| m.to_string()).unwrap_or_default())
                            on:input=move |ev| {
                                let value = event_target_value(&ev).trim().parse().ok();
                                draft.update(|d| d.max_participants = value);
                            }
                        />
                        <label class="label">{error_for("max_participants")}</label>
                    </div>
                    {date_input("Început", "start_date", |d| d.start_date, |d, v| d.start_date = v)}
                    {date_input("Sfârșit", "end_date", |d| d.end_date, |d, v| d.end_date = v)}
                    {file_input(
                        "Imagine",
                        "image",
                        "image/*",
                        |d| d.image.as_ref().map(|f| f.file_name.clone()),
                        |d, v| d.image = v,
                    )}
                    {file_input(
                        "Fișier atașat",
                        "file",
                        "",
                        |d| d.file.as_ref().map(|f| f.file_name.clone()),
                        |d, v| d.file = v,
                    )}
                </div>
                <div class="form-control">
                    <label class="label"><span class="label-text">"Descriere"</span></label>
                    <textarea
                        class="textarea textarea-bordered h-28"
                        prop:value=move || draft.with(|d| d.description.clone())
                        on:input=move |ev| {
                            let value = event_target_value(&ev);
                            draft.update(|d| d.description = value);
                        }
                    ></textarea>
                    <label class="label">{error_for("description")}</label>
                </div>

                <div class="card-actions justify-end">
                    <button class="btn btn-ghost" on:click=move |_| on_close.run(())>"Renunță"</button>
                    <button class="btn" disabled=move || saving.get() on:click=save_draft>
                        "Salvează draft"
                    </button>
                    <button class="btn btn-primary" disabled=move || saving.get() on:click=submit>
                        "Trimite la validare"
                    </button>
                </div>
            </div>
        </div>
    }
}
