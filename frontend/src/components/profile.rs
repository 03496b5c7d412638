//! 个人资料：基本信息、修改密码、申请成为组织者

use crate::auth::use_auth;
use crate::components::layout::{LoadableView, NavBar, Notice, NoticeBox, format_date};
use crate::task::use_cancel_flag;
use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;
use unievent::FieldErrors;
use unievent::controllers::Loadable;
use unievent::controllers::profile::{OrganizerForm, PasswordForm, ProfileController};
use unievent_shared::{OrganizerRequest, User};

fn request_status_label(status: &str) -> &'static str {
    match status {
        "approved" => "Aprobată",
        "rejected" => "Respinsă",
        _ => "În așteptare",
    }
}

#[component]
pub fn ProfilePage() -> impl IntoView {
    let auth = use_auth();
    let cancel = use_cancel_flag();

    let profile = RwSignal::new(Loadable::<User>::Loading);
    let notice = RwSignal::new(Option::<Notice>::None);

    spawn_local(async move {
        let result = ProfileController::new(auth.api()).load_profile().await;
        if cancel.is_cancelled() {
            return;
        }
        profile.set(Loadable::from_result(result, "Nu am putut încărca profilul."));
    });

    view! {
        <NavBar />
        <div class="max-w-3xl mx-auto p-4 space-y-6">
            <h1 class="text-2xl font-bold">"Profil"</h1>
            <NoticeBox notice=notice />
            <LoadableView state=profile ready={move |user: User| view! {
                <div class="card bg-base-100 shadow">
                    <div class="card-body">
                        <h2 class="card-title">{user.display_name()}</h2>
                        <p>{user.email.clone()}</p>
                        <p class="text-sm opacity-70">"Membru din " {format_date(user.date_joined)}</p>
                        <div class="flex gap-2">
                            {user.is_student.then(|| view! { <span class="badge">"Student"</span> })}
                            {user.is_organizer.then(|| view! { <span class="badge badge-primary">"Organizator"</span> })}
                        </div>
                    </div>
                </div>
                {(!user.is_organizer).then(|| view! { <OrganizerRequestCard notice=notice /> })}
            }} />
            <PasswordCard notice=notice />
        </div>
    }
}

#[component]
fn PasswordCard(notice: RwSignal<Option<Notice>>) -> impl IntoView {
    let auth = use_auth();
    let cancel = use_cancel_flag();

    let form = RwSignal::new(PasswordForm::default());
    let errors = RwSignal::new(FieldErrors::new());
    let saving = RwSignal::new(false);

    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        if saving.get_untracked() {
            return;
        }
        saving.set(true);
        errors.set(FieldErrors::new());
        let values = form.get_untracked();
        let cancel = cancel.clone();
        spawn_local(async move {
            let result = ProfileController::new(auth.api())
                .change_password(&values)
                .await;
            if cancel.is_cancelled() {
                return;
            }
            saving.set(false);
            match result {
                Ok(message) => {
                    form.set(PasswordForm::default());
                    notice.set(Some(Notice::info(message)));
                }
                Err(err) => {
                    if err.field_errors().fields().next().is_none() {
                        notice.set(Some(Notice::error(err.message())));
                    }
                    errors.set(err.field_errors().clone());
                }
            }
        });
    };

    let field = move |label: &'static str,
                      name: &'static str,
                      get: fn(&PasswordForm) -> String,
                      set: fn(&mut PasswordForm, String)| {
        view! {
            <div class="form-control">
                <label class="label"><span class="label-text">{label}</span></label>
                <input
                    type="password"
                    class="input input-bordered"
                    prop:value=move || form.with(get)
                    on:input=move |ev| {
                        let value = event_target_value(&ev);
                        form.update(|f| set(f, value));
                    }
                />
                <label class="label">
                    {move || errors.with(|e| e.field(name).first().map(|m| view! {
                        <span class="label-text-alt text-error">{m.clone()}</span>
                    }))}
                </label>
            </div>
        }
    };

    view! {
        <div class="card bg-base-100 shadow">
            <form class="card-body" on:submit=on_submit>
                <h2 class="card-title">"Schimbă parola"</h2>
                {field("Parola actuală", "old_password", |f| f.old_password.clone(), |f, v| f.old_password = v)}
                {field("Parola nouă", "new_password", |f| f.new_password.clone(), |f, v| f.new_password = v)}
                {field("Confirmă parola nouă", "new_password2", |f| f.new_password2.clone(), |f, v| f.new_password2 = v)}
                <div class="card-actions justify-end">
                    <button type="submit" class="btn btn-primary" disabled=move || saving.get()>
                        "Salvează"
                    </button>
                </div>
            </form>
        </div>
    }
}

#[component]
fn OrganizerRequestCard(notice: RwSignal<Option<Notice>>) -> impl IntoView {
    let auth = use_auth();
    let cancel = use_cancel_flag();

    let existing = RwSignal::new(Loadable::<Option<OrganizerRequest>>::Loading);
    let form = RwSignal::new(OrganizerForm::default());
    let name_error = RwSignal::new(Option::<String>::None);
    let sending = RwSignal::new(false);

    {
        let cancel = cancel.clone();
        spawn_local(async move {
            let result = ProfileController::new(auth.api())
                .my_organizer_request()
                .await;
            if cancel.is_cancelled() {
                return;
            }
            existing.set(Loadable::from_result(result, "Nu am putut încărca cererea."));
        });
    }

    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        if sending.get_untracked() {
            return;
        }
        sending.set(true);
        name_error.set(None);
        let values = form.get_untracked();
        let cancel = cancel.clone();
        spawn_local(async move {
            let result = ProfileController::new(auth.api())
                .submit_organizer_request(&values)
                .await;
            if cancel.is_cancelled() {
                return;
            }
            sending.set(false);
            match result {
                Ok(request) => {
                    existing.set(Loadable::Ready(Some(request)));
                    notice.set(Some(Notice::info("Cererea a fost trimisă.")));
                }
                Err(err) => match err.field_errors().field("organization_name").first() {
                    Some(message) => name_error.set(Some(message.clone())),
                    None => notice.set(Some(Notice::error(err.message()))),
                },
            }
        });
    };

    view! {
        <div class="card bg-base-100 shadow">
            <div class="card-body">
                <h2 class="card-title">"Devino organizator"</h2>
                <LoadableView state=existing ready={move |request: Option<OrganizerRequest>| match request {
                    Some(request) => view! {
                        <p>
                            {request.organization_name.clone()} ": "
                            <span class="badge">{request_status_label(&request.status)}</span>
                        </p>
                        <p class="text-sm opacity-70">"Trimisă la " {format_date(request.created_at)}</p>
                    }
                    .into_any(),
                    None => view! {
                        <form class="space-y-2" on:submit=on_submit.clone()>
                            <input
                                class="input input-bordered w-full"
                                placeholder="Numele organizației"
                                prop:value=move || form.with(|f| f.organization_name.clone())
                                on:input=move |ev| {
                                    let value = event_target_value(&ev);
                                    form.update(|f| f.organization_name = value);
                                }
                            />
                            {move || name_error.get().map(|m| view! {
                                <span class="text-sm text-error">{m}</span>
                            })}
                            <textarea
                                class="textarea textarea-bordered w-full"
                                placeholder="Detalii"
                                prop:value=move || form.with(|f| f.details.clone())
                                on:input=move |ev| {
                                    let value = event_target_value(&ev);
                                    form.update(|f| f.details = value);
                                }
                            ></textarea>
                            <button type="submit" class="btn btn-primary" disabled=move || sending.get()>
                                "Trimite cererea"
                            </button>
                        </form>
                    }
                    .into_any(),
                }} />
            </div>
        </div>
    }
}
