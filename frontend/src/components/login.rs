use crate::auth::use_auth;
use crate::components::layout::{Notice, NoticeBox};
use crate::task::use_cancel_flag;
use crate::web::route::AppRoute;
use crate::web::router::use_router;
use leptos::prelude::*;
use leptos::task::spawn_local;
use unievent::controllers::auth::{AuthController, RegisterForm};
use unievent::{ClientError, FieldErrors};
use wasm_bindgen::prelude::*;

/// Google Identity Services 按钮回调的全局函数名（见 index.html）
const GOOGLE_CALLBACK: &str = "handleGoogleCredential";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Login,
    Register,
}

#[component]
pub fn AuthPage() -> impl IntoView {
    let auth = use_auth();
    let router = use_router();
    let cancel = use_cancel_flag();

    let mode = RwSignal::new(Mode::Login);
    let notice = RwSignal::new(Option::<Notice>::None);
    let field_errors = RwSignal::new(FieldErrors::new());
    let submitting = RwSignal::new(false);

    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let register = RwSignal::new(RegisterForm::default());

    let report = move |err: ClientError| {
        field_errors.set(err.field_errors().clone());
        notice.set(Some(Notice::error(err.message())));
    };

    let on_login = {
        let cancel = cancel.clone();
        move |ev: leptos::ev::SubmitEvent| {
            ev.prevent_default();
            if submitting.get_untracked() {
                return;
            }
            submitting.set(true);
            notice.set(None);
            let cancel = cancel.clone();
            spawn_local(async move {
                let result = auth
                    .login(&email.get_untracked(), &password.get_untracked())
                    .await;
                if cancel.is_cancelled() {
                    return;
                }
                submitting.set(false);
                match result {
                    Ok(landing) => router.navigate(landing),
                    Err(err) => report(err),
                }
            });
        }
    };

    let on_register = {
        let cancel = cancel.clone();
        move |ev: leptos::ev::SubmitEvent| {
            ev.prevent_default();
            if submitting.get_untracked() {
                return;
            }
            submitting.set(true);
            notice.set(None);
            field_errors.set(FieldErrors::new());
            let cancel = cancel.clone();
            let form = register.get_untracked();
            spawn_local(async move {
                let result = AuthController::new(auth.api()).register(&form).await;
                if cancel.is_cancelled() {
                    return;
                }
                submitting.set(false);
                match result {
                    Ok(_) => {
                        // 注册后不会自动登录
                        email.set(form.email.trim().to_string());
                        register.set(RegisterForm::default());
                        mode.set(Mode::Login);
                        notice.set(Some(Notice::info(
                            "Cont creat cu succes! Acum te poți autentifica.",
                        )));
                    }
                    Err(err) => report(err),
                }
            });
        }
    };

    install_google_callback(move |credential| {
        let cancel = cancel.clone();
        spawn_local(async move {
            let result = auth.google_login(&credential).await;
            if cancel.is_cancelled() {
                return;
            }
            match result {
                Ok(landing) => router.navigate(landing),
                Err(err) => report(err),
            }
        });
    });

    let field_error = move |name: &'static str| {
        move || {
            field_errors.with(|e| {
                e.field(name)
                    .first()
                    .map(|msg| view! { <span class="label-text-alt text-error">{msg.clone()}</span> })
            })
        }
    };

    let register_input = move |label: &'static str,
                               kind: &'static str,
                               name: &'static str,
                               get: fn(&RegisterForm) -> String,
                               set: fn(&mut RegisterForm, String)| {
        view! {
            <div class="form-control">
                <label class="label"><span class="label-text">{label}</span></label>
                <input
                    type=kind
                    class="input input-bordered"
                    prop:value=move || register.with(get)
                    on:input=move |ev| {
                        let value = event_target_value(&ev);
                        register.update(|f| set(f, value));
                    }
                />
                <label class="label">{field_error(name)}</label>
            </div>
        }
    };

    view! {
        <div class="hero min-h-screen bg-base-200">
            <div class="hero-content flex-col w-full max-w-md">
                <h1 class="text-3xl font-bold">"UniEvent"</h1>
                <div role="tablist" class="tabs tabs-boxed">
                    <a
                        role="tab"
                        class=move || if mode.get() == Mode::Login { "tab tab-active" } else { "tab" }
                        on:click=move |_| mode.set(Mode::Login)
                    >
                        "Autentificare"
                    </a>
                    <a
                        role="tab"
                        class=move || if mode.get() == Mode::Register { "tab tab-active" } else { "tab" }
                        on:click=move |_| mode.set(Mode::Register)
                    >
                        "Cont nou"
                    </a>
                </div>

                <NoticeBox notice=notice />

                <div class="card w-full shadow-2xl bg-base-100">
                    <Show
                        when=move || mode.get() == Mode::Login
                        fallback=move || view! {
                            <form class="card-body" on:submit=on_register.clone()>
                                {register_input("Prenume", "text", "first_name", |f| f.first_name.clone(), |f, v| f.first_name = v)}
                                {register_input("Nume", "text", "last_name", |f| f.last_name.clone(), |f, v| f.last_name = v)}
                                {register_input("Email", "email", "email", |f| f.email.clone(), |f, v| f.email = v)}
                                {register_input("Parolă", "password", "password", |f| f.password.clone(), |f, v| f.password = v)}
                                {register_input("Confirmă parola", "password", "password2", |f| f.password2.clone(), |f, v| f.password2 = v)}
                                <button class="btn btn-primary mt-4" disabled=move || submitting.get()>
                                    "Creează cont"
                                </button>
                            </form>
                        }
                    >
                        <form class="card-body" on:submit=on_login.clone()>
                            <div class="form-control">
                                <label class="label"><span class="label-text">"Email"</span></label>
                                <input
                                    type="email"
                                    class="input input-bordered"
                                    prop:value=email
                                    on:input=move |ev| email.set(event_target_value(&ev))
                                    required
                                />
                            </div>
                            <div class="form-control">
                                <label class="label"><span class="label-text">"Parolă"</span></label>
                                <input
                                    type="password"
                                    class="input input-bordered"
                                    prop:value=password
                                    on:input=move |ev| password.set(event_target_value(&ev))
                                    required
                                />
                            </div>
                            <button class="btn btn-primary mt-4" disabled=move || submitting.get()>
                                {move || if submitting.get() { "Se verifică..." } else { "Intră în cont" }}
                            </button>
                            <div class="divider">"sau"</div>
                            <div id="google-signin" class="flex justify-center"></div>
                        </form>
                    </Show>
                </div>

                <button class="btn btn-link" on:click=move |_| router.navigate(AppRoute::Events)>
                    "Înapoi la evenimente"
                </button>
            </div>
        </div>
    }
}

/// 注册 GIS 按钮的全局回调；回调参数里的 `credential` 是 Google 签发的 ID token
fn install_google_callback(on_credential: impl Fn(String) + 'static) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let callback = Closure::<dyn Fn(JsValue)>::new(move |response: JsValue| {
        let credential = js_sys::Reflect::get(&response, &JsValue::from_str("credential"))
            .ok()
            .and_then(|v| v.as_string());
        match credential {
            Some(credential) => on_credential(credential),
            None => tracing::warn!("google callback without credential"),
        }
    });
    if js_sys::Reflect::set(&window, &JsValue::from_str(GOOGLE_CALLBACK), callback.as_ref()).is_err() {
        tracing::warn!("could not register google callback");
    }
    // 页面存活期间回调都要有效
    callback.forget();
}
