use crate::auth::use_auth;
use crate::components::layout::{LoadableView, NavBar, Notice, NoticeBox, format_date};
use crate::task::use_cancel_flag;
use leptos::prelude::*;
use leptos::task::spawn_local;
use unievent::controllers::Loadable;
use unievent::controllers::favorites::{FavoritesController, FavoritesState};
use unievent_shared::FavoriteId;

#[component]
pub fn FavoritesPage() -> impl IntoView {
    let auth = use_auth();
    let cancel = use_cancel_flag();

    let state = RwSignal::new(Loadable::<FavoritesState>::Loading);
    let notice = RwSignal::new(Option::<Notice>::None);

    {
        let cancel = cancel.clone();
        spawn_local(async move {
            let result = FavoritesController::new(auth.api()).load().await;
            if cancel.is_cancelled() {
                return;
            }
            state.set(Loadable::from_result(
                result.map(|favorites| FavoritesState { favorites }),
                "Nu am putut încărca favoritele.",
            ));
        });
    }

    let on_remove = Callback::new(move |id: FavoriteId| {
        let cancel = cancel.clone();
        spawn_local(async move {
            let result = FavoritesController::new(auth.api()).remove(id).await;
            if cancel.is_cancelled() {
                return;
            }
            match result {
                Ok(id) => state.update(|s| {
                    if let Some(s) = s.ready_mut() {
                        s.apply_removed(id);
                    }
                }),
                Err(err) => notice.set(Some(Notice::error(err.message()))),
            }
        });
    });

    view! {
        <NavBar />
        <div class="max-w-4xl mx-auto p-4 space-y-4">
            <h1 class="text-2xl font-bold">"Favorite"</h1>
            <NoticeBox notice=notice />
            <LoadableView state=state ready={move |s: FavoritesState| {
                if s.favorites.is_empty() {
                    return view! { <p class="text-base-content/60">"Nu ai evenimente favorite."</p> }.into_any();
                }
                s.favorites
                    .into_iter()
                    .filter_map(|f| f.event.map(|e| (f.id, e)))
                    .map(|(id, event)| view! {
                        <div class="card bg-base-100 shadow-sm">
                            <div class="card-body py-4 flex-row justify-between items-center">
                                <div>
                                    <h3 class="font-semibold">{event.title.clone()}</h3>
                                    <p class="text-sm opacity-70">
                                        {format_date(event.start_date)} " · " {event.location_name().to_string()}
                                    </p>
                                </div>
                                <button class="btn btn-sm btn-outline" on:click=move |_| on_remove.run(id)>
                                    "Elimină"
                                </button>
                            </div>
                        </div>
                    })
                    .collect_view()
                    .into_any()
            }} />
        </div>
    }
}
