use crate::api::UniEventApi;
use crate::controllers::page_message;
use crate::error::ClientResult;
use crate::request::HttpClient;
use unievent_shared::protocol::{ListFavoritesRequest, RemoveFavoriteRequest};
use unievent_shared::{Favorite, FavoriteId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavoritesState {
    pub favorites: Vec<Favorite>,
}

impl FavoritesState {
    pub fn apply_removed(&mut self, id: FavoriteId) {
        self.favorites.retain(|f| f.id != id);
    }
}

pub struct FavoritesController<C> {
    api: UniEventApi<C>,
}

impl<C: HttpClient> FavoritesController<C> {
    pub fn new(api: UniEventApi<C>) -> Self {
        Self { api }
    }

    /// 后端已删除活动的收藏条目（`event` 为空）不展示
    pub async fn load(&self) -> ClientResult<Vec<Favorite>> {
        let favorites = self.api.send(&ListFavoritesRequest).await.map_err(|e| {
            let message = page_message(&e, "Nu am putut încărca favoritele.");
            e.with_message(message).in_op("favorites.load")
        })?;
        Ok(favorites.into_iter().filter(|f| f.event.is_some()).collect())
    }

    pub async fn remove(&self, id: FavoriteId) -> ClientResult<FavoriteId> {
        self.api
            .send(&RemoveFavoriteRequest { favorite_id: id })
            .await
            .map_err(|e| e.in_op_with("favorites.remove", id.to_string()))?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::Harness;
    use crate::request::HttpMethod;
    use serde_json::json;

    #[tokio::test]
    async fn remove_drops_one_entry() {
        let h = Harness::logged_in("a", "r");
        h.client.mock_response(
            HttpMethod::Get,
            "/api/interactions/favorites/",
            200,
            json!([
                {"id": 1, "event": {"id": 7}},
                {"id": 2, "event": {"id": 8}},
                {"id": 3, "event": null}
            ]),
        );
        h.client
            .mock_empty(HttpMethod::Delete, "/api/interactions/favorites/1/", 204);

        let ctl = FavoritesController::new(h.api.clone());
        let mut state = FavoritesState {
            favorites: ctl.load().await.unwrap(),
        };
        assert_eq!(state.favorites.len(), 2);

        let removed = ctl.remove(1).await.unwrap();
        state.apply_removed(removed);
        assert_eq!(state.favorites.len(), 1);
        assert_eq!(state.favorites[0].id, 2);
    }

    #[tokio::test]
    async fn failed_remove_is_reported() {
        let h = Harness::logged_in("a", "r");
        let ctl = FavoritesController::new(h.api.clone());
        // 没有登记响应 -> 404
        let err = ctl.remove(9).await.unwrap_err();
        assert_eq!(err.kind, crate::error::ClientErrorKind::NotFound);
        assert!(h.api.session().is_logged_in());
    }
}
