//! 活动列表页

use crate::api::{UniEventApi, is_handled_globally};
use crate::error::{ClientError, ClientErrorKind, ClientResult};
use crate::filter::EventFilter;
use crate::request::HttpClient;
use chrono::{DateTime, TimeZone};
use std::collections::{BTreeMap, BTreeSet};
use unievent_shared::protocol::{
    AddFavoriteRequest, BuyTicketRequest, ListCategoriesRequest, ListDepartmentsRequest,
    ListEventsRequest, ListFacultiesRequest, ListFavoritesRequest, ListTicketsRequest,
    RemoveFavoriteRequest,
};
use unievent_shared::{Category, Department, Event, EventId, Faculty, FavoriteId, TicketReceipt};

// =========================================================
// 视图状态
// =========================================================

/// 下拉框的参考数据
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceData {
    pub faculties: Vec<Faculty>,
    pub departments: Vec<Department>,
    pub categories: Vec<Category>,
}

impl ReferenceData {
    /// 选中学院后只提供该学院的系
    pub fn departments_for(&self, faculty: Option<u64>) -> Vec<&Department> {
        match faculty {
            None => self.departments.iter().collect(),
            Some(id) => self
                .departments
                .iter()
                .filter(|d| d.faculty.as_ref().map(|f| f.id) == Some(id))
                .collect(),
        }
    }
}

/// 服务端查询条件（只包含后端支持的过滤）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    pub search: String,
    pub faculty: Option<u64>,
    pub category: Option<u64>,
}

impl EventQuery {
    pub fn to_request(&self) -> ListEventsRequest {
        ListEventsRequest {
            search: Some(self.search.clone()),
            faculty: self.faculty,
            category: self.category,
        }
    }
}

/// 收藏关系的本地修补
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteChange {
    Added { event: EventId, favorite: FavoriteId },
    Removed { event: EventId },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventsState {
    pub query: EventQuery,
    pub filter: EventFilter,
    pub events: Vec<Event>,
    /// event id -> favorite id
    pub favorites: BTreeMap<EventId, FavoriteId>,
    /// 已持有票据的活动
    pub tickets: BTreeSet<EventId>,
    pub reference: ReferenceData,
}

impl EventsState {
    /// 切换学院会重置系的过滤
    pub fn set_faculty(&mut self, faculty: Option<u64>) {
        if self.query.faculty != faculty {
            self.filter.department = None;
        }
        self.query.faculty = faculty;
    }

    pub fn visible<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<&Event> {
        self.filter.apply(&self.events, now)
    }

    pub fn is_favorite(&self, event: EventId) -> bool {
        self.favorites.contains_key(&event)
    }

    pub fn has_ticket(&self, event: EventId) -> bool {
        self.tickets.contains(&event)
    }

    pub fn apply_favorite(&mut self, change: FavoriteChange) {
        match change {
            FavoriteChange::Added { event, favorite } => {
                self.favorites.insert(event, favorite);
            }
            FavoriteChange::Removed { event } => {
                self.favorites.remove(&event);
            }
        }
    }

    /// 购票成功：只修补这一个活动的计数
    pub fn apply_ticket_bought(&mut self, event: EventId) {
        self.tickets.insert(event);
        if let Some(ev) = self.events.iter_mut().find(|e| e.id == event) {
            ev.tickets_count = Some(ev.tickets_sold() + 1);
            if let Some(left) = ev.seats_left.as_mut() {
                *left = left.saturating_sub(1);
            }
        }
    }
}

// =========================================================
// 控制器
// =========================================================

pub struct EventsController<C> {
    api: UniEventApi<C>,
}

impl<C: HttpClient> EventsController<C> {
    pub fn new(api: UniEventApi<C>) -> Self {
        Self { api }
    }

    pub async fn load_events(&self, query: &EventQuery) -> ClientResult<Vec<Event>> {
        self.api
            .send(&query.to_request())
            .await
            .map_err(|e| e.in_op("events.load"))
    }

    /// 三个列表并发加载
    pub async fn load_reference(&self) -> ClientResult<ReferenceData> {
        let (faculties, departments, categories) = futures::try_join!(
            self.api.send(&ListFacultiesRequest),
            self.api.send(&ListDepartmentsRequest),
            self.api.send(&ListCategoriesRequest),
        )
        .map_err(|e| e.in_op("events.load_reference"))?;

        Ok(ReferenceData {
            faculties,
            departments,
            categories,
        })
    }

    /// 进入页面时加载收藏映射；401 已由全局处理，这里只返回空映射
    pub async fn load_favorite_map(&self) -> ClientResult<BTreeMap<EventId, FavoriteId>> {
        match self.api.send(&ListFavoritesRequest).await {
            Ok(favorites) => Ok(favorites
                .into_iter()
                .filter_map(|f| f.event.map(|e| (e.id, f.id)))
                .collect()),
            Err(err) if is_handled_globally(&err) => Ok(BTreeMap::new()),
            Err(err) => Err(err.in_op("events.load_favorites")),
        }
    }

    pub async fn load_ticket_set(&self) -> ClientResult<BTreeSet<EventId>> {
        match self.api.send(&ListTicketsRequest).await {
            Ok(tickets) => Ok(tickets.into_iter().map(|t| t.event.id).collect()),
            Err(err) if is_handled_globally(&err) => Ok(BTreeSet::new()),
            Err(err) => Err(err.in_op("events.load_tickets")),
        }
    }

    /// 根据当前映射决定添加还是删除
    pub async fn toggle_favorite(
        &self,
        favorites: &BTreeMap<EventId, FavoriteId>,
        event: EventId,
    ) -> ClientResult<FavoriteChange> {
        match favorites.get(&event).copied() {
            Some(favorite_id) => {
                self.api
                    .send(&RemoveFavoriteRequest { favorite_id })
                    .await
                    .map_err(|e| e.in_op_with("events.remove_favorite", event.to_string()))?;
                Ok(FavoriteChange::Removed { event })
            }
            None => {
                let favorite = self
                    .api
                    .send(&AddFavoriteRequest { event_id: event })
                    .await
                    .map_err(|e| e.in_op_with("events.add_favorite", event.to_string()))?;
                Ok(FavoriteChange::Added {
                    event,
                    favorite: favorite.id,
                })
            }
        }
    }

    pub async fn buy_ticket(&self, event: EventId) -> ClientResult<TicketReceipt> {
        self.api
            .send(&BuyTicketRequest { event_id: event })
            .await
            .map_err(|e| buy_error(e).in_op_with("events.buy_ticket", event.to_string()))
    }
}

fn buy_error(err: ClientError) -> ClientError {
    match err.kind {
        ClientErrorKind::Network | ClientErrorKind::Server => {
            err.with_message("Nu am putut crea biletul. Încearcă din nou.")
        }
        _ => err,
    }
}
