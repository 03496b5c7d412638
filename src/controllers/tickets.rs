//! 我的票据页

use crate::api::UniEventApi;
use crate::clock::Clock;
use crate::controllers::page_message;
use crate::error::{ClientError, ClientErrorKind, ClientResult};
use crate::qr;
use crate::request::HttpClient;
use crate::rules;
use std::rc::Rc;
use unievent_shared::protocol::{CancelTicketRequest, CreateReviewRequest, ListTicketsRequest};
use unievent_shared::{EventId, Review, Ticket, TicketId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketsState {
    pub tickets: Vec<Ticket>,
    /// 当前展开的票据
    pub expanded: Option<TicketId>,
}

impl TicketsState {
    pub fn toggle_expanded(&mut self, id: TicketId) {
        self.expanded = if self.expanded == Some(id) { None } else { Some(id) };
    }

    /// 取消成功：只移除这一张票
    pub fn apply_cancelled(&mut self, id: TicketId) {
        self.tickets.retain(|t| t.id != id);
        if self.expanded == Some(id) {
            self.expanded = None;
        }
    }

    /// 评价针对活动，同一活动的所有票据都标记为已评价
    pub fn apply_reviewed(&mut self, event: EventId) {
        for ticket in self.tickets.iter_mut().filter(|t| t.event.id == event) {
            ticket.has_review = true;
        }
    }

    pub fn get(&self, id: TicketId) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.id == id)
    }
}

/// 评价表单
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewDraft {
    pub rating: u8,
    pub comment: String,
}

pub struct TicketsController<C> {
    api: UniEventApi<C>,
    clock: Rc<dyn Clock>,
}

impl<C: HttpClient> TicketsController<C> {
    pub fn new(api: UniEventApi<C>, clock: Rc<dyn Clock>) -> Self {
        Self { api, clock }
    }

    pub async fn load(&self) -> ClientResult<Vec<Ticket>> {
        self.api.send(&ListTicketsRequest).await.map_err(|e| {
            let message = match e.kind {
                ClientErrorKind::Authentication => {
                    "Trebuie să fii autentificat ca să vezi biletele.".to_string()
                }
                _ => page_message(&e, "Nu am putut încărca biletele."),
            };
            e.with_message(message).in_op("tickets.load")
        })
    }

    /// 规则检查通过后才会发出 DELETE
    pub async fn cancel(&self, ticket: &Ticket) -> ClientResult<TicketId> {
        let op = || format!("{}", ticket.id);
        rules::check_cancel(ticket, self.clock.now()).map_err(|e| e.in_op_with("tickets.cancel", op()))?;

        self.api
            .send(&CancelTicketRequest {
                ticket_id: ticket.id,
            })
            .await
            .map_err(|e| {
                let message = match e.kind {
                    ClientErrorKind::Network | ClientErrorKind::Server => {
                        "Nu am putut anula biletul.".to_string()
                    }
                    _ => e.message().to_string(),
                };
                e.with_message(message).in_op_with("tickets.cancel", op())
            })?;

        tracing::info!(ticket = ticket.id, "ticket cancelled");
        Ok(ticket.id)
    }

    /// 可展示时返回完整的二维码载荷
    pub fn qr_payload(&self, ticket: &Ticket) -> ClientResult<String> {
        let code = rules::check_view_qr(ticket, self.clock.now())
            .map_err(|e| e.in_op_with("tickets.view_qr", ticket.id.to_string()))?;
        Ok(qr::encode_payload(code))
    }

    pub fn can_review(&self, ticket: &Ticket) -> bool {
        rules::check_review(ticket, self.clock.now()).is_ok()
    }

    pub async fn submit_review(&self, ticket: &Ticket, draft: &ReviewDraft) -> ClientResult<Review> {
        let op = "tickets.review";
        rules::check_review(ticket, self.clock.now())
            .map_err(|e| e.in_op_with(op, ticket.id.to_string()))?;
        let rating =
            rules::validate_rating(draft.rating).map_err(|e| e.in_op_with(op, ticket.id.to_string()))?;

        self.api
            .send(&CreateReviewRequest {
                event_id: ticket.event.id,
                rating,
                comment: draft.comment.trim().to_string(),
            })
            .await
            .map_err(|e| review_error(e).in_op_with(op, ticket.id.to_string()))
    }
}

fn review_error(err: ClientError) -> ClientError {
    match err.kind {
        ClientErrorKind::Network | ClientErrorKind::Server => {
            err.with_message("Nu am putut trimite recenzia.")
        }
        _ => err,
    }
}
