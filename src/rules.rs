//! 客户端业务规则
//!
//! 这些判断只用于禁用按钮和提前拦截，后端仍然会做同样的校验。

use crate::error::{ClientError, ClientResult};
use chrono::{DateTime, Utc};
use unievent_shared::{Event, Ticket, date};

// =========================================================
// 报名 (Signup)
// =========================================================

/// 报名按钮被禁用的原因，按显示优先级排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SignupBlock {
    Processing,
    AlreadyRegistered,
    Past,
    Full,
}

impl SignupBlock {
    pub fn label(self) -> &'static str {
        match self {
            SignupBlock::Processing => "Se procesează...",
            SignupBlock::AlreadyRegistered => "Înscris",
            SignupBlock::Past => "Eveniment trecut",
            SignupBlock::Full => "Locuri epuizate",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            SignupBlock::Processing => "Se creează biletul...",
            SignupBlock::AlreadyRegistered => "Ești deja înscris la acest eveniment.",
            SignupBlock::Past => "Evenimentul a început / a trecut.",
            SignupBlock::Full => "Nu mai sunt locuri disponibile.",
        }
    }
}

pub const SIGNUP_LABEL: &str = "Înscrie-te";

/// 活动已开始（或已结束）就不能再报名
pub fn event_started(event: &Event, now: DateTime<Utc>) -> bool {
    event.start_date.is_some_and(|s| s <= now) || event.end_date.is_some_and(|e| e <= now)
}

/// 报名是否可用；返回优先级最高的禁用原因
pub fn signup_availability(
    event: &Event,
    has_ticket: bool,
    is_buying: bool,
    now: DateTime<Utc>,
) -> Result<(), SignupBlock> {
    if is_buying {
        return Err(SignupBlock::Processing);
    }
    if has_ticket {
        return Err(SignupBlock::AlreadyRegistered);
    }
    if event_started(event, now) {
        return Err(SignupBlock::Past);
    }
    if event.is_full() {
        return Err(SignupBlock::Full);
    }
    Ok(())
}

pub fn signup_label(availability: Result<(), SignupBlock>) -> &'static str {
    match availability {
        Ok(()) => SIGNUP_LABEL,
        Err(block) => block.label(),
    }
}

/// 剩余名额：优先使用后端给出的 `seats_left`
pub fn seats_left(event: &Event) -> Option<u32> {
    event
        .seats_left
        .or_else(|| event.max_participants.map(|max| max.saturating_sub(event.tickets_sold())))
}

// =========================================================
// 票据 (Tickets)
// =========================================================

pub fn ticket_cutoff(ticket: &Ticket) -> Option<DateTime<Utc>> {
    ticket.event.cutoff()
}

pub fn ticket_is_past(ticket: &Ticket, now: DateTime<Utc>) -> bool {
    date::is_past(ticket_cutoff(ticket), now)
}

pub fn check_cancel(ticket: &Ticket, now: DateTime<Utc>) -> ClientResult<()> {
    if ticket.is_checked_in {
        return Err(ClientError::rejected("Biletul a fost deja validat și nu mai poate fi anulat."));
    }
    if ticket_is_past(ticket, now) {
        return Err(ClientError::rejected("Evenimentul s-a terminat."));
    }
    Ok(())
}

/// 可以展示二维码时返回载荷
pub fn check_view_qr(ticket: &Ticket, now: DateTime<Utc>) -> ClientResult<&str> {
    if ticket.is_checked_in {
        return Err(ClientError::rejected("Biletul este deja validat."));
    }
    if ticket_is_past(ticket, now) {
        return Err(ClientError::rejected("Evenimentul s-a terminat."));
    }
    ticket
        .qr_code_data
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ClientError::rejected("Biletul nu are un cod QR."))
}

pub fn check_review(ticket: &Ticket, now: DateTime<Utc>) -> ClientResult<()> {
    if ticket.has_review {
        return Err(ClientError::rejected("Ai lăsat deja o recenzie pentru acest eveniment."));
    }
    if !ticket.is_checked_in {
        return Err(ClientError::rejected("Poți lăsa o recenzie doar dacă ai participat."));
    }
    if !ticket_is_past(ticket, now) {
        return Err(ClientError::rejected("Poți lăsa o recenzie după terminarea evenimentului."));
    }
    Ok(())
}

pub fn validate_rating(rating: u8) -> ClientResult<u8> {
    if (1..=5).contains(&rating) {
        Ok(rating)
    } else {
        Err(ClientError::invalid_field("rating", "Selectează un rating între 1 și 5."))
    }
}

/// 按截止时间拆分：进行中的升序，已结束的降序
pub fn partition_tickets(tickets: &[Ticket], now: DateTime<Utc>) -> (Vec<&Ticket>, Vec<&Ticket>) {
    let (mut active, mut past): (Vec<&Ticket>, Vec<&Ticket>) =
        tickets.iter().partition(|t| !ticket_is_past(t, now));

    active.sort_by_key(|t| ticket_cutoff(t));
    past.sort_by(|a, b| ticket_cutoff(b).cmp(&ticket_cutoff(a)));
    (active, past)
}
