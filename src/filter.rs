//! 活动列表的客户端过滤
//!
//! 后端只支持 `search` / `faculty` / `category`，其余条件在拿到列表后
//! 同步过滤。日期按调用方时区的本地日期比较。

use chrono::{DateTime, NaiveDate, TimeZone};
use unievent_shared::Event;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DayFilter {
    #[default]
    Any,
    Today,
    /// 选了“指定日期”但还没填日期时不匹配任何活动
    Date(Option<NaiveDate>),
}

impl DayFilter {
    /// 解析下拉框的值和日期输入框（`YYYY-MM-DD`）
    pub fn from_form(day: &str, date: &str) -> Self {
        match day {
            "today" => DayFilter::Today,
            "date" => DayFilter::Date(NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()),
            _ => DayFilter::Any,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayFilter::Any => "",
            DayFilter::Today => "today",
            DayFilter::Date(_) => "date",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventFilter {
    pub department: Option<u64>,
    pub location_query: String,
    pub day: DayFilter,
}

impl EventFilter {
    pub fn is_empty(&self) -> bool {
        self.department.is_none() && self.location_query.trim().is_empty() && self.day == DayFilter::Any
    }

    pub fn matches<Tz: TimeZone>(&self, event: &Event, now: &DateTime<Tz>) -> bool {
        if let Some(department) = self.department {
            if event.department.as_ref().map(|d| d.id) != Some(department) {
                return false;
            }
        }

        let query = self.location_query.trim().to_lowercase();
        if !query.is_empty() {
            let name = event
                .location
                .as_ref()
                .map(|l| l.name.to_lowercase())
                .unwrap_or_default();
            if !name.contains(&query) {
                return false;
            }
        }

        if self.day != DayFilter::Any {
            let Some(start) = event.start_date else {
                return false;
            };
            let local_day = start.with_timezone(&now.timezone()).date_naive();
            let wanted = match &self.day {
                DayFilter::Today => Some(now.date_naive()),
                DayFilter::Date(date) => *date,
                DayFilter::Any => None,
            };
            if wanted != Some(local_day) {
                return false;
            }
        }

        true
    }

    pub fn apply<'a, Tz: TimeZone>(&self, events: &'a [Event], now: &DateTime<Tz>) -> Vec<&'a Event> {
        events.iter().filter(|e| self.matches(e, now)).collect()
    }
}
