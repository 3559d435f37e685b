//! Calendar-link building.
//!
//! Renders a parsed event as a Google Calendar event-template URL, the
//! lightly documented `action=TEMPLATE` form. This is the one place a
//! default duration is applied: the parser core never invents an end
//! time, so when an event has a start time but no end time, the
//! configured duration supplies one here.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use url::Url;

use crate::parser::ParsedEvent;

/// Errors building a calendar link from a parsed event.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("no start date resolved from the input")]
    MissingStartDate,
}

const EVENT_URL: &str = "https://calendar.google.com/calendar/event";

/// `YYYYMMDDTHHMMSS` with a time, bare `YYYYMMDD` without — the compact
/// ISO 8601 shape the `dates` parameter requires.
fn render_date_time(date: NaiveDate, time: Option<NaiveTime>) -> String {
    match time {
        Some(t) => NaiveDateTime::new(date, t).format("%Y%m%dT%H%M%S").to_string(),
        None => date.format("%Y%m%d").to_string(),
    }
}

/// Build the Google Calendar template URL for a parsed event.
///
/// `default_duration_minutes` is the event length used when only a start
/// time was recovered from the input. Fails only when the event carries
/// no start date at all.
pub fn event_url(event: &ParsedEvent, default_duration_minutes: i64) -> Result<Url, LinkError> {
    let start_date = event.start_date.ok_or(LinkError::MissingStartDate)?;
    let end_date = event.end_date.unwrap_or(start_date);

    let mut end_time = event.end_time;
    if let (Some(start), None) = (event.start_time, end_time) {
        let dt = NaiveDateTime::new(start_date, start)
            + Duration::minutes(default_duration_minutes);
        end_time = Some(dt.time());
    }

    let dates = format!(
        "{}/{}",
        render_date_time(start_date, event.start_time),
        render_date_time(end_date, end_time)
    );

    let mut url = Url::parse(EVENT_URL).unwrap();
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("action", "TEMPLATE");
        query.append_pair("text", event.title.as_deref().unwrap_or(""));
        if let Some(location) = &event.location {
            query.append_pair("location", location);
        }
        query.append_pair("dates", &dates);
    }
    Ok(url)
}
