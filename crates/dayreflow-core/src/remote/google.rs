//! Google Calendar REST client.
//!
//! Token acquisition is the caller's business; this client only attaches
//! the bearer token it was given.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::Value;
use url::Url;

use super::google_codec::{decode_items, from_google, to_google};
use super::CalendarRemote;
use crate::error::RemoteError;
use crate::event::Event;
use crate::storage::CalendarConfig;
use crate::timeline::DayWindow;

const PAGE_SIZE: &str = "250";

/// One Google calendar, addressed by id.
pub struct GoogleCalendar {
    client: Client,
    token: String,
    calendar_id: String,
    base_url: String,
}

impl GoogleCalendar {
    /// Client for `calendar_id` on the public API with default settings.
    pub fn new(token: impl Into<String>, calendar_id: impl Into<String>) -> Result<Self, RemoteError> {
        let defaults = CalendarConfig::default();
        let timeout = defaults.request_timeout();
        Self::build(token.into(), calendar_id.into(), defaults.api_base, timeout)
    }

    pub fn from_config(config: &CalendarConfig, token: impl Into<String>) -> Result<Self, RemoteError> {
        Self::build(
            token.into(),
            config.calendar_id.clone(),
            config.api_base.clone(),
            config.request_timeout(),
        )
    }

    /// Point the client at another API root (a proxy or a test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn build(token: String, calendar_id: String, base_url: String, timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            token,
            calendar_id,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn events_url(&self, event_id: Option<&str>) -> Result<Url, RemoteError> {
        let mut raw = format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(&self.calendar_id)
        );
        if let Some(id) = event_id {
            raw.push('/');
            raw.push_str(&urlencoding::encode(id));
        }
        Url::parse(&raw).map_err(|e| RemoteError::Unavailable(format!("bad calendar url '{raw}': {e}")))
    }

    fn send(&self, request: RequestBuilder, event_id: Option<&str>) -> Result<Response, RemoteError> {
        let resp = request.bearer_auth(&self.token).send()?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status.as_u16() == 404 {
            if let Some(id) = event_id {
                return Err(RemoteError::NotFound(id.to_string()));
            }
        }
        let body = resp.text().unwrap_or_default();
        Err(RemoteError::Http {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }

    fn read_json(resp: Response) -> Result<Value, RemoteError> {
        resp.json().map_err(|e| RemoteError::Decode(e.to_string()))
    }

    fn read_event(resp: Response) -> Result<Event, RemoteError> {
        let value = Self::read_json(resp)?;
        from_google(&value)?.ok_or_else(|| RemoteError::Decode("remote returned a non-timed event".into()))
    }
}

/// Pull `error.message` out of an API error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

impl CalendarRemote for GoogleCalendar {
    fn list_events(&self, window: &DayWindow) -> Result<Vec<Event>, RemoteError> {
        let url = self.events_url(None)?;
        let time_min = window.start.to_rfc3339();
        let time_max = window.end.to_rfc3339();

        let mut events = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query = vec![
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
                ("maxResults", PAGE_SIZE),
            ];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let resp = self.send(self.client.get(url.clone()).query(&query), None)?;
            let page = Self::read_json(resp)?;
            events.extend(decode_items(&page)?);

            match page["nextPageToken"].as_str() {
                Some(next) => page_token = Some(next.to_string()),
                None => break,
            }
        }

        // timeMin/timeMax select by overlap; the day's timeline is what starts in it.
        events.retain(|e| window.contains(e.start));
        events.sort_by_key(|e| e.start);
        tracing::debug!(calendar = %self.calendar_id, count = events.len(), "listed events");
        Ok(events)
    }

    fn create_event(&self, event: &Event) -> Result<Event, RemoteError> {
        let url = self.events_url(None)?;
        let resp = self.send(self.client.post(url).json(&to_google(event)), None)?;
        let created = Self::read_event(resp)?;
        tracing::debug!(id = created.label(), "created event");
        Ok(created)
    }

    fn update_event(&self, id: &str, event: &Event) -> Result<Event, RemoteError> {
        let url = self.events_url(Some(id))?;
        let resp = self.send(self.client.put(url).json(&to_google(event)), Some(id))?;
        Self::read_event(resp)
    }

    fn delete_event(&self, id: &str) -> Result<(), RemoteError> {
        let url = self.events_url(Some(id))?;
        self.send(self.client.delete(url), Some(id))?;
        Ok(())
    }
}
