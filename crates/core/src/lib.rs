use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod urlfmt;

/// Protocol events a navigation wait correlates against its target.
///
/// This is the entire event surface the detector consumes; everything else
/// the transport emits is dropped before it reaches the correlator.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    /// A network request was issued.
    RequestWillBeSent { request_id: String, url: String },
    /// A request died before producing a response (connection dropped,
    /// cache miss, aborted).
    LoadingFailed { request_id: String, error_text: String },
    /// Response headers arrived for a request.
    ResponseReceived {
        request_id: String,
        loader_id: String,
        frame_id: String,
        url: String,
        status: i64,
    },
    /// The document's full load event fired.
    LoadFired,
    /// A named lifecycle milestone (e.g. "DOMContentLoaded") fired for a
    /// specific document instance.
    Lifecycle {
        name: String,
        loader_id: String,
        frame_id: String,
    },
}

/// Actions that kick off the navigation a wait is armed for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Trigger {
    Navigate { url: String },
    Click { selector: String },
    Reload { ignore_cache: bool },
}

/// Event subscription handle. Dropping the stream releases the
/// subscription.
pub type EventStream = BoxStream<'static, PageEvent>;

/// Protocol seam between the wait logic and the browser transport.
///
/// Commands acknowledge at the transport level only; whether the
/// navigation they start ever completes is what the waits determine.
#[async_trait]
pub trait NavDriver: Send + Sync {
    /// Subscribes to the page's event stream. Order-preserving: events
    /// are yielded in transport delivery order.
    async fn events(&self) -> Result<EventStream, WaitError>;

    async fn navigate(&self, url: &str) -> Result<(), WaitError>;

    async fn reload(&self, ignore_cache: bool) -> Result<(), WaitError>;

    async fn click(&self, selector: &str) -> Result<(), WaitError>;
}

#[derive(Debug, Error)]
pub enum WaitError {
    /// The wait's cancellation token fired.
    #[error("wait canceled")]
    Canceled,

    /// A confirmation prompt was declined.
    #[error("canceled by user")]
    CanceledByUser,

    /// The awaited navigation answered with a status that is never worth
    /// retrying.
    #[error("status={} url={}", status_label(.status), .url)]
    BadStatus { status: i64, url: String },

    /// Transport or command failure.
    #[error("{0}")]
    Driver(String),

    /// The browser refused a restored cookie.
    #[error("could not set cookie {name} to {value}")]
    Cookie { name: String, value: String },
}

fn status_label(status: &i64) -> String {
    match *status {
        400 => "BadRequest".to_string(),
        410 => "Gone".to_string(),
        _ => status.to_string(),
    }
}

/// One browser cookie as persisted by a cookie store, one JSON object per
/// line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    /// Seconds since epoch; negative for session cookies.
    pub expires: f64,
    pub size: i64,
    pub http_only: bool,
    pub secure: bool,
    pub session: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_statuses_have_named_labels() {
        let err = WaitError::BadStatus {
            status: 400,
            url: "http://example.com/a".to_string(),
        };
        assert_eq!(err.to_string(), "status=BadRequest url=http://example.com/a");

        let err = WaitError::BadStatus {
            status: 410,
            url: "http://example.com/b".to_string(),
        };
        assert_eq!(err.to_string(), "status=Gone url=http://example.com/b");
    }

    #[test]
    fn other_statuses_print_numerically() {
        let err = WaitError::BadStatus {
            status: 503,
            url: "http://example.com".to_string(),
        };
        assert_eq!(err.to_string(), "status=503 url=http://example.com");
    }
}
