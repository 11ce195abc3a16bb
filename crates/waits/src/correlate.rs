use moorage_core::{PageEvent, WaitError};
use tracing::debug;

/// Classification of one protocol event against the awaited navigation.
#[derive(Debug)]
pub enum Verdict {
    /// Not ours, or not decisive yet.
    Pending,
    /// A completion event fired for the awaited document.
    Success,
    /// The navigation is dead and not worth retrying.
    Failure(WaitError),
    /// The current load attempt is bad; the document should be fetched
    /// again.
    ReloadRequested,
}

/// What the wait loop is told to do. Produced by [`CompletionPolicy`].
#[derive(Debug)]
pub enum Signal {
    Retry,
    Succeeded,
    Failed(WaitError),
}

impl Signal {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Signal::Retry)
    }
}

/// Ties the event stream back to the one navigation being awaited.
///
/// The request id is captured from the first request whose URL starts with
/// the target prefix; loader and frame ids from the first well-statused
/// response. All three are written once and never reset mid-wait, so late
/// events from other frames or documents can never hijack the wait.
#[derive(Debug)]
pub struct Correlator {
    target: String,
    request_id: Option<String>,
    loader_id: Option<String>,
    frame_id: Option<String>,
}

impl Correlator {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            request_id: None,
            loader_id: None,
            frame_id: None,
        }
    }

    pub fn classify(&mut self, event: &PageEvent) -> Verdict {
        match event {
            PageEvent::RequestWillBeSent { request_id, url } => {
                // Prefix match, not equality: redirects and suffixed URLs
                // still belong to the awaited navigation.
                if url.starts_with(&self.target) && self.request_id.is_none() {
                    debug!(%request_id, %url, "request matched");
                    self.request_id = Some(request_id.clone());
                }
                Verdict::Pending
            }

            PageEvent::LoadingFailed { request_id, error_text } => {
                if self.request_id.as_deref() == Some(request_id.as_str()) {
                    debug!(%request_id, %error_text, "awaited request failed");
                    Verdict::ReloadRequested
                } else {
                    Verdict::Pending
                }
            }

            PageEvent::ResponseReceived {
                request_id,
                loader_id,
                frame_id,
                url,
                status,
            } => {
                if !url.starts_with(&self.target) {
                    return Verdict::Pending;
                }
                debug!(%request_id, status, %url, "response received");
                match *status {
                    200..=399 => {
                        if self.loader_id.is_none() {
                            self.loader_id = Some(loader_id.clone());
                            self.frame_id = Some(frame_id.clone());
                        }
                        // Headers alone are not completion; a load or
                        // milestone event must still confirm.
                        Verdict::Pending
                    }
                    400 | 410 => Verdict::Failure(WaitError::BadStatus {
                        status: *status,
                        url: url.clone(),
                    }),
                    _ => Verdict::ReloadRequested,
                }
            }

            PageEvent::LoadFired => {
                debug!("load fired");
                Verdict::Success
            }

            PageEvent::Lifecycle {
                name,
                loader_id,
                frame_id,
            } => {
                if name != "DOMContentLoaded" {
                    return Verdict::Pending;
                }
                let matched = self.loader_id.as_deref() == Some(loader_id.as_str())
                    && self.frame_id.as_deref() == Some(frame_id.as_str());
                if !matched {
                    // Unset or foreign ids mean a different document.
                    return Verdict::Pending;
                }
                debug!(%name, "milestone matched");
                Verdict::Success
            }
        }
    }
}

/// Sequences verdicts into wait-loop signals.
///
/// A reload request does not interrupt the wait by itself: it is parked in
/// a single slot until the abandoned load's own completion event arrives,
/// which is then turned into a retry instead of a success. Last writer
/// wins within one reload cycle, so a success can never slip past a
/// pending failure.
#[derive(Debug, Default)]
pub struct CompletionPolicy {
    reload_pending: bool,
}

impl CompletionPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, verdict: Verdict) -> Option<Signal> {
        match verdict {
            Verdict::Pending => None,
            Verdict::ReloadRequested => {
                self.reload_pending = true;
                None
            }
            Verdict::Failure(err) => Some(Signal::Failed(err)),
            Verdict::Success => {
                if std::mem::take(&mut self.reload_pending) {
                    debug!("completion raced a pending reload, retrying");
                    Some(Signal::Retry)
                } else {
                    Some(Signal::Succeeded)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: &str = "http://127.0.0.1:8008/next";

    fn request(id: &str, url: &str) -> PageEvent {
        PageEvent::RequestWillBeSent {
            request_id: id.to_string(),
            url: url.to_string(),
        }
    }

    fn response(id: &str, loader: &str, frame: &str, url: &str, status: i64) -> PageEvent {
        PageEvent::ResponseReceived {
            request_id: id.to_string(),
            loader_id: loader.to_string(),
            frame_id: frame.to_string(),
            url: url.to_string(),
            status,
        }
    }

    fn milestone(name: &str, loader: &str, frame: &str) -> PageEvent {
        PageEvent::Lifecycle {
            name: name.to_string(),
            loader_id: loader.to_string(),
            frame_id: frame.to_string(),
        }
    }

    fn failed(id: &str) -> PageEvent {
        PageEvent::LoadingFailed {
            request_id: id.to_string(),
            error_text: "net::ERR_CONNECTION_RESET".to_string(),
        }
    }

    #[test]
    fn records_first_matching_request_only() {
        let mut correlator = Correlator::new(TARGET);
        assert!(matches!(
            correlator.classify(&request("r1", "http://127.0.0.1:8008/next?page=2")),
            Verdict::Pending
        ));
        assert_eq!(correlator.request_id.as_deref(), Some("r1"));

        correlator.classify(&request("r2", TARGET));
        assert_eq!(correlator.request_id.as_deref(), Some("r1"));
    }

    #[test]
    fn ignores_requests_for_other_urls() {
        let mut correlator = Correlator::new(TARGET);
        correlator.classify(&request("r1", "http://tracker.example/pixel.gif"));
        assert!(correlator.request_id.is_none());
    }

    #[test]
    fn good_response_records_keys_without_deciding() {
        let mut correlator = Correlator::new(TARGET);
        assert!(matches!(
            correlator.classify(&response("r1", "l1", "f1", TARGET, 200)),
            Verdict::Pending
        ));
        assert_eq!(correlator.loader_id.as_deref(), Some("l1"));
        assert_eq!(correlator.frame_id.as_deref(), Some("f1"));

        // A later response for the same prefix must not steal the keys.
        correlator.classify(&response("r9", "l9", "f9", TARGET, 302));
        assert_eq!(correlator.loader_id.as_deref(), Some("l1"));
    }

    #[test]
    fn bad_request_and_gone_are_terminal() {
        for status in [400, 410] {
            let mut correlator = Correlator::new(TARGET);
            match correlator.classify(&response("r1", "l1", "f1", TARGET, status)) {
                Verdict::Failure(WaitError::BadStatus { status: got, .. }) => {
                    assert_eq!(got, status)
                }
                other => panic!("expected failure for {status}, got {other:?}"),
            }
        }
    }

    #[test]
    fn other_bad_statuses_request_a_reload() {
        for status in [403, 404, 500, 503] {
            let mut correlator = Correlator::new(TARGET);
            assert!(
                matches!(
                    correlator.classify(&response("r1", "l1", "f1", TARGET, status)),
                    Verdict::ReloadRequested
                ),
                "status {status} should be retryable"
            );
        }
    }

    #[test]
    fn responses_for_other_urls_are_ignored() {
        let mut correlator = Correlator::new(TARGET);
        assert!(matches!(
            correlator.classify(&response("r1", "l1", "f1", "http://ads.example/frame", 400)),
            Verdict::Pending
        ));
    }

    #[test]
    fn loading_failure_correlates_by_request_id() {
        let mut correlator = Correlator::new(TARGET);
        correlator.classify(&request("r1", TARGET));

        assert!(matches!(correlator.classify(&failed("r2")), Verdict::Pending));
        assert!(matches!(
            correlator.classify(&failed("r1")),
            Verdict::ReloadRequested
        ));
    }

    #[test]
    fn loading_failure_before_any_request_is_ignored() {
        let mut correlator = Correlator::new(TARGET);
        assert!(matches!(correlator.classify(&failed("r1")), Verdict::Pending));
    }

    #[test]
    fn load_event_is_a_completion() {
        let mut correlator = Correlator::new(TARGET);
        assert!(matches!(
            correlator.classify(&PageEvent::LoadFired),
            Verdict::Success
        ));
    }

    #[test]
    fn milestone_requires_recorded_keys() {
        let mut correlator = Correlator::new(TARGET);
        // No response seen yet: the keys are unset, the milestone cannot
        // belong to the awaited document.
        assert!(matches!(
            correlator.classify(&milestone("DOMContentLoaded", "l1", "f1")),
            Verdict::Pending
        ));

        correlator.classify(&response("r1", "l1", "f1", TARGET, 200));
        assert!(matches!(
            correlator.classify(&milestone("DOMContentLoaded", "l2", "f2")),
            Verdict::Pending
        ));
        assert!(matches!(
            correlator.classify(&milestone("DOMContentLoaded", "l1", "f1")),
            Verdict::Success
        ));
    }

    #[test]
    fn other_milestones_are_ignored() {
        let mut correlator = Correlator::new(TARGET);
        correlator.classify(&response("r1", "l1", "f1", TARGET, 200));
        for name in ["init", "firstPaint", "networkIdle"] {
            assert!(matches!(
                correlator.classify(&milestone(name, "l1", "f1")),
                Verdict::Pending
            ));
        }
    }

    #[test]
    fn policy_holds_reload_until_the_stale_load_completes() {
        let mut policy = CompletionPolicy::new();
        assert!(policy.apply(Verdict::ReloadRequested).is_none());
        assert!(matches!(
            policy.apply(Verdict::Success),
            Some(Signal::Retry)
        ));
        // The slot was drained: the next completion is genuine.
        assert!(matches!(
            policy.apply(Verdict::Success),
            Some(Signal::Succeeded)
        ));
    }

    #[test]
    fn policy_passes_failures_through() {
        let mut policy = CompletionPolicy::new();
        policy.apply(Verdict::ReloadRequested);
        let err = WaitError::BadStatus {
            status: 400,
            url: TARGET.to_string(),
        };
        assert!(matches!(
            policy.apply(Verdict::Failure(err)),
            Some(Signal::Failed(WaitError::BadStatus { status: 400, .. }))
        ));
    }

    #[test]
    fn policy_forwards_nothing_while_pending() {
        let mut policy = CompletionPolicy::new();
        assert!(policy.apply(Verdict::Pending).is_none());
    }
}
