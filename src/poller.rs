use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::feed::{FeedError, FeedSource};
use crate::models::{parse_feed, EarthquakeEvent, EventId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    NoChange,
    NewEvent(EarthquakeEvent),
    FetchFailed(String),
    ParseFailed(String),
}

impl From<FeedError> for Outcome {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::Http(reason) => Outcome::FetchFailed(reason),
            FeedError::Parse(reason) => Outcome::ParseFailed(reason),
        }
    }
}

/// Fetches the latest report and decides whether it is new.
///
/// The only state is the id of the last announced event. It changes only
/// after a successful fetch that produced an event.
pub struct Poller<F> {
    feed: F,
    last_seen: Mutex<Option<EventId>>,
    in_flight: AtomicBool,
}

impl<F: FeedSource> Poller<F> {
    pub fn new(feed: F) -> Self {
        Self {
            feed,
            last_seen: Mutex::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn last_seen(&self) -> Option<EventId> {
        self.last_seen.lock().ok().and_then(|guard| guard.clone())
    }

    /// Automatic checks skip while another automatic check is still
    /// waiting on the network. Manual checks always run.
    pub async fn check(&self, manual: bool) -> Outcome {
        if manual {
            return self.fetch_and_decide(true).await;
        }
        if self.in_flight.swap(true, Ordering::AcqRel) {
            tracing::debug!("previous poll still in flight, skipping tick");
            return Outcome::NoChange;
        }
        let _busy = InFlight(&self.in_flight);
        self.fetch_and_decide(false).await
    }

    async fn fetch_and_decide(&self, manual: bool) -> Outcome {
        let body = match self.feed.fetch().await {
            Ok(body) => body,
            Err(err) => return err.into(),
        };
        match parse_feed(&body) {
            Ok(Some(event)) => self.decide(event, manual),
            Ok(None) => Outcome::NoChange,
            Err(err) => err.into(),
        }
    }

    fn decide(&self, event: EarthquakeEvent, manual: bool) -> Outcome {
        let candidate = event.id();
        let mut last_seen = match self.last_seen.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if manual || last_seen.as_ref() != Some(&candidate) {
            *last_seen = Some(candidate);
            Outcome::NewEvent(event)
        } else {
            Outcome::NoChange
        }
    }
}

// Clears the busy flag even if the check future is dropped mid-fetch.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use tokio::sync::Notify;

    pub(crate) fn feed_body(date: &str, time: &str, magnitude: &str) -> String {
        format!(
            r#"{{"Infogempa":{{"gempa":{{"Tanggal":"{date}","Jam":"{time}","Magnitude":"{magnitude}","Kedalaman":"10 km","Dirasakan":"Jakarta"}}}}}}"#
        )
    }

    /// Hands out queued responses in order.
    #[derive(Clone, Default)]
    pub(crate) struct ScriptedFeed {
        responses: Arc<Mutex<VecDeque<Result<String, FeedError>>>>,
    }

    impl ScriptedFeed {
        pub(crate) fn push(&self, response: Result<String, FeedError>) {
            self.responses.lock().unwrap().push_back(response);
        }
    }

    impl FeedSource for ScriptedFeed {
        async fn fetch(&self) -> Result<String, FeedError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(FeedError::Http("no scripted response".into())))
        }
    }

    /// Blocks every fetch until released.
    #[derive(Clone)]
    pub(crate) struct GatedFeed {
        pub(crate) gate: Arc<Notify>,
        pub(crate) body: String,
    }

    impl FeedSource for GatedFeed {
        async fn fetch(&self) -> Result<String, FeedError> {
            self.gate.notified().await;
            Ok(self.body.clone())
        }
    }

    #[tokio::test]
    async fn same_event_twice_alerts_once() {
        let feed = ScriptedFeed::default();
        feed.push(Ok(feed_body("2024-01-01", "10:00", "5.4")));
        feed.push(Ok(feed_body("2024-01-01", "10:00", "5.4")));
        let poller = Poller::new(feed);

        match poller.check(false).await {
            Outcome::NewEvent(event) => assert_eq!(event.magnitude, "5.4"),
            other => panic!("expected new event, got {other:?}"),
        }
        assert_eq!(poller.check(false).await, Outcome::NoChange);
        assert_eq!(
            poller.last_seen(),
            Some(EventId::from_parts("2024-01-01", "10:00"))
        );
    }

    #[tokio::test]
    async fn different_id_is_announced() {
        let feed = ScriptedFeed::default();
        feed.push(Ok(feed_body("2024-01-01", "10:00", "5.4")));
        feed.push(Ok(feed_body("2024-01-01", "11:30", "4.2")));
        let poller = Poller::new(feed);

        assert!(matches!(poller.check(false).await, Outcome::NewEvent(_)));
        match poller.check(false).await {
            Outcome::NewEvent(event) => assert_eq!(event.magnitude, "4.2"),
            other => panic!("expected new event, got {other:?}"),
        }
        assert_eq!(
            poller.last_seen(),
            Some(EventId::from_parts("2024-01-01", "11:30"))
        );
    }

    #[tokio::test]
    async fn manual_check_reannounces_unchanged_event() {
        let feed = ScriptedFeed::default();
        for _ in 0..3 {
            feed.push(Ok(feed_body("2024-01-01", "10:00", "5.4")));
        }
        let poller = Poller::new(feed);

        assert!(matches!(poller.check(false).await, Outcome::NewEvent(_)));
        assert!(matches!(poller.check(true).await, Outcome::NewEvent(_)));
        assert!(matches!(poller.check(true).await, Outcome::NewEvent(_)));
    }

    #[tokio::test]
    async fn failures_leave_state_untouched() {
        let feed = ScriptedFeed::default();
        feed.push(Ok(feed_body("2024-01-01", "10:00", "5.4")));
        feed.push(Err(FeedError::Http("connection reset".into())));
        feed.push(Ok("{not json".into()));
        feed.push(Ok(r#"{"Infogempa":{}}"#.into()));
        feed.push(Ok("{}".into()));
        let poller = Poller::new(feed);
        let expected = Some(EventId::from_parts("2024-01-01", "10:00"));

        assert!(matches!(poller.check(false).await, Outcome::NewEvent(_)));
        assert_eq!(
            poller.check(false).await,
            Outcome::FetchFailed("connection reset".into())
        );
        assert_eq!(poller.last_seen(), expected);
        assert!(matches!(poller.check(true).await, Outcome::ParseFailed(_)));
        assert_eq!(poller.last_seen(), expected);
        assert_eq!(poller.check(true).await, Outcome::NoChange);
        assert_eq!(poller.check(false).await, Outcome::NoChange);
        assert_eq!(poller.last_seen(), expected);
    }

    #[tokio::test]
    async fn overlapping_automatic_ticks_are_skipped() {
        let gate = Arc::new(Notify::new());
        let poller = Arc::new(Poller::new(GatedFeed {
            gate: gate.clone(),
            body: feed_body("2024-01-01", "10:00", "5.4"),
        }));

        let first = tokio::spawn({
            let poller = poller.clone();
            async move { poller.check(false).await }
        });
        tokio::task::yield_now().await;

        assert_eq!(poller.check(false).await, Outcome::NoChange);
        assert_eq!(poller.last_seen(), None);

        gate.notify_one();
        assert!(matches!(first.await.unwrap(), Outcome::NewEvent(_)));
    }
}
