//! The polling loop
//!
//! Each cycle fetches statuses updated since the cursor, translates the most
//! recent one into a chat message and sends it unless it repeats the last
//! message. Any error in the cycle is turned into a chat message as well, so
//! the loop itself never stops.

use chrono::Utc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info};

use super::notifier::Notifier;
use crate::api::{check_response, HomeworkSource};
use crate::error::Result;
use crate::models::format_status;

/// What a single cycle ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A new status message was sent
    Notified,
    /// The status message repeated the previous one
    Suppressed,
    /// The response held no homework records
    NoUpdates,
    /// The cycle failed; `notified` is false when the failure message was a repeat
    Failed { notified: bool },
}

/// Polls a [`HomeworkSource`] and relays changes through a [`Notifier`]
pub struct Poller<S, N> {
    source: S,
    notifier: N,
    /// `from_date` for the next fetch
    cursor: i64,
    /// Last message handed to the notifier, for deduplication
    last_message: Option<String>,
    retry_period: Duration,
}

impl<S, N> Poller<S, N>
where
    S: HomeworkSource,
    N: Notifier,
{
    /// Create a poller whose cursor starts at the current time
    pub fn new(source: S, notifier: N, retry_period: Duration) -> Self {
        Self {
            source,
            notifier,
            cursor: Utc::now().timestamp(),
            last_message: None,
            retry_period,
        }
    }

    /// Start from an explicit cursor instead of "now"
    #[must_use]
    pub fn with_cursor(mut self, cursor: i64) -> Self {
        self.cursor = cursor;
        self
    }

    /// Timestamp the next fetch will ask from
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Last message handed to the notifier
    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    /// Run cycles forever, sleeping the retry period after each one
    pub async fn run(&mut self) {
        info!(
            retry_period = %humantime::format_duration(self.retry_period),
            cursor = self.cursor,
            "Starting homework status poller"
        );

        loop {
            let outcome = self.run_cycle().await;
            debug!(?outcome, cursor = self.cursor, "Cycle finished");

            sleep(self.retry_period).await;
        }
    }

    /// Run one cycle; errors are reported to the chat, never returned
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        match self.poll_once().await {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = format!("Program failure: {e}");
                error!(error = %e, cursor = self.cursor, "{message}");

                let notified = self.deliver(message).await;
                CycleOutcome::Failed { notified }
            }
        }
    }

    async fn poll_once(&mut self) -> Result<CycleOutcome> {
        let response = self.source.fetch(self.cursor).await?;
        let checked = check_response(response)?;

        let outcome = match &checked.latest {
            Some(record) => {
                let message = format_status(record)?;
                if self.deliver(message).await {
                    CycleOutcome::Notified
                } else {
                    CycleOutcome::Suppressed
                }
            }
            None => {
                debug!("No new status in the response");
                CycleOutcome::NoUpdates
            }
        };

        // Advances on every structurally valid response, even without a record.
        self.cursor = checked.current_date;

        Ok(outcome)
    }

    /// Send unless it repeats the last message. Returns whether it was sent.
    async fn deliver(&mut self, message: String) -> bool {
        if self.last_message.as_deref() == Some(message.as_str()) {
            debug!(%message, "Suppressing repeated message");
            return false;
        }

        self.notifier.notify(&message).await;
        self.last_message = Some(message);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::HomeworkStatus;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replays scripted results and records the cursor of every fetch
    #[derive(Default)]
    struct ScriptedSource {
        replies: Mutex<VecDeque<Result<Value>>>,
        requested: Arc<Mutex<Vec<i64>>>,
    }

    impl ScriptedSource {
        fn new(replies: Vec<Result<Value>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requested: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl HomeworkSource for ScriptedSource {
        async fn fetch(&self, since: i64) -> Result<Value> {
            self.requested.lock().unwrap().push(since);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(json!({"homeworks": [], "current_date": since})))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingNotifier {
        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, message: &str) {
            self.sent.lock().unwrap().push(message.to_string());
        }
    }

    fn status_reply(name: &str, status: &str, current_date: i64) -> Result<Value> {
        Ok(json!({
            "homeworks": [{"homework_name": name, "status": status}],
            "current_date": current_date,
        }))
    }

    fn poller(
        replies: Vec<Result<Value>>,
    ) -> (Poller<ScriptedSource, RecordingNotifier>, RecordingNotifier) {
        let notifier = RecordingNotifier::default();
        let poller = Poller::new(
            ScriptedSource::new(replies),
            notifier.clone(),
            Duration::from_secs(600),
        )
        .with_cursor(500);
        (poller, notifier)
    }

    #[tokio::test]
    async fn test_approved_status_is_relayed_and_cursor_advances() {
        let (mut poller, notifier) = poller(vec![status_reply("proj1", "approved", 1000)]);

        let outcome = poller.run_cycle().await;

        assert_eq!(outcome, CycleOutcome::Notified);
        assert_eq!(
            notifier.sent(),
            vec![format!(
                "Status changed for submission \"proj1\". {}",
                HomeworkStatus::Approved.verdict()
            )]
        );
        assert_eq!(poller.cursor(), 1000);
    }

    #[tokio::test]
    async fn test_connectivity_failure_is_relayed_and_cursor_kept() {
        let (mut poller, notifier) = poller(vec![Err(Error::Connectivity(
            "tcp connect error".to_string(),
        ))]);

        let outcome = poller.run_cycle().await;

        assert_eq!(outcome, CycleOutcome::Failed { notified: true });
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("Program failure: connection problem"));
        assert!(sent[0].contains("tcp connect error"));
        assert_eq!(poller.cursor(), 500);
    }

    #[tokio::test]
    async fn test_unexpected_status_notifies_once() {
        let unavailable = || {
            Err(Error::UnexpectedStatus {
                endpoint: "https://example.test/api/".to_string(),
                status: 503,
            })
        };
        let (mut poller, notifier) = poller(vec![unavailable(), unavailable()]);

        assert_eq!(poller.run_cycle().await, CycleOutcome::Failed { notified: true });
        assert_eq!(poller.run_cycle().await, CycleOutcome::Failed { notified: false });

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("503"));
        assert_eq!(poller.cursor(), 500);
    }

    #[tokio::test]
    async fn test_repeated_status_is_suppressed() {
        let (mut poller, notifier) = poller(vec![
            status_reply("proj1", "reviewing", 1000),
            status_reply("proj1", "reviewing", 2000),
        ]);

        assert_eq!(poller.run_cycle().await, CycleOutcome::Notified);
        assert_eq!(poller.run_cycle().await, CycleOutcome::Suppressed);

        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(poller.cursor(), 2000);
    }

    #[tokio::test]
    async fn test_status_change_after_repeat_is_relayed() {
        let (mut poller, notifier) = poller(vec![
            status_reply("proj1", "reviewing", 1000),
            status_reply("proj1", "reviewing", 1100),
            status_reply("proj1", "approved", 1200),
        ]);

        for _ in 0..3 {
            poller.run_cycle().await;
        }

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].ends_with(HomeworkStatus::Approved.verdict()));
    }

    #[tokio::test]
    async fn test_empty_homeworks_advances_cursor_silently() {
        let (mut poller, notifier) =
            poller(vec![Ok(json!({"homeworks": [], "current_date": 1234}))]);

        assert_eq!(poller.run_cycle().await, CycleOutcome::NoUpdates);

        assert!(notifier.sent().is_empty());
        assert_eq!(poller.cursor(), 1234);
    }

    #[tokio::test]
    async fn test_translation_failure_keeps_cursor() {
        let (mut poller, notifier) = poller(vec![status_reply("proj1", "lost", 1000)]);

        assert_eq!(poller.run_cycle().await, CycleOutcome::Failed { notified: true });

        assert!(notifier.sent()[0].contains("lost"));
        assert_eq!(poller.cursor(), 500);
    }

    #[tokio::test]
    async fn test_failure_then_same_status_both_relayed() {
        let (mut poller, notifier) = poller(vec![
            status_reply("proj1", "reviewing", 1000),
            Err(Error::Connectivity("reset".to_string())),
            status_reply("proj1", "reviewing", 1100),
        ]);

        for _ in 0..3 {
            poller.run_cycle().await;
        }

        // The failure message replaced the last message, so the status is sent again.
        assert_eq!(notifier.sent().len(), 3);
    }

    #[tokio::test]
    async fn test_cursor_is_passed_to_source() {
        let source = ScriptedSource::new(vec![
            Ok(json!({"homeworks": [], "current_date": 700})),
            Err(Error::Connectivity("down".to_string())),
        ]);
        let requested = Arc::clone(&source.requested);
        let mut poller = Poller::new(source, RecordingNotifier::default(), Duration::from_secs(1))
            .with_cursor(100);

        for _ in 0..3 {
            poller.run_cycle().await;
        }

        assert_eq!(*requested.lock().unwrap(), vec![100, 700, 700]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_sleeps_between_cycles() {
        let source = ScriptedSource::new(vec![
            status_reply("proj1", "reviewing", 1000),
            Err(Error::Connectivity("down".to_string())),
        ]);
        let requested = Arc::clone(&source.requested);
        let notifier = RecordingNotifier::default();
        let mut poller = Poller::new(source, notifier.clone(), Duration::from_secs(600));

        // Cycles start at 0s, 600s and 1200s.
        let stopped = tokio::time::timeout(Duration::from_secs(1201), poller.run()).await;

        assert!(stopped.is_err());
        assert_eq!(requested.lock().unwrap().len(), 3);
        assert_eq!(notifier.sent().len(), 2);
    }
}
