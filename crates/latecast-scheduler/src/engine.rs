use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use latecast_store::{StoreError, Video, VideoStore};

use crate::error::PublishError;
use crate::publish::{CredentialProvider, PublishRequest, Publisher};

/// Per-cycle report returned to the trigger caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    /// Records this cycle claimed and attempted to publish.
    pub attempted: u32,
    /// Attempts that ended `completed`.
    pub completed: u32,
    /// Attempts that ended `failed`.
    pub failed: u32,
    /// Records whose state could not be advanced because the store errored.
    pub store_errors: u32,
}

enum AttemptOutcome {
    Completed,
    Failed,
    StoreError,
}

/// Drives scheduled videos through `pending → publishing → {completed, failed}`.
pub struct SchedulerEngine {
    store: Arc<VideoStore>,
    credentials: Arc<dyn CredentialProvider>,
    publisher: Arc<dyn Publisher>,
    publish_timeout: Duration,
}

impl SchedulerEngine {
    pub fn new(
        store: Arc<VideoStore>,
        credentials: Arc<dyn CredentialProvider>,
        publisher: Arc<dyn Publisher>,
        publish_timeout: Duration,
    ) -> Self {
        Self {
            store,
            credentials,
            publisher,
            publish_timeout,
        }
    }

    /// Run one publish cycle. Safe to call repeatedly and concurrently.
    ///
    /// Returns an error only when the initial due query fails — every record
    /// is still pending in that case. Failures of individual records are
    /// captured into their rows and counted in the summary instead.
    pub async fn run_cycle(&self) -> Result<CycleSummary, StoreError> {
        let due = self.store.list_due(Utc::now())?;
        if due.is_empty() {
            return Ok(CycleSummary::default());
        }

        let mut summary = CycleSummary::default();
        let mut claimed: Vec<Video> = Vec::new();
        for video in due {
            match self.store.claim(&video.id) {
                Ok(true) => claimed.push(video),
                Ok(false) => {
                    debug!(video_id = %video.id, "already claimed by a concurrent cycle")
                }
                Err(e) => {
                    // The record stays pending and is picked up next cycle.
                    error!(video_id = %video.id, error = %e, "claim failed");
                    summary.store_errors += 1;
                }
            }
        }
        summary.attempted = claimed.len() as u32;

        // Claimed records are exclusively ours; attempts run concurrently so
        // one slow upload never stalls the rest.
        let outcomes = future::join_all(claimed.iter().map(|v| self.attempt(v))).await;
        for outcome in outcomes {
            match outcome {
                AttemptOutcome::Completed => summary.completed += 1,
                AttemptOutcome::Failed => summary.failed += 1,
                AttemptOutcome::StoreError => summary.store_errors += 1,
            }
        }

        info!(
            attempted = summary.attempted,
            completed = summary.completed,
            failed = summary.failed,
            "publish cycle finished"
        );
        Ok(summary)
    }

    /// Periodic loop: one cycle per tick until `shutdown` broadcasts `true`.
    pub async fn run(self: Arc<Self>, poll_interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(every_secs = poll_interval.as_secs(), "scheduler engine started");
        let mut interval = tokio::time::interval(poll_interval);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.run_cycle().await {
                        error!("publish cycle error: {e}");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("scheduler engine shutting down");
                        break;
                    }
                }
            }
        }
    }

    // --- private helpers ---------------------------------------------------

    /// Publish one claimed record and persist its terminal status.
    async fn attempt(&self, video: &Video) -> AttemptOutcome {
        let request = PublishRequest {
            source_path: video.source_path.clone(),
            title: video.title.clone(),
            description: video.description.clone(),
        };

        let result = match tokio::time::timeout(self.publish_timeout, self.publish_once(&request))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(PublishError::Timeout {
                secs: self.publish_timeout.as_secs(),
            }),
        };

        match result {
            Ok(published_ref) => {
                info!(video_id = %video.id, published_ref = %published_ref, "video published");
                match self.store.complete(&video.id, &published_ref) {
                    Ok(()) => AttemptOutcome::Completed,
                    Err(e) => {
                        error!(video_id = %video.id, error = %e, "cannot record completion");
                        AttemptOutcome::StoreError
                    }
                }
            }
            Err(cause) => {
                warn!(video_id = %video.id, error = %cause, "publish attempt failed");
                match self.store.fail(&video.id, &cause.to_string()) {
                    Ok(()) => AttemptOutcome::Failed,
                    Err(e) => {
                        error!(video_id = %video.id, error = %e, "cannot record failure");
                        AttemptOutcome::StoreError
                    }
                }
            }
        }
    }

    /// Token fetch + upload. A credential failure short-circuits before the
    /// publisher is ever invoked.
    async fn publish_once(&self, request: &PublishRequest) -> Result<String, PublishError> {
        let token = self.credentials.access_token().await?;
        self.publisher.publish(request, &token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use rusqlite::Connection;

    use latecast_store::{NewVideo, VideoStatus};

    struct StaticCredentials {
        calls: AtomicUsize,
    }

    impl StaticCredentials {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CredentialProvider for StaticCredentials {
        async fn access_token(&self) -> Result<String, PublishError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("test-token".to_string())
        }
    }

    struct NoCredentials;

    #[async_trait]
    impl CredentialProvider for NoCredentials {
        async fn access_token(&self) -> Result<String, PublishError> {
            Err(PublishError::Unauthorized(
                "no stored tokens, authorize first".to_string(),
            ))
        }
    }

    enum Behavior {
        Succeed(&'static str),
        Reject,
        Hang(Duration),
        RejectMatching(&'static str),
    }

    struct StubPublisher {
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl StubPublisher {
        fn new(behavior: Behavior) -> Self {
            Self {
                behavior,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Publisher for StubPublisher {
        async fn publish(
            &self,
            request: &PublishRequest,
            _token: &str,
        ) -> Result<String, PublishError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Succeed(id) => Ok(id.to_string()),
                Behavior::Reject => Err(PublishError::Rejected("quota exceeded".to_string())),
                Behavior::Hang(delay) => {
                    tokio::time::sleep(*delay).await;
                    Ok("too-late".to_string())
                }
                Behavior::RejectMatching(needle) => {
                    if request.source_path.contains(needle) {
                        Err(PublishError::Rejected("bad artifact".to_string()))
                    } else {
                        Ok("yt-ok".to_string())
                    }
                }
            }
        }
    }

    fn store() -> Arc<VideoStore> {
        Arc::new(VideoStore::new(Connection::open_in_memory().expect("open")).expect("init"))
    }

    fn engine(
        store: Arc<VideoStore>,
        credentials: Arc<dyn CredentialProvider>,
        publisher: Arc<StubPublisher>,
    ) -> SchedulerEngine {
        SchedulerEngine::new(store, credentials, publisher, Duration::from_secs(5))
    }

    fn video_at(store: &VideoStore, minutes_from_now: i64, path: &str) -> latecast_store::Video {
        store
            .insert(NewVideo {
                source_path: path.to_string(),
                title: "Clip".to_string(),
                description: "A clip".to_string(),
                scheduled_at: Utc::now() + ChronoDuration::minutes(minutes_from_now),
            })
            .expect("insert")
    }

    #[tokio::test]
    async fn due_video_is_published() {
        let store = store();
        let video = video_at(&store, -1, "/tmp/a.mp4");
        let publisher = Arc::new(StubPublisher::new(Behavior::Succeed("yt-123")));
        let engine = engine(
            Arc::clone(&store),
            Arc::new(StaticCredentials::new()),
            Arc::clone(&publisher),
        );

        let summary = engine.run_cycle().await.unwrap();
        assert_eq!(summary.attempted, 1);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.failed, 0);

        let done = store.get(&video.id).unwrap();
        assert_eq!(done.status, VideoStatus::Completed);
        assert_eq!(done.published_ref.as_deref(), Some("yt-123"));
    }

    #[tokio::test]
    async fn future_video_is_left_pending() {
        let store = store();
        let video = video_at(&store, 60, "/tmp/a.mp4");
        let publisher = Arc::new(StubPublisher::new(Behavior::Succeed("yt-123")));
        let engine = engine(
            Arc::clone(&store),
            Arc::new(StaticCredentials::new()),
            Arc::clone(&publisher),
        );

        let summary = engine.run_cycle().await.unwrap();
        assert_eq!(summary, CycleSummary::default());
        assert_eq!(store.get(&video.id).unwrap().status, VideoStatus::Pending);
        assert_eq!(publisher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_store_cycle_is_noop() {
        let engine = engine(
            store(),
            Arc::new(StaticCredentials::new()),
            Arc::new(StubPublisher::new(Behavior::Succeed("yt-123"))),
        );
        assert_eq!(engine.run_cycle().await.unwrap(), CycleSummary::default());
    }

    #[tokio::test]
    async fn missing_credential_fails_without_publisher_call() {
        let store = store();
        let video = video_at(&store, -1, "/tmp/a.mp4");
        let publisher = Arc::new(StubPublisher::new(Behavior::Succeed("yt-123")));
        let engine = engine(Arc::clone(&store), Arc::new(NoCredentials), Arc::clone(&publisher));

        let summary = engine.run_cycle().await.unwrap();
        assert_eq!(summary.attempted, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(publisher.calls.load(Ordering::SeqCst), 0);

        let failed = store.get(&video.id).unwrap();
        assert_eq!(failed.status, VideoStatus::Failed);
        assert!(failed.last_error.unwrap().contains("not authorized"));
    }

    #[tokio::test]
    async fn rejected_upload_ends_failed() {
        let store = store();
        let video = video_at(&store, -1, "/tmp/a.mp4");
        let engine = engine(
            Arc::clone(&store),
            Arc::new(StaticCredentials::new()),
            Arc::new(StubPublisher::new(Behavior::Reject)),
        );

        let summary = engine.run_cycle().await.unwrap();
        assert_eq!(summary.failed, 1);
        let failed = store.get(&video.id).unwrap();
        assert_eq!(failed.status, VideoStatus::Failed);
        assert!(failed.last_error.unwrap().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn slow_upload_hits_timeout_and_fails() {
        let store = store();
        let video = video_at(&store, -1, "/tmp/a.mp4");
        let engine = SchedulerEngine::new(
            Arc::clone(&store),
            Arc::new(StaticCredentials::new()),
            Arc::new(StubPublisher::new(Behavior::Hang(Duration::from_millis(
                200,
            )))),
            Duration::from_millis(20),
        );

        let summary = engine.run_cycle().await.unwrap();
        assert_eq!(summary.failed, 1);
        let failed = store.get(&video.id).unwrap();
        assert_eq!(failed.status, VideoStatus::Failed);
        assert!(failed.last_error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn one_failure_does_not_block_others() {
        let store = store();
        let good = video_at(&store, -1, "/tmp/good.mp4");
        let bad = video_at(&store, -1, "/tmp/bad.mp4");
        let engine = engine(
            Arc::clone(&store),
            Arc::new(StaticCredentials::new()),
            Arc::new(StubPublisher::new(Behavior::RejectMatching("bad"))),
        );

        let summary = engine.run_cycle().await.unwrap();
        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(store.get(&good.id).unwrap().status, VideoStatus::Completed);
        assert_eq!(store.get(&bad.id).unwrap().status, VideoStatus::Failed);
    }

    #[tokio::test]
    async fn concurrent_cycles_claim_each_record_once() {
        let store = store();
        video_at(&store, -1, "/tmp/a.mp4");
        let publisher = Arc::new(StubPublisher::new(Behavior::Succeed("yt-123")));
        let engine = engine(
            Arc::clone(&store),
            Arc::new(StaticCredentials::new()),
            Arc::clone(&publisher),
        );

        let (a, b) = tokio::join!(engine.run_cycle(), engine.run_cycle());
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.attempted + b.attempted, 1);
        assert_eq!(a.completed + b.completed, 1);
        assert_eq!(publisher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn terminal_records_survive_later_cycles() {
        let store = store();
        let video = video_at(&store, -1, "/tmp/a.mp4");
        let engine = engine(
            Arc::clone(&store),
            Arc::new(StaticCredentials::new()),
            Arc::new(StubPublisher::new(Behavior::Succeed("yt-123"))),
        );

        engine.run_cycle().await.unwrap();
        let second = engine.run_cycle().await.unwrap();
        assert_eq!(second, CycleSummary::default());

        let done = store.get(&video.id).unwrap();
        assert_eq!(done.status, VideoStatus::Completed);
        assert_eq!(done.published_ref.as_deref(), Some("yt-123"));
    }
}
