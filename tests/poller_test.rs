use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::{Duration, Instant, sleep};
use verigate::{
    FnRetriever, PollConfig, Result, SessionPoller, SessionResult, SessionRetriever,
    SessionStatus, VerigateError,
};

/// Gateway stub that walks a fixed sequence of statuses, then repeats the
/// last one, with a simulated network delay per retrieval.
struct SequenceGateway {
    statuses: Vec<SessionStatus>,
    delay: Duration,
    calls: AtomicUsize,
}

impl SequenceGateway {
    fn new(statuses: Vec<SessionStatus>, delay: Duration) -> Self {
        Self {
            statuses,
            delay,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SessionRetriever for SequenceGateway {
    async fn retrieve(&self, session_id: &str) -> Result<SessionResult> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        sleep(self.delay).await;
        let status = self
            .statuses
            .get(n)
            .or(self.statuses.last())
            .cloned()
            .unwrap_or(SessionStatus::Pending);
        Ok(SessionResult::new(session_id, status))
    }
}

fn poller(interval_ms: u64, max_duration_ms: u64) -> SessionPoller {
    SessionPoller::with_config(
        PollConfig::builder()
            .interval_ms(interval_ms)
            .max_duration_ms(max_duration_ms)
            .build(),
    )
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn waits_out_a_slow_verification() {
    let gateway = SequenceGateway::new(
        vec![
            SessionStatus::Pending,
            SessionStatus::Pending,
            SessionStatus::Other("in_review".into()),
            SessionStatus::Verified,
        ],
        Duration::from_millis(50),
    );
    let started = Instant::now();

    let result = poller(2_000, 300_000).poll("vs_slow", &gateway).await.unwrap();

    assert_eq!(result.status, SessionStatus::Verified);
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 4);
    // Three sleeps plus four simulated retrievals.
    assert_eq!(started.elapsed(), Duration::from_millis(3 * 2_000 + 4 * 50));
}

#[tokio::test(start_paused = true)]
async fn reports_timeout_with_the_last_observed_status() {
    let gateway = SequenceGateway::new(
        vec![SessionStatus::Other("in_review".into())],
        Duration::ZERO,
    );

    let err = poller(1_000, 4_000).poll("vs_stuck", &gateway).await.unwrap_err();

    match err {
        VerigateError::Timeout {
            session_id,
            last_status,
            duration_ms,
        } => {
            assert_eq!(session_id, "vs_stuck");
            assert_eq!(last_status, "in_review");
            assert_eq!(duration_ms, 4_000);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn observer_receives_intermediate_results() {
    let gateway = SequenceGateway::new(
        vec![
            SessionStatus::Pending,
            SessionStatus::Pending,
            SessionStatus::Failed,
        ],
        Duration::ZERO,
    );
    let observed = Mutex::new(Vec::new());

    let result = poller(500, 60_000)
        .poll_with(
            "vs_1",
            &gateway,
            SessionStatus::is_terminal,
            |r: &SessionResult| observed.lock().unwrap().push(r.status.clone()),
        )
        .await
        .unwrap();

    assert_eq!(result.status, SessionStatus::Failed);
    assert_eq!(
        *observed.lock().unwrap(),
        vec![
            SessionStatus::Pending,
            SessionStatus::Pending,
            SessionStatus::Failed
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn transport_failures_are_not_swallowed() {
    let flaky = FnRetriever(|_id: String| async move {
        Err::<SessionResult, _>(VerigateError::Connection(anyhow::anyhow!(
            "tls handshake failed"
        )))
    });

    let err = poller(1_000, 10_000).poll("vs_1", &flaky).await.unwrap_err();
    assert!(matches!(err, VerigateError::Connection(_)));
    assert!(err.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn concurrent_polls_do_not_interfere() {
    let fast = SequenceGateway::new(vec![SessionStatus::Verified], Duration::ZERO);
    let slow = SequenceGateway::new(
        vec![SessionStatus::Pending, SessionStatus::Failed],
        Duration::ZERO,
    );
    let p = poller(1_000, 60_000);

    let (a, b) = tokio::join!(p.poll("vs_fast", &fast), p.poll("vs_slow", &slow));

    let a = a.unwrap();
    let b = b.unwrap();
    assert_eq!(a.session_id, "vs_fast");
    assert_eq!(a.status, SessionStatus::Verified);
    assert_eq!(b.session_id, "vs_slow");
    assert_eq!(b.status, SessionStatus::Failed);
}
