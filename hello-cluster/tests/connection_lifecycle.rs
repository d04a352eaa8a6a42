//! Connect and disconnect behavior of the connection manager.

mod common;

use std::time::Duration;

use common::{CloseBehavior, InstantTime, ScriptedClient};
use hello_cluster::client::{ConnectOptions, ConnectionManager, ConnectionState, HealthStatus};
use hello_cluster::{ConnectFailure, InvokeError, TokioTimeProvider};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_unreachable_cluster_exhausts_budget() {
    let client = ScriptedClient::always_failing();
    let calls = client.calls();
    let time = InstantTime::new();
    let mut manager = ConnectionManager::new(client, ConnectOptions::default(), time.clone());

    let started = std::time::Instant::now();
    let result = manager.start(&CancellationToken::new()).await;

    match result {
        Err(ConnectFailure::BudgetExhausted {
            attempts,
            last_error,
        }) => {
            assert_eq!(attempts, 11);
            assert!(last_error.contains("no gateway answered"));
        }
        other => panic!("expected BudgetExhausted, got {other:?}"),
    }
    assert_eq!(calls.connect.get(), 11);
    assert_eq!(time.sleeps(), 10);
    assert_eq!(manager.state(), ConnectionState::Failed);
    assert!(manager.budget().is_exhausted());
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_retry_waits_are_one_second_apart() {
    let client = ScriptedClient::always_failing();
    let mut manager =
        ConnectionManager::new(client, ConnectOptions::default(), TokioTimeProvider::new());

    let started = tokio::time::Instant::now();
    let result = manager.start(&CancellationToken::new()).await;
    let elapsed = started.elapsed();

    assert!(matches!(
        result,
        Err(ConnectFailure::BudgetExhausted { attempts: 11, .. })
    ));
    assert!(elapsed >= Duration::from_secs(10), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(11), "elapsed {elapsed:?}");
}

#[tokio::test]
async fn test_cancel_during_retry_wait_stops_attempts() {
    let cancel = CancellationToken::new();
    let client = ScriptedClient::always_failing();
    let calls = client.calls();
    let time = InstantTime::cancelling_on_sleep(2, cancel.clone());
    let mut manager = ConnectionManager::new(client, ConnectOptions::default(), time.clone());

    let result = manager.start(&cancel).await;

    assert_eq!(result, Err(ConnectFailure::Cancelled { attempts: 2 }));
    assert_eq!(calls.connect.get(), 2);
    assert_eq!(time.sleeps(), 2);
    assert_eq!(manager.state(), ConnectionState::Unconnected);
    assert_eq!(manager.budget().remaining(), 8);
    assert_eq!(manager.health().check().status, HealthStatus::Degraded);
}

#[tokio::test]
async fn test_pre_cancelled_token_still_makes_first_attempt() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let client = ScriptedClient::always_failing();
    let calls = client.calls();
    let mut manager = ConnectionManager::new(client, ConnectOptions::default(), InstantTime::new());

    let result = manager.start(&cancel).await;

    assert_eq!(result, Err(ConnectFailure::Cancelled { attempts: 1 }));
    assert_eq!(calls.connect.get(), 1);
}

#[tokio::test]
async fn test_pre_cancelled_token_does_not_block_success() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut manager = ConnectionManager::new(
        ScriptedClient::healthy(),
        ConnectOptions::default(),
        InstantTime::new(),
    );

    manager.start(&cancel).await.expect("first attempt succeeds");
    assert_eq!(manager.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_start_resumes_with_remaining_budget_after_cancel() {
    let cancel = CancellationToken::new();
    let client = ScriptedClient::failing(3);
    let calls = client.calls();
    let time = InstantTime::cancelling_on_sleep(1, cancel.clone());
    let mut manager = ConnectionManager::new(client, ConnectOptions::default(), time);

    assert_eq!(
        manager.start(&cancel).await,
        Err(ConnectFailure::Cancelled { attempts: 1 })
    );

    manager
        .start(&CancellationToken::new())
        .await
        .expect("second start connects");
    assert_eq!(manager.state(), ConnectionState::Connected);
    assert_eq!(calls.connect.get(), 4);
    assert_eq!(manager.attempts(), 4);
    assert_eq!(manager.budget().remaining(), 7);
}

#[tokio::test]
async fn test_already_initialized_client_skips_handshake() {
    let client = ScriptedClient::always_failing().already_initialized();
    let calls = client.calls();
    let mut manager = ConnectionManager::new(client, ConnectOptions::default(), InstantTime::new());

    manager
        .start(&CancellationToken::new())
        .await
        .expect("initialized client is connected");

    assert_eq!(calls.connect.get(), 0);
    assert_eq!(manager.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_stop_before_start_is_noop() {
    let client = ScriptedClient::healthy();
    let calls = client.calls();
    let mut manager = ConnectionManager::new(client, ConnectOptions::default(), InstantTime::new());

    manager.stop(&CancellationToken::new()).await;

    assert_eq!(calls.close.get(), 0);
    assert_eq!(manager.state(), ConnectionState::Unconnected);
}

#[tokio::test]
async fn test_stop_with_hung_close_honors_cancelled_token() {
    let client = ScriptedClient::healthy().with_close(CloseBehavior::Hang);
    let calls = client.calls();
    let mut manager = ConnectionManager::new(client, ConnectOptions::default(), InstantTime::new());
    manager
        .start(&CancellationToken::new())
        .await
        .expect("start");

    let cancel = CancellationToken::new();
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), manager.stop(&cancel))
        .await
        .expect("stop returns promptly");

    assert_eq!(calls.close.get(), 1);
    assert_eq!(manager.state(), ConnectionState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_stop_abandons_close_when_deadline_fires() {
    let client = ScriptedClient::healthy().with_close(CloseBehavior::Hang);
    let mut manager =
        ConnectionManager::new(client, ConnectOptions::default(), TokioTimeProvider::new());
    manager
        .start(&CancellationToken::new())
        .await
        .expect("start");

    let deadline = CancellationToken::new();
    let started = tokio::time::Instant::now();
    tokio::join!(manager.stop(&deadline), async {
        tokio::time::sleep(Duration::from_millis(250)).await;
        deadline.cancel();
    });

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(250), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(1), "elapsed {elapsed:?}");
    assert_eq!(manager.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn test_failed_close_still_ends_closed() {
    let client = ScriptedClient::healthy().with_close(CloseBehavior::Fail);
    let mut manager = ConnectionManager::new(client, ConnectOptions::default(), InstantTime::new());
    let cancel = CancellationToken::new();
    manager.start(&cancel).await.expect("start");

    manager.stop(&cancel).await;

    assert_eq!(manager.state(), ConnectionState::Closed);
    assert_eq!(manager.health().check().status, HealthStatus::Unhealthy);
}

#[tokio::test]
async fn test_invoker_requires_connection() {
    let mut manager = ConnectionManager::new(
        ScriptedClient::healthy(),
        ConnectOptions::default(),
        InstantTime::new(),
    );
    let invoker = manager.invoker();

    let before: Result<String, _> = invoker.invoke("Echo", "k", "echo", &"hi").await;
    assert!(matches!(
        before,
        Err(InvokeError::NotConnected(ConnectionState::Unconnected))
    ));

    manager
        .start(&CancellationToken::new())
        .await
        .expect("start");
    let during: String = invoker
        .invoke("Echo", "k", "echo", &"hi")
        .await
        .expect("connected call");
    assert_eq!(during, "hi");

    manager.stop(&CancellationToken::new()).await;
    let after: Result<String, _> = invoker.invoke("Echo", "k", "echo", &"hi").await;
    assert!(matches!(
        after,
        Err(InvokeError::NotConnected(ConnectionState::Closed))
    ));
}

#[tokio::test]
async fn test_health_follows_lifecycle() {
    let mut manager = ConnectionManager::new(
        ScriptedClient::healthy(),
        ConnectOptions::default(),
        InstantTime::new(),
    );
    let probe = manager.health();
    assert_eq!(probe.check().status, HealthStatus::Degraded);
    assert!(!probe.is_ready());

    manager
        .start(&CancellationToken::new())
        .await
        .expect("start");
    assert_eq!(probe.check().status, HealthStatus::Healthy);
    assert!(probe.is_ready());

    manager.stop(&CancellationToken::new()).await;
    let report = probe.check();
    assert_eq!(report.status, HealthStatus::Unhealthy);
    assert_eq!(report.state, ConnectionState::Closed);
}

#[tokio::test]
async fn test_stopped_manager_cannot_start_again() {
    let client = ScriptedClient::healthy();
    let calls = client.calls();
    let mut manager = ConnectionManager::new(client, ConnectOptions::default(), InstantTime::new());
    let cancel = CancellationToken::new();

    manager.start(&cancel).await.expect("first start");
    manager.stop(&cancel).await;
    let restarted = manager.start(&cancel).await;

    assert_eq!(restarted, Err(ConnectFailure::Closed));
    assert_eq!(manager.state(), ConnectionState::Closed);
    assert_eq!(calls.connect.get(), 1);
    assert!(!manager.health().is_ready());
}

#[tokio::test]
async fn test_abandoned_close_still_blocks_restart() {
    let client = ScriptedClient::healthy().with_close(CloseBehavior::Hang);
    let calls = client.calls();
    let mut manager = ConnectionManager::new(client, ConnectOptions::default(), InstantTime::new());
    manager
        .start(&CancellationToken::new())
        .await
        .expect("start");

    let deadline = CancellationToken::new();
    deadline.cancel();
    manager.stop(&deadline).await;

    assert_eq!(
        manager.start(&CancellationToken::new()).await,
        Err(ConnectFailure::Closed)
    );
    assert_eq!(calls.connect.get(), 1);
}
