use anyhow::Result;
use portdeck::domain::{ContainerState, LifecycleAction};
use portdeck::infra::HttpGateway;
use portdeck::services::{DispatchError, LifecycleDispatcher, REFRESH_FAILED, SnapshotStore};
use portdeck::test_support::{MockGateway, RecordingNotifier};
use std::sync::Arc;
use std::time::Duration;

async fn setup(
    mock: Arc<MockGateway>,
) -> Result<(Arc<SnapshotStore>, LifecycleDispatcher, Arc<RecordingNotifier>)> {
    let notifier = Arc::new(RecordingNotifier::new());
    let store = Arc::new(SnapshotStore::new(mock.clone(), notifier.clone()));
    store.refresh().await?;
    notifier.clear();
    let dispatcher = LifecycleDispatcher::new(mock, store.clone(), notifier.clone());
    Ok((store, dispatcher, notifier))
}

#[tokio::test]
async fn test_failed_stop_leaves_everything_consistent() -> Result<()> {
    let mock = Arc::new(MockGateway::new());
    mock.add_container("x", "web", ContainerState::Running);
    let (store, dispatcher, notifier) = setup(mock.clone()).await?;
    mock.set_fail_on_with_detail("stop", "container x is locked");

    let err = dispatcher
        .dispatch("x", LifecycleAction::Stop)
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Gateway(_)));
    assert!(!err.is_local());
    assert_eq!(notifier.failures(), vec!["container x is locked".to_string()]);
    // refresh still ran and the remote state is unchanged
    assert_eq!(mock.get_commands(), vec!["list", "stop:x", "list"]);
    assert_eq!(
        store.current_snapshot().get("x").map(|r| r.state.clone()),
        Some(ContainerState::Running)
    );
    assert!(!dispatcher.is_in_flight("x"));

    // the dispatcher is usable again afterwards
    mock.clear_failure();
    dispatcher.dispatch("x", LifecycleAction::Stop).await?;
    Ok(())
}

#[tokio::test]
async fn test_failure_without_detail_uses_generic_message() -> Result<()> {
    let mock = Arc::new(MockGateway::new());
    mock.add_container("x", "web", ContainerState::Exited);
    let (_, dispatcher, notifier) = setup(mock.clone()).await?;
    mock.set_fail_on("start");

    assert!(dispatcher.dispatch("x", LifecycleAction::Start).await.is_err());
    assert_eq!(
        notifier.failures(),
        vec!["Failed to start container".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn test_refresh_after_action_can_fail_without_losing_snapshot() -> Result<()> {
    let mock = Arc::new(MockGateway::new());
    mock.add_container("x", "web", ContainerState::Running);
    let (store, dispatcher, notifier) = setup(mock.clone()).await?;
    let before = store.current_snapshot();
    mock.set_fail_on("list");

    // the action itself succeeds, only the resync fails
    let result = dispatcher.dispatch("x", LifecycleAction::Pause).await?;
    assert_eq!(result.status, "paused");
    assert_eq!(*store.current_snapshot(), *before);
    assert_eq!(notifier.failures(), vec![REFRESH_FAILED.to_string()]);

    mock.clear_failure();
    store.refresh().await?;
    assert_eq!(
        store.current_snapshot().get("x").map(|r| r.state.clone()),
        Some(ContainerState::Paused)
    );
    Ok(())
}

#[tokio::test]
async fn test_concurrent_dispatch_on_same_container_is_rejected() -> Result<()> {
    let mock = Arc::new(MockGateway::new());
    mock.add_container("1", "web", ContainerState::Running);
    let (_, dispatcher, _) = setup(mock.clone()).await?;
    let gate = mock.hold_actions();

    let (first, second) = tokio::join!(
        dispatcher.dispatch("1", LifecycleAction::Pause),
        async {
            tokio::task::yield_now().await;
            let rejected = dispatcher.dispatch("1", LifecycleAction::Stop).await;
            gate.notify_one();
            rejected
        }
    );

    first?;
    assert!(matches!(second, Err(DispatchError::ActionInFlight(_))));
    assert_eq!(
        mock.get_commands()
            .iter()
            .filter(|c| c.as_str() != "list")
            .map(String::as_str)
            .collect::<Vec<_>>(),
        vec!["pause:1"]
    );
    Ok(())
}

#[tokio::test]
async fn test_unreachable_api_is_reported_and_keeps_empty_snapshot() -> Result<()> {
    // nothing listens on port 9 of localhost in the test environment
    let gateway = Arc::new(HttpGateway::new("http://127.0.0.1:9", Duration::from_secs(2))?);
    let notifier = Arc::new(RecordingNotifier::new());
    let store = SnapshotStore::new(gateway, notifier.clone());

    assert!(store.refresh().await.is_err());
    assert!(store.current_snapshot().is_empty());
    assert_eq!(notifier.failures(), vec![REFRESH_FAILED.to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_backend_error_detail_reaches_the_user() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _list = server
        .mock("GET", "/api/containers")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"Id":"abc","Names":["/web"],"Image":"nginx","State":"running","Status":"Up"}]"#)
        .create_async()
        .await;
    let _restart = server
        .mock("POST", "/api/restart/abc")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail":"Cannot connect to the Docker daemon"}"#)
        .create_async()
        .await;

    let gateway = Arc::new(HttpGateway::new(server.url(), Duration::from_secs(5))?);
    let notifier = Arc::new(RecordingNotifier::new());
    let store = Arc::new(SnapshotStore::new(gateway.clone(), notifier.clone()));
    store.refresh().await?;
    let dispatcher = LifecycleDispatcher::new(gateway, store, notifier.clone());

    let err = dispatcher
        .dispatch("abc", LifecycleAction::Restart)
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Gateway(_)));
    assert!(
        notifier
            .failures()
            .contains(&"Cannot connect to the Docker daemon".to_string())
    );
    Ok(())
}
