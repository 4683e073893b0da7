use portdeck::domain::{ContainerRecord, ContainerState, LifecycleAction, Snapshot, is_allowed};
use portdeck::services::assemble;

const KNOWN_STATES: [&str; 7] = [
    "created",
    "running",
    "paused",
    "restarting",
    "removing",
    "exited",
    "dead",
];

#[test]
fn test_start_is_only_offered_to_stopped_like_states() {
    for raw in KNOWN_STATES {
        let state = ContainerState::parse(raw);
        let expected = !matches!(raw, "running" | "paused");
        assert_eq!(
            is_allowed(&state, LifecycleAction::Start),
            expected,
            "start from {raw}"
        );
    }
}

#[test]
fn test_stop_and_restart_rejected_only_when_exited() {
    for raw in KNOWN_STATES {
        let state = ContainerState::parse(raw);
        for action in [LifecycleAction::Stop, LifecycleAction::Restart] {
            assert_eq!(is_allowed(&state, action), raw != "exited", "{action} from {raw}");
        }
    }
}

#[test]
fn test_pause_and_resume_are_exclusive() {
    for raw in KNOWN_STATES {
        let state = ContainerState::parse(raw);
        assert_eq!(is_allowed(&state, LifecycleAction::Pause), raw == "running");
        assert_eq!(is_allowed(&state, LifecycleAction::Resume), raw == "paused");
        assert!(
            !(is_allowed(&state, LifecycleAction::Pause)
                && is_allowed(&state, LifecycleAction::Resume))
        );
    }
}

#[test]
fn test_unknown_state_only_allows_start_and_stop() {
    let state = ContainerState::parse("hibernating");
    assert!(state.is_unknown());
    assert_eq!(
        state.allowed_actions(),
        vec![LifecycleAction::Start, LifecycleAction::Stop]
    );
    assert_eq!(state.to_string(), "hibernating");
}

#[test]
fn test_decodes_docker_list_payload() {
    let payload = r#"[
        {
            "Id": "4f66ad9a0b2e",
            "Names": ["/api"],
            "Image": "nginx:latest",
            "State": "running",
            "Status": "Up 2 hours",
            "Labels": {"com.docker.compose.project": "shop"},
            "Ports": []
        },
        {
            "Id": "9ab0c1",
            "Names": ["/portainer"],
            "Image": "portainer/portainer-ce",
            "State": "running",
            "Status": "Up 3 days"
        }
    ]"#;

    let raw: Vec<ContainerRecord> = serde_json::from_str(payload).unwrap();
    assert_eq!(raw[0].state, ContainerState::Running);
    assert!(raw[0].labels.is_some());
    assert!(raw[1].labels.is_none());

    let snapshot = assemble(raw, &["portainer".to_string()]);
    assert_eq!(snapshot.display_names(), vec!["api"]);
    assert_eq!(snapshot.records()[0].status, "Up 2 hours");
}

#[test]
fn test_snapshot_lookup_by_name_and_prefix() {
    let snapshot = Snapshot::new(vec![
        ContainerRecord::new("aaa111", "/web", ContainerState::Running),
        ContainerRecord::new("aab222", "/db", ContainerState::Exited),
    ]);

    assert_eq!(snapshot.find("db").map(|r| r.id.as_str()), Some("aab222"));
    assert_eq!(snapshot.find("/web").map(|r| r.id.as_str()), Some("aaa111"));
    assert_eq!(snapshot.find("aab").map(|r| r.id.as_str()), Some("aab222"));
    // ambiguous prefix
    assert!(snapshot.find("aa").is_none());
}

#[test]
fn test_action_names_round_trip_through_cli_and_wire() {
    for action in LifecycleAction::ALL {
        assert_eq!(action.as_str().parse::<LifecycleAction>().unwrap(), action);
    }
    assert_eq!(
        "unpause".parse::<LifecycleAction>().unwrap(),
        LifecycleAction::Resume
    );
    assert!("remove".parse::<LifecycleAction>().is_err());
}
