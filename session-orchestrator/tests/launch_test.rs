//! Integration tests for the session launch orchestrator
//!
//! Exercises the launch preconditions, the three launch paths, and the
//! delete-on-launch-failure rollback against the in-memory cluster client.

use std::sync::Arc;

use session_orchestrator::test_utils::{ClusterCall, MockClusterClient};
use session_orchestrator::{
    Compensation, GitInit, LaunchRequest, OrchestratorError, SessionOrchestrator, Workspace,
    WorkspaceSpec,
};

fn request() -> LaunchRequest {
    LaunchRequest {
        app_id: Some("coding-sessions".to_string()),
        app_definition: "python-ide".to_string(),
        user: "alice".to_string(),
        workspace_name: None,
        label: None,
        timeout: Some(30),
        env: None,
        git_init: None,
        ephemeral: false,
    }
}

fn git_init() -> GitInit {
    GitInit {
        repository: "https://github.com/alice/project.git".to_string(),
        checkout_ref: Some("main".to_string()),
    }
}

fn existing_workspace(name: &str, user: &str) -> Workspace {
    Workspace {
        name: name.to_string(),
        spec: WorkspaceSpec {
            name: name.to_string(),
            label: Some("Existing".to_string()),
            app_definition: "python-ide".to_string(),
            user: user.to_string(),
            storage: Some("pvc-1234".to_string()),
            error: None,
        },
    }
}

fn orchestrator(mock: &Arc<MockClusterClient>) -> SessionOrchestrator {
    mock.register_app_definition("python-ide");
    SessionOrchestrator::new(mock.clone())
}

#[tokio::test]
async fn unknown_app_definition_is_rejected() {
    let mock = Arc::new(MockClusterClient::new());
    let orchestrator = SessionOrchestrator::new(mock.clone());

    let result = orchestrator.launch("alice", &request()).await;

    match result {
        Err(OrchestratorError::InvalidAppDefinition(name)) => assert_eq!(name, "python-ide"),
        other => panic!("expected InvalidAppDefinition, got {:?}", other.err()),
    }
    assert_eq!(
        mock.calls(),
        vec![ClusterCall::HasAppDefinition("python-ide".to_string())]
    );
}

#[tokio::test]
async fn launching_for_another_user_is_forbidden() {
    let mock = Arc::new(MockClusterClient::new());
    let orchestrator = orchestrator(&mock);

    let result = orchestrator.launch("mallory", &request()).await;

    match result {
        Err(OrchestratorError::Forbidden { caller, requested }) => {
            assert_eq!(caller, "mallory");
            assert_eq!(requested, "alice");
        }
        other => panic!("expected Forbidden, got {:?}", other.err()),
    }

    // No workspace lookup, creation, or launch may have happened.
    assert_eq!(
        mock.calls(),
        vec![ClusterCall::HasAppDefinition("python-ide".to_string())]
    );
}

#[tokio::test]
async fn git_init_with_ephemeral_session_is_rejected() {
    let mock = Arc::new(MockClusterClient::new());
    let orchestrator = orchestrator(&mock);

    let mut req = request();
    req.ephemeral = true;
    req.git_init = Some(git_init());

    let result = orchestrator.launch("alice", &req).await;

    assert!(matches!(
        result,
        Err(OrchestratorError::InvalidGitInitConfiguration)
    ));
    // Nothing beyond the definition lookup was called.
    assert_eq!(
        mock.calls(),
        vec![ClusterCall::HasAppDefinition("python-ide".to_string())]
    );
}

#[tokio::test]
async fn ephemeral_launch_does_no_workspace_bookkeeping() {
    let mock = Arc::new(MockClusterClient::new());
    mock.set_session_url("https://sessions.example.com/session/eph42");
    let orchestrator = orchestrator(&mock);

    let mut req = request();
    req.ephemeral = true;

    let url = orchestrator
        .launch("alice", &req)
        .await
        .expect("ephemeral launch should succeed");

    assert_eq!(url, "https://sessions.example.com/session/eph42");
    assert_eq!(
        mock.calls(),
        vec![
            ClusterCall::HasAppDefinition("python-ide".to_string()),
            ClusterCall::LaunchEphemeral {
                app_definition: "python-ide".to_string(),
                user: "alice".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn existing_workspace_is_reused_never_recreated() {
    let mock = Arc::new(MockClusterClient::new());
    mock.insert_workspace(existing_workspace("my-project", "alice"));
    let orchestrator = orchestrator(&mock);

    let mut req = request();
    req.workspace_name = Some("My Project".to_string()); // normalizes to my-project
    req.git_init = Some(git_init());

    let url = orchestrator
        .launch("alice", &req)
        .await
        .expect("reuse launch should succeed");

    assert_eq!(url, "https://sessions.example.com/session/abc123");
    let calls = mock.calls();
    assert!(!calls
        .iter()
        .any(|c| matches!(c, ClusterCall::CreateWorkspace(_))));
    assert!(calls.contains(&ClusterCall::GetWorkspace {
        user: "alice".to_string(),
        name: "my-project".to_string(),
    }));
    assert!(calls.contains(&ClusterCall::LaunchWorkspace {
        workspace: "my-project".to_string(),
        git_init: true,
    }));
}

#[tokio::test]
async fn another_users_workspace_of_same_name_is_not_reused() {
    let mock = Arc::new(MockClusterClient::new());
    mock.insert_workspace(existing_workspace("my-project", "bob"));
    let orchestrator = orchestrator(&mock);

    let mut req = request();
    req.workspace_name = Some("my-project".to_string());

    orchestrator
        .launch("alice", &req)
        .await
        .expect("launch should fall through to creation");

    // Bob's workspace did not match; a fresh one was created for alice.
    assert!(mock
        .calls()
        .iter()
        .any(|c| matches!(c, ClusterCall::CreateWorkspace(name) if name == "my-project")));
}

#[tokio::test]
async fn create_then_launch_returns_url_without_deletion() {
    let mock = Arc::new(MockClusterClient::new());
    let orchestrator = orchestrator(&mock);

    let url = orchestrator
        .launch("alice", &request())
        .await
        .expect("create-then-launch should succeed");

    assert_eq!(url, "https://sessions.example.com/session/abc123");
    assert!(mock.deleted_workspaces().is_empty());
    assert_eq!(mock.workspace_names().len(), 1);
}

#[tokio::test]
async fn failed_creation_aborts_with_nothing_to_roll_back() {
    let mock = Arc::new(MockClusterClient::new());
    mock.fail_creates("quota exceeded");
    let orchestrator = orchestrator(&mock);

    let result = orchestrator.launch("alice", &request()).await;

    match result {
        Err(OrchestratorError::WorkspaceCreationFailed(detail)) => {
            assert!(detail.contains("quota exceeded"));
        }
        other => panic!("expected WorkspaceCreationFailed, got {:?}", other.err()),
    }
    assert!(!mock
        .calls()
        .iter()
        .any(|c| matches!(c, ClusterCall::LaunchWorkspace { .. })));
    assert!(mock.deleted_workspaces().is_empty());
}

#[tokio::test]
async fn erroneous_created_resource_is_a_creation_failure() {
    let mock = Arc::new(MockClusterClient::new());
    mock.return_erroneous_workspace("volume provisioning failed");
    let orchestrator = orchestrator(&mock);

    let result = orchestrator.launch("alice", &request()).await;

    match result {
        Err(OrchestratorError::WorkspaceCreationFailed(detail)) => {
            assert_eq!(detail, "volume provisioning failed");
        }
        other => panic!("expected WorkspaceCreationFailed, got {:?}", other.err()),
    }
    // No launch was attempted and no compensation ran.
    assert!(!mock
        .calls()
        .iter()
        .any(|c| matches!(c, ClusterCall::LaunchWorkspace { .. })));
    assert!(mock.deleted_workspaces().is_empty());
}

#[tokio::test]
async fn launch_failure_deletes_the_fresh_workspace_exactly_once() {
    let mock = Arc::new(MockClusterClient::new());
    mock.fail_launches("session deployment timed out");
    let orchestrator = orchestrator(&mock);

    let result = orchestrator.launch("alice", &request()).await;

    match result {
        Err(OrchestratorError::LaunchFailed {
            source,
            compensation,
        }) => {
            // The caller sees the launch error, not a deletion error.
            assert!(source.to_string().contains("session deployment timed out"));
            match compensation {
                Compensation::Deleted { workspace } => {
                    assert_eq!(mock.deleted_workspaces(), vec![workspace]);
                }
                other => panic!("expected Deleted, got {:?}", other),
            }
        }
        other => panic!("expected LaunchFailed, got {:?}", other.err()),
    }
    assert_eq!(mock.deleted_workspaces().len(), 1);
}

#[tokio::test]
async fn failed_compensation_never_masks_the_launch_error() {
    let mock = Arc::new(MockClusterClient::new());
    mock.fail_launches("session deployment timed out");
    mock.fail_deletes("conflict: resource busy");
    let orchestrator = orchestrator(&mock);

    let result = orchestrator.launch("alice", &request()).await;

    match result {
        Err(OrchestratorError::LaunchFailed {
            source,
            compensation,
        }) => {
            assert!(source.to_string().contains("session deployment timed out"));
            match compensation {
                Compensation::DeleteFailed { detail, .. } => {
                    assert!(detail.contains("resource busy"));
                }
                other => panic!("expected DeleteFailed, got {:?}", other),
            }
        }
        other => panic!("expected LaunchFailed, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn launch_failure_on_reused_workspace_deletes_nothing() {
    let mock = Arc::new(MockClusterClient::new());
    mock.insert_workspace(existing_workspace("my-project", "alice"));
    mock.fail_launches("session deployment timed out");
    let orchestrator = orchestrator(&mock);

    let mut req = request();
    req.workspace_name = Some("my-project".to_string());

    let result = orchestrator.launch("alice", &req).await;

    match result {
        Err(OrchestratorError::LaunchFailed { compensation, .. }) => {
            assert_eq!(compensation, Compensation::NotNeeded);
        }
        other => panic!("expected LaunchFailed, got {:?}", other.err()),
    }
    // Previously existing workspaces are never deleted by this flow.
    assert!(mock.deleted_workspaces().is_empty());
    assert_eq!(mock.workspace_names(), vec!["my-project".to_string()]);
}

#[tokio::test]
async fn ping_is_idempotent_and_mutates_nothing() {
    let mock = Arc::new(MockClusterClient::new());
    let orchestrator = SessionOrchestrator::new(mock.clone());

    for _ in 0..5 {
        assert!(orchestrator.ping("coding-sessions"));
    }
    assert!(mock.calls().is_empty());
}
