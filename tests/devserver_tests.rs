//! Session-level tests for the dev-server orchestrator, driven against
//! shell fake services so no PHP or Node toolchain is needed.

use std::time::Duration;

use stackgen::devserver::{
    DevServerConfig, DevSession, DevServerError, Interrupt, ProcessState, ServiceRole,
    ServiceSpec, Startup,
};

fn shell_service(role: ServiceRole, script: &str, marker: &str) -> ServiceSpec {
    let (endpoint, noise) = match role {
        ServiceRole::Backend => ("http://localhost:8000", Vec::new()),
        ServiceRole::Frontend => ("http://localhost:4200", vec!["Warning".to_string()]),
    };
    ServiceSpec {
        role,
        command: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        cwd: std::env::temp_dir(),
        ready_marker: marker.to_string(),
        endpoint: endpoint.to_string(),
        noise_patterns: noise,
    }
}

fn config(backend: ServiceSpec, frontend: ServiceSpec, timeout: Duration) -> DevServerConfig {
    DevServerConfig {
        backend,
        frontend,
        database_label: "my_shop_db".to_string(),
        ready_timeout: timeout,
    }
}

#[tokio::test]
async fn session_comes_online_and_reports_once() {
    let backend = shell_service(
        ServiceRole::Backend,
        "echo 'Development server started'; exec sleep 30",
        "started",
    );
    let frontend = shell_service(
        ServiceRole::Frontend,
        "echo 'compiled successfully'; exec sleep 30",
        "compiled successfully",
    );
    let (_trigger, interrupt) = Interrupt::manual();
    let mut session =
        DevSession::with_interrupt(config(backend, frontend, Duration::from_secs(10)), interrupt);

    let startup = session.start().await.expect("startup should succeed");
    assert_eq!(startup, Startup::Online);
    assert!(session.report_emitted());
    assert!(session.is_ready(ServiceRole::Backend));
    assert!(session.is_ready(ServiceRole::Frontend));
    assert_eq!(
        session.state_of(ServiceRole::Backend),
        Some(ProcessState::ReadyDetected)
    );

    session.shutdown().await;
    assert!(session.is_shut_down());
    assert_eq!(
        session.state_of(ServiceRole::Backend),
        Some(ProcessState::Terminated)
    );
    assert_eq!(
        session.state_of(ServiceRole::Frontend),
        Some(ProcessState::Terminated)
    );
}

#[tokio::test]
async fn frontend_is_not_spawned_until_the_backend_is_ready() {
    // The backend never prints its marker, so the barrier must time out
    // without the frontend ever having been started.
    let backend = shell_service(ServiceRole::Backend, "exec sleep 30", "started");
    let frontend = shell_service(
        ServiceRole::Frontend,
        "echo 'compiled successfully'; exec sleep 30",
        "compiled successfully",
    );
    let (_trigger, interrupt) = Interrupt::manual();
    let mut session = DevSession::with_interrupt(
        config(backend, frontend, Duration::from_millis(300)),
        interrupt,
    );

    let err = session.start().await.expect_err("barrier should time out");
    assert!(matches!(
        err,
        DevServerError::ReadyTimeout {
            role: ServiceRole::Backend,
            ..
        }
    ));
    assert!(session.state_of(ServiceRole::Frontend).is_none());
    assert!(!session.report_emitted());

    session.shutdown().await;
    assert_eq!(
        session.state_of(ServiceRole::Backend),
        Some(ProcessState::Terminated)
    );
}

#[tokio::test]
async fn interrupt_during_startup_tears_down_cleanly() {
    let backend = shell_service(ServiceRole::Backend, "exec sleep 30", "started");
    let frontend = shell_service(ServiceRole::Frontend, "exec sleep 30", "compiled successfully");
    let (trigger, interrupt) = Interrupt::manual();
    let mut session =
        DevSession::with_interrupt(config(backend, frontend, Duration::from_secs(30)), interrupt);

    let fire = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.trigger();
    });

    let startup = session.start().await.expect("interrupt is not an error");
    assert_eq!(startup, Startup::Interrupted);
    assert!(!session.report_emitted());

    session.shutdown().await;
    assert!(session.is_shut_down());
    assert_eq!(
        session.state_of(ServiceRole::Backend),
        Some(ProcessState::Terminated)
    );
    fire.await.unwrap();
}

#[tokio::test]
async fn backend_spawn_failure_aborts_before_the_frontend() {
    let mut backend = shell_service(ServiceRole::Backend, "true", "started");
    backend.command = "stackgen-no-such-binary".to_string();
    let frontend = shell_service(
        ServiceRole::Frontend,
        "echo 'compiled successfully'; exec sleep 30",
        "compiled successfully",
    );
    let (_trigger, interrupt) = Interrupt::manual();
    let mut session =
        DevSession::with_interrupt(config(backend, frontend, Duration::from_secs(5)), interrupt);

    let err = session.start().await.expect_err("spawn should fail");
    assert!(matches!(
        err,
        DevServerError::Spawn {
            role: ServiceRole::Backend,
            ..
        }
    ));
    assert!(session.state_of(ServiceRole::Backend).is_none());
    assert!(session.state_of(ServiceRole::Frontend).is_none());

    // Teardown with nothing tracked is still safe.
    session.shutdown().await;
    assert!(session.is_shut_down());
}

#[tokio::test]
async fn frontend_spawn_failure_still_leaves_the_backend_reachable() {
    let backend = shell_service(
        ServiceRole::Backend,
        "echo 'Development server started'; exec sleep 30",
        "started",
    );
    let mut frontend = shell_service(ServiceRole::Frontend, "true", "compiled successfully");
    frontend.command = "stackgen-no-such-binary".to_string();
    let (_trigger, interrupt) = Interrupt::manual();
    let mut session =
        DevSession::with_interrupt(config(backend, frontend, Duration::from_secs(10)), interrupt);

    let err = session.start().await.expect_err("frontend spawn should fail");
    assert!(matches!(
        err,
        DevServerError::Spawn {
            role: ServiceRole::Frontend,
            ..
        }
    ));

    // The backend that already started must still be torn down.
    session.shutdown().await;
    assert_eq!(
        session.state_of(ServiceRole::Backend),
        Some(ProcessState::Terminated)
    );
}

#[tokio::test]
async fn repeated_interrupts_and_shutdowns_terminate_each_process_once() {
    let backend = shell_service(
        ServiceRole::Backend,
        "echo 'Development server started'; exec sleep 30",
        "started",
    );
    let frontend = shell_service(
        ServiceRole::Frontend,
        "echo 'compiled successfully'; exec sleep 30",
        "compiled successfully",
    );
    let (trigger, interrupt) = Interrupt::manual();
    let mut session =
        DevSession::with_interrupt(config(backend, frontend, Duration::from_secs(10)), interrupt);

    let startup = session.start().await.expect("startup should succeed");
    assert_eq!(startup, Startup::Online);

    // The operator hammering Ctrl-C must collapse into one teardown.
    trigger.trigger();
    trigger.trigger();
    trigger.trigger();

    session.shutdown().await;
    assert!(session.is_shut_down());
    assert_eq!(
        session.state_of(ServiceRole::Backend),
        Some(ProcessState::Terminated)
    );

    // Second teardown request is a silent no-op.
    session.shutdown().await;
    assert!(session.is_shut_down());
    assert_eq!(
        session.state_of(ServiceRole::Frontend),
        Some(ProcessState::Terminated)
    );
}

#[tokio::test]
async fn readiness_marker_is_scanned_on_stderr_even_when_filtered_as_noise() {
    // The marker arrives on stderr inside a line the noise filter hides
    // from the operator; detection must still fire.
    let mut backend = shell_service(
        ServiceRole::Backend,
        "echo 'Warning: Development server started' 1>&2; exec sleep 30",
        "started",
    );
    backend.noise_patterns = vec!["Warning".to_string()];
    let frontend = shell_service(
        ServiceRole::Frontend,
        "echo 'compiled successfully'; exec sleep 30",
        "compiled successfully",
    );
    let (_trigger, interrupt) = Interrupt::manual();
    let mut session =
        DevSession::with_interrupt(config(backend, frontend, Duration::from_secs(10)), interrupt);

    let startup = session.start().await.expect("startup should succeed");
    assert_eq!(startup, Startup::Online);
    assert!(session.is_ready(ServiceRole::Backend));

    session.shutdown().await;
}

#[tokio::test]
async fn marker_split_across_chunks_is_still_detected() {
    // printf without a trailing newline, flushed in two pieces, forces the
    // marker to straddle a read boundary.
    let backend = shell_service(
        ServiceRole::Backend,
        "printf 'development server sta'; sleep 0.2; printf 'rted\\n'; exec sleep 30",
        "started",
    );
    let frontend = shell_service(
        ServiceRole::Frontend,
        "echo 'compiled successfully'; exec sleep 30",
        "compiled successfully",
    );
    let (_trigger, interrupt) = Interrupt::manual();
    let mut session =
        DevSession::with_interrupt(config(backend, frontend, Duration::from_secs(10)), interrupt);

    let startup = session.start().await.expect("startup should succeed");
    assert_eq!(startup, Startup::Online);

    session.shutdown().await;
}

#[tokio::test]
async fn full_run_terminates_after_an_early_interrupt() {
    let backend = shell_service(ServiceRole::Backend, "exec sleep 30", "started");
    let frontend = shell_service(ServiceRole::Frontend, "exec sleep 30", "compiled successfully");
    let (trigger, interrupt) = Interrupt::manual();
    let session =
        DevSession::with_interrupt(config(backend, frontend, Duration::from_secs(30)), interrupt);

    trigger.trigger();
    // An interrupt before anything is ready is a normal exit, not an error.
    session.run().await.expect("interrupted run exits cleanly");
}
