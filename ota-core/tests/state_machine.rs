mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use common::*;
use ota_common::error::OtaError;
use ota_core::installmodes::InstallModeRegistry;
use ota_core::{State, StateMachine};

#[test]
fn full_cycle_on_nand_erases_writes_activates_and_reboots() {
    let executor = RecordingExecutor::default()
        .on("flash_erase /dev/mtd9 0 0", Ok(Vec::new()))
        .on(&format!("nandwrite -p /dev/mtd9 {SHA}"), Ok(Vec::new()));
    let activation = ActivationMock::default();
    let rebooter = RebooterMock::default();
    let source = SourceMock {
        metadata: Some(metadata(vec![vec![object("flash", "device", "/dev/mtd9")]])),
        ..Default::default()
    };
    let ctx = context(flash_registry(&executor, true), &activation, &rebooter, &source);

    let report = StateMachine::new(&ctx).run(State::Idle);

    assert_eq!(
        report.statuses(),
        vec![
            "idle",
            "probe",
            "downloading",
            "downloaded",
            "installing",
            "installed",
            "reboot"
        ]
    );
    assert_eq!(report.final_state, State::Idle);
    assert_eq!(report.error(), None);
    assert_eq!(
        executor.calls(),
        vec![
            "flash_erase /dev/mtd9 0 0".to_string(),
            format!("nandwrite -p /dev/mtd9 {SHA}"),
        ]
    );
    assert_eq!(source.downloads.load(Ordering::SeqCst), 1);
    assert_eq!(activation.count(), 1);
    assert_eq!(rebooter.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn nor_device_resolved_by_mtdname_uses_flashcp() {
    let executor = RecordingExecutor::default()
        .on("flash_erase /dev/mtd6 0 0", Ok(Vec::new()))
        .on(&format!("flashcp {SHA} /dev/mtd6"), Ok(Vec::new()));
    let activation = ActivationMock {
        slot: 1,
        ..Default::default()
    };
    let ctx = context(
        flash_registry(&executor, false),
        &activation,
        &RebooterMock::default(),
        &SourceMock::default(),
    );
    let m = metadata(vec![
        vec![object("flash", "mtdname", "system0")],
        vec![object("flash", "mtdname", "system1")],
    ]);

    let (next, interrupted) = State::Installing(m.clone()).handle(&ctx);

    assert!(!interrupted);
    assert_eq!(next, State::Installed(m));
    assert_eq!(
        executor.calls(),
        vec![
            "flash_erase /dev/mtd6 0 0".to_string(),
            format!("flashcp {SHA} /dev/mtd6"),
        ]
    );
}

#[test]
fn download_fetches_the_inactive_slot() {
    let activation = ActivationMock {
        slot: 1,
        ..Default::default()
    };
    let source = SourceMock::default();
    let ctx = context(
        InstallModeRegistry::new(),
        &activation,
        &RebooterMock::default(),
        &source,
    );
    let m = metadata(vec![
        vec![object("flash", "mtdname", "system0")],
        vec![object("flash", "mtdname", "system1")],
    ]);

    let (next, interrupted) = State::Downloading(m.clone()).handle(&ctx);

    assert!(!interrupted);
    assert_eq!(next, State::Downloaded(m));
    assert_eq!(*source.slots.lock().unwrap(), vec![1]);
}

#[test]
fn no_pending_update_stops_after_probe() {
    let ctx = context(
        InstallModeRegistry::new(),
        &ActivationMock::default(),
        &RebooterMock::default(),
        &SourceMock::default(),
    );
    let report = StateMachine::new(&ctx).run(State::Idle);
    assert_eq!(report.statuses(), vec!["idle", "probe"]);
    assert_eq!(report.final_state, State::Idle);
}

#[test]
fn erase_failure_ends_in_error_without_activation() {
    let failure = OtaError::CommandFailed {
        command: "flash_erase /dev/mtd9 0 0".to_string(),
        status: "exit status: 1".to_string(),
        output: "flash_erase: error!: /dev/mtd9".to_string(),
    };
    let executor =
        RecordingExecutor::default().on("flash_erase /dev/mtd9 0 0", Err(failure.clone()));
    let activation = ActivationMock::default();
    let rebooter = RebooterMock::default();
    let ctx = context(
        flash_registry(&executor, true),
        &activation,
        &rebooter,
        &SourceMock::default(),
    );
    let m = metadata(vec![vec![object("flash", "device", "/dev/mtd9")]]);

    let report = StateMachine::new(&ctx).run(State::Downloaded(m));

    assert_eq!(report.statuses(), vec!["downloaded", "installing", "error"]);
    assert_eq!(report.error(), Some(failure.to_string().as_str()));
    assert_eq!(report.final_state, State::Idle);
    assert_eq!(executor.calls(), vec!["flash_erase /dev/mtd9 0 0"]);
    assert_eq!(activation.count(), 0);
    assert_eq!(rebooter.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn unknown_install_mode_is_reported() {
    let ctx = context(
        InstallModeRegistry::new(),
        &ActivationMock::default(),
        &RebooterMock::default(),
        &SourceMock::default(),
    );
    let m = metadata(vec![vec![object("ubifs", "ubivolume", "rootfs")]]);
    match State::Installing(m).handle(&ctx) {
        (State::Error(e), false) => {
            assert!(matches!(e.error(), OtaError::NoSuchInstallMode(name) if name == "ubifs"))
        }
        other => panic!("unexpected transition: {other:?}"),
    }
}

#[test]
fn unsupported_target_type_fails_before_any_command() {
    let executor = RecordingExecutor::default();
    let ctx = context(
        flash_registry(&executor, true),
        &ActivationMock::default(),
        &RebooterMock::default(),
        &SourceMock::default(),
    );
    let m = metadata(vec![vec![object("flash", "ubivolume", "rootfs")]]);
    let (next, _) = State::Installing(m).handle(&ctx);
    assert_eq!(
        next.to_map().get("error").and_then(|v| v.as_str()),
        Some(
            "target-type 'ubivolume' is not supported for the 'flash' handler. Its value must be either 'device' or 'mtdname'"
        )
    );
    assert!(executor.calls().is_empty());
}

#[test]
fn download_failure_ends_in_error() {
    let source = SourceMock {
        metadata: Some(metadata(vec![vec![object("flash", "device", "/dev/mtd9")]])),
        download_failure: Some(OtaError::Download("object 'rootfs.img' not found".into())),
        ..Default::default()
    };
    let ctx = context(
        InstallModeRegistry::new(),
        &ActivationMock::default(),
        &RebooterMock::default(),
        &source,
    );
    let report = StateMachine::new(&ctx).run(State::Idle);
    assert_eq!(report.statuses(), vec!["idle", "probe", "downloading", "error"]);
    assert_eq!(
        report.error(),
        Some("DownloadError: object 'rootfs.img' not found")
    );
}

#[test]
fn cleanup_runs_after_failed_setup() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut registry = InstallModeRegistry::new();
    let recorded = Arc::clone(&events);
    registry.register("recording", move || {
        let mut mode = RecordingMode::new(Arc::clone(&recorded));
        mode.fail_setup = true;
        Box::new(mode)
    });
    let ctx = context(
        registry,
        &ActivationMock::default(),
        &RebooterMock::default(),
        &SourceMock::default(),
    );
    let m = metadata(vec![vec![
        object("recording", "", "first"),
        object("recording", "", "second"),
    ]]);

    let (next, _) = State::Installing(m).handle(&ctx);

    assert_eq!(next.status(), "error");
    assert_eq!(*events.lock().unwrap(), vec!["setup first", "cleanup first"]);
}

#[test]
fn objects_are_installed_in_order_with_fresh_backends() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut registry = InstallModeRegistry::new();
    let recorded = Arc::clone(&events);
    registry.register("recording", move || {
        Box::new(RecordingMode::new(Arc::clone(&recorded)))
    });
    let ctx = context(
        registry,
        &ActivationMock::default(),
        &RebooterMock::default(),
        &SourceMock::default(),
    );
    let m = metadata(vec![vec![
        object("recording", "", "first"),
        object("recording", "", "second"),
    ]]);

    let (next, _) = State::Installing(m).handle(&ctx);

    assert_eq!(next.status(), "installed");
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            "setup first",
            "install first",
            "cleanup first",
            "setup second",
            "install second",
            "cleanup second"
        ]
    );
}

#[test]
fn cancellation_before_start_does_no_work() {
    let executor = RecordingExecutor::default();
    let activation = ActivationMock::default();
    let source = SourceMock {
        metadata: Some(metadata(vec![vec![object("flash", "device", "/dev/mtd9")]])),
        ..Default::default()
    };
    let ctx = context(
        flash_registry(&executor, true),
        &activation,
        &RebooterMock::default(),
        &source,
    );
    ctx.cancel();

    let report = StateMachine::new(&ctx).run(State::Installed(metadata(vec![])));

    assert_eq!(report.statuses(), vec!["installed"]);
    assert_eq!(report.final_state, State::Idle);
    assert_eq!(activation.count(), 0);
}

#[test]
fn cancellation_between_objects_stops_installing() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let cancel = Arc::new(AtomicBool::new(false));
    let mut registry = InstallModeRegistry::new();
    let recorded = Arc::clone(&events);
    let cancel_flag = Arc::clone(&cancel);
    registry.register("recording", move || {
        let mut mode = RecordingMode::new(Arc::clone(&recorded));
        mode.cancel_on_install = Some(Arc::clone(&cancel_flag));
        Box::new(mode)
    });
    let activation = ActivationMock::default();
    let ctx = context(
        registry,
        &activation,
        &RebooterMock::default(),
        &SourceMock::default(),
    )
    .with_cancel_flag(cancel);
    let m = metadata(vec![vec![
        object("recording", "", "first"),
        object("recording", "", "second"),
    ]]);

    let report = StateMachine::new(&ctx).run(State::Installing(m));

    assert_eq!(report.statuses(), vec!["installing"]);
    assert_eq!(report.final_state, State::Idle);
    assert_eq!(
        *events.lock().unwrap(),
        vec!["setup first", "install first", "cleanup first"]
    );
    assert_eq!(activation.count(), 0);
}
