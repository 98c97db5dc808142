// ABOUTME: Tests for the batch coordinator.
// ABOUTME: One device's failure never aborts the batch; results cover every device.

mod support;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use perista::deploy::{Coordinator, DeviceLock, MSG_ALL_UPDATED, MSG_SOME_FAILED, SkipFlag};
use perista::diagnostics::Diagnostics;
use perista::types::{Batch, Role};
use support::{FakeBackend, collecting_sink, device, fake_bundle, passthrough_settings, profile};

fn no_skip() -> SkipFlag {
    Arc::new(AtomicBool::new(false))
}

#[tokio::test]
async fn all_devices_succeeding_yields_success_message() {
    let backend = FakeBackend::new();
    let coordinator = Coordinator::new(backend, passthrough_settings());
    let batch = Batch::new(vec![
        device("/batch/ok-a", Some(Role::Primary)),
        device("/batch/ok-b", Some(Role::Secondary)),
    ])
    .unwrap();
    let (_dir, bundle) = fake_bundle();
    let (sink, _seen) = collecting_sink();
    let mut diag = Diagnostics::default();

    let result = coordinator
        .perform_batch_update(&batch, &bundle, sink, &no_skip(), false, &mut diag)
        .await;

    assert!(result.success);
    assert_eq!(result.message, MSG_ALL_UPDATED);
    assert_eq!(result.device_updates.len(), 2);
    assert!(result.device_updates.iter().all(|u| u.success));
}

#[tokio::test]
async fn one_failure_continues_and_reports_mixed_outcome() {
    let backend = FakeBackend::new();
    backend.fail_erase("/batch/mixed-b", "device vanished");
    let coordinator = Coordinator::new(backend, passthrough_settings());
    let batch = Batch::new(vec![
        device("/batch/mixed-a", Some(Role::Primary)),
        device("/batch/mixed-b", Some(Role::Secondary)),
    ])
    .unwrap();
    let (_dir, bundle) = fake_bundle();
    let (sink, _seen) = collecting_sink();
    let mut diag = Diagnostics::default();

    let result = coordinator
        .perform_batch_update(&batch, &bundle, sink, &no_skip(), false, &mut diag)
        .await;

    assert!(!result.success);
    assert_eq!(result.message, MSG_SOME_FAILED);
    assert_eq!(result.device_updates.len(), 2);

    // The first device ran to completion despite the second failing.
    let first = &result.device_updates[0];
    assert!(first.success);
    assert!(first.error.is_none());

    let second = &result.device_updates[1];
    assert!(!second.success);
    assert!(second.error.as_deref().unwrap().contains("device vanished"));
}

#[tokio::test]
async fn devices_are_processed_strictly_sequentially() {
    let coordinator = Coordinator::new(FakeBackend::new(), passthrough_settings());
    let batch = Batch::new(vec![
        device("/batch/seq-a", Some(Role::Primary)),
        device("/batch/seq-b", Some(Role::Secondary)),
    ])
    .unwrap();
    let (_dir, bundle) = fake_bundle();
    let (sink, _seen) = collecting_sink();
    let mut diag = Diagnostics::default();

    coordinator
        .perform_batch_update(&batch, &bundle, sink, &no_skip(), false, &mut diag)
        .await;

    let calls = coordinator.backend().calls();
    let last_a = calls
        .iter()
        .rposition(|c| c.contains("/batch/seq-a"))
        .unwrap();
    let first_b = calls
        .iter()
        .position(|c| c.contains("/batch/seq-b"))
        .unwrap();
    assert!(last_a < first_b, "device A must finish before device B starts");
}

#[tokio::test]
async fn skip_flag_marks_remaining_devices_without_touching_them() {
    let backend = FakeBackend::new();
    let coordinator = Coordinator::new(backend, passthrough_settings());
    let batch = Batch::new(vec![
        device("/batch/skip-a", Some(Role::Primary)),
        device("/batch/skip-b", Some(Role::Secondary)),
    ])
    .unwrap();
    let (_dir, bundle) = fake_bundle();
    let (sink, _seen) = collecting_sink();
    let mut diag = Diagnostics::default();

    let skip: SkipFlag = Arc::new(AtomicBool::new(true));
    let result = coordinator
        .perform_batch_update(&batch, &bundle, sink, &skip, false, &mut diag)
        .await;

    assert!(!result.success);
    assert_eq!(result.device_updates.len(), 2);
    for update in &result.device_updates {
        assert!(!update.success);
        assert_eq!(update.error.as_deref(), Some("update skipped by operator"));
    }
}

#[tokio::test]
async fn locked_device_fails_without_aborting_batch() {
    let backend = FakeBackend::new();
    let coordinator = Coordinator::new(backend, passthrough_settings());
    let locked = device("/batch/locked-a", Some(Role::Primary));
    let free = device("/batch/locked-b", Some(Role::Secondary));
    let batch = Batch::new(vec![locked.clone(), free]).unwrap();
    let (_dir, bundle) = fake_bundle();
    let (sink, _seen) = collecting_sink();
    let mut diag = Diagnostics::default();

    let held = DeviceLock::acquire(&locked.path, false).unwrap();
    let result = coordinator
        .perform_batch_update(&batch, &bundle, sink, &no_skip(), false, &mut diag)
        .await;
    held.release().unwrap();

    assert!(!result.success);
    let first = &result.device_updates[0];
    assert!(!first.success);
    assert!(first.error.as_deref().unwrap().contains("device locked"));
    assert!(result.device_updates[1].success);
}

#[tokio::test]
async fn force_breaks_a_live_lock() {
    let backend = FakeBackend::new();
    let coordinator = Coordinator::new(backend, passthrough_settings());
    let target = device("/batch/forced-a", Some(Role::Primary));
    let batch = Batch::new(vec![target.clone()]).unwrap();
    let (_dir, bundle) = fake_bundle();
    let (sink, _seen) = collecting_sink();
    let mut diag = Diagnostics::default();

    let _held = DeviceLock::acquire(&target.path, false).unwrap();
    let result = coordinator
        .perform_batch_update(&batch, &bundle, sink, &no_skip(), true, &mut diag)
        .await;

    assert!(result.success);
}

#[tokio::test]
async fn therapy_batch_shares_the_result_model() {
    let backend = FakeBackend::new();
    backend.fail_therapy("/batch/therapy-b", "device rebooted early");
    let coordinator = Coordinator::new(backend, passthrough_settings());
    let batch = Batch::new(vec![
        device("/batch/therapy-a", None),
        device("/batch/therapy-b", None),
    ])
    .unwrap();
    let (sink, _seen) = collecting_sink();
    let mut diag = Diagnostics::default();

    let result = coordinator
        .perform_batch_configure(&batch, &profile("evening"), sink, &no_skip(), false, &mut diag)
        .await;

    assert!(!result.success);
    assert_eq!(result.message, MSG_SOME_FAILED);
    assert!(result.device_updates[0].success);
    assert!(!result.device_updates[1].success);
}
