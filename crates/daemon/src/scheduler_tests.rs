// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

const HOUR: Duration = Duration::from_secs(3600);

async fn next(rx: &mut broadcast::Receiver<TaskChanged>) -> TaskAction {
    tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap().action
}

fn counting(interval: Duration) -> (ScheduledTask, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let task = ScheduledTask::new("count", interval, move |_| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    });
    (task, calls)
}

#[tokio::test]
async fn run_reports_running_then_finished() {
    let (task, calls) = counting(HOUR);
    let mut rx = task.subscribe();

    task.run(None);

    assert_eq!(next(&mut rx).await, TaskAction::Running);
    let finished = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
    assert_eq!(finished.action, TaskAction::Finished);
    assert_eq!(finished.name, "count");
    assert!(finished.elapsed.is_some());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(task.state(), TaskState::Idle);
}

#[tokio::test]
async fn overlapping_run_is_rejected() {
    let calls = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(Notify::new());
    let task = {
        let calls = Arc::clone(&calls);
        let gate = Arc::clone(&gate);
        ScheduledTask::new("gated", HOUR, move |_| {
            let calls = Arc::clone(&calls);
            let gate = Arc::clone(&gate);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                gate.notified().await;
                Ok(())
            }
        })
    };
    let mut rx = task.subscribe();

    task.run(None);
    task.run(None);

    assert_eq!(next(&mut rx).await, TaskAction::Running);
    assert_eq!(next(&mut rx).await, TaskAction::AlreadyInProgress);
    assert!(task.in_progress());

    gate.notify_one();
    assert_eq!(next(&mut rx).await, TaskAction::Finished);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn fault_is_recorded_and_task_rearms() {
    let task = ScheduledTask::new("faulty", HOUR, |_| async { Err::<(), _>(anyhow::anyhow!("boom")) });
    let mut rx = task.subscribe();

    task.run(Some(true));

    assert_eq!(next(&mut rx).await, TaskAction::Running);
    assert_eq!(next(&mut rx).await, TaskAction::Faulted);
    assert_eq!(task.state(), TaskState::Scheduled);
    assert!(task.last_fault().is_some_and(|f| f.contains("boom")));
    task.stop();
}

#[tokio::test]
async fn success_clears_previous_fault() {
    let fail = Arc::new(AtomicUsize::new(1));
    let task = {
        let fail = Arc::clone(&fail);
        ScheduledTask::new("flaky", HOUR, move |_| {
            let failing = fail.swap(0, Ordering::SeqCst) == 1;
            async move {
                if failing {
                    anyhow::bail!("first run fails");
                }
                Ok(())
            }
        })
    };
    let mut rx = task.subscribe();

    task.run(None);
    assert_eq!(next(&mut rx).await, TaskAction::Running);
    assert_eq!(next(&mut rx).await, TaskAction::Faulted);
    assert!(task.last_fault().is_some());

    task.run(None);
    assert_eq!(next(&mut rx).await, TaskAction::Running);
    assert_eq!(next(&mut rx).await, TaskAction::Finished);
    assert_eq!(task.last_fault(), None);
}

#[tokio::test]
async fn panicking_body_faults() {
    let task = ScheduledTask::new("panics", HOUR, |_| async {
        if true {
            panic!("boom");
        }
        Ok(())
    });
    let mut rx = task.subscribe();

    task.run(None);

    assert_eq!(next(&mut rx).await, TaskAction::Running);
    assert_eq!(next(&mut rx).await, TaskAction::Faulted);
    assert!(task.last_fault().is_some());
    assert_eq!(task.state(), TaskState::Idle);
}

#[tokio::test]
async fn cancel_signals_body_and_does_not_rearm() {
    let task = ScheduledTask::new("long", HOUR, |token: CancellationToken| async move {
        token.cancelled().await;
        Ok(())
    });
    let mut rx = task.subscribe();

    task.run(Some(true));
    assert_eq!(next(&mut rx).await, TaskAction::Running);

    task.cancel();

    assert_eq!(next(&mut rx).await, TaskAction::Stopped);
    assert_eq!(next(&mut rx).await, TaskAction::Canceled);
    assert_eq!(task.state(), TaskState::Canceled);
    assert!(!task.enabled());
}

#[tokio::test]
async fn start_fires_on_interval() {
    let (task, calls) = counting(Duration::from_millis(20));
    let mut rx = task.subscribe();

    task.start();

    assert_eq!(next(&mut rx).await, TaskAction::Started);
    assert_eq!(task.state(), TaskState::Scheduled);
    assert_eq!(next(&mut rx).await, TaskAction::Running);
    assert_eq!(next(&mut rx).await, TaskAction::Finished);
    assert!(calls.load(Ordering::SeqCst) >= 1);
    assert_eq!(task.state(), TaskState::Scheduled);
    task.stop();
}

#[tokio::test]
async fn stop_disarms_timer() {
    let (task, calls) = counting(Duration::from_millis(30));

    task.start();
    task.stop();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(task.state(), TaskState::Idle);
    assert!(!task.enabled());
}

#[tokio::test]
async fn restart_uses_new_interval() {
    let (task, calls) = counting(HOUR);
    let mut rx = task.subscribe();

    task.start();
    assert_eq!(next(&mut rx).await, TaskAction::Started);

    task.set_interval(Duration::from_millis(20));
    task.restart();

    let restarted = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
    assert_eq!(restarted.action, TaskAction::Started);
    assert_eq!(restarted.interval, Duration::from_millis(20));
    assert_eq!(next(&mut rx).await, TaskAction::Running);
    assert_eq!(next(&mut rx).await, TaskAction::Finished);
    assert!(calls.load(Ordering::SeqCst) >= 1);
    task.stop();
}

#[tokio::test]
async fn timer_expiring_after_stop_does_not_run() {
    let (task, calls) = counting(HOUR);
    task.start();
    let armed = task.inner.slot.lock().armed;

    task.stop();
    task.inner.fire(armed);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(task.state(), TaskState::Idle);
}

#[tokio::test]
async fn timer_from_earlier_arming_is_ignored() {
    let (task, calls) = counting(HOUR);
    task.start();
    let armed = task.inner.slot.lock().armed;

    task.restart();
    task.inner.fire(armed);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(task.state(), TaskState::Scheduled);
    assert!(task.inner.slot.lock().timer.is_some());
    task.stop();
}

#[tokio::test]
async fn current_timer_fires() {
    let (task, calls) = counting(HOUR);
    let mut rx = task.subscribe();
    task.start();
    assert_eq!(next(&mut rx).await, TaskAction::Started);
    let armed = task.inner.slot.lock().armed;

    task.inner.fire(armed);

    assert_eq!(next(&mut rx).await, TaskAction::Running);
    assert_eq!(next(&mut rx).await, TaskAction::Finished);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    task.stop();
}
