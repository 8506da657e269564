// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduler integration tests over the full test harness.

use std::sync::Arc;
use std::time::Duration;

use tracing_test::traced_test;
use youclaw_context::SystemPrompt;
use youclaw_core::{DeliveryTarget, MemorySource, YouclawError};
use youclaw_cron::{
    DELIVERY_HEADER, NewTask, SchedulerSettings, TaskRunState, TaskScheduler, TaskUpdate,
};
use youclaw_test_utils::{MockSink, TestHarness};

fn target() -> DeliveryTarget {
    DeliveryTarget {
        platform: "mock".into(),
        channel: "chat-1".into(),
    }
}

fn task(user: &str, schedule: &str, prompt: &str) -> NewTask {
    NewTask {
        user_id: user.into(),
        schedule: schedule.into(),
        prompt_template: prompt.into(),
        delivery_target: target(),
    }
}

fn minute() -> Duration {
    Duration::from_secs(60)
}

#[tokio::test]
async fn crud_is_scoped_to_the_owner() {
    let h = TestHarness::new().await.unwrap();
    let created = h
        .scheduler
        .create_task(task("alice", "every 60 seconds", "Weather report"))
        .await
        .unwrap();
    assert!(created.enabled);
    assert_eq!(created.last_run_at, None);
    assert_eq!(created.next_run_at, h.clock.now() + chrono::Duration::seconds(60));

    assert_eq!(h.scheduler.list_tasks(Some("alice")).len(), 1);
    assert!(h.scheduler.list_tasks(Some("bob")).is_empty());
    assert_eq!(h.scheduler.list_tasks(None).len(), 1);

    let err = h
        .scheduler
        .update_task(
            &created.id,
            "bob",
            TaskUpdate {
                prompt_template: Some("hijacked".into()),
                ..TaskUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, YouclawError::NotFound { entity: "task", .. }));

    let updated = h
        .scheduler
        .update_task(
            &created.id,
            "alice",
            TaskUpdate {
                prompt_template: Some("Weather and news".into()),
                ..TaskUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.prompt_template, "Weather and news");
    assert_eq!(updated.next_run_at, created.next_run_at);

    assert!(matches!(
        h.scheduler.delete_task(&created.id, "bob").await,
        Err(YouclawError::NotFound { .. })
    ));
    h.scheduler.delete_task(&created.id, "alice").await.unwrap();
    assert!(matches!(
        h.scheduler.get_task(&created.id),
        Err(YouclawError::NotFound { .. })
    ));

    // The index and storage agree after a reload.
    assert_eq!(h.scheduler.load().await.unwrap(), 0);
}

#[tokio::test]
async fn malformed_tasks_are_rejected() {
    let h = TestHarness::new().await.unwrap();
    for bad in [
        task("alice", "every banana", "x"),
        task("alice", "every 0 minutes", "x"),
        task("alice", "daily", "   "),
        task("", "daily", "x"),
    ] {
        let err = h.scheduler.create_task(bad).await.unwrap_err();
        assert!(matches!(err, YouclawError::InvalidInput(_)), "{err}");
    }
    assert!(h.scheduler.list_tasks(None).is_empty());
}

#[tokio::test]
async fn nothing_fires_before_it_is_due() {
    let h = TestHarness::new().await.unwrap();
    h.scheduler
        .create_task(task("alice", "every 60 seconds", "Ping"))
        .await
        .unwrap();
    h.clock.advance(Duration::from_secs(59));
    assert!(h.scheduler.run_due().await.is_empty());
    assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test]
async fn successful_fire_persists_delivers_and_advances() {
    let h = TestHarness::builder()
        .with_mock_responses(vec!["Rain expected at noon.".into()])
        .build()
        .await
        .unwrap();
    let created = h
        .scheduler
        .create_task(task("alice", "every 60 seconds", "Weather report for {user_id}"))
        .await
        .unwrap();

    h.clock.advance(minute());
    let fired_at = h.clock.now();
    let outcomes = h.scheduler.run_due().await;
    assert_eq!(outcomes.len(), 1);
    let outcome = &outcomes[0];
    assert!(outcome.succeeded());
    assert!(outcome.delivered);
    assert_eq!(outcome.fired_at, fired_at);
    assert_eq!(outcome.next_run_at, fired_at + chrono::Duration::seconds(60));

    let after = h.scheduler.get_task(&created.id).unwrap();
    assert_eq!(after.last_run_at, Some(fired_at));
    assert_eq!(after.next_run_at, fired_at + chrono::Duration::seconds(60));
    assert_eq!(h.scheduler.run_state(&created.id), Some(TaskRunState::Idle));

    let prompt = h.provider.last_prompt().unwrap();
    assert!(prompt.contains("### MISSION BRIEFING ###"));
    assert!(prompt.contains("Weather report for alice"));

    let sent = h.channel.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].channel, "chat-1");
    assert!(sent[0].text.starts_with(DELIVERY_HEADER));
    assert!(sent[0].text.ends_with("Rain expected at noon."));

    let recent = h.memory.recent("alice", 10).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].source, MemorySource::ScheduledTask);
    assert_eq!(recent[0].text, "Rain expected at noon.");
    assert_eq!(recent[0].platform.as_deref(), Some("mock"));

    // Advanced state survives a reload.
    h.scheduler.load().await.unwrap();
    let reloaded = h.scheduler.get_task(&created.id).unwrap();
    assert_eq!(reloaded.last_run_at, Some(fired_at));
    assert_eq!(reloaded.next_run_at, after.next_run_at);
}

#[tokio::test]
#[traced_test]
async fn unreachable_target_still_persists_and_advances() {
    let h = TestHarness::builder()
        .with_mock_responses(vec!["Daily digest".into()])
        .build()
        .await
        .unwrap();
    let created = h
        .scheduler
        .create_task(task("alice", "every 60 seconds", "Digest"))
        .await
        .unwrap();
    h.channel.set_failing(true);

    h.clock.advance(minute());
    let fired_at = h.clock.now();
    let outcomes = h.scheduler.run_due().await;
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].succeeded());
    assert!(!outcomes[0].delivered);

    let after = h.scheduler.get_task(&created.id).unwrap();
    assert_eq!(after.last_run_at, Some(fired_at));
    assert_eq!(after.next_run_at, fired_at + chrono::Duration::seconds(60));
    assert_eq!(h.memory.count("alice").await.unwrap(), 1);
    assert_eq!(h.channel.sent_count().await, 0);
    assert!(logs_contain("delivery failed"));

    // Not retried within the same cycle.
    assert!(h.scheduler.run_due().await.is_empty());
    assert_eq!(h.provider.call_count(), 1);
}

#[tokio::test]
async fn failed_run_waits_for_next_natural_occurrence() {
    let h = TestHarness::new().await.unwrap();
    let created = h
        .scheduler
        .create_task(task("alice", "every 60 seconds", "Stock summary"))
        .await
        .unwrap();
    h.provider.set_failing(true);

    h.clock.advance(minute());
    let fired_at = h.clock.now();
    let outcomes = h.scheduler.run_due().await;
    assert_eq!(outcomes.len(), 1);
    assert!(!outcomes[0].succeeded());
    assert!(!outcomes[0].delivered);

    let after = h.scheduler.get_task(&created.id).unwrap();
    assert!(after.enabled);
    assert_eq!(after.last_run_at, None);
    assert_eq!(after.next_run_at, fired_at + chrono::Duration::seconds(60));
    assert_eq!(h.scheduler.run_state(&created.id), Some(TaskRunState::Failed));
    assert_eq!(h.memory.count("alice").await.unwrap(), 0);
    assert_eq!(h.channel.sent_count().await, 0);

    // No early retry.
    h.clock.advance(Duration::from_secs(30));
    assert!(h.scheduler.run_due().await.is_empty());
    assert_eq!(h.provider.call_count(), 1);

    // Next natural occurrence succeeds.
    h.provider.set_failing(false);
    h.clock.advance(Duration::from_secs(30));
    let outcomes = h.scheduler.run_due().await;
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].succeeded());
    assert_eq!(h.scheduler.run_state(&created.id), Some(TaskRunState::Idle));
}

#[tokio::test]
async fn disabled_tasks_do_not_fire_and_reenabling_reschedules() {
    let h = TestHarness::new().await.unwrap();
    let created = h
        .scheduler
        .create_task(task("alice", "every 60 seconds", "Ping"))
        .await
        .unwrap();
    h.scheduler.set_enabled(&created.id, "alice", false).await.unwrap();

    h.clock.advance(Duration::from_secs(600));
    assert!(h.scheduler.run_due().await.is_empty());
    assert_eq!(h.provider.call_count(), 0);

    let enabled = h.scheduler.set_enabled(&created.id, "alice", true).await.unwrap();
    assert_eq!(enabled.next_run_at, h.clock.now() + chrono::Duration::seconds(60));
    assert!(h.scheduler.run_due().await.is_empty());
}

#[tokio::test]
async fn missed_occurrences_fire_once_after_restart() {
    let h = TestHarness::new().await.unwrap();
    let created = h
        .scheduler
        .create_task(task("alice", "every 60 seconds", "Hourly check"))
        .await
        .unwrap();

    // Down for an hour: sixty occurrences missed.
    h.clock.advance(Duration::from_secs(3600));
    assert_eq!(h.scheduler.load().await.unwrap(), 1);

    let outcomes = h.scheduler.run_due().await;
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].succeeded());
    assert!(h.scheduler.run_due().await.is_empty());
    assert_eq!(h.provider.call_count(), 1);

    let after = h.scheduler.get_task(&created.id).unwrap();
    assert_eq!(after.next_run_at, h.clock.now() + chrono::Duration::seconds(60));
}

#[tokio::test]
async fn running_task_is_not_selected_again() {
    let h = TestHarness::builder()
        .with_provider_delay(Duration::from_millis(300))
        .build()
        .await
        .unwrap();
    let created = h
        .scheduler
        .create_task(task("alice", "every 60 seconds", "Slow job"))
        .await
        .unwrap();
    h.clock.advance(minute());

    let scheduler = Arc::clone(&h.scheduler);
    let first = tokio::spawn(async move { scheduler.run_due().await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(matches!(
        h.scheduler.run_state(&created.id),
        Some(TaskRunState::Due | TaskRunState::Running)
    ));
    assert!(h.scheduler.run_due().await.is_empty());

    let outcomes = first.await.unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(h.provider.call_count(), 1);
}

#[tokio::test]
async fn scheduled_run_and_chat_for_same_user_never_overlap() {
    let h = TestHarness::builder()
        .with_provider_delay(Duration::from_millis(200))
        .build()
        .await
        .unwrap();
    h.scheduler
        .create_task(task("alice", "every 60 seconds", "Briefing"))
        .await
        .unwrap();
    h.clock.advance(minute());

    let (outcomes, reply) = tokio::join!(h.scheduler.run_due(), h.send_message("alice", "hello"));
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].succeeded());
    assert_eq!(reply, "mock response");
    assert_eq!(h.provider.max_concurrency(), 1);
    assert_eq!(h.memory.count("alice").await.unwrap(), 3);
}

#[tokio::test]
async fn different_users_run_concurrently() {
    let h = TestHarness::builder()
        .with_provider_delay(Duration::from_millis(200))
        .build()
        .await
        .unwrap();
    h.scheduler
        .create_task(task("alice", "every 60 seconds", "Briefing"))
        .await
        .unwrap();
    h.clock.advance(minute());

    let (outcomes, _) = tokio::join!(h.scheduler.run_due(), h.send_message("bob", "hello"));
    assert!(outcomes[0].succeeded());
    assert_eq!(h.provider.max_concurrency(), 2);
}

#[tokio::test]
async fn relevant_memory_is_part_of_the_briefing() {
    let h = TestHarness::new().await.unwrap();
    h.memory
        .write("alice", "My favorite color is blue", MemorySource::Manual, None)
        .await
        .unwrap();
    h.scheduler
        .create_task(task("alice", "every 60 seconds", "Suggest an outfit in my favorite color"))
        .await
        .unwrap();
    h.clock.advance(minute());

    let outcomes = h.scheduler.run_due().await;
    assert!(outcomes[0].succeeded());
    let request = h.provider.requests().pop().unwrap();
    assert!(request.prompt.contains("favorite color is blue"));
    assert!(request.system_prompt.is_some());
}

#[tokio::test]
async fn memory_can_be_left_out_of_briefings() {
    let h = TestHarness::builder()
        .configure(|c| c.scheduler.include_memory = false)
        .build()
        .await
        .unwrap();
    h.memory
        .write("alice", "My favorite color is blue", MemorySource::Manual, None)
        .await
        .unwrap();
    h.scheduler
        .create_task(task("alice", "every 60 seconds", "Suggest an outfit in my favorite color"))
        .await
        .unwrap();
    h.clock.advance(minute());

    h.scheduler.run_due().await;
    assert!(!h.provider.last_prompt().unwrap().contains("blue"));
}

#[tokio::test]
async fn deliveries_reach_the_configured_sink() {
    let h = TestHarness::new().await.unwrap();
    let sink = Arc::new(MockSink::new());
    let scheduler = TaskScheduler::new(
        h.db.clone(),
        Arc::clone(&h.dispatcher),
        h.context.clone(),
        sink.clone(),
        SystemPrompt::from_config(&h.config.agent),
        SchedulerSettings::from_config(&h.config.scheduler, &h.config.memory),
    )
    .with_clock(h.clock.clock());

    scheduler
        .create_task(task("carol", "every 5 minutes", "Stretch reminder"))
        .await
        .unwrap();
    h.clock.advance(Duration::from_secs(300));
    let outcomes = scheduler.run_due().await;
    assert!(outcomes[0].delivered);

    let delivered = sink.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].0, target());
    assert_eq!(delivered[0].1, format!("{DELIVERY_HEADER}\n\nmock response"));

    sink.set_failing(true);
    h.clock.advance(Duration::from_secs(300));
    let outcomes = scheduler.run_due().await;
    assert!(outcomes[0].succeeded());
    assert!(!outcomes[0].delivered);
    assert_eq!(sink.delivered_count(), 1);
}

#[tokio::test]
async fn edit_during_a_run_keeps_its_schedule() {
    let h = TestHarness::builder()
        .with_provider_delay(Duration::from_millis(300))
        .build()
        .await
        .unwrap();
    let created = h
        .scheduler
        .create_task(task("alice", "every 60 seconds", "Slow job"))
        .await
        .unwrap();
    h.clock.advance(minute());

    let scheduler = Arc::clone(&h.scheduler);
    let run = tokio::spawn(async move { scheduler.run_due().await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    h.clock.advance(Duration::from_secs(30));
    let edited = h
        .scheduler
        .update_task(
            &created.id,
            "alice",
            TaskUpdate {
                schedule: Some("every 1 day".into()),
                ..TaskUpdate::default()
            },
        )
        .await
        .unwrap();

    let outcomes = run.await.unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].succeeded());

    let after = h.scheduler.get_task(&created.id).unwrap();
    assert_eq!(after.schedule.as_str(), "every 1 day");
    assert_eq!(after.next_run_at, edited.next_run_at);
    assert!(after.last_run_at.is_some());
    assert!(after.enabled);

    h.scheduler.load().await.unwrap();
    let reloaded = h.scheduler.get_task(&created.id).unwrap();
    assert_eq!(reloaded.schedule.as_str(), "every 1 day");
    assert_eq!(
        reloaded.next_run_at.timestamp_millis(),
        edited.next_run_at.timestamp_millis()
    );
    assert!(reloaded.last_run_at.is_some());
}

#[tokio::test]
async fn one_shot_task_fires_once_then_disables() {
    let h = TestHarness::new().await.unwrap();
    let at = (h.clock.now() + chrono::Duration::seconds(60)).to_rfc3339();
    let created = h
        .scheduler
        .create_task(task("alice", &format!("at {at}"), "Dentist at 3"))
        .await
        .unwrap();
    assert!(created.schedule.is_one_shot());

    h.clock.advance(minute());
    let outcomes = h.scheduler.run_due().await;
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].succeeded());

    let after = h.scheduler.get_task(&created.id).unwrap();
    assert!(!after.enabled);
    assert!(after.last_run_at.is_some());

    h.clock.advance(Duration::from_secs(3600));
    assert!(h.scheduler.run_due().await.is_empty());
    assert_eq!(h.provider.call_count(), 1);

    h.scheduler.load().await.unwrap();
    assert!(!h.scheduler.get_task(&created.id).unwrap().enabled);
}

#[tokio::test]
async fn one_shot_in_the_past_is_rejected() {
    let h = TestHarness::new().await.unwrap();
    let err = h
        .scheduler
        .create_task(task("alice", "at 2000-01-01T00:00:00Z", "Too late"))
        .await
        .unwrap_err();
    assert!(matches!(err, YouclawError::InvalidInput(_)));
}
