// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use youclaw_context::{render_chat_prompt, render_memory_block};
use youclaw_core::MemorySource;
use youclaw_test_utils::TestHarness;

async fn note(h: &TestHarness, user: &str, text: &str) {
    h.memory
        .write(user, text, MemorySource::Manual, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn empty_store_yields_empty_context_without_embedding() {
    let h = TestHarness::new().await.unwrap();
    let ctx = h.context.build("alice", "anything at all", "mock", 4000).await.unwrap();
    assert!(ctx.is_empty());
    assert_eq!(ctx.used_chars, 0);
    assert_eq!(h.embedder.call_count(), 0);
    assert_eq!(render_chat_prompt(&ctx, "hi"), "hi");
}

#[tokio::test]
async fn greedy_fill_stops_at_first_entry_that_does_not_fit() {
    let h = TestHarness::new().await.unwrap();
    note(&h, "alice", "coffee").await;
    note(&h, "alice", "coffee beans").await;
    note(&h, "alice", "coffee beans roast").await;

    let all = h.context.build("alice", "coffee beans roast", "mock", 4000).await.unwrap();
    let texts: Vec<&str> = all.entries.iter().map(|e| e.entry.text.as_str()).collect();
    assert_eq!(texts, vec!["coffee beans roast", "coffee beans", "coffee"]);

    // 18 fits, 18 + 12 does not; the 6-char entry after it is not tried.
    let tight = h.context.build("alice", "coffee beans roast", "mock", 25).await.unwrap();
    let texts: Vec<&str> = tight.entries.iter().map(|e| e.entry.text.as_str()).collect();
    assert_eq!(texts, vec!["coffee beans roast"]);
    assert_eq!(tight.used_chars, 18);
    assert!(tight.used_chars <= tight.budget);
}

#[tokio::test]
async fn entries_are_never_truncated_to_fit() {
    let h = TestHarness::new().await.unwrap();
    let long = "quarterly report numbers ".repeat(10);
    note(&h, "alice", &long).await;

    let ctx = h.context.build("alice", "quarterly report numbers", "mock", 100).await.unwrap();
    assert!(ctx.is_empty(), "a single oversized entry is skipped, not cut");

    let ctx = h.context.build("alice", "quarterly report numbers", "mock", 1000).await.unwrap();
    assert_eq!(ctx.len(), 1);
    assert_eq!(ctx.entries[0].entry.text, long);
}

#[tokio::test]
async fn same_state_builds_the_same_context() {
    let h = TestHarness::new().await.unwrap();
    for text in [
        "Dentist appointment on Friday",
        "Dentist is Dr. Smith",
        "Friday is trash day",
        "Bring the dentist form",
    ] {
        note(&h, "alice", text).await;
    }

    let a = h.context.build("alice", "dentist friday", "mock", 60).await.unwrap();
    let b = h.context.build("alice", "dentist friday", "mock", 60).await.unwrap();
    let ids = |c: &youclaw_context::ConversationContext| {
        c.entries
            .iter()
            .map(|e| (e.entry.id.clone(), e.score.to_bits()))
            .collect::<Vec<_>>()
    };
    assert_eq!(ids(&a), ids(&b));
    assert!(a.used_chars <= 60);
}

#[tokio::test]
async fn context_only_contains_the_requesting_users_memories() {
    let h = TestHarness::new().await.unwrap();
    note(&h, "alice", "My password hint is sunflower").await;
    note(&h, "bob", "My password hint is sunflower").await;

    let ctx = h.context.build("bob", "password hint", "mock", 4000).await.unwrap();
    assert_eq!(ctx.len(), 1);
    assert!(ctx.entries.iter().all(|e| e.entry.user_id == "bob"));
}

#[tokio::test]
async fn zero_budget_skips_recall() {
    let h = TestHarness::new().await.unwrap();
    note(&h, "alice", "favorite color is blue").await;
    let calls = h.embedder.call_count();

    let ctx = h.context.build("alice", "favorite color", "mock", 0).await.unwrap();
    assert!(ctx.is_empty());
    assert_eq!(h.embedder.call_count(), calls);
}

#[tokio::test]
async fn rendered_prompt_carries_recalled_memory() {
    let h = TestHarness::new().await.unwrap();
    note(&h, "alice", "My favorite color is blue").await;

    let ctx = h.context.build("alice", "What's my favorite color?", "mock", 4000).await.unwrap();
    let block = render_memory_block(&ctx);
    assert!(block.contains("NOTE: My favorite color is blue"));

    let prompt = render_chat_prompt(&ctx, "What's my favorite color?");
    assert!(prompt.starts_with(&block));
    assert!(prompt.ends_with("What's my favorite color?"));
}
