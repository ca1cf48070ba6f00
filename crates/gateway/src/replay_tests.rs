// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{Duration, Utc};

use super::*;

#[tokio::test]
async fn first_use_is_accepted_second_is_rejected() {
    let set = ReplaySet::new();
    let purge_at = Utc::now() + Duration::seconds(60);

    assert!(set.check_and_insert("tok-1", purge_at).await);
    assert!(!set.check_and_insert("tok-1", purge_at).await);
    assert_eq!(set.len().await, 1);
}

#[tokio::test]
async fn distinct_tokens_do_not_collide() {
    let set = ReplaySet::new();
    let purge_at = Utc::now() + Duration::seconds(60);

    assert!(set.check_and_insert("tok-1", purge_at).await);
    assert!(set.check_and_insert("tok-2", purge_at).await);
    assert_eq!(set.len().await, 2);
}

#[tokio::test]
async fn contains_is_non_consuming() {
    let set = ReplaySet::new();
    let purge_at = Utc::now() + Duration::seconds(60);

    assert!(!set.contains("tok-1").await);
    set.check_and_insert("tok-1", purge_at).await;
    assert!(set.contains("tok-1").await);
    // A probe never inserts.
    assert!(!set.contains("tok-2").await);
    assert_eq!(set.len().await, 1);
}

#[tokio::test]
async fn sweep_removes_only_expired_entries() {
    let set = ReplaySet::new();
    set.check_and_insert("stale", Utc::now() - Duration::seconds(1)).await;
    set.check_and_insert("fresh", Utc::now() + Duration::seconds(60)).await;

    let removed = set.sweep().await;
    assert_eq!(removed, 1);
    assert_eq!(set.len().await, 1);
    assert!(!set.contains("stale").await);
    assert!(set.contains("fresh").await);
}

#[tokio::test]
async fn swept_token_is_still_rejected_by_expiry_not_replay() {
    // After the sweep the exact value could be re-inserted; that is fine
    // because an expired token already fails signature-stage expiry.
    let set = ReplaySet::new();
    set.check_and_insert("tok", Utc::now() - Duration::seconds(1)).await;
    set.sweep().await;
    assert!(set.check_and_insert("tok", Utc::now() + Duration::seconds(60)).await);
}
