//! Integration tests for feed aggregation and its dual viewing mode.

mod common;

use agora_backend::notifications::FEED_PAGE_SIZE;
use agora_backend::{ForumError, NotificationType};
use common::{backend, TestBackend};

/// Seeds `count` single-notification groups by having one voter upvote
/// that many distinct topics. Returns the owner's id and the topics' ids,
/// oldest first.
async fn seed_groups(fixture: &TestBackend, count: usize) -> (i64, Vec<i64>) {
    let owner = fixture.user("owner");
    let voter = fixture.user("voter");
    let mut topic_ids = Vec::new();
    for index in 0..count {
        let topic = fixture.topic(&owner, &format!("Topic number {}", index));
        fixture
            .backend
            .toggle_topic_vote(voter.id, topic.id, true)
            .await
            .unwrap();
        topic_ids.push(topic.id);
    }
    (owner.id, topic_ids)
}

#[tokio::test]
async fn unread_mode_returns_only_unread_newest_first() {
    let fixture = backend();
    let (owner_id, topic_ids) = seed_groups(&fixture, 3).await;

    let feed = fixture.backend.feed(owner_id, None).unwrap();
    assert_eq!(feed.len(), 3);
    // Newest group first
    assert_eq!(feed[0].topic_id, topic_ids[2]);
    assert_eq!(feed[1].topic_id, topic_ids[1]);
    assert_eq!(feed[2].topic_id, topic_ids[0]);

    fixture.backend.mark_as_read(owner_id, feed[0].id).unwrap();

    let feed = fixture.backend.feed(owner_id, None).unwrap();
    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0].topic_id, topic_ids[1]);
}

#[tokio::test]
async fn paged_mode_returns_fixed_pages_over_the_full_list() {
    let fixture = backend();
    let (owner_id, topic_ids) = seed_groups(&fixture, 7).await;

    // Read items stay in the paged history
    let unread = fixture.backend.feed(owner_id, None).unwrap();
    fixture
        .backend
        .mark_as_read(owner_id, unread[0].id)
        .unwrap();

    let first_page = fixture.backend.feed(owner_id, Some(0)).unwrap();
    assert_eq!(first_page.len(), FEED_PAGE_SIZE);
    assert_eq!(first_page[0].topic_id, topic_ids[6]);
    assert!(first_page[0].is_read);

    let second_page = fixture.backend.feed(owner_id, Some(5)).unwrap();
    assert_eq!(second_page.len(), 2);
    assert_eq!(second_page[1].topic_id, topic_ids[0]);

    let past_the_end = fixture.backend.feed(owner_id, Some(50)).unwrap();
    assert!(past_the_end.is_empty());
}

#[tokio::test]
async fn negative_page_offset_is_invalid() {
    let fixture = backend();
    let owner = fixture.user("owner");

    let result = fixture.backend.feed(owner.id, Some(-1));

    assert!(matches!(result, Err(ForumError::InvalidArgument(_))));
}

#[tokio::test]
async fn co_senders_collapse_into_one_counted_item() {
    let fixture = backend();
    let owner = fixture.user("owner");
    let topic = fixture.topic(&owner, "Popular topic");

    for handle in ["alice", "bob", "carol"] {
        let voter = fixture.user(handle);
        fixture
            .backend
            .toggle_topic_vote(voter.id, topic.id, true)
            .await
            .unwrap();
    }

    let feed = fixture.backend.feed(owner.id, None).unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].others, Some(2));
    // Represented by the latest sender
    assert_eq!(feed[0].sender.handle, "carol");
}

#[tokio::test]
async fn up_and_down_votes_group_separately() {
    let fixture = backend();
    let owner = fixture.user("owner");
    let topic = fixture.topic(&owner, "Divisive topic");

    let up_voter = fixture.user("up-voter");
    let down_voter = fixture.user("down-voter");
    fixture
        .backend
        .toggle_topic_vote(up_voter.id, topic.id, true)
        .await
        .unwrap();
    fixture
        .backend
        .toggle_topic_vote(down_voter.id, topic.id, false)
        .await
        .unwrap();

    let feed = fixture.backend.feed(owner.id, None).unwrap();
    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0].notification_type, NotificationType::DownVote);
    assert_eq!(feed[1].notification_type, NotificationType::UpVote);
    assert_eq!(feed[0].others, Some(0));
    assert_eq!(feed[1].others, Some(0));
}

#[tokio::test]
async fn soft_deleted_topics_drop_out_of_the_feed() {
    let fixture = backend();
    let owner = fixture.user("owner");
    let voter = fixture.user("voter");
    let topic = fixture.topic(&owner, "Doomed topic");

    fixture
        .backend
        .toggle_topic_vote(voter.id, topic.id, true)
        .await
        .unwrap();
    assert_eq!(fixture.backend.feed(owner.id, None).unwrap().len(), 1);

    fixture.backend.delete_topic(owner.id, topic.id).unwrap();

    // The raw log row remains, the feed no longer shows it
    assert!(fixture.backend.feed(owner.id, None).unwrap().is_empty());
    assert!(fixture.backend.feed(owner.id, Some(0)).unwrap().is_empty());
}

#[tokio::test]
async fn orphaned_comment_references_drop_out_of_the_feed() {
    let fixture = backend();
    let owner = fixture.user("owner");
    let commenter = fixture.user("commenter");
    let voter = fixture.user("voter");
    let topic = fixture.topic(&owner, "First topic");
    let comment = fixture.comment(&commenter, &topic, "a comment").await;

    fixture
        .backend
        .toggle_comment_vote(voter.id, comment.id, true)
        .await
        .unwrap();
    assert_eq!(fixture.backend.feed(commenter.id, None).unwrap().len(), 1);

    fixture
        .backend
        .delete_comment(commenter.id, comment.id)
        .unwrap();

    assert!(fixture.backend.feed(commenter.id, None).unwrap().is_empty());
}

#[tokio::test]
async fn comment_scoped_items_render_the_comment_title() {
    let fixture = backend();
    let owner = fixture.user("owner");
    let commenter = fixture.user("commenter");
    let voter = fixture.user("voter");
    let topic = fixture.topic(&owner, "First topic");
    let comment = fixture.comment(&commenter, &topic, "insightful remark").await;

    fixture
        .backend
        .toggle_comment_vote(voter.id, comment.id, true)
        .await
        .unwrap();

    let feed = fixture.backend.feed(commenter.id, None).unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(
        feed[0].notification_type,
        NotificationType::CommentUpVote
    );
    assert_eq!(feed[0].title, "Comment: insightful remark");
    assert_eq!(feed[0].uri, topic.uri);
}
