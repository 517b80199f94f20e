use super::common::*;
use anyhow::Result;
use async_trait::async_trait;
use contact_assist::assistant::{AssistantBox, KeyOutcome};
use contact_assist::dispatch::{send_command, EchoDispatcher};
use contact_assist::input::Key;
use contact_assist::mention::SelectionPhase;
use contact_assist::overlay::AnchoredOverlay;
use contact_assist::search::{
    Candidate, EntitySearchProvider, InMemoryDirectory, SearchCoordinator,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_tell_john_he_is_late() {
    let provider = Arc::new(RecordingProvider::with_results(vec![Candidate::new(
        "c1",
        "John Smith",
    )]));
    let (mut assistant, mut rx) = assistant_with(provider.clone());

    type_str(&mut assistant, "Tell ");
    assert!(assistant.token().is_none());

    type_str(&mut assistant, "@");
    let token = assistant.token().expect("token opens on the marker");
    assert_eq!(token.raw_query, "");

    type_str(&mut assistant, "Jo");
    assert_eq!(assistant.token().unwrap().raw_query, "Jo");
    settle(&mut assistant, &mut rx).await;
    assert!(provider.queries().contains(&"Jo".to_string()));
    assert_eq!(assistant.selection().candidates().len(), 1);

    // Only one candidate: the highlight stays put
    assistant.handle_key(Key::Down);
    assistant.handle_key(Key::Down);
    assert_eq!(assistant.selection().highlighted_index(), 0);

    assert_eq!(assistant.handle_key(Key::Enter), KeyOutcome::Handled);
    assert_eq!(assistant.buffer(), "Tell @John Smith ");
    assert_eq!(assistant.resolver().mentions().len(), 1);
    assert_eq!(assistant.resolver().mentions()[0].literal_text, "@John Smith");
    assert_eq!(assistant.resolver().mentions()[0].entity_id, "c1");

    type_str(&mut assistant, "he's late");
    let KeyOutcome::Submit(submission) = assistant.handle_key(Key::Enter) else {
        panic!("Enter with no open token should submit");
    };
    assert_eq!(submission.command.text(), "Tell @John Smith he's late");
    assert_eq!(
        submission.command.referenced_entity_ids(),
        &["c1".to_string()]
    );
}

/// Slow for short queries, fast for long ones
struct SkewedProvider {
    inner: InMemoryDirectory,
}

#[async_trait]
impl EntitySearchProvider for SkewedProvider {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Candidate>> {
        let delay = if query.len() < 4 { 500 } else { 10 };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.inner.search(query, limit).await
    }
}

#[tokio::test(start_paused = true)]
async fn test_late_answer_for_an_does_not_clobber_anna() {
    let provider = Arc::new(SkewedProvider {
        inner: InMemoryDirectory::sample(),
    });
    let (search, mut rx) = SearchCoordinator::new(provider, Duration::from_millis(50), 10);
    let mut assistant = AssistantBox::new('@', search, AnchoredOverlay::default());

    type_str(&mut assistant, "@an");
    // Past the debounce: the "an" search is now in flight
    tokio::time::sleep(Duration::from_millis(100)).await;
    type_str(&mut assistant, "na");

    let first = rx.recv().await.unwrap();
    assert_eq!(first.query, "anna");
    assert!(assistant.apply_search_update(first));

    let late = rx.recv().await.unwrap();
    assert_eq!(late.query, "an");
    assert!(!assistant.apply_search_update(late));

    let labels: Vec<_> = assistant
        .selection()
        .candidates()
        .iter()
        .map(|c| c.label.as_str())
        .collect();
    assert_eq!(labels, vec!["Anna Lee", "Johanna Berg"]);
}

#[tokio::test(start_paused = true)]
async fn test_fast_typing_issues_one_search() {
    let provider = Arc::new(RecordingProvider::with_results(vec![Candidate::new(
        "c4",
        "Anna Lee",
    )]));
    let (search, mut rx) = SearchCoordinator::new(provider.clone(), Duration::from_millis(200), 10);
    let mut assistant = AssistantBox::new('@', search, AnchoredOverlay::default());

    type_str(&mut assistant, "ping @anna");
    settle(&mut assistant, &mut rx).await;

    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(provider.queries(), vec!["anna".to_string()]);
    assert_eq!(assistant.selection().phase(), SelectionPhase::Ready);
}

#[tokio::test]
async fn test_deleting_literal_drops_entity() {
    let (mut assistant, mut rx) = demo_assistant();

    type_str(&mut assistant, "ping @ann");
    settle(&mut assistant, &mut rx).await;
    // Anna Lee, Ann Lee, Johanna Berg
    assistant.handle_key(Key::Down);
    assert_eq!(assistant.selection().highlighted().unwrap().id, "c5");
    assistant.handle_key(Key::Enter);
    type_str(&mut assistant, "tomorrow");
    assert_eq!(assistant.buffer(), "ping @Ann Lee tomorrow");

    let buffer = assistant.buffer().to_string();
    let ids = assistant.resolver().active_entity_ids(&buffer);
    assert_eq!(ids, vec!["c5".to_string()]);
    // No-op edit
    assistant.sync(&buffer, 3);
    assert_eq!(assistant.resolver().active_entity_ids(assistant.buffer()), ids);

    assistant.sync("ping @ tomorrow", 6);
    assert!(assistant
        .resolver()
        .active_entity_ids(assistant.buffer())
        .is_empty());
}

#[tokio::test]
async fn test_confirm_adds_literal_once_at_marker() {
    let (mut assistant, mut rx) = demo_assistant();

    type_str(&mut assistant, "@John Smith and @jo");
    settle(&mut assistant, &mut rx).await;
    let before = assistant.buffer().matches("@John Smith").count();

    assert!(assistant.confirm_highlighted());
    let after = assistant.buffer().matches("@John Smith").count();
    assert_eq!(after, before + 1);
    assert_eq!(assistant.buffer(), "@John Smith and @John Smith ");
    assert_eq!(assistant.caret(), assistant.buffer().len());
    assert_eq!(assistant.selection().phase(), SelectionPhase::Closed);
}

#[tokio::test]
async fn test_highlight_stays_in_bounds() {
    let (mut assistant, mut rx) = demo_assistant();

    type_str(&mut assistant, "@lee");
    settle(&mut assistant, &mut rx).await;
    let len = assistant.selection().candidates().len();
    assert_eq!(len, 2);

    let keys = [
        Key::Up,
        Key::Up,
        Key::Down,
        Key::Down,
        Key::Down,
        Key::Up,
        Key::Down,
        Key::Down,
    ];
    for key in keys {
        assistant.handle_key(key);
        assert!(assistant.selection().highlighted_index() < len);
    }
    assert_eq!(assistant.selection().highlighted_index(), 1);
}

struct Unreachable;

#[async_trait]
impl EntitySearchProvider for Unreachable {
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<Candidate>> {
        anyhow::bail!("connection refused")
    }
}

#[tokio::test]
async fn test_search_failure_is_no_results() {
    let (mut assistant, mut rx) = assistant_with(Arc::new(Unreachable));

    type_str(&mut assistant, "hi @bob");
    settle(&mut assistant, &mut rx).await;
    assert!(assistant.selection().is_empty_result());

    // Still usable: Enter does nothing, Escape closes, text is intact
    assert_eq!(assistant.handle_key(Key::Enter), KeyOutcome::Handled);
    assistant.handle_key(Key::Escape);
    assert!(!assistant.selection().is_open());
    assert_eq!(assistant.buffer(), "hi @bob");

    let submission = assistant.submit().unwrap();
    assert!(submission.command.referenced_entity_ids().is_empty());
}

#[tokio::test]
async fn test_demo_conversation_carries_id() {
    let (mut assistant, mut rx) = demo_assistant();

    type_str(&mut assistant, "Log lunch with @sarah");
    settle(&mut assistant, &mut rx).await;
    assistant.handle_key(Key::Enter);
    let first = assistant.submit().unwrap();
    assert_eq!(first.request.mentioned_contact_ids, vec!["c2".to_string()]);
    assert!(first.request.conversation_id.is_none());

    assistant.finish_dispatch(send_command(&EchoDispatcher, &first.request).await);
    let conversation = assistant.conversation_id().map(str::to_string);
    assert!(conversation.is_some());

    type_str(&mut assistant, "and set a reminder");
    let second = assistant.submit().unwrap();
    assert_eq!(second.request.conversation_id, conversation);
    assistant.finish_dispatch(send_command(&EchoDispatcher, &second.request).await);

    let log = assistant.log();
    assert_eq!(log.len(), 4);
    assert_eq!(log.entries()[0].mention_literals(), vec!["@Sarah Connor"]);
    assert!(log.entries()[1].content.contains("c2"));
}
