use super::common::*;
use contact_assist::input::Key;
use contact_assist::palette::{CommandPalette, PaletteCategory, PaletteOutcome};
use contact_assist::search::{Candidate, SearchCoordinator};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn contacts() -> Vec<Candidate> {
    vec![
        Candidate::new("c1", "John Smith").with_secondary("john@example.com"),
        Candidate::new("c2", "Sarah Connor"),
    ]
}

#[tokio::test(start_paused = true)]
async fn test_typing_searches_once_after_pause() {
    let provider = Arc::new(RecordingProvider::with_results(contacts()));
    let (search, mut rx) = SearchCoordinator::new(provider.clone(), Duration::from_millis(300), 5);
    let mut palette = CommandPalette::new(search);

    palette.open();
    for c in "work".chars() {
        palette.handle_key(Key::Char(c));
    }
    // Static matches are immediate; contacts wait for the debounce
    let titles: Vec<_> = palette.items().iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["View Work Contacts"]);

    let update = rx.recv().await.unwrap();
    assert!(palette.apply_search_update(update));

    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(provider.queries(), vec!["work".to_string()]);

    let categories: Vec<_> = palette.items().iter().map(|i| i.category).collect();
    assert_eq!(
        categories,
        vec![
            PaletteCategory::Contacts,
            PaletteCategory::Contacts,
            PaletteCategory::Tags
        ]
    );
    assert_eq!(palette.items()[1].subtitle.as_deref(), Some("Contact"));
}

#[tokio::test]
async fn test_execute_contact_route() {
    let provider = Arc::new(RecordingProvider::with_results(contacts()));
    let (search, mut rx) = SearchCoordinator::new(provider, Duration::ZERO, 5);
    let mut palette = CommandPalette::new(search);

    palette.open();
    let update = rx.recv().await.unwrap();
    assert!(palette.apply_search_update(update));

    palette.handle_key(Key::Down);
    let PaletteOutcome::Execute(item) = palette.handle_key(Key::Enter) else {
        panic!("expected execution");
    };
    assert_eq!(item.route, "/contacts/c2");
    assert_eq!(item.initials.as_deref(), Some("SC"));
    assert!(!palette.is_visible());

    // Contacts that land after closing are not shown
    palette.open();
    palette.close();
    let stale = contact_assist::search::SearchUpdate {
        generation: 1,
        query: String::new(),
        outcome: Ok(contacts()),
    };
    assert!(!palette.apply_search_update(stale));
    assert!(palette.items().is_empty());
}

#[tokio::test]
async fn test_results_clamp_highlight() {
    let provider = Arc::new(RecordingProvider::with_results(Vec::new()));
    let (search, mut rx) = SearchCoordinator::new(provider, Duration::ZERO, 5);
    let mut palette = CommandPalette::new(search);

    palette.open();
    for _ in 0..20 {
        palette.handle_key(Key::Down);
    }
    assert_eq!(palette.selected_index(), 8);

    let update = rx.recv().await.unwrap();
    assert!(palette.apply_search_update(update));
    assert_eq!(palette.items().len(), 9);
    assert_eq!(palette.selected_index(), 8);
}
