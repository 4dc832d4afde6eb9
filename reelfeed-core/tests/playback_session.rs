mod support;

use reelfeed_core::model::{ItemId, MediaKind};
use reelfeed_core::{CoreConfig, ElementId, FeedSession, PlaybackState};
use support::FakeCatalog;

fn session(catalog: std::sync::Arc<FakeCatalog>) -> FeedSession {
    FeedSession::new(catalog, MediaKind::Movie, &CoreConfig::default())
        .expect("session")
}

#[tokio::test]
async fn focus_loss_during_resolution_forces_idle() {
    let id = ItemId::movie(550);
    let catalog = FakeCatalog::new().with_trailer(id, "SUXWAEX2jlg").gated().build();
    let session = session(catalog.clone());
    let card = session.mount_card(ElementId(1), id);
    session.report_intersection(ElementId(1), 0.8, true);

    let controller = card.controller().clone();
    let attempt = tokio::spawn(async move { controller.request_playback().await });
    catalog.wait_for_detail_calls(1).await;
    assert_eq!(session.playback_state(id), Some(PlaybackState::ResolvingTrailer));
    let token = card.controller().session_token().expect("token while resolving");

    session.report_intersection(ElementId(1), 0.2, true);
    assert!(token.is_cancelled());
    assert_eq!(session.playback_state(id), Some(PlaybackState::Idle));

    catalog.release(1);
    assert_eq!(attempt.await.expect("attempt"), PlaybackState::Idle);

    // The fetch still landed in the cache; refocusing plays without a request.
    session.report_intersection(ElementId(1), 0.9, true);
    let state = session.request_playback(id).await.expect("mounted");
    assert_eq!(state.trailer().map(|t| t.key()), Some("SUXWAEX2jlg"));
    assert_eq!(catalog.detail_calls(), 1);
}

#[tokio::test]
async fn cards_for_the_same_item_share_one_lookup() {
    let id = ItemId::movie(13);
    let catalog = FakeCatalog::new().with_trailer(id, "bLvqoHBptjg").build();
    let session = session(catalog.clone());

    let first = session.mount_card(ElementId(1), id);
    session.report_intersection(ElementId(1), 1.0, true);
    assert!(session.request_playback(id).await.is_some_and(|s| s.trailer().is_some()));
    drop(first);

    let _second = session.mount_card(ElementId(2), id);
    session.report_intersection(ElementId(2), 1.0, true);
    assert!(session.toggle_playback(id).await.is_some_and(|s| s.trailer().is_some()));
    assert_eq!(catalog.detail_calls(), 1);
}

#[tokio::test]
async fn only_one_token_lives_per_card() {
    let id = ItemId::movie(680);
    let catalog = FakeCatalog::new().with_trailer(id, "s7EdQ4FqbhY").build();
    let session = session(catalog.clone());
    let card = session.mount_card(ElementId(3), id);
    session.report_intersection(ElementId(3), 0.6, true);

    session.toggle_playback(id).await;
    let first = card.controller().session_token().expect("first token");
    session.toggle_playback(id).await;
    assert!(first.is_cancelled());
    assert!(!card.controller().has_live_token());

    session.toggle_playback(id).await;
    let second = card.controller().session_token().expect("second token");
    assert!(!second.is_cancelled());

    drop(card);
    assert!(second.is_cancelled());
    assert_eq!(session.mounted_cards(), 0);
}

#[tokio::test]
async fn scrolling_a_feed_of_cards_leaks_no_observers() {
    let catalog = FakeCatalog::new().build();
    let session = session(catalog.clone());

    let feed = session.get_feed(40, Vec::new()).await;
    assert_eq!(feed.len(), 40);

    for round in 0..5 {
        let cards: Vec<_> = feed
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| session.mount_card(ElementId(round * 100 + i as u64), item.id))
            .collect();
        assert_eq!(session.tracker().observer_count(), 40);
        drop(cards);
    }

    assert_eq!(session.tracker().observer_count(), 0);
    assert_eq!(session.mounted_cards(), 0);
}

#[tokio::test]
async fn next_page_grows_the_session_feed() {
    let catalog = FakeCatalog::new().build();
    let session = session(catalog.clone());

    let (_, snapshot) = session.get_next_page().await;
    assert_eq!(snapshot.items.len(), 20);
    let (_, snapshot) = session.get_next_page().await;
    assert_eq!(snapshot.items.len(), 40);
    assert!(snapshot.has_more);
    assert_eq!(snapshot.next_page, 3);

    session.reset_feed();
    assert!(session.feed_snapshot().items.is_empty());
}

#[tokio::test]
async fn recycling_an_element_for_another_card_stops_the_old_one() {
    let old_item = ItemId::movie(603);
    let new_item = ItemId::movie(604);
    let catalog = FakeCatalog::new()
        .with_trailer(old_item, "vKQi3bBA1y8")
        .build();
    let session = session(catalog.clone());

    let old_card = session.mount_card(ElementId(7), old_item);
    session.report_intersection(ElementId(7), 0.9, true);
    let state = session.request_playback(old_item).await.expect("mounted");
    assert!(state.trailer().is_some());
    let token = old_card
        .controller()
        .session_token()
        .expect("playing token");

    let _new_card = session.mount_card(ElementId(7), new_item);
    assert!(token.is_cancelled());
    assert_eq!(session.playback_state(old_item), Some(PlaybackState::Idle));
    assert_eq!(session.playback_state(new_item), Some(PlaybackState::Idle));
    assert!(!session.tracker().is_focused(ElementId(7)));
}
