mod support;

use std::collections::HashSet;

use reelfeed_core::model::MediaKind;
use reelfeed_core::{
    FeedAccumulator, FeedConfig, FeedOrder, FeedPager, PageOutcome, StopReason,
};
use support::FakeCatalog;

fn config() -> FeedConfig {
    FeedConfig {
        order: FeedOrder::Preserve,
        ..FeedConfig::default()
    }
}

#[tokio::test]
async fn empty_pages_end_accumulation() {
    let catalog = FakeCatalog::new().empty_after(3).build();
    let accumulator = FeedAccumulator::new(catalog.clone(), MediaKind::Movie, config());

    let feed = accumulator.accumulate(100, Vec::new()).await;

    assert_eq!(feed.len(), 60);
    assert_eq!(feed.stop, StopReason::Exhausted);
    assert_eq!(catalog.page_calls(), 4);
    assert!(feed.items.iter().all(|i| i.id.tmdb_id < 60));
}

#[tokio::test]
async fn target_is_met_exactly_without_duplicates() {
    let catalog = FakeCatalog::new().build();
    let accumulator = FeedAccumulator::new(
        catalog.clone(),
        MediaKind::Tv,
        FeedConfig::default(),
    );

    let feed = accumulator.accumulate(45, Vec::new()).await;

    assert_eq!(feed.len(), 45);
    let distinct: HashSet<_> = feed.items.iter().map(|i| i.id).collect();
    assert_eq!(distinct.len(), 45);
    assert!(feed.items.iter().all(|i| i.id.kind == MediaKind::Tv));
    assert_eq!(catalog.page_calls(), 3);
}

#[tokio::test]
async fn page_ceiling_caps_requests() {
    let catalog = FakeCatalog::new().per_page(1).build();
    let accumulator = FeedAccumulator::new(catalog.clone(), MediaKind::Movie, config());

    let feed = accumulator.accumulate(40, Vec::new()).await;

    assert_eq!(feed.stop, StopReason::PageCeiling);
    assert_eq!(feed.pages_fetched, 20);
    assert_eq!(feed.len(), 20);
    assert!(feed.has_more());
}

#[tokio::test]
async fn failed_page_returns_partial_feed() {
    let catalog = FakeCatalog::new().failing_page(2).build();
    let accumulator = FeedAccumulator::new(catalog.clone(), MediaKind::Movie, config());

    let feed = accumulator.accumulate(40, Vec::new()).await;

    assert_eq!(feed.stop, StopReason::Failed);
    assert_eq!(feed.len(), 20);
}

#[tokio::test]
async fn seeded_run_continues_after_seed_pages() {
    let catalog = FakeCatalog::new().build();
    let accumulator = FeedAccumulator::new(catalog.clone(), MediaKind::Movie, config());

    let first = accumulator.accumulate(20, Vec::new()).await;
    let second = accumulator.accumulate(40, first.items.clone()).await;

    assert_eq!(second.len(), 40);
    assert_eq!(second.pages_fetched, 1);
    assert_eq!(second.items[..20], first.items[..]);
    assert_eq!(catalog.page_calls(), 2);
}

#[tokio::test]
async fn overlapping_page_requests_issue_one_fetch() {
    let catalog = FakeCatalog::new().gated().build();
    let pager = FeedPager::new(catalog.clone(), MediaKind::Movie);

    let first = pager.next_page();
    let second = async {
        catalog.wait_for_page_calls(1).await;
        assert!(pager.is_fetching());
        let outcome = pager.next_page().await;
        catalog.release(1);
        outcome
    };
    let (first, second) = tokio::join!(first, second);

    assert_eq!(first, PageOutcome::Appended { page: 1, added: 20 });
    assert_eq!(second, PageOutcome::Busy);
    assert_eq!(catalog.page_calls(), 1);
    assert!(!pager.is_fetching());
}

#[tokio::test]
async fn pager_stops_after_exhaustion() {
    let catalog = FakeCatalog::new().total_pages(2).build();
    let pager = FeedPager::new(catalog.clone(), MediaKind::Movie);

    let mut appended = 0;
    loop {
        match pager.next_page().await {
            PageOutcome::Appended { .. } => appended += 1,
            PageOutcome::Exhausted => break,
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    assert_eq!(appended, 2);
    assert_eq!(pager.snapshot().items.len(), 40);
    assert_eq!(pager.next_page().await, PageOutcome::Exhausted);
    assert_eq!(catalog.page_calls(), 2);
}
