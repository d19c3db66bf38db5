mod common;

use annuaire_browser::RetryPolicy;
use annuaire_core::SearchScope;
use annuaire_harvest::{CandidateSource, HarvestError, SearchPager, SiteSelectors};
use common::{FakePage, FakeSite};
use std::time::Duration;

const HOME: &str = "https://annuaire.sante.fr/";
const PAGE_1: &str = "https://annuaire.sante.fr/resultats?page=1";
const PAGE_2: &str = "https://annuaire.sante.fr/resultats?page=2";
const PAGE_3: &str = "https://annuaire.sante.fr/resultats?page=3";

/// The home page and every result page carry the search form; clicking
/// the search button on the home page lands on the first result page.
fn search_form(s: &SiteSelectors) -> FakePage {
    FakePage::default()
        .present(s.keyword_input.clone())
        .present(s.location_input.clone())
        .present(s.search_submit.clone())
}

fn site() -> FakeSite {
    let s = SiteSelectors::default();
    let site = FakeSite::new();
    site.page(HOME, search_form(&s).on_click(s.search_submit.clone(), PAGE_1));
    site.page(
        PAGE_1,
        search_form(&s)
            .links(&["https://annuaire.sante.fr/p/1", "https://annuaire.sante.fr/p/2"])
            .on_click(s.next_page.clone(), PAGE_2),
    );
    site.page(
        PAGE_2,
        search_form(&s)
            .links(&["https://annuaire.sante.fr/p/3"])
            .on_click(s.next_page.clone(), PAGE_3),
    );
    site.page(PAGE_3, search_form(&s).links(&["https://annuaire.sante.fr/p/4"]));
    site
}

fn pager(site: &FakeSite, max_pages: u32) -> SearchPager {
    SearchPager::new(
        site.tab(),
        SearchScope::new("Médecin", "bordeaux").unwrap(),
        HOME,
        RetryPolicy::new(2, Duration::ZERO),
        Duration::from_secs(1),
        max_pages,
    )
}

#[tokio::test]
async fn test_submits_search_and_follows_next_links() {
    let site = site();
    let mut pager = pager(&site, 0);

    let mut batches = Vec::new();
    while let Some(batch) = pager.next_batch().await.unwrap() {
        batches.push(batch);
    }

    assert_eq!(batches.len(), 3);
    assert_eq!(batches[0].len(), 2);
    assert_eq!(batches[2], vec!["https://annuaire.sante.fr/p/4".to_string()]);
    assert_eq!(pager.pages_visited(), 3);
    assert!(pager.next_batch().await.unwrap().is_none());

    let filled = site.filled.lock().unwrap();
    let values: Vec<_> = filled.iter().map(|(_, v)| v.as_str()).collect();
    assert_eq!(values, ["Médecin", "bordeaux"]);
}

#[tokio::test]
async fn test_page_cap_stops_enumeration() {
    let site = site();
    let mut pager = pager(&site, 2);

    let mut count = 0;
    while pager.next_batch().await.unwrap().is_some() {
        count += 1;
    }
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_empty_result_page_ends_enumeration() {
    let s = SiteSelectors::default();
    let site = FakeSite::new();
    site.page(HOME, search_form(&s).on_click(s.search_submit.clone(), PAGE_1));
    site.page(PAGE_1, search_form(&s).on_click(s.next_page.clone(), PAGE_2));

    let mut pager = pager(&site, 0);
    assert!(pager.next_batch().await.unwrap().is_none());
}

#[tokio::test]
async fn test_missing_search_form_is_fatal() {
    let site = FakeSite::new();
    site.page(HOME, FakePage::default());

    let mut pager = pager(&site, 0);
    let err = pager.next_batch().await.unwrap_err();
    assert!(matches!(err, HarvestError::SearchFailed(_)));
}
