//! Exponential paging against simulated listing and search endpoints.

use ckanft::ckan_version::CkanVersion;
use ckanft::paging::{ExponentialPager, OVERRUN_MARGIN, PageRequest, PageStatus};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{Value, json};

fn listing(len: usize) -> Vec<Value> {
    (0..len).map(|idx| json!(format!("dataset-{idx:04}"))).collect()
}

/// Serve `request` from `data`, capping page size at `max_rows`.
fn serve(data: &[Value], request: PageRequest, max_rows: usize) -> Vec<Value> {
    let limit = usize::try_from(request.limit).unwrap_or(usize::MAX).min(max_rows);
    data.iter().skip(request.offset).take(limit).cloned().collect()
}

fn drive(pager: &mut ExponentialPager, data: &[Value], max_rows: usize) -> Vec<PageRequest> {
    let mut requests = Vec::new();
    while let Some(request) = pager.next_request().expect("request") {
        requests.push(request);
        let page = serve(data, request, max_rows);
        if let PageStatus::Done { .. } = pager.record_page(&page).expect("record") {
            break;
        }
    }
    requests
}

#[test]
fn listing_pages_reassemble_full_listing() {
    let data = listing(250);
    let mut pager = ExponentialPager::for_listing();
    let requests = drive(&mut pager, &data, usize::MAX);

    assert_eq!(
        requests.iter().map(|request| request.limit).collect::<Vec<_>>(),
        vec![1, 10, 100, 1000]
    );
    pager.verify_against(&data).expect("consistent");

    let overrun = pager.overrun_request();
    assert_eq!(overrun.offset, 250 + OVERRUN_MARGIN);
    assert!(serve(&data, overrun, usize::MAX).is_empty());
}

#[test]
fn listing_that_ends_on_page_boundary_needs_an_empty_page() {
    // 11 items fill the 1- and 10-item pages exactly; the 100-item page is empty.
    let data = listing(11);
    let mut pager = ExponentialPager::for_listing();
    assert_eq!(pager.record_page(&data[..1]).expect("first"), PageStatus::More);
    assert_eq!(pager.record_page(&data[1..]).expect("second"), PageStatus::More);
    assert!(pager.record_page(&[]).is_err());
}

#[test]
fn search_paging_reaches_reference_length() {
    let data = listing(42);
    let mut pager = ExponentialPager::for_search(data.len(), data.len(), 1000).expect("pager");
    drive(&mut pager, &data, usize::MAX);
    assert!(pager.is_finished());
    pager.verify_against(&data).expect("consistent");
    assert_eq!(pager.overrun_request().offset, 42 + OVERRUN_MARGIN);
}

#[test]
fn truncated_search_reference_is_matched_prefix() {
    // Endpoint caps pages at 20 rows; 90 matches exist.
    let data = listing(90);
    let reference = &data[..20];
    let mut pager = ExponentialPager::for_search(reference.len(), data.len(), 20).expect("pager");
    drive(&mut pager, &data, 20);
    pager.verify_against(reference).expect("consistent");
}

#[test]
fn reordered_listing_is_detected() {
    let data = listing(5);
    let mut shuffled = data.clone();
    shuffled.swap(2, 3);
    let mut pager = ExponentialPager::for_listing();
    drive(&mut pager, &shuffled, usize::MAX);
    let err = pager.verify_against(&data).unwrap_err();
    assert!(err.to_string().contains("#2"), "{err}");
}

#[test]
fn paging_parameter_names_follow_version() {
    assert_eq!(
        CkanVersion::V2_8.search_paging_params("https://data.example/api"),
        ("limit", "offset")
    );
    assert_eq!(
        CkanVersion::V2_9.search_paging_params("https://data.example/api"),
        ("rows", "start")
    );
}

proptest! {
    #[test]
    fn prop_listing_pages_concatenate_to_full_listing(len in 1usize..400) {
        let data = listing(len);
        let mut pager = ExponentialPager::for_listing();
        let mut requests = Vec::new();
        loop {
            let request = pager.next_request().expect("request").expect("unfinished");
            requests.push(request);
            let page = serve(&data, request, usize::MAX);
            if page.is_empty() {
                // Exactly filled pages leave nothing for the next request.
                prop_assert!(pager.record_page(&page).is_err());
                prop_assert_eq!(pager.accumulated(), &data[..]);
                break;
            }
            if let PageStatus::Done { final_page } = pager.record_page(&page).expect("record") {
                prop_assert_eq!(final_page, request);
                break;
            }
        }
        prop_assert_eq!(pager.accumulated(), &data[..]);
        for pair in requests.windows(2) {
            prop_assert_eq!(pair[1].limit, pair[0].limit * 10);
        }
    }
}
