//! Page-request planning for listing/search paging consistency checks.
//!
//! Page sizes grow exponentially (1, 10, 100, ...) so both sparsely and
//! heavily populated instances get a meaningful number of requests. The pager
//! accumulates each page and can then check the concatenation against the
//! unpaged listing.

use crate::error::{Error, Result};
use serde_json::Value;

/// Offset past the end of the listing used for the "no results past end" probe.
pub const OVERRUN_MARGIN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u64,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopRule {
    /// Plain listings: stop after the first page shorter than its limit.
    ShortPage,
    /// Searches: stop once as many results as the reference listing holds
    /// have been accumulated.
    ReachLength {
        target: usize,
        /// Whether the reference listing holds every match, or was itself
        /// truncated by the endpoint's maximum page size.
        target_complete: bool,
        /// Total match count reported by the endpoint.
        total_count: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    More,
    /// Paging finished. For [`StopRule::ShortPage`], `final_page` is the last
    /// request; repeating it without a limit should return the same page.
    Done { final_page: PageRequest },
}

#[derive(Debug, Clone)]
pub struct ExponentialPager {
    stop: StopRule,
    exponent: u32,
    accumulated: Vec<Value>,
    last_request: Option<PageRequest>,
    finished: bool,
}

impl ExponentialPager {
    /// Pager for plain listing endpoints (`package_list`, `organization_list`).
    #[must_use]
    pub const fn for_listing() -> Self {
        Self::with_rule(StopRule::ShortPage)
    }

    /// Pager for search endpoints.
    ///
    /// `reference_len` is the number of results in the reference ("full")
    /// response, fetched with `reference_limit` rows; `total_count` is the
    /// match count it reported. A truncated reference must be exactly
    /// `reference_limit` long.
    pub fn for_search(reference_len: usize, total_count: usize, reference_limit: usize) -> Result<Self> {
        let target_complete = total_count <= reference_limit;
        if !target_complete && reference_len != reference_limit {
            return Err(Error::validation(format!(
                "truncated reference listing has {reference_len} results, expected {reference_limit}"
            )));
        }
        Ok(Self::with_rule(StopRule::ReachLength {
            target: reference_len,
            target_complete,
            total_count,
        }))
    }

    const fn with_rule(stop: StopRule) -> Self {
        Self {
            stop,
            exponent: 0,
            accumulated: Vec::new(),
            last_request: None,
            finished: false,
        }
    }

    /// The next page to fetch, or `None` once paging has finished.
    pub fn next_request(&self) -> Result<Option<PageRequest>> {
        if self.finished {
            return Ok(None);
        }
        let limit = 10u64
            .checked_pow(self.exponent)
            .ok_or_else(|| Error::validation("page limit overflowed before paging finished"))?;
        Ok(Some(PageRequest {
            limit,
            offset: self.accumulated.len(),
        }))
    }

    /// Record the results returned for the request from [`Self::next_request`].
    pub fn record_page(&mut self, results: &[Value]) -> Result<PageStatus> {
        let Some(request) = self.next_request()? else {
            return Err(Error::validation("page recorded after paging finished"));
        };
        let len = results.len();
        if len == 0 || u64::try_from(len).map_or(true, |len| len > request.limit) {
            return Err(Error::validation(format!(
                "page at offset {} returned {len} results for limit {}",
                request.offset, request.limit
            )));
        }

        self.accumulated.extend_from_slice(results);
        self.last_request = Some(request);
        self.exponent += 1;
        tracing::debug!(
            event = "paging.page",
            offset = request.offset,
            limit = request.limit,
            returned = len,
            accumulated = self.accumulated.len()
        );

        let done = match self.stop {
            StopRule::ShortPage => (len as u64) < request.limit,
            StopRule::ReachLength {
                target,
                target_complete,
                ..
            } => {
                if self.accumulated.len() > target {
                    if target_complete {
                        return Err(Error::validation(format!(
                            "paged search returned {} results but the complete listing has {target}",
                            self.accumulated.len()
                        )));
                    }
                    self.accumulated.truncate(target);
                }
                self.accumulated.len() >= target
            }
        };

        if done {
            self.finished = true;
            Ok(PageStatus::Done {
                final_page: request,
            })
        } else {
            Ok(PageStatus::More)
        }
    }

    #[must_use]
    pub fn accumulated(&self) -> &[Value] {
        &self.accumulated
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Check the accumulated pages against the reference listing.
    pub fn verify_against(&self, reference: &[Value]) -> Result<()> {
        if let Some(idx) = self
            .accumulated
            .iter()
            .zip(reference)
            .position(|(paged, full)| paged != full)
        {
            return Err(Error::validation(format!(
                "paged result #{idx} differs: paged {} vs full {}",
                self.accumulated[idx], reference[idx]
            )));
        }
        if self.accumulated.len() != reference.len() {
            return Err(Error::validation(format!(
                "paged listing has {} results, full listing has {}",
                self.accumulated.len(),
                reference.len()
            )));
        }
        Ok(())
    }

    /// A request that starts past the end of the listing and must return
    /// no results.
    #[must_use]
    pub fn overrun_request(&self) -> PageRequest {
        match self.stop {
            StopRule::ShortPage => PageRequest {
                limit: self.last_request.map_or(1, |request| request.limit),
                offset: self.accumulated.len() + OVERRUN_MARGIN,
            },
            StopRule::ReachLength { total_count, .. } => PageRequest {
                limit: 10,
                offset: total_count + OVERRUN_MARGIN,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(range: std::ops::Range<usize>) -> Vec<Value> {
        range.map(|idx| json!(format!("item-{idx}"))).collect()
    }

    #[test]
    fn listing_limits_grow_by_powers_of_ten() {
        let full = names(0..25);
        let mut pager = ExponentialPager::for_listing();

        let first = pager.next_request().unwrap().unwrap();
        assert_eq!(first, PageRequest { limit: 1, offset: 0 });
        assert_eq!(pager.record_page(&full[0..1]).unwrap(), PageStatus::More);

        let second = pager.next_request().unwrap().unwrap();
        assert_eq!(second, PageRequest { limit: 10, offset: 1 });
        assert_eq!(pager.record_page(&full[1..11]).unwrap(), PageStatus::More);

        let third = pager.next_request().unwrap().unwrap();
        assert_eq!(third, PageRequest { limit: 100, offset: 11 });
        assert_eq!(
            pager.record_page(&full[11..25]).unwrap(),
            PageStatus::Done { final_page: third }
        );

        assert!(pager.is_finished());
        assert_eq!(pager.next_request().unwrap(), None);
        pager.verify_against(&full).unwrap();
        assert_eq!(
            pager.overrun_request(),
            PageRequest {
                limit: 100,
                offset: 35
            }
        );
    }

    #[test]
    fn empty_or_oversized_page_is_rejected() {
        let mut pager = ExponentialPager::for_listing();
        assert!(pager.record_page(&[]).is_err());
        assert!(pager.record_page(&names(0..2)).is_err());
    }

    #[test]
    fn verify_reports_first_difference() {
        let mut pager = ExponentialPager::for_listing();
        pager.record_page(&[json!("a")]).unwrap();
        pager.record_page(&[json!("x")]).unwrap();
        let err = pager.verify_against(&[json!("a"), json!("b")]).unwrap_err();
        assert!(err.to_string().contains("#1"), "{err}");

        let short = pager.verify_against(&[json!("a"), json!("x"), json!("y")]);
        assert!(short.is_err());
    }

    #[test]
    fn search_pager_stops_at_reference_length() {
        let full = names(0..5);
        let mut pager = ExponentialPager::for_search(5, 5, 1000).unwrap();
        assert_eq!(pager.record_page(&full[0..1]).unwrap(), PageStatus::More);
        assert!(matches!(
            pager.record_page(&full[1..5]).unwrap(),
            PageStatus::Done { .. }
        ));
        pager.verify_against(&full).unwrap();
        assert_eq!(
            pager.overrun_request(),
            PageRequest {
                limit: 10,
                offset: 15
            }
        );
    }

    #[test]
    fn search_pager_trims_when_reference_truncated() {
        // Reference holds 3 of 50 matches (max page size 3).
        let full = names(0..3);
        let mut pager = ExponentialPager::for_search(3, 50, 3).unwrap();
        pager.record_page(&names(0..1)).unwrap();
        let status = pager.record_page(&names(1..11)).unwrap();
        assert!(matches!(status, PageStatus::Done { .. }));
        assert_eq!(pager.accumulated().len(), 3);
        pager.verify_against(&full).unwrap();
    }

    #[test]
    fn search_pager_rejects_overshoot_of_complete_reference() {
        let mut pager = ExponentialPager::for_search(2, 2, 1000).unwrap();
        assert_eq!(pager.record_page(&names(0..1)).unwrap(), PageStatus::More);
        assert!(pager.record_page(&names(1..6)).is_err());
    }

    #[test]
    fn truncated_reference_must_be_full_page() {
        assert!(ExponentialPager::for_search(2, 50, 3).is_err());
    }
}
