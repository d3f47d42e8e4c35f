//! Support library for black-box functional tests of a CKAN catalog API.
//!
//! The centrepiece is [`comparisons`]: fuzzy structural equality between an
//! expected "shape" and a decoded JSON response, so a test can assert that a
//! response contains certain data while ignoring everything else it carries.
//! Around it sit the pieces a functional suite needs to prepare its inputs:
//! - [`fixtures`]: scrubbing instance-specific data out of stored responses.
//! - [`ckan_version`]: response-shape adapters between CKAN releases.
//! - [`paging`]: request planning and consistency checks for paged listings.
//! - [`config`]: suite variables (target URL, CKAN version, test toggles).

#![forbid(unsafe_code)]
#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]

pub mod ckan_version;
pub mod comparisons;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod paging;
pub mod pattern_cache;

pub use comparisons::{
    AnyStringMatching, AnySupersetOf, AnySupersetOfMapping, AnySupersetOfSeq, ExactIdentity,
    Expected, Matcher, Mismatch, RestrictedAny, SupersetOptions, values_equal,
};
pub use error::{Error, Result};

/// Assert that a JSON value matches an [`Expected`] shape.
///
/// On failure the panic message includes both sides and the path of the
/// first mismatch.
///
/// ```
/// use ckanft::{assert_json_matches, AnySupersetOf};
/// use serde_json::json;
///
/// let response = json!({"success": true, "result": ["a", "b", "c"]});
/// assert_json_matches!(response, AnySupersetOf::new(json!({"result": ["a", "c"]})).recursive(true));
/// ```
#[macro_export]
macro_rules! assert_json_matches {
    ($candidate:expr, $expected:expr $(,)?) => {{
        let candidate = &$candidate;
        let expected: $crate::comparisons::Expected<'_> = ::core::convert::Into::into($expected);
        if let ::core::option::Option::Some(mismatch) = expected.explain(candidate) {
            ::core::panic!(
                "assertion failed: JSON value does not match expected shape\n  expected: {}\n candidate: {}\n  mismatch: {}",
                expected, candidate, mismatch
            );
        }
    }};
}
