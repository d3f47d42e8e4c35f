//! Fuzzy structural equality for asserting on decoded API responses.
//!
//! An [`Expected`] tree describes the shape a response should have. Its leaves
//! are either plain JSON values (compared with ordinary `Value` equality) or
//! matchers that accept a whole family of candidates:
//!
//! - [`Expected::Any`]: anything at all.
//! - [`RestrictedAny`]: anything accepted by a caller-supplied predicate.
//! - [`AnySupersetOfMapping`] / [`AnySupersetOfSeq`]: any object containing the
//!   reference entries, or any array containing the reference elements as an
//!   in-order subsequence. Built through [`AnySupersetOf`].
//! - [`AnyStringMatching`]: any string with a regex match at offset zero.
//! - [`ExactIdentity`]: one specific `Value` by address.
//!
//! `Expected` compares against `Value` from either side, so both
//! `assert_eq!(response, expected)` and `assert_eq!(expected, response)` work.
//!
//! ```
//! use ckanft::comparisons::{AnySupersetOf, Expected};
//! use serde_json::json;
//!
//! let response = json!({"name": "example", "tags": [{"name": "a"}, {"name": "b"}], "id": "x"});
//! let expected = AnySupersetOf::new(json!({"tags": [{"name": "b"}]}))
//!     .recursive(true)
//!     .build();
//! assert_eq!(response, expected);
//! ```
//!
//! Matcher equality is not an equivalence relation, so matchers implement
//! neither `Hash` nor `Eq` and cannot be set members or map keys.
//!
//! ```compile_fail
//! use std::collections::HashSet;
//!
//! let mut seen = HashSet::new();
//! seen.insert(ckanft::comparisons::Expected::Any);
//! ```

use crate::error::Result;
use crate::pattern_cache::{PatternCache, PatternFlags};
use regex::Regex;
use serde_json::{Number, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::sync::Arc;

/// A value that can stand on one side of an equality check against a `Value`.
pub trait Matcher {
    fn matches(&self, candidate: &Value) -> bool;
}

// ────────────────────────────────────────────────────────────────────────────
// Expected tree
// ────────────────────────────────────────────────────────────────────────────

/// Reference shape to compare decoded JSON against.
#[derive(Clone)]
pub enum Expected<'r> {
    /// Compared with plain `Value` equality.
    Value(Value),
    /// Same key set as the candidate object, each value matched.
    Object(BTreeMap<String, Expected<'r>>),
    /// Same length as the candidate array, element-wise matched.
    Array(Vec<Expected<'r>>),
    /// Matches anything.
    Any,
    Condition(RestrictedAny<'r>),
    SupersetOfMapping(AnySupersetOfMapping<'r>),
    SupersetOfSeq(AnySupersetOfSeq<'r>),
    StringMatching(AnyStringMatching),
    Identity(ExactIdentity<'r>),
}

/// Result of classifying a reference before building a superset matcher.
enum Shape<'r> {
    Mapping(BTreeMap<String, Expected<'r>>),
    Sequence(Vec<Expected<'r>>),
    Other(Expected<'r>),
}

impl<'r> Expected<'r> {
    /// An exact object whose values may themselves be matchers.
    pub fn object<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Self>,
    {
        Self::Object(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// An exact array whose elements may themselves be matchers.
    pub fn array<V: Into<Self>>(items: impl IntoIterator<Item = V>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }

    /// Shorthand for a non-recursive, order-sensitive [`AnySupersetOf`].
    pub fn superset_of(reference: impl Into<Self>) -> Self {
        AnySupersetOf::new(reference).build()
    }

    pub fn condition(
        description: impl Into<Cow<'static, str>>,
        condition: impl Fn(&Value) -> bool + Send + Sync + 'r,
    ) -> Self {
        Self::Condition(RestrictedAny::new(description, condition))
    }

    pub fn string_matching(pattern: &str) -> Result<Self> {
        AnyStringMatching::new(pattern).map(Self::StringMatching)
    }

    pub const fn identity(reference: &'r Value) -> Self {
        Self::Identity(ExactIdentity::new(reference))
    }

    #[must_use]
    pub fn matches(&self, candidate: &Value) -> bool {
        match self {
            Self::Value(value) => values_equal(value, candidate),
            Self::Object(entries) => candidate.as_object().is_some_and(|object| {
                object.len() == entries.len()
                    && entries.iter().all(|(key, expected)| {
                        object.get(key).is_some_and(|actual| expected.matches(actual))
                    })
            }),
            Self::Array(items) => candidate.as_array().is_some_and(|actual| {
                actual.len() == items.len()
                    && items
                        .iter()
                        .zip(actual)
                        .all(|(expected, actual)| expected.matches(actual))
            }),
            Self::Any => true,
            Self::Condition(inner) => inner.matches(candidate),
            Self::SupersetOfMapping(inner) => inner.matches(candidate),
            Self::SupersetOfSeq(inner) => inner.matches(candidate),
            Self::StringMatching(inner) => inner.matches(candidate),
            Self::Identity(inner) => inner.matches(candidate),
        }
    }

    /// Locate the first point where `candidate` fails to match.
    ///
    /// Returns `None` exactly when [`Self::matches`] returns `true`.
    #[must_use]
    pub fn explain(&self, candidate: &Value) -> Option<Mismatch> {
        let mut path = String::new();
        self.explain_at(candidate, &mut path)
    }

    fn explain_at(&self, candidate: &Value, path: &mut String) -> Option<Mismatch> {
        match self {
            Self::Object(entries) => {
                let Some(object) = candidate.as_object() else {
                    return Some(Mismatch::new(path, "expected an object", candidate));
                };
                if let Some(key) = entries.keys().find(|key| !object.contains_key(*key)) {
                    return Some(Mismatch::missing_key(path, key));
                }
                if let Some(key) = object.keys().find(|key| !entries.contains_key(*key)) {
                    return Some(Mismatch::new(
                        path,
                        format!("unexpected key {key:?}"),
                        candidate,
                    ));
                }
                explain_entries(entries, object, path)
            }
            Self::Array(items) => {
                let Some(actual) = candidate.as_array() else {
                    return Some(Mismatch::new(path, "expected an array", candidate));
                };
                if actual.len() != items.len() {
                    return Some(Mismatch::new(
                        path,
                        format!("expected {} elements, found {}", items.len(), actual.len()),
                        candidate,
                    ));
                }
                items.iter().zip(actual).enumerate().find_map(|(idx, (expected, actual))| {
                    with_segment(path, &idx.to_string(), |path| {
                        expected.explain_at(actual, path)
                    })
                })
            }
            Self::SupersetOfMapping(inner) => {
                let Some(object) = candidate.as_object() else {
                    return Some(Mismatch::new(path, "expected an object", candidate));
                };
                if let Some(key) = inner.subset.keys().find(|key| !object.contains_key(*key)) {
                    return Some(Mismatch::missing_key(path, key));
                }
                explain_entries(&inner.subset, object, path)
            }
            Self::SupersetOfSeq(inner) => {
                let Some(items) = candidate.as_array() else {
                    return Some(Mismatch::new(path, "expected an array", candidate));
                };
                inner.first_unmatched(items).map(|idx| {
                    Mismatch::new(
                        path,
                        format!(
                            "no remaining element matched reference item #{idx}: {}",
                            inner.subset[idx]
                        ),
                        candidate,
                    )
                })
            }
            _ if self.matches(candidate) => None,
            _ => Some(Mismatch::new(path, format!("expected {self}"), candidate)),
        }
    }

    fn into_shape(self) -> Shape<'r> {
        match self {
            Self::Value(Value::Object(object)) => Shape::Mapping(
                object
                    .into_iter()
                    .map(|(key, value)| (key, Self::Value(value)))
                    .collect(),
            ),
            Self::Value(Value::Array(items)) => {
                Shape::Sequence(items.into_iter().map(Self::Value).collect())
            }
            Self::Object(entries) => Shape::Mapping(entries),
            Self::Array(items) => Shape::Sequence(items),
            other => Shape::Other(other),
        }
    }

    /// Sort key used to align sequences before order-insensitive matching.
    #[must_use]
    pub fn norm_order_key(&self) -> NormOrderKey {
        match self {
            Self::Value(value) => norm_order_key(value),
            Self::Object(entries) => {
                mapping_norm_order_key(|key| entries.get(key).map(Self::stringify))
            }
            _ => NormOrderKey::unstringifiable(),
        }
    }

    fn stringify(&self) -> String {
        match self {
            Self::Value(value) => stringify_value(value),
            other => other.to_string(),
        }
    }
}

fn explain_entries(
    entries: &BTreeMap<String, Expected<'_>>,
    object: &serde_json::Map<String, Value>,
    path: &mut String,
) -> Option<Mismatch> {
    entries.iter().find_map(|(key, expected)| {
        let actual = object.get(key)?;
        with_segment(path, key, |path| expected.explain_at(actual, path))
    })
}

fn with_segment<T>(path: &mut String, segment: &str, f: impl FnOnce(&mut String) -> T) -> T {
    let len = path.len();
    path.push('/');
    for ch in segment.chars() {
        match ch {
            '~' => path.push_str("~0"),
            '/' => path.push_str("~1"),
            other => path.push(other),
        }
    }
    let out = f(path);
    path.truncate(len);
    out
}

/// First mismatch found by [`Expected::explain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// JSON pointer into the candidate (`""` is the root).
    pub path: String,
    pub reason: String,
    pub found: String,
}

impl Mismatch {
    fn new(path: &str, reason: impl Into<String>, found: &Value) -> Self {
        Self {
            path: path.to_string(),
            reason: reason.into(),
            found: truncate_repr(found.to_string()),
        }
    }

    fn missing_key(path: &str, key: &str) -> Self {
        Self {
            path: path.to_string(),
            reason: format!("missing key {key:?}"),
            found: String::new(),
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "at {path}: {}", self.reason)?;
        if !self.found.is_empty() {
            write!(f, " (found {})", self.found)?;
        }
        Ok(())
    }
}

const MAX_FOUND_REPR: usize = 200;

fn truncate_repr(mut repr: String) -> String {
    if repr.len() > MAX_FOUND_REPR {
        let mut cut = MAX_FOUND_REPR;
        while !repr.is_char_boundary(cut) {
            cut -= 1;
        }
        repr.truncate(cut);
        repr.push('…');
    }
    repr
}

// ────────────────────────────────────────────────────────────────────────────
// RestrictedAny
// ────────────────────────────────────────────────────────────────────────────

/// Equal to anything the wrapped predicate accepts.
///
/// Analogous to [`Expected::Any`] but restricted, e.g. "any odd number":
///
/// ```
/// use ckanft::comparisons::{Expected, RestrictedAny};
/// use serde_json::json;
///
/// let odd = RestrictedAny::new("odd", |v| v.as_i64().is_some_and(|n| n % 2 == 1));
/// let expected = Expected::array([json!(4).into(), Expected::from(odd), json!(6).into()]);
/// assert_eq!(json!([4, 5, 6]), expected);
/// assert_ne!(json!([4, 8, 6]), expected);
/// ```
#[derive(Clone)]
pub struct RestrictedAny<'r> {
    description: Cow<'static, str>,
    condition: Arc<dyn Fn(&Value) -> bool + Send + Sync + 'r>,
}

impl<'r> RestrictedAny<'r> {
    pub fn new(
        description: impl Into<Cow<'static, str>>,
        condition: impl Fn(&Value) -> bool + Send + Sync + 'r,
    ) -> Self {
        Self {
            description: description.into(),
            condition: Arc::new(condition),
        }
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl Matcher for RestrictedAny<'_> {
    fn matches(&self, candidate: &Value) -> bool {
        (self.condition)(candidate)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Superset matchers
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupersetOptions {
    /// Apply superset semantics to nested objects and arrays too.
    pub recursive: bool,
    /// Compare arrays order-insensitively (see [`norm_order_key`]).
    ///
    /// Only affects arrays that are themselves turned into superset matchers,
    /// so for nested arrays it has no effect without `recursive`.
    pub seq_norm_order: bool,
}

/// Builder dispatching a reference to the matching superset matcher.
///
/// Objects become [`AnySupersetOfMapping`], arrays become [`AnySupersetOfSeq`]
/// and anything else (scalars, other matchers) is returned unchanged.
#[derive(Clone)]
pub struct AnySupersetOf<'r> {
    reference: Expected<'r>,
    options: SupersetOptions,
}

impl<'r> AnySupersetOf<'r> {
    pub fn new(reference: impl Into<Expected<'r>>) -> Self {
        Self {
            reference: reference.into(),
            options: SupersetOptions::default(),
        }
    }

    #[must_use]
    pub const fn recursive(mut self, recursive: bool) -> Self {
        self.options.recursive = recursive;
        self
    }

    #[must_use]
    pub const fn seq_norm_order(mut self, seq_norm_order: bool) -> Self {
        self.options.seq_norm_order = seq_norm_order;
        self
    }

    #[must_use]
    pub const fn options(mut self, options: SupersetOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn build(self) -> Expected<'r> {
        any_superset_of(self.reference, self.options)
    }
}

/// Function form of [`AnySupersetOf`].
pub fn any_superset_of<'r>(
    reference: impl Into<Expected<'r>>,
    options: SupersetOptions,
) -> Expected<'r> {
    match reference.into().into_shape() {
        Shape::Mapping(entries) => {
            Expected::SupersetOfMapping(AnySupersetOfMapping::from_entries(entries, options))
        }
        Shape::Sequence(items) => {
            Expected::SupersetOfSeq(AnySupersetOfSeq::from_items(items, options))
        }
        Shape::Other(other) => other,
    }
}

/// Equal to any object that contains every reference entry.
///
/// Keys present in the candidate but not in the reference are ignored.
#[derive(Clone)]
pub struct AnySupersetOfMapping<'r> {
    subset: BTreeMap<String, Expected<'r>>,
}

impl<'r> AnySupersetOfMapping<'r> {
    pub fn new<K, V>(entries: impl IntoIterator<Item = (K, V)>, options: SupersetOptions) -> Self
    where
        K: Into<String>,
        V: Into<Expected<'r>>,
    {
        Self::from_entries(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
            options,
        )
    }

    fn from_entries(subset: BTreeMap<String, Expected<'r>>, options: SupersetOptions) -> Self {
        let subset = if options.recursive {
            subset
                .into_iter()
                .map(|(key, value)| (key, any_superset_of(value, options)))
                .collect()
        } else {
            subset
        };
        Self { subset }
    }

    #[must_use]
    pub const fn subset(&self) -> &BTreeMap<String, Expected<'r>> {
        &self.subset
    }
}

impl Matcher for AnySupersetOfMapping<'_> {
    fn matches(&self, candidate: &Value) -> bool {
        let Some(object) = candidate.as_object() else {
            return false;
        };
        self.subset
            .iter()
            .all(|(key, expected)| object.get(key).is_some_and(|actual| expected.matches(actual)))
    }
}

/// Equal to any array containing the reference elements in order.
///
/// Elements need not be contiguous. The scan is a single greedy pass: each
/// candidate element is compared only with the next unmatched reference
/// element, and a match is never revisited. With duplicate or overlapping
/// reference elements this can reject a candidate that a full matching search
/// would accept; that trade-off is accepted because exact order-insensitive
/// subset matching is a bipartite matching problem.
#[derive(Clone)]
pub struct AnySupersetOfSeq<'r> {
    subset: Vec<Expected<'r>>,
    seq_norm_order: bool,
}

impl<'r> AnySupersetOfSeq<'r> {
    pub fn new<V: Into<Expected<'r>>>(
        items: impl IntoIterator<Item = V>,
        options: SupersetOptions,
    ) -> Self {
        Self::from_items(items.into_iter().map(Into::into).collect(), options)
    }

    fn from_items(mut items: Vec<Expected<'r>>, options: SupersetOptions) -> Self {
        // Sort before wrapping: the key looks at identifying fields of raw
        // objects, which superset matchers no longer expose.
        if options.seq_norm_order {
            items.sort_by_cached_key(Expected::norm_order_key);
        }
        let subset = if options.recursive {
            items
                .into_iter()
                .map(|item| any_superset_of(item, options))
                .collect()
        } else {
            items
        };
        Self {
            subset,
            seq_norm_order: options.seq_norm_order,
        }
    }

    #[must_use]
    pub fn subset(&self) -> &[Expected<'r>] {
        &self.subset
    }

    #[must_use]
    pub const fn normalizes_order(&self) -> bool {
        self.seq_norm_order
    }

    /// Index of the first reference element left unmatched, if any.
    fn first_unmatched(&self, items: &[Value]) -> Option<usize> {
        if self.seq_norm_order {
            let mut sorted: Vec<&Value> = items.iter().collect();
            sorted.sort_by_cached_key(|item| norm_order_key(item));
            self.greedy_scan(sorted)
        } else {
            self.greedy_scan(items)
        }
    }

    fn greedy_scan<'c>(&self, candidates: impl IntoIterator<Item = &'c Value>) -> Option<usize> {
        let mut cursor = 0;
        if self.subset.is_empty() {
            return None;
        }
        for candidate in candidates {
            if self.subset[cursor].matches(candidate) {
                cursor += 1;
                if cursor == self.subset.len() {
                    return None;
                }
            }
        }
        tracing::trace!(
            event = "comparisons.seq.unmatched",
            index = cursor,
            pending = %self.subset[cursor],
            "reference element found no remaining candidate"
        );
        Some(cursor)
    }
}

impl Matcher for AnySupersetOfSeq<'_> {
    fn matches(&self, candidate: &Value) -> bool {
        candidate
            .as_array()
            .is_some_and(|items| self.first_unmatched(items).is_none())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Order normalization
// ────────────────────────────────────────────────────────────────────────────

/// Object fields assumed to identify an element stably, in priority order.
pub const NORM_ORDER_MAPPING_KEYS: [&str; 3] = ["key", "name", "position"];

#[allow(clippy::cast_possible_truncation)]
const UNIDENTIFIED_MAPPING: u8 = NORM_ORDER_MAPPING_KEYS.len() as u8;
const TEXT: u8 = UNIDENTIFIED_MAPPING + 1;
const BOOLEAN: u8 = TEXT + 1;
const NUMERIC: u8 = BOOLEAN + 1;
const UNSTRINGIFIABLE: u8 = NUMERIC + 1;

/// Composite sort key: a category, then an optional string form.
///
/// Categories keep elements keyed by different means apart once sorted:
/// objects by their first identifying field, then objects with none, then
/// strings, booleans and numbers, then everything else. Elements without a
/// string form tie within their category and keep their original relative
/// order because the sort is stable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NormOrderKey {
    pub category: u8,
    pub repr: Option<String>,
}

impl NormOrderKey {
    const fn unstringifiable() -> Self {
        Self {
            category: UNSTRINGIFIABLE,
            repr: None,
        }
    }
}

/// Sort key for one candidate element.
#[must_use]
pub fn norm_order_key(item: &Value) -> NormOrderKey {
    let (category, repr) = match item {
        Value::Object(object) => {
            return mapping_norm_order_key(|key| object.get(key).map(stringify_value));
        }
        Value::String(text) => (TEXT, text.clone()),
        Value::Bool(flag) => (BOOLEAN, flag.to_string()),
        Value::Number(number) => (NUMERIC, number.to_string()),
        // Nested arrays have no stable string form worth sorting on.
        Value::Null | Value::Array(_) => return NormOrderKey::unstringifiable(),
    };
    NormOrderKey {
        category,
        repr: Some(repr),
    }
}

fn mapping_norm_order_key(lookup: impl Fn(&str) -> Option<String>) -> NormOrderKey {
    NORM_ORDER_MAPPING_KEYS
        .iter()
        .zip(0u8..)
        .find_map(|(key, category)| {
            lookup(key).map(|repr| NormOrderKey {
                category,
                repr: Some(repr),
            })
        })
        .unwrap_or(NormOrderKey {
            category: UNIDENTIFIED_MAPPING,
            repr: None,
        })
}

fn stringify_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Native equality
// ────────────────────────────────────────────────────────────────────────────

/// Deep JSON equality that compares numbers by value.
///
/// `10` and `10.0` are equal; everything else compares as `Value` equality.
#[must_use]
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => numbers_equal(left, right),
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .zip(right)
                    .all(|(left, right)| values_equal(left, right))
        }
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left.iter().all(|(key, left)| {
                    right.get(key).is_some_and(|right| values_equal(left, right))
                })
        }
        (left, right) => left == right,
    }
}

fn numbers_equal(left: &Number, right: &Number) -> bool {
    match (integral_value(left), integral_value(right)) {
        (Some(left), Some(right)) => left == right,
        _ => left.as_f64() == right.as_f64(),
    }
}

/// Exact integer value of `number`, including floats with no fractional part.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn integral_value(number: &Number) -> Option<i128> {
    if let Some(value) = number.as_i64() {
        return Some(value.into());
    }
    if let Some(value) = number.as_u64() {
        return Some(value.into());
    }
    let value = number.as_f64()?;
    (value.is_finite() && value.fract() == 0.0 && value.abs() < 1e38).then(|| value as i128)
}

// ────────────────────────────────────────────────────────────────────────────
// String and identity matchers
// ────────────────────────────────────────────────────────────────────────────

/// Equal to any string the pattern matches starting at its first character.
///
/// Trailing characters after the match are allowed.
#[derive(Clone)]
pub struct AnyStringMatching {
    regex: Regex,
    /// `None` for precompiled patterns, whose flags are not known.
    flags: Option<PatternFlags>,
}

impl AnyStringMatching {
    pub fn new(pattern: &str) -> Result<Self> {
        Self::with_flags(pattern, PatternFlags::new())
    }

    pub fn with_flags(pattern: &str, flags: PatternFlags) -> Result<Self> {
        Self::with_cache(PatternCache::global(), pattern, flags)
    }

    pub fn with_cache(cache: &PatternCache, pattern: &str, flags: PatternFlags) -> Result<Self> {
        Ok(Self {
            regex: cache.get_or_compile(pattern, flags)?,
            flags: Some(flags),
        })
    }

    /// Wrap an already compiled pattern, bypassing the cache.
    ///
    /// Its flags are not recoverable from the `Regex`, so diagnostics render
    /// them as `?`.
    #[must_use]
    pub const fn from_regex(regex: Regex) -> Self {
        Self {
            regex,
            flags: None,
        }
    }

    #[must_use]
    pub const fn regex(&self) -> &Regex {
        &self.regex
    }
}

impl Matcher for AnyStringMatching {
    fn matches(&self, candidate: &Value) -> bool {
        // Leftmost-first search: if any match starts at 0, this one does.
        candidate
            .as_str()
            .and_then(|text| self.regex.find(text))
            .is_some_and(|found| found.start() == 0)
    }
}

impl From<Regex> for AnyStringMatching {
    fn from(regex: Regex) -> Self {
        Self::from_regex(regex)
    }
}

/// Equal only to the exact `Value` it borrows, compared by address.
///
/// ```
/// use ckanft::comparisons::Expected;
/// use serde_json::json;
///
/// let response = json!([7, []]);
/// let expected = Expected::array([json!(7).into(), Expected::identity(&response[1])]);
/// assert!(expected.matches(&response));
/// assert!(!expected.matches(&response.clone()));
/// ```
#[derive(Clone, Copy)]
pub struct ExactIdentity<'r> {
    reference: &'r Value,
}

impl<'r> ExactIdentity<'r> {
    #[must_use]
    pub const fn new(reference: &'r Value) -> Self {
        Self { reference }
    }
}

impl Matcher for ExactIdentity<'_> {
    fn matches(&self, candidate: &Value) -> bool {
        std::ptr::eq(self.reference, candidate)
    }
}

impl Matcher for Expected<'_> {
    fn matches(&self, candidate: &Value) -> bool {
        Expected::matches(self, candidate)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Equality against Value, both directions
// ────────────────────────────────────────────────────────────────────────────

macro_rules! impl_value_eq {
    ($($ty:ty),+ $(,)?) => {$(
        impl PartialEq<Value> for $ty {
            fn eq(&self, other: &Value) -> bool {
                Matcher::matches(self, other)
            }
        }

        impl PartialEq<$ty> for Value {
            fn eq(&self, other: &$ty) -> bool {
                Matcher::matches(other, self)
            }
        }
    )+};
}

impl_value_eq!(
    Expected<'_>,
    RestrictedAny<'_>,
    AnySupersetOfMapping<'_>,
    AnySupersetOfSeq<'_>,
    AnyStringMatching,
    ExactIdentity<'_>,
);

// ────────────────────────────────────────────────────────────────────────────
// Conversions
// ────────────────────────────────────────────────────────────────────────────

impl From<Value> for Expected<'_> {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty),+ $(,)?) => {$(
        impl From<$ty> for Expected<'_> {
            fn from(value: $ty) -> Self {
                Self::Value(Value::from(value))
            }
        }
    )+};
}

impl_from_scalar!(&str, String, bool, i32, i64, u64, f64);

impl<'r> From<Vec<Expected<'r>>> for Expected<'r> {
    fn from(items: Vec<Expected<'r>>) -> Self {
        Self::Array(items)
    }
}

impl<'r> From<BTreeMap<String, Expected<'r>>> for Expected<'r> {
    fn from(entries: BTreeMap<String, Expected<'r>>) -> Self {
        Self::Object(entries)
    }
}

impl<'r> From<RestrictedAny<'r>> for Expected<'r> {
    fn from(inner: RestrictedAny<'r>) -> Self {
        Self::Condition(inner)
    }
}

impl<'r> From<AnySupersetOfMapping<'r>> for Expected<'r> {
    fn from(inner: AnySupersetOfMapping<'r>) -> Self {
        Self::SupersetOfMapping(inner)
    }
}

impl<'r> From<AnySupersetOfSeq<'r>> for Expected<'r> {
    fn from(inner: AnySupersetOfSeq<'r>) -> Self {
        Self::SupersetOfSeq(inner)
    }
}

impl<'r> From<AnySupersetOf<'r>> for Expected<'r> {
    fn from(builder: AnySupersetOf<'r>) -> Self {
        builder.build()
    }
}

impl From<AnyStringMatching> for Expected<'_> {
    fn from(inner: AnyStringMatching) -> Self {
        Self::StringMatching(inner)
    }
}

impl<'r> From<ExactIdentity<'r>> for Expected<'r> {
    fn from(inner: ExactIdentity<'r>) -> Self {
        Self::Identity(inner)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Diagnostics
// ────────────────────────────────────────────────────────────────────────────

fn write_entries(f: &mut fmt::Formatter<'_>, entries: &BTreeMap<String, Expected<'_>>) -> fmt::Result {
    f.write_char('{')?;
    for (idx, (key, value)) in entries.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{key:?}: {value}")?;
    }
    f.write_char('}')
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Expected<'_>]) -> fmt::Result {
    f.write_char('[')?;
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_char(']')
}

impl fmt::Display for Expected<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value}"),
            Self::Object(entries) => write_entries(f, entries),
            Self::Array(items) => write_items(f, items),
            Self::Any => f.write_str("ANY"),
            Self::Condition(inner) => write!(f, "{inner}"),
            Self::SupersetOfMapping(inner) => write!(f, "{inner}"),
            Self::SupersetOfSeq(inner) => write!(f, "{inner}"),
            Self::StringMatching(inner) => write!(f, "{inner}"),
            Self::Identity(inner) => write!(f, "{inner}"),
        }
    }
}

impl fmt::Display for RestrictedAny<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RestrictedAny({})", self.description)
    }
}

impl fmt::Display for AnySupersetOfMapping<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AnySupersetOfMapping(")?;
        write_entries(f, &self.subset)?;
        f.write_char(')')
    }
}

impl fmt::Display for AnySupersetOfSeq<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AnySupersetOfSeq(")?;
        write_items(f, &self.subset)?;
        if self.seq_norm_order {
            f.write_str(", seq_norm_order")?;
        }
        f.write_char(')')
    }
}

impl fmt::Display for AnyStringMatching {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnyStringMatching(/{}/", self.regex.as_str())?;
        let Some(flags) = self.flags else {
            return f.write_str("?)");
        };
        for (enabled, letter) in [
            (flags.ignore_case, 'i'),
            (flags.multi_line, 'm'),
            (flags.dot_matches_new_line, 's'),
            (flags.ignore_whitespace, 'x'),
        ] {
            if enabled {
                f.write_char(letter)?;
            }
        }
        f.write_char(')')
    }
}

impl fmt::Display for ExactIdentity<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExactIdentity({} @ {:p})", self.reference, self.reference)
    }
}

// Debug mirrors Display so `assert_eq!` failures print the reference shape.
macro_rules! debug_via_display {
    ($($ty:ty),+ $(,)?) => {$(
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(self, f)
            }
        }
    )+};
}

debug_via_display!(
    Expected<'_>,
    RestrictedAny<'_>,
    AnySupersetOfMapping<'_>,
    AnySupersetOfSeq<'_>,
    AnyStringMatching,
    ExactIdentity<'_>,
);
