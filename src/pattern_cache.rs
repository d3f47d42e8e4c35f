//! Bounded, thread-safe cache of compiled regular expressions.
//!
//! String-matching comparisons are typically rebuilt for every assertion, often
//! from the same handful of pattern sources. Compilation is cached here keyed by
//! `(source, flags)` with least-recently-used eviction.

use crate::error::{Error, Result};
use regex::{Regex, RegexBuilder};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, OnceLock, PoisonError};

pub const DEFAULT_PATTERN_CACHE_CAPACITY: usize = 32;

/// Compilation flags understood by [`PatternCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PatternFlags {
    pub ignore_case: bool,
    pub multi_line: bool,
    pub dot_matches_new_line: bool,
    pub ignore_whitespace: bool,
}

impl PatternFlags {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ignore_case: false,
            multi_line: false,
            dot_matches_new_line: false,
            ignore_whitespace: false,
        }
    }

    #[must_use]
    pub const fn ignore_case(mut self, yes: bool) -> Self {
        self.ignore_case = yes;
        self
    }

    #[must_use]
    pub const fn multi_line(mut self, yes: bool) -> Self {
        self.multi_line = yes;
        self
    }

    #[must_use]
    pub const fn dot_matches_new_line(mut self, yes: bool) -> Self {
        self.dot_matches_new_line = yes;
        self
    }

    #[must_use]
    pub const fn ignore_whitespace(mut self, yes: bool) -> Self {
        self.ignore_whitespace = yes;
        self
    }

    fn compile(self, source: &str) -> Result<Regex> {
        RegexBuilder::new(source)
            .case_insensitive(self.ignore_case)
            .multi_line(self.multi_line)
            .dot_matches_new_line(self.dot_matches_new_line)
            .ignore_whitespace(self.ignore_whitespace)
            .build()
            .map_err(|err| Error::pattern(source, err))
    }
}

type PatternKey = (String, PatternFlags);

#[derive(Debug, Default)]
struct LruState {
    entries: HashMap<PatternKey, Regex>,
    // Front is least recently used.
    recency: VecDeque<PatternKey>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl LruState {
    fn touch(&mut self, key: &PatternKey) {
        if let Some(pos) = self.recency.iter().position(|k| k == key) {
            if let Some(existing) = self.recency.remove(pos) {
                self.recency.push_back(existing);
            }
        }
    }
}

/// Snapshot for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternCacheStats {
    pub len: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

static GLOBAL: OnceLock<PatternCache> = OnceLock::new();

#[derive(Debug)]
pub struct PatternCache {
    capacity: usize,
    state: Mutex<LruState>,
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN_CACHE_CAPACITY)
    }
}

impl PatternCache {
    /// Create a cache holding at most `capacity` compiled patterns (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(LruState::default()),
        }
    }

    /// The process-wide cache used by matchers built without an explicit cache.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(Self::default)
    }

    /// Size the process-wide cache before first use.
    ///
    /// Returns `false` if the global cache already exists, in which case its
    /// capacity is unchanged.
    pub fn install_global(capacity: usize) -> bool {
        GLOBAL.set(Self::new(capacity)).is_ok()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Return the compiled pattern for `(source, flags)`, compiling on a miss.
    ///
    /// Compilation failures are returned to the caller and never cached.
    pub fn get_or_compile(&self, source: &str, flags: PatternFlags) -> Result<Regex> {
        let key: PatternKey = (source.to_string(), flags);
        {
            let mut state = self.lock();
            if let Some(regex) = state.entries.get(&key).cloned() {
                state.hits += 1;
                state.touch(&key);
                tracing::trace!(event = "pattern_cache.hit", pattern = source);
                return Ok(regex);
            }
        }

        // Compile outside the lock; a concurrent miss on the same key just
        // compiles twice and the second insert refreshes recency.
        let regex = flags.compile(source)?;

        let mut state = self.lock();
        state.misses += 1;
        tracing::debug!(event = "pattern_cache.miss", pattern = source);
        if state.entries.insert(key.clone(), regex.clone()).is_some() {
            state.touch(&key);
            return Ok(regex);
        }
        state.recency.push_back(key);
        while state.entries.len() > self.capacity {
            let Some(evicted) = state.recency.pop_front() else {
                break;
            };
            state.entries.remove(&evicted);
            state.evictions += 1;
            let (evicted_source, _) = evicted;
            tracing::debug!(event = "pattern_cache.evict", pattern = %evicted_source);
        }
        Ok(regex)
    }

    #[must_use]
    pub fn contains(&self, source: &str, flags: PatternFlags) -> bool {
        self.lock()
            .entries
            .contains_key(&(source.to_string(), flags))
    }

    #[must_use]
    pub fn stats(&self) -> PatternCacheStats {
        let state = self.lock();
        PatternCacheStats {
            len: state.entries.len(),
            capacity: self.capacity,
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
        }
    }

    /// Drop every cached pattern and reset the hit/miss/eviction counters.
    pub fn clear(&self) {
        *self.lock() = LruState::default();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
