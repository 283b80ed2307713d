// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use dd_trace::utils::lock_unpoisoned;
use lru::LruCache;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Mutex;

const CACHE_SIZE: NonZeroUsize = NonZeroUsize::MIN.saturating_add(255);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GlobToken {
    Literal(char),
    /// `?`
    AnyChar,
    /// `*`, consecutive stars are collapsed
    AnyRun,
}

fn compile(pattern: &str) -> Vec<GlobToken> {
    let mut tokens: Vec<GlobToken> = Vec::with_capacity(pattern.len());
    for c in pattern.chars() {
        let token = match c {
            '*' => GlobToken::AnyRun,
            '?' => GlobToken::AnyChar,
            c => GlobToken::Literal(c),
        };
        if token == GlobToken::AnyRun && tokens.last() == Some(&GlobToken::AnyRun) {
            continue;
        }
        tokens.push(token);
    }
    tokens
}

/// Case insensitive wildcard matching of span services and names.
///
/// `*` matches any run of characters, the empty one included, and `?` matches
/// exactly one character. Subjects repeat a lot, so results are memoized per
/// subject in a small LRU cache.
pub struct GlobMatcher {
    pattern: String,
    tokens: Vec<GlobToken>,
    cache: Mutex<LruCache<String, bool>>,
}

impl GlobMatcher {
    pub fn new(pattern: &str) -> Self {
        GlobMatcher {
            pattern: pattern.to_string(),
            tokens: compile(pattern),
            cache: Mutex::new(LruCache::new(CACHE_SIZE)),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn matches_everything(&self) -> bool {
        self.tokens == [GlobToken::AnyRun]
    }

    pub fn matches(&self, subject: &str) -> bool {
        if self.matches_everything() {
            return true;
        }
        if let Some(&hit) = lock_unpoisoned(&self.cache).get(subject) {
            return hit;
        }
        let chars: Vec<char> = subject.chars().collect();
        let result = match_tokens(&self.tokens, &chars);
        lock_unpoisoned(&self.cache).put(subject.to_string(), result);
        result
    }
}

/// Case insensitive comparison of two characters, some of which lowercase to
/// more than one character
fn same_letter(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Greedy matching that retries from the last `*` seen, giving it one more
/// character on every retry.
fn match_tokens(tokens: &[GlobToken], subject: &[char]) -> bool {
    let mut t = 0;
    let mut s = 0;
    let mut retry: Option<(usize, usize)> = None;

    while s < subject.len() {
        match tokens.get(t) {
            Some(GlobToken::AnyRun) => {
                retry = Some((t + 1, s));
                t += 1;
                continue;
            }
            Some(GlobToken::AnyChar) => {
                t += 1;
                s += 1;
                continue;
            }
            Some(GlobToken::Literal(c)) if same_letter(*c, subject[s]) => {
                t += 1;
                s += 1;
                continue;
            }
            _ => {}
        }
        let Some((after_star, absorbed)) = retry else {
            return false;
        };
        retry = Some((after_star, absorbed + 1));
        t = after_star;
        s = absorbed + 1;
    }

    tokens[t..].iter().all(|token| *token == GlobToken::AnyRun)
}

impl fmt::Debug for GlobMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobMatcher")
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

impl Clone for GlobMatcher {
    fn clone(&self) -> Self {
        GlobMatcher {
            pattern: self.pattern.clone(),
            tokens: self.tokens.clone(),
            cache: Mutex::new(LruCache::new(CACHE_SIZE)),
        }
    }
}
