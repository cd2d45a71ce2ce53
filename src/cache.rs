//! Thread-local compilation cache for the fixed rewrite patterns.
//!
//! Caches compiled regexes to avoid redundant recompilation when many
//! candidate files are patched in one run. Cache is capped at 64 entries;
//! all entries are evicted when full.

use regex::Regex;
use std::cell::RefCell;
use std::collections::HashMap;

const MAX_CACHE_ENTRIES: usize = 64;

thread_local! {
    static PATTERN_CACHE: RefCell<HashMap<String, Regex>> =
        RefCell::new(HashMap::new());
}

/// Get a compiled pattern from cache, or compile and cache it.
///
/// Every pattern in this crate is a hard-coded constant, so a compilation
/// failure is a programming error, not an input error.
pub fn get_or_compile(pattern: &str) -> Regex {
    PATTERN_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();

        if let Some(re) = cache.get(pattern) {
            return re.clone();
        }

        // Evict all if at capacity (simple but effective for batch workloads)
        if cache.len() >= MAX_CACHE_ENTRIES {
            cache.clear();
        }

        let compiled = Regex::new(pattern).expect("hard-coded pattern must compile");
        cache.insert(pattern.to_string(), compiled.clone());
        compiled
    })
}

/// Clear the pattern cache (mainly for testing).
pub fn clear_cache() {
    PATTERN_CACHE.with(|cache| {
        cache.borrow_mut().clear();
    });
}

/// Current number of cached patterns.
pub fn cache_size() -> usize {
    PATTERN_CACHE.with(|cache| cache.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_and_reuse() {
        clear_cache();
        let a = get_or_compile(r"\bdir\b");
        let b = get_or_compile(r"\bdir\b");
        assert_eq!(a.as_str(), b.as_str());
        assert_eq!(cache_size(), 1);
    }

    #[test]
    fn eviction_at_capacity() {
        clear_cache();
        for i in 0..MAX_CACHE_ENTRIES {
            get_or_compile(&format!("pattern{i}"));
        }
        assert_eq!(cache_size(), MAX_CACHE_ENTRIES);

        get_or_compile("one more");
        assert_eq!(cache_size(), 1);
    }
}
