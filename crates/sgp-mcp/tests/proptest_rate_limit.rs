//! Property-based tests for the sliding-window rate limiter and cache keys.

use std::time::Duration;

use proptest::prelude::*;
use sgp_mcp::cache::generate_key;
use sgp_mcp::rate_limit::RateLimiter;

const WINDOW: Duration = Duration::from_secs(60);

proptest! {
    /// Within one window, exactly `min(calls, max)` calls are admitted and
    /// they are the first ones.
    #[test]
    fn admits_at_most_max_per_window(max in 0u32..40, calls in 0u32..80) {
        let limiter = RateLimiter::new();

        let admitted: Vec<bool> = (0..calls).map(|_| limiter.check_limit("k", max, WINDOW)).collect();
        let expected = calls.min(max) as usize;

        prop_assert_eq!(admitted.iter().filter(|a| **a).count(), expected);
        prop_assert!(admitted.iter().take(expected).all(|a| *a));
        prop_assert_eq!(limiter.remaining("k", max, WINDOW), max - calls.min(max));
    }

    /// Denied calls never consume capacity, so the remaining count stays at
    /// zero instead of going further down.
    #[test]
    fn denials_are_not_recorded(max in 1u32..20, extra in 1u32..20) {
        let limiter = RateLimiter::new();
        for _ in 0..max {
            prop_assert!(limiter.check_limit("k", max, WINDOW));
        }
        for _ in 0..extra {
            prop_assert!(!limiter.check_limit("k", max, WINDOW));
        }

        // A larger quota sees exactly `max` recorded calls.
        prop_assert_eq!(limiter.remaining("k", max + extra, WINDOW), extra);
    }

    /// Keys never share a window.
    #[test]
    fn keys_are_independent(max in 1u32..10) {
        let limiter = RateLimiter::new();
        for _ in 0..max {
            limiter.check_limit("rate_limit_token", max, WINDOW);
        }
        prop_assert!(!limiter.check_limit("rate_limit_token", max, WINDOW));
        prop_assert!(limiter.check_limit("rate_limit_basic", max, WINDOW));
    }

    /// Cache keys are the parts joined by ':'.
    #[test]
    fn generate_key_joins_parts(parts in proptest::collection::vec("[a-z0-9_]{1,8}", 1..5)) {
        let key = generate_key(parts.iter());
        prop_assert_eq!(key.split(':').collect::<Vec<_>>(), parts.iter().map(String::as_str).collect::<Vec<_>>());
    }
}
