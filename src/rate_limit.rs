use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use dashmap::DashMap;

pub const DEFAULT_MAX_REQUESTS: u32 = 3;
pub const DEFAULT_WINDOW_SECS: u64 = 3600;

// Rate limit entry - tracks requests per client key within one window
struct RateLimitEntry {
    count: u32,
    window_start: Instant,
}

/// Fixed-window rate limiter keyed by client IP, used to throttle anonymous
/// registration submissions. State lives only in this process; a restart
/// clears it. Entries are replaced in place when their window expires and
/// are never evicted otherwise.
pub struct RateLimiter {
    entries: DashMap<String, RateLimitEntry>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max_requests,
            window,
        }
    }

    /// Returns true if the request is allowed, false if rate limit exceeded.
    ///
    /// A request with no derivable client key is always allowed and records
    /// nothing: without an identifier there is nothing to count against, and
    /// traffic we cannot tell apart must not be blocked.
    pub fn check_and_record(&self, key: Option<&str>) -> bool {
        self.check_and_record_at(key, Instant::now())
    }

    fn check_and_record_at(&self, key: Option<&str>, now: Instant) -> bool {
        let Some(key) = key else {
            return true;
        };

        // The guard returned by `entry` locks this key's shard until it is
        // dropped, so the read-check-write below is one atomic step. No
        // await happens while it is held.
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert(RateLimitEntry {
                count: 0,
                window_start: now,
            });

        // Window expired? Reset it. Strict '>': a request at the exact
        // boundary still counts against the old window.
        if now.duration_since(entry.window_start) > self.window {
            entry.count = 1;
            entry.window_start = now;
            return true;
        }

        // Under limit? Count it and allow.
        if entry.count < self.max_requests {
            entry.count += 1;
            return true;
        }

        // Over limit. Rejected requests leave the entry untouched.
        false
    }
}

/// Derive the rate-limit key for a request from its forwarding headers.
///
/// The first entry of `x-forwarded-for` wins, then `x-real-ip`,
/// `cf-connecting-ip`, and `x-client-ip` in that order. All of these are
/// client-controlled and spoofable, and treating the first forwarded entry
/// as the original client is a convention, not a guarantee - a known
/// limitation of header-based keying.
pub fn client_key(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
    {
        let first = forwarded.split(',').next().unwrap_or("").trim();
        return (!first.is_empty()).then(|| first.to_string());
    }

    ["x-real-ip", "cf-connecting-ip", "x-client-ip"]
        .iter()
        .find_map(|name| headers.get(*name).and_then(|value| value.to_str().ok()))
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn limiter() -> RateLimiter {
        RateLimiter::new(DEFAULT_MAX_REQUESTS, Duration::from_secs(DEFAULT_WINDOW_SECS))
    }

    fn minutes(base: Instant, m: u64) -> Instant {
        base + Duration::from_secs(m * 60)
    }

    #[test]
    fn allows_up_to_max_then_rejects_and_resets_after_window() {
        let limiter = limiter();
        let base = Instant::now();
        let key = Some("1.2.3.4");

        // Requests at t=0,1,2,3,4 minutes
        let results: Vec<bool> = (0..5)
            .map(|m| limiter.check_and_record_at(key, minutes(base, m)))
            .collect();
        assert_eq!(results, vec![true, true, true, false, false]);

        // t=61 minutes: window expired, admitted and reset
        assert!(limiter.check_and_record_at(key, minutes(base, 61)));

        // t=62,63 minutes fill the new window, t=64 is rejected again
        assert!(limiter.check_and_record_at(key, minutes(base, 62)));
        assert!(limiter.check_and_record_at(key, minutes(base, 63)));
        assert!(!limiter.check_and_record_at(key, minutes(base, 64)));
    }

    #[test]
    fn request_at_exact_window_boundary_counts_against_old_window() {
        let limiter = limiter();
        let base = Instant::now();
        let key = Some("1.2.3.4");

        for _ in 0..3 {
            assert!(limiter.check_and_record_at(key, base));
        }

        // Exactly windowStart + windowDuration is not yet expired
        let boundary = base + Duration::from_secs(DEFAULT_WINDOW_SECS);
        assert!(!limiter.check_and_record_at(key, boundary));

        // Any instant strictly past the boundary is
        assert!(limiter.check_and_record_at(key, boundary + Duration::from_secs(1)));
    }

    #[test]
    fn absent_key_is_always_allowed_and_records_nothing() {
        let limiter = limiter();
        let base = Instant::now();

        for m in 0..10 {
            assert!(limiter.check_and_record_at(None, minutes(base, m)));
        }
        assert!(limiter.entries.is_empty());
    }

    #[test]
    fn keys_are_independent() {
        let limiter = limiter();
        let base = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check_and_record_at(Some("10.0.0.1"), base));
        }
        assert!(!limiter.check_and_record_at(Some("10.0.0.1"), base));

        // Exhausting one key does not affect another
        assert!(limiter.check_and_record_at(Some("10.0.0.2"), base));
    }

    #[test]
    fn rejected_requests_do_not_mutate_the_entry() {
        let limiter = limiter();
        let base = Instant::now();
        let key = Some("1.2.3.4");

        let admitted = (0..10)
            .filter(|m| limiter.check_and_record_at(key, minutes(base, *m)))
            .count();
        assert_eq!(admitted, DEFAULT_MAX_REQUESTS as usize);
        assert_eq!(
            limiter.entries.get("1.2.3.4").unwrap().count,
            DEFAULT_MAX_REQUESTS
        );
    }

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn forwarded_header_takes_first_entry_trimmed() {
        let map = headers(&[("x-forwarded-for", " 1.2.3.4 , 5.6.7.8")]);
        assert_eq!(client_key(&map).as_deref(), Some("1.2.3.4"));
    }

    #[test]
    fn empty_first_forwarded_entry_means_no_key() {
        // A malformed forwarded list does not fall back to the other
        // headers; the request is simply treated as unidentified.
        let map = headers(&[("x-forwarded-for", " , 5.6.7.8"), ("x-real-ip", "9.9.9.9")]);
        assert_eq!(client_key(&map), None);
    }

    #[test]
    fn empty_forwarded_header_falls_back() {
        let map = headers(&[("x-forwarded-for", ""), ("x-real-ip", "9.9.9.9")]);
        assert_eq!(client_key(&map).as_deref(), Some("9.9.9.9"));
    }

    #[test]
    fn fallback_headers_are_checked_in_order() {
        let map = headers(&[("cf-connecting-ip", "2.2.2.2"), ("x-client-ip", "3.3.3.3")]);
        assert_eq!(client_key(&map).as_deref(), Some("2.2.2.2"));

        let map = headers(&[("x-real-ip", "1.1.1.1"), ("cf-connecting-ip", "2.2.2.2")]);
        assert_eq!(client_key(&map).as_deref(), Some("1.1.1.1"));

        let map = headers(&[("x-client-ip", "3.3.3.3")]);
        assert_eq!(client_key(&map).as_deref(), Some("3.3.3.3"));
    }

    #[test]
    fn no_headers_means_no_key() {
        assert_eq!(client_key(&HeaderMap::new()), None);
    }
}
