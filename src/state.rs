use crate::config::Config;
use crate::mailer::Mailer;
use crate::rate_limit::RateLimiter;
use crate::store::Store;

/// App's shared state, built once in `main` and handed to every handler
/// behind an `Arc`. Holding the rate limiter here (instead of a static)
/// keeps the dependency visible and lets tests build fresh instances.
pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub mailer: Option<Mailer>,
    pub limiter: RateLimiter,
}
