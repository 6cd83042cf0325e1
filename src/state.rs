use std::sync::Arc;

use crate::browser::{Catalog, ViewRegistry};
use crate::config::Config;
use crate::db::RecordSource;
use crate::rate_limit::LoginRateLimiter;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub source: Arc<dyn RecordSource>,
    pub catalog: Catalog,
    pub views: ViewRegistry,
    pub login_limiter: LoginRateLimiter,
}
