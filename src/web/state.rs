use crate::services::mail::{LogMailer, Mailer};
use crate::services::posts::latest_slug_suffix;
use crate::services::slug::SlugClock;
use crate::web::security::RateLimiter;
use crate::{Config, Database};
use anyhow::Result;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub slugs: SlugClock,
    pub mailer: Arc<dyn Mailer>,
    pub rate_limiter: Arc<RateLimiter>,
    pub session_days: i64,
}

impl AppState {
    pub fn new(config: Config, db: Database) -> Result<Self> {
        let session_days = config.auth.session_days()?;
        let mailer = Arc::new(LogMailer::new(config.mail.from.clone()));
        let slugs = SlugClock::starting_after(latest_slug_suffix(&db)?);
        Ok(Self {
            config,
            db,
            slugs,
            mailer,
            rate_limiter: Arc::new(RateLimiter::default()),
            session_days,
        })
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }
}
