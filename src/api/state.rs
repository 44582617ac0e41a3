use std::sync::Arc;

use sqlx::{Pool, Sqlite};

use crate::config::Config;
use crate::matching::Matchmaker;
use crate::relay::RelayHub;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub config: Arc<Config>,
    pub matchmaker: Matchmaker,
    pub relay: Arc<RelayHub>,
}

impl AppState {
    pub fn new(db: Pool<Sqlite>, config: Arc<Config>) -> Self {
        let matchmaker = Matchmaker::new(db.clone(), config.match_write_mode);
        Self {
            db,
            config,
            matchmaker,
            relay: Arc::new(RelayHub::new()),
        }
    }
}
