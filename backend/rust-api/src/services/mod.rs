use crate::config::Config;

pub mod claim_store;
pub mod claim_validator;
pub mod game_api_client;
pub mod game_controller;
pub mod session_service;
pub mod submission;
pub mod timer;

use session_service::SessionService;

pub struct AppState {
    pub config: Config,
    pub sessions: SessionService,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            sessions: SessionService::new(),
        }
    }
}
