use crate::config::Config;
use crate::engine::GameEngine;
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub engine: GameEngine,
    pub config: Config,
}

impl FromRef<AppState> for GameEngine {
    fn from_ref(state: &AppState) -> Self {
        state.engine.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
