//! Shared helpers for engine integration tests

#![allow(dead_code)]

use healthcheck::{Checker, Config, HealthEngine, ProbeOutcome, ProbeSet, Service};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Replays scripted outcomes per service name; unscripted checks succeed
#[derive(Default)]
pub struct ScriptedChecker {
    scripts: Mutex<HashMap<String, VecDeque<bool>>>,
}

impl ScriptedChecker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, service_name: &str, outcomes: impl IntoIterator<Item = bool>) {
        self.scripts.lock().unwrap().entry(service_name.to_string()).or_default().extend(outcomes);
    }
}

#[async_trait::async_trait]
impl Checker for ScriptedChecker {
    async fn check(&self, service: &Service) -> ProbeOutcome {
        let success = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&service.name)
            .and_then(VecDeque::pop_front)
            .unwrap_or(true);

        let outcome = if success { ProbeOutcome::up() } else { ProbeOutcome::down() };
        outcome.with_duration(5)
    }
}

/// Config with a short interval so scheduler tests finish quickly
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.engine.check_interval = Duration::from_millis(25);
    config.engine.check_timeout = Duration::from_millis(500);
    config
}

pub fn scripted_engine() -> (HealthEngine, Arc<ScriptedChecker>) {
    let checker = ScriptedChecker::new();
    let engine = HealthEngine::with_probes(fast_config(), ProbeSet::uniform(checker.clone())).unwrap();
    (engine, checker)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}
