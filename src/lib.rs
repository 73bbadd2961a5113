mod checkpoint;
mod config;
mod constants;
mod errors;
mod event;
mod factory;
mod lease;
mod metrics;
mod storage;
mod watcher;
pub mod utils;

pub use checkpoint::*;
pub use config::*;
pub use errors::*;
pub use event::*;
pub use factory::*;
pub use lease::*;
pub use metrics::*;
pub use storage::*;
pub use utils::*;
pub use watcher::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
//-----------------------------------------------------------
// Autometrics
/// autometrics: https://docs.autometrics.dev/rust/adding-alerts-and-slos
use autometrics::objectives::Objective;
use autometrics::objectives::ObjectiveLatency;
use autometrics::objectives::ObjectivePercentile;
const API_SLO: Objective = Objective::new("api")
    .success_rate(ObjectivePercentile::P99_9)
    .latency(ObjectiveLatency::Ms10, ObjectivePercentile::P99);
