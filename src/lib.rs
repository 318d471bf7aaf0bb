pub mod api;
pub mod audio;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod router;
pub mod shortcuts;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{AccountApi, HttpGateway, StudyApi};
pub use config::{ClientConfig, StudySettings};
pub use engine::{EngineEvent, EngineState, StudyEngine};
pub use error::{ApiError, ApiErrorKind, ApiResult};
pub use router::{Screen, ScreenRouter};
pub use store::ClientStore;
