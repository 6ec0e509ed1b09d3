//! Draft recommendation and win projection over a fuzzy archetype model.

pub mod analysis;
pub mod api;
pub mod cache;
pub mod config;
pub mod display;
pub mod draft;
pub mod engine;
pub mod error;
pub mod names;

pub use api::service::DraftService;
pub use config::Config;
pub use draft::{DraftState, Pick, Role, SlotRequest, Team};
pub use engine::DraftEngine;
pub use error::DraftError;
