pub mod archetype;
pub mod classifier;
pub mod composition;
pub mod ensemble;
pub mod features;
pub mod matrix;
pub mod recommender;
pub mod simulation;
pub mod store;
