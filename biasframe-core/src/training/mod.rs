//! Training infrastructure — fit loop, early stopping, history, seeding.

pub mod callbacks;
pub mod history;
pub mod reproducibility;
pub mod runner;

pub use callbacks::{CallbackAction, EarlyStopping};
pub use history::{EpochRecord, SELECTION_METRIC, TrainingHistory};
pub use reproducibility::SeedManager;
pub use runner::TrainingRunner;
