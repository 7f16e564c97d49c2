//! Scene state reconciliation

pub mod scene_log;

pub use scene_log::{PlacementSession, SceneMutationLog};
