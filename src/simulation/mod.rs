//! The ballistic simulation: entity storage, pair policy, frame pipeline and the
//! demo scene built on top of them.

pub mod pairs;
pub mod pipeline;
pub mod scene;
pub mod spawner;
pub mod world;

pub use pairs::{candidate_pairs, collect_candidate_pairs, CandidatePair, Participant};
pub use pipeline::{FramePipeline, FrameReport, SimulationConfig};
pub use scene::{BallisticApp, BallisticScene};
pub use spawner::{ProjectileTemplate, Spawner};
pub use world::{EntityRole, SimulationWorld};
