pub mod constants;
pub mod error;
pub mod math;
pub mod player;
pub mod portal;
pub mod quad;
pub mod simulation;
pub mod transform;
