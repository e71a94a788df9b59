pub mod agent;
pub mod brain;
pub mod error;
pub mod fitness;
pub mod genetic;
pub mod sensors;
pub mod simulation;
pub mod world;

pub use agent::{Agent, AgentState, Holdings};
pub use brain::Brain;
pub use error::SimError;
pub use fitness::fitness;
pub use genetic::evolve;
pub use sensors::{perceive, Action, Move};
pub use simulation::{
    CancelToken, GenerationOutcome, NullObserver, Observer, Phase, RenderSnapshot, RunSummary,
    Simulation, TickStatus,
};
pub use world::{DoorKind, Effects, KeyColor, Pond, PuzzleEvent, Tile, World};
