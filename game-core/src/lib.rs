pub mod answer_matching;
pub mod game_state;
pub mod join_code;
pub mod progression;
pub mod round_state;
pub mod scoring;

// Re-export main components
pub use answer_matching::*;
pub use game_state::*;
pub use join_code::*;
pub use progression::*;
pub use round_state::*;
pub use scoring::*;
