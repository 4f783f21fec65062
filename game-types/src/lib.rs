pub mod duel;
pub mod errors;
pub mod game;
pub mod theme;
pub mod user;

// Re-export all types
pub use duel::*;
pub use errors::*;
pub use game::*;
pub use theme::*;
pub use user::*;

pub type UserId = i32;
pub type CardId = i32;
pub type GameId = i32;
pub type RoundId = i32;
pub type DuelId = i32;
pub type WeeklyEventId = i32;
