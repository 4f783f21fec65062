pub mod card_repository;
pub mod duel_repository;
pub mod game_repository;
pub mod round_repository;
pub mod user_repository;
pub mod weekly_repository;

pub use card_repository::*;
pub use duel_repository::*;
pub use game_repository::*;
pub use round_repository::*;
pub use user_repository::*;
pub use weekly_repository::*;

/// Outcome of a write that is paid for with coins in the same transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Debited<T> {
    Done(T),
    InsufficientFunds { required: i32, available: i32 },
}
