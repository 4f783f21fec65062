pub mod prelude;

pub mod cards;
pub mod duel_scores;
pub mod duels;
pub mod games;
pub mod rounds;
pub mod users;
pub mod weekly_events;
pub mod weekly_scores;
