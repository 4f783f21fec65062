pub use super::cards::Entity as Cards;
pub use super::duel_scores::Entity as DuelScores;
pub use super::duels::Entity as Duels;
pub use super::games::Entity as Games;
pub use super::rounds::Entity as Rounds;
pub use super::users::Entity as Users;
pub use super::weekly_events::Entity as WeeklyEvents;
pub use super::weekly_scores::Entity as WeeklyScores;
