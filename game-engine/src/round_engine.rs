use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::duel_coordinator::DuelCoordinator;
use crate::error::{EngineError, EngineResult};
use game_core::{RoundState, RoundTransition, theme_for_round};
use game_persistence::repositories::{
    CardRecord, CardRepository, GameRecord, HintPurchase, NewRound, RoundRecord, RoundRepository,
    RoundResult,
};
use game_types::{GameError, GameMode, RoundId, RoundView, UserId};

const CLOSE_ATTEMPTS: usize = 5;

/// A round together with the card it is played against.
#[derive(Debug, Clone)]
pub struct PlayedRound {
    pub round: RoundRecord,
    pub card: CardRecord,
}

impl PlayedRound {
    pub fn state(&self) -> RoundState {
        RoundState {
            requested_hints: self.round.requested_hints,
            extra_hint_used: self.round.extra_hint_used,
            user_guess: self.round.user_guess.clone(),
            points: self.round.points,
            finished: self.round.finished,
            started_at: self.round.started_at,
            ends_at: self.round.ends_at,
            hint_order: self.round.hint_order.clone(),
        }
    }

    /// What the player may see of this round at `now`.
    pub fn view(&self, game: &GameRecord, now: DateTime<Utc>) -> RoundView {
        let state = self.state();
        let answer_revealed = state.answer_revealed();
        RoundView {
            game_id: game.id,
            round_id: self.round.id,
            number: self.round.number,
            rounds_count: game.rounds_count,
            theme: self.card.theme.clone(),
            hints: state
                .revealed_hints(&self.card.hints)
                .into_iter()
                .map(str::to_string)
                .collect(),
            requested_hints: state.requested_hints,
            extra_hint_used: state.extra_hint_used,
            seconds_remaining: state.seconds_remaining(now),
            finished: state.finished,
            answer_revealed,
            answer: answer_revealed.then(|| self.card.answer.clone()),
            user_guess: state.user_guess.clone(),
            points: state.points,
            potential_points: state.potential_points(),
            game_score: game.score,
        }
    }
}

/// Creates, serves and closes single rounds.
pub struct RoundEngine {
    rounds: RoundRepository,
    cards: CardRepository,
    duels: Arc<DuelCoordinator>,
    config: Arc<Config>,
}

impl RoundEngine {
    pub fn new(db: DatabaseConnection, duels: Arc<DuelCoordinator>, config: Arc<Config>) -> Self {
        Self {
            rounds: RoundRepository::new(db.clone()),
            cards: CardRepository::new(db),
            duels,
            config,
        }
    }

    async fn card(&self, card_id: i32) -> EngineResult<CardRecord> {
        Ok(self
            .cards
            .find_by_id(card_id)
            .await?
            .ok_or_else(|| GameError::not_found("Card", card_id))?)
    }

    async fn reload(&self, played: &PlayedRound) -> EngineResult<PlayedRound> {
        let round = self
            .rounds
            .find_by_id(played.round.id)
            .await?
            .ok_or_else(|| GameError::not_found("Round", played.round.id))?;
        Ok(PlayedRound {
            round,
            card: played.card.clone(),
        })
    }

    /// Duel games take their card from the shared sequence, other games draw
    /// one for the round's theme, avoiding cards this game already used.
    async fn pick_card(&self, game: &GameRecord, number: i32) -> EngineResult<CardRecord> {
        if game.mode == GameMode::Duel {
            let duel_id = game
                .duel_id
                .ok_or_else(|| GameError::invalid_state("duel game without a duel"))?;
            let card_id = self.duels.card_for_round(duel_id, number).await?;
            return self.card(card_id).await;
        }

        let theme = theme_for_round(&game.themes, number)
            .ok_or_else(|| GameError::invalid_state("game has no themes"))?;
        let used: Vec<i32> = self
            .rounds
            .list_for_game(game.id)
            .await?
            .iter()
            .map(|round| round.card_id)
            .collect();

        match self
            .cards
            .random_for_theme(theme, game.difficulty, &used)
            .await?
        {
            Some(card) => Ok(card),
            None => {
                warn!("No card available for game {} theme '{}'", game.id, theme);
                Err(GameError::NoCardAvailable {
                    theme: theme.to_string(),
                }
                .into())
            }
        }
    }

    /// The round in slot `number`, created on first request.
    ///
    /// When no card can be found nothing is written.
    pub async fn get_or_create_round(
        &self,
        game: &GameRecord,
        number: i32,
        now: DateTime<Utc>,
    ) -> EngineResult<PlayedRound> {
        if let Some(round) = self.rounds.find_by_game_and_number(game.id, number).await? {
            let card = self.card(round.card_id).await?;
            return Ok(PlayedRound { round, card });
        }

        let card = self.pick_card(game, number).await?;
        let state = {
            let mut rng = rand::rng();
            RoundState::start(card.hints.len(), now, self.config.round_duration(), &mut rng)
        };

        let new_round = NewRound {
            game_id: game.id,
            number,
            card_id: card.id,
            hint_order: state.hint_order,
            started_at: state.started_at,
            ends_at: state.ends_at,
        };
        let round = self.rounds.insert_if_absent(&new_round).await?;

        if round.card_id != card.id {
            // Lost the race for the slot; serve the round that won it
            let card = self.card(round.card_id).await?;
            return Ok(PlayedRound { round, card });
        }

        info!(
            "Created round {} of game {} with card {}",
            number, game.id, card.id
        );
        Ok(PlayedRound { round, card })
    }

    /// A round by id, provided it belongs to `game`.
    pub async fn round_of_game(
        &self,
        game: &GameRecord,
        round_id: RoundId,
    ) -> EngineResult<PlayedRound> {
        let round = match self.rounds.find_by_id(round_id).await? {
            Some(round) if round.game_id == game.id => round,
            _ => return Err(GameError::not_found("Round", round_id).into()),
        };
        let card = self.card(round.card_id).await?;
        Ok(PlayedRound { round, card })
    }

    pub async fn reveal_next_hint(&self, played: &PlayedRound) -> EngineResult<PlayedRound> {
        let mut state = played.state();
        let expected = state.requested_hints;

        match state.reveal_next_hint(self.config.max_hints) {
            RoundTransition::HintRevealed { requested_hints } => {
                if !self
                    .rounds
                    .set_requested_hints(played.round.id, expected, requested_hints)
                    .await?
                {
                    debug!("Hint request on round {} raced another writer", played.round.id);
                }
                self.reload(played).await
            }
            _ => {
                debug!("No hint revealed on round {}", played.round.id);
                Ok(played.clone())
            }
        }
    }

    /// Buy the one paid hint of the round.
    pub async fn buy_extra_hint(
        &self,
        played: &PlayedRound,
        user_id: UserId,
    ) -> EngineResult<PlayedRound> {
        played.state().check_extra_hint_purchase()?;

        let cost = self.config.hint_cost;
        match self
            .rounds
            .purchase_extra_hint(played.round.id, user_id, cost)
            .await?
        {
            HintPurchase::Purchased => {
                info!(
                    "User {} bought the extra hint of round {} for {} coins",
                    user_id, played.round.id, cost
                );
                self.reload(played).await
            }
            HintPurchase::AlreadyUsed => Err(GameError::AlreadyUsed.into()),
            HintPurchase::RoundFinished => {
                Err(GameError::invalid_state("round is already finished").into())
            }
            HintPurchase::InsufficientFunds {
                required,
                available,
            } => {
                warn!(
                    "User {} cannot afford the extra hint ({} < {})",
                    user_id, available, required
                );
                Err(GameError::InsufficientFunds {
                    required,
                    available,
                }
                .into())
            }
        }
    }

    pub async fn submit_guess(&self, played: &PlayedRound, raw_guess: &str) -> EngineResult<PlayedRound> {
        let answer = played.card.answer.clone();
        self.close(played, |state| state.submit_guess(raw_guess, &answer))
            .await
    }

    pub async fn submit_skip(&self, played: &PlayedRound) -> EngineResult<PlayedRound> {
        self.close(played, RoundState::submit_skip).await
    }

    /// Lazy deadline check, run on every read of an open round.
    pub async fn expire_if_past_deadline(
        &self,
        played: &PlayedRound,
        now: DateTime<Utc>,
    ) -> EngineResult<PlayedRound> {
        self.close(played, |state| state.expire_if_past_deadline(now))
            .await
    }

    /// Apply a finishing action and persist it. When a hint request lands
    /// between the read and the write, the action is re-applied to the fresh
    /// round so the score always matches the hints actually revealed.
    async fn close<F>(&self, played: &PlayedRound, apply: F) -> EngineResult<PlayedRound>
    where
        F: Fn(&mut RoundState) -> RoundTransition,
    {
        let mut current = played.clone();
        for _ in 0..CLOSE_ATTEMPTS {
            let mut state = current.state();
            let transition = apply(&mut state);
            if !transition.finishes_round() {
                return Ok(current);
            }

            let outcome = RoundResult {
                requested_hints: state.requested_hints,
                user_guess: state.user_guess.clone(),
                points: state.points,
            };
            if self.rounds.finish_round(&current.round, &outcome).await? {
                info!(
                    "Round {} of game {} finished ({:?})",
                    current.round.number, current.round.game_id, transition
                );
                return self.reload(&current).await;
            }

            current = self.reload(&current).await?;
            if current.round.finished {
                debug!("Round {} was already finished", current.round.id);
                return Ok(current);
            }
            debug!(
                "Round {} changed before it could be closed, retrying",
                current.round.id
            );
        }

        Err(EngineError::Storage(anyhow::anyhow!(
            "Round {} kept changing while being closed",
            played.round.id
        )))
    }

    pub async fn rounds_for_game(&self, game: &GameRecord) -> EngineResult<Vec<PlayedRound>> {
        let mut played = Vec::new();
        for round in self.rounds.list_for_game(game.id).await? {
            let card = self.card(round.card_id).await?;
            played.push(PlayedRound { round, card });
        }
        Ok(played)
    }

    pub async fn count_finished(&self, game: &GameRecord) -> EngineResult<usize> {
        self.rounds
            .count_finished(game.id)
            .await
            .map_err(EngineError::from)
    }
}
