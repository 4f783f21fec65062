use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::context::PlayContext;
use crate::duel_coordinator::DuelCoordinator;
use crate::error::EngineResult;
use crate::progression::ProgressionLedger;
use crate::round_engine::{PlayedRound, RoundEngine};
use game_core::{GamePlan, current_round_number, is_game_complete};
use game_persistence::repositories::{Debited, GameRecord, GameRepository, NewGame};
use game_types::{
    Advance, GameError, GameId, GameMode, GameOutcome, GameSummary, RoundSummary, RoundView,
    THEMES, UserId, WeeklyEventId,
};

/// Sequences rounds into games and settles finished games by mode.
pub struct GameEngine {
    games: GameRepository,
    rounds: RoundEngine,
    duels: Arc<DuelCoordinator>,
    ledger: Arc<ProgressionLedger>,
    config: Arc<Config>,
}

impl GameEngine {
    pub fn new(
        db: DatabaseConnection,
        duels: Arc<DuelCoordinator>,
        ledger: Arc<ProgressionLedger>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            games: GameRepository::new(db.clone()),
            rounds: RoundEngine::new(db, duels.clone(), config.clone()),
            duels,
            ledger,
            config,
        }
    }

    /// Games are only visible to their owner; anyone else gets `NotFound`.
    async fn owned_game(&self, user_id: UserId, game_id: GameId) -> EngineResult<GameRecord> {
        match self.games.find_by_id(game_id).await? {
            Some(game) if game.user_id == user_id => Ok(game),
            _ => Err(GameError::not_found("Game", game_id).into()),
        }
    }

    async fn reload(&self, game: &GameRecord) -> EngineResult<GameRecord> {
        Ok(self
            .games
            .find_by_id(game.id)
            .await?
            .ok_or_else(|| GameError::not_found("Game", game.id))?)
    }

    async fn start(
        &self,
        user_id: UserId,
        plan: GamePlan,
        difficulty: Option<i32>,
        weekly_event_id: Option<WeeklyEventId>,
        now: DateTime<Utc>,
    ) -> EngineResult<GameId> {
        let new_game = NewGame {
            user_id,
            mode: plan.mode,
            rounds_count: plan.rounds_count,
            themes: plan.themes,
            difficulty,
            duel_id: None,
            weekly_event_id,
        };

        match self
            .games
            .create_game(&new_game, self.config.game_entry_cost, now)
            .await?
        {
            Debited::Done(game) => Ok(game.id),
            Debited::InsufficientFunds {
                required,
                available,
            } => {
                warn!(
                    "User {} cannot afford a {} game ({} < {})",
                    user_id,
                    new_game.mode.as_str(),
                    available,
                    required
                );
                Err(GameError::InsufficientFunds {
                    required,
                    available,
                }
                .into())
            }
        }
    }

    pub async fn start_solo<S: AsRef<str>>(
        &self,
        ctx: &PlayContext,
        themes: &[S],
        rounds_count: Option<i32>,
        difficulty: Option<i32>,
        now: DateTime<Utc>,
    ) -> EngineResult<GameId> {
        let user_id = ctx.require_user()?;
        let plan = GamePlan::new(
            GameMode::Solo,
            rounds_count.unwrap_or(self.config.default_rounds),
            themes,
        )?;
        self.start(user_id, plan, difficulty, None, now).await
    }

    /// Start today's attempt at the running weekly event, over every theme.
    pub async fn start_weekly(&self, ctx: &PlayContext, now: DateTime<Utc>) -> EngineResult<GameId> {
        let user_id = ctx.require_user()?;
        let today = now.date_naive();
        let event = self
            .ledger
            .active_weekly_event(today)
            .await?
            .ok_or_else(|| GameError::not_found("WeeklyEvent", today))?;

        let themes: Vec<&str> = THEMES.iter().map(|(key, _)| *key).collect();
        let plan = GamePlan::new(GameMode::Weekly, self.config.default_rounds, &themes)?;
        self.start(user_id, plan, None, Some(event.id), now).await
    }

    pub async fn current_round_number(&self, game: &GameRecord) -> EngineResult<i32> {
        Ok(current_round_number(self.rounds.count_finished(game).await?))
    }

    /// Serve the current round, or finish the game once every round is done.
    pub async fn advance(&self, ctx: &PlayContext, now: DateTime<Utc>) -> EngineResult<Advance> {
        let user_id = ctx.require_user()?;
        let game = self.owned_game(user_id, ctx.require_game()?).await?;

        let finished_rounds = self.rounds.count_finished(&game).await?;
        if game.is_finished() || is_game_complete(finished_rounds, game.rounds_count) {
            let outcome = self.finish_game(&game, now).await?;
            return Ok(Advance::Finished(outcome));
        }

        let number = current_round_number(finished_rounds);
        let played = self.rounds.get_or_create_round(&game, number, now).await?;
        let played = self.rounds.expire_if_past_deadline(&played, now).await?;
        self.present(&game, &played, now).await.map(Advance::Round)
    }

    async fn present(
        &self,
        game: &GameRecord,
        played: &PlayedRound,
        now: DateTime<Utc>,
    ) -> EngineResult<RoundView> {
        let game = self.reload(game).await?;
        Ok(played.view(&game, now))
    }

    /// The round an action applies to, after its deadline check: the round the
    /// client names in the context, otherwise the game's current round.
    async fn open_round(
        &self,
        ctx: &PlayContext,
        now: DateTime<Utc>,
    ) -> EngineResult<(GameRecord, PlayedRound)> {
        let user_id = ctx.require_user()?;
        let game = self.owned_game(user_id, ctx.require_game()?).await?;

        if let Some(round_id) = ctx.active_round {
            let played = self.rounds.round_of_game(&game, round_id).await?;
            let played = self.rounds.expire_if_past_deadline(&played, now).await?;
            return Ok((game, played));
        }

        if game.is_finished() {
            return Err(GameError::invalid_state("game is already finished").into());
        }

        let finished_rounds = self.rounds.count_finished(&game).await?;
        if is_game_complete(finished_rounds, game.rounds_count) {
            return Err(GameError::invalid_state("game has no open round").into());
        }

        let number = current_round_number(finished_rounds);
        let played = self.rounds.get_or_create_round(&game, number, now).await?;
        let played = self.rounds.expire_if_past_deadline(&played, now).await?;
        Ok((game, played))
    }

    pub async fn request_hint(&self, ctx: &PlayContext, now: DateTime<Utc>) -> EngineResult<RoundView> {
        let (game, played) = self.open_round(ctx, now).await?;
        let played = self.rounds.reveal_next_hint(&played).await?;
        self.present(&game, &played, now).await
    }

    pub async fn buy_extra_hint(&self, ctx: &PlayContext, now: DateTime<Utc>) -> EngineResult<RoundView> {
        let (game, played) = self.open_round(ctx, now).await?;
        let played = self.rounds.buy_extra_hint(&played, game.user_id).await?;
        self.present(&game, &played, now).await
    }

    /// Submit a guess. A retry on an already finished round changes nothing.
    pub async fn guess(
        &self,
        ctx: &PlayContext,
        raw_guess: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<RoundView> {
        if raw_guess.trim().is_empty() {
            return Err(GameError::invalid_input("guess cannot be empty").into());
        }

        let (game, played) = self.open_round(ctx, now).await?;
        let was_finished = played.round.finished;
        let played = self.rounds.submit_guess(&played, raw_guess).await?;

        if !was_finished && played.round.points > 0 {
            self.ledger.recompute_level(game.user_id).await?;
        }
        self.present(&game, &played, now).await
    }

    pub async fn skip(&self, ctx: &PlayContext, now: DateTime<Utc>) -> EngineResult<RoundView> {
        let (game, played) = self.open_round(ctx, now).await?;
        let played = self.rounds.submit_skip(&played).await?;
        self.present(&game, &played, now).await
    }

    async fn finish_game(&self, game: &GameRecord, now: DateTime<Utc>) -> EngineResult<GameOutcome> {
        let newly_finished = !game.is_finished() && self.games.mark_finished(game.id, now).await?;
        if newly_finished {
            info!(
                "Game {} ({}) finished with {} points",
                game.id,
                game.mode.as_str(),
                game.score
            );
            self.ledger.recompute_level(game.user_id).await?;
        } else {
            debug!("Game {} already finished, re-deriving its outcome", game.id);
        }

        let game = self.reload(game).await?;
        self.finalize(&game, newly_finished, now).await
    }

    /// Mode-specific settlement. Side effects happen only on the call that
    /// finished the game; later calls just rebuild the outcome.
    async fn finalize(
        &self,
        game: &GameRecord,
        newly_finished: bool,
        now: DateTime<Utc>,
    ) -> EngineResult<GameOutcome> {
        match game.mode {
            GameMode::Solo => Ok(GameOutcome::Solo {
                game_id: game.id,
                score: game.score,
            }),
            GameMode::Weekly => {
                let event_id = game
                    .weekly_event_id
                    .ok_or_else(|| GameError::invalid_state("weekly game without an event"))?;
                let day = game.finished_at.unwrap_or(now).date_naive();
                if newly_finished {
                    self.ledger
                        .record_weekly_score(event_id, game.user_id, day, game.score, now)
                        .await?;
                }
                Ok(GameOutcome::Weekly {
                    game_id: game.id,
                    event_id,
                    day: day.to_string(),
                    score: game.score,
                })
            }
            GameMode::Duel => {
                let duel_id = game
                    .duel_id
                    .ok_or_else(|| GameError::invalid_state("duel game without a duel"))?;
                let result = self.duels.check_completion(duel_id, now).await?;
                Ok(GameOutcome::Duel {
                    game_id: game.id,
                    result,
                })
            }
        }
    }

    /// Per-round results of a finished game.
    pub async fn summary(&self, ctx: &PlayContext, game_id: GameId) -> EngineResult<GameSummary> {
        let user_id = ctx.require_user()?;
        let game = self.owned_game(user_id, game_id).await?;
        if !game.is_finished() {
            return Err(GameError::invalid_state("game is still in progress").into());
        }

        let rounds = self
            .rounds
            .rounds_for_game(&game)
            .await?
            .into_iter()
            .map(|played| RoundSummary {
                unanswered: played.state().unanswered(),
                number: played.round.number,
                theme: played.card.theme,
                answer: played.card.answer,
                user_guess: played.round.user_guess,
                points: played.round.points,
            })
            .collect();

        Ok(GameSummary {
            game_id: game.id,
            mode: game.mode,
            status: game.status,
            score: game.score,
            rounds,
            created_at: game.created_at.to_rfc3339(),
        })
    }
}
