use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::context::PlayContext;
use crate::error::{EngineError, EngineResult};
use game_core::{GamePlan, ScoringEngine, generate_join_code, normalize_join_code, theme_for_round};
use game_persistence::repositories::{
    CardRepository, Debited, DuelRecord, DuelRepository, GameRepository, JoinOutcome, NewDuel,
};
use game_types::{
    CardId, DuelId, DuelResult, DuelStatus, DuelTicket, DuelView, GameError, GameMode, UserId,
};

const JOIN_CODE_ATTEMPTS: usize = 10;

/// Pairs two duel games over one shared card sequence and settles the outcome.
pub struct DuelCoordinator {
    duels: DuelRepository,
    games: GameRepository,
    cards: CardRepository,
    config: Arc<Config>,
}

impl DuelCoordinator {
    pub fn new(db: DatabaseConnection, config: Arc<Config>) -> Self {
        Self {
            duels: DuelRepository::new(db.clone()),
            games: GameRepository::new(db.clone()),
            cards: CardRepository::new(db),
            config,
        }
    }

    async fn load(&self, duel_id: DuelId) -> EngineResult<DuelRecord> {
        self.duels
            .find_by_id(duel_id)
            .await?
            .ok_or_else(|| GameError::not_found("Duel", duel_id).into())
    }

    /// Open a duel and the creator's game. The creator may start playing while waiting.
    pub async fn create<S: AsRef<str>>(
        &self,
        ctx: &PlayContext,
        themes: &[S],
        rounds_count: Option<i32>,
        difficulty: Option<i32>,
        now: DateTime<Utc>,
    ) -> EngineResult<DuelTicket> {
        let user_id = ctx.require_user()?;
        let plan = GamePlan::new(
            GameMode::Duel,
            rounds_count.unwrap_or(self.config.default_rounds),
            themes,
        )?;

        let code = self.unused_join_code().await?;
        let new_duel = NewDuel {
            code,
            creator_id: user_id,
            themes: plan.themes,
            rounds_count: plan.rounds_count,
            difficulty,
        };

        match self
            .duels
            .create_duel(&new_duel, self.config.duel_entry_cost, now)
            .await?
        {
            Debited::Done((duel, game)) => Ok(DuelTicket {
                duel: duel.to_view(),
                game_id: game.id,
            }),
            Debited::InsufficientFunds {
                required,
                available,
            } => {
                warn!(
                    "User {} cannot afford duel entry ({} < {})",
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

    async fn unused_join_code(&self) -> EngineResult<String> {
        for _ in 0..JOIN_CODE_ATTEMPTS {
            let code = generate_join_code();
            if !self.duels.code_exists(&code).await? {
                return Ok(code);
            }
            debug!("Join code {} already taken, drawing another", code);
        }
        Err(EngineError::Storage(anyhow::anyhow!(
            "Could not find an unused join code after {} attempts",
            JOIN_CODE_ATTEMPTS
        )))
    }

    /// Take the opponent seat of a waiting duel. A code can be used once.
    pub async fn join(
        &self,
        ctx: &PlayContext,
        code: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<DuelTicket> {
        let user_id = ctx.require_user()?;
        let code = normalize_join_code(code);
        let not_joinable = || GameError::DuelNotJoinable { code: code.clone() };

        let duel = self.duels.find_by_code(&code).await?.ok_or_else(not_joinable)?;
        if duel.status != DuelStatus::Waiting || duel.creator_id == user_id {
            warn!("User {} refused entry to duel {} ({:?})", user_id, duel.id, duel.status);
            return Err(not_joinable().into());
        }

        match self
            .duels
            .join_duel(duel.id, user_id, self.config.duel_entry_cost, now)
            .await?
        {
            JoinOutcome::Joined { duel, game } => Ok(DuelTicket {
                duel: duel.to_view(),
                game_id: game.id,
            }),
            JoinOutcome::NotJoinable => {
                warn!("Duel {} was taken before user {} could join", duel.id, user_id);
                Err(not_joinable().into())
            }
            JoinOutcome::InsufficientFunds {
                required,
                available,
            } => Err(GameError::InsufficientFunds {
                required,
                available,
            }
            .into()),
        }
    }

    /// The duel held in the context, visible to its participants only.
    pub async fn view(&self, ctx: &PlayContext) -> EngineResult<DuelView> {
        let user_id = ctx.require_user()?;
        let duel_id = ctx.require_duel()?;
        let duel = self.load(duel_id).await?;
        if !duel.is_participant(user_id) {
            return Err(GameError::not_found("Duel", duel_id).into());
        }
        Ok(duel.to_view())
    }

    /// The duel's card for every round, drawn by the first caller and fixed afterwards.
    pub async fn ensure_card_sequence(&self, duel_id: DuelId) -> EngineResult<Vec<CardId>> {
        let duel = self.load(duel_id).await?;
        if let Some(sequence) = duel.card_sequence {
            return Ok(sequence);
        }

        let mut drawn: Vec<CardId> = Vec::new();
        for number in 1..=duel.rounds_count {
            let theme = theme_for_round(&duel.themes, number)
                .ok_or_else(|| GameError::invalid_state("duel has no themes"))?;
            let card = self
                .cards
                .random_for_theme(theme, duel.difficulty, &drawn)
                .await?
                .ok_or_else(|| {
                    warn!("No card available for duel {} theme '{}'", duel_id, theme);
                    GameError::NoCardAvailable {
                        theme: theme.to_string(),
                    }
                })?;
            drawn.push(card.id);
        }

        if self.duels.freeze_card_sequence(duel_id, &drawn).await? {
            info!("Froze card sequence for duel {}: {:?}", duel_id, drawn);
            return Ok(drawn);
        }

        // Another participant froze first; theirs is the deck
        debug!("Duel {} deck was frozen concurrently, reusing it", duel_id);
        self.load(duel_id)
            .await?
            .card_sequence
            .ok_or_else(|| anyhow::anyhow!("Duel {} lost its card sequence", duel_id).into())
    }

    pub async fn card_for_round(&self, duel_id: DuelId, number: i32) -> EngineResult<CardId> {
        let sequence = self.ensure_card_sequence(duel_id).await?;
        usize::try_from(number - 1)
            .ok()
            .and_then(|index| sequence.get(index).copied())
            .ok_or_else(|| {
                GameError::invalid_input(format!(
                    "duel {} has no round {}",
                    duel_id, number
                ))
                .into()
            })
    }

    async fn latest_score(&self, duel_id: DuelId, user_id: UserId) -> EngineResult<Option<i32>> {
        let game = self.games.latest_for_duel(duel_id, user_id).await?;
        Ok(game.filter(|g| g.is_finished()).map(|g| g.score))
    }

    /// Settle the duel once both participants' games are finished.
    ///
    /// Safe to call from either side, any number of times.
    pub async fn check_completion(
        &self,
        duel_id: DuelId,
        now: DateTime<Utc>,
    ) -> EngineResult<DuelResult> {
        let duel = self.load(duel_id).await?;
        let Some(opponent_id) = duel.opponent_id else {
            return Ok(DuelResult::StillWaiting);
        };

        if duel.status == DuelStatus::Finished {
            let snapshots = self.duels.scores_for_duel(duel_id).await?;
            let snapshot_of = |user_id: UserId| {
                snapshots
                    .iter()
                    .find(|(id, _)| *id == user_id)
                    .map(|(_, score)| *score)
            };
            if let (Some(creator_score), Some(opponent_score)) =
                (snapshot_of(duel.creator_id), snapshot_of(opponent_id))
            {
                return Ok(ScoringEngine::duel_result(
                    duel.creator_id,
                    creator_score,
                    opponent_id,
                    opponent_score,
                ));
            }
        }

        let creator_score = self.latest_score(duel_id, duel.creator_id).await?;
        let opponent_score = self.latest_score(duel_id, opponent_id).await?;
        let (Some(creator_score), Some(opponent_score)) = (creator_score, opponent_score) else {
            debug!("Duel {} still waiting on a participant", duel_id);
            return Ok(DuelResult::StillWaiting);
        };

        let scores = [(duel.creator_id, creator_score), (opponent_id, opponent_score)];
        if self.duels.finish_duel(duel_id, &scores, now).await? {
            info!(
                "Duel {} finished: {} scored {}, {} scored {}",
                duel_id, duel.creator_id, creator_score, opponent_id, opponent_score
            );
        }

        Ok(ScoringEngine::duel_result(
            duel.creator_id,
            creator_score,
            opponent_id,
            opponent_score,
        ))
    }
}
