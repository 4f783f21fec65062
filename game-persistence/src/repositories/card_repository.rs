use anyhow::{Result, anyhow};
use rand::seq::IndexedRandom;
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::decode_json;
use crate::entities::{cards, prelude::*};
use game_types::CardId;

/// A playable card with its hints in author order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    pub id: CardId,
    pub theme: String,
    pub title: String,
    pub answer: String,
    pub hints: Vec<String>,
    pub difficulty: i32,
}

/// An authored card as supplied to [`CardRepository::import_cards`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCard {
    pub theme: String,
    pub title: String,
    pub answer: String,
    pub hints: Vec<String>,
    #[serde(default = "default_difficulty")]
    pub difficulty: i32,
}

fn default_difficulty() -> i32 {
    1
}

pub struct CardRepository {
    db: DatabaseConnection,
}

impl CardRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_card(model: cards::Model) -> Result<CardRecord> {
        Ok(CardRecord {
            hints: decode_json("cards.hints_json", &model.hints_json)?,
            id: model.id,
            theme: model.theme,
            title: model.title,
            answer: model.answer,
            difficulty: model.difficulty,
        })
    }

    pub async fn find_by_id(&self, id: CardId) -> Result<Option<CardRecord>> {
        Cards::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Self::model_to_card)
            .transpose()
    }

    /// Pick a random card for `theme`, preferring ones not in `exclude`.
    ///
    /// `difficulty: None` accepts any difficulty. Returns `None` when the theme
    /// has no cards at all.
    pub async fn random_for_theme(
        &self,
        theme: &str,
        difficulty: Option<i32>,
        exclude: &[CardId],
    ) -> Result<Option<CardRecord>> {
        let mut query = Cards::find().filter(cards::Column::Theme.eq(theme));
        if let Some(difficulty) = difficulty {
            query = query.filter(cards::Column::Difficulty.eq(difficulty));
        }
        let candidates = query.all(&self.db).await?;

        let fresh: Vec<&cards::Model> = candidates
            .iter()
            .filter(|card| !exclude.contains(&card.id))
            .collect();

        let picked = {
            let mut rng = rand::rng();
            if fresh.is_empty() {
                candidates.choose(&mut rng).cloned()
            } else {
                fresh.choose(&mut rng).map(|card| (*card).clone())
            }
        };

        picked.map(Self::model_to_card).transpose()
    }

    pub async fn count_for_theme(&self, theme: &str) -> Result<u64> {
        let count = Cards::find()
            .filter(cards::Column::Theme.eq(theme))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    /// Insert authored cards in one transaction; any invalid card aborts the batch.
    pub async fn import_cards(&self, cards_to_import: Vec<NewCard>) -> Result<usize> {
        for card in &cards_to_import {
            if card.answer.trim().is_empty() {
                return Err(anyhow!("Card '{}' has an empty answer", card.title));
            }
            if card.hints.is_empty() {
                return Err(anyhow!("Card '{}' has no hints", card.title));
            }
        }

        let txn = self.db.begin().await?;
        let count = cards_to_import.len();
        for card in cards_to_import {
            let model = cards::ActiveModel {
                id: ActiveValue::NotSet,
                theme: ActiveValue::Set(card.theme),
                title: ActiveValue::Set(card.title),
                answer: ActiveValue::Set(card.answer),
                hints_json: ActiveValue::Set(serde_json::to_string(&card.hints)?),
                difficulty: ActiveValue::Set(card.difficulty),
            };
            Cards::insert(model).exec(&txn).await?;
        }
        txn.commit().await?;

        tracing::info!("Imported {} cards", count);
        Ok(count)
    }
}
