mod test_helpers;

use chrono::Duration;
use game_engine::{Config, PlayContext};
use game_persistence::repositories::RoundRepository;
use game_types::{DuelResult, DuelStatus, GameError, GameOutcome};
use test_helpers::*;

const CLUBS: &[&str] = &["Flamengo", "Palmeiras", "Santos", "Grêmio", "Bahia", "Ceará"];

struct DuelSetup {
    setup: TestSetup,
    creator: PlayContext,
    opponent: PlayContext,
    duel_id: i32,
    code: String,
}

async fn joined_duel(rounds: i32) -> DuelSetup {
    let setup = TestSetup::new().await;
    setup.seed_cards("clube", CLUBS).await;
    let (_, creator) = setup.register("Creator").await;
    let (_, opponent) = setup.register("Opponent").await;
    let now = test_start_time();

    let ticket = setup
        .perfut
        .duels
        .create(&creator, &["clube"], Some(rounds), None, now)
        .await
        .unwrap();
    let joined = setup
        .perfut
        .duels
        .join(&opponent, &ticket.duel.code.to_lowercase(), now)
        .await
        .unwrap();
    assert_eq!(joined.duel.id, ticket.duel.id);

    DuelSetup {
        creator: creator.with_game(ticket.game_id).with_duel(ticket.duel.id),
        opponent: opponent.with_game(joined.game_id).with_duel(ticket.duel.id),
        duel_id: ticket.duel.id,
        code: ticket.duel.code,
        setup,
    }
}

#[tokio::test]
async fn test_create_and_join() {
    let setup = TestSetup::new().await;
    let (creator, creator_ctx) = setup.register("Alice").await;
    let (opponent, opponent_ctx) = setup.register("Bruno").await;
    let now = test_start_time();

    let ticket = setup
        .perfut
        .duels
        .create(&creator_ctx, &["clube", "estadio"], Some(4), None, now)
        .await
        .unwrap();
    assert_eq!(ticket.duel.status, DuelStatus::Waiting);
    assert_eq!(ticket.duel.creator_id, creator.id);
    assert_eq!(ticket.duel.code.len(), 6);
    assert_eq!(ticket.duel.themes, vec!["clube", "estadio"]);

    let joined = setup
        .perfut
        .duels
        .join(&opponent_ctx, &ticket.duel.code, now)
        .await
        .unwrap();
    assert_eq!(joined.duel.status, DuelStatus::Active);
    assert_eq!(joined.duel.opponent_id, Some(opponent.id));
    assert_ne!(joined.game_id, ticket.game_id);

    let view = setup
        .perfut
        .duels
        .view(&creator_ctx.with_duel(ticket.duel.id))
        .await
        .unwrap();
    assert_eq!(view.opponent_id, Some(opponent.id));
}

#[tokio::test]
async fn test_join_rejections() {
    let duel = joined_duel(2).await;
    let now = test_start_time();
    let (_, late) = duel.setup.register("Late").await;

    for (ctx, code) in [
        (&late, duel.code.as_str()),
        (&duel.creator, duel.code.as_str()),
        (&late, "ZZZZZZ"),
    ] {
        let err = duel.setup.perfut.duels.join(ctx, code, now).await.unwrap_err();
        assert!(
            matches!(err.game_error(), Some(GameError::DuelNotJoinable { .. })),
            "unexpected error: {:?}",
            err
        );
    }

    let err = duel
        .setup
        .perfut
        .duels
        .join(&PlayContext::anonymous(), &duel.code, now)
        .await
        .unwrap_err();
    assert_eq!(err.game_error(), Some(&GameError::NotAuthenticated));
}

#[tokio::test]
async fn test_creator_cannot_join_own_waiting_duel() {
    let setup = TestSetup::new().await;
    let (_, creator) = setup.register("Solo").await;
    let now = test_start_time();

    let ticket = setup
        .perfut
        .duels
        .create(&creator, &["clube"], Some(2), None, now)
        .await
        .unwrap();
    let err = setup
        .perfut
        .duels
        .join(&creator, &ticket.duel.code, now)
        .await
        .unwrap_err();
    assert!(matches!(err.game_error(), Some(GameError::DuelNotJoinable { .. })));
}

#[tokio::test]
async fn test_both_players_face_the_same_cards() {
    let duel = joined_duel(3).await;
    let now = test_start_time();
    let games = &duel.setup.perfut.games;

    // The opponent races ahead; the creator follows later
    for _ in 0..3 {
        games.advance(&duel.opponent, now).await.unwrap();
        games.skip(&duel.opponent, now).await.unwrap();
    }
    for _ in 0..3 {
        games.advance(&duel.creator, now).await.unwrap();
        games.skip(&duel.creator, now).await.unwrap();
    }

    let rounds = RoundRepository::new(duel.setup.db.clone());
    let creator_rounds = rounds
        .list_for_game(duel.creator.active_game.unwrap())
        .await
        .unwrap();
    let opponent_rounds = rounds
        .list_for_game(duel.opponent.active_game.unwrap())
        .await
        .unwrap();
    assert_eq!(creator_rounds.len(), 3);

    for (mine, theirs) in creator_rounds.iter().zip(&opponent_rounds) {
        assert_eq!(mine.number, theirs.number);
        assert_eq!(mine.card_id, theirs.card_id);
        assert_eq!(
            duel.setup
                .perfut
                .duels
                .card_for_round(duel.duel_id, mine.number)
                .await
                .unwrap(),
            mine.card_id
        );
    }

    let sequence = duel
        .setup
        .perfut
        .duels
        .ensure_card_sequence(duel.duel_id)
        .await
        .unwrap();
    assert_eq!(sequence.len(), 3);
    assert_eq!(
        duel.setup
            .perfut
            .duels
            .ensure_card_sequence(duel.duel_id)
            .await
            .unwrap(),
        sequence
    );
}

#[tokio::test]
async fn test_creator_can_start_before_opponent_joins() {
    let setup = TestSetup::new().await;
    setup.seed_cards("clube", CLUBS).await;
    let (_, creator) = setup.register("Early").await;
    let (_, opponent) = setup.register("Later").await;
    let now = test_start_time();

    let ticket = setup
        .perfut
        .duels
        .create(&creator, &["clube"], Some(2), None, now)
        .await
        .unwrap();
    let creator = creator.with_game(ticket.game_id);
    let first = setup.current_round(&creator, now).await;
    assert_eq!(first.number, 1);

    let joined = setup
        .perfut
        .duels
        .join(&opponent, &ticket.duel.code, now)
        .await
        .unwrap();
    let opponent = opponent.with_game(joined.game_id);
    setup.current_round(&opponent, now).await;

    let creator_card = setup.card_of_round(ticket.game_id, 1).await;
    let opponent_card = setup.card_of_round(joined.game_id, 1).await;
    assert_eq!(creator_card.id, opponent_card.id);
}

#[tokio::test]
async fn test_completion_converges_from_either_side() {
    let duel = joined_duel(2).await;
    let now = test_start_time();
    let games = &duel.setup.perfut.games;
    let creator_id = duel.creator.user_id.unwrap();
    let opponent_id = duel.opponent.user_id.unwrap();

    // Creator scores on round 1 and finishes first
    duel.setup.answer_correctly(&duel.creator, now).await;
    let waiting = duel.setup.skip_to_end(&duel.creator, now).await;
    assert_eq!(
        waiting,
        GameOutcome::Duel {
            game_id: duel.creator.active_game.unwrap(),
            result: DuelResult::StillWaiting
        }
    );

    let later = now + Duration::seconds(30);
    let outcome = duel.setup.skip_to_end(&duel.opponent, later).await;
    let expected = DuelResult::Finished {
        creator_id,
        opponent_id,
        creator_score: 10,
        opponent_score: 0,
        winner: Some(creator_id),
    };
    assert_eq!(
        outcome,
        GameOutcome::Duel {
            game_id: duel.opponent.active_game.unwrap(),
            result: expected.clone()
        }
    );

    // The creator polling again sees the identical result
    let creator_again = expect_finished(games.advance(&duel.creator, later).await.unwrap());
    assert_eq!(
        creator_again,
        GameOutcome::Duel {
            game_id: duel.creator.active_game.unwrap(),
            result: expected.clone()
        }
    );
    assert_eq!(
        duel.setup
            .perfut
            .duels
            .check_completion(duel.duel_id, later)
            .await
            .unwrap(),
        expected
    );

    let view = duel.setup.perfut.duels.view(&duel.opponent).await.unwrap();
    assert_eq!(view.status, DuelStatus::Finished);
}

#[tokio::test]
async fn test_tie_has_no_winner() {
    let duel = joined_duel(1).await;
    let now = test_start_time();

    duel.setup.skip_to_end(&duel.creator, now).await;
    let outcome = duel.setup.skip_to_end(&duel.opponent, now).await;

    match outcome {
        GameOutcome::Duel {
            result: DuelResult::Finished { winner, creator_score, opponent_score, .. },
            ..
        } => {
            assert_eq!(winner, None);
            assert_eq!(creator_score, opponent_score);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_only_participants_see_the_duel() {
    let duel = joined_duel(1).await;
    let (_, outsider) = duel.setup.register("Outsider").await;

    let err = duel
        .setup
        .perfut
        .duels
        .view(&outsider.with_duel(duel.duel_id))
        .await
        .unwrap_err();
    assert!(matches!(err.game_error(), Some(GameError::NotFound { .. })));
}

#[tokio::test]
async fn test_duel_entry_cost() {
    let setup = TestSetup::with_config(Config {
        duel_entry_cost: 40,
        ..Config::default()
    })
    .await;
    let (_, creator) = setup.register("Rich").await;
    let (_, opponent) = setup.register("Poor").await;
    let now = test_start_time();

    // Spend the opponent down below the entry cost first
    setup
        .perfut
        .duels
        .create(&opponent, &["clube"], Some(1), None, now)
        .await
        .unwrap();

    let ticket = setup
        .perfut
        .duels
        .create(&creator, &["clube"], Some(1), None, now)
        .await
        .unwrap();
    assert_eq!(setup.user(&creator).await.coins, 10);

    let err = setup
        .perfut
        .duels
        .join(&opponent, &ticket.duel.code, now)
        .await
        .unwrap_err();
    assert_eq!(
        err.game_error(),
        Some(&GameError::InsufficientFunds {
            required: 40,
            available: 10
        })
    );

    // The failed join left the seat open
    let (_, third) = setup.register("Third").await;
    let joined = setup
        .perfut
        .duels
        .join(&third, &ticket.duel.code, now)
        .await
        .unwrap();
    assert_eq!(joined.duel.status, DuelStatus::Active);
}

#[tokio::test]
async fn test_duel_without_cards_fails_cleanly() {
    let setup = TestSetup::new().await;
    let (_, creator) = setup.register("Empty").await;
    let now = test_start_time();

    let ticket = setup
        .perfut
        .duels
        .create(&creator, &["estadio"], Some(2), None, now)
        .await
        .unwrap();
    let err = setup
        .perfut
        .games
        .advance(&creator.with_game(ticket.game_id), now)
        .await
        .unwrap_err();
    assert!(matches!(err.game_error(), Some(GameError::NoCardAvailable { .. })));

    let err = setup
        .perfut
        .duels
        .ensure_card_sequence(ticket.duel.id)
        .await
        .unwrap_err();
    assert!(matches!(err.game_error(), Some(GameError::NoCardAvailable { .. })));
}
