use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::{
    config::RewardPolicy,
    db::Store,
    error::{AppError, Result},
    models::{GameId, GameOutcome, GameResult, User},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameReward {
    pub points_delta: i64,
    pub reward_uri: Option<&'static str>,
}

/// win pays `win_points` plus the game's badge, draw pays `draw_points`,
/// loss pays `loss_points`.
pub fn evaluate(game_id: GameId, outcome: GameOutcome, policy: &RewardPolicy) -> GameReward {
    match outcome {
        GameOutcome::Win => GameReward {
            points_delta: policy.win_points,
            reward_uri: Some(game_id.reward_uri()),
        },
        GameOutcome::Draw => GameReward {
            points_delta: policy.draw_points,
            reward_uri: None,
        },
        GameOutcome::Loss => GameReward {
            points_delta: policy.loss_points,
            reward_uri: None,
        },
    }
}

/// Client-reported round. `bet_amount` and `tx_hash` are stored as given and
/// never checked against any chain.
#[derive(Debug, Clone)]
pub struct GameSubmission {
    pub address: String,
    pub game_id: GameId,
    pub outcome: GameOutcome,
    pub bet_amount: Option<String>,
    pub tx_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GameResultOutcome {
    pub record: GameResult,
    pub points_earned: i64,
    pub nft_earned: Option<String>,
    pub user: User,
}

pub struct GameResultService {
    store: Arc<dyn Store>,
    policy: RewardPolicy,
}

impl GameResultService {
    pub fn new(store: Arc<dyn Store>, policy: RewardPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn submit(
        &self,
        submission: GameSubmission,
        now: DateTime<Utc>,
    ) -> Result<GameResultOutcome> {
        if self.store.get_user(&submission.address).await?.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let reward = evaluate(submission.game_id, submission.outcome, &self.policy);
        let record = GameResult {
            address: submission.address.clone(),
            game_id: submission.game_id.as_str().to_string(),
            result: submission.outcome.as_str().to_string(),
            bet_amount: submission.bet_amount,
            tx_hash: submission.tx_hash,
            points_delta: reward.points_delta,
            reward_uri: reward.reward_uri.map(str::to_string),
            created_at: now,
        };

        self.store.record_game_result(&record).await?;

        let user = self
            .store
            .get_user(&submission.address)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        tracing::info!(
            "Game result: user={}, game={}, result={}, points=+{}",
            record.address,
            record.game_id,
            record.result,
            record.points_delta
        );

        Ok(GameResultOutcome {
            points_earned: record.points_delta,
            nft_earned: record.reward_uri.clone(),
            record,
            user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    const ALICE: &str = "0x00000000000000000000000000000000000000a1";

    fn submission(game_id: GameId, outcome: GameOutcome) -> GameSubmission {
        GameSubmission {
            address: ALICE.to_string(),
            game_id,
            outcome,
            bet_amount: None,
            tx_hash: None,
        }
    }

    async fn setup() -> (Arc<MemoryStore>, GameResultService) {
        let store = Arc::new(MemoryStore::new());
        store.upsert_user(ALICE, None, Utc::now()).await.unwrap();
        let service = GameResultService::new(store.clone(), RewardPolicy::default());
        (store, service)
    }

    #[test]
    fn reward_table() {
        let policy = RewardPolicy::default();

        let win = evaluate(GameId::Rps, GameOutcome::Win, &policy);
        assert_eq!(win.points_delta, 10);
        assert_eq!(win.reward_uri, Some("ipfs://rps-nft"));

        assert_eq!(
            evaluate(GameId::Rps, GameOutcome::Draw, &policy),
            GameReward {
                points_delta: 2,
                reward_uri: None
            }
        );
        assert_eq!(
            evaluate(GameId::Rps, GameOutcome::Loss, &policy),
            GameReward {
                points_delta: 0,
                reward_uri: None
            }
        );
    }

    #[test]
    fn every_game_has_its_own_badge() {
        let policy = RewardPolicy::default();
        let mut uris: Vec<_> = GameId::ALL
            .iter()
            .filter_map(|game| evaluate(*game, GameOutcome::Win, &policy).reward_uri)
            .collect();
        uris.sort();
        uris.dedup();
        assert_eq!(uris.len(), GameId::ALL.len());
    }

    #[tokio::test]
    async fn win_records_ledger_and_awards_badge() {
        let (store, service) = setup().await;
        let now = Utc::now();

        let mut round = submission(GameId::Rps, GameOutcome::Win);
        round.bet_amount = Some("0.001".to_string());
        round.tx_hash = Some("0xabc".to_string());
        let outcome = service.submit(round, now).await.unwrap();

        assert_eq!(outcome.points_earned, 10);
        assert_eq!(outcome.nft_earned.as_deref(), Some("ipfs://rps-nft"));
        assert_eq!(outcome.user.points, 10);
        assert_eq!(outcome.user.nfts, vec!["ipfs://rps-nft".to_string()]);
        assert_eq!(outcome.record.bet_amount.as_deref(), Some("0.001"));
        assert_eq!(outcome.record.created_at, now);

        let ledger = store.game_results_for(ALICE).await;
        assert_eq!(ledger, vec![outcome.record]);
    }

    #[tokio::test]
    async fn repeat_win_of_same_game_keeps_single_badge() {
        let (store, service) = setup().await;
        let now = Utc::now();

        service.submit(submission(GameId::Rps, GameOutcome::Win), now).await.unwrap();
        let second = service
            .submit(submission(GameId::Rps, GameOutcome::Win), now)
            .await
            .unwrap();

        assert_eq!(second.user.points, 20);
        assert_eq!(second.user.nfts, vec!["ipfs://rps-nft".to_string()]);
        // Both rounds stay in the ledger with their reward URI.
        let ledger = store.game_results_for(ALICE).await;
        assert_eq!(ledger.len(), 2);
        assert!(ledger
            .iter()
            .all(|row| row.reward_uri.as_deref() == Some("ipfs://rps-nft")));
    }

    #[tokio::test]
    async fn wins_in_different_games_collect_each_badge() {
        let (_store, service) = setup().await;
        let now = Utc::now();
        service.submit(submission(GameId::Dice, GameOutcome::Win), now).await.unwrap();
        let outcome = service
            .submit(submission(GameId::Game2048, GameOutcome::Win), now)
            .await
            .unwrap();
        assert_eq!(
            outcome.user.nfts,
            vec!["ipfs://dice-nft".to_string(), "ipfs://2048-nft".to_string()]
        );
    }

    #[tokio::test]
    async fn draw_and_loss_are_still_recorded() {
        let (store, service) = setup().await;
        let now = Utc::now();
        let draw = service
            .submit(submission(GameId::Coin, GameOutcome::Draw), now)
            .await
            .unwrap();
        assert_eq!(draw.points_earned, 2);
        assert!(draw.nft_earned.is_none());

        let loss = service
            .submit(submission(GameId::Coin, GameOutcome::Loss), now)
            .await
            .unwrap();
        assert_eq!(loss.points_earned, 0);
        assert_eq!(loss.user.points, 2);
        assert!(loss.user.nfts.is_empty());

        let results: Vec<_> = store
            .game_results_for(ALICE)
            .await
            .into_iter()
            .map(|row| row.result)
            .collect();
        assert_eq!(results, vec!["draw".to_string(), "loss".to_string()]);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let (store, service) = setup().await;
        let mut round = submission(GameId::Rps, GameOutcome::Win);
        round.address = "0x00000000000000000000000000000000000000ff".to_string();
        match service.submit(round, Utc::now()).await {
            Err(AppError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
        assert!(store
            .game_results_for("0x00000000000000000000000000000000000000ff")
            .await
            .is_empty());
    }
}
