// Copyright (C) 2025 Holdem Developers
// SPDX-License-Identifier: Apache-2.0

//! RPC dispatch over the engine.
//!
//! The service serializes every state mutating operation on a table with a
//! per table async lock, reads go straight through. Each request runs under
//! the client supplied deadline, a request that misses its deadline returns
//! `DeadlineExceeded` and whatever row update was in flight either fully
//! applied or did not happen.
use ahash::AHashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::{sync::Mutex as AsyncMutex, time::Duration};

use holdem_core::{
    message::{Op, Reply, Request, Response},
    Error,
};

use crate::{db::Db, engine::Engine};

/// The deadline used when the client does not supply one.
const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

/// The RPC service.
#[derive(Clone)]
pub struct Service {
    engine: Engine,
    locks: Arc<Mutex<AHashMap<i64, Arc<AsyncMutex<()>>>>>,
}

impl Service {
    /// Creates a service over a store.
    pub fn new(db: Db) -> Self {
        Self::with_engine(Engine::new(db))
    }

    /// Creates a service over an engine, used by tests to seed randomness.
    pub fn with_engine(engine: Engine) -> Self {
        Self {
            engine,
            locks: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    /// Runs a request to completion or to its deadline.
    pub async fn dispatch(&self, req: Request) -> Response {
        let deadline = if req.deadline_ms == 0 {
            DEFAULT_DEADLINE
        } else {
            Duration::from_millis(req.deadline_ms as u64)
        };

        let result = match tokio::time::timeout(deadline, self.handle(req.op)).await {
            Ok(result) => result,
            Err(_) => Err(Error::DeadlineExceeded),
        };

        Response { id: req.id, result }
    }

    async fn handle(&self, op: Op) -> Result<Reply, Error> {
        let engine = &self.engine;

        match op {
            // Player operations.
            Op::CreatePlayer(player) => engine.create_player(player).await.map(Reply::Player),
            Op::CreatePlayers(players) => {
                engine.create_players(players).await.map(Reply::Players)
            }
            Op::DeletePlayers(ids) => engine.delete_players(ids).await.map(|_| Reply::Unit),
            Op::GetPlayer(id) => engine.get_player(id).await.map(Reply::Player),
            Op::GetPlayers(ids) => engine.get_players(ids).await.map(Reply::Players),
            Op::GetPlayerByName(name) => {
                engine.get_player_by_name(name).await.map(Reply::Player)
            }
            Op::GetPlayersByName(names) => {
                engine.get_players_by_name(names).await.map(Reply::Players)
            }
            Op::UpdatePlayersChips(players) => {
                engine.update_players_chips(players).await.map(Reply::Players)
            }
            Op::UpdatePlayersCards(players) => {
                engine.update_players_cards(players).await.map(Reply::Players)
            }
            Op::SetPlayerSlot { player, seat } => {
                engine.set_player_slot(player, seat).await.map(Reply::Player)
            }
            Op::UpdatePlayerNotInHand { player } => {
                engine.update_player_not_in_hand(player).await.map(Reply::Player)
            }

            // Game operations.
            Op::CreateGame(game) => engine.create_game(game).await.map(Reply::Game),
            Op::GetGame(id) => engine.get_game(id).await.map(Reply::Game),
            Op::GetGameByName(name) => engine.get_game_by_name(name).await.map(Reply::Game),
            Op::DeleteGames(ids) => engine.delete_games(ids).await.map(|_| Reply::Unit),
            Op::AllocateGameSlots(game) => {
                let _guard = self.lock_game(game).await;
                engine.allocate_game_slots(game).await.map(Reply::Game)
            }
            Op::SetButtonPositions(game) => {
                let _guard = self.lock_game(game).await;
                engine.set_button_positions(game).await.map(Reply::Game)
            }
            Op::SetMin { game, min } => {
                let _guard = self.lock_game(game).await;
                engine.set_min(game, min).await.map(Reply::Game)
            }
            Op::ValidatePreGame(game) => engine.validate_pre_game(game).await.map(Reply::Game),
            Op::NextDealer(game) => {
                let _guard = self.lock_game(game).await;
                engine.next_dealer(game).await.map(Reply::Game)
            }
            Op::UpdateGameInRound { game, in_round } => {
                let _guard = self.lock_game(game).await;
                engine.update_game_in_round(game, in_round).await.map(Reply::Game)
            }
            Op::UpdateGameStatus(game) => {
                let _guard = self.lock_game(game.id).await;
                engine.update_game_status(game).await.map(Reply::Game)
            }

            // Game players operations.
            Op::GetGamePlayersByGameId(game) => {
                engine.get_game_players(game).await.map(Reply::Players)
            }
            Op::SetGamePlayers { game, players } => {
                let _guard = self.lock_game(game).await;
                engine.set_game_players(game, players).await.map(Reply::Players)
            }
            Op::RemovePlayerFromGame { player } => {
                let game = engine.db().player_game(player).await?;
                let _guard = match game {
                    Some(game) => Some(self.lock_game(game).await),
                    None => None,
                };
                engine.remove_player_from_game(player).await.map(|_| Reply::Unit)
            }

            // Round operations.
            Op::CreateRoundFromGame(game) => {
                let _guard = self.lock_game(game).await;
                engine.create_round_from_game(game).await.map(Reply::Round)
            }
            Op::GetRound(round) => engine.get_round(round).await.map(Reply::Round),
            Op::ValidatePreRound(round) => {
                engine.validate_pre_round(round).await.map(Reply::Round)
            }
            Op::StartRound(round) => {
                let _guard = self.lock_round(round).await?;
                engine.start_round(round).await.map(Reply::Round)
            }
            Op::DealFlop(round) => {
                let _guard = self.lock_round(round).await?;
                engine.deal_flop(round).await.map(Reply::Round)
            }
            Op::DealRiver(round) => {
                let _guard = self.lock_round(round).await?;
                engine.deal_river(round).await.map(Reply::Round)
            }
            Op::DealTurn(round) => {
                let _guard = self.lock_round(round).await?;
                engine.deal_turn(round).await.map(Reply::Round)
            }
            Op::DealCards(round) => {
                let _guard = self.lock_round(round).await?;
                engine.deal_cards(round).await.map(Reply::Round)
            }
            Op::CreateDeck(round) => {
                let _guard = self.lock_round(round).await?;
                engine.create_deck(round).await.map(Reply::Round)
            }
            Op::UpdateDeck { round, deck } => {
                let _guard = self.lock_round(round).await?;
                engine.update_deck(round, deck).await.map(Reply::Round)
            }
            Op::SetAction { round, seat } => {
                let _guard = self.lock_round(round).await?;
                engine.set_action(round, seat).await.map(Reply::Round)
            }
            Op::UpdateRoundStatus { round, status } => {
                let _guard = self.lock_round(round).await?;
                engine.update_round_status(round, status).await.map(Reply::Round)
            }
            Op::SetNextOnBet(round) => {
                let _guard = self.lock_round(round).await?;
                engine.set_next_on_bet(round).await.map(Reply::Round)
            }
            Op::SetNextRound(round) => {
                let _guard = self.lock_round(round).await?;
                engine.set_next_round(round).await.map(Reply::Round)
            }
            Op::UpdateRoundFlop { round, cards } => {
                let _guard = self.lock_round(round).await?;
                engine.update_round_flop(round, cards).await.map(Reply::Round)
            }
            Op::UpdateRoundRiver { round, cards } => {
                let _guard = self.lock_round(round).await?;
                engine.update_round_river(round, cards).await.map(Reply::Round)
            }
            Op::UpdateRoundTurn { round, cards } => {
                let _guard = self.lock_round(round).await?;
                engine.update_round_turn(round, cards).await.map(Reply::Round)
            }
            Op::GetRoundBets(round) => engine.get_round_bets(round).await.map(Reply::Bets),
            Op::GetRoundBetsForStatus(round) => {
                engine.get_round_bets_for_status(round).await.map(Reply::Bets)
            }
            Op::MakeBet(bet) => {
                let _guard = self.lock_round(bet.round).await?;
                engine.make_bet(bet).await.map(Reply::Bet)
            }
            Op::EvaluateHands(round) => engine.evaluate_hands(round).await.map(Reply::Round),
            Op::GetPlayerOnBet(round) => {
                engine.get_player_on_bet(round).await.map(Reply::Player)
            }
            Op::GetRoundPlayersByRoundId(round) => {
                engine.get_round_players(round).await.map(Reply::Players)
            }
            Op::CreateRoundPlayers(round) => {
                let _guard = self.lock_round(round).await?;
                engine.create_round_players(round).await.map(Reply::Players)
            }
            Op::GetAmountToCallForPlayer { round, player } => engine
                .get_amount_to_call(round, player)
                .await
                .map(Reply::AmountToCall),
            Op::IsBettingOver(round) => {
                engine.is_betting_over(round).await.map(Reply::BettingOver)
            }
        }
    }

    /// The mutual exclusion guard for a table.
    async fn lock_game(&self, game: i64) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            locks
                .entry(game)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        lock.lock_owned().await
    }

    /// The mutual exclusion guard for the table a round belongs to.
    async fn lock_round(
        &self,
        round: i64,
    ) -> Result<tokio::sync::OwnedMutexGuard<()>, Error> {
        let round = self.engine.db().round(round).await?;
        Ok(self.lock_game(round.game).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdem_core::types::{Chips, Game, Player};
    use rand::{rngs::StdRng, SeedableRng};

    fn service() -> Service {
        let db = Db::open_in_memory().unwrap();
        Service::with_engine(Engine::with_rng(db, StdRng::seed_from_u64(7)))
    }

    fn request(op: Op) -> Request {
        Request {
            id: 1,
            deadline_ms: 0,
            op,
        }
    }

    #[tokio::test]
    async fn dispatch_creates_and_reads() {
        let service = service();

        let res = service
            .dispatch(request(Op::CreatePlayer(Player {
                name: "alice".to_string(),
                chips: Chips::new(1000),
                ..Player::default()
            })))
            .await;

        let id = match res.result {
            Ok(Reply::Player(player)) => player.id,
            other => panic!("unexpected reply {other:?}"),
        };

        let res = service.dispatch(request(Op::GetPlayer(id))).await;
        assert!(matches!(res.result, Ok(Reply::Player(p)) if p.name == "alice"));
    }

    #[tokio::test]
    async fn dispatch_surfaces_typed_errors() {
        let service = service();

        let res = service.dispatch(request(Op::GetPlayer(42))).await;
        assert_eq!(res.result, Err(Error::PlayerNotFound));

        let res = service
            .dispatch(request(Op::CreateGame(Game::default())))
            .await;
        assert_eq!(res.result, Err(Error::EmptyGameName));
    }

    #[tokio::test]
    async fn dispatch_echoes_request_id() {
        let service = service();

        let res = service
            .dispatch(Request {
                id: 99,
                deadline_ms: 1000,
                op: Op::GetRound(1),
            })
            .await;
        assert_eq!(res.id, 99);
        assert_eq!(res.result, Err(Error::RoundNotFound));
    }
}
