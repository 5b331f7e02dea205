// Copyright (C) 2025 Holdem Developers
// SPDX-License-Identifier: Apache-2.0

//! RPC client for the table server.
use anyhow::{anyhow, bail, Result};

use holdem_core::{
    connection::{self, Connection},
    message::{Op, Reply, Request, Response},
    types::{AmountToCall, Bet, Chips, Game, Player, Round},
};

/// A client connection to the table server.
///
/// Requests on a connection are answered in order, each call sends one
/// request and waits for its response. Server side errors surface with
/// their stable description.
pub struct Client {
    conn: Connection,
    deadline_ms: u32,
    next_id: u64,
}

impl Client {
    /// Connects to a server.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let addr = format!("{host}:{port}");
        let conn = connection::connect_async(&addr).await?;

        Ok(Self {
            conn,
            deadline_ms: 0,
            next_id: 0,
        })
    }

    /// Sets the deadline sent with each request, 0 for the server default.
    pub fn set_deadline_ms(&mut self, deadline_ms: u32) {
        self.deadline_ms = deadline_ms;
    }

    /// Performs one operation on the server.
    pub async fn call(&mut self, op: Op) -> Result<Reply> {
        self.next_id += 1;
        let req = Request {
            id: self.next_id,
            deadline_ms: self.deadline_ms,
            op,
        };

        self.conn.send(&req).await?;

        let res: Response = self
            .conn
            .recv()
            .await
            .ok_or_else(|| anyhow!("Connection closed"))??;

        if res.id != req.id {
            bail!("Response id {} for request id {}", res.id, req.id);
        }

        res.result.map_err(anyhow::Error::from)
    }

    /// Closes the connection.
    pub async fn close(&mut self) {
        self.conn.close().await;
    }

    /// Creates a batch of players.
    pub async fn create_players(&mut self, players: Vec<Player>) -> Result<Vec<Player>> {
        expect_players(self.call(Op::CreatePlayers(players)).await?)
    }

    /// Creates a game.
    pub async fn create_game(&mut self, name: &str) -> Result<Game> {
        expect_game(
            self.call(Op::CreateGame(Game {
                name: name.to_string(),
                ..Game::default()
            }))
            .await?,
        )
    }

    /// Reads a game and its players.
    pub async fn get_game(&mut self, game: i64) -> Result<Game> {
        expect_game(self.call(Op::GetGame(game)).await?)
    }

    /// Joins the named players to a game.
    pub async fn set_game_players(
        &mut self,
        game: i64,
        players: Vec<String>,
    ) -> Result<Vec<Player>> {
        expect_players(self.call(Op::SetGamePlayers { game, players }).await?)
    }

    /// Seats the joined players.
    pub async fn allocate_game_slots(&mut self, game: i64) -> Result<Game> {
        expect_game(self.call(Op::AllocateGameSlots(game)).await?)
    }

    /// Picks the dealer seat.
    pub async fn set_button_positions(&mut self, game: i64) -> Result<Game> {
        expect_game(self.call(Op::SetButtonPositions(game)).await?)
    }

    /// Sets the game small blind amount.
    pub async fn set_min(&mut self, game: i64, min: Chips) -> Result<Game> {
        expect_game(self.call(Op::SetMin { game, min }).await?)
    }

    /// Creates a round from a game ready to play.
    pub async fn create_round_from_game(&mut self, game: i64) -> Result<Round> {
        expect_round(self.call(Op::CreateRoundFromGame(game)).await?)
    }

    /// Validates every round player can post the big blind.
    pub async fn validate_pre_round(&mut self, round: i64) -> Result<Round> {
        expect_round(self.call(Op::ValidatePreRound(round)).await?)
    }

    /// Starts a round.
    pub async fn start_round(&mut self, round: i64) -> Result<Round> {
        expect_round(self.call(Op::StartRound(round)).await?)
    }

    /// Reads a round and its players.
    pub async fn get_round(&mut self, round: i64) -> Result<Round> {
        expect_round(self.call(Op::GetRound(round)).await?)
    }

    /// Reads the player on action.
    pub async fn get_player_on_bet(&mut self, round: i64) -> Result<Player> {
        match self.call(Op::GetPlayerOnBet(round)).await? {
            Reply::Player(player) => Ok(player),
            reply => bail!("Unexpected reply {reply:?}"),
        }
    }

    /// Reads the chips a player must add to call.
    pub async fn get_amount_to_call(
        &mut self,
        round: i64,
        player: i64,
    ) -> Result<AmountToCall> {
        match self
            .call(Op::GetAmountToCallForPlayer { round, player })
            .await?
        {
            Reply::AmountToCall(amount) => Ok(amount),
            reply => bail!("Unexpected reply {reply:?}"),
        }
    }

    /// Places a bet for the player on action.
    pub async fn make_bet(&mut self, bet: Bet) -> Result<Bet> {
        match self.call(Op::MakeBet(bet)).await? {
            Reply::Bet(bet) => Ok(bet),
            reply => bail!("Unexpected reply {reply:?}"),
        }
    }
}

fn expect_players(reply: Reply) -> Result<Vec<Player>> {
    match reply {
        Reply::Players(players) => Ok(players),
        reply => bail!("Unexpected reply {reply:?}"),
    }
}

fn expect_game(reply: Reply) -> Result<Game> {
    match reply {
        Reply::Game(game) => Ok(game),
        reply => bail!("Unexpected reply {reply:?}"),
    }
}

fn expect_round(reply: Reply) -> Result<Round> {
    match reply {
        Reply::Round(round) => Ok(round),
        reply => bail!("Unexpected reply {reply:?}"),
    }
}
