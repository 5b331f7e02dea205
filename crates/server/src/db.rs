// Copyright (C) 2025 Holdem Developers
// SPDX-License-Identifier: Apache-2.0

//! Database types for persisting tables state.
//!
//! All reads and writes go through a [Db] handle that owns a single
//! connection, each call runs on the blocking pool and holds the connection
//! for the duration of one statement batch, which makes every call atomic at
//! the row level.
use anyhow::Result;
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection};
use std::{path::Path, sync::Arc};

use holdem_core::{
    types::{Bet, BetType, Chips, Game, Player, Round, RoundStatus},
    Error,
};

/// Database for persisting players, games, rounds, and bets.
#[derive(Debug, Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    /// Opens a database file creating the tables if missing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::create_tables(&conn)?;

        Ok(Db {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in memory database for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::create_tables(&conn)?;

        Ok(Db {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn create_tables(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS players (
               id INTEGER PRIMARY KEY AUTOINCREMENT,
               name TEXT NOT NULL UNIQUE,
               chips INTEGER NOT NULL DEFAULT 0,
               seat INTEGER NOT NULL DEFAULT 0,
               in_hand INTEGER NOT NULL DEFAULT 0,
               cards TEXT NOT NULL DEFAULT ''
             );
             CREATE TABLE IF NOT EXISTS games (
               id INTEGER PRIMARY KEY AUTOINCREMENT,
               name TEXT NOT NULL UNIQUE,
               dealer INTEGER NOT NULL DEFAULT 0,
               min INTEGER NOT NULL DEFAULT 0,
               in_round INTEGER NOT NULL DEFAULT 0
             );
             CREATE TABLE IF NOT EXISTS game_players (
               id INTEGER PRIMARY KEY AUTOINCREMENT,
               player INTEGER NOT NULL,
               game INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS rounds (
               id INTEGER PRIMARY KEY AUTOINCREMENT,
               game INTEGER NOT NULL,
               status TEXT NOT NULL,
               deck TEXT NOT NULL DEFAULT '',
               flop TEXT NOT NULL DEFAULT '',
               turn TEXT NOT NULL DEFAULT '',
               river TEXT NOT NULL DEFAULT '',
               action INTEGER NOT NULL DEFAULT 0,
               winning_player INTEGER NOT NULL DEFAULT 0,
               winning_score INTEGER NOT NULL DEFAULT 0,
               winning_hand TEXT NOT NULL DEFAULT ''
             );
             CREATE TABLE IF NOT EXISTS round_players (
               id INTEGER PRIMARY KEY AUTOINCREMENT,
               round INTEGER NOT NULL,
               player INTEGER NOT NULL,
               game INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS bets (
               id INTEGER PRIMARY KEY AUTOINCREMENT,
               status TEXT NOT NULL,
               round INTEGER NOT NULL,
               game INTEGER NOT NULL,
               player INTEGER NOT NULL,
               chips INTEGER NOT NULL DEFAULT 0,
               kind TEXT NOT NULL
             );",
        )?;

        Ok(())
    }

    /// Runs a closure against the connection on the blocking pool.
    async fn call<T, F>(&self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&Connection) -> Result<T, Error> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            f(&conn)
        })
        .await
        .map_err(|e| Error::Store(e.to_string()))?
    }

    /// Creates a player, the name must be unique and non empty.
    pub async fn insert_player(&self, name: String, chips: Chips) -> Result<Player, Error> {
        self.call(move |conn| {
            let exists = conn
                .query_row(
                    "SELECT id FROM players WHERE name = ?1",
                    params![name],
                    |row| row.get::<_, i64>(0),
                )
                .map(Some)
                .or_else(no_rows_as_none)?;

            if exists.is_some() {
                return Err(Error::PlayerNameExists);
            }

            conn.execute(
                "INSERT INTO players (name, chips) VALUES (?1, ?2)",
                params![name, chips.amount()],
            )
            .map_err(store_err)?;

            let id = conn.last_insert_rowid();
            get_player(conn, id)
        })
        .await
    }

    /// Reads a player by id.
    pub async fn player(&self, id: i64) -> Result<Player, Error> {
        self.call(move |conn| get_player(conn, id)).await
    }

    /// Reads a batch of players by id, missing ids are skipped.
    pub async fn players(&self, ids: Vec<i64>) -> Result<Vec<Player>, Error> {
        self.call(move |conn| {
            if ids.is_empty() {
                return Ok(Vec::new());
            }

            let marks = vec!["?"; ids.len()].join(",");
            let sql = format!(
                "SELECT id, name, chips, seat, in_hand, cards
                 FROM players WHERE id IN ({marks}) ORDER BY id"
            );

            let mut stmt = conn.prepare(&sql).map_err(store_err)?;
            let rows = stmt
                .query_map(params_from_iter(ids), player_from_row)
                .map_err(store_err)?;

            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(store_err)
        })
        .await
    }

    /// Reads a player by name.
    pub async fn player_by_name(&self, name: String) -> Result<Option<Player>, Error> {
        self.call(move |conn| {
            conn.query_row(
                "SELECT id, name, chips, seat, in_hand, cards
                 FROM players WHERE name = ?1",
                params![name],
                player_from_row,
            )
            .map(Some)
            .or_else(no_rows_as_none)
        })
        .await
    }

    /// Reads a batch of players by name, missing names are skipped.
    pub async fn players_by_name(&self, names: Vec<String>) -> Result<Vec<Player>, Error> {
        self.call(move |conn| {
            if names.is_empty() {
                return Ok(Vec::new());
            }

            let marks = vec!["?"; names.len()].join(",");
            let sql = format!(
                "SELECT id, name, chips, seat, in_hand, cards
                 FROM players WHERE name IN ({marks}) ORDER BY id"
            );

            let mut stmt = conn.prepare(&sql).map_err(store_err)?;
            let rows = stmt
                .query_map(params_from_iter(names), player_from_row)
                .map_err(store_err)?;

            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(store_err)
        })
        .await
    }

    /// Deletes players by id.
    pub async fn delete_players(&self, ids: Vec<i64>) -> Result<(), Error> {
        self.call(move |conn| {
            for id in ids {
                let n = conn
                    .execute("DELETE FROM players WHERE id = ?1", params![id])
                    .map_err(store_err)?;
                one_row(n, Error::PlayerNotFound)?;
            }

            Ok(())
        })
        .await
    }

    /// Updates a player chips.
    pub async fn update_player_chips(&self, id: i64, chips: Chips) -> Result<(), Error> {
        self.call(move |conn| {
            let n = conn
                .execute(
                    "UPDATE players SET chips = ?1 WHERE id = ?2",
                    params![chips.amount(), id],
                )
                .map_err(store_err)?;
            one_row(n, Error::PlayerNotFound)
        })
        .await
    }

    /// Updates a player hole cards.
    pub async fn update_player_cards(&self, id: i64, cards: String) -> Result<(), Error> {
        self.call(move |conn| {
            let n = conn
                .execute(
                    "UPDATE players SET cards = ?1 WHERE id = ?2",
                    params![cards, id],
                )
                .map_err(store_err)?;
            one_row(n, Error::PlayerNotFound)
        })
        .await
    }

    /// Updates a player seat.
    pub async fn update_player_seat(&self, id: i64, seat: i64) -> Result<(), Error> {
        self.call(move |conn| {
            let n = conn
                .execute(
                    "UPDATE players SET seat = ?1 WHERE id = ?2",
                    params![seat, id],
                )
                .map_err(store_err)?;
            one_row(n, Error::PlayerNotFound)
        })
        .await
    }

    /// Updates a player in hand flag.
    pub async fn update_player_in_hand(&self, id: i64, in_hand: bool) -> Result<(), Error> {
        self.call(move |conn| {
            let n = conn
                .execute(
                    "UPDATE players SET in_hand = ?1 WHERE id = ?2",
                    params![in_hand, id],
                )
                .map_err(store_err)?;
            one_row(n, Error::PlayerNotFound)
        })
        .await
    }

    /// Creates a game, the name must be unique and non empty.
    pub async fn insert_game(&self, name: String, min: Chips) -> Result<Game, Error> {
        self.call(move |conn| {
            let exists = conn
                .query_row(
                    "SELECT id FROM games WHERE name = ?1",
                    params![name],
                    |row| row.get::<_, i64>(0),
                )
                .map(Some)
                .or_else(no_rows_as_none)?;

            if exists.is_some() {
                return Err(Error::GameNameExists);
            }

            conn.execute(
                "INSERT INTO games (name, min) VALUES (?1, ?2)",
                params![name, min.amount()],
            )
            .map_err(store_err)?;

            let id = conn.last_insert_rowid();
            get_game(conn, id)
        })
        .await
    }

    /// Reads a game and its joined players by id.
    pub async fn game(&self, id: i64) -> Result<Game, Error> {
        self.call(move |conn| get_game(conn, id)).await
    }

    /// Reads a game and its joined players by name.
    pub async fn game_by_name(&self, name: String) -> Result<Option<Game>, Error> {
        self.call(move |conn| {
            let id = conn
                .query_row(
                    "SELECT id FROM games WHERE name = ?1",
                    params![name],
                    |row| row.get::<_, i64>(0),
                )
                .map(Some)
                .or_else(no_rows_as_none)?;

            match id {
                Some(id) => get_game(conn, id).map(Some),
                None => Ok(None),
            }
        })
        .await
    }

    /// Deletes games by id with their join rows.
    pub async fn delete_games(&self, ids: Vec<i64>) -> Result<(), Error> {
        self.call(move |conn| {
            for id in ids {
                let n = conn
                    .execute("DELETE FROM games WHERE id = ?1", params![id])
                    .map_err(store_err)?;
                one_row(n, Error::GameNotFound)?;

                conn.execute("DELETE FROM game_players WHERE game = ?1", params![id])
                    .map_err(store_err)?;
            }

            Ok(())
        })
        .await
    }

    /// Updates a game dealer seat.
    pub async fn update_game_dealer(&self, id: i64, dealer: i64) -> Result<(), Error> {
        self.call(move |conn| {
            let n = conn
                .execute(
                    "UPDATE games SET dealer = ?1 WHERE id = ?2",
                    params![dealer, id],
                )
                .map_err(store_err)?;
            one_row(n, Error::GameNotFound)
        })
        .await
    }

    /// Updates a game minimum bet.
    pub async fn update_game_min(&self, id: i64, min: Chips) -> Result<(), Error> {
        self.call(move |conn| {
            let n = conn
                .execute(
                    "UPDATE games SET min = ?1 WHERE id = ?2",
                    params![min.amount(), id],
                )
                .map_err(store_err)?;
            one_row(n, Error::GameNotFound)
        })
        .await
    }

    /// Updates a game in round flag.
    pub async fn update_game_in_round(&self, id: i64, in_round: bool) -> Result<(), Error> {
        self.call(move |conn| {
            let n = conn
                .execute(
                    "UPDATE games SET in_round = ?1 WHERE id = ?2",
                    params![in_round, id],
                )
                .map_err(store_err)?;
            one_row(n, Error::GameNotFound)
        })
        .await
    }

    /// Updates the game dealer, minimum bet, and in round flag together.
    pub async fn update_game_status(
        &self,
        id: i64,
        dealer: i64,
        min: Chips,
        in_round: bool,
    ) -> Result<(), Error> {
        self.call(move |conn| {
            let n = conn
                .execute(
                    "UPDATE games SET dealer = ?1, min = ?2, in_round = ?3 WHERE id = ?4",
                    params![dealer, min.amount(), in_round, id],
                )
                .map_err(store_err)?;
            one_row(n, Error::GameNotFound)
        })
        .await
    }

    /// Reads the players joined to a game in join order.
    pub async fn game_players(&self, game: i64) -> Result<Vec<Player>, Error> {
        self.call(move |conn| get_game_players(conn, game)).await
    }

    /// Joins a player to a game if not already joined.
    pub async fn join_game(&self, player: i64, game: i64) -> Result<(), Error> {
        self.call(move |conn| {
            let joined = conn
                .query_row(
                    "SELECT id FROM game_players WHERE player = ?1 AND game = ?2",
                    params![player, game],
                    |row| row.get::<_, i64>(0),
                )
                .map(Some)
                .or_else(no_rows_as_none)?;

            if joined.is_none() {
                conn.execute(
                    "INSERT INTO game_players (player, game) VALUES (?1, ?2)",
                    params![player, game],
                )
                .map_err(store_err)?;
            }

            Ok(())
        })
        .await
    }

    /// The game a player is joined to.
    pub async fn player_game(&self, player: i64) -> Result<Option<i64>, Error> {
        self.call(move |conn| {
            conn.query_row(
                "SELECT game FROM game_players WHERE player = ?1",
                params![player],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(no_rows_as_none)
        })
        .await
    }

    /// Removes a player from the game it is joined to.
    pub async fn leave_game(&self, player: i64) -> Result<(), Error> {
        self.call(move |conn| {
            let n = conn
                .execute("DELETE FROM game_players WHERE player = ?1", params![player])
                .map_err(store_err)?;
            one_row(n, Error::PlayerNotFound)
        })
        .await
    }

    /// Creates a round for a game.
    pub async fn insert_round(
        &self,
        game: i64,
        status: RoundStatus,
        deck: String,
    ) -> Result<Round, Error> {
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO rounds (game, status, deck) VALUES (?1, ?2, ?3)",
                params![game, status.as_str(), deck],
            )
            .map_err(store_err)?;

            let id = conn.last_insert_rowid();
            get_round(conn, id)
        })
        .await
    }

    /// Reads a round by id.
    pub async fn round(&self, id: i64) -> Result<Round, Error> {
        self.call(move |conn| get_round(conn, id)).await
    }

    /// Updates a round deck.
    pub async fn update_round_deck(&self, id: i64, deck: String) -> Result<(), Error> {
        self.update_round_text("deck", id, deck).await
    }

    /// Updates a round flop cards.
    pub async fn update_round_flop(&self, id: i64, cards: String) -> Result<(), Error> {
        self.update_round_text("flop", id, cards).await
    }

    /// Updates a round turn card.
    pub async fn update_round_turn(&self, id: i64, cards: String) -> Result<(), Error> {
        self.update_round_text("turn", id, cards).await
    }

    /// Updates a round river card.
    pub async fn update_round_river(&self, id: i64, cards: String) -> Result<(), Error> {
        self.update_round_text("river", id, cards).await
    }

    async fn update_round_text(
        &self,
        column: &'static str,
        id: i64,
        value: String,
    ) -> Result<(), Error> {
        self.call(move |conn| {
            let sql = format!("UPDATE rounds SET {column} = ?1 WHERE id = ?2");
            let n = conn.execute(&sql, params![value, id]).map_err(store_err)?;
            one_row(n, Error::RoundNotFound)
        })
        .await
    }

    /// Updates the seat on action of a round.
    pub async fn update_round_action(&self, id: i64, seat: i64) -> Result<(), Error> {
        self.call(move |conn| {
            let n = conn
                .execute(
                    "UPDATE rounds SET action = ?1 WHERE id = ?2",
                    params![seat, id],
                )
                .map_err(store_err)?;
            one_row(n, Error::RoundNotFound)
        })
        .await
    }

    /// Updates a round status.
    pub async fn update_round_status(&self, id: i64, status: RoundStatus) -> Result<(), Error> {
        self.call(move |conn| {
            let n = conn
                .execute(
                    "UPDATE rounds SET status = ?1 WHERE id = ?2",
                    params![status.as_str(), id],
                )
                .map_err(store_err)?;
            one_row(n, Error::RoundNotFound)
        })
        .await
    }

    /// Records the round winner.
    pub async fn update_round_winner(
        &self,
        id: i64,
        player: i64,
        score: u32,
        hand: String,
    ) -> Result<(), Error> {
        self.call(move |conn| {
            let n = conn
                .execute(
                    "UPDATE rounds SET winning_player = ?1, winning_score = ?2,
                       winning_hand = ?3
                     WHERE id = ?4",
                    params![player, score, hand, id],
                )
                .map_err(store_err)?;
            one_row(n, Error::RoundNotFound)
        })
        .await
    }

    /// Snapshots a player into a round.
    pub async fn insert_round_player(
        &self,
        round: i64,
        player: i64,
        game: i64,
    ) -> Result<(), Error> {
        self.call(move |conn| {
            let exists = conn
                .query_row(
                    "SELECT id FROM round_players WHERE round = ?1 AND player = ?2",
                    params![round, player],
                    |row| row.get::<_, i64>(0),
                )
                .map(Some)
                .or_else(no_rows_as_none)?;

            if exists.is_none() {
                conn.execute(
                    "INSERT INTO round_players (round, player, game) VALUES (?1, ?2, ?3)",
                    params![round, player, game],
                )
                .map_err(store_err)?;
            }

            Ok(())
        })
        .await
    }

    /// Reads the players of a round in seat order.
    pub async fn round_players(&self, round: i64) -> Result<Vec<Player>, Error> {
        self.call(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT p.id, p.name, p.chips, p.seat, p.in_hand, p.cards
                     FROM players p JOIN round_players rp ON rp.player = p.id
                     WHERE rp.round = ?1 ORDER BY p.seat",
                )
                .map_err(store_err)?;

            let rows = stmt
                .query_map(params![round], player_from_row)
                .map_err(store_err)?;

            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(store_err)
        })
        .await
    }

    /// Appends a bet to a round bet log.
    pub async fn insert_bet(&self, bet: Bet) -> Result<Bet, Error> {
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO bets (status, round, game, player, chips, kind)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    bet.status.as_str(),
                    bet.round,
                    bet.game,
                    bet.player,
                    bet.chips.amount(),
                    bet.kind.as_str()
                ],
            )
            .map_err(store_err)?;

            let id = conn.last_insert_rowid();
            conn.query_row(
                "SELECT id, status, round, game, player, chips, kind
                 FROM bets WHERE id = ?1",
                params![id],
                bet_from_row,
            )
            .map_err(store_err)
        })
        .await
    }

    /// Reads all bets of a round in placement order.
    pub async fn round_bets(&self, round: i64) -> Result<Vec<Bet>, Error> {
        self.call(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, status, round, game, player, chips, kind
                     FROM bets WHERE round = ?1 ORDER BY id",
                )
                .map_err(store_err)?;

            let rows = stmt
                .query_map(params![round], bet_from_row)
                .map_err(store_err)?;

            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(store_err)
        })
        .await
    }

    /// Reads the bets a round placed in the given street.
    pub async fn round_bets_for_status(
        &self,
        round: i64,
        status: RoundStatus,
    ) -> Result<Vec<Bet>, Error> {
        self.call(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, status, round, game, player, chips, kind
                     FROM bets WHERE round = ?1 AND status = ?2 ORDER BY id",
                )
                .map_err(store_err)?;

            let rows = stmt
                .query_map(params![round, status.as_str()], bet_from_row)
                .map_err(store_err)?;

            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(store_err)
        })
        .await
    }
}

fn get_player(conn: &Connection, id: i64) -> Result<Player, Error> {
    conn.query_row(
        "SELECT id, name, chips, seat, in_hand, cards FROM players WHERE id = ?1",
        params![id],
        player_from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Error::PlayerNotFound,
        e => store_err(e),
    })
}

fn get_game(conn: &Connection, id: i64) -> Result<Game, Error> {
    let mut game = conn
        .query_row(
            "SELECT id, name, dealer, min, in_round FROM games WHERE id = ?1",
            params![id],
            game_from_row,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Error::GameNotFound,
            e => store_err(e),
        })?;

    game.players = get_game_players(conn, id)?;

    Ok(game)
}

fn get_game_players(conn: &Connection, game: i64) -> Result<Vec<Player>, Error> {
    let mut stmt = conn
        .prepare(
            "SELECT p.id, p.name, p.chips, p.seat, p.in_hand, p.cards
             FROM players p JOIN game_players gp ON gp.player = p.id
             WHERE gp.game = ?1 ORDER BY gp.id",
        )
        .map_err(store_err)?;

    let rows = stmt
        .query_map(params![game], player_from_row)
        .map_err(store_err)?;

    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(store_err)
}

fn get_round(conn: &Connection, id: i64) -> Result<Round, Error> {
    conn.query_row(
        "SELECT id, game, status, deck, flop, turn, river, action,
           winning_player, winning_score, winning_hand
         FROM rounds WHERE id = ?1",
        params![id],
        round_from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Error::RoundNotFound,
        e => store_err(e),
    })
}

fn player_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Player> {
    Ok(Player {
        id: row.get(0)?,
        name: row.get(1)?,
        chips: Chips::new(row.get(2)?),
        seat: row.get(3)?,
        in_hand: row.get(4)?,
        cards: row.get(5)?,
        score: 0,
    })
}

fn game_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Game> {
    Ok(Game {
        id: row.get(0)?,
        name: row.get(1)?,
        dealer: row.get(2)?,
        min: Chips::new(row.get(3)?),
        in_round: row.get(4)?,
        players: Vec::new(),
    })
}

fn round_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Round> {
    Ok(Round {
        id: row.get(0)?,
        game: row.get(1)?,
        status: parse_status(row, 2)?,
        deck: row.get(3)?,
        flop: row.get(4)?,
        turn: row.get(5)?,
        river: row.get(6)?,
        action: row.get(7)?,
        winning_player: row.get(8)?,
        winning_score: row.get(9)?,
        winning_hand: row.get(10)?,
        players: Vec::new(),
    })
}

fn bet_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Bet> {
    let kind: String = row.get(6)?;
    let kind = BetType::parse(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            rusqlite::types::Type::Text,
            format!("invalid bet type {kind}").into(),
        )
    })?;

    Ok(Bet {
        id: row.get(0)?,
        status: parse_status(row, 1)?,
        round: row.get(2)?,
        game: row.get(3)?,
        player: row.get(4)?,
        chips: Chips::new(row.get(5)?),
        kind,
    })
}

fn parse_status(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<RoundStatus> {
    let status: String = row.get(idx)?;
    RoundStatus::parse(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("invalid round status {status}").into(),
        )
    })
}

fn store_err(e: rusqlite::Error) -> Error {
    Error::Store(e.to_string())
}

fn no_rows_as_none<T>(e: rusqlite::Error) -> Result<Option<T>, Error> {
    match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        e => Err(store_err(e)),
    }
}

fn one_row(n: usize, missing: Error) -> Result<(), Error> {
    if n == 1 {
        Ok(())
    } else {
        Err(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn player_create_read_delete() {
        let db = Db::open_in_memory().unwrap();

        let player = db
            .insert_player("alice".to_string(), Chips::new(1000))
            .await
            .unwrap();
        assert!(player.id > 0);
        assert_eq!(player.name, "alice");
        assert_eq!(player.chips, Chips::new(1000));
        assert_eq!(player.seat, 0);
        assert!(!player.in_hand);
        assert!(player.cards.is_empty());

        // Duplicate names are rejected.
        let err = db
            .insert_player("alice".to_string(), Chips::new(0))
            .await
            .unwrap_err();
        assert_eq!(err, Error::PlayerNameExists);

        let read = db.player(player.id).await.unwrap();
        assert_eq!(read, player);

        let by_name = db.player_by_name("alice".to_string()).await.unwrap();
        assert_eq!(by_name, Some(player.clone()));
        assert_eq!(db.player_by_name("bob".to_string()).await.unwrap(), None);

        db.delete_players(vec![player.id]).await.unwrap();
        assert_eq!(db.player(player.id).await.unwrap_err(), Error::PlayerNotFound);
        assert_eq!(
            db.delete_players(vec![player.id]).await.unwrap_err(),
            Error::PlayerNotFound
        );
    }

    #[tokio::test]
    async fn player_field_updates() {
        let db = Db::open_in_memory().unwrap();
        let player = db
            .insert_player("bob".to_string(), Chips::new(500))
            .await
            .unwrap();

        db.update_player_chips(player.id, Chips::new(450)).await.unwrap();
        db.update_player_seat(player.id, 3).await.unwrap();
        db.update_player_in_hand(player.id, true).await.unwrap();
        db.update_player_cards(player.id, "AhAd".to_string()).await.unwrap();

        let read = db.player(player.id).await.unwrap();
        assert_eq!(read.chips, Chips::new(450));
        assert_eq!(read.seat, 3);
        assert!(read.in_hand);
        assert_eq!(read.cards, "AhAd");

        assert_eq!(
            db.update_player_chips(999, Chips::ZERO).await.unwrap_err(),
            Error::PlayerNotFound
        );
    }

    #[tokio::test]
    async fn game_create_and_players_join() {
        let db = Db::open_in_memory().unwrap();

        let game = db
            .insert_game("table one".to_string(), Chips::new(10))
            .await
            .unwrap();
        assert!(game.id > 0);
        assert!(game.players.is_empty());

        let err = db
            .insert_game("table one".to_string(), Chips::ZERO)
            .await
            .unwrap_err();
        assert_eq!(err, Error::GameNameExists);

        let alice = db
            .insert_player("alice".to_string(), Chips::new(1000))
            .await
            .unwrap();
        let bob = db
            .insert_player("bob".to_string(), Chips::new(1000))
            .await
            .unwrap();

        db.join_game(alice.id, game.id).await.unwrap();
        db.join_game(bob.id, game.id).await.unwrap();
        // Joining twice is a no-op.
        db.join_game(alice.id, game.id).await.unwrap();

        let players = db.game_players(game.id).await.unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].name, "alice");
        assert_eq!(players[1].name, "bob");

        let read = db.game(game.id).await.unwrap();
        assert_eq!(read.players.len(), 2);

        assert_eq!(db.player_game(alice.id).await.unwrap(), Some(game.id));
        db.leave_game(alice.id).await.unwrap();
        assert_eq!(db.player_game(alice.id).await.unwrap(), None);

        assert_eq!(db.game(999).await.unwrap_err(), Error::GameNotFound);
    }

    #[tokio::test]
    async fn round_lifecycle_fields() {
        let db = Db::open_in_memory().unwrap();
        let game = db
            .insert_game("table".to_string(), Chips::new(10))
            .await
            .unwrap();

        let round = db
            .insert_round(game.id, RoundStatus::NotStarted, "AhAd".to_string())
            .await
            .unwrap();
        assert_eq!(round.game, game.id);
        assert_eq!(round.status, RoundStatus::NotStarted);
        assert_eq!(round.deck, "AhAd");

        db.update_round_status(round.id, RoundStatus::PreFlop).await.unwrap();
        db.update_round_deck(round.id, "KsQs".to_string()).await.unwrap();
        db.update_round_flop(round.id, "2h3h4h".to_string()).await.unwrap();
        db.update_round_river(round.id, "5h".to_string()).await.unwrap();
        db.update_round_turn(round.id, "6h".to_string()).await.unwrap();
        db.update_round_action(round.id, 2).await.unwrap();
        db.update_round_winner(round.id, 7, 1604, "hand".to_string())
            .await
            .unwrap();

        let read = db.round(round.id).await.unwrap();
        assert_eq!(read.status, RoundStatus::PreFlop);
        assert_eq!(read.deck, "KsQs");
        assert_eq!(read.flop, "2h3h4h");
        assert_eq!(read.river, "5h");
        assert_eq!(read.turn, "6h");
        assert_eq!(read.action, 2);
        assert_eq!(read.winning_player, 7);
        assert_eq!(read.winning_score, 1604);
        assert_eq!(read.winning_hand, "hand");

        assert_eq!(db.round(999).await.unwrap_err(), Error::RoundNotFound);
    }

    #[tokio::test]
    async fn bets_append_log() {
        let db = Db::open_in_memory().unwrap();

        let bet = db
            .insert_bet(Bet {
                status: RoundStatus::PreFlop,
                round: 1,
                game: 2,
                player: 3,
                chips: Chips::new(10),
                kind: BetType::Small,
                ..Bet::default()
            })
            .await
            .unwrap();
        assert!(bet.id > 0);
        assert_eq!(bet.kind, BetType::Small);

        db.insert_bet(Bet {
            status: RoundStatus::Flop,
            round: 1,
            game: 2,
            player: 3,
            chips: Chips::new(20),
            kind: BetType::Call,
            ..Bet::default()
        })
        .await
        .unwrap();

        let all = db.round_bets(1).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].kind, BetType::Small);
        assert_eq!(all[1].kind, BetType::Call);

        let preflop = db
            .round_bets_for_status(1, RoundStatus::PreFlop)
            .await
            .unwrap();
        assert_eq!(preflop.len(), 1);
        assert_eq!(preflop[0].chips, Chips::new(10));
    }
}
