// Copyright (C) 2025 Holdem Developers
// SPDX-License-Identifier: Apache-2.0

//! Scripted demo client.
//!
//! Creates players and a table, starts a hand, and drives it to showdown by
//! always calling the exact amount to call, logging each street.
use anyhow::Result;
use clap::Parser;
use log::info;
use std::time::{SystemTime, UNIX_EPOCH};

use holdem_client::Client;
use holdem_core::types::{Bet, BetType, Chips, Player, RoundStatus};
use holdem_eval::eval::HandRank;

#[derive(Debug, Parser)]
struct Cli {
    /// The server listening address.
    #[clap(long, short, default_value = "127.0.0.1")]
    address: String,
    /// The server listening port.
    #[clap(long, short, default_value_t = 50051)]
    port: u16,
    /// Number of players to seat.
    #[clap(long, short = 'n', default_value_t = 5)]
    players: usize,
    /// Chips for each player.
    #[clap(long, default_value_t = 1000)]
    chips: i64,
    /// The small blind amount.
    #[clap(long, default_value_t = 10)]
    min: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    anyhow::ensure!(
        (2..=8).contains(&cli.players),
        "players must be between 2 and 8"
    );

    let mut client = Client::connect(&cli.address, cli.port).await?;

    // Names are unique per run against a persistent server store.
    let run_id = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis();
    let names = (1..=cli.players)
        .map(|i| format!("demo-{run_id}-{i}"))
        .collect::<Vec<_>>();

    let players = names
        .iter()
        .map(|name| Player {
            name: name.clone(),
            chips: Chips::new(cli.chips),
            ..Player::default()
        })
        .collect();
    client.create_players(players).await?;

    let game = client.create_game(&format!("demo-table-{run_id}")).await?;
    client.set_game_players(game.id, names).await?;
    client.allocate_game_slots(game.id).await?;
    client.set_button_positions(game.id).await?;
    let game = client.set_min(game.id, Chips::new(cli.min)).await?;

    info!(
        "Table {} ready, dealer on seat {}, blinds {}/{}",
        game.name,
        game.dealer,
        game.min,
        game.min * 2
    );

    let round = client.create_round_from_game(game.id).await?;
    client.validate_pre_round(round.id).await?;
    let round = client.start_round(round.id).await?;
    info!("Round {} started, action on seat {}", round.id, round.action);

    // Call down every street until the showdown settles the hand.
    let mut status = round.status;
    loop {
        let current = client.get_round(round.id).await?;
        if current.status == RoundStatus::Over {
            break;
        }

        if current.status != status {
            let board = format!("{}{}{}", current.flop, current.river, current.turn);
            info!("Street {} board [{board}]", current.status);
            status = current.status;
        }

        let player = client.get_player_on_bet(round.id).await?;
        let to_call = client.get_amount_to_call(round.id, player.id).await?;

        client
            .make_bet(Bet {
                status: current.status,
                round: current.id,
                game: game.id,
                player: player.id,
                chips: to_call.chips,
                kind: BetType::Call,
                ..Bet::default()
            })
            .await?;

        info!("{} calls {}", player.name, to_call.chips);
    }

    let over = client.get_round(round.id).await?;
    let winner = over
        .players
        .iter()
        .find(|p| p.id == over.winning_player)
        .map(|p| p.name.clone())
        .unwrap_or_default();

    info!(
        "Round over, {winner} wins with {} ({}, score {})",
        over.winning_hand,
        HandRank::from_score(over.winning_score),
        over.winning_score
    );

    client.close().await;

    Ok(())
}
