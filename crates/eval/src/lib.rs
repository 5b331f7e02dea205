// Copyright (C) 2025 Holdem Developers
// SPDX-License-Identifier: Apache-2.0

//! Holdem Poker cards and hand evaluator.
#![warn(clippy::all, rust_2018_idioms, missing_docs)]

pub mod cards;
pub mod eval;

pub use cards::{Card, CardsError, Deck, Rank, Suit};
