// Copyright (C) 2025 Holdem Developers
// SPDX-License-Identifier: Apache-2.0

//! Holdem table server client.
#![warn(clippy::all, rust_2018_idioms, missing_docs)]

mod client;
pub use client::Client;
