// Copyright (C) 2025 Holdem Developers
// SPDX-License-Identifier: Apache-2.0

//! Holdem table server.
#![warn(clippy::all, rust_2018_idioms, missing_docs)]

pub mod db;
pub mod engine;
pub mod ring;
pub mod server;
pub mod service;

pub use server::{run, Config};
