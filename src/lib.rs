// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Moneybook - Personal Finance Bookkeeping Service
//!
//! Accounts keep wallets, spending categories, receipt images and
//! transactions. Every request past login carries a bearer session token.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum) and request validation
//! - `auth` - Credential derivation and session authentication
//! - `interactor` - Business operations across the record and blob stores
//! - `storage` - Record store (redb) and blob store adapters

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod interactor;
pub mod models;
pub mod state;
pub mod storage;
