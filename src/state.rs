// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::interactor::Interactor;

#[derive(Clone)]
pub struct AppState {
    pub interactor: Arc<Interactor>,
}

impl AppState {
    pub fn new(interactor: Interactor) -> Self {
        Self {
            interactor: Arc::new(interactor),
        }
    }
}
