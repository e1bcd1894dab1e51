//! HTTP API for the presentation layer
//!
//! Every operation is forwarded to the controller; state is read from its
//! published snapshots.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
pub use types::*;

use crate::runtime::Controller;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub controller: Controller,
}

impl AppState {
    pub fn new(controller: Controller) -> Self {
        Self { controller }
    }
}
