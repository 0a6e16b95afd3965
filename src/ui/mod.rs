//! Rendering only: every widget reads from [`crate::state::AppState`].

pub mod dashboard;
pub mod panels;
pub mod plot;
