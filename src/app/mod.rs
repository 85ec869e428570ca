//! Interactive dashboard
//!
//! Contains the terminal wrapper, the dashboard state fed by posted
//! outcomes, and the screens rendering it.

pub mod dashboard;
pub mod screens;
pub mod state;
pub mod tui;

pub use dashboard::{Dashboard, DashboardHandle};
pub use state::{DashboardAction, DashboardState, RunPhase};
pub use tui::Tui;
