pub mod analysis;
pub mod bmi;
pub mod client;
pub mod config;
pub mod controller;
pub mod drafts;
pub mod history;
pub mod interview;
pub mod labels;
pub mod models;
pub mod render;
pub mod service;
pub mod state;
pub mod steps;
pub mod suggestions;
pub mod summary;
pub mod validation;
pub mod view;
pub mod workflow;

#[cfg(test)]
pub mod testing;

pub use client::{HttpBackend, IntakeBackend};
pub use config::{Config, LogFormat};
pub use controller::IntakeController;
pub use service::{AppState, build_router, create_app};
pub use workflow::{build_intake_wizard, create_flow_runner};
pub use models::*;
