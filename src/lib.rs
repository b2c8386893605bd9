//! pomo - A Pomodoro timer for the terminal
//!
//! This crate provides the Pomodoro session engine (state machine, session
//! rotation, timers), the completed-session history stores, and the `pomo`
//! command-line interface built on top of them.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod storage;

pub use cli::args::{Cli, Commands, OutputFormat};
pub use engine::SessionEngine;
pub use error::PomoError;
