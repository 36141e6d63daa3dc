//! Ollaterm is a terminal chat client for locally hosted LLM inference
//! servers.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`api`] defines the wire payloads for both server surfaces (native and
//!   OpenAI-compatible) and performs model discovery.
//! - [`core`] owns session state, transcript rules, configuration, and
//!   streaming orchestration.
//! - [`ui`] renders the terminal interface and runs the interactive event
//!   loop that drives user input and display updates.
//! - [`cli`] parses arguments and dispatches into [`ui::chat_loop`] for
//!   interactive sessions.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
