//! Terminal front end: prompts, commands and rendering.

pub mod interactive;
pub mod quote;
pub mod rates;
pub mod setup;
pub mod ui;
