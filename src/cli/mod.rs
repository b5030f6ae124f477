//! Command implementations and terminal rendering

pub mod index;
pub mod prices;
pub mod serve;
pub mod setup;
pub mod token;
pub mod ui;
