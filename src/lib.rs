pub mod account;
pub mod ante;
pub mod app;
pub mod cli;
pub mod config;
pub mod context;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod events;
pub mod gas;
pub mod genesis;
pub mod keeper;
pub mod migrations;
pub mod msg_server;
pub mod params;
pub mod post;
pub mod storage;
pub mod sudo;
pub mod tx;
pub mod vm;

#[cfg(test)]
mod testing;
