//! Stratabin library
//!
//! Headless core of the Stratabin workspace: the store, the writing-section
//! codec, persistence and the chat relay client.

pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod sections;
pub mod services;
pub mod storage;
pub mod workspace;
