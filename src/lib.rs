// ABOUTME: Library root for parley: re-exports all modules for integration testing.
// ABOUTME: The binary entry point is in main.rs, which uses this crate as a library.

pub mod api;
pub mod app;
pub mod auth;
pub mod chat;
pub mod cli;
pub mod config;
pub mod conversations;
pub mod flight;
pub mod messages;
pub mod navigation;
pub mod observe;
pub mod session;
pub mod storage;
