//! Dialog Engine - Conversational dialog orchestration
//!
//! This crate manages multi-turn conversations as a persisted stack of
//! dialogs: waterfalls of steps, typed prompts with choice rendering and
//! recognition, and versioned component containers.
//!
//! # Layers
//!
//! - `domain` - dialogs, prompts, choices and the shared foundation types
//! - `ports` - storage and turn transport interfaces
//! - `adapters` - in-memory/file storage and the test transport
//! - `application` - the `DialogManager` turn handler
//! - `config` - environment-driven configuration and tracing setup

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
