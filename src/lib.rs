//! Pinned sites and search engines for a local-first start page.
//!
//! [`manager::CardCollection`] owns one ordered collection, persists it
//! through a [`storage::Storage`], renders it into a [`render::Mount`] and
//! announces every successful write on a broadcast channel.

pub mod collection;
pub mod config;
pub mod index;
pub mod items;
pub mod manager;
pub mod render;
pub mod session;
pub mod shell;
pub mod state;
pub mod storage;
pub mod timers;
pub mod transfer;
pub mod validator;
