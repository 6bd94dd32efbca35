//! Telegram bot that relays chat to Gemini, tags message sentiment,
//! extracts text from uploaded files, summarizes web searches, and
//! persists users and interaction history to SQLite.

pub mod bot;
pub mod config;
pub mod gemini;
pub mod sentiment;
