//! Terminal study companion: browse a syllabus, ask a chat backend to explain
//! a topic in English or Hindi, read the answer and hear it spoken.

pub mod app;
pub mod chat;
pub mod clipboard;
pub mod config;
pub mod event;
pub mod language;
pub mod logging;
pub mod navigator;
pub mod render;
pub mod speech;
pub mod syllabus;
pub mod ui;
