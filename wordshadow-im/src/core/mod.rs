//! Core input-method functionality
//!
//! The editor contract and its in-memory implementation, the text cache
//! that shadows the editor, the word composer, the composition session and
//! the serialized dispatcher that runs it behind [`engine::SuggestionEngine`].

pub mod composer;
pub mod connection;
pub mod dispatcher;
pub mod engine;
pub mod keycode;
pub mod memory_editor;
pub mod session;
pub mod shadow;
pub mod state;

#[cfg(test)]
mod test_support;
