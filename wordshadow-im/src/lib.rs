//! wordshadow-im: the input-method core
//!
//! Keeps a local shadow of the text before the editor's cursor and runs
//! typing queries and word picks through a single serialized worker.
//! It uses wordshadow-engine for lexicon lookups, user history and
//! language rules.

pub mod config;
pub mod core;
pub mod logging;

pub use config::Settings;
pub use core::connection::{ConnectionError, EditorConnection, GetTextFlags};
pub use core::dispatcher::{DispatchError, PendingQuery, TaskKind};
pub use core::engine::{SuggestionEngine, load_lexicon};
pub use core::keycode::{KeyEvent, KeyModifiers, Keysym};
pub use core::memory_editor::{EditorOp, MemoryEditor};
pub use core::session::{SessionError, SessionServices, SessionSnapshot, SessionStats};
pub use core::shadow::{ShadowSnapshot, TextCursorShadow};
pub use core::state::{CommitType, SpaceState};
