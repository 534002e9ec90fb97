//! Editor connection contract
//!
//! The editor owns the text; the input method only sees it through these
//! request/response calls, any of which may be slow or fail.

use super::keycode::KeyEvent;

/// Errors reported by an editor connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// No editor is attached, or the editor went away
    #[error("editor not connected")]
    NotConnected,

    /// The editor refused the request
    #[error("editor rejected request: {0}")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, ConnectionError>;

/// Flags for [`EditorConnection::text_before_cursor`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetTextFlags(pub u32);

impl GetTextFlags {
    pub const NONE: GetTextFlags = GetTextFlags(0);
    /// Ask the editor to keep styling spans
    pub const WITH_STYLES: GetTextFlags = GetTextFlags(1);
}

/// The remote text surface.
///
/// Offsets and lengths are in characters.
pub trait EditorConnection: Send {
    fn begin_batch_edit(&mut self) -> Result<()>;

    fn end_batch_edit(&mut self) -> Result<()>;

    /// Replace the composing region (or insert at the cursor) with `text`
    /// and drop the composing region.
    fn commit_text(&mut self, text: &str, new_cursor_position: i32) -> Result<()>;

    /// Replace the composing region with `text`, keeping it composing.
    fn set_composing_text(&mut self, text: &str, new_cursor_position: i32) -> Result<()>;

    /// Commit the composing region as-is.
    fn finish_composing_text(&mut self) -> Result<()>;

    fn send_key_event(&mut self, event: &KeyEvent) -> Result<()>;

    /// Up to `n` characters immediately before the cursor.
    fn text_before_cursor(&mut self, n: usize, flags: GetTextFlags) -> Result<String>;
}
