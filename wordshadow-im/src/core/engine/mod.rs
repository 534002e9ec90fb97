//! Suggestion engine - the public entry point of the input-method core
//!
//! [`SuggestionEngine`] moves a [`CompositionSession`] onto a dedicated
//! worker thread and exposes its operations as bounded-time calls. Every
//! call is queued behind the ones before it, so edits reach the editor in
//! the order they were requested, and a caller that stops waiting gets an
//! empty list while its task still runs to completion.

mod init;

#[cfg(test)]
mod tests;

pub use init::load_lexicon;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::connection::EditorConnection;
use super::dispatcher::{DispatchError, PendingQuery, SerializedDispatcher, TaskKind};
use super::session::{CompositionSession, SessionServices, SessionSnapshot};
use crate::config::Settings;

/// Name of the session worker thread.
const WORKER_NAME: &str = "wordshadow-session";

/// Bounded-time facade over one composition session.
pub struct SuggestionEngine {
    dispatcher: SerializedDispatcher<CompositionSession>,
    /// How long `query`/`pick` and friends wait before giving up
    query_timeout: Duration,
    released: AtomicBool,
}

impl SuggestionEngine {
    /// Create an engine driving `connection` with the given collaborators.
    pub fn new(
        connection: Box<dyn EditorConnection>,
        services: SessionServices,
        settings: Settings,
    ) -> Result<Self> {
        crate::logging::init_logging();
        let query_timeout = settings.pipeline.query_timeout();
        let session = CompositionSession::new(connection, services, settings);
        let dispatcher = SerializedDispatcher::spawn(WORKER_NAME, session)
            .context("failed to spawn session worker")?;
        Ok(Self {
            dispatcher,
            query_timeout,
            released: AtomicBool::new(false),
        })
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Start an input episode. `combining_spec` enables normalization of
    /// composed dead-key sequences.
    pub fn start_input(&self, combining_spec: Option<&str>) {
        let combining_spec = combining_spec.map(str::to_string);
        let pending = self.dispatcher.submit(TaskKind::StartInput, move |session| {
            session.start_input(combining_spec.as_deref());
            Ok(())
        });
        self.resolve(pending);
    }

    /// Finish the input episode, keeping any composing text.
    pub fn finish_input(&self) {
        let pending = self.dispatcher.submit(TaskKind::FinishInput, |session| {
            session.finish_input();
            Ok(())
        });
        self.resolve(pending);
    }

    /// Suggestions for the word typed so far. Empty on timeout.
    pub fn query(&self, word: &str) -> Vec<String> {
        self.resolve(self.submit_query(word))
    }

    /// Commit `word` and return the predictions that follow it. Empty on
    /// timeout; the commit itself still happens.
    pub fn pick(&self, word: &str) -> Vec<String> {
        self.resolve(self.submit_pick(word))
    }

    /// Queue a typing query without waiting for it.
    pub fn submit_query(&self, word: &str) -> PendingQuery<Vec<String>> {
        let word = word.to_string();
        self.dispatcher.submit(TaskKind::Typing, move |session| {
            session
                .query_typing(&word)
                .with_context(|| format!("query for {:?}", word))
        })
    }

    /// Queue a pick without waiting for it.
    pub fn submit_pick(&self, word: &str) -> PendingQuery<Vec<String>> {
        let word = word.to_string();
        self.dispatcher.submit(TaskKind::ExplicitPick, move |session| {
            session
                .pick_word(&word)
                .with_context(|| format!("pick of {:?}", word))
        })
    }

    /// Copy of the session state once every earlier call has run.
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        let pending = self
            .dispatcher
            .submit(TaskKind::Snapshot, |session| Ok(Some(session.snapshot())));
        self.resolve(pending)
    }

    /// Close the suggestion source and stop the worker after the queued
    /// calls have run. Later calls return empty results.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        let pending = self.dispatcher.submit(TaskKind::Release, |session| {
            session.close();
            Ok(())
        });
        self.resolve(pending);
        self.dispatcher.shutdown();
        debug!("suggestion engine released");
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    fn resolve<T: Default>(&self, pending: PendingQuery<T>) -> T {
        let id = pending.id();
        let kind = pending.kind();
        match pending.wait(self.query_timeout) {
            Ok(value) => value,
            Err(DispatchError::TimedOut(waited)) => {
                warn!(id, ?kind, "no result within {:?}, returning empty", waited);
                T::default()
            }
            Err(DispatchError::WorkerGone) => {
                debug!(id, ?kind, "engine released, returning empty");
                T::default()
            }
        }
    }
}

impl Drop for SuggestionEngine {
    fn drop(&mut self) {
        self.release();
    }
}
