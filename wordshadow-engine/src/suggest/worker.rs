use std::sync::{Arc, Mutex, PoisonError, mpsc};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::history::{SharedHistory, now_unix};
use crate::lexicon::Lexicon;

use super::rank::rank_suggestions;
use super::{SuggestedWords, SuggestionCallback, SuggestionQuerySource, SuggestionRequest};

struct Job {
    request: SuggestionRequest,
    on_result: SuggestionCallback,
}

/// Suggestion source that ranks on a dedicated worker thread.
///
/// Every request is answered exactly once: by the worker, or immediately
/// with no words once the source has been closed.
pub struct LexiconSuggest {
    tx: Mutex<Option<mpsc::Sender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl LexiconSuggest {
    /// Spawn the worker thread.
    pub fn spawn(
        lexicon: Arc<Lexicon>,
        history: Option<SharedHistory>,
        max_suggestions: usize,
    ) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel::<Job>();
        let worker = thread::Builder::new()
            .name("wordshadow-suggest".into())
            .spawn(move || suggest_worker(rx, lexicon, history, max_suggestions))?;

        Ok(Self {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        })
    }
}

impl SuggestionQuerySource for LexiconSuggest {
    fn get_suggestions(&self, request: SuggestionRequest, on_result: SuggestionCallback) {
        let sequence_number = request.sequence_number;
        let job = Job { request, on_result };
        let rejected = {
            let guard = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
            match guard.as_ref() {
                Some(tx) => match tx.send(job) {
                    Ok(()) => return,
                    Err(mpsc::SendError(job)) => {
                        warn!(sequence_number, "suggestion worker gone");
                        job
                    }
                },
                None => job,
            }
        };
        debug!(sequence_number, "suggestion source closed, answering empty");
        (rejected.on_result)(SuggestedWords::empty(sequence_number));
    }

    fn close(&self) {
        // Dropping the sender ends the worker loop after queued jobs
        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner).take();
        drop(tx);
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                warn!("suggestion worker panicked");
            }
            debug!("suggestion source closed");
        }
    }
}

impl Drop for LexiconSuggest {
    fn drop(&mut self) {
        self.close();
    }
}

fn suggest_worker(
    rx: mpsc::Receiver<Job>,
    lexicon: Arc<Lexicon>,
    history: Option<SharedHistory>,
    max_suggestions: usize,
) {
    while let Ok(Job { request, on_result }) = rx.recv() {
        let now = now_unix();
        let words = match &history {
            Some(h) => h.read(|h| rank_suggestions(&lexicon, Some(h), &request, max_suggestions, now)),
            None => rank_suggestions(&lexicon, None, &request, max_suggestions, now),
        };
        debug!(
            sequence_number = request.sequence_number,
            count = words.len(),
            "suggestions ready"
        );
        on_result(SuggestedWords {
            sequence_number: request.sequence_number,
            words,
        });
    }
}
