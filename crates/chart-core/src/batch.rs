//! Decoding many sentences on a pool of worker threads.
//!
//! Sentences share nothing mutable: each worker builds its own `Manager`
//! from a copy of the context, runs the caller's query against it, and drops
//! it before taking the next sentence.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use tracing::{debug, debug_span, warn};

use crate::error::{DecodeError, Result};
use crate::rules::RuleApplicationSource;
use crate::scoring::ScoreFunction;
use crate::search::{decode, Manager, SentenceContext};
use crate::settings::DecoderSettings;

/// One sentence and the rules that apply to it.
#[derive(Clone, Copy)]
pub struct BatchInput<'a> {
    pub tokens: &'a [String],
    pub rules: &'a dyn RuleApplicationSource,
}

/// Decode `inputs` on up to `threads` workers and run `query` on each
/// filled manager.
///
/// Results come back in input order. A failing sentence yields an `Err` in
/// its own slot and does not affect the others; a panic in its rule source,
/// the scorer or `query` is caught and reported there too.
pub fn decode_batch<T, F>(
    inputs: &[BatchInput<'_>],
    scorer: &dyn ScoreFunction,
    settings: &DecoderSettings,
    threads: usize,
    query: F,
) -> Vec<Result<T>>
where
    T: Send,
    F: Fn(&Manager<'_>) -> Result<T> + Sync,
{
    let _span = debug_span!("decode_batch", sentences = inputs.len(), threads).entered();
    let decode_one = |id: usize| -> Result<T> {
        let input = &inputs[id];
        let ctx = SentenceContext::new(input.rules, scorer, settings).with_sentence_id(id);
        let manager = decode(ctx, input.tokens.to_vec())?;
        query(&manager)
    };
    let run = |id: usize| -> Result<T> {
        panic::catch_unwind(AssertUnwindSafe(|| decode_one(id))).unwrap_or_else(|_| {
            warn!(sentence_id = id, "sentence panicked");
            Err(DecodeError::SentencePanicked(id))
        })
    };

    let workers = threads.clamp(1, inputs.len().max(1));
    if workers == 1 {
        return (0..inputs.len()).map(run).collect();
    }

    let next = AtomicUsize::new(0);
    let (result_tx, result_rx) = mpsc::channel::<(usize, Result<T>)>();
    thread::scope(|scope| {
        for _ in 0..workers {
            let result_tx = result_tx.clone();
            let next = &next;
            let run = &run;
            scope.spawn(move || loop {
                let id = next.fetch_add(1, Ordering::Relaxed);
                if id >= inputs.len() {
                    break;
                }
                if result_tx.send((id, run(id))).is_err() {
                    break;
                }
            });
        }
    });
    drop(result_tx);

    let mut slots: Vec<Option<Result<T>>> = (0..inputs.len()).map(|_| None).collect();
    for (id, result) in result_rx {
        slots[id] = Some(result);
    }
    debug!(decoded = slots.iter().filter(|s| s.is_some()).count());
    slots.into_iter().flatten().collect()
}
