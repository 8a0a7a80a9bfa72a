//! An in-memory FeatureReader over a fixed list of features.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::{Error, Feature, FeatureReader, ReaderState, Schema};

const COMPONENT: &str = "MemoryFeatureReader";

struct Open {
    schema: Arc<Schema>,
    features: VecDeque<Feature>,
}

/// Serves a fixed list of features in order.
///
/// Useful as the innermost reader of a pipeline in tests. `closed_flag`
/// lets a test observe that a decorator closed what it wraps.
pub struct MemoryFeatureReader {
    state: ReaderState<Open>,
    closed: Arc<AtomicBool>,
}

impl MemoryFeatureReader {
    pub fn new(schema: Arc<Schema>, features: impl IntoIterator<Item = Feature>) -> Self {
        Self {
            state: ReaderState::Open(Open {
                schema,
                features: features.into_iter().collect(),
            }),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A flag that flips to `true` when this reader is closed.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

impl FeatureReader for MemoryFeatureReader {
    fn schema(&self) -> Result<Arc<Schema>, Error> {
        Ok(Arc::clone(&self.state.open(COMPONENT)?.schema))
    }

    fn has_next(&mut self) -> Result<bool, Error> {
        Ok(!self.state.open(COMPONENT)?.features.is_empty())
    }

    fn next_feature(&mut self) -> Result<Feature, Error> {
        self.state
            .open_mut(COMPONENT)?
            .features
            .pop_front()
            .ok_or(Error::Exhausted)
    }

    fn close(&mut self) -> Result<(), Error> {
        self.state.close(COMPONENT)?;
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
