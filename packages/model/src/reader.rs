//! The FeatureReader trait and reader lifecycle state.

use std::sync::Arc;

use crate::{Error, Feature, Schema};

/// Pull features one at a time from a stream.
///
/// Readers are single-pass: each `next_feature` yields the next feature in
/// stream order, and once `close` has been called every further operation
/// fails with `Error::UseAfterClose`.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Box<dyn FeatureReader>`.
pub trait FeatureReader: Send {
    /// The schema every pulled feature conforms to.
    fn schema(&self) -> Result<Arc<Schema>, Error>;

    /// Whether another feature is available.
    fn has_next(&mut self) -> Result<bool, Error>;

    /// Pull the next feature.
    ///
    /// # Errors
    ///
    /// * `Error::Exhausted` - no features are left.
    /// * `Error::UseAfterClose` - the reader was closed.
    fn next_feature(&mut self) -> Result<Feature, Error>;

    /// Release the reader and whatever it wraps. May only be called once.
    fn close(&mut self) -> Result<(), Error>;

    /// Iterate over the remaining features.
    ///
    /// Iteration stops after the stream ends or after `has_next` fails;
    /// errors from `next_feature` are yielded and iteration continues.
    fn features(&mut self) -> Features<'_, Self>
    where
        Self: Sized,
    {
        Features {
            reader: self,
            done: false,
        }
    }
}

/// Iterator over the features of a reader. See `FeatureReader::features`.
pub struct Features<'a, R: ?Sized> {
    reader: &'a mut R,
    done: bool,
}

impl<R: FeatureReader + ?Sized> Iterator for Features<'_, R> {
    type Item = Result<Feature, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.has_next() {
            Ok(true) => Some(self.reader.next_feature()),
            Ok(false) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

// Blanket implementations for references and boxes

impl<T: FeatureReader + ?Sized> FeatureReader for &mut T {
    fn schema(&self) -> Result<Arc<Schema>, Error> {
        (**self).schema()
    }

    fn has_next(&mut self) -> Result<bool, Error> {
        (**self).has_next()
    }

    fn next_feature(&mut self) -> Result<Feature, Error> {
        (**self).next_feature()
    }

    fn close(&mut self) -> Result<(), Error> {
        (**self).close()
    }
}

impl<T: FeatureReader + ?Sized> FeatureReader for Box<T> {
    fn schema(&self) -> Result<Arc<Schema>, Error> {
        self.as_ref().schema()
    }

    fn has_next(&mut self) -> Result<bool, Error> {
        self.as_mut().has_next()
    }

    fn next_feature(&mut self) -> Result<Feature, Error> {
        self.as_mut().next_feature()
    }

    fn close(&mut self) -> Result<(), Error> {
        self.as_mut().close()
    }
}

/// The two lifecycle states of a reader.
///
/// Readers keep everything they own inside `Open`; closing moves it out,
/// so nothing can be reached through a closed reader.
#[derive(Debug)]
pub enum ReaderState<T> {
    Open(T),
    Closed,
}

impl<T> ReaderState<T> {
    pub fn open(&self, component: &'static str) -> Result<&T, Error> {
        match self {
            ReaderState::Open(state) => Ok(state),
            ReaderState::Closed => Err(Error::UseAfterClose { component }),
        }
    }

    pub fn open_mut(&mut self, component: &'static str) -> Result<&mut T, Error> {
        match self {
            ReaderState::Open(state) => Ok(state),
            ReaderState::Closed => Err(Error::UseAfterClose { component }),
        }
    }

    /// Transition to `Closed`, handing back the open state.
    pub fn close(&mut self, component: &'static str) -> Result<T, Error> {
        match std::mem::replace(self, ReaderState::Closed) {
            ReaderState::Open(state) => Ok(state),
            ReaderState::Closed => Err(Error::UseAfterClose { component }),
        }
    }
}
