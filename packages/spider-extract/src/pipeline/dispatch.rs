//! Callback dispatch.
//!
//! Every emission point accepts consumers of two shapes: one that takes just
//! the value, and one that also takes the page the value came from. The
//! shape is fixed when the callback is built, so emitting never inspects the
//! consumer.

use std::fmt;

use crate::types::page::PageRecord;

/// Whether a consumer receives the originating page with each value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncludeOrigin {
    No,
    Yes,
}

/// A registered consumer for values of type `T`.
pub enum Callback<'a, T: ?Sized> {
    /// Called with the value only
    Value(Box<dyn FnMut(&T) + 'a>),
    /// Called with the value and its originating page
    WithPage(Box<dyn FnMut(&T, &PageRecord) + 'a>),
}

impl<'a, T: ?Sized> Callback<'a, T> {
    /// Build a consumer that only wants values.
    pub fn value<F>(f: F) -> Self
    where
        F: FnMut(&T) + 'a,
    {
        Self::Value(Box::new(f))
    }

    /// Build a consumer that wants each value with its page.
    pub fn with_page<F>(f: F) -> Self
    where
        F: FnMut(&T, &PageRecord) + 'a,
    {
        Self::WithPage(Box::new(f))
    }

    /// Shape chosen at registration.
    pub fn include_origin(&self) -> IncludeOrigin {
        match self {
            Self::Value(_) => IncludeOrigin::No,
            Self::WithPage(_) => IncludeOrigin::Yes,
        }
    }

    /// Invoke the consumer.
    pub fn call(&mut self, value: &T, page: &PageRecord) {
        match self {
            Self::Value(f) => f(value),
            Self::WithPage(f) => f(value, page),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Callback<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback")
            .field(&self.include_origin())
            .finish()
    }
}

/// Consumers registered for one emission point, in registration order.
pub struct Dispatcher<'a, T: ?Sized> {
    callbacks: Vec<Callback<'a, T>>,
}

impl<T: ?Sized> Default for Dispatcher<'_, T> {
    fn default() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }
}

impl<'a, T: ?Sized> Dispatcher<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register another consumer.
    pub fn push(&mut self, callback: Callback<'a, T>) {
        self.callbacks.push(callback);
    }

    /// Deliver a value to every consumer.
    pub fn emit(&mut self, value: &T, page: &PageRecord) {
        for callback in &mut self.callbacks {
            callback.call(value, page);
        }
    }

    /// Check if nobody is listening.
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }
}

impl<T: ?Sized> fmt::Debug for Dispatcher<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.callbacks).finish()
    }
}
