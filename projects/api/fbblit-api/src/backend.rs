//! The contract between the dispatch cascade and the blit backends.
//!
//! A backend offers up to three operations. Each is either absent ([`Backend::supports`] returns
//! `false`, and the cascade never calls it) or present, in which case it may still decline any
//! individual request by returning [`Outcome::NotHandled`]. Declining is a routing decision, not
//! a failure: the cascade simply asks the next backend.

use crate::request::{BlitRequest, FillRequest};
use derive_enum_all_values::AllValues;

/// One of the operations a backend may offer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, AllValues)]
pub enum Operation {
    /// A copy whose source and destination may overlap, typically a scroll or window move.
    OverlappedBlit,
    /// A copy on the fast path used for non-overlapping uploads and for copies the
    /// overlapped path declined.
    FastPathBlit,
    /// A solid colour fill.
    Fill,
}

/// Whether a backend took care of a request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[must_use]
pub enum Outcome {
    /// The request has been fully carried out.
    Handled,
    /// The request was left untouched; try the next backend.
    NotHandled,
}

impl Outcome {
    /// Whether the request has been carried out.
    #[inline(always)]
    pub fn is_handled(self) -> bool {
        self == Outcome::Handled
    }
}

impl From<bool> for Outcome {
    #[inline]
    fn from(handled: bool) -> Self {
        if handled {
            Outcome::Handled
        } else {
            Outcome::NotHandled
        }
    }
}

/// A blit backend.
///
/// Implementations must leave the destination untouched whenever they return
/// [`Outcome::NotHandled`].
pub trait Backend: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Whether `operation` is offered at all.
    fn supports(&self, operation: Operation) -> bool;

    /// Copies a rectangle that may overlap its source.
    fn overlapped_blit(&self, _request: &BlitRequest<'_>) -> Outcome {
        Outcome::NotHandled
    }

    /// Copies a rectangle on the fast path.
    fn fast_path_blit(&self, _request: &BlitRequest<'_>) -> Outcome {
        Outcome::NotHandled
    }

    /// Fills a rectangle with a solid colour.
    fn fill(&self, _request: &FillRequest<'_>) -> Outcome {
        Outcome::NotHandled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nothing;

    impl Backend for Nothing {
        fn name(&self) -> &'static str {
            "nothing"
        }

        fn supports(&self, _operation: Operation) -> bool {
            true
        }
    }

    #[test]
    fn default_operations_decline() {
        let mut buffer = [0u8; 16];
        let blit = BlitRequest::within(&mut buffer, 4, 8, (0, 0), (1, 1), 2, 2).unwrap();
        assert_eq!(Nothing.overlapped_blit(&blit), Outcome::NotHandled);
        assert_eq!(Nothing.fast_path_blit(&blit), Outcome::NotHandled);
        drop(blit);

        let fill = FillRequest::new(&mut buffer, 4, 8, (0, 0), 2, 2, 7).unwrap();
        assert_eq!(Nothing.fill(&fill), Outcome::NotHandled);
        assert_eq!(buffer, [0u8; 16]);
    }

    #[test]
    fn outcome_from_bool() {
        assert!(Outcome::from(true).is_handled());
        assert!(!Outcome::from(false).is_handled());
    }

    #[test]
    fn operations_are_enumerable() {
        assert_eq!(Operation::all_values().len(), 3);
    }
}
