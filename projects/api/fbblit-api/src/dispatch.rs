//! The dispatch cascade.
//!
//! A [`BlitContext`] holds the registered backends in priority order, typically hardware first and
//! CPU second, and offers every request to them one after another. The first backend to report
//! [`crate::Outcome::Handled`] ends the cascade. When none does, the built-in [`GenericBackend`] carries
//! the request out, so every entry point always completes.

use crate::backend::{Backend, Operation};
use crate::backends::generic::GenericBackend;
use crate::error::RequestResult;
use crate::request::{BlitRequest, FillRequest};
use alloc::vec::Vec;
use log::{debug, trace};

/// A rectangle of a box list, in destination pixel coordinates.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Rect {
    /// Creates a rectangle.
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Backends for one display, in priority order, plus the software fallback.
pub struct BlitContext<'a> {
    backends: Vec<&'a dyn Backend>,
    generic: GenericBackend,
}

impl Default for BlitContext<'_> {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl core::fmt::Debug for BlitContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.backends.iter().map(|backend| backend.name()))
            .finish()
    }
}

/// Builds a [`BlitContext`].
#[derive(Default)]
pub struct BlitContextBuilder<'a> {
    backends: Vec<&'a dyn Backend>,
}

impl<'a> BlitContextBuilder<'a> {
    /// Appends `backend`. Backends are asked in the order they were added.
    pub fn with_backend(mut self, backend: &'a dyn Backend) -> Self {
        self.backends.push(backend);
        self
    }

    /// Finishes the context.
    pub fn build(self) -> BlitContext<'a> {
        debug!(
            "blit context with {} backend(s): {:?}",
            self.backends.len(),
            self.backends.iter().map(|b| b.name()).collect::<Vec<_>>()
        );
        BlitContext {
            backends: self.backends,
            generic: GenericBackend,
        }
    }
}

impl<'a> BlitContext<'a> {
    /// Starts building a context.
    pub fn builder() -> BlitContextBuilder<'a> {
        BlitContextBuilder::default()
    }

    /// Registered backends, in priority order.
    pub fn backends(&self) -> &[&'a dyn Backend] {
        &self.backends
    }

    fn offering(&self, operation: Operation) -> impl Iterator<Item = &'a dyn Backend> + '_ {
        self.backends
            .iter()
            .copied()
            .filter(move |backend| backend.supports(operation))
    }

    /// Copies a rectangle, possibly within one buffer with overlap.
    ///
    /// Every backend is first offered the overlapped blit, then, if the request carries no
    /// direction hints, the fast path. The software fallback finishes anything left.
    pub fn blit(&self, request: &BlitRequest<'_>) {
        for backend in self.offering(Operation::OverlappedBlit) {
            if backend.overlapped_blit(request).is_handled() {
                trace!("blit: overlapped path of {}", backend.name());
                return;
            }
        }

        if request.direction().is_none() {
            for backend in self.offering(Operation::FastPathBlit) {
                if backend.fast_path_blit(request).is_handled() {
                    trace!("blit: fast path of {}", backend.name());
                    return;
                }
            }
        }

        trace!("blit: generic fallback");
        self.generic.blit(request);
    }

    /// Uploads a client image that does not overlap its destination.
    ///
    /// Only the fast path is offered, then the software fallback.
    pub fn put_image(&self, request: &BlitRequest<'_>) {
        for backend in self.offering(Operation::FastPathBlit) {
            if backend.fast_path_blit(request).is_handled() {
                trace!("put_image: fast path of {}", backend.name());
                return;
            }
        }

        trace!("put_image: generic fallback");
        self.generic.blit(request);
    }

    /// Fills a rectangle with a solid colour.
    pub fn fill(&self, request: &FillRequest<'_>) {
        for backend in self.offering(Operation::Fill) {
            if backend.fill(request).is_handled() {
                trace!("fill: {}", backend.name());
                return;
            }
        }

        trace!("fill: generic fallback");
        self.generic.fill(request);
    }

    /// Copies every box of a clipped box list, each read from `(dx, dy)` pixels away in the source.
    ///
    /// Buffers, depth and direction hints come from `template`; its own rectangle is ignored.
    /// Boxes are copied in the given order, which the caller picks so that overlapping moves
    /// read every box before overwriting it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RequestError`] if any box leaves either buffer. Nothing is copied then.
    pub fn blit_boxes(
        &self,
        template: &BlitRequest<'_>,
        boxes: &[Rect],
        (dx, dy): (i32, i32),
    ) -> RequestResult<()> {
        let source_of = |rect: &Rect| (rect.x.wrapping_add(dx), rect.y.wrapping_add(dy));
        for rect in boxes {
            template.src().check_rect(source_of(rect), rect.width, rect.height)?;
            template.dst().check_rect((rect.x, rect.y), rect.width, rect.height)?;
        }

        for rect in boxes {
            // SAFETY: the box was checked against both buffers above.
            let request =
                unsafe { template.with_rect(source_of(rect), (rect.x, rect.y), rect.width, rect.height) };
            self.blit(&request);
        }
        Ok(())
    }

    /// Fills every box of a clipped box list with the colour of `template`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RequestError`] if any box leaves the buffer. Nothing is filled then.
    pub fn fill_boxes(&self, template: &FillRequest<'_>, boxes: &[Rect]) -> RequestResult<()> {
        for rect in boxes {
            template.dst().check_rect((rect.x, rect.y), rect.width, rect.height)?;
        }

        for rect in boxes {
            // SAFETY: the box was checked against the buffer above.
            let request = unsafe { template.with_rect((rect.x, rect.y), rect.width, rect.height) };
            self.fill(&request);
        }
        Ok(())
    }
}
