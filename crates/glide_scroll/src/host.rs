//! Scroll host abstraction
//!
//! The engine never touches a UI toolkit directly. Everything it needs to
//! know about layout, and the one mutation it performs, goes through
//! [`ScrollHost`]. [`crate::document::Document`] is the in-memory
//! implementation used by tests and the CLI.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use slotmap::new_key_type;

use crate::interrupt::InterruptionSignal;

new_key_type! {
    /// Handle to an element owned by a scroll host
    pub struct ElementId;
}

/// The surface an animation scrolls
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Surface {
    /// The whole-page viewport
    Viewport,
    /// A scrollable container element
    Container(ElementId),
}

/// Layout queries and scroll writes the engine performs
///
/// Offsets follow the usual layout conventions: `offset_top` is measured
/// from the element's offset parent, and scroll offsets grow downwards from
/// 0 at the top of the surface.
pub trait ScrollHost: Send {
    /// Look up an element by its identifier
    fn element_by_id(&self, id: &str) -> Option<ElementId>;

    /// Distance from the top of the element's offset parent
    fn offset_top(&self, element: ElementId) -> f64;

    /// Nearest positioned ancestor, `None` at the root or for detached elements
    fn offset_parent(&self, element: ElementId) -> Option<ElementId>;

    /// Rendered height of the element
    fn offset_height(&self, element: ElementId) -> f64;

    /// Live scroll offset of the surface
    fn scroll_offset(&self, surface: Surface) -> f64;

    /// Scroll the surface to `offset`
    fn set_scroll_offset(&mut self, surface: Surface, offset: f64);

    /// Height of the visible part of the surface
    fn visible_extent(&self, surface: Surface) -> f64;

    /// Total scrollable height of the surface's content
    fn scroll_extent(&self, surface: Surface) -> f64;

    /// The interruption signal raised by user wheel input on this host
    fn interruption_signal(&self) -> InterruptionSignal;
}

/// A host shared between the caller and running animations
pub type SharedHost<H> = Arc<Mutex<H>>;

pub(crate) fn lock_host<H: ?Sized>(host: &Mutex<H>) -> MutexGuard<'_, H> {
    host.lock().unwrap_or_else(PoisonError::into_inner)
}
