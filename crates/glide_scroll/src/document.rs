//! Headless document
//!
//! An in-memory scroll host: an arena of elements linked through their
//! offset parents, a page viewport, and optional scrollable containers.
//! Scroll writes are clamped to the scrollable range like a browser would,
//! and can be snapped to whole pixels to reproduce hosts that round
//! `scrollTo` positions. Writes are always counted; the writes themselves
//! are only kept when the log is enabled with [`Document::with_write_log`].
//!
//! # Example
//!
//! ```rust
//! use glide_scroll::document::{Document, NodeSpec};
//! use glide_scroll::host::{ScrollHost, Surface};
//!
//! let mut doc = Document::new(800.0, 4000.0);
//! let body = doc.body();
//! let target = doc.insert(NodeSpec::new().id("pricing").top(1200.0).height(300.0).parent(body));
//!
//! assert_eq!(doc.element_by_id("pricing"), Some(target));
//! doc.set_scroll_offset(Surface::Viewport, 5000.0);
//! assert_eq!(doc.scroll_offset(Surface::Viewport), 3200.0);
//! ```

use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::host::{ElementId, ScrollHost, SharedHost, Surface};
use crate::interrupt::InterruptionSignal;

/// Shared handle to a document
pub type SharedDocument = SharedHost<Document>;

/// Scroll position and extents of one surface
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollState {
    pub offset: f64,
    pub visible: f64,
    pub content: f64,
}

impl ScrollState {
    pub fn new(visible: f64, content: f64) -> Self {
        Self {
            offset: 0.0,
            visible,
            content,
        }
    }

    /// Largest offset the surface can scroll to
    pub fn max_offset(&self) -> f64 {
        (self.content - self.visible).max(0.0)
    }
}

/// Description of an element to insert
#[derive(Clone, Debug, Default)]
pub struct NodeSpec {
    id: Option<String>,
    top: f64,
    height: f64,
    parent: Option<ElementId>,
    scroll: Option<ScrollState>,
}

impl NodeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Offset from the top of the offset parent
    pub fn top(mut self, top: f64) -> Self {
        self.top = top;
        self
    }

    pub fn height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    /// Offset parent of the element
    pub fn parent(mut self, parent: ElementId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Make the element a scroll container showing `visible` of `content`
    pub fn scrollable(mut self, visible: f64, content: f64) -> Self {
        self.scroll = Some(ScrollState::new(visible, content));
        self
    }
}

#[derive(Clone, Debug)]
struct Node {
    id: Option<String>,
    top: f64,
    height: f64,
    parent: Option<ElementId>,
    scroll: Option<ScrollState>,
}

/// A scroll write as the document saw it
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollWrite {
    pub surface: Surface,
    /// Offset the writer asked for
    pub requested: f64,
    /// Offset after clamping and snapping
    pub applied: f64,
}

/// In-memory scroll host
#[derive(Debug)]
pub struct Document {
    nodes: SlotMap<ElementId, Node>,
    ids: FxHashMap<String, ElementId>,
    body: ElementId,
    viewport: ScrollState,
    snap_to_pixels: bool,
    write_count: usize,
    /// `None` unless recording was enabled
    write_log: Option<Vec<ScrollWrite>>,
    interruption: InterruptionSignal,
}

impl Document {
    /// Create a page whose viewport shows `viewport_height` of a body that is
    /// `page_height` tall
    pub fn new(viewport_height: f64, page_height: f64) -> Self {
        let mut nodes = SlotMap::with_key();
        let body = nodes.insert(Node {
            id: None,
            top: 0.0,
            height: page_height,
            parent: None,
            scroll: None,
        });
        Self {
            nodes,
            ids: FxHashMap::default(),
            body,
            viewport: ScrollState::new(viewport_height, page_height),
            snap_to_pixels: false,
            write_count: 0,
            write_log: None,
            interruption: InterruptionSignal::new(),
        }
    }

    /// Wrap the document for sharing with animations
    pub fn shared(self) -> SharedDocument {
        Arc::new(Mutex::new(self))
    }

    /// Round every scroll write to a whole pixel
    pub fn with_pixel_snapping(mut self, enabled: bool) -> Self {
        self.snap_to_pixels = enabled;
        self
    }

    /// Keep every scroll write for inspection through [`Document::writes`]
    pub fn with_write_log(mut self, enabled: bool) -> Self {
        self.write_log = enabled.then(Vec::new);
        self
    }

    /// The root element; the offset parent of top-level elements
    pub fn body(&self) -> ElementId {
        self.body
    }

    /// Add an element. A parent that does not exist is ignored.
    pub fn insert(&mut self, spec: NodeSpec) -> ElementId {
        let parent = spec.parent.filter(|parent| self.nodes.contains_key(*parent));
        let id = spec.id.clone();
        let element = self.nodes.insert(Node {
            id: spec.id,
            top: spec.top,
            height: spec.height,
            parent,
            scroll: spec.scroll,
        });
        if let Some(id) = id {
            if self.ids.insert(id.clone(), element).is_some() {
                tracing::warn!("Document: element id '{}' reused, lookups now return the newest", id);
            }
        }
        element
    }

    /// Remove an element. Children keep their offsets but lose their parent.
    pub fn remove(&mut self, element: ElementId) -> bool {
        if element == self.body {
            return false;
        }
        let Some(node) = self.nodes.remove(element) else {
            return false;
        };
        if let Some(id) = node.id {
            if self.ids.get(&id) == Some(&element) {
                self.ids.remove(&id);
            }
        }
        for (_, child) in self.nodes.iter_mut() {
            if child.parent == Some(element) {
                child.parent = None;
            }
        }
        true
    }

    pub fn contains(&self, element: ElementId) -> bool {
        self.nodes.contains_key(element)
    }

    pub fn set_top(&mut self, element: ElementId, top: f64) {
        if let Some(node) = self.nodes.get_mut(element) {
            node.top = top;
        }
    }

    pub fn set_height(&mut self, element: ElementId, height: f64) {
        if let Some(node) = self.nodes.get_mut(element) {
            node.height = height;
        }
    }

    /// Change the body height (and so the page's scrollable extent)
    pub fn set_page_height(&mut self, height: f64) {
        self.viewport.content = height;
        let body = self.body;
        self.set_height(body, height);
        self.viewport.offset = self.viewport.offset.min(self.viewport.max_offset());
    }

    pub fn set_viewport_height(&mut self, height: f64) {
        self.viewport.visible = height;
        self.viewport.offset = self.viewport.offset.min(self.viewport.max_offset());
    }

    pub fn viewport(&self) -> ScrollState {
        self.viewport
    }

    /// Scroll state of a surface, `None` for elements that do not scroll
    pub fn scroll_state(&self, surface: Surface) -> Option<ScrollState> {
        match surface {
            Surface::Viewport => Some(self.viewport),
            Surface::Container(element) => self.nodes.get(element).and_then(|node| node.scroll),
        }
    }

    fn scroll_state_mut(&mut self, surface: Surface) -> Option<&mut ScrollState> {
        match surface {
            Surface::Viewport => Some(&mut self.viewport),
            Surface::Container(element) => self
                .nodes
                .get_mut(element)
                .and_then(|node| node.scroll.as_mut()),
        }
    }

    /// Scroll by `delta` as user wheel input would, raising the interruption
    /// signal
    pub fn wheel(&mut self, surface: Surface, delta: f64) {
        self.interruption.raise();
        if let Some(state) = self.scroll_state_mut(surface) {
            state.offset = (state.offset + delta).clamp(0.0, state.max_offset());
        }
    }

    /// Scroll writes made through [`ScrollHost::set_scroll_offset`]
    ///
    /// Empty unless the write log is enabled.
    pub fn writes(&self) -> &[ScrollWrite] {
        self.write_log.as_deref().unwrap_or(&[])
    }

    /// Number of scroll writes, counted whether or not the log is enabled
    pub fn write_count(&self) -> usize {
        self.write_count
    }

    pub fn clear_writes(&mut self) {
        self.write_count = 0;
        if let Some(log) = &mut self.write_log {
            log.clear();
        }
    }
}

impl ScrollHost for Document {
    fn element_by_id(&self, id: &str) -> Option<ElementId> {
        self.ids.get(id).copied()
    }

    fn offset_top(&self, element: ElementId) -> f64 {
        self.nodes.get(element).map_or(0.0, |node| node.top)
    }

    fn offset_parent(&self, element: ElementId) -> Option<ElementId> {
        self.nodes.get(element).and_then(|node| node.parent)
    }

    fn offset_height(&self, element: ElementId) -> f64 {
        self.nodes.get(element).map_or(0.0, |node| node.height)
    }

    fn scroll_offset(&self, surface: Surface) -> f64 {
        self.scroll_state(surface).map_or(0.0, |state| state.offset)
    }

    fn set_scroll_offset(&mut self, surface: Surface, offset: f64) {
        let snap = self.snap_to_pixels;
        let applied = match self.scroll_state_mut(surface) {
            Some(state) => {
                let mut target = offset.clamp(0.0, state.max_offset());
                if snap {
                    target = target.round();
                }
                state.offset = target;
                target
            }
            None => {
                tracing::warn!("Document: {:?} is not scrollable, write ignored", surface);
                return;
            }
        };
        self.write_count += 1;
        if let Some(log) = &mut self.write_log {
            log.push(ScrollWrite {
                surface,
                requested: offset,
                applied,
            });
        }
    }

    fn visible_extent(&self, surface: Surface) -> f64 {
        self.scroll_state(surface).map_or(0.0, |state| state.visible)
    }

    fn scroll_extent(&self, surface: Surface) -> f64 {
        self.scroll_state(surface).map_or(0.0, |state| state.content)
    }

    fn interruption_signal(&self) -> InterruptionSignal {
        self.interruption.clone()
    }
}
