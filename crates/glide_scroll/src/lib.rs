//! Glide Smooth Scroll
//!
//! Animates a scroll surface (the page viewport or a scrollable container)
//! from its current offset to the offset of a target element.
//!
//! # Features
//!
//! - **Location Resolution**: offset-parent walks with fixed, element-height
//!   or dynamic offset adjustments
//! - **Timed Animation**: 16 ms ticks eased by any curve of
//!   [`glide_animation::Easing`]
//! - **Lifecycle Hooks**: `callback_before` / `callback_after`, each fired
//!   exactly once per animation
//! - **Interruptible**: optional early stop on user wheel input
//! - **Host Abstraction**: [`ScrollHost`] decouples the engine from any UI
//!   toolkit; [`document::Document`] is a headless implementation

pub mod config;
pub mod document;
pub mod driver;
pub mod error;
pub mod host;
pub mod interrupt;
pub mod location;
pub mod options;

pub use config::ScrollDefaults;
pub use document::{Document, NodeSpec, SharedDocument};
pub use driver::{AnimationRun, RunParams, RunState, SmoothScroll, StopReason, TICK_MS};
pub use error::{Result, ScrollError};
pub use host::{ElementId, ScrollHost, SharedHost, Surface};
pub use interrupt::InterruptionSignal;
pub use options::{DynamicOffset, ElementCallback, Offset, ScrollOptions};
