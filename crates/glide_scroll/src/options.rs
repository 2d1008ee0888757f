//! Scroll options
//!
//! Every option is optional. Unset options fall back to the
//! [`ScrollDefaults`] of the [`crate::SmoothScroll`] instance that runs the
//! animation.

use std::fmt;
use std::sync::Arc;

use glide_animation::Easing;

use crate::config::ScrollDefaults;
use crate::error::{Result, ScrollError};
use crate::host::{ElementId, ScrollHost};

/// Lifecycle hook, called with the target element
pub type ElementCallback = Arc<dyn Fn(ElementId) + Send + Sync>;

/// Offset computed from the target element when the animation is invoked
pub type DynamicOffset = Arc<dyn Fn(&dyn ScrollHost, ElementId) -> Offset + Send + Sync>;

/// Adjustment subtracted from the target's offset
#[derive(Clone)]
pub enum Offset {
    /// Fixed number of pixels
    Pixels(f64),
    /// Rendered height of another element, such as a fixed header
    Element(ElementId),
    /// Evaluated once with the target element
    Dynamic(DynamicOffset),
}

impl Offset {
    /// Build a dynamic offset from a closure
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&dyn ScrollHost, ElementId) -> Offset + Send + Sync + 'static,
    {
        Offset::Dynamic(Arc::new(f))
    }
}

impl Default for Offset {
    fn default() -> Self {
        Offset::Pixels(0.0)
    }
}

impl From<f64> for Offset {
    fn from(px: f64) -> Self {
        Offset::Pixels(px)
    }
}

impl From<ElementId> for Offset {
    fn from(element: ElementId) -> Self {
        Offset::Element(element)
    }
}

impl fmt::Debug for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Offset::Pixels(px) => f.debug_tuple("Pixels").field(px).finish(),
            Offset::Element(element) => f.debug_tuple("Element").field(element).finish(),
            Offset::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Options for one smooth scroll
///
/// ```rust
/// use glide_animation::Easing;
/// use glide_scroll::ScrollOptions;
///
/// let options = ScrollOptions::new()
///     .duration(400.0)
///     .offset(64.0)
///     .easing(Easing::EaseOutCubic)
///     .stop_for_interruptions(true);
/// ```
#[derive(Clone, Default)]
pub struct ScrollOptions {
    pub duration: Option<f64>,
    pub offset: Option<Offset>,
    pub easing: Option<Easing>,
    pub stop_for_interruptions: Option<bool>,
    pub callback_before: Option<ElementCallback>,
    pub callback_after: Option<ElementCallback>,
    pub container_id: Option<String>,
}

impl ScrollOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Animation length in milliseconds
    pub fn duration(mut self, ms: f64) -> Self {
        self.duration = Some(ms);
        self
    }

    pub fn offset(mut self, offset: impl Into<Offset>) -> Self {
        self.offset = Some(offset.into());
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    /// Select a curve by name; unknown names mean linear
    pub fn easing_name(mut self, name: &str) -> Self {
        self.easing = Some(Easing::from_name(name));
        self
    }

    pub fn stop_for_interruptions(mut self, stop: bool) -> Self {
        self.stop_for_interruptions = Some(stop);
        self
    }

    pub fn callback_before<F>(mut self, f: F) -> Self
    where
        F: Fn(ElementId) + Send + Sync + 'static,
    {
        self.callback_before = Some(Arc::new(f));
        self
    }

    pub fn callback_after<F>(mut self, f: F) -> Self
    where
        F: Fn(ElementId) + Send + Sync + 'static,
    {
        self.callback_after = Some(Arc::new(f));
        self
    }

    /// Scroll the container with this id instead of the page
    pub fn container_id(mut self, id: impl Into<String>) -> Self {
        self.container_id = Some(id.into());
        self
    }

    /// Read options from markup-style attributes
    ///
    /// Recognized names are `duration`, `offset`, `easing`,
    /// `stop-for-interruptions` and `container-id` (camelCase spellings are
    /// accepted too). A malformed value is logged and only that option falls
    /// back to its default; `stop-for-interruptions` is enabled by its mere
    /// presence.
    pub fn from_attributes<'a, I>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut options = Self::default();
        for (name, value) in attributes {
            if let Err(err) = options.apply_attribute(name, value) {
                tracing::warn!("ScrollOptions: {}, using default", err);
            }
        }
        options
    }

    fn apply_attribute(&mut self, name: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match name {
            "duration" => {
                self.duration = Some(parse_number(name, value)?);
            }
            "offset" => {
                self.offset = Some(Offset::Pixels(parse_number(name, value)?));
            }
            "easing" => {
                self.easing = Some(Easing::from_name(value));
            }
            "stop-for-interruptions" | "stopForInterruptions" => {
                self.stop_for_interruptions = Some(true);
            }
            "container-id" | "containerId" => {
                if value.is_empty() {
                    return Err(invalid(name, value));
                }
                self.container_id = Some(value.to_string());
            }
            _ => {
                tracing::trace!("ScrollOptions: ignoring attribute '{}'", name);
            }
        }
        Ok(())
    }

    /// Fill unset options from `defaults`
    pub(crate) fn resolve(self, defaults: &ScrollDefaults) -> ResolvedOptions {
        let duration = match self.duration {
            Some(ms) if ms.is_finite() => ms,
            Some(ms) => {
                tracing::warn!("ScrollOptions: duration {} is not finite, using default", ms);
                defaults.duration
            }
            None => defaults.duration,
        };
        let offset = match self.offset {
            Some(Offset::Pixels(px)) if !px.is_finite() => {
                tracing::warn!("ScrollOptions: offset {} is not finite, using default", px);
                Offset::Pixels(defaults.offset)
            }
            Some(offset) => offset,
            None => Offset::Pixels(defaults.offset),
        };
        ResolvedOptions {
            duration,
            offset,
            easing: self.easing.unwrap_or(defaults.easing),
            stop_for_interruptions: self
                .stop_for_interruptions
                .unwrap_or(defaults.stop_for_interruptions),
            callback_before: self.callback_before,
            callback_after: self.callback_after,
            container_id: self.container_id.or_else(|| defaults.container_id.clone()),
        }
    }
}

impl fmt::Debug for ScrollOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollOptions")
            .field("duration", &self.duration)
            .field("offset", &self.offset)
            .field("easing", &self.easing)
            .field("stop_for_interruptions", &self.stop_for_interruptions)
            .field("callback_before", &self.callback_before.is_some())
            .field("callback_after", &self.callback_after.is_some())
            .field("container_id", &self.container_id)
            .finish()
    }
}

/// Options with every default applied
pub(crate) struct ResolvedOptions {
    pub duration: f64,
    pub offset: Offset,
    pub easing: Easing,
    pub stop_for_interruptions: bool,
    pub callback_before: Option<ElementCallback>,
    pub callback_after: Option<ElementCallback>,
    pub container_id: Option<String>,
}

fn invalid(name: &str, value: &str) -> ScrollError {
    ScrollError::InvalidOption {
        option: name.to_string(),
        value: value.to_string(),
    }
}

fn parse_number(name: &str, value: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| invalid(name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_options_use_defaults() {
        let resolved = ScrollOptions::new().resolve(&ScrollDefaults::default());

        assert_eq!(resolved.duration, 800.0);
        assert!(matches!(resolved.offset, Offset::Pixels(px) if px == 0.0));
        assert_eq!(resolved.easing, Easing::EaseInOutQuart);
        assert!(!resolved.stop_for_interruptions);
        assert!(resolved.callback_before.is_none());
        assert!(resolved.callback_after.is_none());
        assert_eq!(resolved.container_id, None);
    }

    #[test]
    fn test_explicit_options_win() {
        let defaults = ScrollDefaults {
            duration: 500.0,
            offset: 10.0,
            easing: Easing::EaseOutQuad,
            stop_for_interruptions: true,
            container_id: Some("main".to_string()),
        };
        let resolved = ScrollOptions::new()
            .duration(0.0)
            .offset(25.0)
            .easing(Easing::Linear)
            .stop_for_interruptions(false)
            .container_id("sidebar")
            .resolve(&defaults);

        assert_eq!(resolved.duration, 0.0);
        assert!(matches!(resolved.offset, Offset::Pixels(px) if px == 25.0));
        assert_eq!(resolved.easing, Easing::Linear);
        assert!(!resolved.stop_for_interruptions);
        assert_eq!(resolved.container_id.as_deref(), Some("sidebar"));
    }

    #[test]
    fn test_non_finite_values_fall_back() {
        let resolved = ScrollOptions::new()
            .duration(f64::NAN)
            .offset(f64::INFINITY)
            .resolve(&ScrollDefaults::default());

        assert_eq!(resolved.duration, 800.0);
        assert!(matches!(resolved.offset, Offset::Pixels(px) if px == 0.0));
    }

    #[test]
    fn test_easing_name_falls_back_to_linear() {
        let options = ScrollOptions::new().easing_name("wobble");
        assert_eq!(options.easing, Some(Easing::Linear));

        let options = ScrollOptions::new().easing_name("easeInCubic");
        assert_eq!(options.easing, Some(Easing::EaseInCubic));
    }

    #[test]
    fn test_from_attributes() {
        let options = ScrollOptions::from_attributes([
            ("duration", "1200"),
            ("offset", " 60 "),
            ("easing", "easeOutQuint"),
            ("stop-for-interruptions", ""),
            ("container-id", "feed"),
            ("class", "nav-link"),
        ]);

        assert_eq!(options.duration, Some(1200.0));
        assert!(matches!(options.offset, Some(Offset::Pixels(px)) if px == 60.0));
        assert_eq!(options.easing, Some(Easing::EaseOutQuint));
        assert_eq!(options.stop_for_interruptions, Some(true));
        assert_eq!(options.container_id.as_deref(), Some("feed"));
    }

    #[test]
    fn test_malformed_attributes_fall_back_individually() {
        let options = ScrollOptions::from_attributes([
            ("duration", "slow"),
            ("offset", "40"),
            ("easing", "springy"),
            ("containerId", ""),
        ]);

        assert_eq!(options.duration, None);
        assert!(matches!(options.offset, Some(Offset::Pixels(px)) if px == 40.0));
        assert_eq!(options.easing, Some(Easing::Linear));
        assert_eq!(options.container_id, None);

        let resolved = options.resolve(&ScrollDefaults::default());
        assert_eq!(resolved.duration, 800.0);
    }

    #[test]
    fn test_apply_attribute_reports_invalid_value() {
        let mut options = ScrollOptions::new();
        let err = options.apply_attribute("offset", "header").unwrap_err();
        assert_eq!(err.to_string(), "invalid value 'header' for option 'offset'");
    }

    #[test]
    fn test_debug_hides_closures() {
        let options = ScrollOptions::new()
            .offset(Offset::dynamic(|_, _| Offset::Pixels(5.0)))
            .callback_after(|_| {});
        let debug = format!("{:?}", options);
        assert!(debug.contains("Dynamic(..)"));
        assert!(debug.contains("callback_after: true"));
    }
}
