//! Location resolution
//!
//! Where the surface is now, and where it has to go.

use crate::host::{ElementId, ScrollHost, Surface};
use crate::options::Offset;

/// Upper bound on offset-parent hops, in case a host links a cycle
const MAX_ANCESTORS: usize = 4096;

/// Live scroll offset of the surface
pub fn current_offset(host: &dyn ScrollHost, surface: Surface) -> f64 {
    host.scroll_offset(surface)
}

/// Absolute offset of `element` on `surface`, minus `adjustment`, never
/// below 0
///
/// Sums `offset_top` of the element and each offset parent above it. On a
/// container surface the walk stops at the container. An element without an
/// offset parent contributes 0.
pub fn target_offset(
    host: &dyn ScrollHost,
    element: ElementId,
    adjustment: f64,
    surface: Surface,
) -> f64 {
    let stop_at = match surface {
        Surface::Viewport => None,
        Surface::Container(container) => Some(container),
    };

    let mut location = 0.0;
    if host.offset_parent(element).is_some() {
        let mut current = Some(element);
        let mut hops = 0;
        while let Some(node) = current {
            if Some(node) == stop_at {
                break;
            }
            if hops == MAX_ANCESTORS {
                tracing::warn!("target_offset: offset parent chain too deep, stopping walk");
                break;
            }
            location += host.offset_top(node);
            current = host.offset_parent(node);
            hops += 1;
        }
    }

    (location - adjustment).max(0.0)
}

/// Resolve an offset option to pixels, reading element heights now
pub fn resolve_adjustment(host: &dyn ScrollHost, element: ElementId, offset: &Offset) -> f64 {
    match offset {
        Offset::Pixels(px) => *px,
        Offset::Element(other) => host.offset_height(*other),
        Offset::Dynamic(compute) => match compute(host, element) {
            Offset::Dynamic(_) => {
                tracing::warn!("resolve_adjustment: dynamic offset returned another dynamic offset, using 0");
                0.0
            }
            resolved => resolve_adjustment(host, element, &resolved),
        },
    }
}
