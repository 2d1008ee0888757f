//! Easing curves
//!
//! Maps normalized time progress (0.0 to 1.0) to normalized motion progress.
//! Every curve is a plain `fn(f64) -> f64` reached through an exhaustive match
//! on [`Easing`], so adding a variant without a function is a compile error.
//!
//! The polynomial families come in three flavours per degree:
//!
//! - **In**: `t^n`, accelerating from zero velocity
//! - **Out**: `1 - (1-t)^n`, decelerating to zero velocity
//! - **InOut**: `2^(n-1) t^n` below the midpoint, `1 - 2^(n-1) (1-t)^n` above

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A pure easing function
pub type EasingFn = fn(f64) -> f64;

/// Named easing curve
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    /// No easing, no acceleration
    Linear,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInQuart,
    EaseOutQuart,
    #[default]
    EaseInOutQuart,
    EaseInQuint,
    EaseOutQuint,
    EaseInOutQuint,
}

/// Returned by the strict [`FromStr`] parse for a name outside the table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown easing curve '{0}'")]
pub struct UnknownEasing(pub String);

impl Easing {
    /// Every curve, linear first
    pub const ALL: [Easing; 13] = [
        Easing::Linear,
        Easing::EaseInQuad,
        Easing::EaseOutQuad,
        Easing::EaseInOutQuad,
        Easing::EaseInCubic,
        Easing::EaseOutCubic,
        Easing::EaseInOutCubic,
        Easing::EaseInQuart,
        Easing::EaseOutQuart,
        Easing::EaseInOutQuart,
        Easing::EaseInQuint,
        Easing::EaseOutQuint,
        Easing::EaseInOutQuint,
    ];

    /// The camelCase name used in options and config files
    pub fn name(self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::EaseInQuad => "easeInQuad",
            Easing::EaseOutQuad => "easeOutQuad",
            Easing::EaseInOutQuad => "easeInOutQuad",
            Easing::EaseInCubic => "easeInCubic",
            Easing::EaseOutCubic => "easeOutCubic",
            Easing::EaseInOutCubic => "easeInOutCubic",
            Easing::EaseInQuart => "easeInQuart",
            Easing::EaseOutQuart => "easeOutQuart",
            Easing::EaseInOutQuart => "easeInOutQuart",
            Easing::EaseInQuint => "easeInQuint",
            Easing::EaseOutQuint => "easeOutQuint",
            Easing::EaseInOutQuint => "easeInOutQuint",
        }
    }

    /// Look up a curve by name, falling back to [`Easing::Linear`]
    ///
    /// Unknown names are not an error: the animation simply runs without
    /// acceleration.
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or(Easing::Linear)
    }

    /// The pure function behind this curve
    pub fn function(self) -> EasingFn {
        match self {
            Easing::Linear => linear,
            Easing::EaseInQuad => ease_in_quad,
            Easing::EaseOutQuad => ease_out_quad,
            Easing::EaseInOutQuad => ease_in_out_quad,
            Easing::EaseInCubic => ease_in_cubic,
            Easing::EaseOutCubic => ease_out_cubic,
            Easing::EaseInOutCubic => ease_in_out_cubic,
            Easing::EaseInQuart => ease_in_quart,
            Easing::EaseOutQuart => ease_out_quart,
            Easing::EaseInOutQuart => ease_in_out_quart,
            Easing::EaseInQuint => ease_in_quint,
            Easing::EaseOutQuint => ease_out_quint,
            Easing::EaseInOutQuint => ease_in_out_quint,
        }
    }

    /// Apply the curve to progress `t`
    ///
    /// `t` is expected in `[0, 1]` but is not clamped here; callers clamp
    /// progress before easing it.
    #[inline]
    pub fn apply(self, t: f64) -> f64 {
        (self.function())(t)
    }
}

/// Ease `t` with the curve called `name`, returning `t` for unknown names
pub fn ease(name: &str, t: f64) -> f64 {
    Easing::from_name(name).apply(t)
}

impl FromStr for Easing {
    type Err = UnknownEasing;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Easing::ALL
            .iter()
            .copied()
            .find(|easing| easing.name() == s)
            .ok_or_else(|| UnknownEasing(s.to_string()))
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Curve table
// ============================================================================

#[inline]
fn ease_in(t: f64, degree: i32) -> f64 {
    t.powi(degree)
}

#[inline]
fn ease_out(t: f64, degree: i32) -> f64 {
    if degree % 2 == 1 {
        1.0 + (t - 1.0).powi(degree)
    } else {
        1.0 - (1.0 - t).powi(degree)
    }
}

#[inline]
fn ease_in_out(t: f64, degree: i32) -> f64 {
    let scale = 2f64.powi(degree - 1);
    if t < 0.5 {
        scale * t.powi(degree)
    } else {
        1.0 - scale * (1.0 - t).powi(degree)
    }
}

fn linear(t: f64) -> f64 {
    t
}

fn ease_in_quad(t: f64) -> f64 {
    ease_in(t, 2)
}

fn ease_out_quad(t: f64) -> f64 {
    ease_out(t, 2)
}

fn ease_in_out_quad(t: f64) -> f64 {
    ease_in_out(t, 2)
}

fn ease_in_cubic(t: f64) -> f64 {
    ease_in(t, 3)
}

fn ease_out_cubic(t: f64) -> f64 {
    ease_out(t, 3)
}

fn ease_in_out_cubic(t: f64) -> f64 {
    ease_in_out(t, 3)
}

fn ease_in_quart(t: f64) -> f64 {
    ease_in(t, 4)
}

fn ease_out_quart(t: f64) -> f64 {
    ease_out(t, 4)
}

fn ease_in_out_quart(t: f64) -> f64 {
    ease_in_out(t, 4)
}

fn ease_in_quint(t: f64) -> f64 {
    ease_in(t, 5)
}

fn ease_out_quint(t: f64) -> f64 {
    ease_out(t, 5)
}

fn ease_in_out_quint(t: f64) -> f64 {
    ease_in_out(t, 5)
}
