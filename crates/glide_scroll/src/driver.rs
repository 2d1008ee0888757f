//! Animation driver
//!
//! [`SmoothScroll::animate`] schedules a zero-delay task that samples the
//! start offset once layout has settled, fires `callback_before`, and then
//! registers a 16 ms periodic task owning one [`AnimationRun`]. The periodic
//! task stops itself on the first tick whose stop predicate holds, and fires
//! `callback_after` exactly once.
//!
//! # Example
//!
//! ```rust
//! use glide_animation::TickScheduler;
//! use glide_scroll::document::{Document, NodeSpec};
//! use glide_scroll::host::{ScrollHost, Surface};
//! use glide_scroll::{ScrollOptions, SmoothScroll};
//!
//! let mut doc = Document::new(800.0, 4000.0);
//! let body = doc.body();
//! let target = doc.insert(NodeSpec::new().top(1500.0).parent(body));
//! let doc = doc.shared();
//!
//! let scheduler = TickScheduler::new();
//! let scroll = SmoothScroll::new(doc.clone(), scheduler.handle());
//! scroll.animate(target, ScrollOptions::new().duration(320.0));
//!
//! scheduler.run_until_idle(10_000);
//! assert_eq!(doc.lock().unwrap().scroll_offset(Surface::Viewport), 1500.0);
//! ```

use std::sync::Arc;

use glide_animation::{Easing, SchedulerHandle, TaskControl};

use crate::config::ScrollDefaults;
use crate::host::{lock_host, ElementId, ScrollHost, SharedHost, Surface};
use crate::interrupt::InterruptionSignal;
use crate::location;
use crate::options::{ElementCallback, ScrollOptions};

/// Period of the animation tick in milliseconds (about 60 Hz)
pub const TICK_MS: u64 = 16;

/// Why a run stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The last computed position equals the end location
    ReachedTarget,
    /// The live surface offset equals the end location
    SurfaceAtTarget,
    /// The surface is scrolled to the bottom of its content
    BoundaryReached,
    /// The user scrolled and the run stops for interruptions
    Interrupted,
}

/// Lifecycle of one run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Created, locations not sampled yet
    Idle,
    /// Ticking
    Running,
    /// Terminal
    Stopped(StopReason),
}

/// Per-run animation parameters
#[derive(Clone, Debug)]
pub struct RunParams {
    pub surface: Surface,
    pub duration_ms: f64,
    pub easing: Easing,
    /// Pixels subtracted from the target offset, already resolved
    pub adjustment: f64,
    pub stop_for_interruptions: bool,
}

/// One animation from the current offset to a target element
#[derive(Debug)]
pub struct AnimationRun {
    element: ElementId,
    params: RunParams,
    signal: InterruptionSignal,
    state: RunState,
    start_location: f64,
    end_location: f64,
    distance: f64,
    elapsed_ms: f64,
    current_position: f64,
    ticks: u32,
}

impl AnimationRun {
    pub fn new(element: ElementId, params: RunParams, signal: InterruptionSignal) -> Self {
        Self {
            element,
            params,
            signal,
            state: RunState::Idle,
            start_location: 0.0,
            end_location: 0.0,
            distance: 0.0,
            elapsed_ms: 0.0,
            current_position: 0.0,
            ticks: 0,
        }
    }

    /// Sample start and end locations and move to [`RunState::Running`]
    pub fn start(&mut self, host: &dyn ScrollHost) {
        if self.state != RunState::Idle {
            return;
        }
        let surface = self.params.surface;
        self.start_location = location::current_offset(host, surface);
        self.end_location =
            location::target_offset(host, self.element, self.params.adjustment, surface);
        self.distance = self.end_location - self.start_location;
        self.current_position = self.start_location;
        self.state = RunState::Running;

        tracing::debug!(
            "AnimationRun: start={} end={} distance={} duration={}ms easing={}",
            self.start_location,
            self.end_location,
            self.distance,
            self.params.duration_ms,
            self.params.easing
        );
    }

    /// Advance one tick, write the new position and evaluate the stop
    /// predicate
    ///
    /// Does nothing unless the run is [`RunState::Running`].
    pub fn tick(&mut self, host: &mut dyn ScrollHost) -> RunState {
        if self.state != RunState::Running {
            return self.state;
        }

        self.elapsed_ms += TICK_MS as f64;
        self.ticks += 1;
        let eased = self.params.easing.apply(self.progress());
        self.current_position = self.start_location + self.distance * eased;
        host.set_scroll_offset(self.params.surface, self.current_position);

        tracing::trace!(
            "AnimationRun: tick {} elapsed={}ms position={}",
            self.ticks,
            self.elapsed_ms,
            self.current_position
        );

        if let Some(reason) = self.stop_reason(host) {
            self.state = RunState::Stopped(reason);
            tracing::debug!(
                "AnimationRun: stopped after {} ticks at {} ({:?})",
                self.ticks,
                self.current_position,
                reason
            );
        }
        self.state
    }

    fn stop_reason(&self, host: &dyn ScrollHost) -> Option<StopReason> {
        let surface = self.params.surface;
        let live = location::current_offset(host, surface);

        if self.current_position == self.end_location {
            Some(StopReason::ReachedTarget)
        } else if live == self.end_location {
            Some(StopReason::SurfaceAtTarget)
        } else if host.visible_extent(surface) + live >= host.scroll_extent(surface) {
            Some(StopReason::BoundaryReached)
        } else if self.params.stop_for_interruptions && self.signal.is_raised() {
            Some(StopReason::Interrupted)
        } else {
            None
        }
    }

    /// Normalized time progress, clamped to `[0, 1]`
    ///
    /// A duration of zero or less counts as already complete.
    pub fn progress(&self) -> f64 {
        if self.params.duration_ms <= 0.0 {
            1.0
        } else {
            (self.elapsed_ms / self.params.duration_ms).clamp(0.0, 1.0)
        }
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn start_location(&self) -> f64 {
        self.start_location
    }

    pub fn end_location(&self) -> f64 {
        self.end_location
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn current_position(&self) -> f64 {
        self.current_position
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }
}

/// Animates scroll surfaces of one host
///
/// Cheap to clone; clones share the host and the scheduler but carry their
/// own defaults.
pub struct SmoothScroll<H: ScrollHost> {
    host: SharedHost<H>,
    scheduler: SchedulerHandle,
    defaults: ScrollDefaults,
}

impl<H: ScrollHost> Clone for SmoothScroll<H> {
    fn clone(&self) -> Self {
        Self {
            host: Arc::clone(&self.host),
            scheduler: self.scheduler.clone(),
            defaults: self.defaults.clone(),
        }
    }
}

impl<H: ScrollHost + 'static> SmoothScroll<H> {
    pub fn new(host: SharedHost<H>, scheduler: SchedulerHandle) -> Self {
        Self::with_defaults(host, scheduler, ScrollDefaults::default())
    }

    pub fn with_defaults(
        host: SharedHost<H>,
        scheduler: SchedulerHandle,
        defaults: ScrollDefaults,
    ) -> Self {
        Self {
            host,
            scheduler,
            defaults,
        }
    }

    /// Replace the defaults used for unset options
    pub fn set_default_options(&mut self, defaults: ScrollDefaults) {
        self.defaults = defaults;
    }

    pub fn defaults(&self) -> &ScrollDefaults {
        &self.defaults
    }

    pub fn host(&self) -> &SharedHost<H> {
        &self.host
    }

    /// Smooth scroll to `element`
    ///
    /// Options and the offset adjustment are resolved now; the start offset
    /// is sampled when the scheduler next runs. Outcomes are observable only
    /// through the callbacks and the surface position. Nothing happens if the
    /// scheduler has been dropped.
    pub fn animate(&self, element: ElementId, options: ScrollOptions) {
        let options = options.resolve(&self.defaults);

        let (params, signal) = {
            let host = lock_host(&self.host);
            let surface = match options.container_id.as_deref() {
                Some(id) => match host.element_by_id(id) {
                    Some(container) => Surface::Container(container),
                    None => {
                        tracing::warn!(
                            "SmoothScroll: container '{}' not found, scrolling the viewport",
                            id
                        );
                        Surface::Viewport
                    }
                },
                None => Surface::Viewport,
            };
            let adjustment = location::resolve_adjustment(&*host, element, &options.offset);
            let params = RunParams {
                surface,
                duration_ms: options.duration,
                easing: options.easing,
                adjustment,
                stop_for_interruptions: options.stop_for_interruptions,
            };
            (params, host.interruption_signal())
        };

        let run = AnimationRun::new(element, params, signal.clone());
        let host = Arc::clone(&self.host);
        let scheduler = self.scheduler.clone();
        let before = options.callback_before;
        let after = options.callback_after;

        let deferred = self.scheduler.defer(move || {
            start_run(run, host, scheduler, signal, before, after);
        });
        if deferred.is_none() {
            tracing::warn!("SmoothScroll: scheduler is gone, animation skipped");
        }
    }
}

fn start_run<H: ScrollHost + 'static>(
    mut run: AnimationRun,
    host: SharedHost<H>,
    scheduler: SchedulerHandle,
    signal: InterruptionSignal,
    before: Option<ElementCallback>,
    after: Option<ElementCallback>,
) {
    let element = run.element();
    run.start(&*lock_host(&host));

    if let Some(before) = &before {
        before(element);
    }
    signal.reset();

    let ticking = scheduler.set_interval(TICK_MS, move || {
        let state = run.tick(&mut *lock_host(&host));
        match state {
            RunState::Stopped(_) => {
                if let Some(after) = &after {
                    after(element);
                }
                TaskControl::Stop
            }
            RunState::Idle | RunState::Running => TaskControl::Continue,
        }
    });
    if ticking.is_none() {
        tracing::warn!("SmoothScroll: scheduler is gone, animation not started");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, NodeSpec, SharedDocument};
    use glide_animation::TickScheduler;
    use std::sync::Mutex;

    #[derive(Clone, Debug, PartialEq)]
    enum Event {
        Before(ElementId, usize),
        After(ElementId, usize),
    }

    type EventLog = Arc<Mutex<Vec<Event>>>;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    }

    /// 800px viewport over a 5000px page with a target at 1000px
    fn page() -> (SharedDocument, ElementId) {
        let mut doc = Document::new(800.0, 5000.0);
        let body = doc.body();
        let target = doc.insert(NodeSpec::new().id("target").top(1000.0).height(100.0).parent(body));
        (doc.shared(), target)
    }

    /// Options whose callbacks record the number of writes seen so far
    fn recording(doc: &SharedDocument, log: &EventLog, options: ScrollOptions) -> ScrollOptions {
        let (doc_before, log_before) = (Arc::clone(doc), Arc::clone(log));
        let (doc_after, log_after) = (Arc::clone(doc), Arc::clone(log));
        options
            .callback_before(move |element| {
                let writes = doc_before.lock().unwrap().write_count();
                log_before.lock().unwrap().push(Event::Before(element, writes));
            })
            .callback_after(move |element| {
                let writes = doc_after.lock().unwrap().write_count();
                log_after.lock().unwrap().push(Event::After(element, writes));
            })
    }

    fn offset(doc: &SharedDocument) -> f64 {
        doc.lock().unwrap().scroll_offset(Surface::Viewport)
    }

    #[test]
    fn test_linear_positions_follow_elapsed_time() {
        init_tracing();
        let (doc, target) = page();
        let scheduler = TickScheduler::new();
        let scroll = SmoothScroll::new(Arc::clone(&doc), scheduler.handle());
        let log: EventLog = Arc::default();

        scroll.animate(
            target,
            recording(
                &doc,
                &log,
                ScrollOptions::new().duration(1000.0).easing(Easing::Linear),
            ),
        );

        // Deferred start: nothing written yet, before already fired
        scheduler.run_due();
        assert_eq!(*log.lock().unwrap(), vec![Event::Before(target, 0)]);

        for n in 1..=62u32 {
            scheduler.advance(TICK_MS);
            let expected = (n as f64 * 16.0 / 1000.0) * 1000.0;
            assert_eq!(offset(&doc), expected, "tick {n}");
            assert_eq!(log.lock().unwrap().len(), 1, "stopped early at tick {n}");
        }

        // Tick 63 crosses 1000ms: progress clamps to 1
        scheduler.advance(TICK_MS);
        assert_eq!(offset(&doc), 1000.0);
        assert_eq!(
            *log.lock().unwrap(),
            vec![Event::Before(target, 0), Event::After(target, 63)]
        );
        assert!(!scheduler.has_pending());

        scheduler.advance(1000);
        assert_eq!(doc.lock().unwrap().write_count(), 63);
    }

    #[test]
    fn test_run_state_machine() {
        let (doc, target) = page();
        let params = RunParams {
            surface: Surface::Viewport,
            duration_ms: 1000.0,
            easing: Easing::Linear,
            adjustment: 0.0,
            stop_for_interruptions: false,
        };
        let mut guard = doc.lock().unwrap();
        let signal = guard.interruption_signal();
        let mut run = AnimationRun::new(target, params, signal);

        assert_eq!(run.state(), RunState::Idle);
        assert_eq!(run.tick(&mut *guard), RunState::Idle);
        assert_eq!(guard.write_count(), 0);

        run.start(&*guard);
        assert_eq!(run.state(), RunState::Running);
        assert_eq!(run.start_location(), 0.0);
        assert_eq!(run.end_location(), 1000.0);
        assert_eq!(run.distance(), 1000.0);

        let mut state = RunState::Running;
        while state == RunState::Running {
            state = run.tick(&mut *guard);
        }
        assert_eq!(state, RunState::Stopped(StopReason::ReachedTarget));
        assert_eq!(run.ticks(), 63);
        assert_eq!(run.elapsed_ms(), 1008.0);
        assert_eq!(run.progress(), 1.0);
        assert_eq!(run.current_position(), 1000.0);

        // Stopped is terminal
        assert_eq!(run.tick(&mut *guard), state);
        assert_eq!(guard.write_count(), 63);
    }

    #[test]
    fn test_zero_distance_stops_on_first_tick() {
        let (doc, target) = page();
        doc.lock().unwrap().set_scroll_offset(Surface::Viewport, 1000.0);
        doc.lock().unwrap().clear_writes();

        let scheduler = TickScheduler::new();
        let scroll = SmoothScroll::new(Arc::clone(&doc), scheduler.handle());
        let log: EventLog = Arc::default();
        scroll.animate(target, recording(&doc, &log, ScrollOptions::new()));

        scheduler.run_due();
        scheduler.advance(TICK_MS);
        assert_eq!(
            *log.lock().unwrap(),
            vec![Event::Before(target, 0), Event::After(target, 1)]
        );
        assert_eq!(offset(&doc), 1000.0);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_non_positive_duration_completes_on_first_tick() {
        for duration in [0.0, -250.0] {
            let (doc, target) = page();
            let scheduler = TickScheduler::new();
            let scroll = SmoothScroll::new(Arc::clone(&doc), scheduler.handle());
            let log: EventLog = Arc::default();
            scroll.animate(
                target,
                recording(&doc, &log, ScrollOptions::new().duration(duration)),
            );

            scheduler.run_due();
            scheduler.advance(TICK_MS);
            assert_eq!(offset(&doc), 1000.0, "duration {duration}");
            assert_eq!(log.lock().unwrap().len(), 2, "duration {duration}");
        }
    }

    #[test]
    fn test_start_sampled_after_deferral() {
        let (doc, target) = page();
        let scheduler = TickScheduler::new();
        let scroll = SmoothScroll::new(Arc::clone(&doc), scheduler.handle());

        scroll.animate(target, ScrollOptions::new().easing(Easing::Linear).duration(160.0));
        // Layout change after the call but before the deferred start
        doc.lock().unwrap().set_scroll_offset(Surface::Viewport, 2000.0);
        doc.lock().unwrap().clear_writes();

        scheduler.run_due();
        scheduler.advance(TICK_MS);
        // 2000 + (1000 - 2000) * 0.1
        assert_eq!(offset(&doc), 1900.0);
    }

    #[test]
    fn test_scrolls_upwards() {
        let (doc, target) = page();
        doc.lock().unwrap().set_scroll_offset(Surface::Viewport, 3000.0);

        let scheduler = TickScheduler::new();
        let scroll = SmoothScroll::new(Arc::clone(&doc), scheduler.handle());
        scroll.animate(target, ScrollOptions::new());

        scheduler.run_due();
        scheduler.advance(TICK_MS * 5);
        let midway = offset(&doc);
        assert!(midway < 3000.0 && midway > 1000.0);

        scheduler.run_until_idle(10_000);
        assert_eq!(offset(&doc), 1000.0);
    }

    #[test]
    fn test_offset_element_height_is_subtracted() {
        let (doc, target) = page();
        let header = {
            let mut guard = doc.lock().unwrap();
            let body = guard.body();
            guard.insert(NodeSpec::new().id("header").height(72.0).parent(body))
        };

        let scheduler = TickScheduler::new();
        let scroll = SmoothScroll::new(Arc::clone(&doc), scheduler.handle());
        scroll.animate(target, ScrollOptions::new().offset(header));

        // Height is read at call time, later changes do not matter
        doc.lock().unwrap().set_height(header, 500.0);

        scheduler.run_until_idle(10_000);
        assert_eq!(offset(&doc), 928.0);
    }

    #[test]
    fn test_interruption_stops_next_tick() {
        let (doc, target) = page();
        let scheduler = TickScheduler::new();
        let scroll = SmoothScroll::new(Arc::clone(&doc), scheduler.handle());
        let log: EventLog = Arc::default();
        scroll.animate(
            target,
            recording(&doc, &log, ScrollOptions::new().stop_for_interruptions(true)),
        );

        scheduler.run_due();
        scheduler.advance(TICK_MS * 3);
        assert_eq!(log.lock().unwrap().len(), 1);

        doc.lock().unwrap().wheel(Surface::Viewport, 0.0);
        scheduler.advance(TICK_MS);

        assert_eq!(
            *log.lock().unwrap(),
            vec![Event::Before(target, 0), Event::After(target, 4)]
        );
        assert!(offset(&doc) < 1000.0);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_interruption_ignored_without_opt_in() {
        let (doc, target) = page();
        let scheduler = TickScheduler::new();
        let scroll = SmoothScroll::new(Arc::clone(&doc), scheduler.handle());
        scroll.animate(target, ScrollOptions::new());

        scheduler.run_due();
        scheduler.advance(TICK_MS * 3);
        doc.lock().unwrap().wheel(Surface::Viewport, 0.0);
        scheduler.run_until_idle(10_000);

        assert_eq!(offset(&doc), 1000.0);
    }

    #[test]
    fn test_signal_raised_before_start_is_reset() {
        let (doc, target) = page();
        doc.lock().unwrap().wheel(Surface::Viewport, 0.0);

        let scheduler = TickScheduler::new();
        let scroll = SmoothScroll::new(Arc::clone(&doc), scheduler.handle());
        scroll.animate(target, ScrollOptions::new().stop_for_interruptions(true));

        scheduler.run_until_idle(10_000);
        assert_eq!(offset(&doc), 1000.0);
    }

    #[test]
    fn test_bottom_guard_stops_rounded_scroll() {
        // Target near the bottom: the page cannot scroll far enough, and
        // snapped writes never land on the fractional end location
        let mut doc = Document::new(800.0, 2000.0).with_pixel_snapping(true);
        let body = doc.body();
        let target = doc.insert(NodeSpec::new().top(1700.5).parent(body));
        let doc = doc.shared();

        let scheduler = TickScheduler::new();
        let scroll = SmoothScroll::new(Arc::clone(&doc), scheduler.handle());
        let log: EventLog = Arc::default();
        scroll.animate(target, recording(&doc, &log, ScrollOptions::new().duration(800.0)));

        scheduler.run_due();
        let elapsed = scheduler.run_until_idle(10_000);

        assert_eq!(offset(&doc), 1200.0);
        assert!(elapsed < 800, "guard should stop before the duration ends");
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_container_surface() {
        let mut doc = Document::new(800.0, 5000.0);
        let body = doc.body();
        let list = doc.insert(
            NodeSpec::new()
                .id("list")
                .top(300.0)
                .height(400.0)
                .parent(body)
                .scrollable(400.0, 3000.0),
        );
        let row = doc.insert(NodeSpec::new().top(900.0).height(40.0).parent(list));
        let doc = doc.shared();

        let scheduler = TickScheduler::new();
        let scroll = SmoothScroll::new(Arc::clone(&doc), scheduler.handle());
        scroll.animate(row, ScrollOptions::new().container_id("list"));
        scheduler.run_until_idle(10_000);

        let guard = doc.lock().unwrap();
        assert_eq!(guard.scroll_offset(Surface::Container(list)), 900.0);
        assert_eq!(guard.scroll_offset(Surface::Viewport), 0.0);
    }

    #[test]
    fn test_unknown_container_falls_back_to_viewport() {
        let (doc, target) = page();
        let scheduler = TickScheduler::new();
        let scroll = SmoothScroll::new(Arc::clone(&doc), scheduler.handle());

        scroll.animate(target, ScrollOptions::new().container_id("missing"));
        scheduler.run_until_idle(10_000);
        assert_eq!(offset(&doc), 1000.0);
    }

    #[test]
    fn test_back_to_back_runs_keep_their_callbacks() {
        let (doc, first) = page();
        let second = {
            let mut guard = doc.lock().unwrap();
            let body = guard.body();
            guard.insert(NodeSpec::new().id("second").top(2000.0).parent(body))
        };

        let scheduler = TickScheduler::new();
        let scroll = SmoothScroll::new(Arc::clone(&doc), scheduler.handle());
        let log: EventLog = Arc::default();

        scroll.animate(first, recording(&doc, &log, ScrollOptions::new().duration(400.0)));
        scroll.animate(second, recording(&doc, &log, ScrollOptions::new().duration(800.0)));
        scheduler.run_until_idle(10_000);

        let events = log.lock().unwrap().clone();
        let count = |wanted: fn(&Event) -> bool| events.iter().filter(|e| wanted(e)).count();
        assert_eq!(count(|e| matches!(e, Event::Before(..))), 2);
        assert_eq!(count(|e| matches!(e, Event::After(..))), 2);

        let after_first = events.iter().position(|e| matches!(e, Event::After(el, _) if *el == first));
        let after_second = events.iter().position(|e| matches!(e, Event::After(el, _) if *el == second));
        assert!(after_first.unwrap() < after_second.unwrap());

        // The longer run writes last and lands on its own target
        assert_eq!(offset(&doc), 2000.0);
    }

    #[test]
    fn test_defaults_apply_to_unset_options() {
        let (doc, target) = page();
        let scheduler = TickScheduler::new();
        let mut scroll = SmoothScroll::new(Arc::clone(&doc), scheduler.handle());
        scroll.set_default_options(ScrollDefaults {
            duration: 160.0,
            offset: 100.0,
            easing: Easing::Linear,
            ..ScrollDefaults::default()
        });

        scroll.animate(target, ScrollOptions::new());
        scheduler.run_due();
        scheduler.advance(TICK_MS);
        assert_eq!(offset(&doc), 90.0);

        let elapsed = scheduler.run_until_idle(10_000);
        assert_eq!(elapsed, 144);
        assert_eq!(offset(&doc), 900.0);
    }

    #[test]
    fn test_dropped_scheduler_is_a_no_op() {
        let (doc, target) = page();
        let handle = TickScheduler::new().handle();
        let scroll = SmoothScroll::new(Arc::clone(&doc), handle);
        let log: EventLog = Arc::default();

        scroll.animate(target, recording(&doc, &log, ScrollOptions::new()));
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(doc.lock().unwrap().write_count(), 0);
    }
}
