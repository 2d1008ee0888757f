//! `glide simulate` - animate a headless page and report each frame

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use glide_animation::{Easing, TickScheduler};
use glide_scroll::location;
use glide_scroll::{
    Document, ElementId, NodeSpec, Offset, ScrollDefaults, ScrollHost, ScrollOptions,
    SharedDocument, SmoothScroll, Surface, TICK_MS,
};
use serde::Serialize;
use tracing::info;

/// Extra simulated time allowed past the configured duration
const SETTLE_MS: u64 = 10_000;

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Offset of the target element from the top of the page
    #[arg(short, long)]
    pub target: f64,

    /// Initial scroll offset of the page
    #[arg(long, default_value_t = 0.0)]
    pub from: f64,

    /// Animation length in milliseconds
    #[arg(short, long)]
    pub duration: Option<f64>,

    /// Easing curve name (e.g. easeInOutQuart)
    #[arg(short, long)]
    pub easing: Option<String>,

    /// Pixels subtracted from the target offset
    #[arg(short, long)]
    pub offset: Option<f64>,

    /// Total page height
    #[arg(long, default_value_t = 5000.0)]
    pub page_height: f64,

    /// Viewport height
    #[arg(long, default_value_t = 800.0)]
    pub viewport: f64,

    /// Round scroll writes to whole pixels
    #[arg(long)]
    pub snap: bool,

    /// Stop the animation when the user scrolls
    #[arg(long)]
    pub stop_for_interruptions: bool,

    /// Simulate a wheel event after this many milliseconds
    #[arg(long)]
    pub interrupt_at: Option<u64>,

    /// TOML file with default options
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Run on a real-time background clock instead of simulated time
    #[arg(long)]
    pub realtime: bool,

    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
pub struct Frame {
    pub tick: usize,
    pub time_ms: u64,
    pub requested: f64,
    pub applied: f64,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub start: f64,
    pub end: f64,
    pub easing: Easing,
    pub duration_ms: f64,
    pub completed: bool,
    pub frames: Vec<Frame>,
}

struct Page {
    doc: SharedDocument,
    target: ElementId,
}

fn build_page(args: &SimulateArgs) -> Page {
    let mut doc = Document::new(args.viewport, args.page_height)
        .with_pixel_snapping(args.snap)
        .with_write_log(true);
    let body = doc.body();
    let target = doc.insert(NodeSpec::new().id("target").top(args.target).parent(body));
    doc.set_scroll_offset(Surface::Viewport, args.from);
    doc.clear_writes();
    Page {
        doc: doc.shared(),
        target,
    }
}

fn load_defaults(args: &SimulateArgs) -> Result<ScrollDefaults> {
    match &args.config {
        Some(path) => ScrollDefaults::load(path)
            .with_context(|| format!("Failed to load defaults from {}", path.display())),
        None => Ok(ScrollDefaults::default()),
    }
}

fn build_options(args: &SimulateArgs) -> Result<ScrollOptions> {
    let mut options = ScrollOptions::new();
    if let Some(duration) = args.duration {
        options = options.duration(duration);
    }
    if let Some(name) = &args.easing {
        let easing = Easing::from_str(name).with_context(|| {
            let names: Vec<_> = Easing::ALL.iter().map(|e| e.name()).collect();
            format!("Valid curves: {}", names.join(", "))
        })?;
        options = options.easing(easing);
    }
    if let Some(offset) = args.offset {
        options = options.offset(offset);
    }
    if args.stop_for_interruptions {
        options = options.stop_for_interruptions(true);
    }
    Ok(options)
}

/// Run one animation and collect its frames
pub fn run_simulation(args: &SimulateArgs) -> Result<Report> {
    let defaults = load_defaults(args)?;
    let options = build_options(args)?;
    let easing = options.easing.unwrap_or(defaults.easing);
    let duration_ms = options.duration.unwrap_or(defaults.duration);
    let adjustment = options.offset.as_ref().map_or(defaults.offset, |offset| match offset {
        Offset::Pixels(px) => *px,
        _ => 0.0,
    });

    let page = build_page(args);
    let (start, end) = {
        let doc = page.doc.lock().map_err(|_| anyhow::anyhow!("document lock poisoned"))?;
        (
            location::current_offset(&*doc, Surface::Viewport),
            location::target_offset(&*doc, page.target, adjustment, Surface::Viewport),
        )
    };

    let mut scheduler = TickScheduler::new();
    let handle = scheduler.handle();
    let scroll = SmoothScroll::with_defaults(Arc::clone(&page.doc), handle.clone(), defaults);

    if let Some(at) = args.interrupt_at {
        let doc = Arc::clone(&page.doc);
        handle.set_timeout(at, move || {
            if let Ok(mut doc) = doc.lock() {
                doc.wheel(Surface::Viewport, 0.0);
            }
        });
    }

    let completed = Arc::new(AtomicBool::new(false));
    let (done_tx, done_rx) = mpsc::channel();
    let flag = Arc::clone(&completed);
    let options = options.callback_after(move |_| {
        flag.store(true, Ordering::SeqCst);
        let _ = done_tx.send(());
    });

    info!("Simulating scroll from {} to {} ({}, {}ms)", start, end, easing, duration_ms);
    scroll.animate(page.target, options);

    let budget = duration_ms.max(0.0) as u64 + SETTLE_MS;
    if args.realtime {
        scheduler.start_background();
        let finished = done_rx.recv_timeout(Duration::from_millis(budget)).is_ok();
        scheduler.stop_background();
        if !finished {
            tracing::warn!("Animation did not finish within {}ms", budget);
        }
    } else {
        scheduler.run_until_idle(budget);
    }

    let doc = page.doc.lock().map_err(|_| anyhow::anyhow!("document lock poisoned"))?;
    let frames = doc
        .writes()
        .iter()
        .enumerate()
        .map(|(index, write)| Frame {
            tick: index + 1,
            time_ms: (index as u64 + 1) * TICK_MS,
            requested: write.requested,
            applied: write.applied,
        })
        .collect();

    Ok(Report {
        start,
        end,
        easing,
        duration_ms,
        completed: completed.load(Ordering::SeqCst),
        frames,
    })
}

pub fn cmd_simulate(args: &SimulateArgs) -> Result<()> {
    let report = run_simulation(args)?;

    if args.json {
        let text = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", text);
        return Ok(());
    }

    println!(
        "{} -> {} over {}ms ({})",
        report.start, report.end, report.duration_ms, report.easing
    );
    println!("{:>6} {:>8} {:>14} {:>14}", "tick", "time", "requested", "applied");
    for frame in &report.frames {
        println!(
            "{:>6} {:>6}ms {:>14.3} {:>14.3}",
            frame.tick, frame.time_ms, frame.requested, frame.applied
        );
    }
    println!(
        "{} frames, {}",
        report.frames.len(),
        if report.completed { "completed" } else { "not completed" }
    );
    Ok(())
}
