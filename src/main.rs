use std::io::{self, Write};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{Local, SecondsFormat};
use clap::Parser;
use log::{info, warn};
use serde_json::{Map, Value};

use adaptree::evaluation::{CurveFormat, Snapshot};
use adaptree::tasks::{PrequentialEvaluator, PrequentialLimits};
use adaptree::ui::cli::args::{Cli, Command};
use adaptree::ui::logger;
use adaptree::ui::types::build::{build_evaluator, build_learner, build_stream};
use adaptree::ui::types::choices::TaskChoice;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const FG_CYAN: &str = "\x1b[36m";
const FG_GREEN: &str = "\x1b[32m";
const FG_MAGENTA: &str = "\x1b[35m";
const FG_GREY: &str = "\x1b[90m";

const REPAINT: Duration = Duration::from_millis(150);
const BAR_WIDTH: usize = 15;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose).context("failed to install the logger")?;

    let task = match cli.command {
        Command::Describe(args) => {
            print!("{}", args.render()?);
            return Ok(());
        }
        Command::Run(args) => args.into_task_choice()?,
    };

    let TaskChoice::EvaluatePrequential(p) = task;
    let limits = p.limits();
    let header: Vec<String> = vec![
        format!("{BOLD}{FG_CYAN}▶ Prequential Evaluation{RESET}"),
        format!(
            "{DIM}sample_freq={}{RESET}  {DIM}mem_check_freq={}{RESET}  {}",
            limits.sample_frequency,
            limits.mem_check_frequency,
            timestamp_now()
        ),
        format!(
            "{FG_GREY}────────────────────────────────────────────────────────────────────────{RESET}"
        ),
    ];

    let stream = build_stream(p.stream).context("failed to build stream")?;
    let num_classes = stream.header().number_of_classes();
    let evaluator =
        build_evaluator(p.evaluator, num_classes).context("failed to build evaluator")?;
    let learner = build_learner(p.learner).context("failed to build learner")?;
    info!(
        "stream '{}' with {} attributes and {num_classes} classes",
        stream.header().relation_name(),
        stream.header().number_of_attributes()
    );

    let (tx, rx) = std::sync::mpsc::channel();
    let render: JoinHandle<()> = std::thread::spawn(move || render_progress(rx, header, limits));

    let mut runner = PrequentialEvaluator::new(learner, stream, evaluator, limits)
        .context("failed to construct PrequentialEvaluator")?
        .with_progress(tx);
    runner.run().context("runner failed")?;

    if let Some(path) = p.dump_file.as_ref().filter(|p| !p.as_os_str().is_empty()) {
        runner
            .curve()
            .export(path, CurveFormat::from(p.dump_format))
            .with_context(|| format!("failed to export snapshots to {}", path.display()))?;
        info!("wrote {} snapshots to {}", runner.curve().len(), path.display());
    }

    let model: Map<String, Value> = runner
        .learner()
        .model_measurements()
        .into_iter()
        .map(|m| (m.name, Value::from(m.value)))
        .collect();
    if runner.rejected() > 0 {
        warn!("{} instances were rejected by the learner", runner.rejected());
    }

    drop(runner);
    let _ = render.join();
    info!("model: {}", Value::Object(model));

    Ok(())
}

/// Prints `header` once, then repaints a single status line from the
/// snapshots received until the sender hangs up.
fn render_progress(rx: Receiver<Snapshot>, header: Vec<String>, limits: PrequentialLimits) {
    let mut out = io::stdout().lock();
    for line in &header {
        let _ = writeln!(out, "{line}");
    }
    let _ = writeln!(out);
    let _ = out.flush();

    let mut latest: Option<Snapshot> = None;
    let mut previous: Option<Snapshot> = None;
    let mut last_paint = Instant::now();
    loop {
        let done = match rx.recv_timeout(REPAINT) {
            Ok(snapshot) => {
                previous = latest.replace(snapshot);
                false
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => true,
        };

        if done || last_paint.elapsed() >= REPAINT {
            if let Some(s) = &latest {
                let _ = write!(out, "\r{}\x1b[K", status_line(s, previous.as_ref(), &limits));
                let _ = out.flush();
            }
            last_paint = Instant::now();
        }
        if done {
            let _ = writeln!(out);
            break;
        }
    }
}

fn status_line(s: &Snapshot, previous: Option<&Snapshot>, limits: &PrequentialLimits) -> String {
    let mut line = format!(
        "{FG_GREEN}{BOLD}seen{RESET} {:>9}  {FG_CYAN}{BOLD}acc{RESET} {}%  {FG_MAGENTA}{BOLD}κ{RESET} {}%",
        s.instances_seen,
        percent(s.accuracy),
        percent(s.kappa),
    );
    for (label, key) in [("P", "precision"), ("R", "recall"), ("F1", "f1")] {
        if let Some(v) = s.extras.get(key) {
            line.push_str(&format!("  {DIM}{label}{RESET} {}", percent(*v)));
        }
    }
    if let Some(ips) = previous.and_then(|p| throughput(p, s)) {
        line.push_str(&format!("  {DIM}ips{RESET} {ips:>8.0}"));
    }
    line.push_str(&format!(
        "  {DIM}ram_h{RESET} {:.3e}  {DIM}t{RESET} {:.2}s",
        s.ram_hours, s.seconds
    ));

    if let Some(max) = limits.max_instances {
        line.push_str(&format!(
            "  {DIM}[inst]{RESET} {}",
            bar(s.instances_seen as f64 / max as f64)
        ));
    }
    if let Some(max) = limits.max_seconds {
        line.push_str(&format!("  {DIM}[time]{RESET} {}", bar(s.seconds / max as f64)));
    }
    line
}

/// Instances per CPU second between two snapshots.
fn throughput(before: &Snapshot, after: &Snapshot) -> Option<f64> {
    let dt = after.seconds - before.seconds;
    let dn = after.instances_seen.checked_sub(before.instances_seen)?;
    (dt > 0.0).then(|| dn as f64 / dt)
}

fn percent(x: f64) -> String {
    if x.is_nan() {
        format!("{DIM}   NaN{RESET}")
    } else {
        format!("{:>6.2}", x * 100.0)
    }
}

fn bar(ratio: f64) -> String {
    if !ratio.is_finite() {
        return String::new();
    }
    let ratio = ratio.clamp(0.0, 1.0);
    let filled = (ratio * BAR_WIDTH as f64).round() as usize;
    format!(
        "[{}{}] {:>3.0}%",
        "█".repeat(filled),
        "░".repeat(BAR_WIDTH - filled),
        ratio * 100.0
    )
}

fn timestamp_now() -> String {
    let now = Local::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    format!("{DIM}{now}{RESET}")
}
