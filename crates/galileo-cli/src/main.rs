// galileo: record, resume, compare and inspect rigid-body scene traces.

mod keys;

use std::{fs, path::{Path, PathBuf}, process::ExitCode};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use galileo_core::{vec3, SimConfig};
use galileo_scene::analysis::DEFAULT_STABILITY_THRESHOLD;
use galileo_scene::{direction, first_contact_frames, hex32, kinetic_energy, scene_hash, stability, write_json, PairTable};
use galileo_world::*;

// ---------- tiny env helpers ----------
fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key).ok().and_then(|s| s.parse::<u32>().ok()).unwrap_or(default)
}
fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key).ok().and_then(|s| s.parse::<f32>().ok()).unwrap_or(default)
}

fn parse_vec3(s: &str) -> std::result::Result<[f32; 3], String> {
    let parts: Vec<f32> = s.split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("{p:?}: {e}")))
        .collect::<std::result::Result<_, _>>()?;
    <[f32; 3]>::try_from(parts).map_err(|v| format!("expected x,y,z, got {} values", v.len()))
}

#[derive(Parser, Debug)]
#[command(name = "galileo", version, about = "Deterministic rigid-body scene traces")]
struct Opts {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run a scene and write its trace as JSON
    Simulate(SimulateOpts),
    /// Segmented re-simulation, compared against one uninterrupted run
    Markov(MarkovOpts),
    /// Extract frame k of a trace as a checkpoint
    Checkpoint {
        trace: PathBuf,
        /// Frame index; defaults to the last frame
        #[arg(long)]
        frame: Option<usize>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the blake3 digest of a scene file
    Hash { scene: PathBuf },
    /// Report the first difference between two trace files
    Diff {
        left: PathBuf,
        right: PathBuf,
        #[command(flatten)]
        eps: EpsOpts,
    },
    /// Stability, drift direction, contacts and energy of a trace
    Analyze {
        trace: PathBuf,
        /// Scene the trace came from; needed for energies
        #[arg(long)]
        scene: Option<PathBuf>,
        #[arg(long, default_value_t = DEFAULT_STABILITY_THRESHOLD)]
        threshold: f32,
    },
    /// Step a scene in real time. Stdin: p = pause/resume, r = reset, q = quit
    Interactive {
        scene: PathBuf,
        /// Objects printed while running; defaults to every object
        #[arg(long, value_delimiter = ',')]
        objects: Vec<String>,
        #[arg(long)]
        max_steps: Option<u64>,
        #[command(flatten)]
        rates: RateOpts,
    },
}

#[derive(Args, Debug, Clone)]
struct RateOpts {
    /// Output frames per second
    #[arg(long, default_value_t = 60)]
    fps: u32,
    /// Internal physics steps per second
    #[arg(long, default_value_t = 240)]
    time_step: u32,
    #[arg(long, default_value_t = 1.0)]
    time_scale: f32,
}

#[derive(Args, Debug, Clone)]
struct EpsOpts {
    #[arg(long, default_value_t = 1.0e-3)]
    eps_pos: f32,
    #[arg(long, default_value_t = 1.0e-3)]
    eps_vel: f32,
    #[arg(long, default_value_t = 0.05)]
    eps_quat_deg: f32,
    #[arg(long, default_value_t = 2)]
    eps_contacts: u32,
}

impl From<&EpsOpts> for Eps {
    fn from(o: &EpsOpts) -> Self {
        Eps { pos: o.eps_pos, vel: o.eps_vel, quat_deg: o.eps_quat_deg, contacts: o.eps_contacts }
    }
}

#[derive(Args, Debug)]
struct SimulateOpts {
    scene: PathBuf,
    /// Simulated seconds
    #[arg(long, default_value_t = 1.0)]
    duration: f64,
    /// Tracked objects in column order; defaults to every object
    #[arg(long, value_delimiter = ',')]
    objects: Vec<String>,
    #[command(flatten)]
    rates: RateOpts,
    /// Constant force x,y,z on --force-objects during [--force-start, --force-end)
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    force: Option<[f32; 3]>,
    /// Random horizontal force of this magnitude on --force-objects
    #[arg(long, conflicts_with = "force")]
    random_force: Option<f32>,
    #[arg(long, value_delimiter = ',')]
    force_objects: Vec<String>,
    #[arg(long, default_value_t = 0)]
    force_start: u64,
    #[arg(long, default_value_t = u64::MAX)]
    force_end: u64,
    /// Gaussian xy jitter (std dev, meters) on tracked objects before the first step
    #[arg(long)]
    jitter: Option<f32>,
    #[arg(long, default_value_t = 0x5EED)]
    seed: u64,
    /// Start from this checkpoint instead of the scene's initial state
    #[arg(long)]
    resume: Option<PathBuf>,
    /// Trace output path; stdout when absent
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long)]
    pretty: bool,
    /// Write the provenance ledger as JSON lines into this directory
    #[arg(long)]
    ledger: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct MarkovOpts {
    scene: PathBuf,
    #[arg(long, default_value_t = 4)]
    segments: usize,
    #[arg(long, default_value_t = 0.25)]
    segment_duration: f64,
    #[arg(long, value_delimiter = ',')]
    objects: Vec<String>,
    #[command(flatten)]
    rates: RateOpts,
    #[command(flatten)]
    eps: EpsOpts,
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    match Opts::parse().cmd {
        Cmd::Simulate(o) => simulate(o),
        Cmd::Markov(o) => markov(o),
        Cmd::Checkpoint { trace, frame, out } => checkpoint(&trace, frame, out.as_deref()),
        Cmd::Hash { scene } => {
            let s = load_scene(&scene)?;
            println!("{}  {}", hex32(&scene_hash(&s)?), scene.display());
            Ok(ExitCode::SUCCESS)
        }
        Cmd::Diff { left, right, eps } => diff(&left, &right, (&eps).into()),
        Cmd::Analyze { trace, scene, threshold } => analyze(&trace, scene.as_deref(), threshold),
        Cmd::Interactive { scene, objects, max_steps, rates } => interactive(&scene, objects, max_steps, &rates),
    }
}

/* ====================== helpers ====================== */
fn load_scene(path: &Path) -> Result<SceneDescription> {
    SceneDescription::load(path).with_context(|| format!("loading scene {}", path.display()))
}

fn load_trace(path: &Path) -> Result<Trace> {
    Trace::load(path).with_context(|| format!("loading trace {}", path.display()))
}

fn make_world(rates: &RateOpts) -> Result<World> {
    let mut cfg = SimConfig::default().with_rates(rates.time_step, rates.fps);
    cfg.time_scale = rates.time_scale;
    let debug = DebugSettings {
        print_every: env_u32("GALILEO_PRINT_EVERY", 0),
        max_lines: env_u32("GALILEO_MAX_LINES", 16) as usize,
        json_every: env_u32("GALILEO_JSON_EVERY", 0),
        dump_dir: std::env::var_os("GALILEO_DUMP_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("out")),
        ..DebugSettings::default()
    };
    WorldBuilder::new().with_config(cfg).with_debug(debug).build().context("building world")
}

fn tracked_or_all(objects: Vec<String>, scene: &SceneDescription) -> Vec<String> {
    if objects.is_empty() { scene.objects.keys().cloned().collect() } else { objects }
}

fn emit(json: &str, out: Option<&Path>, what: &str) -> Result<()> {
    match out {
        Some(p) => fs::write(p, json).with_context(|| format!("writing {what} to {}", p.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

/* ====================== subcommands ====================== */
fn simulate(o: SimulateOpts) -> Result<ExitCode> {
    let scene = load_scene(&o.scene)?;
    let objects = tracked_or_all(o.objects, &scene);
    let names: Vec<&str> = o.force_objects.iter().map(String::as_str).collect();

    let mut stepper = Stepper::new();
    if let Some(f) = o.force {
        stepper.set_force(Box::new(FixedWindow::new(&names, vec3(f[0], f[1], f[2]), o.force_start, o.force_end)));
    } else if let Some(m) = o.random_force {
        stepper.set_force(Box::new(RandomDirection::new(&names, m, o.force_start, o.force_end, o.seed)));
    }
    if let Some(sigma) = o.jitter {
        stepper.set_perturbation(Box::new(PositionJitter::new(sigma, o.seed ^ 0x9E37_79B9)));
    }

    let mut req = TraceRequest { duration: o.duration, objects, resume_from: None, rates: None };
    if let Some(p) = &o.resume {
        let cp = Checkpoint::load(p).with_context(|| format!("loading checkpoint {}", p.display()))?;
        req = req.resume_from(cp);
    }

    let mut world = make_world(&o.rates)?;
    world.set_world(&scene)?;
    let trace = stepper.get_trace(&mut world, &req)?;
    log::info!("simulated {} frames of {} objects", trace.frames(), trace.tracked());

    match &o.out {
        Some(p) => write_json(&trace, p, o.pretty).with_context(|| format!("writing trace {}", p.display()))?,
        None => println!("{}", trace.to_json_string(o.pretty)?),
    }
    if let Some(dir) = &o.ledger {
        fs::create_dir_all(dir)?;
        let path = world.ledger().write_jsonl(dir, world.tick_index())
            .with_context(|| format!("writing ledger into {}", dir.display()))?;
        eprintln!("ledger: {}", path.display());
    }
    eprintln!("trace_hash {}", hex32(&trace.trace_hash()));
    Ok(ExitCode::SUCCESS)
}

fn markov(o: MarkovOpts) -> Result<ExitCode> {
    let scene = load_scene(&o.scene)?;
    let objects = tracked_or_all(o.objects, &scene);
    let mut world = make_world(&o.rates)?;

    let total = o.segments as f64 * o.segment_duration;
    world.set_world(&scene)?;
    let full = Stepper::new().get_trace(&mut world, &TraceRequest { duration: total, objects: objects.clone(), resume_from: None, rates: None })?;
    let mut stepper = Stepper::new();
    let segmented = markov_trace(&mut world, &scene, &mut stepper, &objects, o.segments, o.segment_duration)?;

    println!("full      {} frames  {}", full.frames(), hex32(&full.trace_hash()));
    println!("segmented {} frames  {}", segmented.frames(), hex32(&segmented.trace_hash()));
    if let Some(p) = &o.out {
        write_json(&segmented, p, false).with_context(|| format!("writing trace {}", p.display()))?;
    }
    report(compare_traces(&full, &segmented, (&o.eps).into())?)
}

fn checkpoint(trace: &Path, frame: Option<usize>, out: Option<&Path>) -> Result<ExitCode> {
    let t = load_trace(trace)?;
    let k = match frame {
        Some(k) => k,
        None => t.frames().checked_sub(1).ok_or_else(|| anyhow!("{} has no frames", trace.display()))?,
    };
    let cp = capture(&t, k)?;
    emit(&cp.to_json_string(true)?, out, "checkpoint")?;
    Ok(ExitCode::SUCCESS)
}

fn diff(left: &Path, right: &Path, eps: Eps) -> Result<ExitCode> {
    let l = load_trace(left)?;
    let r = load_trace(right)?;
    report(compare_traces(&l, &r, eps)?)
}

fn report(m: Option<Mismatch>) -> Result<ExitCode> {
    match m {
        None => {
            println!("OK traces agree within eps");
            Ok(ExitCode::SUCCESS)
        }
        Some(m) => {
            println!("DIFF frame {} object {:?} field {} |d| = {:.6}", m.frame, m.object, m.field, m.delta);
            Ok(ExitCode::from(2))
        }
    }
}

fn analyze(trace: &Path, scene: Option<&Path>, threshold: f32) -> Result<ExitCode> {
    let t = load_trace(trace)?;
    println!("frames {}  objects {}", t.frames(), t.tracked());
    println!("stability(>{threshold} m) {:.3}", stability(&t, threshold));
    let (angle, mag) = direction(&t);
    println!("direction {:.1} deg  magnitude {:.4} m", angle.to_degrees(), mag);

    let table = PairTable::new(t.tracked());
    for (col, first) in first_contact_frames(&t).into_iter().enumerate() {
        let (Some(first), Some((a, b))) = (first, table.pair(col)) else { continue };
        println!("first contact {} / {} at frame {first}", t.objects[a], t.objects[b]);
    }

    if let Some(path) = scene {
        let s = load_scene(path)?;
        let mut world = make_world(&RateOpts { fps: t.fps, time_step: t.time_step, time_scale: 1.0 })?;
        world.set_world(&s)?;
        let masses = t.objects.iter().map(|n| world.mass(n)).collect::<galileo_world::Result<Vec<f32>>>()?;
        let ke = kinetic_energy(&t, &masses)?;
        if let (Some(first), Some(last)) = (ke.first(), ke.last()) {
            println!("kinetic energy {first:.4} J -> {last:.4} J");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn interactive(path: &Path, objects: Vec<String>, max_steps: Option<u64>, rates: &RateOpts) -> Result<ExitCode> {
    let scene = load_scene(path)?;
    if scene.body_count() == 0 {
        bail!("{} has no bodies", path.display());
    }
    let mut world = make_world(rates)?;
    let opts = InteractiveOptions {
        realtime_hz: Some(env_f32("GALILEO_REALTIME_HZ", rates.time_step as f32)),
        max_steps,
        tracked: tracked_or_all(objects, &scene),
        print_every: env_u32("GALILEO_PRINT_EVERY", rates.time_step),
    };
    let mut rx = keys::spawn_stdin_controls();
    let r = run_interactive(&mut world, &scene, &mut rx, &opts)?;
    println!("stopped after {} steps ({} resets), state {}", r.steps, r.resets, hex32(&world.step_hash()));
    Ok(ExitCode::SUCCESS)
}
