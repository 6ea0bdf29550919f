//! Real-time, unbounded stepping driven by an external control stream
//! (keyboard in the CLI, a channel in tests). Independent of `get_trace`.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use galileo_scene::SceneDescription;

use crate::error::Result;
use crate::world::World;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Control {
    Continue,
    TogglePause,
    Reset,
    Quit,
}

pub trait ControlSource {
    /// Polled once per loop iteration; must not block.
    fn poll(&mut self) -> Control;
}

impl ControlSource for Receiver<Control> {
    fn poll(&mut self) -> Control {
        match self.try_recv() {
            Ok(c) => c,
            Err(TryRecvError::Empty) => Control::Continue,
            Err(TryRecvError::Disconnected) => Control::Quit,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct InteractiveOptions {
    /// Wall-clock pacing in steps per second; `None` runs flat out.
    pub realtime_hz: Option<f32>,
    /// Stop after this many physics steps; `None` runs until `Quit`.
    pub max_steps: Option<u64>,
    /// Objects printed every `print_every` steps.
    pub tracked: Vec<String>,
    pub print_every: u32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct InteractiveReport {
    pub steps: u64,
    pub resets: u32,
}

pub fn run_interactive(world: &mut World, scene: &SceneDescription, controls: &mut dyn ControlSource, opts: &InteractiveOptions) -> Result<InteractiveReport> {
    world.set_world(scene)?;
    let mut report = InteractiveReport::default();
    let mut paused = false;
    // Optional wall-clock pacing (does not affect determinism)
    let mut pacer = opts.realtime_hz
        .filter(|hz| *hz > 0.0)
        .map(|hz| (Instant::now(), Duration::from_secs_f32(1.0 / hz)));

    loop {
        match controls.poll() {
            Control::Quit => break,
            Control::Reset => {
                world.set_world(scene)?;
                report.resets += 1;
                log::debug!("interactive: reset after {} steps", report.steps);
            }
            Control::TogglePause => paused = !paused,
            Control::Continue => {}
        }

        if !paused {
            world.step()?;
            report.steps += 1;
            if opts.print_every != 0 && report.steps % opts.print_every as u64 == 0 {
                for name in &opts.tracked {
                    let p = world.pose(name)?;
                    println!("step {:6}  {:>8}  pos=({:+.3},{:+.3},{:+.3})", report.steps, name, p.pos.x, p.pos.y, p.pos.z);
                }
            }
            if opts.max_steps.is_some_and(|m| report.steps >= m) { break; }
        }

        if let Some((ref mut last, frame)) = pacer {
            let now = Instant::now();
            let next = *last + frame;
            if now < next { std::thread::sleep(next - now); }
            *last = Instant::now();
        } else if paused {
            std::thread::sleep(Duration::from_millis(5));
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use galileo_core::SimConfig;
    use galileo_scene::{ObjectRecord, ShapeKind};
    use std::sync::mpsc::channel;

    fn scene() -> SceneDescription {
        SceneDescription::new().with_object("A", ObjectRecord::new(ShapeKind::Ball, &[0.5], 1.0, [0.0, 0.0, 5.0]))
    }

    #[test]
    fn quits_when_source_disconnects() {
        let (tx, mut rx) = channel::<Control>();
        drop(tx);
        let mut w = World::new(SimConfig::default()).unwrap();
        let r = run_interactive(&mut w, &scene(), &mut rx, &InteractiveOptions::default()).unwrap();
        assert_eq!(r.steps, 0);
    }

    #[test]
    fn bounded_run_with_reset() {
        let (tx, mut rx) = channel();
        tx.send(Control::Continue).unwrap();
        tx.send(Control::Reset).unwrap();
        let mut w = World::new(SimConfig::default()).unwrap();
        let opts = InteractiveOptions { max_steps: Some(10), ..InteractiveOptions::default() };
        let r = run_interactive(&mut w, &scene(), &mut rx, &opts).unwrap();
        assert_eq!(r, InteractiveReport { steps: 10, resets: 1 });
        // reset happened after one step, so the world has run 9 steps since
        assert_eq!(w.tick_index(), 9);
        drop(tx);
    }

    #[test]
    fn pause_stops_stepping() {
        let (tx, mut rx) = channel();
        tx.send(Control::TogglePause).unwrap();
        tx.send(Control::Quit).unwrap();
        let mut w = World::new(SimConfig::default()).unwrap();
        let r = run_interactive(&mut w, &scene(), &mut rx, &InteractiveOptions::default()).unwrap();
        assert_eq!(r.steps, 0);
    }

    #[test]
    fn initial_force_is_a_single_kick() {
        let s = SceneDescription::new()
            .with_gravity(galileo_scene::Gravity::Vertical(0.0))
            .with_object("A", ObjectRecord::new(ShapeKind::Ball, &[0.5], 1.0, [0.0; 3]).with_force([240.0, 0.0, 0.0]));
        let (tx, mut rx) = channel();
        let mut w = World::new(SimConfig::default()).unwrap();
        let opts = InteractiveOptions { max_steps: Some(241), ..InteractiveOptions::default() };
        run_interactive(&mut w, &s, &mut rx, &opts).unwrap();
        // one step of 240 N over 1/240 s
        let expected = 1.0 / w.mass("A").unwrap();
        let v = w.vel("A").unwrap().lin;
        assert!((v.x - expected).abs() < 1e-3 * expected, "v.x = {} expected {expected}", v.x);
        assert!(v.y.abs() < 1e-6 && v.z.abs() < 1e-6);
        drop(tx);
    }
}
