use galileo_scene::{hex32, ObjectRecord, SceneDescription, ShapeKind, SurfaceRecord};
use galileo_world::*;

fn main() -> Result<()> {
    let scene = SceneDescription::new()
        .with_surface("table", SurfaceRecord::slab([10.0, 10.0, 1.0], [0.0, 0.0, -0.5], 0.8))
        .with_object("box", ObjectRecord::new(ShapeKind::Block, &[0.5, 0.5, 0.5], 1000.0, [0.0, 0.0, 2.0]));

    let mut w = World::new(SimConfig::default())?;
    let trace = get_trace(&mut w, &scene, &TraceRequest::new(1.0, &["box", "table"]))?;

    for k in (0..trace.frames()).step_by(6) {
        let p = trace.position[k][0];
        println!("frame {k:02}  z={:+.4}  contacts={}", p[2], trace.collisions[k][0]);
    }
    println!("trace hash {}", hex32(&trace.trace_hash()));
    Ok(())
}
