use approx::assert_abs_diff_eq;
use galileo_core::{vec3, SimConfig};
use galileo_scene::{capture, first_contact_frames, Gravity, ObjectRecord, SceneDescription, ShapeKind, SurfaceRecord};
use galileo_world::*;

fn table() -> SurfaceRecord { SurfaceRecord::slab([10.0, 10.0, 1.0], [5.0, 0.0, -0.5], 0.8) }

fn drop_scene() -> SceneDescription {
    SceneDescription::new()
        .with_surface("table", table())
        .with_object("A", ObjectRecord::new(ShapeKind::Block, &[1.0, 1.0, 1.0], 1.0, [5.0, 0.0, 6.5]))
}

fn world() -> World { World::new(SimConfig::default()).unwrap() }

fn z(t: &Trace, frame: usize, obj: usize) -> f32 { t.position[frame][obj][2] }

/* ---------------- drop ---------------- */
#[test]
fn drop_one_second_falls_monotonically() {
    let mut w = world();
    let t = get_trace(&mut w, &drop_scene(), &TraceRequest::new(1.0, &["A", "table"])).unwrap();
    assert_eq!(t.frames(), 60);
    assert_eq!(t.position[0].len(), 2);
    assert_eq!(t.rotation[0][0].len(), 4);
    assert_eq!(t.collisions[0].len(), 1);
    for k in 1..60 {
        assert!(z(&t, k, 0) < z(&t, k - 1, 0), "z not decreasing at frame {k}");
    }
    // still airborne at 1 s; lands around 1.095 s
    assert_abs_diff_eq!(z(&t, 59, 0), 1.48, epsilon = 0.03);
    assert!(t.collisions.iter().all(|row| row[0] == 0));
    // table never moves
    assert_eq!(t.position[0][1], [5.0, 0.0, -0.5]);
    assert_eq!(t.position[59][1], [5.0, 0.0, -0.5]);
}

#[test]
fn drop_settles_on_table() {
    let mut w = world();
    let t = get_trace(&mut w, &drop_scene(), &TraceRequest::new(3.0, &["A", "table"])).unwrap();
    assert_eq!(t.frames(), 180);
    assert_abs_diff_eq!(z(&t, 179, 0), 0.5, epsilon = 0.05);
    let v = t.linear_velocity[179][0];
    assert!(v.iter().map(|c| c * c).sum::<f32>().sqrt() < 0.05);
    assert!(t.collisions[179][0] > 0);
    let first = first_contact_frames(&t)[0].unwrap();
    assert!((60..=70).contains(&first), "first contact at frame {first}");
}

#[test]
fn frame_count_floors() {
    let mut w = world();
    let s = drop_scene().with_object("B", ObjectRecord::new(ShapeKind::Ball, &[0.25], 1.0, [2.0, 0.0, 3.0]));
    let t = get_trace(&mut w, &s, &TraceRequest::new(0.7, &["B", "A", "table"])).unwrap();
    assert_eq!(t.frames(), 42);
    assert_eq!(t.collisions[41].len(), 3);
    assert_eq!(t.objects, ["B", "A", "table"]);
    t.validate().unwrap();
}

#[test]
fn per_request_rates_set_frame_count() {
    let mut w = world();
    let req = TraceRequest::new(1.0, &["A"]).with_rates(120, 6);
    let t = get_trace(&mut w, &drop_scene(), &req).unwrap();
    assert_eq!(t.frames(), 6);
    assert_eq!((t.time_step, t.fps), (120, 6));
    assert_eq!(w.tick_index(), 120);
    // the rates stick to the world
    let t = get_trace(&mut w, &drop_scene(), &TraceRequest::new(0.5, &["A"])).unwrap();
    assert_eq!(t.frames(), 3);
    // same fall at a finer physics rate lands in the same place
    let fine = get_trace(&mut world(), &drop_scene(), &TraceRequest::new(1.0, &["A"])).unwrap();
    let coarse = get_trace(&mut w, &drop_scene(), &TraceRequest::new(1.0, &["A"])).unwrap();
    assert_abs_diff_eq!(z(&coarse, 5, 0), z(&fine, 59, 0), epsilon = 0.05);
}

#[test]
fn initial_force_is_one_step_impulse_in_trace() {
    let s = SceneDescription::new()
        .with_gravity(Gravity::Vertical(0.0))
        .with_object("A", ObjectRecord::new(ShapeKind::Ball, &[0.5], 1.0, [0.0; 3]).with_force([240.0, 0.0, 0.0]));
    let mut w = world();
    let t = get_trace(&mut w, &s, &TraceRequest::new(1.0, &["A"])).unwrap();
    let v0 = t.linear_velocity[0][0][0];
    assert_abs_diff_eq!(v0, 1.0 / w.mass("A").unwrap(), epsilon = 1e-3);
    assert_abs_diff_eq!(t.linear_velocity[59][0][0], v0, epsilon = 1e-4);
}

/* ---------------- static / zero gravity ---------------- */
#[test]
fn static_scene_without_gravity_is_constant() {
    let s = SceneDescription::new()
        .with_gravity(Gravity::Vertical(0.0))
        .with_surface("table", table())
        .with_surface("ramp", SurfaceRecord::slab([10.0, 10.0, 1.0], [-3.0, 0.0, 2.0], 0.8));
    let mut w = world();
    let t = get_trace(&mut w, &s, &TraceRequest::new(1.0, &["table", "ramp"])).unwrap();
    for k in 0..t.frames() {
        assert_eq!(t.position[k], t.position[0]);
        assert_eq!(t.linear_velocity[k], vec![[0.0; 3]; 2]);
    }
}

/* ---------------- checkpoint / restore ---------------- */
#[test]
fn restore_then_snapshot_reproduces_frame() {
    let s = drop_scene().with_object(
        "B",
        ObjectRecord::new(ShapeKind::Ball, &[0.25], 2.0, [3.0, 0.0, 2.0]).with_velocity([0.5, 0.2, 0.0], [0.0, 0.0, 1.0]),
    );
    let objects = ["A", "B"];
    let mut w = world();
    let t = get_trace(&mut w, &s, &TraceRequest::new(1.0, &objects)).unwrap();
    let cp = capture(&t, 40).unwrap();

    w.set_world(&s).unwrap();
    restore(&mut w, &cp).unwrap();
    let empty = Stepper::new().get_trace(&mut w, &TraceRequest::new(0.0, &objects)).unwrap();
    assert_eq!(empty.frames(), 0);
    let back = snapshot(&w, &cp.objects).unwrap();
    for i in 0..2 {
        for c in 0..3 {
            assert_abs_diff_eq!(back.positions[i][c], cp.positions[i][c], epsilon = 1e-6);
            assert_abs_diff_eq!(back.linear_velocities[i][c], cp.linear_velocities[i][c], epsilon = 1e-6);
            assert_abs_diff_eq!(back.angular_velocities[i][c], cp.angular_velocities[i][c], epsilon = 1e-6);
        }
        let qa = galileo_core::Quat::from_array(back.rotations[i]);
        let qb = galileo_core::Quat::from_array(cp.rotations[i]);
        assert!(quat_angle_deg(qa, qb) < 1e-3);
    }
    assert!(w.ledger().iter().any(|e| matches!(e, LedgerEvent::Restored { .. })));
}

#[test]
fn restore_rejects_unknown_objects() {
    let mut w = world();
    w.set_world(&drop_scene()).unwrap();
    let cp = Checkpoint {
        objects: vec!["ghost".into()],
        positions: vec![[0.0; 3]],
        rotations: vec![[0.0, 0.0, 0.0, 1.0]],
        linear_velocities: vec![[0.0; 3]],
        angular_velocities: vec![[0.0; 3]],
    };
    assert!(matches!(restore(&mut w, &cp), Err(SimError::UnknownObject(n)) if n == "ghost"));
}

#[test]
fn splice_matches_full_run_in_free_fall() {
    let s = drop_scene();
    let objects = ["A"];
    let mut w = world();
    let full = get_trace(&mut w, &s, &TraceRequest::new(1.0, &objects)).unwrap();

    let first = get_trace(&mut w, &s, &TraceRequest::new(0.5, &objects)).unwrap();
    let cp = capture(&first, first.frames() - 1).unwrap();
    w.set_world(&s).unwrap();
    let second = Stepper::new()
        .get_trace(&mut w, &TraceRequest::new(0.5, &objects).resume_from(cp))
        .unwrap();
    let spliced = first.concat(&second).unwrap();

    assert_eq!(spliced.frames(), full.frames());
    let eps = Eps { pos: 1e-3, vel: 1e-3, quat_deg: 0.05, contacts: 0 };
    assert_eq!(compare_traces(&full, &spliced, eps).unwrap(), None);
}

#[test]
fn splice_through_landing_stays_close() {
    let s = drop_scene();
    let objects = ["A", "table"];
    let mut w = world();
    let full = get_trace(&mut w, &s, &TraceRequest::new(2.0, &objects)).unwrap();

    let first = get_trace(&mut w, &s, &TraceRequest::new(1.5, &objects)).unwrap();
    let cp = capture(&first, first.frames() - 1).unwrap();
    w.set_world(&s).unwrap();
    let second = Stepper::new()
        .get_trace(&mut w, &TraceRequest::new(0.5, &objects).resume_from(cp))
        .unwrap();
    let spliced = first.concat(&second).unwrap();
    assert_abs_diff_eq!(z(&spliced, 119, 0), z(&full, 119, 0), epsilon = 0.05);
}

#[test]
fn markov_segments_match_full_run_in_free_fall() {
    let s = drop_scene();
    let objects = vec!["A".to_string()];
    let mut w = world();
    let full = get_trace(&mut w, &s, &TraceRequest::new(1.0, &["A"])).unwrap();
    let mut stepper = Stepper::new();
    let m = markov_trace(&mut w, &s, &mut stepper, &objects, 4, 0.25).unwrap();
    assert_eq!(m.frames(), 60);
    assert_eq!(compare_traces(&full, &m, Eps::default()).unwrap(), None);
}

/* ---------------- contacts ---------------- */
#[test]
fn collision_course_contact_precedes_velocity_jump() {
    let s = SceneDescription::new()
        .with_gravity(Gravity::Vertical(0.0))
        .with_object("L", ObjectRecord::new(ShapeKind::Ball, &[0.25], 1.0, [0.0, 0.0, 1.0])
            .with_velocity([1.0, 0.0, 0.0], [0.0; 3]).with_restitution(0.0))
        .with_object("R", ObjectRecord::new(ShapeKind::Ball, &[0.25], 1.0, [2.0, 0.0, 1.0])
            .with_velocity([-1.0, 0.0, 0.0], [0.0; 3]).with_restitution(0.0));
    let mut w = world();
    let t = get_trace(&mut w, &s, &TraceRequest::new(1.5, &["L", "R"])).unwrap();

    let jump = (0..t.frames())
        .find(|k| (t.linear_velocity[*k][0][0] - 1.0).abs() > 0.1)
        .expect("velocity never changed");
    let contact = first_contact_frames(&t)[0].expect("no contact recorded");
    assert!(contact <= jump, "contact at {contact}, velocity jump at {jump}");
    // gap of 1.5 m closing at 2 m/s
    assert!((40..=50).contains(&jump), "jump at {jump}");
    assert!(w.ledger().iter().any(|e| matches!(e, LedgerEvent::FirstContact { .. })));
}

/* ---------------- forces ---------------- */
#[test]
fn force_on_static_body_is_noop() {
    let s = drop_scene();
    let mut w = world();
    w.set_world(&s).unwrap();
    let pushed = Stepper::new()
        .with_force(FixedWindow::new(&["table"], vec3(1.0e4, 0.0, 0.0), 0, 240))
        .get_trace(&mut w, &TraceRequest::new(1.0, &["A", "table"]))
        .unwrap();
    let plain = get_trace(&mut w, &s, &TraceRequest::new(1.0, &["A", "table"])).unwrap();
    assert_eq!(pushed.trace_hash(), plain.trace_hash());
}

#[test]
fn force_changes_velocity_only_inside_window() {
    let s = SceneDescription::new()
        .with_gravity(Gravity::Vertical(0.0))
        .with_object("B", ObjectRecord::new(ShapeKind::Ball, &[0.5], 1.0, [0.0, 0.0, 5.0]));
    let mut w = world();
    w.set_world(&s).unwrap();
    let m = w.mass("B").unwrap();
    // 24 steps = 6 frames at 240/60
    let t = Stepper::new()
        .with_force(FixedWindow::new(&["B"], vec3(m * 10.0, 0.0, 0.0), 0, 24))
        .get_trace(&mut w, &TraceRequest::new(1.0, &["B"]))
        .unwrap();
    let vx = |k: usize| t.linear_velocity[k][0][0];
    assert!(vx(0) > 0.0 && vx(0) < vx(5));
    assert_abs_diff_eq!(vx(5), 1.0, epsilon = 0.01);
    for k in 6..t.frames() {
        assert_abs_diff_eq!(vx(k), vx(5), epsilon = 0.01);
    }
    let applied = w.ledger().iter().filter(|e| matches!(e, LedgerEvent::ForceApplied { .. })).count();
    assert_eq!(applied, 1);
}

#[test]
fn random_force_is_reproducible() {
    let s = drop_scene();
    let run = || {
        let mut w = world();
        w.set_world(&s).unwrap();
        Stepper::new()
            .with_force(RandomDirection::new(&["A"], 50.0, 0, 60, 42))
            .get_trace(&mut w, &TraceRequest::new(0.5, &["A"]))
            .unwrap()
    };
    let (a, b) = (run(), run());
    assert_eq!(a.trace_hash(), b.trace_hash());
    let p = a.position[29][0];
    assert!(p[0] != 5.0 || p[1] != 0.0);
}

#[test]
fn jitter_moves_tracked_dynamics_only() {
    let s = drop_scene();
    let mut w = world();
    w.set_world(&s).unwrap();
    let t = Stepper::new()
        .with_perturbation(PositionJitter::new(0.2, 9))
        .get_trace(&mut w, &TraceRequest::new(0.1, &["A", "table"]))
        .unwrap();
    assert_eq!(t.position[0][1], [5.0, 0.0, -0.5]);
    let a = t.position[0][0];
    assert!(a[0] != 5.0 || a[1] != 0.0);
    assert_eq!(w.ledger().iter().filter(|e| matches!(e, LedgerEvent::Perturbed { .. })).count(), 1);
}

/* ---------------- failures ---------------- */
#[test]
fn unknown_tracked_name_is_lookup_error() {
    let mut w = world();
    let err = get_trace(&mut w, &drop_scene(), &TraceRequest::new(1.0, &["A", "nope"])).unwrap_err();
    assert!(err.is_lookup());
    assert!(matches!(err, SimError::UnknownObject(n) if n == "nope"));
}

#[test]
fn duplicate_tracked_name_is_rejected() {
    let mut w = world();
    let err = get_trace(&mut w, &drop_scene(), &TraceRequest::new(1.0, &["A", "table", "A"])).unwrap_err();
    assert!(matches!(err, SimError::DuplicateObject(ref n) if n == "A"));
    assert!(!err.is_lookup());
    assert_eq!(w.tick_index(), 0);
}

#[test]
fn stepping_unbuilt_world_fails() {
    let mut w = world();
    let r = Stepper::new().get_trace(&mut w, &TraceRequest::new(1.0, &["A"]));
    assert!(matches!(r, Err(SimError::WorldNotBuilt)));
}

/* ---------------- shapes ---------------- */
#[test]
fn puck_rests_on_its_face() {
    let s = SceneDescription::new()
        .with_surface("table", table())
        .with_object("P", ObjectRecord::new(ShapeKind::Cylinder, &[0.4, 0.4, 0.1], 1.0, [2.0, 0.0, 0.3]));
    let mut w = world();
    let t = get_trace(&mut w, &s, &TraceRequest::new(2.0, &["P"])).unwrap();
    assert_abs_diff_eq!(z(&t, t.frames() - 1, 0), 0.05, epsilon = 0.01);
}

#[test]
fn ball_radius_is_first_dim() {
    let s = SceneDescription::new()
        .with_surface("table", table())
        .with_object("B", ObjectRecord::new(ShapeKind::Ball, &[0.3], 1.0, [2.0, 0.0, 0.5]).with_restitution(0.0));
    let mut w = world();
    let t = get_trace(&mut w, &s, &TraceRequest::new(2.0, &["B"])).unwrap();
    assert_abs_diff_eq!(z(&t, t.frames() - 1, 0), 0.3, epsilon = 0.01);
}

#[test]
fn trace_json_round_trip() {
    let mut w = world();
    let t = get_trace(&mut w, &drop_scene(), &TraceRequest::new(0.25, &["A", "table"])).unwrap();
    let back = Trace::from_json_str(&t.to_json_string(false).unwrap()).unwrap();
    assert_eq!(back, t);
    let v: serde_json::Value = serde_json::from_str(&t.to_json_string(false).unwrap()).unwrap();
    assert_eq!(v["fps"], 60);
    assert_eq!(v["time_step"], 240);
}
