//! Integration tests: alignment detection and snapping over whole scenes.

use vs_core::geometry::{detect_alignment, snap_offset_from_guides};
use vs_core::{Alignment, Axis, Bounds, ObjectId};

fn lines(guides: &[vs_core::AlignmentGuide]) -> Vec<(Axis, Alignment)> {
    guides.iter().map(|g| (g.axis, g.alignment)).collect()
}

#[test]
fn detection_is_symmetric() {
    let a = (ObjectId::intern("align_a"), Bounds::new(9.7, 40.0, 20.0, 20.0));
    let b = (ObjectId::intern("align_b"), Bounds::new(10.0, 0.0, 20.0, 20.0));

    let a_moving = detect_alignment(&a.1, &[b], 5.0);
    let b_moving = detect_alignment(&b.1, &[a], 5.0);

    assert_eq!(lines(&a_moving), lines(&b_moving));
    for (ga, gb) in a_moving.iter().zip(&b_moving) {
        assert!((ga.position - gb.position).abs() < 5.0);
        assert_eq!(ga.targets.as_slice(), &[b.0]);
        assert_eq!(gb.targets.as_slice(), &[a.0]);
    }
}

#[test]
fn exact_coincidence_reports_the_same_position() {
    let a = (ObjectId::intern("align_exact_a"), Bounds::new(0.0, 0.0, 10.0, 10.0));
    let b = (ObjectId::intern("align_exact_b"), Bounds::new(0.0, 50.0, 10.0, 10.0));
    let forward = detect_alignment(&a.1, &[b], 5.0);
    let backward = detect_alignment(&b.1, &[a], 5.0);
    let positions = |g: &[vs_core::AlignmentGuide]| g.iter().map(|g| g.position).collect::<Vec<_>>();
    assert_eq!(positions(&forward), positions(&backward));
    assert_eq!(positions(&forward), vec![0.0, 5.0, 10.0]);
}

#[test]
fn scenario_left_edge_snaps_to_neighbour() {
    let other = (ObjectId::intern("align_other"), Bounds::new(10.0, 200.0, 20.0, 20.0));
    let moving = Bounds::new(9.7, 10.0, 20.0, 20.0);

    let guides = detect_alignment(&moving, &[other], 5.0);
    let first = &guides[0];
    assert_eq!(first.axis, Axis::Vertical);
    assert_eq!(first.alignment, Alignment::Left);
    assert_eq!(first.position, 10.0);

    let (dx, dy) = snap_offset_from_guides(&moving, &guides);
    assert!((moving.x + dx - 10.0).abs() < 1e-9);
    assert_eq!(dy, 0.0);
}

#[test]
fn guides_from_many_objects_merge() {
    let moving = Bounds::new(0.0, 0.0, 10.0, 10.0);
    let others = [
        (ObjectId::intern("align_m1"), Bounds::new(0.5, 100.0, 30.0, 30.0)),
        (ObjectId::intern("align_m2"), Bounds::new(0.2, 200.0, 40.0, 40.0)),
    ];
    let guides = detect_alignment(&moving, &others, 2.0);
    let left = guides
        .iter()
        .find(|g| g.alignment == Alignment::Left)
        .expect("left guide");
    assert_eq!(left.position, 0.5);
    assert_eq!(left.targets.as_slice(), &[others[0].0, others[1].0]);
}
