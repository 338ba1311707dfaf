use vial_motion_core::{
    ElementHandle, LayoutSnapshot, ParallaxCfg, ParallaxFieldComputer, Rect, Signal, TrackedPair,
};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn timeline_pairs() -> Vec<TrackedPair> {
    (0..4)
        .map(|i| TrackedPair::new(ElementHandle(10 + i), ElementHandle(20 + i)))
        .collect()
}

#[test]
fn timeline_fixture_field() -> anyhow::Result<()> {
    let layout: LayoutSnapshot = vial_test_fixtures::layouts::load("services-timeline")?;
    let mut px = ParallaxFieldComputer::new(timeline_pairs(), ParallaxCfg::default());
    let field = px.compute(&layout).clone();

    assert_eq!(field.near.len(), 4);
    assert_eq!(field.far.len(), 4);
    // row 0 sits 300 px above center, row 2 300 px below
    assert!(close(field.near[0], 36.0));
    assert!(close(field.far[0], 18.0));
    assert!(close(field.near[1], 2.4));
    assert!(close(field.far[1], 1.2));
    assert!(close(field.near[2], -36.0));
    assert!(close(field.far[2], -18.0));
    // row 3 is not attached
    assert_eq!(field.near[3], 0.0);
    assert_eq!(field.far[3], 0.0);
    assert_eq!(field.active_index, 1);
    Ok(())
}

#[test]
fn rows_move_faster_than_icons() -> anyhow::Result<()> {
    let layout: LayoutSnapshot = vial_test_fixtures::layouts::load("services-timeline")?;
    let mut px = ParallaxFieldComputer::new(timeline_pairs(), ParallaxCfg::default());
    let field = px.compute(&layout);
    for i in 0..3 {
        assert!(field.near[i].abs() > field.far[i].abs(), "pair {i}");
    }
    Ok(())
}

#[test]
fn reduced_motion_scales_displacement() -> anyhow::Result<()> {
    let layout: LayoutSnapshot = vial_test_fixtures::layouts::load("services-timeline")?;
    let mut px = ParallaxFieldComputer::new(timeline_pairs(), ParallaxCfg::default());
    px.set_reduced_motion(true);
    let field = px.compute(&layout);
    assert!(close(field.near[0], 9.0));
    assert!(close(field.far[0], 4.5));
    assert_eq!(field.active_index, 1, "active step ignores the motion factor");
    Ok(())
}

#[test]
fn tie_goes_to_the_earlier_pair() {
    let vh = 1000.0;
    // both rows are 10 px from center, one above and one below
    let layout = LayoutSnapshot::new(vh)
        .with_rect(ElementHandle(1), Rect::new(390.0, 200.0))
        .with_rect(ElementHandle(2), Rect::new(410.0, 200.0))
        .with_rect(ElementHandle(11), Rect::new(0.0, 50.0))
        .with_rect(ElementHandle(12), Rect::new(0.0, 50.0));
    let pairs = vec![
        TrackedPair::new(ElementHandle(2), ElementHandle(12)),
        TrackedPair::new(ElementHandle(1), ElementHandle(11)),
    ];
    let mut px = ParallaxFieldComputer::new(pairs, ParallaxCfg::default());
    assert_eq!(px.compute(&layout).active_index, 0);
}

#[test]
fn nothing_attached_falls_back_to_first_step() {
    let mut px = ParallaxFieldComputer::new(timeline_pairs(), ParallaxCfg::default());
    let field = px.compute(&LayoutSnapshot::new(800.0));
    assert_eq!(field.active_index, 0);
    assert!(field.near.iter().chain(field.far.iter()).all(|d| *d == 0.0));
    assert!(px.drain_signals().is_empty());
}

#[test]
fn active_step_change_is_signalled_once() {
    let mut layout = LayoutSnapshot::new(1000.0)
        .with_rect(ElementHandle(1), Rect::new(400.0, 200.0))
        .with_rect(ElementHandle(2), Rect::new(900.0, 200.0))
        .with_rect(ElementHandle(11), Rect::new(0.0, 10.0))
        .with_rect(ElementHandle(12), Rect::new(0.0, 10.0));
    let pairs = vec![
        TrackedPair::new(ElementHandle(1), ElementHandle(11)),
        TrackedPair::new(ElementHandle(2), ElementHandle(12)),
    ];
    let mut px = ParallaxFieldComputer::new(pairs, ParallaxCfg::default());
    px.compute(&layout);
    assert!(px.drain_signals().is_empty());

    // scroll so the second row reaches the center
    layout.set_rect(ElementHandle(1), Rect::new(-100.0, 200.0));
    layout.set_rect(ElementHandle(2), Rect::new(400.0, 200.0));
    px.compute(&layout);
    px.compute(&layout);
    assert_eq!(
        px.drain_signals(),
        vec![Signal::ActiveStepChanged { from: 0, to: 1 }]
    );
}

#[test]
fn empty_pair_list() {
    let mut px = ParallaxFieldComputer::new(Vec::new(), ParallaxCfg::default());
    assert!(px.is_empty());
    let field = px.compute(&LayoutSnapshot::new(800.0));
    assert!(field.near.is_empty());
    assert_eq!(field.active_index, 0);
}
