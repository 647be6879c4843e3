use super::*;

fn span(start: u64, end: u64) -> TimeRange {
    TimeRange::new(start, end).unwrap()
}

fn run(r: &mut Resampler, ends: &[u64]) -> Vec<Step> {
    let mut start = 0;
    ends.iter()
        .map(|&end| {
            let step = r.step(span(start, end)).unwrap();
            start = end;
            step
        })
        .collect()
}

fn emitted(steps: &[Step]) -> Vec<(u64, u64)> {
    steps
        .iter()
        .filter_map(|s| s.emit.map(|t| (t.start, t.end)))
        .collect()
}

#[test]
fn unlimited_rate_is_identity() {
    let mut r = Resampler::new(0, 0);
    let steps = run(&mut r, &[100, 250, 250, 300]);
    assert_eq!(
        emitted(&steps),
        vec![(0, 100), (100, 250), (250, 250), (250, 300)]
    );
    assert!(steps.iter().all(|s| !s.stop));
    assert_eq!(r.final_timestamp(), 300);
    assert_eq!((r.frames_in(), r.frames_out()), (4, 4));
}

#[test]
fn target_rate_drops_covered_frames() {
    let mut r = Resampler::new(10, 0);
    let steps = run(&mut r, &[40, 80, 120, 160, 200, 240]);
    assert_eq!(emitted(&steps), vec![(0, 100), (100, 200), (200, 300)]);
    assert_eq!(r.final_timestamp(), 300);
    assert_eq!((r.frames_in(), r.frames_out()), (6, 3));
}

#[test]
fn emitted_intervals_are_contiguous() {
    let mut r = Resampler::new(7, 0);
    let ends: Vec<u64> = (1..=40).map(|i| i * 33).collect();
    let out = emitted(&run(&mut r, &ends));
    assert_eq!(out[0].0, 0);
    for pair in out.windows(2) {
        assert_eq!(pair[0].1, pair[1].0);
    }
    assert!(out.iter().all(|(s, e)| (e - s) % 143 == 0));
}

#[test]
fn duration_cap_clips_and_stops() {
    let mut r = Resampler::new(0, 150);
    let steps = run(&mut r, &[100, 200]);
    assert_eq!(emitted(&steps), vec![(0, 100), (100, 150)]);
    assert!(!steps[0].stop);
    assert!(steps[1].stop);
    assert_eq!(r.final_timestamp(), 150);
}

#[test]
fn duration_cap_bounds_the_output_boundary() {
    let mut r = Resampler::new(10, 150);
    let steps = run(&mut r, &[40, 80, 120, 160]);
    assert_eq!(emitted(&steps), vec![(0, 100), (100, 150)]);
    assert!(steps[3].stop);
    assert_eq!(r.final_timestamp(), 150);
}

#[test]
fn frame_starting_at_the_cap_is_not_emitted() {
    let mut r = Resampler::new(0, 100);
    let steps = run(&mut r, &[100, 150]);
    assert_eq!(emitted(&steps), vec![(0, 100)]);
    assert!(steps[1].stop);
}

#[test]
fn zero_length_frames_never_move_the_boundary_back() {
    let mut r = Resampler::new(3, 0);
    let steps = run(&mut r, &[100, 100, 100]);
    assert_eq!(emitted(&steps), vec![(0, 333), (333, 333), (333, 333)]);
    assert_eq!(r.final_timestamp(), 333);
}

#[test]
fn non_contiguous_source_is_rejected() {
    let mut r = Resampler::new(0, 0);
    r.step(span(0, 100)).unwrap();
    let err = r.step(span(150, 200)).unwrap_err();
    assert!(matches!(err, AnimError::Decode(_)));
}

#[test]
fn very_high_rates_keep_a_one_millisecond_period() {
    let mut r = Resampler::new(5000, 0);
    assert_eq!(emitted(&run(&mut r, &[10, 20])), vec![(0, 10), (10, 20)]);
}
