use crate::dispatch::{Stat, StatWindow, WINDOW_SIZE};

#[test]
fn empty_window_averages_to_zero() {
    let window = StatWindow::new();

    assert_eq!(window.snapshot(), Stat::default());
    assert_eq!(window.appended(), 0);
}

#[test]
fn partial_window_divides_by_full_size() {
    // Arrange
    let mut window = StatWindow::new();

    // Act
    window.append(Stat::new(10.0, 100.0));
    window.append(Stat::new(20.0, 200.0));

    // Assert: (10 + 20) / 5, not / 2
    assert_eq!(window.snapshot(), Stat::new(6.0, 60.0));
}

#[test]
fn full_window_is_plain_average() {
    let mut window = StatWindow::new();

    for i in 1..=WINDOW_SIZE {
        window.append(Stat::new(i as f64, (i * 10) as f64));
    }

    // (1 + 2 + 3 + 4 + 5) / 5 = 3
    assert_eq!(window.snapshot(), Stat::new(3.0, 30.0));
}

#[test]
fn overflow_keeps_only_most_recent_samples() {
    // Arrange
    let mut window = StatWindow::new();

    // Act: 1..=7, so 1 and 2 are evicted
    for i in 1..=7 {
        window.append(Stat::new(i as f64, 0.0));
    }

    // Assert: (3 + 4 + 5 + 6 + 7) / 5 = 5
    assert_eq!(window.snapshot(), Stat::new(5.0, 0.0));
    assert_eq!(window.appended(), 7);
}

#[test]
fn running_sum_tracks_many_wraps() {
    let mut window = StatWindow::new();

    for i in 0..1_000u32 {
        window.append(Stat::new((i % 7) as f64, (i % 11) as f64));
    }

    let expected_connections: f64 = (995..1_000u32).map(|i| (i % 7) as f64).sum::<f64>() / 5.0;
    let expected_bandwidth: f64 = (995..1_000u32).map(|i| (i % 11) as f64).sum::<f64>() / 5.0;

    let snapshot = window.snapshot();
    assert!((snapshot.spare_connections - expected_connections).abs() < 1e-9);
    assert!((snapshot.spare_bandwidth_bytes - expected_bandwidth).abs() < 1e-9);
}

#[test]
fn snapshot_does_not_alias_running_sum() {
    let mut window = StatWindow::new();
    window.append(Stat::new(5.0, 5.0));

    let before = window.snapshot();
    window.append(Stat::new(5.0, 5.0));

    assert_eq!(before, Stat::new(1.0, 1.0));
    assert_eq!(window.snapshot(), Stat::new(2.0, 2.0));
}
