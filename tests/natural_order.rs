//! Natural ordering tests.

use std::cmp::Ordering;
use std::path::PathBuf;

use facereel::natural::{natural_cmp, sort_paths};

#[test]
fn numbers_compare_by_value() {
    assert_eq!(natural_cmp("f_2.png", "f_10.png"), Ordering::Less);
    assert_eq!(natural_cmp("f_10.png", "f_9.png"), Ordering::Greater);
    assert_eq!(natural_cmp("f_10.png", "f_10.png"), Ordering::Equal);
}

#[test]
fn text_compares_by_character() {
    assert_eq!(natural_cmp("a_1.png", "b_0.png"), Ordering::Less);
    assert_eq!(natural_cmp("clip", "clip_0"), Ordering::Less);
}

#[test]
fn leading_zeros_break_ties_only() {
    assert_eq!(natural_cmp("v_007", "v_7"), "v_007".cmp("v_7"));
    assert_eq!(natural_cmp("v_007", "v_8"), Ordering::Less);
}

#[test]
fn long_digit_runs_do_not_overflow() {
    let big = "x_123456789012345678901234567890";
    let bigger = "x_123456789012345678901234567891";
    assert_eq!(natural_cmp(big, bigger), Ordering::Less);
}

#[test]
fn frame_sequence_sorts_in_playback_order() {
    let mut names: Vec<String> = (0..25).rev().map(|i| format!("clip_{i}.png")).collect();
    names.sort_by(|a, b| natural_cmp(a, b));
    let expected: Vec<String> = (0..25).map(|i| format!("clip_{i}.png")).collect();
    assert_eq!(names, expected);
}

#[test]
fn paths_sort_by_file_name() {
    let mut paths = vec![
        PathBuf::from("/z/v_10.png"),
        PathBuf::from("/a/v_2.png"),
        PathBuf::from("/m/v_1.png"),
    ];
    sort_paths(&mut paths);
    assert_eq!(
        paths,
        vec![
            PathBuf::from("/m/v_1.png"),
            PathBuf::from("/a/v_2.png"),
            PathBuf::from("/z/v_10.png"),
        ]
    );
}
