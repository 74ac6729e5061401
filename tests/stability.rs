//! The headline guarantee: once an element has been pushed, it never moves,
//! no matter how much the ends churn or how large the deque grows.

use holdfast::Deque;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use std::ptr;

#[test]
fn addresses_survive_growth_at_the_back() {
    let mut d: Deque<usize> = (0..100).collect();
    let before: Vec<*const usize> = d.iter().map(|v| v as *const usize).collect();

    // Push enough to force the handle table to regrow several times.
    for i in 100..50_000 {
        d.push_back(i);
    }

    for (i, &p) in before.iter().enumerate() {
        assert!(ptr::eq(p, &d[i]));
        assert_eq!(d[i], i);
    }
}

#[test]
fn addresses_survive_growth_at_the_front() {
    let mut d: Deque<usize> = (0..100).collect();
    let before: Vec<*const usize> = d.iter().map(|v| v as *const usize).collect();

    for i in 0..50_000 {
        d.push_front(i);
    }

    // The original elements now live 50_000 positions further in.
    for (i, &p) in before.iter().enumerate() {
        assert!(ptr::eq(p, &d[50_000 + i]));
        assert_eq!(d[50_000 + i], i);
    }
}

#[test]
fn addresses_survive_pops_at_both_ends() {
    let mut d: Deque<usize> = (0..10_000).collect();
    let keep: Vec<*const usize> = (4_000..6_000).map(|i| &d[i] as *const usize).collect();

    for _ in 0..4_000 {
        d.pop_front();
        d.pop_back();
    }
    assert_eq!(d.len(), 2_000);

    for (i, &p) in keep.iter().enumerate() {
        assert!(ptr::eq(p, &d[i]));
        assert_eq!(d[i], 4_000 + i);
    }
}

#[test]
fn addresses_survive_a_shrink_then_regrow_cycle() {
    let mut d: Deque<u64> = (0..10_000).map(|i| i * i).collect();

    // Shrink to a small core...
    while d.len() > 20 {
        d.pop_front();
        d.pop_back();
    }
    let core: Vec<(u64, *const u64)> = d.iter().map(|v| (*v, v as *const u64)).collect();

    // ...then balloon both ends back out.
    for i in 0..5_500 {
        d.push_back(i);
        d.push_front(i);
    }

    for (i, &(value, p)) in core.iter().enumerate() {
        assert!(ptr::eq(p, &d[5_500 + i]));
        assert_eq!(d[5_500 + i], value);
    }
}

#[test]
fn interior_edits_leave_the_far_side_alone() {
    // Edits nearer the back shift only the back; the front keeps both its
    // addresses and its indices.
    let mut d: Deque<usize> = (0..1_000).collect();
    let front: Vec<*const usize> = (0..400).map(|i| &d[i] as *const usize).collect();

    d.insert(900, 9_999);
    d.remove(950);
    d.insert(800, 8_888);
    d.remove(800);

    for (i, &p) in front.iter().enumerate() {
        assert!(ptr::eq(p, &d[i]));
        assert_eq!(d[i], i);
    }

    // And mirrored: edits nearer the front leave the back in place. The
    // indices of the watched elements shift by one per edit, but the
    // addresses never change.
    let mut d: Deque<usize> = (0..1_000).collect();
    let back: Vec<*const usize> = (600..1_000).map(|i| &d[i] as *const usize).collect();

    d.insert(100, 7_777);
    for (i, &p) in back.iter().enumerate() {
        assert!(ptr::eq(p, &d[601 + i]));
    }

    d.remove(50);
    for (i, &p) in back.iter().enumerate() {
        assert!(ptr::eq(p, &d[600 + i]));
        assert_eq!(d[600 + i], 600 + i);
    }
}

#[test]
fn swap_driven_shuffle_then_partial_sort() {
    let mut d: Deque<u32> = Deque::from_elem(3, 1_000);
    assert!(d.iter().all(|&v| v == 3));

    for (i, v) in d.iter_mut().enumerate() {
        *v = 13 + i as u32;
    }
    assert_eq!(d.front(), Some(&13));
    assert_eq!(d.back(), Some(&1_012));

    // Fisher-Yates, entirely through Deque::swap.
    let mut rng = SmallRng::seed_from_u64(0x5eed);
    for i in (1..d.len()).rev() {
        let j = rng.gen_range(0..=i);
        d.swap(i, j);
    }

    // Park the maximum in the back half so the final check is
    // deterministic regardless of how the shuffle landed.
    let max_at = d.iter().position(|&v| v == 1_012).unwrap();
    if max_at < 500 {
        d.swap(max_at, 750);
    }

    // Sort the back half in descending order, then reverse the whole
    // deque. The values are distinct, so the result must open with a run
    // of exactly 500 ascending values.
    let mut tail: Vec<u32> = d.iter().skip(500).copied().collect();
    tail.sort_unstable_by(|a, b| b.cmp(a));
    for (slot, v) in d.iter_mut().skip(500).zip(tail) {
        *slot = v;
    }
    d.reverse();

    let run = d
        .iter()
        .zip(d.iter().skip(1))
        .take_while(|(a, b)| a <= b)
        .count()
        + 1;
    assert_eq!(run, 500);
}
