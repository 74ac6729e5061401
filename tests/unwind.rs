//! Exception-safety accounting: a panic in user code (constructors, clones,
//! destructors) must leave the deque consistent, with every already-built
//! element dropped exactly once.

use holdfast::Deque;

use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};

#[test]
fn with_len_drops_built_elements_on_panic() {
    thread_local! {
        static CREATED: Cell<usize> = Cell::new(0);
        static LIVE: Cell<usize> = Cell::new(0);
    }

    struct Counted;

    impl Default for Counted {
        fn default() -> Self {
            CREATED.with(|c| c.set(c.get() + 1));
            if CREATED.with(|c| c.get()) == 17 {
                panic!("boom");
            }
            LIVE.with(|c| c.set(c.get() + 1));
            Counted
        }
    }

    impl Drop for Counted {
        fn drop(&mut self) {
            LIVE.with(|c| c.set(c.get() - 1));
        }
    }

    let result = catch_unwind(|| {
        let _ = Deque::<Counted>::with_len(100);
    });
    assert!(result.is_err());
    // Sixteen elements were built before the seventeenth constructor blew
    // up, and the unwind tore all of them back down.
    assert_eq!(CREATED.with(|c| c.get()), 17);
    assert_eq!(LIVE.with(|c| c.get()), 0);
}

#[test]
fn from_elem_drops_clones_on_panic() {
    thread_local! {
        static CLONES: Cell<usize> = Cell::new(0);
        static LIVE: Cell<usize> = Cell::new(0);
    }

    struct Counted;

    impl Counted {
        fn new() -> Self {
            LIVE.with(|c| c.set(c.get() + 1));
            Counted
        }
    }

    impl Clone for Counted {
        fn clone(&self) -> Self {
            CLONES.with(|c| c.set(c.get() + 1));
            if CLONES.with(|c| c.get()) == 5 {
                panic!("boom");
            }
            Self::new()
        }
    }

    impl Drop for Counted {
        fn drop(&mut self) {
            LIVE.with(|c| c.set(c.get() - 1));
        }
    }

    let result = catch_unwind(|| {
        let _ = Deque::from_elem(Counted::new(), 100);
    });
    assert!(result.is_err());
    // Four clones made it into the deque and the original was still owned
    // by the constructor; the unwind dropped all five.
    assert_eq!(CLONES.with(|c| c.get()), 5);
    assert_eq!(LIVE.with(|c| c.get()), 0);
}

#[test]
fn clone_from_keeps_destination_on_panic() {
    thread_local! {
        static CLONES: Cell<usize> = Cell::new(0);
    }

    #[derive(PartialEq, Debug)]
    struct Fragile(usize);

    impl Clone for Fragile {
        fn clone(&self) -> Self {
            CLONES.with(|c| c.set(c.get() + 1));
            if CLONES.with(|c| c.get()) == 3 {
                panic!("boom");
            }
            Fragile(self.0)
        }
    }

    let src: Deque<Fragile> = (0..10).map(Fragile).collect();
    let mut dst: Deque<Fragile> = (100..105).map(Fragile).collect();

    let result = catch_unwind(AssertUnwindSafe(|| {
        dst.clone_from(&src);
    }));
    assert!(result.is_err());

    // The replacement copy never finished, so the destination still holds
    // exactly what it held before.
    assert_eq!(dst.len(), 5);
    for (i, v) in dst.iter().enumerate() {
        assert_eq!(v.0, 100 + i);
    }
}

#[test]
fn extend_keeps_elements_pushed_before_panic() {
    let mut d: Deque<usize> = (0..4).collect();

    let result = catch_unwind(AssertUnwindSafe(|| {
        d.extend((0..10).map(|i| if i == 3 { panic!("boom") } else { 100 + i }));
    }));
    assert!(result.is_err());

    // Elements yielded before the panic made it in, and the deque is still
    // fully usable afterwards.
    assert_eq!(d.len(), 7);
    assert_eq!(d[3], 3);
    assert_eq!(d[4], 100);
    assert_eq!(d[6], 102);
    d.push_back(7);
    d.push_front(8);
    assert_eq!(d.len(), 9);
}

#[test]
fn clear_survives_a_panicking_destructor() {
    thread_local! {
        static DROPS: Cell<usize> = Cell::new(0);
    }

    struct Bomb(usize);

    impl Drop for Bomb {
        fn drop(&mut self) {
            DROPS.with(|c| c.set(c.get() + 1));
            if self.0 == 2 {
                panic!("boom");
            }
        }
    }

    let mut d: Deque<Bomb> = (0..6).map(Bomb).collect();
    let result = catch_unwind(AssertUnwindSafe(|| d.clear()));
    assert!(result.is_err());

    // The deque emptied itself before running any destructor, so nothing is
    // dropped a second time, and everything up to the bomb ran.
    assert!(d.is_empty());
    assert!(DROPS.with(|c| c.get()) >= 3);

    d.push_back(Bomb(100));
    assert_eq!(d.len(), 1);
}
