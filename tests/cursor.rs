// Cursor behavior across table mutations.
//
// Invariants exercised:
// - A full walk from begin() to end() visits every entry once.
// - Growth, resize, clear, clean, and swap all invalidate outstanding
//   cursors, which then report `CursorError::Stale`.
// - Removing an entry invalidates only cursors on that entry.
// - A cursor taken from a table of another size reports `Stale`.
use kmap::{CursorError, KMap};
use std::collections::BTreeSet;

#[test]
fn walk_visits_every_entry() {
    let mut m: KMap<u32, u32> = KMap::new();
    for k in 0..1_000 {
        m.insert(k, k * 2);
    }
    let mut seen = BTreeSet::new();
    let mut c = m.begin();
    while c != m.end() {
        let (k, v) = m.cursor_entry(&c).expect("live cursor");
        assert_eq!(*v, k * 2);
        assert!(seen.insert(*k));
        m.advance(&mut c).expect("advance");
    }
    assert_eq!(seen.len(), 1_000);
}

#[test]
fn end_cursor_cannot_be_read() {
    let mut m: KMap<u32, u32> = KMap::new();
    m.insert(1, 1);
    let end = m.end();
    assert_eq!(end.bucket(), m.bucket_capacity());
    assert_eq!(m.cursor_key(&end), Err(CursorError::End));
    assert_eq!(m.cursor_value(&end), Err(CursorError::End));
    assert_eq!(m.cursor_value_mut(&end), Err(CursorError::End));
}

#[test]
fn growth_makes_cursors_stale() {
    let mut m: KMap<u32, u32> = KMap::new();
    for k in 0..128 {
        m.insert(k, k);
    }
    let c = m.cursor_at(&5).expect("present");
    assert_eq!(m.cursor_value(&c), Ok(&5));

    // One more key crosses the threshold and rehashes.
    m.insert(1_000, 0);
    assert_eq!(m.cursor_value(&c), Err(CursorError::Stale));
    let mut c2 = c.clone();
    assert_eq!(m.advance(&mut c2), Err(CursorError::Stale));

    // A fresh cursor for the same key works again.
    let c3 = m.cursor_at(&5).expect("present");
    assert_eq!(m.cursor_value(&c3), Ok(&5));
}

#[test]
fn structural_operations_make_cursors_stale() {
    let mut m: KMap<u32, u32> = KMap::new();
    m.insert(1, 1);

    let c = m.begin();
    m.resize(10_000);
    assert_eq!(m.cursor_key(&c), Err(CursorError::Stale));

    let c = m.begin();
    m.clean();
    assert_eq!(m.cursor_key(&c), Err(CursorError::Stale));

    m.insert(1, 1);
    let c = m.begin();
    m.clear();
    assert_eq!(m.cursor_key(&c), Err(CursorError::Stale));

    m.insert(1, 1);
    let mut other: KMap<u32, u32> = KMap::new();
    other.insert(1, 1);
    let c = m.begin();
    let d = other.begin();
    m.swap(&mut other);
    assert_eq!(m.cursor_key(&c), Err(CursorError::Stale));
    assert_eq!(m.cursor_key(&d), Err(CursorError::Stale));
    assert_eq!(other.cursor_key(&c), Err(CursorError::Stale));
}

#[test]
fn removal_only_affects_its_own_cursor() {
    let mut m: KMap<u32, u32> = KMap::new();
    for k in 0..50 {
        m.insert(k, k);
    }
    let a = m.cursor_at(&10).unwrap();
    let b = m.cursor_at(&20).unwrap();
    m.remove(&10);
    assert_eq!(m.cursor_value(&a), Err(CursorError::Vacant));
    assert_eq!(m.cursor_value(&b), Ok(&20));
    assert_eq!(m.set_cursor_value(&b, 21), Ok(20));
    assert_eq!(m.find(&20), Some(&21));
}

#[test]
fn error_messages_name_the_problem() {
    assert!(CursorError::End.to_string().contains("end"));
    assert!(CursorError::Stale.to_string().contains("restructured"));
    assert!(CursorError::Vacant.to_string().contains("no longer"));
}

#[test]
fn cursor_from_another_table_is_stale() {
    let mut big: KMap<u32, u32> = KMap::with_capacity(6_400);
    assert_eq!(big.bucket_capacity(), 100);
    for k in 0..1_000 {
        big.insert(k, k);
    }
    let k = (0..1_000)
        .find(|k| big.bucket_index(k) >= 2)
        .expect("some key lands past the second bucket");
    let c = big.cursor_at(&k).expect("present");
    assert!(c.bucket() >= 2);

    let mut small: KMap<u32, u32> = KMap::new();
    small.insert(k, 7);
    assert_eq!(small.cursor_key(&c), Err(CursorError::Stale));
    assert_eq!(small.cursor_value(&c), Err(CursorError::Stale));
    assert_eq!(small.cursor_value_mut(&c), Err(CursorError::Stale));
    assert_eq!(small.set_cursor_value(&c, 0), Err(CursorError::Stale));
    let mut c2 = c.clone();
    assert_eq!(small.advance(&mut c2), Err(CursorError::Stale));
    assert_eq!(small.cursor_key(&big.end()), Err(CursorError::Stale));
    assert_eq!(small.find(&k), Some(&7));
}
