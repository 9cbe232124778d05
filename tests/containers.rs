//! End-to-end scenarios driving both containers through records that carry
//! caller-owned resources, released through the free capability.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use recset::{BucketSet, CompareFn, FreeFn, HashFn, RecordVec};

/// Caller-side table of heap resources. Records store a handle (an index
/// into this table); the free capability clears the slot the handle names.
#[derive(Default)]
struct NameTable {
    slots: Vec<Option<String>>,
}

impl NameTable {
    fn intern(&mut self, name: &str) -> u32 {
        self.slots.push(Some(name.to_owned()));
        (self.slots.len() - 1) as u32
    }

    fn live(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

// Record layout: id (u32 le) followed by a NameTable handle (u32 le).
const RECORD_LEN: usize = 8;

fn record(id: u32, handle: u32) -> [u8; RECORD_LEN] {
    let mut bytes = [0u8; RECORD_LEN];
    bytes[..4].copy_from_slice(&id.to_le_bytes());
    bytes[4..].copy_from_slice(&handle.to_le_bytes());
    bytes
}

fn record_id(bytes: &[u8]) -> u32 {
    u32::from_le_bytes(bytes[..4].try_into().unwrap())
}

fn record_handle(bytes: &[u8]) -> u32 {
    u32::from_le_bytes(bytes[4..].try_into().unwrap())
}

fn releasing_free(table: &Rc<RefCell<NameTable>>) -> FreeFn {
    let table = Rc::clone(table);
    Rc::new(move |bytes: &mut [u8]| {
        let handle = record_handle(bytes) as usize;
        table.borrow_mut().slots[handle] = None;
    })
}

fn id_hash() -> HashFn {
    Rc::new(|bytes: &[u8], buckets: usize| record_id(bytes) as usize % buckets)
}

fn id_cmp() -> CompareFn {
    Rc::new(|a: &[u8], b: &[u8]| record_id(a).cmp(&record_id(b)))
}

#[test]
fn set_releases_replaced_and_surviving_resources() {
    let table = Rc::new(RefCell::new(NameTable::default()));
    let mut set = BucketSet::new(
        RECORD_LEN,
        3,
        id_hash(),
        id_cmp(),
        Some(releasing_free(&table)),
    );

    for (id, name) in [(1u32, "alpha"), (2, "beta"), (3, "gamma"), (4, "delta")] {
        let handle = table.borrow_mut().intern(name);
        set.insert(&record(id, handle));
    }
    assert_eq!(set.len(), 4);
    assert_eq!(table.borrow().live(), 4);

    // Re-inserting id 2 releases "beta" and stores the new handle.
    let replacement = table.borrow_mut().intern("beta-v2");
    set.insert(&record(2, replacement));
    assert_eq!(set.len(), 4);
    assert_eq!(table.borrow().live(), 4);
    assert_eq!(table.borrow().slots[1], None);

    let stored = set.lookup(&record(2, 0)).expect("id 2 present");
    let handle = record_handle(stored) as usize;
    assert_eq!(table.borrow().slots[handle].as_deref(), Some("beta-v2"));

    drop(set);
    assert_eq!(table.borrow().live(), 0);
}

#[test]
fn vec_releases_resources_on_remove_and_drop() {
    let table = Rc::new(RefCell::new(NameTable::default()));
    let mut vec = RecordVec::new(RECORD_LEN, 0, Some(releasing_free(&table)));

    for (id, name) in [(10u32, "one"), (20, "two"), (30, "three")] {
        let handle = table.borrow_mut().intern(name);
        vec.push(&record(id, handle));
    }
    assert_eq!(table.borrow().live(), 3);

    vec.remove(1);
    assert_eq!(vec.len(), 2);
    assert_eq!(table.borrow().live(), 2);
    assert_eq!(table.borrow().slots[1], None);

    drop(vec);
    assert_eq!(table.borrow().live(), 0);
}

#[test]
fn growth_cadence_matches_documented_example() {
    // Element size 4, initial capacity 4: four appends keep capacity 4, the
    // fifth doubles it to 8.
    let mut vec = RecordVec::new(4, 4, None);
    for x in [1u32, 2, 3, 4] {
        vec.push(&x.to_le_bytes());
    }
    assert_eq!(vec.capacity(), 4);
    assert_eq!(vec.len(), 4);
    vec.push(&5u32.to_le_bytes());
    assert_eq!(vec.capacity(), 8);
    assert_eq!(vec.len(), 5);
    assert_eq!(vec.get(4), 5u32.to_le_bytes());
}

#[test]
fn set_count_tracks_distinct_ids_across_heavy_reuse() {
    let mut set = BucketSet::new(RECORD_LEN, 5, id_hash(), id_cmp(), None);
    for round in 0u32..10 {
        for id in 0u32..25 {
            set.insert(&record(id, round));
        }
    }
    assert_eq!(set.len(), 25);
    for id in 0u32..25 {
        let stored = set.lookup(&record(id, 0)).expect("id present");
        assert_eq!(record_handle(stored), 9, "value is the last one inserted");
    }
    assert_eq!(set.lookup(&record(25, 0)), None);
}

#[test]
fn vec_start_offset_scopes_search_to_the_tail() {
    // A sorted prefix plus an unsorted tail: full-range linear search still
    // finds prefix records, and a start offset confines the scan to the
    // records appended after the sort.
    let cmp = |a: &[u8], b: &[u8]| -> Ordering { record_id(a).cmp(&record_id(b)) };
    let mut vec = RecordVec::new(RECORD_LEN, 0, None);
    for id in [40u32, 10, 30, 20] {
        vec.push(&record(id, 0));
    }
    vec.sort_by(cmp);
    for id in [99u32, 7] {
        vec.push(&record(id, 0));
    }

    let sorted_hit = vec.search(&record(30, 0), cmp, 0, false).unwrap();
    assert_eq!(record_id(vec.get(sorted_hit)), 30);
    assert_eq!(vec.search(&record(7, 0), cmp, 4, false), Some(5));
    assert_eq!(vec.search(&record(30, 0), cmp, 4, false), None);
}
