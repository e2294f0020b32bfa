use super::helpers::*;
use crate::acquire::open_inputs;
use crate::aggregate::aggregate;
use crate::*;

#[test]
fn factors_are_count_over_total() {
    let store = MemoryStore::new();
    store.insert("a.mem", MemFile::counted(100, 0, &[]));
    store.insert("b.mem", MemFile::counted(300, 0, &[]));

    let (opened, unopened) = open_inputs(&store, &["a.mem", "b.mem"]);
    let aggregation = aggregate(opened, unopened).ok().unwrap();

    assert_eq!(aggregation.total, 400);
    let factors: Vec<f64> = aggregation.inputs.iter().map(|i| i.factor).collect();
    assert_eq!(factors, vec![0.25, 0.75]);
    let counts: Vec<u64> = aggregation.inputs.iter().map(|i| i.count).collect();
    assert_eq!(counts, vec![100, 300]);
}

#[test]
fn missing_or_malformed_counts_count_as_zero() {
    let store = MemoryStore::new();
    store.insert("good.mem", MemFile::counted(10, 0, &[]));
    store.insert("none.mem", MemFile::default());

    let mut short = MemFile::default();
    short.blobs.push((COUNT_KEY.into(), Ok(vec![1, 2, 3])));
    store.insert("short.mem", short);

    let mut unreadable = MemFile::default();
    unreadable
        .blobs
        .push((COUNT_KEY.into(), Err("checksum mismatch".to_string())));
    store.insert("unreadable.mem", unreadable);

    let paths = ["good.mem", "none.mem", "short.mem", "unreadable.mem"];
    let (opened, unopened) = open_inputs(&store, &paths);
    let aggregation = aggregate(opened, unopened).ok().unwrap();

    assert_eq!(aggregation.total, 10);
    let factors: Vec<f64> = aggregation.inputs.iter().map(|i| i.factor).collect();
    assert_eq!(factors, vec![1.0, 0.0, 0.0, 0.0]);
}

#[test]
fn zero_total_releases_every_input() {
    let store = MemoryStore::new();
    store.insert("a.mem", MemFile::counted(0, 0, &[1.0]));
    store.insert("b.mem", MemFile::default());

    let (opened, unopened) = open_inputs(&store, &["a.mem", "b.mem", "gone.mem"]);
    let err = aggregate(opened, unopened).err().unwrap();

    assert!(matches!(
        err,
        MergeError::ZeroTotalCount {
            opened: 2,
            unopened: 1
        }
    ));
    assert_eq!(err.status_code(), -11);
    assert_eq!(store.count_events("release a.mem"), 1);
    assert_eq!(store.count_events("release b.mem"), 1);
}

#[test]
fn overflowing_total_is_an_error() {
    let store = MemoryStore::new();
    store.insert("a.mem", MemFile::counted(u64::MAX, 0, &[]));
    store.insert("b.mem", MemFile::counted(1, 0, &[]));

    let (opened, unopened) = open_inputs(&store, &["a.mem", "b.mem"]);
    let err = aggregate(opened, unopened).err().unwrap();

    assert!(matches!(err, MergeError::CountOverflow));
    assert_eq!(err.status_code(), -5);
    assert_eq!(store.count_events("release a.mem"), 1);
    assert_eq!(store.count_events("release b.mem"), 1);
}

#[test]
fn largest_representable_total_is_fine() {
    let store = MemoryStore::new();
    store.insert("a.mem", MemFile::counted(u64::MAX - 1, 0, &[]));
    store.insert("b.mem", MemFile::counted(1, 0, &[]));

    let (opened, unopened) = open_inputs(&store, &["a.mem", "b.mem"]);
    let aggregation = aggregate(opened, unopened).ok().unwrap();
    assert_eq!(aggregation.total, u64::MAX);
}
