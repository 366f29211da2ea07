use super::{err, sample_record_without_data, TestResult};
use crate::{sync_project, MemoryStore, Store};
use time::macros::datetime;

pub(super) fn run_sync_tests<S, F>(factory: &F) -> Vec<TestResult>
where
    S: Store,
    F: Fn() -> S,
{
    vec![
        TestResult::from_result(
            "sync",
            "sync_into_backend_copies_all_labels",
            sync_into_backend_copies_all_labels(&factory()),
        ),
        TestResult::from_result(
            "sync",
            "sync_out_of_backend_copies_all_labels",
            sync_out_of_backend_copies_all_labels(&factory()),
        ),
        TestResult::from_result(
            "sync",
            "repeated_sync_is_idempotent",
            repeated_sync_is_idempotent(&factory()),
        ),
    ]
}

fn seeded_memory_store() -> Result<MemoryStore, String> {
    let source = MemoryStore::new();
    source
        .save(
            "proj1",
            &sample_record_without_data("run001", datetime!(2024-02-01 09:00:00)),
        )
        .map_err(err("seed"))?;
    source
        .save(
            "proj1",
            &sample_record_without_data("run002", datetime!(2024-02-02 09:00:00)),
        )
        .map_err(err("seed"))?;
    Ok(source)
}

fn same_records(a: &dyn Store, b: &dyn Store, labels: &[&str]) -> Result<(), String> {
    for label in labels {
        let left = a.get("proj1", label).map_err(err("get from source"))?;
        let right = b.get("proj1", label).map_err(err("get from target"))?;
        if left != right {
            return Err(format!("record {} differs after sync", label));
        }
    }
    Ok(())
}

fn sync_into_backend_copies_all_labels(s: &dyn Store) -> Result<(), String> {
    let source = seeded_memory_store()?;
    s.sync(&source, "proj1").map_err(err("sync"))?;
    same_records(&source, s, &["run001", "run002"])
}

fn sync_out_of_backend_copies_all_labels(s: &dyn Store) -> Result<(), String> {
    let seed = seeded_memory_store()?;
    s.sync(&seed, "proj1").map_err(err("seed sync"))?;
    let target = MemoryStore::new();
    sync_project(s, &target, "proj1").map_err(err("sync"))?;
    same_records(s, &target, &["run001", "run002"])
}

fn repeated_sync_is_idempotent(s: &dyn Store) -> Result<(), String> {
    let source = seeded_memory_store()?;
    s.sync(&source, "proj1").map_err(err("first sync"))?;
    s.sync(&source, "proj1").map_err(err("second sync"))?;
    let mut labels = s.labels("proj1", &[]).map_err(err("labels"))?;
    labels.sort();
    if labels != vec!["run001".to_string(), "run002".to_string()] {
        return Err(format!("expected two labels after two syncs, got {:?}", labels));
    }
    same_records(&source, s, &["run001", "run002"])
}
