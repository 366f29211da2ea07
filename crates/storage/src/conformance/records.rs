use super::{err, sample_record_without_data, TestResult};
use crate::{Outcome, Store, StoreError};
use time::macros::datetime;

pub(super) fn run_record_tests<S, F>(factory: &F) -> Vec<TestResult>
where
    S: Store,
    F: Fn() -> S,
{
    vec![
        TestResult::from_result(
            "records",
            "save_then_get_round_trips",
            save_then_get_round_trips(&factory()),
        ),
        TestResult::from_result(
            "records",
            "get_absent_label_is_not_found",
            get_absent_label_is_not_found(&factory()),
        ),
        TestResult::from_result(
            "records",
            "resave_overwrites_in_place",
            resave_overwrites_in_place(&factory()),
        ),
        TestResult::from_result(
            "records",
            "list_filters_by_tags",
            list_filters_by_tags(&factory()),
        ),
        TestResult::from_result(
            "records",
            "labels_match_list",
            labels_match_list(&factory()),
        ),
        TestResult::from_result(
            "records",
            "most_recent_uses_timestamp",
            most_recent_uses_timestamp(&factory()),
        ),
        TestResult::from_result(
            "records",
            "delete_removes_or_keeps_intact",
            delete_removes_or_keeps_intact(&factory()),
        ),
        TestResult::from_result(
            "records",
            "delete_by_tag_counts_or_keeps_intact",
            delete_by_tag_counts_or_keeps_intact(&factory()),
        ),
    ]
}

fn save_then_get_round_trips(s: &dyn Store) -> Result<(), String> {
    let record = sample_record_without_data("run001", datetime!(2024-02-01 09:00:00));
    s.save("proj1", &record).map_err(err("save"))?;
    let back = s.get("proj1", "run001").map_err(err("get"))?;
    if back != record {
        return Err(format!(
            "round trip changed the record:\n saved: {:?}\n   got: {:?}",
            record, back
        ));
    }
    Ok(())
}

fn get_absent_label_is_not_found(s: &dyn Store) -> Result<(), String> {
    let record = sample_record_without_data("run001", datetime!(2024-02-01 09:00:00));
    s.save("proj1", &record).map_err(err("save"))?;
    match s.get("proj1", "missing") {
        Err(StoreError::NotFound { .. }) => Ok(()),
        Err(e) => Err(format!("expected NotFound, got error {}", e)),
        Ok(r) => Err(format!("expected NotFound, got record {}", r.label)),
    }
}

fn resave_overwrites_in_place(s: &dyn Store) -> Result<(), String> {
    let mut record = sample_record_without_data("run001", datetime!(2024-02-01 09:00:00));
    s.save("proj1", &record).map_err(err("save"))?;
    record.outcome = "diverged".to_string();
    record.diff = "--- a\n+++ b\n".to_string();
    s.save("proj1", &record).map_err(err("second save"))?;

    let labels = s.labels("proj1", &[]).map_err(err("labels"))?;
    if labels != vec!["run001".to_string()] {
        return Err(format!("expected a single label after re-save, got {:?}", labels));
    }
    let back = s.get("proj1", "run001").map_err(err("get"))?;
    if back.outcome != "diverged" || back.diff != "--- a\n+++ b\n" {
        return Err(format!("re-save not applied: outcome={:?}", back.outcome));
    }
    Ok(())
}

fn list_filters_by_tags(s: &dyn Store) -> Result<(), String> {
    let ts = datetime!(2024-02-01 09:00:00);
    let mut a = sample_record_without_data("a", ts);
    a.tags = ["red".to_string()].into();
    let mut b = sample_record_without_data("b", ts);
    b.tags = ["blue".to_string()].into();
    let mut c = sample_record_without_data("c", ts);
    c.tags = Default::default();
    for r in [&a, &b, &c] {
        s.save("proj1", r).map_err(err("save"))?;
    }

    let all = s.list("proj1", &[]).map_err(err("list"))?;
    if all.len() != 3 {
        return Err(format!("expected 3 records, got {}", all.len()));
    }
    let mut red_or_blue: Vec<String> = s
        .list("proj1", &["red".to_string(), "blue".to_string()])
        .map_err(err("list tagged"))?
        .into_iter()
        .map(|r| r.label)
        .collect();
    red_or_blue.sort();
    if red_or_blue != vec!["a".to_string(), "b".to_string()] {
        return Err(format!("tag filter returned {:?}", red_or_blue));
    }
    Ok(())
}

fn labels_match_list(s: &dyn Store) -> Result<(), String> {
    let ts = datetime!(2024-02-01 09:00:00);
    for label in ["x1", "x2", "x3"] {
        s.save("proj1", &sample_record_without_data(label, ts))
            .map_err(err("save"))?;
    }
    let mut labels = s.labels("proj1", &[]).map_err(err("labels"))?;
    let mut listed: Vec<String> = s
        .list("proj1", &[])
        .map_err(err("list"))?
        .into_iter()
        .map(|r| r.label)
        .collect();
    labels.sort();
    listed.sort();
    if labels != listed {
        return Err(format!("labels {:?} differ from list {:?}", labels, listed));
    }
    Ok(())
}

fn most_recent_uses_timestamp(s: &dyn Store) -> Result<(), String> {
    s.save(
        "proj1",
        &sample_record_without_data("newest", datetime!(2024-03-01 00:00:00)),
    )
    .map_err(err("save"))?;
    s.save(
        "proj1",
        &sample_record_without_data("oldest", datetime!(2023-01-01 00:00:00)),
    )
    .map_err(err("save"))?;
    s.save(
        "proj1",
        &sample_record_without_data("middle", datetime!(2024-01-15 12:00:00)),
    )
    .map_err(err("save"))?;
    let latest = s.most_recent("proj1").map_err(err("most_recent"))?;
    if latest != "newest" {
        return Err(format!("expected 'newest', got {:?}", latest));
    }
    Ok(())
}

fn delete_removes_or_keeps_intact(s: &dyn Store) -> Result<(), String> {
    let record = sample_record_without_data("run001", datetime!(2024-02-01 09:00:00));
    s.save("proj1", &record).map_err(err("save"))?;
    match s.delete("proj1", "run001").map_err(err("delete"))? {
        Outcome::Done(()) => match s.get("proj1", "run001") {
            Err(StoreError::NotFound { .. }) => Ok(()),
            Err(e) => Err(format!("expected NotFound after delete, got {}", e)),
            Ok(_) => Err("record still present after delete".into()),
        },
        Outcome::Unsupported { .. } => {
            let back = s.get("proj1", "run001").map_err(err("get after refused delete"))?;
            if back != record {
                return Err("refused delete modified the record".into());
            }
            Ok(())
        }
    }
}

fn delete_by_tag_counts_or_keeps_intact(s: &dyn Store) -> Result<(), String> {
    let ts = datetime!(2024-02-01 09:00:00);
    let mut a = sample_record_without_data("a", ts);
    a.tags = ["old".to_string()].into();
    let mut b = sample_record_without_data("b", ts);
    b.tags = ["old".to_string(), "keep".to_string()].into();
    let mut c = sample_record_without_data("c", ts);
    c.tags = ["keep".to_string()].into();
    for r in [&a, &b, &c] {
        s.save("proj1", r).map_err(err("save"))?;
    }

    let outcome = s.delete_by_tag("proj1", "old").map_err(err("delete_by_tag"))?;
    let mut remaining = s.labels("proj1", &[]).map_err(err("labels"))?;
    remaining.sort();
    match &outcome {
        Outcome::Done(n) => {
            if *n != 2 {
                return Err(format!("expected 2 deleted, got {}", n));
            }
            if remaining != vec!["c".to_string()] {
                return Err(format!("expected only 'c' to remain, got {:?}", remaining));
            }
        }
        Outcome::Unsupported { .. } => {
            if outcome.count() != 0 {
                return Err("refused delete_by_tag reported a non-zero count".into());
            }
            if remaining.len() != 3 {
                return Err(format!("refused delete_by_tag removed records: {:?}", remaining));
            }
        }
    }
    Ok(())
}
