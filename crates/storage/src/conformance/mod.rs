//! Conformance test suite for `Store` implementations.
//!
//! A backend-agnostic suite any [`Store`] can run to check it honours the
//! store contract:
//!
//! - **projects**: creation, `has_project` / `list_projects` agreement, info
//! - **records**: save/get round trip, overwrite, tag filtering, most recent,
//!   NotFound on absent labels, delete (or refusal that leaves data intact)
//! - **sync**: copying into and out of the backend, idempotent re-runs
//!
//! # Usage
//!
//! Call [`run_conformance_suite`] with a factory returning a fresh, empty
//! store for each test:
//!
//! ```ignore
//! use provstore_storage::conformance::run_conformance_suite;
//!
//! #[test]
//! fn file_store_conformance() {
//!     let dir = tempfile::TempDir::new().unwrap();
//!     let counter = std::cell::Cell::new(0);
//!     let report = run_conformance_suite(|| {
//!         counter.set(counter.get() + 1);
//!         JsonFileStore::new(dir.path().join(format!("{}.json", counter.get())))
//!     });
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod projects;
mod records;
mod sync;

use std::collections::BTreeSet;
use std::fmt;

use provstore_core::{
    DataItem, Dependency, Executable, LaunchMode, ParameterSet, Platform, Record, Repository,
};
use time::PrimitiveDateTime;

use crate::Store;

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (`projects`, `records`, `sync`).
    pub category: String,
    pub name: String,
    pub passed: bool,
    /// Failure message when `passed` is false.
    pub message: Option<String>,
}

impl TestResult {
    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        let (passed, message) = match result {
            Ok(()) => (true, None),
            Err(msg) => (false, Some(msg)),
        };
        TestResult {
            category: category.to_string(),
            name: name.to_string(),
            passed,
            message,
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in self.results.iter().filter(|r| !r.passed) {
            writeln!(
                f,
                "  FAIL [{}/{}]: {}",
                r.category,
                r.name,
                r.message.as_deref().unwrap_or("(no message)")
            )?;
        }
        Ok(())
    }
}

/// Run the full conformance suite against a backend.
///
/// `factory` is called once per test and must return a fresh, empty store.
pub fn run_conformance_suite<S, F>(factory: F) -> ConformanceReport
where
    S: Store,
    F: Fn() -> S,
{
    let mut results = Vec::new();
    results.extend(projects::run_project_tests(&factory));
    results.extend(records::run_record_tests(&factory));
    results.extend(sync::run_sync_tests(&factory));

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();
    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

/// A record with every field populated, for round-trip checks.
///
/// Data items point at `/nonexistent` stores; backends that upload data
/// files need [`sample_record_without_data`] instead.
pub fn sample_record(label: &str, timestamp: PrimitiveDateTime) -> Record {
    let mut record = sample_record_without_data(label, timestamp);
    record.input_data = vec![DataItem::new("in/params.txt", "0a1b2c", "/nonexistent/in")];
    record.output_data = vec![
        DataItem::new("out/result.dat", "3d4e5f", "/nonexistent/out"),
        DataItem::new("out/figure.png", "6a7b8c", "/nonexistent/out"),
    ];
    record
}

/// Like [`sample_record`] but with no input or output data items.
pub fn sample_record_without_data(label: &str, timestamp: PrimitiveDateTime) -> Record {
    let mut parameters = ParameterSet::new();
    parameters.insert("alpha".to_string(), serde_json::json!(0.5));
    parameters.insert("steps".to_string(), serde_json::json!(200));
    parameters.insert("solver".to_string(), serde_json::json!("rk4"));

    let mut launch_parameters = ParameterSet::new();
    launch_parameters.insert("n".to_string(), serde_json::json!(4));

    Record {
        label: label.to_string(),
        reason: "check convergence".to_string(),
        tags: BTreeSet::from(["baseline".to_string(), "nightly".to_string()]),
        timestamp,
        duration: Some(12.5),
        executable: Some(Executable {
            name: "Python".to_string(),
            path: "/usr/bin/python3".to_string(),
            version: "3.11.4".to_string(),
            options: "-O".to_string(),
        }),
        repository: Some(Repository {
            kind: "git".to_string(),
            url: "https://example.org/sim.git".to_string(),
            upstream: Some("origin".to_string()),
        }),
        main_file: Some("run_sim.py".to_string()),
        version: Some("a1b2c3d4".to_string()),
        parameters,
        script_arguments: "--fast <parameters>".to_string(),
        input_data: Vec::new(),
        output_data: Vec::new(),
        dependencies: vec![
            Dependency {
                name: "numpy".to_string(),
                version: "1.26.0".to_string(),
                digest: "ff00".to_string(),
            },
            Dependency {
                name: "scipy".to_string(),
                version: "1.11.2".to_string(),
                digest: "ee11".to_string(),
            },
        ],
        platform: Platform {
            system_name: "Linux".to_string(),
            release: "6.1.0".to_string(),
            version: "#1 SMP".to_string(),
            machine: "x86_64".to_string(),
            processor: "x86_64".to_string(),
            network_name: "node01".to_string(),
            ip_addr: "10.0.0.5".to_string(),
            architecture_bits: "64bit".to_string(),
            architecture_linkage: "ELF".to_string(),
        },
        outcome: "converged after 200 steps".to_string(),
        status: "finished".to_string(),
        stdout_stderr: "step 200: residual 1e-9\n".to_string(),
        diff: String::new(),
        user: "Ada <ada@example.org>".to_string(),
        launch_mode: LaunchMode {
            kind: "distributed".to_string(),
            parameters: launch_parameters,
        },
    }
}

fn err<E: fmt::Display>(context: &str) -> impl Fn(E) -> String + '_ {
    move |e| format!("{}: {}", context, e)
}
