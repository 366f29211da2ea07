use super::{err, sample_record_without_data, TestResult};
use crate::Store;
use time::macros::datetime;

pub(super) fn run_project_tests<S, F>(factory: &F) -> Vec<TestResult>
where
    S: Store,
    F: Fn() -> S,
{
    vec![
        TestResult::from_result(
            "projects",
            "new_store_has_no_projects",
            new_store_has_no_projects(&factory()),
        ),
        TestResult::from_result(
            "projects",
            "created_project_is_listed",
            created_project_is_listed(&factory()),
        ),
        TestResult::from_result(
            "projects",
            "has_project_agrees_with_list_projects",
            has_project_agrees_with_list_projects(&factory()),
        ),
        TestResult::from_result(
            "projects",
            "project_info_returns_long_name_and_description",
            project_info_returns_long_name_and_description(&factory()),
        ),
        TestResult::from_result(
            "projects",
            "update_project_info_replaces_description",
            update_project_info_replaces_description(&factory()),
        ),
        TestResult::from_result(
            "projects",
            "save_auto_creates_project",
            save_auto_creates_project(&factory()),
        ),
    ]
}

fn new_store_has_no_projects(s: &dyn Store) -> Result<(), String> {
    let projects = s.list_projects().map_err(err("list_projects"))?;
    if !projects.is_empty() {
        return Err(format!("expected no projects, got {:?}", projects));
    }
    if s.has_project("absent").map_err(err("has_project"))? {
        return Err("has_project(\"absent\") returned true on an empty store".into());
    }
    Ok(())
}

fn created_project_is_listed(s: &dyn Store) -> Result<(), String> {
    s.create_project("alpha", "Alpha project", "first")
        .map_err(err("create_project"))?;
    let projects = s.list_projects().map_err(err("list_projects"))?;
    if projects != vec!["alpha".to_string()] {
        return Err(format!("expected [\"alpha\"], got {:?}", projects));
    }
    Ok(())
}

fn has_project_agrees_with_list_projects(s: &dyn Store) -> Result<(), String> {
    s.create_project("alpha", "", "").map_err(err("create_project"))?;
    s.create_project("beta", "", "").map_err(err("create_project"))?;
    let listed = s.list_projects().map_err(err("list_projects"))?;
    for name in ["alpha", "beta", "gamma"] {
        let has = s.has_project(name).map_err(err("has_project"))?;
        let in_list = listed.iter().any(|p| p == name);
        if has != in_list {
            return Err(format!(
                "has_project({:?}) = {} but list_projects contains it: {}",
                name, has, in_list
            ));
        }
    }
    Ok(())
}

fn project_info_returns_long_name_and_description(s: &dyn Store) -> Result<(), String> {
    s.create_project("alpha", "Alpha project", "first of many")
        .map_err(err("create_project"))?;
    let info = s.project_info("alpha").map_err(err("project_info"))?;
    if info.name != "Alpha project" || info.description != "first of many" {
        return Err(format!("unexpected project info {:?}", info));
    }
    Ok(())
}

fn update_project_info_replaces_description(s: &dyn Store) -> Result<(), String> {
    s.create_project("alpha", "Alpha", "old")
        .map_err(err("create_project"))?;
    s.update_project_info("alpha", "Alpha v2", "new")
        .map_err(err("update_project_info"))?;
    let info = s.project_info("alpha").map_err(err("project_info"))?;
    if info.name != "Alpha v2" || info.description != "new" {
        return Err(format!("update not applied, got {:?}", info));
    }
    Ok(())
}

fn save_auto_creates_project(s: &dyn Store) -> Result<(), String> {
    let record = sample_record_without_data("run001", datetime!(2024-02-01 09:00:00));
    s.save("fresh", &record).map_err(err("save"))?;
    if !s.has_project("fresh").map_err(err("has_project"))? {
        return Err("project was not created by save".into());
    }
    Ok(())
}
