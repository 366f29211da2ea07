use std::path::Path;

use provstore_core::Record;
use provstore_storage::{sync_all, Outcome, Store, StoreError, StoreRegistry, SyncReport};
use serde_json::json;

use crate::{Commands, OutputFormat};

pub(crate) struct Context<'a> {
    pub registry: &'a StoreRegistry,
    pub store_uri: &'a str,
    pub output: OutputFormat,
    pub quiet: bool,
}

impl Context<'_> {
    fn open(&self) -> Result<Box<dyn Store>, String> {
        self.registry.open(self.store_uri).map_err(describe)
    }

    fn print_json(&self, value: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("serialization error: {}", e))
        );
    }

    fn note(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{}", msg);
        }
    }
}

fn describe(e: StoreError) -> String {
    e.to_string()
}

pub(crate) fn run(ctx: &Context<'_>, command: Commands) -> Result<(), String> {
    match command {
        Commands::Backend { uri } => {
            let name = ctx.registry.backend_name(&uri);
            match ctx.output {
                OutputFormat::Text => println!("{}", name),
                OutputFormat::Json => ctx.print_json(&json!({ "uri": uri, "backend": name })),
            }
            Ok(())
        }
        Commands::Projects => cmd_projects(ctx, &*ctx.open()?),
        Commands::Info { project } => cmd_info(ctx, &*ctx.open()?, &project),
        Commands::CreateProject {
            name,
            long_name,
            description,
        } => {
            ctx.open()?
                .create_project(&name, &long_name, &description)
                .map_err(describe)?;
            ctx.note(&format!("created project '{}'", name));
            Ok(())
        }
        Commands::UpdateProject {
            name,
            long_name,
            description,
        } => {
            ctx.open()?
                .update_project_info(&name, &long_name, &description)
                .map_err(describe)?;
            ctx.note(&format!("updated project '{}'", name));
            Ok(())
        }
        Commands::List { project, tags } => cmd_list(ctx, &*ctx.open()?, &project, &tags),
        Commands::Show { project, label } => {
            let record = ctx.open()?.get(&project, &label).map_err(describe)?;
            match ctx.output {
                OutputFormat::Json => ctx.print_json(&to_value(&record)?),
                OutputFormat::Text => print_record(&record),
            }
            Ok(())
        }
        Commands::Import { project, file } => cmd_import(ctx, &*ctx.open()?, &project, &file),
        Commands::Export { project } => {
            println!("{}", ctx.open()?.export(&project).map_err(describe)?);
            Ok(())
        }
        Commands::Delete { project, label } => {
            match ctx.open()?.delete(&project, &label).map_err(describe)? {
                Outcome::Done(()) => ctx.note(&format!("deleted '{}'", label)),
                Outcome::Unsupported { reason, .. } => ctx.note(&format!("not deleted: {}", reason)),
            }
            Ok(())
        }
        Commands::DeleteTag { project, tag } => {
            let outcome = ctx.open()?.delete_by_tag(&project, &tag).map_err(describe)?;
            if let Outcome::Unsupported { reason, .. } = &outcome {
                ctx.note(&format!("not deleted: {}", reason));
            }
            match ctx.output {
                OutputFormat::Text => println!("{}", outcome.count()),
                OutputFormat::Json => ctx.print_json(&json!({
                    "deleted": outcome.count(),
                    "supported": outcome.is_done(),
                })),
            }
            Ok(())
        }
        Commands::Latest { project } => {
            let label = ctx.open()?.most_recent(&project).map_err(describe)?;
            match ctx.output {
                OutputFormat::Text => println!("{}", label),
                OutputFormat::Json => ctx.print_json(&json!({ "label": label })),
            }
            Ok(())
        }
        Commands::Sync { project, from, all } => cmd_sync(ctx, project, &from, all),
        Commands::Backup => {
            match ctx.open()?.backup().map_err(describe)? {
                Outcome::Done(()) => ctx.note("backup written"),
                Outcome::Unsupported { reason, .. } => ctx.note(&format!("no backup: {}", reason)),
            }
            Ok(())
        }
        Commands::Clear { yes } => {
            if !yes {
                return Err("refusing to clear the store without --yes".to_string());
            }
            match ctx.open()?.clear().map_err(describe)? {
                Outcome::Done(()) => ctx.note("store cleared"),
                Outcome::Unsupported { reason, .. } => ctx.note(&format!("not cleared: {}", reason)),
            }
            Ok(())
        }
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, String> {
    serde_json::to_value(value).map_err(|e| format!("serialization error: {}", e))
}

fn cmd_projects(ctx: &Context<'_>, store: &dyn Store) -> Result<(), String> {
    let projects = store.list_projects().map_err(describe)?;
    match ctx.output {
        OutputFormat::Text => projects.iter().for_each(|p| println!("{}", p)),
        OutputFormat::Json => ctx.print_json(&json!(projects)),
    }
    Ok(())
}

fn cmd_info(ctx: &Context<'_>, store: &dyn Store, project: &str) -> Result<(), String> {
    let info = store.project_info(project).map_err(describe)?;
    match ctx.output {
        OutputFormat::Text => {
            println!("name: {}", info.name);
            println!("description: {}", info.description);
        }
        OutputFormat::Json => ctx.print_json(&to_value(&info)?),
    }
    Ok(())
}

fn cmd_list(ctx: &Context<'_>, store: &dyn Store, project: &str, tags: &[String]) -> Result<(), String> {
    let mut records = store.list(project, tags).map_err(describe)?;
    records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.label.cmp(&b.label)));
    match ctx.output {
        OutputFormat::Text => {
            for r in &records {
                let timestamp = provstore_core::timestamp::format(&r.timestamp).map_err(|e| e.to_string())?;
                let tags: Vec<&str> = r.tags.iter().map(String::as_str).collect();
                println!("{}\t{}\t{}", r.label, timestamp, tags.join(","));
            }
        }
        OutputFormat::Json => ctx.print_json(&to_value(&records)?),
    }
    Ok(())
}

fn print_record(record: &Record) {
    let timestamp = provstore_core::timestamp::format(&record.timestamp).unwrap_or_default();
    println!("label: {}", record.label);
    println!("timestamp: {}", timestamp);
    if !record.tags.is_empty() {
        let tags: Vec<&str> = record.tags.iter().map(String::as_str).collect();
        println!("tags: {}", tags.join(", "));
    }
    if !record.reason.is_empty() {
        println!("reason: {}", record.reason);
    }
    if let Some(main_file) = &record.main_file {
        println!("main file: {}", main_file);
    }
    if let Some(duration) = record.duration {
        println!("duration: {}s", duration);
    }
    if !record.status.is_empty() {
        println!("status: {}", record.status);
    }
    if !record.outcome.is_empty() {
        println!("outcome: {}", record.outcome);
    }
    println!("inputs: {}", record.input_data.len());
    println!("outputs: {}", record.output_data.len());
}

/// Records to import: a single JSON object or an array of them.
fn read_records(path: &Path) -> Result<Vec<Record>, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| format!("could not parse '{}': {}", path.display(), e))?;
    let parsed = if value.is_array() {
        serde_json::from_value::<Vec<Record>>(value)
    } else {
        serde_json::from_value::<Record>(value).map(|r| vec![r])
    };
    parsed.map_err(|e| format!("invalid record in '{}': {}", path.display(), e))
}

fn cmd_import(ctx: &Context<'_>, store: &dyn Store, project: &str, file: &Path) -> Result<(), String> {
    let records = read_records(file)?;
    for record in &records {
        store.save(project, record).map_err(describe)?;
    }
    match ctx.output {
        OutputFormat::Text => println!("imported {} record(s) into '{}'", records.len(), project),
        OutputFormat::Json => ctx.print_json(&json!({
            "project": project,
            "imported": records.iter().map(|r| r.label.as_str()).collect::<Vec<_>>(),
        })),
    }
    Ok(())
}

fn cmd_sync(ctx: &Context<'_>, project: Option<String>, from: &str, all: bool) -> Result<(), String> {
    let source = ctx.registry.open(from).map_err(describe)?;
    let target = ctx.open()?;
    let reports: Vec<SyncReport> = match (project, all) {
        (None, true) => sync_all(&*source, &*target).map_err(describe)?,
        (Some(project), false) => vec![target.sync(&*source, &project).map_err(describe)?],
        (Some(_), true) => return Err("give either a project or --all, not both".to_string()),
        (None, false) => return Err("a project name or --all is required".to_string()),
    };
    match ctx.output {
        OutputFormat::Text => {
            for report in &reports {
                println!("{}: {} record(s) copied", report.project, report.copied.len());
            }
        }
        OutputFormat::Json => {
            let value: Vec<serde_json::Value> = reports
                .iter()
                .map(|r| {
                    json!({
                        "project": r.project,
                        "created_project": r.created_project,
                        "copied": r.copied,
                    })
                })
                .collect();
            ctx.print_json(&json!(value));
        }
    }
    Ok(())
}
