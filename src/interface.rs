use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use prettytable::Table;
use rusqlite::Connection;
use std::io::Read;
use std::path::Path;

use crate::config::Config;
use crate::draft::Draft;
use crate::model;
use crate::payload::PayloadSchema;
use crate::submit::GraphqlSubmitter;

const DESCRIPTION_WIDTH: usize = 48;

/// Print the draft after bringing its timestamps up to date.
pub fn show(db: &Connection, config: &Config) -> Result<()> {
    let draft = Draft::load(db, &config.draft, Utc::now())
        .context("Failed to load the draft. Fix it with 'taskdraft edit' or start over with 'taskdraft reset'.")?;
    draft.save(db);
    print!("{}", draft.text());
    Ok(())
}

/// Replace the draft with the default task and print it.
pub fn reset(db: &Connection, config: &Config, schema: Option<PayloadSchema>) -> Result<()> {
    let schema = schema.unwrap_or(config.draft.payload_schema);
    let draft = Draft::default_for(&config.draft, schema, Utc::now())
        .context("Failed to build the default task.")?;
    draft.save(db);
    print!("{}", draft.text());
    Ok(())
}

/// Update the draft timestamps and print it.
pub fn refresh(db: &Connection, config: &Config) -> Result<()> {
    let now = Utc::now();
    let mut draft = Draft::open(db, &config.draft, now).context("Failed to open the draft.")?;
    draft
        .update_timestamps(now)
        .context("Failed to update timestamps, the draft was left unchanged.")?;
    draft.save(db);
    print!("{}", draft.text());
    Ok(())
}

/// Replace the draft with the contents of `file`, or stdin for "-".
pub fn edit(db: &Connection, file: &Path) -> Result<()> {
    let text = if file == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read the draft from stdin.")?;
        text
    } else {
        std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read the draft from {}.", file.display()))?
    };

    let draft = Draft::from_text(text);
    draft.save(db);

    if draft.is_invalid() {
        println!("Draft saved, but it is not valid YAML. It cannot be submitted until fixed.");
    } else {
        println!("Draft saved.");
    }
    Ok(())
}

/// List the recent task definitions.
pub fn recent(db: &Connection, config: &Config) -> Result<()> {
    let definitions = model::recent_task_definitions(db, config.draft.recent_limit)
        .context("Failed to read recent task definitions.")?;

    if definitions.is_empty() {
        println!("No recent task definitions. Submitted tasks show up here.");
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(row!["#", "name", "created", "description"]);
    for (index, definition) in definitions.iter().enumerate() {
        table.add_row(row![
            index + 1,
            definition.name,
            definition.created,
            textwrap::fill(definition.description().unwrap_or(""), DESCRIPTION_WIDTH)
        ]);
    }
    table.printstd();
    Ok(())
}

/// Make the recent task definition at `position` the draft and print it.
pub fn use_recent(db: &Connection, config: &Config, position: usize) -> Result<()> {
    let now = Utc::now();
    let mut draft = Draft::open(db, &config.draft, now).context("Failed to open the draft.")?;
    draft
        .use_recent(db, &config.draft, position, now)
        .with_context(|| format!("Failed to load recent task definition {}.", position))?;
    draft.save(db);
    print!("{}", draft.text());
    Ok(())
}

/// Validate the draft payload, failing when there are violations.
pub fn lint(db: &Connection, config: &Config, schema: Option<PayloadSchema>) -> Result<()> {
    let schema = schema.unwrap_or(config.draft.payload_schema);
    let draft = Draft::open(db, &config.draft, Utc::now()).context("Failed to open the draft.")?;
    let errors = draft.validate(schema).context("The draft is not a valid task document.")?;

    if errors.is_empty() {
        println!("Payload is valid for {}.", schema);
        return Ok(());
    }
    for error in &errors {
        println!("{}", error);
    }
    Err(anyhow!("{} schema violation(s) for {}.", errors.len(), schema))
}

/// Submit the draft, with its timestamps brought up to date, and print where
/// to find the new task.
pub fn submit(db: &Connection, config: &Config, interactive: bool) -> Result<()> {
    let mut draft = Draft::load(db, &config.draft, Utc::now())
        .context("Failed to load the draft. Fix it with 'taskdraft edit' before submitting.")?;
    let submitter = GraphqlSubmitter::new(config.graphql_endpoint(), config.token.clone());

    let task_id = draft
        .submit(db, &submitter, interactive)
        .context("Failed to create the task, the draft was kept for another try.")?;
    draft.save(db);

    println!("{}", task_id);
    if interactive {
        println!("{}/tasks/{}/connect", config.root_url, task_id);
    } else {
        println!("{}/tasks/{}", config.root_url, task_id);
    }
    Ok(())
}

/// List the payload schemas, marking the configured one.
pub fn schemas(config: &Config) -> Result<()> {
    for schema in PayloadSchema::ALL.iter() {
        let marker = if *schema == config.draft.payload_schema { "*" } else { " " };
        println!("{} {:<16} {}", marker, schema.name(), schema.label());
    }
    Ok(())
}
