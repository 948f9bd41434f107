//! The task draft and the actions that replace it.
//!
//! Every action either produces a complete new draft or fails and leaves
//! the current one as it was.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde_yaml::Value;

use crate::config::DraftConfig;
use crate::error::{DraftError, ParseError, SubmitError};
use crate::model;
use crate::parameterize::{parameterize_task, parameterize_text};
use crate::payload::{make_interactive, validate_payload, PayloadSchema};
use crate::slugid;
use crate::submit::TaskSubmitter;
use crate::template::default_task;

/// The YAML text being prepared for submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    text: String,
    invalid: bool,
}

impl Draft {
    /// Wrap edited text, flagging it when it is not a YAML document. Invalid
    /// text is kept so it can be fixed, but cannot be submitted.
    pub fn from_text(text: String) -> Draft {
        let invalid = serde_yaml::from_str::<Value>(&text).is_err();
        Draft { text, invalid }
    }

    /// A freshly parameterized default task.
    pub fn default_for(
        config: &DraftConfig,
        schema: PayloadSchema,
        now: DateTime<Utc>,
    ) -> Result<Draft, ParseError> {
        let task = default_task(config, schema, now)?;
        Ok(Draft {
            text: parameterize_task(&task, now)?,
            invalid: false,
        })
    }

    /// The cached draft as it was left, or the default task when there is
    /// none. An unreadable cache is not an error.
    pub fn open(db: &Connection, config: &DraftConfig, now: DateTime<Utc>) -> Result<Draft, ParseError> {
        match model::load_draft(db) {
            Ok(Some(text)) => return Ok(Draft::from_text(text)),
            Ok(None) => tracing::debug!("no cached draft, using the default task"),
            Err(err) => tracing::warn!(error = %err, "could not read cached draft, using the default task"),
        }
        Draft::default_for(config, config.payload_schema, now)
    }

    /// Open the draft and bring its timestamps up to date.
    pub fn load(db: &Connection, config: &DraftConfig, now: DateTime<Utc>) -> Result<Draft, ParseError> {
        let mut draft = Draft::open(db, config, now)?;
        draft.update_timestamps(now)?;
        Ok(draft)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    /// Persist the draft. Failures are logged and otherwise ignored.
    pub fn save(&self, db: &Connection) {
        if let Err(err) = model::save_draft(db, &self.text) {
            tracing::warn!(error = %err, "could not cache draft");
        }
    }

    /// Replace the draft with the recent task definition at `position`
    /// (1-based, most recent first).
    pub fn use_recent(
        &mut self,
        db: &Connection,
        config: &DraftConfig,
        position: usize,
        now: DateTime<Utc>,
    ) -> Result<(), DraftError> {
        let recent = model::recent_task_definitions(db, config.recent_limit)?;
        let entry = position
            .checked_sub(1)
            .and_then(|index| recent.get(index))
            .ok_or(DraftError::NoSuchRecent(position))?;
        self.text = parameterize_task(&entry.definition, now)?;
        self.invalid = false;
        Ok(())
    }

    /// Shift all timestamps by the time elapsed since the draft's `created`.
    pub fn update_timestamps(&mut self, now: DateTime<Utc>) -> Result<(), ParseError> {
        self.text = parameterize_text(&self.text, now)?;
        self.invalid = false;
        Ok(())
    }

    /// Check the draft payload against `schema`.
    pub fn validate(&self, schema: PayloadSchema) -> Result<Vec<String>, ParseError> {
        let task: Value = serde_yaml::from_str(&self.text)?;
        Ok(validate_payload(&task, schema))
    }

    /// Submit the draft as it is and return the new task id. Timestamps are
    /// not shifted here, so callers load the draft with [`Draft::load`]
    /// first. The submitted task becomes the draft; on failure the draft is
    /// left untouched.
    pub fn submit<S: TaskSubmitter>(
        &mut self,
        db: &Connection,
        submitter: &S,
        interactive: bool,
    ) -> Result<String, DraftError> {
        if self.invalid {
            return Err(SubmitError::InvalidDraft.into());
        }
        let task: Value = serde_yaml::from_str(&self.text).map_err(ParseError::from)?;

        if let Err(err) = model::put_task_definition(db, &task) {
            tracing::warn!(error = %err, "could not remember task definition");
        }

        let task = if interactive { make_interactive(task) } else { task };
        let payload = serde_json::to_value(&task).map_err(SubmitError::from)?;
        let text = serde_yaml::to_string(&task).map_err(ParseError::from)?;
        let task_id = slugid::nice();

        submitter.create_task(&task_id, &payload)?;
        tracing::info!(%task_id, interactive, "task created");

        self.text = text;
        Ok(task_id)
    }
}
