use chrono::{DateTime, Duration, Utc};
use serde_yaml::{Mapping, Value};

use crate::config::DraftConfig;
use crate::error::ParseError;
use crate::parameterize::format_timestamp;
use crate::payload::PayloadSchema;

/// Build the task offered when there is no draft yet, or after a reset.
pub fn default_task(
    config: &DraftConfig,
    schema: PayloadSchema,
    now: DateTime<Utc>,
) -> Result<Value, ParseError> {
    let deadline = Duration::from_std(config.deadline)
        .ok()
        .and_then(|deadline| now.checked_add_signed(deadline))
        .ok_or_else(|| ParseError::OutOfRange(humantime::format_duration(config.deadline).to_string()))?;

    let mut metadata = Mapping::new();
    metadata.insert("name".into(), "example-task".into());
    metadata.insert("description".into(), "An **example** task".into());
    metadata.insert("owner".into(), config.owner.as_str().into());
    metadata.insert("source".into(), config.source.as_str().into());

    let mut task = Mapping::new();
    task.insert("taskQueueId".into(), config.task_queue_id.as_str().into());
    task.insert("schedulerId".into(), config.scheduler_id.as_str().into());
    task.insert("created".into(), format_timestamp(now).into());
    task.insert("deadline".into(), format_timestamp(deadline).into());
    task.insert("payload".into(), schema.sample_payload());
    task.insert("metadata".into(), Value::Mapping(metadata));

    Ok(Value::Mapping(task))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::parameterize::parse_timestamp;

    #[test]
    fn default_task_uses_configuration() {
        let config = Config::default().draft;
        let now = parse_timestamp("2024-05-01T08:00:00.000Z").unwrap();
        let task = default_task(&config, PayloadSchema::GenericWorker, now).unwrap();

        assert_eq!(task["taskQueueId"], Value::from("proj-getting-started/tutorial"));
        assert_eq!(task["schedulerId"], Value::from("taskcluster-ui"));
        assert_eq!(task["created"], Value::from("2024-05-01T08:00:00.000Z"));
        assert_eq!(task["deadline"], Value::from("2024-05-01T11:00:00.000Z"));
        assert_eq!(task["payload"], PayloadSchema::GenericWorker.sample_payload());
        assert_eq!(task["metadata"]["name"], Value::from("example-task"));
        assert_eq!(task["metadata"]["owner"], Value::from("name@example.com"));
    }

    #[test]
    fn keys_come_in_template_order() {
        let task = default_task(&Config::default().draft, PayloadSchema::DockerWorker, Utc::now()).unwrap();
        let keys: Vec<_> = task.as_mapping().unwrap().keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, ["taskQueueId", "schedulerId", "created", "deadline", "payload", "metadata"]);
    }
}
