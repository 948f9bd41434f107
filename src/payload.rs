use jsonschema::JSONSchema;
use serde_json::json;
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Minimum run time of an interactive task, in seconds.
pub const INTERACTIVE_MIN_RUN_TIME: i64 = 3600;

const DOCKER_WORKER_SAMPLE: &str = r#"
image: ubuntu:latest
command:
  - /bin/bash
  - -c
  - for ((i=1;i<=600;i++)); do echo $i; sleep 1; done
maxRunTime: 630
"#;

const GENERIC_WORKER_SAMPLE: &str = r#"
command:
  - - /bin/bash
    - -c
    - for ((i=1;i<=600;i++)); do echo $i; sleep 1; done
maxRunTime: 630
"#;

/// A worker implementation whose payload format we know how to check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSchema {
    DockerWorker,
    GenericWorker,
}

#[derive(Debug, Error)]
#[error("unknown payload schema '{0}' (expected: docker-worker|generic-worker)")]
pub struct UnknownSchema(String);

impl PayloadSchema {
    pub const ALL: [PayloadSchema; 2] = [PayloadSchema::DockerWorker, PayloadSchema::GenericWorker];

    pub fn name(self) -> &'static str {
        match self {
            PayloadSchema::DockerWorker => "docker-worker",
            PayloadSchema::GenericWorker => "generic-worker",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PayloadSchema::DockerWorker => "Docker worker",
            PayloadSchema::GenericWorker => "Generic worker (POSIX)",
        }
    }

    /// A payload that runs a short counting loop, used by the default task.
    pub fn sample_payload(self) -> Value {
        let text = match self {
            PayloadSchema::DockerWorker => DOCKER_WORKER_SAMPLE,
            PayloadSchema::GenericWorker => GENERIC_WORKER_SAMPLE,
        };
        serde_yaml::from_str(text).expect("built-in sample payload is valid YAML")
    }

    pub fn json_schema(self) -> serde_json::Value {
        match self {
            PayloadSchema::DockerWorker => json!({
                "type": "object",
                "required": ["image", "maxRunTime"],
                "properties": {
                    "image": {
                        "oneOf": [{"type": "string"}, {"type": "object"}]
                    },
                    "command": {"type": "array", "items": {"type": "string"}},
                    "maxRunTime": {"type": "integer", "minimum": 1, "maximum": 86400},
                    "env": {"type": "object", "additionalProperties": {"type": "string"}},
                    "features": {"type": "object", "additionalProperties": {"type": "boolean"}},
                    "caches": {"type": "object", "additionalProperties": {"type": "string"}},
                    "artifacts": {"type": "object"}
                }
            }),
            PayloadSchema::GenericWorker => json!({
                "type": "object",
                "required": ["command", "maxRunTime"],
                "properties": {
                    "command": {
                        "type": "array",
                        "minItems": 1,
                        "items": {"type": "array", "items": {"type": "string"}}
                    },
                    "maxRunTime": {"type": "integer", "minimum": 1, "maximum": 86400},
                    "env": {"type": "object", "additionalProperties": {"type": "string"}},
                    "features": {"type": "object", "additionalProperties": {"type": "boolean"}},
                    "mounts": {"type": "array"},
                    "osGroups": {"type": "array", "items": {"type": "string"}},
                    "artifacts": {"type": "array"}
                }
            }),
        }
    }
}

impl fmt::Display for PayloadSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PayloadSchema {
    type Err = UnknownSchema;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docker-worker" | "docker" => Ok(PayloadSchema::DockerWorker),
            "generic-worker" | "generic" => Ok(PayloadSchema::GenericWorker),
            _ => Err(UnknownSchema(s.to_string())),
        }
    }
}

/// Check the `payload` of a task against a worker schema. Returns one
/// message per violation; an empty list means the payload is valid.
pub fn validate_payload(task: &Value, schema: PayloadSchema) -> Vec<String> {
    let payload = match task.get("payload") {
        Some(payload) => payload,
        None => return vec!["task has no payload".to_string()],
    };
    let instance = match serde_json::to_value(payload) {
        Ok(instance) => instance,
        Err(err) => return vec![format!("payload cannot be checked: {}", err)],
    };
    let definition = schema.json_schema();
    let compiled = match JSONSchema::compile(&definition) {
        Ok(compiled) => compiled,
        Err(err) => return vec![format!("{} schema is invalid: {}", schema, err)],
    };

    if let Err(errors) = compiled.validate(&instance) {
        return errors
            .map(|error| format!("payload{}: {}", error.instance_path, error))
            .collect();
    }
    Vec::new()
}

/// Turn a task into an interactive one: enable the interactive feature,
/// drop caches and routes, and give it at least an hour to run.
pub fn make_interactive(mut task: Value) -> Value {
    if let Some(map) = task.as_mapping_mut() {
        map.remove("routes");
        make_payload_interactive(map);
    }
    task
}

fn make_payload_interactive(map: &mut Mapping) {
    let payload = map
        .entry(Value::from("payload"))
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    if !payload.is_mapping() {
        *payload = Value::Mapping(Mapping::new());
    }
    if let Some(payload) = payload.as_mapping_mut() {
        let features = payload
            .entry(Value::from("features"))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        if !features.is_mapping() {
            *features = Value::Mapping(Mapping::new());
        }
        if let Some(features) = features.as_mapping_mut() {
            features.insert(Value::from("interactive"), Value::Bool(true));
        }

        payload.remove("caches");

        let max_run_time = payload
            .get("maxRunTime")
            .and_then(Value::as_i64)
            .unwrap_or(0)
            .max(INTERACTIVE_MIN_RUN_TIME);
        payload.insert(Value::from("maxRunTime"), Value::from(max_run_time));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn sample_payloads_satisfy_their_schema() {
        for schema in PayloadSchema::ALL.iter() {
            let mut task = Mapping::new();
            task.insert(Value::from("payload"), schema.sample_payload());
            assert_eq!(validate_payload(&Value::Mapping(task), *schema), Vec::<String>::new());
        }
    }

    #[test]
    fn docker_payload_in_generic_schema_fails() {
        let mut task = Mapping::new();
        task.insert(Value::from("payload"), PayloadSchema::DockerWorker.sample_payload());
        let errors = validate_payload(&Value::Mapping(task), PayloadSchema::GenericWorker);
        assert!(!errors.is_empty());
        assert!(errors.iter().any(|e| e.starts_with("payload/command/0")), "{:?}", errors);
    }

    #[test]
    fn wrong_max_run_time_is_reported() {
        let task = yaml("payload:\n  image: ubuntu\n  maxRunTime: forever\n");
        let errors = validate_payload(&task, PayloadSchema::DockerWorker);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("payload/maxRunTime"));
    }

    #[test]
    fn missing_payload_is_reported() {
        let errors = validate_payload(&yaml("metadata: {}\n"), PayloadSchema::DockerWorker);
        assert_eq!(errors, vec!["task has no payload".to_string()]);
    }

    #[test]
    fn interactive_task_has_feature_and_minimum_run_time() {
        let task = yaml(
            r#"
routes: [index.example]
payload:
  image: ubuntu
  maxRunTime: 630
  caches:
    cache-name: /cache
  features:
    artifacts: true
"#,
        );
        let task = make_interactive(task);

        assert_eq!(
            task,
            yaml(
                r#"
payload:
  image: ubuntu
  maxRunTime: 3600
  features:
    artifacts: true
    interactive: true
"#
            )
        );
    }

    #[test]
    fn interactive_keeps_longer_run_time() {
        let task = make_interactive(yaml("payload:\n  maxRunTime: 7200\n"));
        assert_eq!(task["payload"]["maxRunTime"], Value::from(7200));
    }

    #[test]
    fn interactive_without_payload() {
        let task = make_interactive(yaml("metadata:\n  name: x\n"));
        assert_eq!(task["payload"]["features"]["interactive"], Value::Bool(true));
        assert_eq!(task["payload"]["maxRunTime"], Value::from(3600));
    }

    #[test]
    fn schema_names_parse() {
        assert_eq!("docker-worker".parse::<PayloadSchema>().unwrap(), PayloadSchema::DockerWorker);
        assert_eq!(" Generic ".parse::<PayloadSchema>().unwrap(), PayloadSchema::GenericWorker);
        assert!("windows".parse::<PayloadSchema>().is_err());
    }
}
