use anyhow::{Context, Result};
use humantime::parse_duration;
use std::time::Duration;

use crate::payload::PayloadSchema;

pub const DEFAULT_ROOT_URL: &str = "http://localhost:3050";
pub const DEFAULT_TASK_QUEUE_ID: &str = "proj-getting-started/tutorial";
pub const DEFAULT_SCHEDULER_ID: &str = "taskcluster-ui";
pub const DEFAULT_OWNER: &str = "name@example.com";
pub const DEFAULT_RECENT_LIMIT: u32 = 5;

/// Values used to build the default task and to list recent definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftConfig {
    pub task_queue_id: String,
    pub scheduler_id: String,
    pub owner: String,
    pub source: String,
    /// How far the default deadline lies after `created`.
    pub deadline: Duration,
    pub payload_schema: PayloadSchema,
    pub recent_limit: u32,
}

/// Full configuration, assembled once in `main` and handed down.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub draft: DraftConfig,
    pub root_url: String,
    /// GraphQL endpoint, when it is not `<root_url>/graphql`.
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            draft: DraftConfig {
                task_queue_id: DEFAULT_TASK_QUEUE_ID.to_string(),
                scheduler_id: DEFAULT_SCHEDULER_ID.to_string(),
                owner: DEFAULT_OWNER.to_string(),
                source: format!("{}/tasks/create", DEFAULT_ROOT_URL),
                deadline: Duration::from_secs(3 * 60 * 60),
                payload_schema: PayloadSchema::DockerWorker,
                recent_limit: DEFAULT_RECENT_LIMIT,
            },
            root_url: DEFAULT_ROOT_URL.to_string(),
            endpoint: None,
            token: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Defaults overlaid with the `TASKDRAFT_*` environment variables.
    pub fn from_env() -> Result<Config> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(root_url) = lookup("TASKDRAFT_ROOT_URL") {
            config.set_root_url(&root_url);
        }
        config.endpoint = lookup("TASKDRAFT_ENDPOINT").filter(|endpoint| !endpoint.is_empty());
        config.token = lookup("TASKDRAFT_TOKEN").filter(|token| !token.is_empty());

        if let Some(queue) = lookup("TASKDRAFT_TASK_QUEUE_ID") {
            config.draft.task_queue_id = queue;
        }
        if let Some(scheduler) = lookup("TASKDRAFT_SCHEDULER_ID") {
            config.draft.scheduler_id = scheduler;
        }
        if let Some(owner) = lookup("TASKDRAFT_OWNER") {
            config.draft.owner = owner;
        }
        if let Some(source) = lookup("TASKDRAFT_SOURCE") {
            config.draft.source = source;
        }
        if let Some(deadline) = lookup("TASKDRAFT_DEADLINE") {
            config.draft.deadline = parse_duration(&deadline)
                .with_context(|| format!("Invalid TASKDRAFT_DEADLINE '{}'.", deadline))?;
        }
        if let Some(schema) = lookup("TASKDRAFT_SCHEMA") {
            config.draft.payload_schema = schema
                .parse()
                .with_context(|| format!("Invalid TASKDRAFT_SCHEMA '{}'.", schema))?;
        }
        if let Some(limit) = lookup("TASKDRAFT_RECENT_LIMIT") {
            config.draft.recent_limit = limit
                .parse()
                .with_context(|| format!("Invalid TASKDRAFT_RECENT_LIMIT '{}'.", limit))?;
        }
        if let Some(level) = lookup("TASKDRAFT_LOG") {
            config.log_level = level;
        }

        Ok(config)
    }

    /// Point the configuration at another deployment. The metadata source
    /// follows the root url unless it was customized.
    pub fn set_root_url(&mut self, root_url: &str) {
        let root_url = root_url.trim_end_matches('/');
        if self.draft.source == format!("{}/tasks/create", self.root_url) {
            self.draft.source = format!("{}/tasks/create", root_url);
        }
        self.root_url = root_url.to_string();
    }

    /// The GraphQL endpoint tasks are submitted to.
    pub fn graphql_endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("{}/graphql", self.root_url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.graphql_endpoint(), "http://localhost:3050/graphql");
        assert_eq!(config.draft.deadline, Duration::from_secs(10_800));
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("TASKDRAFT_ROOT_URL", "https://tc.example.com/"),
            ("TASKDRAFT_DEADLINE", "1day"),
            ("TASKDRAFT_SCHEMA", "generic-worker"),
            ("TASKDRAFT_TOKEN", "secret"),
            ("TASKDRAFT_RECENT_LIMIT", "10"),
        ]))
        .unwrap();

        assert_eq!(config.graphql_endpoint(), "https://tc.example.com/graphql");
        assert_eq!(config.draft.source, "https://tc.example.com/tasks/create");
        assert_eq!(config.draft.deadline, Duration::from_secs(86_400));
        assert_eq!(config.draft.payload_schema, PayloadSchema::GenericWorker);
        assert_eq!(config.token.as_deref(), Some("secret"));
        assert_eq!(config.draft.recent_limit, 10);
    }

    #[test]
    fn custom_source_survives_root_url_change() {
        let config = Config::from_lookup(lookup(&[
            ("TASKDRAFT_SOURCE", "https://example.com/my-task"),
            ("TASKDRAFT_ROOT_URL", "https://tc.example.com"),
        ]))
        .unwrap();
        assert_eq!(config.draft.source, "https://example.com/my-task");
    }

    #[test]
    fn invalid_deadline_is_rejected() {
        let err = Config::from_lookup(lookup(&[("TASKDRAFT_DEADLINE", "soon")])).unwrap_err();
        assert!(err.to_string().contains("TASKDRAFT_DEADLINE"));
    }

    #[test]
    fn endpoint_overrides_root_url_for_submission_only() {
        let config = Config::from_lookup(lookup(&[
            ("TASKDRAFT_ROOT_URL", "https://tc.example.com"),
            ("TASKDRAFT_ENDPOINT", "https://api.example.com/graphql"),
        ]))
        .unwrap();

        assert_eq!(config.graphql_endpoint(), "https://api.example.com/graphql");
        assert_eq!(config.root_url, "https://tc.example.com");
        assert_eq!(config.draft.source, "https://tc.example.com/tasks/create");
    }

    #[test]
    fn empty_token_is_ignored() {
        let config = Config::from_lookup(lookup(&[("TASKDRAFT_TOKEN", "")])).unwrap();
        assert_eq!(config.token, None);
    }
}
