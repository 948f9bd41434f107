use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::SubmitError;

pub const CREATE_TASK_MUTATION: &str = "mutation CreateTask($taskId: ID!, $task: TaskInput!) {
  createTask(taskId: $taskId, task: $task) {
    taskId
    status {
      state
    }
  }
}";

/// Something that can create a task on the platform.
pub trait TaskSubmitter {
    fn create_task(&self, task_id: &str, task: &serde_json::Value) -> Result<(), SubmitError>;
}

/// Submits tasks through the platform's GraphQL `createTask` mutation.
#[derive(Debug, Clone)]
pub struct GraphqlSubmitter {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a> {
    #[serde(rename = "operationName")]
    operation_name: &'a str,
    query: &'a str,
    variables: CreateTaskVariables<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskVariables<'a> {
    task_id: &'a str,
    task: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

impl GraphqlSubmitter {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> GraphqlSubmitter {
        GraphqlSubmitter {
            client: Client::new(),
            endpoint: endpoint.into(),
            token,
        }
    }

    fn transport(&self, source: reqwest::Error) -> SubmitError {
        SubmitError::Transport {
            endpoint: self.endpoint.clone(),
            source,
        }
    }
}

fn request_body<'a>(task_id: &'a str, task: &'a serde_json::Value) -> GraphqlRequest<'a> {
    GraphqlRequest {
        operation_name: "CreateTask",
        query: CREATE_TASK_MUTATION,
        variables: CreateTaskVariables { task_id, task },
    }
}

/// Turn the `errors` of a GraphQL answer into a submission failure.
fn check_response(response: GraphqlResponse) -> Result<(), SubmitError> {
    if response.errors.is_empty() {
        Ok(())
    } else {
        Err(SubmitError::Graphql(
            response.errors.into_iter().map(|error| error.message).collect(),
        ))
    }
}

impl TaskSubmitter for GraphqlSubmitter {
    fn create_task(&self, task_id: &str, task: &serde_json::Value) -> Result<(), SubmitError> {
        tracing::info!(%task_id, endpoint = %self.endpoint, "submitting task");

        let mut request = self.client.post(&self.endpoint).json(&request_body(task_id, task));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().map_err(|err| self.transport(err))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SubmitError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let answer: GraphqlResponse = response.json().map_err(|err| self.transport(err))?;
        check_response(answer)
    }
}
