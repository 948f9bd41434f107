use std::path::PathBuf;
use structopt::StructOpt;

use crate::payload::PayloadSchema;

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Print the draft with its timestamps brought up to date.
    Show,
    /// Replace the draft with the default task.
    Reset {
        /// Payload schema of the default task (docker-worker, generic-worker).
        #[structopt(short, long)]
        schema: Option<PayloadSchema>,
    },
    /// Shift every timestamp in the draft by the time elapsed since it was created.
    Refresh,
    /// Replace the draft with the contents of a file ("-" reads stdin).
    Edit {
        #[structopt(parse(from_os_str))]
        file: PathBuf,
    },
    /// List recently submitted task definitions.
    Recent,
    /// Load a recent task definition as the draft, by position in `recent`.
    Use {
        #[structopt()]
        position: usize,
    },
    /// Validate the draft payload against a worker schema.
    Lint {
        #[structopt(short, long)]
        schema: Option<PayloadSchema>,
    },
    /// Submit the draft to the platform.
    Submit {
        /// Create an interactive task.
        #[structopt(short, long)]
        interactive: bool,
    },
    /// List the known payload schemas.
    Schemas,
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "taskdraft",
    about = "Prepare, refresh and submit task definitions."
)]
pub struct CommandLineArgs {
    #[structopt(subcommand)]
    pub action: Command,

    /// Use a different store file.
    #[structopt(parse(from_os_str), short, long)]
    pub db: Option<PathBuf>,

    /// Root url of the deployment, overrides TASKDRAFT_ROOT_URL.
    #[structopt(long)]
    pub root_url: Option<String>,

    /// GraphQL endpoint to submit to, overrides TASKDRAFT_ENDPOINT.
    /// Defaults to <root-url>/graphql.
    #[structopt(long)]
    pub endpoint: Option<String>,

    /// More logging (-v, -vv, -vvv).
    #[structopt(short, long, parse(from_occurrences))]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_submit_with_global_flags() {
        let args = CommandLineArgs::from_iter_safe(&[
            "taskdraft", "-vv", "--db", "/tmp/x.sqlite", "submit", "--interactive",
        ])
        .unwrap();

        assert_eq!(args.verbose, 2);
        assert_eq!(args.db, Some(PathBuf::from("/tmp/x.sqlite")));
        assert!(matches!(args.action, Command::Submit { interactive: true }));
    }

    #[test]
    fn parses_schema_option() {
        let args = CommandLineArgs::from_iter_safe(&["taskdraft", "reset", "-s", "generic-worker"]).unwrap();
        assert!(matches!(
            args.action,
            Command::Reset { schema: Some(PayloadSchema::GenericWorker) }
        ));
    }

    #[test]
    fn parses_endpoint_and_root_url() {
        let args = CommandLineArgs::from_iter_safe(&[
            "taskdraft",
            "--root-url",
            "https://tc.example.com",
            "--endpoint",
            "https://api.example.com/graphql",
            "submit",
        ])
        .unwrap();

        assert_eq!(args.root_url.as_deref(), Some("https://tc.example.com"));
        assert_eq!(args.endpoint.as_deref(), Some("https://api.example.com/graphql"));
    }

    #[test]
    fn rejects_unknown_schema() {
        assert!(CommandLineArgs::from_iter_safe(&["taskdraft", "lint", "--schema", "windows"]).is_err());
    }
}
