use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use qnaeval::{PollOptions, QueryOptions, QueryOptionsBuilder, RunOptions, RunOptionsBuilder};

#[derive(Parser, Debug)]
#[command(version, about = "Measure retrieval accuracy of a QnA Maker knowledge base")]
pub struct FullArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a knowledge base from the source CSV, publish it, replay the
    /// tester files against it, and optionally delete it
    Run(RunArgs),

    /// Replay one tester file against an already published knowledge base
    Verify(VerifyArgs),

    /// Delete a knowledge base, e.g. one left behind by an earlier run
    Delete(DeleteArgs),
}

/// Only the exact string `true` turns a flag on
pub fn parse_flag(s: &str) -> Result<bool, String> {
    Ok(s == "true")
}

#[derive(clap::Args, Debug)]
pub struct AuthoringArgs {
    /// Subscription key for the authoring API
    #[arg(long, env = "AUTHORING_KEY", hide_env_values = true)]
    pub authoring_key: String,

    /// Cognitive services resource name (authoring host)
    #[arg(long, env = "COGNITIVE_SERVICES_NAME")]
    pub cognitive_services_name: String,
}

#[derive(clap::Args, Debug)]
pub struct QueryArgs {
    /// QnA Maker app name (runtime host)
    #[arg(long, env = "QNAMAKER_APP_NAME")]
    pub qnamaker_app_name: String,

    /// Number of answers requested per query
    #[arg(long, env = "TOP_COUNT")]
    pub top_count: u32,

    /// Minimum answer score (0-100)
    #[arg(long, env = "SCORE_THRESHOLD")]
    pub score_threshold: f64,

    /// Directory receiving response and result files
    #[arg(long, default_value = "output", env = "QNAEVAL_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// No progress display
    #[arg(long)]
    pub silent: bool,
}

impl QueryArgs {
    pub fn options(&self) -> anyhow::Result<QueryOptions> {
        Ok(QueryOptionsBuilder::default()
            .top(self.top_count)
            .score_threshold(self.score_threshold)
            .output_dir(self.output_dir.clone())
            .silent(self.silent)
            .build()?)
    }
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub authoring: AuthoringArgs,

    #[command(flatten)]
    pub query: QueryArgs,

    /// Source CSV (`id,questions,answer`), relative to the input directory
    #[arg(long, env = "DATA_CSV_FILE_NAME")]
    pub data_csv_file_name: String,

    /// User-authored tester CSV (`expectedId,testQuery`), relative to the
    /// input directory
    #[arg(long, env = "TESTER_USER_CSV_FILE_NAME")]
    pub tester_user_csv_file_name: String,

    /// Questions held out of each record that has more than this many
    #[arg(long, env = "TEST_QUERY_COUNT")]
    pub test_query_count: usize,

    /// Delete the knowledge base at the end of the run
    #[arg(long, env = "KB_DELETION", required = true, action = clap::ArgAction::Set, value_parser = parse_flag)]
    pub kb_deletion: bool,

    /// Verify with the tester file generated from the source CSV
    #[arg(long, env = "USE_TESTER_DATA", required = true, action = clap::ArgAction::Set, value_parser = parse_flag)]
    pub use_tester_data: bool,

    /// Verify with the user-authored tester file
    #[arg(long, env = "USE_TESTER_USER", required = true, action = clap::ArgAction::Set, value_parser = parse_flag)]
    pub use_tester_user: bool,

    #[arg(long, default_value = "input", env = "QNAEVAL_INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Name given to the created knowledge base
    #[arg(long, default_value = "tmp-kb", env = "QNAEVAL_KB_NAME")]
    pub kb_name: String,

    /// Language of the knowledge base content
    #[arg(long, default_value = "Japanese", env = "QNAEVAL_KB_LANGUAGE")]
    pub kb_language: String,

    /// Delay between operation status requests
    #[arg(long, default_value_t = 1000, env = "QNAEVAL_POLL_INTERVAL_MS")]
    pub poll_interval_ms: u64,

    /// Give up waiting for knowledge base creation after this many polls
    #[arg(
        long,
        default_value_t = 600,
        env = "QNAEVAL_MAX_POLL_ATTEMPTS",
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub max_poll_attempts: usize,
}

impl RunArgs {
    pub fn options(&self) -> anyhow::Result<RunOptions> {
        Ok(RunOptionsBuilder::default()
            .data_file_name(self.data_csv_file_name.as_str())
            .tester_user_file_name(self.tester_user_csv_file_name.as_str())
            .input_dir(self.input_dir.clone())
            .kb_name(self.kb_name.as_str())
            .language(self.kb_language.as_str())
            .test_query_count(self.test_query_count)
            .kb_deletion(self.kb_deletion)
            .use_tester_data(self.use_tester_data)
            .use_tester_user(self.use_tester_user)
            .poll(PollOptions {
                interval: Duration::from_millis(self.poll_interval_ms),
                max_attempts: self.max_poll_attempts,
            })
            .query(self.query.options()?)
            .build()?)
    }
}

#[derive(clap::Args, Debug)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub authoring: AuthoringArgs,

    #[command(flatten)]
    pub query: QueryArgs,

    /// Id of the published knowledge base
    #[arg(long, env = "QNAEVAL_KB_ID")]
    pub kb_id: String,

    /// Tester CSV (`expectedId,testQuery`) to replay
    #[arg(short, long)]
    pub file: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub authoring: AuthoringArgs,

    /// Id of the knowledge base to delete
    #[arg(long, env = "QNAEVAL_KB_ID")]
    pub kb_id: String,
}
