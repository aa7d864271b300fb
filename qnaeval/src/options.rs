use std::path::PathBuf;
use std::time::Duration;

/// How to wait for an asynchronous service operation
#[derive(Clone, Debug)]
pub struct PollOptions {
    /// Delay between two status requests
    pub interval: Duration,

    /// Give up after this many non-terminal status replies
    pub max_attempts: usize,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 600,
        }
    }
}

/// Settings for replaying a tester file against a published knowledge base
#[derive(Clone, Debug, derive_builder::Builder)]
pub struct QueryOptions {
    /// Number of answers requested per query
    #[builder(default = "3")]
    pub top: u32,

    /// Minimum score of returned answers
    #[builder(default)]
    pub score_threshold: f64,

    /// Directory receiving the response and result files
    #[builder(setter(into), default = "\"output\".into()")]
    pub output_dir: PathBuf,

    /// No progress display
    #[builder(default)]
    pub silent: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptionsBuilder::default().build().unwrap()
    }
}

/// Settings of one full build/publish/verify/delete run
#[derive(Clone, Debug, derive_builder::Builder)]
pub struct RunOptions {
    /// File name of the source CSV, relative to `input_dir`
    #[builder(setter(into))]
    pub data_file_name: String,

    /// File name of the user-authored tester CSV, relative to `input_dir`
    #[builder(setter(into))]
    pub tester_user_file_name: String,

    #[builder(setter(into), default = "\"input\".into()")]
    pub input_dir: PathBuf,

    #[builder(setter(into), default = "\"tmp-kb\".to_string()")]
    pub kb_name: String,

    #[builder(setter(into), default = "\"Japanese\".to_string()")]
    pub language: String,

    /// Questions held out of each record that has more than this many
    pub test_query_count: usize,

    /// Delete the knowledge base at the end of the run
    #[builder(default)]
    pub kb_deletion: bool,

    /// Verify with the tester file generated while building
    #[builder(default)]
    pub use_tester_data: bool,

    /// Verify with the user-authored tester file
    #[builder(default)]
    pub use_tester_user: bool,

    #[builder(default)]
    pub poll: PollOptions,

    #[builder(default)]
    pub query: QueryOptions,
}

impl RunOptions {
    pub fn data_path(&self) -> PathBuf {
        self.input_dir.join(&self.data_file_name)
    }

    /// The tester file generated alongside the knowledge base
    pub fn tester_data_path(&self) -> PathBuf {
        self.input_dir.join(format!("tester.{}", self.data_file_name))
    }

    pub fn tester_user_path(&self) -> PathBuf {
        self.input_dir.join(&self.tester_user_file_name)
    }

    /// Tester files to verify against, in order
    pub fn test_files(&self) -> Vec<PathBuf> {
        let mut files = vec![];
        if self.use_tester_data {
            files.push(self.tester_data_path());
        }
        if self.use_tester_user {
            files.push(self.tester_user_path());
        }
        files
    }
}
