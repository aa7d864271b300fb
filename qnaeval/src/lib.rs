//! Build a knowledge base on a hosted question-answering service from a
//! CSV of question/answer pairs, publish it, and measure how often
//! held-out questions retrieve the record they were taken from.

pub mod types;

mod options;
pub use options::*;

pub mod service;
pub use service::{QnaMakerClient, QnaService};

mod poll;
pub use poll::{PollOutcome, Sleeper, TokioSleeper, wait_for_operation};

pub mod builder;
pub use builder::build_knowledge_base;

mod lifecycle;
pub use lifecycle::*;

mod progress;

pub mod verify;
pub use verify::{AccuracyReport, Tally, verify_accuracy};

mod run;
pub use run::{RunSummary, run};
