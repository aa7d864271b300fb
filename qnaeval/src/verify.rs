use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};

use crate::options::QueryOptions;
use crate::progress::create_case_progress;
use crate::service::QnaService;
use crate::types::{AnswerCandidate, GenerateAnswerRequest, RankerType, TestRecord};

const RESPONSE_HEADER: [&str; 8] = [
    "caseCount",
    "testQuery",
    "expectedId",
    "result",
    "responseId",
    "score",
    "responseQ",
    "responseA",
];

/// Written in the result column of a candidate carrying the expected id
const MATCH_MARKER: &str = "*";

/// Running count of test cases and of cases whose expected id came back
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub success_count: u64,
    pub case_count: u64,
}

impl Tally {
    pub fn record_case(&mut self, matched: bool) {
        self.case_count += 1;
        if matched {
            self.success_count += 1;
        }
    }

    /// Plain division; NaN when no case was recorded
    pub fn accuracy(&self) -> f64 {
        self.success_count as f64 / self.case_count as f64
    }
}

impl ::std::fmt::Display for Tally {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        write!(
            f,
            "Accuracy: {} / {} = {}",
            self.success_count,
            self.case_count,
            self.accuracy()
        )
    }
}

/// Where one verification pass writes its output
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputPaths {
    /// One row per returned answer
    pub response: PathBuf,

    /// The single accuracy line
    pub result: PathBuf,
}

fn renamed_stem(stem: &str, prefix: &str) -> String {
    match stem.strip_prefix("tester") {
        Some(rest) => format!("{prefix}{rest}"),
        None => format!("{prefix}.{stem}"),
    }
}

/// Name the outputs after the tester file, stamped with `now` so that
/// separate runs never collide
pub fn output_paths(test_file: &Path, output_dir: &Path, now: DateTime<Utc>) -> OutputPaths {
    let stem = test_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stamp = now.format("%Y-%m-%dT%H-%M-%S%.3fZ");

    OutputPaths {
        response: output_dir.join(format!("{}.{stamp}.csv", renamed_stem(&stem, "response"))),
        result: output_dir.join(format!("{}.{stamp}.txt", renamed_stem(&stem, "result"))),
    }
}

/// Response rows for one test case, and whether any answer matched
fn case_rows(
    case_number: u64,
    record: &TestRecord,
    answers: &[AnswerCandidate],
) -> (Vec<[String; 8]>, bool) {
    let mut matched = false;
    let rows = answers
        .iter()
        .enumerate()
        .map(|(idx, candidate)| {
            let is_match = candidate.id == record.expected_id;
            matched |= is_match;

            let (case, query, expected) = if idx == 0 {
                (
                    case_number.to_string(),
                    record.test_query.clone(),
                    record.expected_id.to_string(),
                )
            } else {
                Default::default()
            };

            [
                case,
                query,
                expected,
                if is_match { MATCH_MARKER } else { "" }.to_string(),
                candidate.id.to_string(),
                candidate.score.to_string(),
                candidate.questions.first().cloned().unwrap_or_default(),
                candidate.answer.clone(),
            ]
        })
        .collect();
    (rows, matched)
}

fn create_new(path: &Path) -> anyhow::Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| format!("Could not create output file {}", path.display()))
}

/// Outcome of replaying one tester file
#[derive(Debug)]
pub struct AccuracyReport {
    pub test_file: PathBuf,
    pub outputs: OutputPaths,
    pub tally: Tally,
}

/// Replay every row of `test_file` against the published knowledge base,
/// one query at a time, writing a response row per returned answer and
/// the final accuracy line
pub async fn verify_accuracy<S: QnaService + ?Sized>(
    service: &S,
    kb_id: &str,
    endpoint_key: &str,
    test_file: &Path,
    options: &QueryOptions,
    now: DateTime<Utc>,
) -> anyhow::Result<AccuracyReport> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(test_file)
        .with_context(|| format!("Could not open tester file {}", test_file.display()))?;

    ::std::fs::create_dir_all(&options.output_dir)?;
    let outputs = output_paths(test_file, &options.output_dir, now);
    let mut responses = csv::Writer::from_writer(create_new(&outputs.response)?);
    responses.write_record(RESPONSE_HEADER)?;

    let file_name = test_file
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let pb = create_case_progress(format!("Verifying {file_name}"), options.silent);
    let mut tally = Tally::default();

    for (idx, row) in rdr.deserialize::<TestRecord>().enumerate() {
        let record = row.with_context(|| {
            format!("Could not parse row {} of {}", idx + 1, test_file.display())
        })?;

        let request = GenerateAnswerRequest {
            question: record.test_query.clone(),
            top: options.top,
            score_threshold: options.score_threshold,
            is_test: true,
            ranker_type: RankerType::QuestionOnly,
        };
        let response = service
            .generate_answer(kb_id, &request, endpoint_key)
            .await?;

        // cases without any answer are not counted
        if response.answers.is_empty() {
            tracing::debug!(query = %record.test_query, "No answers returned");
            continue;
        }

        let (rows, matched) = case_rows(tally.case_count + 1, &record, &response.answers);
        for row in rows {
            responses.write_record(&row)?;
        }
        tally.record_case(matched);

        pb.inc(1);
        pb.set_message(format!(
            "{file_name} | {}/{} matched",
            tally.success_count, tally.case_count
        ));
    }
    responses.flush()?;
    pb.finish_and_clear();

    writeln!(create_new(&outputs.result)?, "{tally}")?;
    tracing::info!("{tally}");

    Ok(AccuracyReport {
        test_file: test_file.to_path_buf(),
        outputs,
        tally,
    })
}
