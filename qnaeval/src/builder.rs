use std::fs::File;
use std::io::{Read, Write};

use anyhow::Context;
use rand::Rng;

use crate::options::RunOptions;
use crate::poll::{PollOutcome, Sleeper, wait_for_operation};
use crate::service::QnaService;
use crate::types::{CreateKbPayload, KbId, OperationState, SourceRecord, SourceRow, TestRecord};

/// Remove `count` uniformly chosen questions from `questions` and return
/// them, but only when more than `count` questions are present
pub fn sample_held_out<R: Rng + ?Sized>(
    questions: &mut Vec<String>,
    count: usize,
    rng: &mut R,
) -> Vec<String> {
    if questions.len() <= count {
        return vec![];
    }
    (0..count)
        .map(|_| questions.remove(rng.random_range(0..questions.len())))
        .collect()
}

/// Stream source rows from `source`, holding out test questions into
/// `tester` as we go, and return the records to register
pub fn prepare_records<R: Read, W: Write, G: Rng + ?Sized>(
    source: R,
    tester: W,
    test_query_count: usize,
    rng: &mut G,
) -> anyhow::Result<Vec<SourceRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(source);
    // header written by hand so it is present even when nothing is held out
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(tester);
    wtr.write_record(["expectedId", "testQuery"])?;

    let mut records = vec![];
    for (idx, row) in rdr.deserialize::<SourceRow>().enumerate() {
        let mut record = SourceRecord::from(
            row.with_context(|| format!("Could not parse source row {}", idx + 1))?,
        );

        if record.answer.is_empty() {
            tracing::warn!(id = record.id, "Empty answer");
        }
        if record.questions.iter().any(String::is_empty) {
            tracing::warn!(id = record.id, "Empty question");
        }

        for test_query in sample_held_out(&mut record.questions, test_query_count, rng) {
            wtr.serialize(TestRecord {
                expected_id: record.id,
                test_query,
            })?;
        }
        records.push(record);
    }
    wtr.flush()?;

    Ok(records)
}

/// Pull the knowledge base id out of a `.../knowledgebases/{id}` location
pub fn kb_id_from_location(location: &str) -> Option<KbId> {
    location
        .rsplit_once("/knowledgebases/")
        .map(|(_, id)| id.trim_matches('/'))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Create the knowledge base from the source CSV, writing the generated
/// tester file along the way. Returns `None` if the service did not end up
/// with a knowledge base.
pub async fn build_knowledge_base<S: QnaService + ?Sized, G: Rng + ?Sized>(
    service: &S,
    options: &RunOptions,
    sleeper: &dyn Sleeper,
    rng: &mut G,
) -> anyhow::Result<Option<KbId>> {
    let data_path = options.data_path();
    let tester_path = options.tester_data_path();
    let source = File::open(&data_path)
        .with_context(|| format!("Could not open source CSV {}", data_path.display()))?;
    let tester = File::create(&tester_path)
        .with_context(|| format!("Could not create tester file {}", tester_path.display()))?;

    let qna_list = prepare_records(source, tester, options.test_query_count, rng)?;
    tracing::info!(
        records = qna_list.len(),
        "Loaded {} and wrote {}",
        data_path.display(),
        tester_path.display()
    );

    let reply = service
        .create_knowledge_base(&CreateKbPayload {
            name: options.kb_name.clone(),
            qna_list,
            language: options.language.clone(),
        })
        .await?;
    let Some(operation) = reply.body.filter(|_| reply.status.is_success()) else {
        tracing::error!("Create request failed - HTTP status {}", reply.status);
        return Ok(None);
    };

    match wait_for_operation(
        service,
        &operation.operation_id,
        &options.poll,
        sleeper,
    )
    .await?
    {
        PollOutcome::Finished(op) if op.operation_state == OperationState::Succeeded => {
            match op.resource_location.as_deref().and_then(kb_id_from_location) {
                Some(kb_id) => {
                    tracing::info!("Created knowledge base {kb_id}");
                    Ok(Some(kb_id))
                }
                None => {
                    tracing::error!("Create operation succeeded without a knowledge base location");
                    Ok(None)
                }
            }
        }
        PollOutcome::Finished(op) => {
            tracing::error!("Create operation state failed - {}", op.operation_state);
            Ok(None)
        }
        PollOutcome::Rejected(status) => {
            tracing::error!("Create operation state failed - HTTP status {status}");
            Ok(None)
        }
        PollOutcome::TimedOut { attempts, last } => {
            tracing::error!("Create operation still {last} after {attempts} polls, giving up");
            Ok(None)
        }
    }
}
