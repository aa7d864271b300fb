use std::process::ExitCode;

use chrono::Utc;
use qnaeval::{QnaMakerClient, RunSummary, TokioSleeper, fetch_endpoint_key};

use crate::args::{DeleteArgs, RunArgs, VerifyArgs};

fn exit_code(ok: bool) -> ExitCode {
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn report(summary: &RunSummary) {
    match &summary.kb_id {
        Some(kb_id) if summary.deleted == Some(true) => {
            eprintln!("Knowledge base {kb_id} was deleted")
        }
        Some(kb_id) => eprintln!("Knowledge base {kb_id} is still alive on the service"),
        None => eprintln!("No knowledge base was created"),
    }
    for (file, result) in &summary.verifications {
        match result {
            Ok(r) => eprintln!(
                "{}: {} (responses in {})",
                file.display(),
                r.tally,
                r.outputs.response.display()
            ),
            Err(e) => eprintln!("{}: failed: {e:#}", file.display()),
        }
    }
}

pub async fn run(args: RunArgs) -> anyhow::Result<ExitCode> {
    let options = args.options()?;
    let client = QnaMakerClient::new(
        &args.authoring.cognitive_services_name,
        &args.query.qnamaker_app_name,
        args.authoring.authoring_key.as_str(),
    );

    let summary = qnaeval::run(&client, &options, &TokioSleeper, &mut rand::rng()).await?;
    report(&summary);
    Ok(exit_code(summary.is_success()))
}

pub async fn verify(args: VerifyArgs) -> anyhow::Result<ExitCode> {
    let options = args.query.options()?;
    let client = QnaMakerClient::new(
        &args.authoring.cognitive_services_name,
        &args.query.qnamaker_app_name,
        args.authoring.authoring_key.as_str(),
    );

    let Some(endpoint_key) = fetch_endpoint_key(&client).await? else {
        return Ok(ExitCode::FAILURE);
    };
    let r = qnaeval::verify_accuracy(
        &client,
        &args.kb_id,
        &endpoint_key,
        &args.file,
        &options,
        Utc::now(),
    )
    .await?;
    eprintln!("Responses written to {}", r.outputs.response.display());
    eprintln!("Result written to {}", r.outputs.result.display());
    Ok(ExitCode::SUCCESS)
}

pub async fn delete(args: DeleteArgs) -> anyhow::Result<ExitCode> {
    let client = QnaMakerClient::authoring_only(
        &args.authoring.cognitive_services_name,
        args.authoring.authoring_key.as_str(),
    );
    Ok(exit_code(
        qnaeval::delete_knowledge_base(&client, &args.kb_id).await?,
    ))
}
