use std::path::PathBuf;

use chrono::Utc;
use rand::Rng;

use crate::builder::build_knowledge_base;
use crate::lifecycle::{delete_knowledge_base, fetch_endpoint_key, publish_knowledge_base};
use crate::options::RunOptions;
use crate::poll::Sleeper;
use crate::service::QnaService;
use crate::types::KbId;
use crate::verify::{AccuracyReport, verify_accuracy};

/// What a full run got done
#[derive(Debug, Default)]
pub struct RunSummary {
    /// The knowledge base created by the run, if creation succeeded
    pub kb_id: Option<KbId>,
    pub published: bool,
    /// Tester files were configured but no endpoint key was available
    pub endpoint_key_missing: bool,
    /// One entry per tester file that was replayed
    pub verifications: Vec<(PathBuf, anyhow::Result<AccuracyReport>)>,
    /// `None` if deletion was not attempted
    pub deleted: Option<bool>,
}

impl RunSummary {
    /// Every step that was reached did what it was asked to
    pub fn is_success(&self) -> bool {
        self.kb_id.is_some()
            && self.published
            && !self.endpoint_key_missing
            && self.verifications.iter().all(|(_, r)| r.is_ok())
            && self.deleted != Some(false)
    }
}

/// Build, publish, verify and (optionally) delete. Each step only runs if
/// the steps it depends on succeeded.
pub async fn run<S: QnaService + ?Sized, G: Rng + ?Sized>(
    service: &S,
    options: &RunOptions,
    sleeper: &dyn Sleeper,
    rng: &mut G,
) -> anyhow::Result<RunSummary> {
    let mut summary = RunSummary::default();

    let Some(kb_id) = build_knowledge_base(service, options, sleeper, rng).await? else {
        return Ok(summary);
    };
    summary.kb_id = Some(kb_id.clone());

    summary.published = publish_knowledge_base(service, &kb_id).await?;
    if !summary.published {
        return Ok(summary);
    }

    let test_files = options.test_files();
    if !test_files.is_empty() {
        match fetch_endpoint_key(service).await? {
            Some(endpoint_key) => {
                for test_file in test_files {
                    let report = verify_accuracy(
                        service,
                        &kb_id,
                        &endpoint_key,
                        &test_file,
                        &options.query,
                        Utc::now(),
                    )
                    .await;
                    if let Err(e) = &report {
                        tracing::error!("Verification with {} failed: {e:#}", test_file.display());
                    }
                    summary.verifications.push((test_file, report));
                }
            }
            None => {
                tracing::error!("No endpoint key, skipping verification");
                summary.endpoint_key_missing = true;
            }
        }
    }

    if options.kb_deletion {
        summary.deleted = Some(delete_knowledge_base(service, &kb_id).await?);
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{QueryOptionsBuilder, RunOptionsBuilder};
    use crate::poll::tests::InstantSleeper;
    use crate::service::Reply;
    use crate::service::fake::{Call, FakeService, candidate};
    use crate::types::EndpointKeys;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use reqwest::StatusCode;
    use std::collections::HashMap;

    fn workspace(kb_deletion: bool, use_tester_user: bool) -> (tempfile::TempDir, RunOptions) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("data.csv"),
            "id,questions,answer\n1,\"a,b,c\",X\n2,\"d\",Y\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("tester.user.csv"),
            "expectedId,testQuery\n2,d-ish\n",
        )
        .unwrap();
        let options = RunOptionsBuilder::default()
            .data_file_name("data.csv")
            .tester_user_file_name("tester.user.csv")
            .input_dir(dir.path())
            .test_query_count(1)
            .kb_deletion(kb_deletion)
            .use_tester_data(true)
            .use_tester_user(use_tester_user)
            .query(
                QueryOptionsBuilder::default()
                    .output_dir(dir.path().join("output"))
                    .silent(true)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        (dir, options)
    }

    /// Answers every held-out question of record 1 with record 1, and the
    /// user query with record 2
    fn answering_service() -> FakeService {
        let mut answers = HashMap::new();
        for q in ["a", "b", "c"] {
            answers.insert(q.to_string(), vec![candidate(1, 95.0, "a", "X")]);
        }
        answers.insert("d-ish".to_string(), vec![candidate(2, 60.0, "d", "Y")]);
        FakeService {
            answers,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn full_run_verifies_both_files_and_deletes() -> anyhow::Result<()> {
        let (_dir, options) = workspace(true, true);
        let service = answering_service();

        let summary = run(
            &service,
            &options,
            &InstantSleeper::default(),
            &mut StdRng::seed_from_u64(11),
        )
        .await?;

        assert!(summary.is_success());
        assert_eq!(summary.kb_id.as_deref(), Some("kb-123"));
        assert_eq!(summary.deleted, Some(true));
        assert_eq!(summary.verifications.len(), 2);

        let (first, report) = &summary.verifications[0];
        assert_eq!(first, &options.tester_data_path());
        let tally = report.as_ref().unwrap().tally;
        assert_eq!((tally.success_count, tally.case_count), (1, 1));

        let (second, report) = &summary.verifications[1];
        assert_eq!(second, &options.tester_user_path());
        assert_eq!(report.as_ref().unwrap().tally.success_count, 1);

        assert_eq!(service.calls().last(), Some(&Call::Delete("kb-123".into())));
        Ok(())
    }

    #[tokio::test]
    async fn failed_create_stops_the_run() -> anyhow::Result<()> {
        let (_dir, options) = workspace(true, true);
        let service = FakeService {
            create: Reply::failed(StatusCode::INTERNAL_SERVER_ERROR),
            ..Default::default()
        };

        let summary = run(
            &service,
            &options,
            &InstantSleeper::default(),
            &mut StdRng::seed_from_u64(11),
        )
        .await?;

        assert!(!summary.is_success());
        assert_eq!(summary.kb_id, None);
        assert_eq!(service.calls(), vec![Call::Create]);
        Ok(())
    }

    #[tokio::test]
    async fn failed_publish_skips_verification_and_deletion() -> anyhow::Result<()> {
        let (_dir, options) = workspace(true, true);
        let service = FakeService {
            publish_status: StatusCode::BAD_REQUEST,
            ..answering_service()
        };

        let summary = run(
            &service,
            &options,
            &InstantSleeper::default(),
            &mut StdRng::seed_from_u64(11),
        )
        .await?;

        assert!(!summary.published);
        assert_eq!(summary.deleted, None);
        assert_eq!(
            service.calls(),
            vec![
                Call::Create,
                Call::GetOperation("op-1".into()),
                Call::Publish("kb-123".into())
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn empty_endpoint_key_sends_no_queries() -> anyhow::Result<()> {
        let (_dir, options) = workspace(true, true);
        let service = FakeService {
            keys: Reply::ok(StatusCode::OK, EndpointKeys::default()),
            ..answering_service()
        };

        let summary = run(
            &service,
            &options,
            &InstantSleeper::default(),
            &mut StdRng::seed_from_u64(11),
        )
        .await?;

        assert!(!summary.is_success());
        assert!(summary.endpoint_key_missing);
        assert!(summary.verifications.is_empty());
        assert_eq!(summary.deleted, Some(true));
        assert!(
            !service
                .calls()
                .iter()
                .any(|c| matches!(c, Call::GenerateAnswer { .. }))
        );
        Ok(())
    }

    #[tokio::test]
    async fn kb_is_kept_without_deletion() -> anyhow::Result<()> {
        let (_dir, options) = workspace(false, false);
        let service = answering_service();

        let summary = run(
            &service,
            &options,
            &InstantSleeper::default(),
            &mut StdRng::seed_from_u64(11),
        )
        .await?;

        assert!(summary.is_success());
        assert_eq!(summary.deleted, None);
        assert_eq!(summary.verifications.len(), 1);
        assert!(
            !service
                .calls()
                .iter()
                .any(|c| matches!(c, Call::Delete(_)))
        );
        Ok(())
    }

    #[tokio::test]
    async fn missing_user_file_still_deletes() -> anyhow::Result<()> {
        let (dir, options) = workspace(true, true);
        std::fs::remove_file(dir.path().join("tester.user.csv"))?;
        let service = answering_service();

        let summary = run(
            &service,
            &options,
            &InstantSleeper::default(),
            &mut StdRng::seed_from_u64(11),
        )
        .await?;

        assert!(!summary.is_success());
        assert!(summary.verifications[0].1.is_ok());
        assert!(summary.verifications[1].1.is_err());
        assert_eq!(summary.deleted, Some(true));
        Ok(())
    }
}
