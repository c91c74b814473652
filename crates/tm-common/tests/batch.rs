use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use tm_common::model::{CandidateSkill, RecordKind, Requirement, SkillLevel};
use tm_common::{
    AlgorithmKind, BatchConfig, BatchControl, BatchRanker, BulkOptions, Candidate,
    CancellationPolicy, Job, MatchError, MatchingService,
};
use tokio_util::sync::CancellationToken;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap()
}

fn ranker() -> BatchRanker {
    let config = BatchConfig {
        worker_threads: Some(3),
        ..BatchConfig::default()
    };
    BatchRanker::new(MatchingService::default(), config).unwrap()
}

fn job(id: &str, skills: &[&str]) -> Job {
    Job {
        id: id.into(),
        title: "Platform Engineer".into(),
        requirements: skills
            .iter()
            .map(|name| Requirement {
                skill: (*name).into(),
                level: Some(SkillLevel::Intermediate),
                required: true,
                years_experience: 2.0,
            })
            .collect(),
        ..Job::default()
    }
}

fn candidate(id: &str, skills: &[&str]) -> Candidate {
    Candidate {
        id: id.into(),
        skills: skills
            .iter()
            .map(|name| CandidateSkill {
                name: (*name).into(),
                level: Some(SkillLevel::Advanced),
                years_experience: 4.0,
            })
            .collect(),
        ..Candidate::default()
    }
}

fn ids<E>(entries: &[tm_common::RankedEntry<E>], id: impl Fn(&E) -> &str) -> Vec<String> {
    entries.iter().map(|e| id(&e.entity).to_string()).collect()
}

#[test]
fn ties_keep_input_order_across_worker_threads() {
    let job = job("j", &["Go", "Terraform"]);
    let pool: Vec<Candidate> = (0..40)
        .map(|i| {
            // every third candidate is strong, the rest tie at a lower score
            if i % 3 == 0 {
                candidate(&format!("c{i:02}"), &["Go", "Terraform"])
            } else {
                candidate(&format!("c{i:02}"), &["Go"])
            }
        })
        .collect();

    let ranking = ranker()
        .rank_candidates_at(&job, &pool, Some(40), AlgorithmKind::SkillBased, &BatchControl::default(), now())
        .unwrap();

    let order = ids(&ranking.matches, |c| &c.id);
    let mut expected: Vec<String> = (0..40).filter(|i| i % 3 == 0).map(|i| format!("c{i:02}")).collect();
    expected.extend((0..40).filter(|i| i % 3 != 0).map(|i| format!("c{i:02}")));
    assert_eq!(order, expected);

    // same input, same ranking
    let again = ranker()
        .rank_candidates_at(&job, &pool, Some(40), AlgorithmKind::SkillBased, &BatchControl::default(), now())
        .unwrap();
    assert_eq!(ids(&again.matches, |c| &c.id), order);
}

#[test]
fn default_limit_comes_from_config() {
    let job = job("j", &["Go"]);
    let pool: Vec<Candidate> = (0..15).map(|i| candidate(&format!("c{i}"), &["Go"])).collect();

    let ranking = ranker()
        .rank_candidates(&job, &pool, None, AlgorithmKind::SkillBased, &BatchControl::default())
        .unwrap();

    assert_eq!(ranking.matches.len(), 10);
    assert_eq!(ranking.total_count, 15);
}

#[test]
fn failing_pair_is_reported_and_the_rest_ranked() {
    let job = job("j", &["Go"]);
    let mut broken = candidate("c1", &["Go"]);
    broken.skills[0].years_experience = -2.0;
    let pool = vec![candidate("c0", &["Go"]), broken, candidate("c2", &[])];

    let ranking = ranker()
        .rank_candidates(&job, &pool, Some(5), AlgorithmKind::AiHybrid, &BatchControl::default())
        .unwrap();

    assert_eq!(ids(&ranking.matches, |c| &c.id), vec!["c0", "c2"]);
    assert_eq!(ranking.errors.len(), 1);
    assert_eq!(ranking.errors[0].index, 1);
    assert_eq!(ranking.errors[0].id.as_deref(), Some("c1"));
    assert_eq!(ranking.errors[0].record, RecordKind::Candidate);
    assert_eq!(ranking.errors[0].code, "MALFORMED_INPUT");
    assert!(!ranking.is_complete());
    assert!(!ranking.cancelled);
}

#[test]
fn invalid_subject_fails_the_whole_call() {
    let job = job("  ", &["Go"]);
    let pool = vec![candidate("c0", &["Go"])];

    let err = ranker()
        .rank_candidates(&job, &pool, None, AlgorithmKind::AiHybrid, &BatchControl::default())
        .unwrap_err();
    assert!(matches!(err, MatchError::MalformedInput { record: "job", .. }));
}

#[test]
fn raw_records_decode_one_by_one() {
    let job = job("j", &["Go"]);
    let records = vec![
        json!({"id": "c0", "skills": [{"name": "Go", "level": "expert", "yearsExperience": 5}]}),
        json!({"id": 17, "skills": "not-a-list"}),
        json!({"id": 18, "skills": []}),
    ];

    let ranking = ranker()
        .rank_candidate_records(&job, records, None, AlgorithmKind::SkillBased, &BatchControl::default())
        .unwrap();

    assert_eq!(ranking.total_count, 3);
    assert_eq!(ids(&ranking.matches, |c| &c.id), vec!["c0", "18"]);
    assert_eq!(ranking.errors.len(), 1);
    assert_eq!(ranking.errors[0].index, 1);
    assert_eq!(ranking.errors[0].id.as_deref(), Some("17"));
}

#[test]
fn loosely_labelled_records_are_ranked_not_rejected() {
    let job = job("j", &["Go"]);
    let records = vec![
        json!({
            "id": "c0",
            "skills": [{"name": "Go", "level": "Proficient", "yearsExperience": 3}],
            "preferences": {"remotePreference": "Hybrid"}
        }),
        json!({
            "id": "c1",
            "skills": [{"name": "GO", "level": "ADVANCED", "yearsExperience": 3}],
            "preferences": {"remotePreference": "REMOTE_FIRST"}
        }),
    ];

    let ranking = ranker()
        .rank_candidate_records(&job, records, None, AlgorithmKind::AiHybrid, &BatchControl::default())
        .unwrap();

    assert!(ranking.errors.is_empty(), "{:?}", ranking.errors);
    assert_eq!(ranking.matches.len(), 2);
    // an unknown level reads as beginner against the intermediate requirement
    let c0 = ranking.matches.iter().find(|m| m.entity.id == "c0").unwrap();
    assert_eq!(c0.entity.skills[0].level, None);
    assert!(ranking.matches[0].result.score >= ranking.matches[1].result.score);
    assert_eq!(ranking.matches[0].entity.id, "c1");
}

#[test]
fn cancelled_token_returns_partial_by_default() {
    let job = job("j", &["Go"]);
    let pool: Vec<Candidate> = (0..5).map(|i| candidate(&format!("c{i}"), &["Go"])).collect();
    let token = CancellationToken::new();
    token.cancel();

    let ranking = ranker()
        .rank_candidates(
            &job,
            &pool,
            None,
            AlgorithmKind::AiHybrid,
            &BatchControl::default().with_cancel(token),
        )
        .unwrap();

    assert!(ranking.cancelled);
    assert_eq!(ranking.skipped, 5);
    assert!(ranking.matches.is_empty());
    assert!(ranking.errors.is_empty());
}

#[test]
fn fail_batch_policy_turns_cancellation_into_error() {
    let job = job("j", &["Go"]);
    let pool: Vec<Candidate> = (0..4).map(|i| candidate(&format!("c{i}"), &["Go"])).collect();
    let token = CancellationToken::new();
    token.cancel();
    let control = BatchControl::default()
        .with_cancel(token)
        .with_policy(CancellationPolicy::FailBatch);

    let err = ranker()
        .rank_candidates(&job, &pool, None, AlgorithmKind::AiHybrid, &control)
        .unwrap_err();
    assert_eq!(err, MatchError::Cancelled { completed: 0, total: 4 });
    assert_eq!(err.code(), "CANCELLED");
}

#[test]
fn jobs_ranked_for_a_candidate() {
    let person = candidate("c", &["Go", "Terraform", "Kubernetes"]);
    let jobs = vec![
        job("narrow", &["Go", "Rust", "Haskell"]),
        job("exact", &["Go", "Terraform", "Kubernetes"]),
        job("half", &["Go", "Rust"]),
    ];

    let ranking = ranker()
        .rank_jobs_at(&person, &jobs, Some(2), AlgorithmKind::SkillBased, &BatchControl::default(), now())
        .unwrap();

    assert_eq!(ids(&ranking.matches, |j| &j.id), vec!["exact", "half"]);
    assert_eq!(ranking.subject.id, "c");
    assert_eq!(ranking.matches[0].result.score, 100);
}

#[test]
fn raw_job_records_skip_malformed_entries() {
    let person = candidate("c", &["Go"]);
    let records = vec![
        json!({"id": "j0", "requirements": [{"skill": "Go", "required": true}]}),
        json!({"title": "no id"}),
    ];

    let ranking = ranker()
        .rank_job_records(&person, records, None, AlgorithmKind::SkillBased, &BatchControl::default())
        .unwrap();

    assert_eq!(ranking.matches.len(), 1);
    assert_eq!(ranking.errors.len(), 1);
    assert_eq!(ranking.errors[0].id, None);
    assert_eq!(ranking.errors[0].record, RecordKind::Job);
}

#[test]
fn bulk_lists_only_qualified_candidates() {
    let jobs = vec![
        job("go-job", &["Go"]),
        job("cobol-job", &["COBOL", "JCL"]),
        job("", &["Go"]),
    ];
    let candidates = vec![
        candidate("c0", &["Go"]),
        candidate("c1", &["Python"]),
        candidate("c2", &["Go", "Python"]),
    ];
    let options = BulkOptions {
        threshold: 60,
        per_job_limit: 1,
    };

    let bulk = ranker()
        .bulk_match(&jobs, &candidates, AlgorithmKind::SkillBased, options, &BatchControl::default())
        .unwrap();

    assert_eq!(bulk.results.len(), 1);
    let go = &bulk.results[0];
    assert_eq!(go.job.id, "go-job");
    assert_eq!(go.total_qualified, 1);
    assert_eq!(go.matches[0].entity.id, "c0");

    assert_eq!(bulk.summary.total_jobs, 3);
    assert_eq!(bulk.summary.jobs_with_matches, 1);
    assert_eq!(bulk.summary.total_candidates, 3);
    assert_eq!(bulk.summary.threshold, 60);
    assert_eq!(bulk.errors.len(), 1);
    assert_eq!(bulk.errors[0].index, 2);
    assert_eq!(bulk.errors[0].record, RecordKind::Job);
    assert!(!bulk.cancelled);

    let json = serde_json::to_value(&bulk).unwrap();
    assert_eq!(json["summary"]["jobsWithMatches"], 1);
    assert_eq!(json["summary"]["algorithm"], "skill-based");
    assert_eq!(json["results"][0]["totalQualified"], 1);
    assert!(json["results"][0]["matches"][0]["match"]["score"].is_number());
    assert_eq!(json["errors"][0]["record"], "job");
}

#[test]
fn bulk_stops_when_cancelled() {
    let jobs = vec![job("a", &["Go"]), job("b", &["Go"])];
    let candidates = vec![candidate("c0", &["Go"])];
    let token = CancellationToken::new();
    token.cancel();

    let partial = ranker()
        .bulk_match(
            &jobs,
            &candidates,
            AlgorithmKind::AiHybrid,
            BulkOptions::default(),
            &BatchControl::default().with_cancel(token.clone()),
        )
        .unwrap();
    assert!(partial.cancelled);
    assert!(partial.results.is_empty());

    let err = ranker()
        .bulk_match(
            &jobs,
            &candidates,
            AlgorithmKind::AiHybrid,
            BulkOptions::default(),
            &BatchControl::default()
                .with_cancel(token)
                .with_policy(CancellationPolicy::FailBatch),
        )
        .unwrap_err();
    assert!(matches!(err, MatchError::Cancelled { completed: 0, total: 2 }));
}
