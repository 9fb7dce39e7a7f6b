//! Remote-with-fallback orchestration.
//!
//! [`AssessmentService`] prefers a remote source when one is configured,
//! retrying transient failures with exponential backoff and validating the
//! payload shape before trusting it. Anything that goes wrong ends in the
//! deterministic source, so every call produces a usable result.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use tokio::sync::Semaphore;

use crate::calibration::{CalibrationStore, ReviewerCalibration};
use crate::engine::Evaluator;
use crate::error::SourceError;
use crate::model::{Assessment, Question};
use crate::report::Report;
use crate::synthesis::{regenerate_question, synthesize_assessment};
use crate::traits::{AssessmentSource, Submission};
use crate::validate::{
    has_errors, validate_assessment, validate_question, validate_report, ValidationIssue,
};

/// Upper bound for a single backoff sleep.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Retry and concurrency settings.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Retries after the first failed remote attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub retry_delay: Duration,
    /// Maximum concurrent evaluations in [`AssessmentService::evaluate_many`].
    pub parallelism: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(350),
            parallelism: 4,
        }
    }
}

/// Which source produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Remote,
    Deterministic,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::Remote => write!(f, "remote"),
            Origin::Deterministic => write!(f, "deterministic"),
        }
    }
}

/// A value tagged with the source that produced it.
#[derive(Debug, Clone)]
pub struct Sourced<T> {
    pub value: T,
    pub origin: Origin,
}

impl<T> Sourced<T> {
    fn remote(value: T) -> Self {
        Self {
            value,
            origin: Origin::Remote,
        }
    }

    fn deterministic(value: T) -> Self {
        Self {
            value,
            origin: Origin::Deterministic,
        }
    }
}

/// The pure in-process source. Never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeterministicSource;

#[async_trait]
impl AssessmentSource for DeterministicSource {
    fn name(&self) -> &str {
        "deterministic"
    }

    async fn generate(&self, subject: &str) -> Result<Assessment> {
        Ok(synthesize_assessment(subject))
    }

    async fn evaluate(
        &self,
        submission: &Submission,
        calibration: Option<&ReviewerCalibration>,
    ) -> Result<Report> {
        Ok(Evaluator::new(submission.candidate_id.as_str()).evaluate(
            &submission.assessment,
            &submission.answers,
            calibration,
        ))
    }

    async fn regenerate(&self, assessment: &Assessment, question_id: &str) -> Result<Option<Question>> {
        Ok(regenerate_question(assessment, question_id))
    }
}

/// Turn error-severity issues into a permanent payload error.
fn ensure_valid(issues: Vec<ValidationIssue>) -> Result<()> {
    if !has_errors(&issues) {
        return Ok(());
    }
    let summary = issues
        .iter()
        .map(|i| match &i.question_id {
            Some(id) => format!("{id}: {}", i.message),
            None => i.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ");
    Err(SourceError::MalformedPayload(summary).into())
}

/// Remote-first assessment service with a deterministic backstop.
pub struct AssessmentService {
    remote: Option<Arc<dyn AssessmentSource>>,
    fallback: DeterministicSource,
    config: ServiceConfig,
}

impl AssessmentService {
    pub fn new(remote: Option<Arc<dyn AssessmentSource>>, config: ServiceConfig) -> Self {
        Self {
            remote,
            fallback: DeterministicSource,
            config,
        }
    }

    /// A service that only ever uses the deterministic source.
    pub fn deterministic() -> Self {
        Self::new(None, ServiceConfig::default())
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Name of the preferred source.
    pub fn source_name(&self) -> &str {
        match &self.remote {
            Some(remote) => remote.name(),
            None => self.fallback.name(),
        }
    }

    /// Run `call` until it succeeds, a permanent error occurs, or retries run out.
    async fn with_retries<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;
        let mut retry_delay = self.config.retry_delay;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tokio::time::sleep(retry_delay).await;
                retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
            }
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let source_error = e.downcast_ref::<SourceError>();
                    let permanent = source_error.is_some_and(SourceError::is_permanent);
                    if let Some(ms) = source_error.and_then(SourceError::retry_after_ms) {
                        retry_delay = Duration::from_millis(ms).min(MAX_RETRY_DELAY);
                    }
                    tracing::debug!(operation, attempt, permanent, "remote attempt failed: {e:#}");
                    last_error = Some(e);
                    if permanent {
                        break;
                    }
                }
            }
        }
        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("no attempts were made")))
    }

    /// Synthesize an assessment for `subject`.
    pub async fn generate(&self, subject: &str) -> Sourced<Assessment> {
        if let Some(remote) = self.remote.as_deref() {
            let result = self
                .with_retries("generate", move || async move {
                    let assessment = remote.generate(subject).await?;
                    ensure_valid(validate_assessment(&assessment))?;
                    Ok(assessment)
                })
                .await;
            match result {
                Ok(assessment) => return Sourced::remote(assessment),
                Err(e) => tracing::warn!(
                    source = remote.name(),
                    subject,
                    "remote generation failed, using deterministic fallback: {e:#}"
                ),
            }
        }
        Sourced::deterministic(synthesize_assessment(subject))
    }

    /// Evaluate one submission.
    pub async fn evaluate(
        &self,
        submission: &Submission,
        calibration: Option<&ReviewerCalibration>,
    ) -> Sourced<Report> {
        if let Some(remote) = self.remote.as_deref() {
            let result = self
                .with_retries("evaluate", move || async move {
                    let report = remote.evaluate(submission, calibration).await?;
                    ensure_valid(validate_report(&report, &submission.assessment))?;
                    Ok(report)
                })
                .await;
            match result {
                Ok(report) => return Sourced::remote(report),
                Err(e) => tracing::warn!(
                    source = remote.name(),
                    assessment = %submission.assessment.id,
                    "remote evaluation failed, using deterministic fallback: {e:#}"
                ),
            }
        }
        Sourced::deterministic(
            Evaluator::new(submission.candidate_id.as_str()).evaluate(
                &submission.assessment,
                &submission.answers,
                calibration,
            ),
        )
    }

    /// Regenerate one question; `None` if the assessment has no such question.
    pub async fn regenerate(
        &self,
        assessment: &Assessment,
        question_id: &str,
    ) -> Option<Sourced<Question>> {
        let original = assessment.question(question_id)?;
        if let Some(remote) = self.remote.as_deref() {
            let result = self
                .with_retries("regenerate", move || async move {
                    let question = remote
                        .regenerate(assessment, question_id)
                        .await?
                        .ok_or_else(|| {
                            SourceError::MalformedPayload(format!(
                                "no question returned for {question_id}"
                            ))
                        })?;
                    ensure_valid(validate_question(&question, original))?;
                    Ok(question)
                })
                .await;
            match result {
                Ok(question) => return Some(Sourced::remote(question)),
                Err(e) => tracing::warn!(
                    source = remote.name(),
                    question_id,
                    "remote regeneration failed, using deterministic fallback: {e:#}"
                ),
            }
        }
        regenerate_question(assessment, question_id).map(Sourced::deterministic)
    }

    /// Evaluate independent submissions concurrently.
    ///
    /// Each submission reads an immutable snapshot of its subject's
    /// calibration before scoring starts. Results are returned in input order.
    pub async fn evaluate_many(
        &self,
        submissions: &[Submission],
        calibrations: &CalibrationStore,
    ) -> Vec<Sourced<Report>> {
        let semaphore = Semaphore::new(self.config.parallelism.max(1));
        let semaphore = &semaphore;
        let mut futures = FuturesUnordered::new();

        for (index, submission) in submissions.iter().enumerate() {
            let calibration = calibrations.snapshot(&submission.assessment.subject);
            futures.push(async move {
                // the semaphore is never closed
                let _permit = semaphore.acquire().await.ok();
                let report = self.evaluate(submission, Some(&calibration)).await;
                (index, report)
            });
        }

        let mut results = Vec::with_capacity(submissions.len());
        while let Some(result) = futures.next().await {
            results.push(result);
        }
        results.sort_by_key(|(index, _)| *index);
        tracing::info!(count = results.len(), "batch evaluated");
        results.into_iter().map(|(_, report)| report).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    use crate::model::{CandidateAnswer, QuestionKind};

    /// Fails a fixed number of times, then answers like the deterministic source
    /// with a recognizable title.
    struct FlakySource {
        calls: AtomicU32,
        failures: u32,
        error: fn() -> SourceError,
    }

    impl FlakySource {
        fn new(failures: u32, error: fn() -> SourceError) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures,
                error,
            }
        }

        fn attempt(&self) -> Result<()> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err((self.error)().into())
            } else {
                Ok(())
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AssessmentSource for FlakySource {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn generate(&self, subject: &str) -> Result<Assessment> {
            self.attempt()?;
            let mut assessment = synthesize_assessment(subject);
            assessment.title = "Remote".into();
            Ok(assessment)
        }

        async fn evaluate(
            &self,
            submission: &Submission,
            calibration: Option<&ReviewerCalibration>,
        ) -> Result<Report> {
            self.attempt()?;
            let mut report = DeterministicSource.evaluate(submission, calibration).await?;
            report.candidate_id = "remote".into();
            Ok(report)
        }

        async fn regenerate(
            &self,
            assessment: &Assessment,
            question_id: &str,
        ) -> Result<Option<Question>> {
            self.attempt()?;
            Ok(regenerate_question(assessment, question_id))
        }
    }

    /// Answers promptly with payloads of the wrong shape.
    struct MisshapenSource;

    #[async_trait]
    impl AssessmentSource for MisshapenSource {
        fn name(&self) -> &str {
            "misshapen"
        }

        async fn generate(&self, subject: &str) -> Result<Assessment> {
            let mut assessment = synthesize_assessment(subject);
            assessment.questions.clear();
            Ok(assessment)
        }

        async fn evaluate(
            &self,
            submission: &Submission,
            _calibration: Option<&ReviewerCalibration>,
        ) -> Result<Report> {
            let mut report = DeterministicSource.evaluate(submission, None).await?;
            report.evaluations[0].score = 42;
            Ok(report)
        }

        async fn regenerate(
            &self,
            assessment: &Assessment,
            question_id: &str,
        ) -> Result<Option<Question>> {
            let mut question = regenerate_question(assessment, question_id);
            if let Some(q) = question.as_mut() {
                q.kind = QuestionKind::Coding;
            }
            Ok(question)
        }
    }

    fn fast_config(max_retries: u32) -> ServiceConfig {
        ServiceConfig {
            max_retries,
            retry_delay: Duration::from_millis(100),
            parallelism: 2,
        }
    }

    fn submission(subject: &str) -> Submission {
        let assessment = synthesize_assessment(subject);
        let answers = assessment
            .questions
            .iter()
            .map(|q| {
                let mut a = CandidateAnswer::empty(&q.id);
                a.selected_option_id = q.correct_option_id.clone();
                a
            })
            .collect();
        Submission {
            candidate_id: "candidate-7".into(),
            assessment,
            answers,
        }
    }

    #[tokio::test]
    async fn deterministic_only() {
        let service = AssessmentService::deterministic();
        assert!(!service.has_remote());
        assert_eq!(service.source_name(), "deterministic");
        let generated = service.generate("Computer Science").await;
        assert_eq!(generated.origin, Origin::Deterministic);
        assert_eq!(generated.value.questions.len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried_with_backoff() {
        let remote = Arc::new(FlakySource::new(2, || SourceError::Timeout(22)));
        let service = AssessmentService::new(Some(remote.clone()), fast_config(3));

        let start = tokio::time::Instant::now();
        let generated = service.generate("Machine Learning").await;
        assert_eq!(generated.origin, Origin::Remote);
        assert_eq!(generated.value.title, "Remote");
        assert_eq!(remote.calls(), 3);
        // 100ms + 200ms
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_fall_back() {
        let remote = Arc::new(FlakySource::new(u32::MAX, || SourceError::NetworkError(
            "connection reset".into(),
        )));
        let service = AssessmentService::new(Some(remote.clone()), fast_config(3));

        let start = tokio::time::Instant::now();
        let generated = service.generate("System Design").await;
        assert_eq!(generated.origin, Origin::Deterministic);
        assert_eq!(generated.value.questions.len(), 8);
        assert_eq!(remote.calls(), 4);
        assert_eq!(start.elapsed(), Duration::from_millis(700));
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_errors_are_not_retried() {
        let remote = Arc::new(FlakySource::new(u32::MAX, || {
            SourceError::AuthenticationFailed("bad key".into())
        }));
        let service = AssessmentService::new(Some(remote.clone()), fast_config(3));
        let generated = service.generate("Computer Science").await;
        assert_eq!(generated.origin, Origin::Deterministic);
        assert_eq!(remote.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_hint_overrides_delay() {
        let remote = Arc::new(FlakySource::new(1, || SourceError::RateLimited {
            retry_after_ms: 5_000,
        }));
        let service = AssessmentService::new(Some(remote.clone()), fast_config(3));

        let start = tokio::time::Instant::now();
        let generated = service.generate("Computer Science").await;
        assert_eq!(generated.origin, Origin::Remote);
        assert_eq!(start.elapsed(), Duration::from_millis(5_000));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_hint_is_capped() {
        let remote = Arc::new(FlakySource::new(1, || SourceError::RateLimited {
            retry_after_ms: 3_600_000,
        }));
        let service = AssessmentService::new(Some(remote.clone()), fast_config(1));

        let start = tokio::time::Instant::now();
        let generated = service.generate("Computer Science").await;
        assert_eq!(generated.origin, Origin::Remote);
        assert_eq!(remote.calls(), 2);
        assert_eq!(start.elapsed(), MAX_RETRY_DELAY);
    }

    #[tokio::test]
    async fn malformed_payloads_fall_back_without_retry() {
        let service = AssessmentService::new(Some(Arc::new(MisshapenSource)), fast_config(3));

        let generated = service.generate("Computer Science").await;
        assert_eq!(generated.origin, Origin::Deterministic);
        assert_eq!(generated.value.questions.len(), 10);

        let sub = submission("Computer Science");
        let report = service.evaluate(&sub, None).await;
        assert_eq!(report.origin, Origin::Deterministic);
        assert!(report.value.evaluations.iter().all(|e| e.score <= 10));
        assert_eq!(report.value.candidate_id, "candidate-7");

        let regenerated = service
            .regenerate(&sub.assessment, "q-1")
            .await
            .unwrap();
        assert_eq!(regenerated.origin, Origin::Deterministic);
        assert_eq!(regenerated.value.kind, QuestionKind::Mcq);
    }

    #[tokio::test]
    async fn remote_results_are_used_when_valid() {
        let remote = Arc::new(FlakySource::new(0, || SourceError::Timeout(1)));
        let service = AssessmentService::new(Some(remote), fast_config(0));
        let sub = submission("Computer Science");

        let report = service.evaluate(&sub, None).await;
        assert_eq!(report.origin, Origin::Remote);
        assert_eq!(report.value.candidate_id, "remote");

        let question = service.regenerate(&sub.assessment, "q-3").await.unwrap();
        assert_eq!(question.origin, Origin::Remote);
        assert!(question.value.estimated_seconds > sub.assessment.questions[2].estimated_seconds);
    }

    #[tokio::test]
    async fn regenerate_unknown_question_skips_remote() {
        let remote = Arc::new(FlakySource::new(0, || SourceError::Timeout(1)));
        let service = AssessmentService::new(Some(remote.clone()), fast_config(0));
        let assessment = synthesize_assessment("Computer Science");
        assert!(service.regenerate(&assessment, "q-404").await.is_none());
        assert_eq!(remote.calls(), 0);
    }

    #[tokio::test]
    async fn evaluate_many_keeps_order_and_uses_per_subject_calibration() {
        let calibrations = CalibrationStore::new();
        let mut low = ReviewerCalibration::new("Computer Science");
        low.adjustment_factor = 0.7;
        calibrations.insert(low);

        let submissions = vec![
            submission("Computer Science"),
            submission("Machine Learning"),
            submission("System Design"),
            submission("Computer Science"),
        ];
        let service = AssessmentService::deterministic();
        let reports = service.evaluate_many(&submissions, &calibrations).await;

        assert_eq!(reports.len(), 4);
        for (sub, report) in submissions.iter().zip(&reports) {
            assert_eq!(report.value.assessment_id, sub.assessment.id);
        }
        // correct mcq answers score 7 under the lowered CS factor, 10 elsewhere
        assert_eq!(reports[0].value.evaluations[0].score, 7);
        assert_eq!(reports[1].value.evaluations[0].score, 10);
        assert_eq!(reports[3].value.evaluations[0].score, 7);
    }

    /// Tracks how many evaluations run at once.
    struct SlowSource {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl AssessmentSource for SlowSource {
        fn name(&self) -> &str {
            "slow"
        }

        async fn generate(&self, subject: &str) -> Result<Assessment> {
            Ok(synthesize_assessment(subject))
        }

        async fn evaluate(
            &self,
            submission: &Submission,
            calibration: Option<&ReviewerCalibration>,
        ) -> Result<Report> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            DeterministicSource.evaluate(submission, calibration).await
        }

        async fn regenerate(
            &self,
            assessment: &Assessment,
            question_id: &str,
        ) -> Result<Option<Question>> {
            Ok(regenerate_question(assessment, question_id))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn evaluate_many_respects_parallelism() {
        let remote = Arc::new(SlowSource {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let service = AssessmentService::new(Some(remote.clone()), fast_config(0));
        let submissions: Vec<_> = (0..6).map(|_| submission("Computer Science")).collect();

        let reports = service
            .evaluate_many(&submissions, &CalibrationStore::new())
            .await;
        assert!(reports.iter().all(|r| r.origin == Origin::Remote));
        assert_eq!(remote.peak.load(Ordering::SeqCst), 2);
    }
}
