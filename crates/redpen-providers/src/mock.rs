//! Mock source for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use redpen_core::calibration::ReviewerCalibration;
use redpen_core::engine::Evaluator;
use redpen_core::model::{Assessment, Question};
use redpen_core::report::Report;
use redpen_core::synthesis::{regenerate_question, synthesize_assessment};
use redpen_core::traits::{AssessmentSource, Submission};

use crate::error::SourceError;

/// A mock assessment source for exercising the service without a network.
///
/// Succeeds with deterministic content (tagged so callers can tell it came
/// from the mock), or fails every call with a configurable error.
pub struct MockSource {
    /// Title given to generated assessments.
    title: String,
    /// Error returned by every call, if set.
    failure: Option<fn() -> SourceError>,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Subject of the last generate call.
    last_subject: Mutex<Option<String>>,
}

impl MockSource {
    /// A mock that always succeeds.
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            failure: None,
            call_count: AtomicU32::new(0),
            last_subject: Mutex::new(None),
        }
    }

    /// A mock whose every call fails with `error()`.
    pub fn failing(error: fn() -> SourceError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new("unused")
        }
    }

    /// Get the number of calls made to this source.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the subject of the last generate call.
    pub fn last_subject(&self) -> Option<String> {
        self.last_subject
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn begin_call(&self) -> anyhow::Result<()> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        match self.failure {
            Some(error) => Err(error().into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AssessmentSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, subject: &str) -> anyhow::Result<Assessment> {
        *self.last_subject.lock().unwrap_or_else(|e| e.into_inner()) = Some(subject.to_string());
        self.begin_call()?;
        let mut assessment = synthesize_assessment(subject);
        assessment.title = self.title.clone();
        Ok(assessment)
    }

    async fn evaluate(
        &self,
        submission: &Submission,
        calibration: Option<&ReviewerCalibration>,
    ) -> anyhow::Result<Report> {
        self.begin_call()?;
        Ok(Evaluator::new(submission.candidate_id.as_str()).evaluate(
            &submission.assessment,
            &submission.answers,
            calibration,
        ))
    }

    async fn regenerate(
        &self,
        assessment: &Assessment,
        question_id: &str,
    ) -> anyhow::Result<Option<Question>> {
        self.begin_call()?;
        Ok(regenerate_question(assessment, question_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redpen_core::service::{AssessmentService, Origin, ServiceConfig};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn mock_generates_tagged_assessment() {
        let mock = MockSource::new("Mocked");
        let assessment = mock.generate("Data Structures").await.unwrap();
        assert_eq!(assessment.title, "Mocked");
        assert_eq!(assessment.questions.len(), 10);
        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.last_subject().as_deref(), Some("Data Structures"));
    }

    #[tokio::test(start_paused = true)]
    async fn failing_mock_drives_fallback() {
        let mock = Arc::new(MockSource::failing(|| SourceError::ApiError {
            status: 502,
            message: "bad gateway".into(),
        }));
        let service = AssessmentService::new(
            Some(mock.clone()),
            ServiceConfig {
                max_retries: 2,
                retry_delay: Duration::from_millis(50),
                parallelism: 1,
            },
        );
        let generated = service.generate("Computer Science").await;
        assert_eq!(generated.origin, Origin::Deterministic);
        assert_eq!(mock.call_count(), 3);
    }
}
