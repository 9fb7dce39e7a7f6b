//! Report aggregates: percentile, topic grouping, timeline and radar.
//!
//! Every division is guarded so an empty assessment aggregates to zeros
//! instead of NaN.

use serde::{Deserialize, Serialize};

use crate::model::{Assessment, CandidateAnswer};
use crate::report::{Evaluation, RadarPoint, Report, TimelinePoint, TopicScore};

pub const PERCENTILE_FLOOR: u32 = 20;
pub const PERCENTILE_CEILING: u32 = 98;
const PERCENTILE_OFFSET: f64 = 9.0;

/// How many topics are listed as strongest and weakest.
pub const TOPIC_HIGHLIGHTS: usize = 3;

/// Placeholder percentile: `clamp(20, 98, round(total / max * 100) + 9)`.
///
/// This is an affine transform of the raw ratio, not a population statistic.
pub fn percentile(total_score: u32, max_score: u32) -> u32 {
    let ratio = if max_score == 0 {
        0.0
    } else {
        total_score as f64 / max_score as f64
    };
    let value = (ratio * 100.0).round() + PERCENTILE_OFFSET;
    value.clamp(PERCENTILE_FLOOR as f64, PERCENTILE_CEILING as f64) as u32
}

/// `round(sum / (count * 10) * 100)`, or 0 when `count` is zero.
fn pct_of_max(sum: u32, count: usize) -> u32 {
    if count == 0 {
        return 0;
    }
    (sum as f64 / (count as f64 * 10.0) * 100.0).round() as u32
}

/// Average score percentage per sub-topic, in first-encounter order.
///
/// Questions without an evaluation are skipped.
pub fn topic_scores(assessment: &Assessment, evaluations: &[Evaluation]) -> Vec<TopicScore> {
    let mut order: Vec<(String, u32, usize)> = Vec::new();
    for question in &assessment.questions {
        let Some(evaluation) = evaluations.iter().find(|e| e.question_id == question.id) else {
            continue;
        };
        match order.iter_mut().find(|(topic, _, _)| *topic == question.sub_topic) {
            Some((_, sum, count)) => {
                *sum += evaluation.score;
                *count += 1;
            }
            None => order.push((question.sub_topic.clone(), evaluation.score, 1)),
        }
    }
    order
        .into_iter()
        .map(|(topic, sum, count)| TopicScore {
            topic,
            score_pct: pct_of_max(sum, count),
        })
        .collect()
}

/// Top three topics by descending percentage (stable), and the bottom three
/// ordered from weakest upwards.
pub fn strongest_and_weakest(topics: &[TopicScore]) -> (Vec<TopicScore>, Vec<TopicScore>) {
    let mut sorted = topics.to_vec();
    sorted.sort_by(|a, b| b.score_pct.cmp(&a.score_pct));
    let strongest = sorted.iter().take(TOPIC_HIGHLIGHTS).cloned().collect();
    let tail = sorted.len().saturating_sub(TOPIC_HIGHLIGHTS);
    let weakest = sorted[tail..].iter().rev().cloned().collect();
    (strongest, weakest)
}

/// Cumulative accuracy and average time for each 1-based question index.
///
/// Answers are averaged by position: at index `i` the first `i` answers (or
/// as many as exist) are used, regardless of which questions they belong to.
pub fn timeline(
    question_count: usize,
    evaluations: &[Evaluation],
    answers: &[CandidateAnswer],
) -> Vec<TimelinePoint> {
    (1..=question_count)
        .map(|index| {
            let upto = &evaluations[..index.min(evaluations.len())];
            let upto_score: u32 = upto.iter().map(|e| e.score).sum();

            let answered = &answers[..index.min(answers.len())];
            let avg_time = if answered.is_empty() {
                0
            } else {
                let total: u64 = answered.iter().map(|a| a.time_spent_seconds as u64).sum();
                (total as f64 / answered.len() as f64).round() as u32
            };

            TimelinePoint {
                index,
                accuracy_pct: pct_of_max(upto_score, upto.len()),
                avg_time,
            }
        })
        .collect()
}

/// One radar point per topic, in topic-encounter order.
pub fn radar(topics: &[TopicScore]) -> Vec<RadarPoint> {
    topics
        .iter()
        .map(|t| RadarPoint {
            topic: t.topic.clone(),
            score: t.score_pct,
        })
        .collect()
}

/// One row of the peer comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerRow {
    pub candidate: String,
    pub accuracy_pct: u32,
}

/// Candidate accuracy next to two synthetic peers whose every score is
/// shifted by -1 and +1 (clamped to `0..=10`).
pub fn peer_comparison(report: &Report) -> Vec<PeerRow> {
    let shifted = |delta: i64| -> u32 {
        let sum: u32 = report
            .evaluations
            .iter()
            .map(|e| (e.score as i64 + delta).clamp(0, 10) as u32)
            .sum();
        pct_of_max(sum, report.evaluations.len())
    };
    vec![
        PeerRow {
            candidate: report.candidate_id.clone(),
            accuracy_pct: shifted(0),
        },
        PeerRow {
            candidate: "peer-below".to_string(),
            accuracy_pct: shifted(-1),
        },
        PeerRow {
            candidate: "peer-above".to_string(),
            accuracy_pct: shifted(1),
        },
    ]
}
