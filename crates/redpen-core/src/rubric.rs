//! Rubric decomposition.
//!
//! Expands a final score into one line item per rubric criterion. Weights are
//! direct multipliers, so line items need not add up to the final score.

use serde::{Deserialize, Serialize};

use crate::model::Question;

/// One rubric line item of an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub criterion: String,
    pub score: u32,
    pub max_score: u32,
    pub reasoning: String,
}

/// Decompose `final_score` across the question's rubric.
pub fn decompose(question: &Question, final_score: u32) -> Vec<ScoreBreakdown> {
    question
        .rubric
        .iter()
        .map(|criterion| ScoreBreakdown {
            criterion: criterion.label.clone(),
            score: (criterion.weight * final_score as f64).round() as u32,
            max_score: ((criterion.weight * 10.0).round() as u32).max(1),
            reasoning: format!(
                "{} judged from answer structure and correctness signals.",
                criterion.label
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glossary::CS_GLOSSARY;
    use crate::model::RubricCriterion;
    use crate::synthesis::build_question;

    #[test]
    fn coding_rubric_items() {
        let q = build_question("Computer Science", 4, 10, CS_GLOSSARY);
        let items = decompose(&q, 7);
        let scores: Vec<(u32, u32)> = items.iter().map(|i| (i.score, i.max_score)).collect();
        // 0.45*7=3.15, 0.25*7=1.75, 0.15*7=1.05 (x2)
        assert_eq!(scores, vec![(3, 5), (2, 3), (1, 2), (1, 2)]);
        assert_eq!(items[0].criterion, "Correctness");
        assert!(items[3].reasoning.starts_with("Edge cases"));
    }

    #[test]
    fn items_are_not_renormalized() {
        let q = build_question("Computer Science", 4, 10, CS_GLOSSARY);
        // 0.45*9=4.05, 0.25*9=2.25, 0.15*9=1.35 (x2): 4+2+1+1
        let sum: u32 = decompose(&q, 9).iter().map(|i| i.score).sum();
        assert_eq!(sum, 8);
    }

    #[test]
    fn tiny_weight_still_has_unit_max() {
        let mut q = build_question("Computer Science", 0, 10, CS_GLOSSARY);
        q.rubric = vec![RubricCriterion {
            label: "Nuance".into(),
            weight: 0.01,
            description: String::new(),
        }];
        let items = decompose(&q, 10);
        assert_eq!(items[0].max_score, 1);
        assert_eq!(items[0].score, 0);
    }
}
