//! Subcommand implementations.

pub mod calibration;
pub mod evaluate;
pub mod generate;
pub mod init;
pub mod override_score;
pub mod regenerate;
pub mod validate;

use redpen_core::model::Assessment;
use redpen_core::report::Report;

/// Question overview table.
pub(crate) fn print_questions(assessment: &Assessment) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Question", "Topic", "Kind", "Difficulty", "Time"]);
    for q in &assessment.questions {
        table.add_row(vec![
            Cell::new(&q.id),
            Cell::new(&q.sub_topic),
            Cell::new(q.kind),
            Cell::new(q.difficulty),
            Cell::new(format!("{}s", q.estimated_seconds)),
        ]);
    }
    println!("{table}");
}

/// Per-question score table followed by the totals line.
pub(crate) fn print_report(report: &Report) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Question", "Score", "Confidence", "Borderline"]);
    for e in &report.evaluations {
        table.add_row(vec![
            Cell::new(&e.question_id),
            Cell::new(format!("{}/{}", e.score, e.max_score)),
            Cell::new(format!("{:.2}", e.confidence)),
            Cell::new(if e.borderline { "yes" } else { "" }),
        ]);
    }
    println!("{table}");
    println!(
        "Total: {}/{} | Percentile: P{} | Borderline: {}",
        report.total_score,
        report.max_score,
        report.percentile,
        report.borderline_count()
    );
}
