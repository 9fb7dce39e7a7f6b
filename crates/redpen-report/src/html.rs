//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::Result;
use std::path::Path;

use redpen_core::model::Assessment;
use redpen_core::report::{RadarPoint, Report, TopicScore};
use redpen_core::statistics::peer_comparison;

use crate::html_escape;

/// Generate an HTML report for an evaluated submission.
///
/// The assessment supplies the per-question topic, kind and difficulty
/// shown in the evaluations table; questions missing from it render as "-".
pub fn generate_html(report: &Report, assessment: &Assessment) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>redpen report: {}</title>\n",
        html_escape(&assessment.title)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(&assessment.title)));
    html.push_str(&format!(
        "<p class=\"meta\">Candidate: <strong>{}</strong> | Subject: {} | {} questions | submitted {}</p>\n",
        html_escape(&report.candidate_id),
        html_escape(&assessment.subject),
        report.evaluations.len(),
        report.submitted_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Summary dashboard
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str(
        "<thead><tr><th>Score</th><th>Accuracy</th><th>Percentile</th><th>Borderline</th><th>Overrides</th></tr></thead>\n",
    );
    html.push_str(&format!(
        "<tbody><tr><td>{}/{}</td><td>{:.1}%</td><td>P{}</td><td>{}</td><td>{}</td></tr></tbody>\n",
        report.total_score,
        report.max_score,
        report.score_ratio() * 100.0,
        report.percentile,
        report.borderline_count(),
        report.reviewer_overrides.len(),
    ));
    html.push_str("</table>\n");

    if !report.topic_radar.is_empty() {
        html.push_str("<h3>Topic radar</h3>\n");
        html.push_str(&generate_bar_chart(&report.topic_radar));
    }

    html.push_str("<div class=\"topics\">\n");
    html.push_str(&topic_list("Strongest topics", &report.strongest_topics));
    html.push_str(&topic_list("Weakest topics", &report.weakest_topics));
    html.push_str("</div>\n");
    html.push_str("</section>\n");

    // Timeline and peers
    html.push_str("<section class=\"progress\">\n");
    html.push_str("<h2>Timeline</h2>\n");
    html.push_str("<table class=\"timeline\">\n");
    html.push_str("<thead><tr><th>After question</th><th>Accuracy</th><th>Avg time</th></tr></thead>\n<tbody>\n");
    for point in &report.timeline {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}%</td><td>{}s</td></tr>\n",
            point.index, point.accuracy_pct, point.avg_time
        ));
    }
    html.push_str("</tbody></table>\n");

    html.push_str("<h2>Peer comparison</h2>\n");
    html.push_str("<table class=\"peers\">\n");
    html.push_str("<thead><tr><th>Candidate</th><th>Accuracy</th></tr></thead>\n<tbody>\n");
    for row in peer_comparison(report) {
        let class = if row.candidate == report.candidate_id {
            " class=\"self\""
        } else {
            ""
        };
        html.push_str(&format!(
            "<tr{}><td>{}</td><td>{}%</td></tr>\n",
            class,
            html_escape(&row.candidate),
            row.accuracy_pct
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Per-question evaluations
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Evaluations</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Question</th><th onclick=\"sortTable(1)\">Topic</th><th onclick=\"sortTable(2)\">Kind</th><th onclick=\"sortTable(3)\">Difficulty</th><th onclick=\"sortTable(4)\">Score</th><th onclick=\"sortTable(5)\">Confidence</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for eval in &report.evaluations {
        let question = assessment.question(&eval.question_id);
        let row_class = if eval.borderline {
            "borderline"
        } else if eval.score * 2 >= eval.max_score {
            "pass"
        } else {
            "fail"
        };
        let topic = question
            .map(|q| html_escape(&q.sub_topic))
            .unwrap_or_else(|| "-".to_string());
        let kind = question
            .map(|q| q.kind.to_string())
            .unwrap_or_else(|| "-".to_string());
        let difficulty = question
            .map(|q| q.difficulty.to_string())
            .unwrap_or_else(|| "-".to_string());

        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}/{}</td><td>{:.2}</td></tr>\n",
            row_class,
            html_escape(&eval.question_id),
            topic,
            kind,
            difficulty,
            eval.score,
            eval.max_score,
            eval.confidence,
        ));
    }

    html.push_str("</tbody></table>\n");

    for eval in &report.evaluations {
        html.push_str("<details class=\"rubric\">\n");
        html.push_str(&format!(
            "<summary>{}{}</summary>\n",
            html_escape(&eval.question_id),
            if eval.borderline { " (borderline)" } else { "" }
        ));
        html.push_str(&format!(
            "<p class=\"trace\">{}</p>\n",
            html_escape(&eval.reasoning_trace)
        ));
        html.push_str("<table>\n<thead><tr><th>Criterion</th><th>Score</th><th>Reasoning</th></tr></thead>\n<tbody>\n");
        for part in &eval.rubric_scores {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}/{}</td><td>{}</td></tr>\n",
                html_escape(&part.criterion),
                part.score,
                part.max_score,
                html_escape(&part.reasoning)
            ));
        }
        html.push_str("</tbody></table>\n</details>\n");
    }
    html.push_str("</section>\n");

    // Override history
    if !report.reviewer_overrides.is_empty() {
        html.push_str("<section class=\"overrides\">\n");
        html.push_str("<h2>Reviewer overrides</h2>\n");
        html.push_str("<table>\n<thead><tr><th>Question</th><th>Change</th><th>Note</th><th>At</th></tr></thead>\n<tbody>\n");
        for record in &report.reviewer_overrides {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{} &rarr; {}</td><td>{}</td><td>{}</td></tr>\n",
                html_escape(&record.question_id),
                record.previous_score,
                record.new_score,
                html_escape(&record.note),
                record.at.format("%Y-%m-%d %H:%M:%S UTC")
            ));
        }
        html.push_str("</tbody></table>\n</section>\n");
    }

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(
        &serde_json::to_string_pretty(report)
            .unwrap_or_default()
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    );
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &Report, assessment: &Assessment, path: &Path) -> Result<()> {
    let html = generate_html(report, assessment);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn topic_list(title: &str, topics: &[TopicScore]) -> String {
    let mut out = format!("<div>\n<h3>{}</h3>\n<ul>\n", html_escape(title));
    if topics.is_empty() {
        out.push_str("<li class=\"meta\">none</li>\n");
    }
    for topic in topics {
        out.push_str(&format!(
            "<li>{} <span class=\"meta\">{}%</span></li>\n",
            html_escape(&topic.topic),
            topic.score_pct
        ));
    }
    out.push_str("</ul>\n</div>\n");
    out
}

fn generate_bar_chart(points: &[RadarPoint]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 200;

    let total_height = points.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, point) in points.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let fraction = point.score.min(100) as f64 / 100.0;
        let width = (fraction * max_width as f64) as usize;

        let color = if fraction >= 0.8 {
            "#22c55e"
        } else if fraction >= 0.5 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&point.topic)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            point.score
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; --warn: #fef9c3; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; --warn: #713f12; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.topics { display: flex; gap: 4rem; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
.borderline { background: var(--warn); }
.self { font-weight: bold; }
.trace { font-style: italic; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb, undefined, { numeric: true }) : vb.localeCompare(va, undefined, { numeric: true });
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
