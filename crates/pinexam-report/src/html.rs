//! HTML result sheet generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::Result;
use std::path::Path;

use pinexam_core::evaluation::SetSummary;
use pinexam_core::report::ResultSheet;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn join_indices(indices: &[usize]) -> String {
    if indices.is_empty() {
        return "-".to_string();
    }
    indices
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Generate an HTML page from a result sheet.
pub fn generate_html(sheet: &ResultSheet) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>Results: {}</title>\n",
        html_escape(&sheet.course_title)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(&sheet.course_title)));
    html.push_str(&format!(
        "<p class=\"meta\">Pin <strong>{}</strong> | score {}/{} | {}</p>\n",
        sheet.pin,
        sheet.total_score(),
        sheet.total_max_score(),
        sheet.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    match &sheet.validation_code {
        Some(code) => html.push_str(&format!(
            "<p class=\"banner locked\">Validation code: <code>{}</code></p>\n",
            html_escape(code)
        )),
        None => html.push_str("<p class=\"banner open\">Results are not locked yet.</p>\n"),
    }
    html.push_str("</header>\n");

    // Per-set evaluation
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Evaluation</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Set</th><th>Score</th><th>Percent</th><th>Evaluation</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for s in &sheet.summaries {
        let mut evaluation = html_escape(&s.text);
        if let Some(threshold) = &s.threshold_text {
            if !evaluation.is_empty() {
                evaluation.push_str("<br>");
            }
            evaluation.push_str(&html_escape(threshold));
        }
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}/{}</td><td>{:.1}%</td><td>{}</td></tr>\n",
            html_escape(&s.id),
            s.score,
            s.max_score,
            s.percent,
            evaluation,
        ));
    }
    html.push_str("</tbody></table>\n");

    if !sheet.summaries.is_empty() {
        html.push_str(&generate_bar_chart(&sheet.summaries));
    }

    html.push_str("</section>\n");

    // Per-test results
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Tests</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Set</th><th onclick=\"sortTable(1)\">Test</th><th onclick=\"sortTable(2)\">Score</th><th>Correct</th><th>Wrong</th><th>Skipped</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for set in &sheet.sets {
        for t in &set.tests {
            let class = if t.score == t.max_score { "pass" } else { "fail" };
            html.push_str(&format!(
                "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}/{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                class,
                html_escape(&set.id),
                html_escape(&t.id),
                t.score,
                t.max_score,
                join_indices(&t.correct),
                join_indices(&t.wrong),
                join_indices(&t.skipped),
            ));
        }
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(
        &serde_json::to_string_pretty(sheet)
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

/// Write an HTML result sheet to a file.
pub fn write_html_sheet(sheet: &ResultSheet, path: &Path) -> Result<()> {
    let html = generate_html(sheet);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn generate_bar_chart(summaries: &[SetSummary]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 200;

    let total_height = summaries.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, s) in summaries.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let ratio = s.percent / 100.0;
        let width = (ratio * max_width as f64) as usize;

        let color = if ratio >= 0.8 {
            "#22c55e"
        } else if ratio >= 0.5 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&s.id)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.1}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            s.percent
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; --locked: #dbeafe; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; --locked: #1e3a8a; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.banner { padding: 0.75rem 1rem; border-radius: 8px; }
.banner.locked { background: var(--locked); }
.banner.open { background: var(--border); }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
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
    return asc ? va.localeCompare(vb) : vb.localeCompare(va);
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use pinexam_core::journal::Pin;
    use pinexam_core::results::{ResultSet, TestResult};

    fn make_sheet(code: Option<&str>) -> ResultSheet {
        ResultSheet {
            id: uuid::Uuid::nil(),
            created_at: chrono::Utc::now(),
            pin: Pin(12_345_678),
            course_title: "Reading <fast>".into(),
            summaries: vec![SetSummary {
                id: "speed-set".into(),
                score: 3,
                max_score: 4,
                percent: 75.0,
                text: "Well done & thanks".into(),
                threshold_text: Some("Above average".into()),
            }],
            sets: vec![ResultSet {
                id: "speed-set".into(),
                tests: vec![TestResult {
                    id: "colon-hunt".into(),
                    score: 3,
                    max_score: 4,
                    correct: vec![0, 1, 3],
                    wrong: vec![2],
                    skipped: vec![],
                }],
            }],
            validation_code: code.map(str::to_string),
        }
    }

    #[test]
    fn html_sheet_contains_required_elements() {
        let html = generate_html(&make_sheet(Some("AB-42")));

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("12345678"));
        assert!(html.contains("colon-hunt"));
        assert!(html.contains("0, 1, 3"));
        assert!(html.contains("Above average"));
        assert!(html.contains("<code>AB-42</code>"));
    }

    #[test]
    fn text_is_escaped() {
        let html = generate_html(&make_sheet(None));
        assert!(html.contains("Reading &lt;fast&gt;"));
        assert!(html.contains("Well done &amp; thanks"));
        assert!(!html.contains("<fast>"));
        assert!(html.contains("not locked"));
    }

    #[test]
    fn html_sheet_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("sheet.html");

        write_html_sheet(&make_sheet(None), &path).unwrap();
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
