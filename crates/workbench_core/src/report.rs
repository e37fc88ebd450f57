//! Plain-text report export of the current artifacts.
//!
//! The markdown flavour is limited to `#` headings, `- ` bullets, pipe
//! tables and paragraphs, which [`render_html`] converts without a markdown
//! engine.

use std::fmt::Write as _;

use crate::ArtifactState;

pub const REPORT_TITLE: &str = "Credit Report";

/// Renders summary, the selected translation version and memo as markdown.
pub fn render_markdown(artifacts: &ArtifactState, active_translation: Option<usize>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {REPORT_TITLE}");

    let summary = &artifacts.summary;
    let borrower = &summary.borrower;
    let has_borrower =
        !(borrower.name.is_empty() && borrower.description.is_empty() && borrower.rating.is_empty());
    if !summary.output.is_empty()
        || has_borrower
        || !summary.metrics.is_empty()
        || !summary.risks.is_empty()
    {
        let _ = writeln!(out, "\n## Summary");
        push_paragraph(&mut out, &summary.output);
        if has_borrower {
            let _ = writeln!(out, "\n### Borrower");
            push_field(&mut out, "Name", &borrower.name);
            push_field(&mut out, "Description", &borrower.description);
            push_field(&mut out, "Rating", &borrower.rating);
        }
        if !summary.metrics.is_empty() {
            let _ = writeln!(out, "\n### Key Metrics\n");
            let _ = writeln!(out, "| Metric | Value | Change |");
            let _ = writeln!(out, "| --- | --- | --- |");
            for metric in &summary.metrics {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} |",
                    table_cell(&metric.label),
                    table_cell(&metric.value),
                    table_cell(&metric.delta)
                );
            }
        }
        if !summary.risks.is_empty() {
            let _ = writeln!(out, "\n### Risks");
            for risk in &summary.risks {
                let _ = writeln!(out, "- {} [{}]", risk.label, risk.level);
            }
        }
    }

    let translation = active_translation
        .and_then(|index| artifacts.translations.get(index))
        .or_else(|| artifacts.translations.last());
    if let Some(version) = translation {
        let _ = writeln!(out, "\n## {} ({})", version.title, version.timestamp);
        push_paragraph(&mut out, &version.output);
        if !version.clauses.is_empty() {
            let _ = writeln!(out, "\n### Clauses");
            for clause in &version.clauses {
                let _ = writeln!(out, "- {} → {}", clause.original, clause.translated);
            }
        }
    }

    let memo = &artifacts.memo;
    if !memo.output.is_empty() || !memo.sections.is_empty() {
        let _ = writeln!(out, "\n## Credit Memo");
        push_paragraph(&mut out, &memo.output);
        for section in &memo.sections {
            let _ = writeln!(out, "\n### {}", section.title);
            push_paragraph(&mut out, &section.content);
        }
        if !memo.recommendation.is_empty() {
            let _ = writeln!(out, "\n### Recommendation");
            push_paragraph(&mut out, &memo.recommendation);
        }
        if !memo.conditions.is_empty() {
            let _ = writeln!(out, "\n### Conditions");
            push_paragraph(&mut out, &memo.conditions);
        }
    }

    out
}

fn push_paragraph(out: &mut String, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        let _ = writeln!(out, "\n{text}");
    }
}

fn push_field(out: &mut String, label: &str, value: &str) {
    if !value.is_empty() {
        let _ = writeln!(out, "- {label}: {value}");
    }
}

fn table_cell(text: &str) -> String {
    text.replace('\n', " ").replace('|', "\\|")
}

/// Converts the report markdown into a standalone HTML page.
pub fn render_html(markdown: &str) -> String {
    let mut body = String::new();
    let mut paragraph: Vec<String> = Vec::new();
    let mut in_list = false;
    let mut in_table = false;

    for line in markdown.lines() {
        let line = line.trim_end();
        let heading = [("### ", "h3"), ("## ", "h2"), ("# ", "h1")]
            .iter()
            .find_map(|(prefix, tag)| line.strip_prefix(prefix).map(|text| (*tag, text)));
        let is_row = line.starts_with('|');

        if heading.is_some() || line.is_empty() || line.starts_with("- ") || is_row {
            flush_paragraph(&mut body, &mut paragraph);
        }
        if !line.starts_with("- ") && in_list {
            body.push_str("</ul>\n");
            in_list = false;
        }
        if !is_row && in_table {
            body.push_str("</table>\n");
            in_table = false;
        }

        if is_row {
            let cells = table_cells(line);
            if cells.iter().all(|cell| is_rule(cell)) {
                continue;
            }
            // The first row of a table is its header.
            let tag = if in_table { "td" } else { "th" };
            if !in_table {
                body.push_str("<table>\n");
                in_table = true;
            }
            body.push_str("<tr>");
            for cell in &cells {
                let _ = write!(body, "<{tag}>{}</{tag}>", escape_html(cell));
            }
            body.push_str("</tr>\n");
        } else if let Some((tag, text)) = heading {
            let _ = writeln!(body, "<{tag}>{}</{tag}>", escape_html(text));
        } else if let Some(item) = line.strip_prefix("- ") {
            if !in_list {
                body.push_str("<ul>\n");
                in_list = true;
            }
            let _ = writeln!(body, "<li>{}</li>", escape_html(item));
        } else if !line.is_empty() {
            paragraph.push(escape_html(line));
        }
    }
    flush_paragraph(&mut body, &mut paragraph);
    if in_list {
        body.push_str("</ul>\n");
    }
    if in_table {
        body.push_str("</table>\n");
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{REPORT_TITLE}</title>\n</head>\n<body>\n{body}</body>\n</html>\n"
    )
}

/// Splits `| a | b |` into trimmed cells, honouring `\|` escapes.
fn table_cells(line: &str) -> Vec<String> {
    let inner = line.strip_prefix('|').unwrap_or(line);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&'|') => {
                cell.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut cell).trim().to_string()),
            _ => cell.push(ch),
        }
    }
    cells.push(cell.trim().to_string());
    cells
}

fn is_rule(cell: &str) -> bool {
    !cell.is_empty() && cell.chars().all(|ch| ch == '-' || ch == ':')
}

fn flush_paragraph(body: &mut String, paragraph: &mut Vec<String>) {
    if !paragraph.is_empty() {
        let _ = writeln!(body, "<p>{}</p>", paragraph.join("<br>"));
        paragraph.clear();
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Metric;

    #[test]
    fn html_escapes_and_groups_lists() {
        let html = render_html("# T\n\nline <a>\nnext\n\n- one\n- two & three\n");
        assert!(html.contains("<h1>T</h1>"));
        assert!(html.contains("<p>line &lt;a&gt;<br>next</p>"));
        assert!(html.contains("<ul>\n<li>one</li>\n<li>two &amp; three</li>\n</ul>"));
    }

    #[test]
    fn metrics_render_as_table() {
        let mut artifacts = ArtifactState::default();
        artifacts.summary.metrics = vec![
            Metric {
                label: "Revenue".to_string(),
                value: "120".to_string(),
                delta: "+5%".to_string(),
            },
            Metric {
                label: "Debt | EBITDA".to_string(),
                value: "3.1".to_string(),
                delta: String::new(),
            },
        ];

        let markdown = render_markdown(&artifacts, None);
        assert!(markdown.contains(
            "### Key Metrics\n\n| Metric | Value | Change |\n| --- | --- | --- |\n\
             | Revenue | 120 | +5% |\n| Debt \\| EBITDA | 3.1 |  |\n"
        ));

        let html = render_html(&markdown);
        assert!(html.contains(
            "<table>\n<tr><th>Metric</th><th>Value</th><th>Change</th></tr>\n\
             <tr><td>Revenue</td><td>120</td><td>+5%</td></tr>\n\
             <tr><td>Debt | EBITDA</td><td>3.1</td><td></td></tr>\n</table>"
        ));
    }

    #[test]
    fn empty_artifacts_render_title_only() {
        assert_eq!(render_markdown(&ArtifactState::default(), None), "# Credit Report\n");
    }
}
