use std::fmt::Write as _;

use workbench_core::{
    AppViewModel, ArtifactTab, ChatMessage, Document, RoutingStep, SessionPhase, StepStatus,
};

pub fn phase_label(phase: SessionPhase) -> &'static str {
    match phase {
        SessionPhase::Idle => "Idle",
        SessionPhase::Sending => "Sending",
        SessionPhase::Streaming => "Streaming",
        SessionPhase::Done => "Done",
        SessionPhase::Failed => "Failed",
    }
}

/// One-line progress: phase plus every routing step with its marker.
pub fn status_line(view: &AppViewModel) -> String {
    let mut line = phase_label(view.phase).to_string();
    if !view.routing.is_empty() {
        line.push_str(" | ");
        line.push_str(&routing_line(&view.routing));
    }
    line
}

pub fn routing_line(steps: &[RoutingStep]) -> String {
    steps
        .iter()
        .map(|step| {
            let marker = match step.status {
                StepStatus::Done => "[x]",
                StepStatus::Running => "[>]",
                StepStatus::Queued => "[ ]",
            };
            format!("{marker} {}", step.label)
        })
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn render_message(message: &ChatMessage) -> String {
    let mut out = format!("{} ({}): {}", message.name, message.time, message.content);
    for bullet in &message.bullets {
        let _ = write!(out, "\n  - {bullet}");
    }
    if let Some(attachment) = &message.attachment {
        let _ = write!(out, "\n  [{attachment}]");
    }
    out
}

pub fn render_documents(documents: &[Document], selected: Option<&str>) -> String {
    if documents.is_empty() {
        return "No documents.".to_string();
    }
    documents
        .iter()
        .map(|doc| {
            let mark = if selected == Some(doc.id.as_str()) { "*" } else { " " };
            let mut line = format!(
                "{mark} {}  {} [{}] {}p",
                doc.id, doc.name, doc.kind, doc.pages
            );
            if !doc.tags.is_empty() {
                let _ = write!(line, "  #{}", doc.tags.join(" #"));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Content of the active artifact tab.
pub fn render_tab(view: &AppViewModel) -> String {
    let mut out = String::new();
    match view.active_tab {
        ArtifactTab::Summary => {
            let summary = &view.artifacts.summary;
            if !view.artifacts.has_summary() {
                return "No summary yet.".to_string();
            }
            let _ = writeln!(out, "{}", summary.output);
            if !summary.borrower.name.is_empty() {
                let _ = writeln!(
                    out,
                    "Borrower: {} {}",
                    summary.borrower.name, summary.borrower.rating
                );
            }
            for metric in &summary.metrics {
                let _ = writeln!(out, "  {}: {} {}", metric.label, metric.value, metric.delta);
            }
            for risk in &summary.risks {
                let _ = writeln!(out, "  ! {} ({})", risk.label, risk.level);
            }
        }
        ArtifactTab::Translation => {
            let Some(version) = view.current_translation() else {
                return "No translation yet.".to_string();
            };
            let count = view.artifacts.translations.len();
            let _ = writeln!(out, "{} of {count}", version.title);
            if !version.output.is_empty() {
                let _ = writeln!(out, "{}", version.output);
            }
            for clause in &version.clauses {
                let _ = writeln!(out, "  {}\n    => {}", clause.original, clause.translated);
            }
        }
        ArtifactTab::Memo => {
            let memo = &view.artifacts.memo;
            if !view.artifacts.has_memo() {
                return "No memo yet.".to_string();
            }
            let _ = writeln!(out, "{}", memo.output);
            for section in &memo.sections {
                let _ = writeln!(out, "[{}]\n{}", section.title, section.content);
            }
            if !memo.recommendation.is_empty() {
                let _ = writeln!(out, "Recommendation: {}", memo.recommendation);
            }
            if !memo.conditions.is_empty() {
                let _ = writeln!(out, "Conditions: {}", memo.conditions);
            }
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use workbench_core::{canned_steps, PipelineStage, TranslationVersion};

    #[test]
    fn status_line_marks_step_states() {
        let view = AppViewModel {
            phase: SessionPhase::Streaming,
            routing: canned_steps(PipelineStage::Summarize),
            ..AppViewModel::default()
        };
        assert_eq!(
            status_line(&view),
            "Streaming | [x] Analyze request  [>] Summarize documents  [ ] Translate clauses  [ ] Draft credit memo"
        );
    }

    #[test]
    fn empty_tabs_say_so() {
        let mut view = AppViewModel::default();
        assert_eq!(render_tab(&view), "No summary yet.");
        view.active_tab = ArtifactTab::Memo;
        assert_eq!(render_tab(&view), "No memo yet.");
    }

    #[test]
    fn translation_tab_shows_selected_version() {
        let mut view = AppViewModel {
            active_tab: ArtifactTab::Translation,
            active_translation: Some(0),
            ..AppViewModel::default()
        };
        for n in 1..=2 {
            view.artifacts.translations.push(TranslationVersion {
                title: format!("翻譯 #{n}"),
                ..TranslationVersion::default()
            });
        }
        assert!(render_tab(&view).starts_with("翻譯 #1 of 2"));
    }

    #[test]
    fn document_list_marks_selection() {
        let docs = vec![Document::new("doc-1", "notes", "TXT", "x")];
        assert_eq!(
            render_documents(&docs, Some("doc-1")),
            "* doc-1  notes [TXT] 1p"
        );
    }
}
