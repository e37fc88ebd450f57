//! Pipeline progress shown while an artifact request runs.
//!
//! Three independent signals feed the display:
//! - `optimistic_stage`: guessed from marker substrings in the raw buffer,
//! - `reported`: live `routing_update` steps announced by the backend,
//! - `confirmed`: the authoritative list set once the document completes.
//!
//! Once `confirmed` is present it is the only list displayed.

use serde::{Deserialize, Serialize};

use crate::lenient;

pub const ETA_COMPLETE: &str = "complete";
pub const ETA_RUNNING: &str = "in progress";
pub const ETA_PENDING: &str = "pending";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Queued,
    Running,
    Done,
}

impl StepStatus {
    /// Maps a wire status; unknown values count as finished.
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "queued" | "pending" => StepStatus::Queued,
            "running" | "in_progress" => StepStatus::Running,
            _ => StepStatus::Done,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingStep {
    pub id: String,
    pub label: String,
    pub status: StepStatus,
    pub eta: String,
}

/// A routing step as sent by the backend: every field may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct RoutingStepPatch {
    #[serde(deserialize_with = "lenient::optional_text")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub label: Option<String>,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub eta: Option<String>,
}

impl RoutingStepPatch {
    /// Builds an authoritative step: missing status means done, missing eta means complete.
    pub fn into_confirmed(self, index: usize) -> RoutingStep {
        let id = self.id.unwrap_or_else(|| format!("step-{}", index + 1));
        RoutingStep {
            label: self.label.unwrap_or_else(|| id.clone()),
            id,
            status: self
                .status
                .as_deref()
                .map(StepStatus::from_wire)
                .unwrap_or(StepStatus::Done),
            eta: self.eta.unwrap_or_else(|| ETA_COMPLETE.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipelineStage {
    Analyze,
    Summarize,
    Translate,
    Draft,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 4] = [
        PipelineStage::Analyze,
        PipelineStage::Summarize,
        PipelineStage::Translate,
        PipelineStage::Draft,
    ];

    pub fn id(self) -> &'static str {
        match self {
            PipelineStage::Analyze => "analyze",
            PipelineStage::Summarize => "summarize",
            PipelineStage::Translate => "translate",
            PipelineStage::Draft => "draft",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PipelineStage::Analyze => "Analyze request",
            PipelineStage::Summarize => "Summarize documents",
            PipelineStage::Translate => "Translate clauses",
            PipelineStage::Draft => "Draft credit memo",
        }
    }

    /// Literal the buffer must contain for this stage to be considered reached.
    fn marker(self) -> Option<&'static str> {
        match self {
            PipelineStage::Analyze => None,
            PipelineStage::Summarize => Some("\"summary\""),
            PipelineStage::Translate => Some("\"translation\""),
            PipelineStage::Draft => Some("\"memo\""),
        }
    }
}

/// Furthest stage whose marker occurs in the accumulated text.
pub fn project_stage(buffer: &str) -> PipelineStage {
    PipelineStage::ALL
        .iter()
        .rev()
        .copied()
        .find(|stage| stage.marker().is_none_or(|marker| buffer.contains(marker)))
        .unwrap_or(PipelineStage::Analyze)
}

/// Canned pipeline with stages before `current` done and `current` running.
pub fn canned_steps(current: PipelineStage) -> Vec<RoutingStep> {
    PipelineStage::ALL
        .iter()
        .map(|&stage| {
            let (status, eta) = match stage.cmp(&current) {
                std::cmp::Ordering::Less => (StepStatus::Done, ETA_COMPLETE),
                std::cmp::Ordering::Equal => (StepStatus::Running, ETA_RUNNING),
                std::cmp::Ordering::Greater => (StepStatus::Queued, ETA_PENDING),
            };
            RoutingStep {
                id: stage.id().to_string(),
                label: stage.label().to_string(),
                status,
                eta: eta.to_string(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoutingBoard {
    optimistic_stage: Option<PipelineStage>,
    reported: Vec<RoutingStep>,
    confirmed: Option<Vec<RoutingStep>>,
}

impl RoutingBoard {
    pub fn optimistic_stage(&self) -> Option<PipelineStage> {
        self.optimistic_stage
    }

    pub fn confirmed(&self) -> Option<&[RoutingStep]> {
        self.confirmed.as_deref()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Canned pipeline for a fresh request: first stage running, rest queued.
    pub fn start(&mut self) {
        self.clear();
        self.optimistic_stage = Some(PipelineStage::Analyze);
    }

    /// Advances the optimistic stage from the raw buffer; never moves backwards.
    pub fn observe(&mut self, buffer: &str) -> bool {
        if self.confirmed.is_some() {
            return false;
        }
        let projected = project_stage(buffer);
        match self.optimistic_stage {
            Some(current) if current >= projected => false,
            _ => {
                self.optimistic_stage = Some(projected);
                true
            }
        }
    }

    /// Upserts a live step by id with field-level merge.
    pub fn report(&mut self, patch: RoutingStepPatch) -> bool {
        let Some(id) = patch.id.clone() else {
            return false;
        };
        if let Some(existing) = self.reported.iter_mut().find(|step| step.id == id) {
            let mut merged = existing.clone();
            if let Some(label) = patch.label {
                merged.label = label;
            }
            if let Some(status) = patch.status.as_deref() {
                merged.status = StepStatus::from_wire(status);
            }
            if let Some(eta) = patch.eta {
                merged.eta = eta;
            }
            if merged == *existing {
                return false;
            }
            *existing = merged;
        } else {
            self.reported.push(RoutingStep {
                label: patch.label.unwrap_or_else(|| id.clone()),
                id,
                status: patch
                    .status
                    .as_deref()
                    .map(StepStatus::from_wire)
                    .unwrap_or(StepStatus::Running),
                eta: patch.eta.unwrap_or_else(|| ETA_RUNNING.to_string()),
            });
        }
        true
    }

    /// Replaces everything with the authoritative list from a completed document.
    pub fn confirm(&mut self, patches: Vec<RoutingStepPatch>) {
        let steps = patches
            .into_iter()
            .enumerate()
            .map(|(index, patch)| patch.into_confirmed(index))
            .collect();
        self.confirmed = Some(steps);
    }

    /// Marks every displayed step done and freezes the result as confirmed.
    pub fn finish_all(&mut self) {
        let steps = self
            .steps()
            .into_iter()
            .map(|step| RoutingStep {
                status: StepStatus::Done,
                ..step
            })
            .collect();
        self.confirmed = Some(steps);
    }

    /// Steps to display: confirmed when present, else canned projection plus live reports.
    pub fn steps(&self) -> Vec<RoutingStep> {
        if let Some(confirmed) = &self.confirmed {
            return confirmed.clone();
        }
        let mut steps = self.optimistic_stage.map(canned_steps).unwrap_or_default();
        steps.extend(self.reported.iter().cloned());
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_picks_furthest_marker() {
        assert_eq!(project_stage(""), PipelineStage::Analyze);
        assert_eq!(project_stage("{\"summary\":{"), PipelineStage::Summarize);
        assert_eq!(
            project_stage("{\"summary\":{},\"translation\":{"),
            PipelineStage::Translate
        );
        assert_eq!(project_stage("{\"memo\":{"), PipelineStage::Draft);
    }

    #[test]
    fn canned_steps_mark_previous_done_and_current_running() {
        let steps = canned_steps(PipelineStage::Translate);
        let statuses: Vec<_> = steps.iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            vec![
                StepStatus::Done,
                StepStatus::Done,
                StepStatus::Running,
                StepStatus::Queued
            ]
        );
    }

    #[test]
    fn wire_status_is_lenient() {
        assert_eq!(StepStatus::from_wire("Running"), StepStatus::Running);
        assert_eq!(StepStatus::from_wire("queued"), StepStatus::Queued);
        assert_eq!(StepStatus::from_wire("failed"), StepStatus::Done);
    }

    #[test]
    fn report_merges_by_id() {
        let mut board = RoutingBoard::default();
        board.start();
        assert!(board.report(RoutingStepPatch {
            id: Some("run-main".into()),
            label: Some("Model".into()),
            status: Some("running".into()),
            eta: None,
        }));
        assert!(board.report(RoutingStepPatch {
            id: Some("run-main".into()),
            status: Some("done".into()),
            ..RoutingStepPatch::default()
        }));
        let steps = board.steps();
        assert_eq!(steps.len(), 5);
        assert_eq!(steps[4].label, "Model");
        assert_eq!(steps[4].status, StepStatus::Done);
    }

    #[test]
    fn observe_ignores_buffer_once_confirmed() {
        let mut board = RoutingBoard::default();
        board.start();
        board.confirm(Vec::new());
        assert!(!board.observe("\"memo\""));
        assert!(board.steps().is_empty());
    }
}
