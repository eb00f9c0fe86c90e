//! Approval chain view model (Tutor -> HOD -> Dean).
//!
//! The server owns the chain; everything here is a pure projection of it
//! into colors, icons, labels and connector states, plus a terminal
//! rendering for the CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::types::{lenient_time, BonafideRequest, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Waiting,
    Pending,
    Approved,
    Rejected,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusStyle {
    pub color: &'static str,
    pub icon: &'static str,
    pub label: &'static str,
}

pub const GREEN: &str = "#22c55e";
pub const ORANGE: &str = "#f59e0b";
pub const GRAY: &str = "#9ca3af";
pub const RED: &str = "#ef4444";
pub const NEUTRAL: &str = "#d1d5db";

impl StepStatus {
    pub fn style(&self) -> StatusStyle {
        match self {
            StepStatus::Approved => StatusStyle { color: GREEN, icon: "✅", label: "Approved" },
            StepStatus::Pending => StatusStyle { color: ORANGE, icon: "👤", label: "In Review" },
            StepStatus::Waiting => StatusStyle { color: GRAY, icon: "⏳", label: "Waiting" },
            StepStatus::Rejected => StatusStyle { color: RED, icon: "❌", label: "Rejected" },
            StepStatus::Unknown => StatusStyle { color: NEUTRAL, icon: "○", label: "Unknown" },
        }
    }

    /// Extra line shown under a step that has no decision yet
    pub fn status_text(&self) -> Option<&'static str> {
        match self {
            StepStatus::Pending => Some("In Review"),
            StepStatus::Waiting => Some("Waiting"),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Waiting => "waiting",
            StepStatus::Pending => "pending",
            StepStatus::Approved => "approved",
            StepStatus::Rejected => "rejected",
            StepStatus::Unknown => "unknown",
        }
    }

    fn from_stage_status(raw: Option<&str>) -> Option<Self> {
        match raw? {
            "approved" => Some(StepStatus::Approved),
            "rejected" => Some(StepStatus::Rejected),
            _ => None,
        }
    }
}

/// One stage of the approval chain as supplied by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainStep {
    pub step: String,
    pub status: StepStatus,
    #[serde(default)]
    pub approver: Option<String>,
    #[serde(default, with = "lenient_time")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl ChainStep {
    pub fn new(step: impl Into<String>, status: StepStatus) -> Self {
        Self {
            step: step.into(),
            status,
            approver: None,
            timestamp: None,
            comment: None,
        }
    }

    pub fn has_comment(&self) -> bool {
        self.comment.as_deref().is_some_and(|c| !c.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dot {
    pub color: &'static str,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepView {
    pub label: String,
    pub status: StepStatus,
    pub color: &'static str,
    pub icon: &'static str,
    pub approver: Option<String>,
    pub timestamp: Option<String>,
    pub status_text: Option<&'static str>,
    pub has_comment: bool,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChainItem {
    Step(StepView),
    Connector { active: bool },
}

/// Indicator dots, one per step, in chain order
pub fn render_compact(chain: &[ChainStep]) -> Vec<Dot> {
    chain
        .iter()
        .map(|step| Dot {
            color: step.status.style().color,
            title: format!("{}: {}", step.step, step.status.as_str()),
        })
        .collect()
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%b %-d, %H:%M").to_string()
}

/// Steps interleaved with connectors. A connector lights up once the step
/// after it has left `waiting`.
pub fn render_full(chain: &[ChainStep]) -> Vec<ChainItem> {
    let mut items = Vec::with_capacity(chain.len() * 2);

    for (index, step) in chain.iter().enumerate() {
        let style = step.status.style();
        items.push(ChainItem::Step(StepView {
            label: step.step.clone(),
            status: step.status,
            color: style.color,
            icon: style.icon,
            approver: step.approver.clone().filter(|a| !a.is_empty()),
            timestamp: step.timestamp.as_ref().map(format_timestamp),
            status_text: step.status.status_text(),
            has_comment: step.has_comment(),
            comment: step.comment.clone().filter(|_| step.has_comment()),
        }));

        if let Some(next) = chain.get(index + 1) {
            items.push(ChainItem::Connector {
                active: next.status != StepStatus::Waiting,
            });
        }
    }

    items
}

/// Plain-text chain for the terminal
pub fn render_text(chain: &[ChainStep], compact: bool) -> String {
    if chain.is_empty() {
        return String::new();
    }

    if compact {
        return chain
            .iter()
            .map(|step| step.status.style().icon)
            .collect::<Vec<_>>()
            .join(" ");
    }

    let mut out = String::new();
    for item in render_full(chain) {
        match item {
            ChainItem::Step(view) => {
                out.push_str(&format!("{} {}", view.icon, view.label));
                if let Some(approver) = &view.approver {
                    out.push_str(&format!(" · {}", approver));
                }
                if let Some(ts) = &view.timestamp {
                    out.push_str(&format!(" · {}", ts));
                }
                if let Some(text) = view.status_text {
                    out.push_str(&format!(" ({})", text));
                }
                out.push('\n');
                if let Some(comment) = &view.comment {
                    out.push_str(&format!("   💬 {}\n", comment));
                }
            }
            ChainItem::Connector { active } => {
                out.push_str(if active { "   ┃\n" } else { "   ┊\n" });
            }
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainViolation {
    #[error("step '{step}' started before '{predecessor}' was approved")]
    UnresolvedPredecessor { step: String, predecessor: String },

    #[error("step '{step}' moved after '{rejected}' rejected the request")]
    AfterRejection { step: String, rejected: String },
}

/// Check the ordering invariant: a step may only leave `waiting` once every
/// earlier step is approved, and nothing moves after a rejection.
pub fn check_chain(chain: &[ChainStep]) -> Result<(), ChainViolation> {
    for (index, step) in chain.iter().enumerate() {
        if step.status == StepStatus::Waiting {
            continue;
        }
        for earlier in &chain[..index] {
            match earlier.status {
                StepStatus::Approved => {}
                StepStatus::Rejected => {
                    return Err(ChainViolation::AfterRejection {
                        step: step.step.clone(),
                        rejected: earlier.step.clone(),
                    })
                }
                _ => {
                    return Err(ChainViolation::UnresolvedPredecessor {
                        step: step.step.clone(),
                        predecessor: earlier.step.clone(),
                    })
                }
            }
        }
    }
    Ok(())
}

/// Where the chain as a whole stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOutcome {
    InProgress { step: Option<String> },
    Approved,
    Rejected { step: String },
}

pub fn outcome(chain: &[ChainStep]) -> ChainOutcome {
    if let Some(rejected) = chain.iter().find(|s| s.status == StepStatus::Rejected) {
        return ChainOutcome::Rejected {
            step: rejected.step.clone(),
        };
    }
    if !chain.is_empty() && chain.iter().all(|s| s.status == StepStatus::Approved) {
        return ChainOutcome::Approved;
    }
    ChainOutcome::InProgress {
        step: chain
            .iter()
            .find(|s| s.status == StepStatus::Pending)
            .map(|s| s.step.clone()),
    }
}

/// Chain for a request: the server's own when it sent one, otherwise built
/// from the per-stage fields and `current_stage`.
pub fn chain_for(request: &BonafideRequest) -> Vec<ChainStep> {
    match &request.approval_chain {
        Some(chain) if !chain.is_empty() => chain.clone(),
        _ => derive_chain(request),
    }
}

pub fn derive_chain(request: &BonafideRequest) -> Vec<ChainStep> {
    let open = request.is_open();

    Stage::CHAIN
        .iter()
        .filter_map(|stage| request.stage_record(*stage))
        .map(|record| {
            let status = StepStatus::from_stage_status(record.status).unwrap_or(
                if open && request.current_stage == Some(record.stage) {
                    StepStatus::Pending
                } else {
                    StepStatus::Waiting
                },
            );
            ChainStep {
                step: record.stage.title().to_string(),
                status,
                approver: record.approver.map(str::to_string),
                timestamp: record.at,
                comment: record.comment.map(str::to_string),
            }
        })
        .collect()
}
