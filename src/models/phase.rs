//! Construction phases and the phase-ordering rule table.
//!
//! The phase ordering rules are static domain knowledge: a directed acyclic
//! dependency graph over phases (not individual tasks). They are built once
//! and injected into the engine at construction time so the ordering can be
//! changed without touching algorithm code.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A named stage of construction work with a fixed relative order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    SitePrep,
    Foundation,
    Framing,
    RoughIn,
    Inspection,
    Finishing,
    PunchList,
}

impl Phase {
    /// All phases in their standard relative order.
    pub const ALL: [Phase; 7] = [
        Phase::SitePrep,
        Phase::Foundation,
        Phase::Framing,
        Phase::RoughIn,
        Phase::Inspection,
        Phase::Finishing,
        Phase::PunchList,
    ];

    /// Stable snake_case name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::SitePrep => "site_prep",
            Phase::Foundation => "foundation",
            Phase::Framing => "framing",
            Phase::RoughIn => "rough_in",
            Phase::Inspection => "inspection",
            Phase::Finishing => "finishing",
            Phase::PunchList => "punch_list",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "site_prep" => Ok(Phase::SitePrep),
            "foundation" => Ok(Phase::Foundation),
            "framing" => Ok(Phase::Framing),
            "rough_in" => Ok(Phase::RoughIn),
            "inspection" => Ok(Phase::Inspection),
            "finishing" => Ok(Phase::Finishing),
            "punch_list" => Ok(Phase::PunchList),
            other => Err(format!("Unknown construction phase: {}", other)),
        }
    }
}

/// Regulatory inspection kinds, one per phase that legally requires one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionType {
    Foundation,
    Framing,
    Final,
}

impl fmt::Display for InspectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InspectionType::Foundation => "foundation",
            InspectionType::Framing => "framing",
            InspectionType::Final => "final",
        };
        write!(f, "{}", name)
    }
}

/// Phase-ordering rule table.
///
/// Maps each phase to the set of phases that must complete before it may
/// start, plus the mandated-inspection table. The graph is acyclic by
/// construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseOrderingRules {
    predecessors: HashMap<Phase, Vec<Phase>>,
    inspections: HashMap<Phase, InspectionType>,
}

impl PhaseOrderingRules {
    /// Build an empty rule table.
    pub fn new() -> Self {
        Self {
            predecessors: HashMap::new(),
            inspections: HashMap::new(),
        }
    }

    /// Standard residential construction sequence.
    ///
    /// Each phase requires the previous one complete; foundation, framing and
    /// finishing carry mandated inspections (foundation, framing, final).
    pub fn standard() -> Self {
        let mut rules = Self::new();
        rules.require(Phase::Foundation, Phase::SitePrep);
        rules.require(Phase::Framing, Phase::Foundation);
        rules.require(Phase::RoughIn, Phase::Framing);
        rules.require(Phase::Inspection, Phase::RoughIn);
        rules.require(Phase::Finishing, Phase::Inspection);
        rules.require(Phase::PunchList, Phase::Finishing);
        rules.mandate_inspection(Phase::Foundation, InspectionType::Foundation);
        rules.mandate_inspection(Phase::Framing, InspectionType::Framing);
        rules.mandate_inspection(Phase::Finishing, InspectionType::Final);
        rules
    }

    /// Add a predecessor requirement: `phase` may not start until
    /// `predecessor` is complete.
    pub fn require(&mut self, phase: Phase, predecessor: Phase) {
        let entry = self.predecessors.entry(phase).or_default();
        if !entry.contains(&predecessor) {
            entry.push(predecessor);
        }
    }

    /// Mark a phase as requiring a regulatory inspection.
    pub fn mandate_inspection(&mut self, phase: Phase, inspection: InspectionType) {
        self.inspections.insert(phase, inspection);
    }

    /// Required predecessor phases for a phase.
    pub fn predecessors(&self, phase: Phase) -> &[Phase] {
        self.predecessors
            .get(&phase)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// The mandated inspection for a phase, if any.
    pub fn inspection_for(&self, phase: Phase) -> Option<InspectionType> {
        self.inspections.get(&phase).copied()
    }

    /// Phases carrying a mandated inspection, in standard phase order.
    pub fn inspected_phases(&self) -> Vec<Phase> {
        Phase::ALL
            .iter()
            .copied()
            .filter(|p| self.inspections.contains_key(p))
            .collect()
    }

    /// Whether `successor`'s phase rules name `predecessor` as required.
    pub fn requires(&self, successor: Phase, predecessor: Phase) -> bool {
        self.predecessors(successor).contains(&predecessor)
    }
}

impl Default for PhaseOrderingRules {
    fn default() -> Self {
        Self::standard()
    }
}
