//! Level definitions: a template library plus the graphs a level may be built from.

use serde::{Deserialize, Serialize};

use crate::graph::RoomNodeGraph;
use crate::room_types::RoomNodeType;
use crate::template::RoomTemplateLibrary;
use crate::validate::Severity;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DungeonLevel {
    pub name: String,
    pub templates: RoomTemplateLibrary,
    /// One graph is picked per build attempt
    pub graphs: Vec<RoomNodeGraph>,
}

/// A designer-facing problem with a level definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelIssue {
    pub severity: Severity,
    pub message: String,
}

impl LevelIssue {
    fn error(message: String) -> Self {
        Self {
            severity: Severity::Error,
            message,
        }
    }

    fn warning(message: String) -> Self {
        Self {
            severity: Severity::Warning,
            message,
        }
    }
}

impl std::fmt::Display for LevelIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.severity {
            Severity::Error => write!(f, "error: {}", self.message),
            Severity::Warning => write!(f, "warning: {}", self.message),
        }
    }
}

/// A level that cannot be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelError {
    Invalid { level: String, issues: Vec<LevelIssue> },
}

impl std::fmt::Display for LevelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LevelError::Invalid { level, issues } => {
                write!(f, "level '{}' has {} error(s)", level, issues.len())?;
                if let Some(first) = issues.first() {
                    write!(f, ", first: {}", first.message)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for LevelError {}

/// Run the designer-facing checks on a level definition.
pub fn validate_level(level: &DungeonLevel) -> Vec<LevelIssue> {
    let mut issues = Vec::new();

    if level.name.trim().is_empty() {
        issues.push(LevelIssue::error("level has no name".to_string()));
    }
    if level.templates.is_empty() {
        issues.push(LevelIssue::error(format!("level '{}' has no room templates", level.name)));
    }
    if level.graphs.is_empty() {
        issues.push(LevelIssue::error(format!("level '{}' has no room node graphs", level.name)));
    }

    for required in [RoomNodeType::Entrance, RoomNodeType::CorridorNS, RoomNodeType::CorridorEW] {
        if !level.templates.has_type(required) {
            issues.push(LevelIssue::error(format!(
                "level '{}' has no {} template",
                level.name, required
            )));
        }
    }

    for (_, template) in level.templates.iter() {
        if template.doorways.is_empty() {
            issues.push(LevelIssue::warning(format!(
                "template '{}' has no doorways",
                template.name
            )));
        }
        if template.bounds().is_empty() {
            issues.push(LevelIssue::error(format!(
                "template '{}' has empty bounds {} .. {}",
                template.name, template.lower_bounds, template.upper_bounds
            )));
        }
        if !template.doorways.iter().all(|d| template.bounds().contains(d.position)) {
            issues.push(LevelIssue::error(format!(
                "template '{}' has a doorway outside its bounds",
                template.name
            )));
        }
        for (index, layer) in template.layers.iter().enumerate().filter(|(_, l)| !l.is_well_formed()) {
            issues.push(LevelIssue::error(format!(
                "template '{}' layer {} has {} tiles for a {}x{} grid",
                template.name,
                index,
                layer.tiles.len(),
                layer.width,
                layer.height
            )));
        }
    }

    for graph in &level.graphs {
        if let Err(e) = graph.validate() {
            issues.push(LevelIssue::error(format!("graph '{}': {}", graph.name, e)));
        }
        for node_type in graph.used_types() {
            // corridor and entrance templates are checked once above
            if node_type.is_corridor_or_entrance() || node_type.is_none() {
                continue;
            }
            if !level.templates.has_type(node_type) {
                issues.push(LevelIssue::error(format!(
                    "graph '{}' uses {} but level '{}' has no template for it",
                    graph.name, node_type, level.name
                )));
            }
        }
    }

    issues
}

impl DungeonLevel {
    /// `Ok` when [`validate_level`] reports no errors. Warnings are ignored.
    pub fn check(&self) -> Result<(), LevelError> {
        let errors: Vec<LevelIssue> = validate_level(self)
            .into_iter()
            .filter(|i| i.severity == Severity::Error)
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(LevelError::Invalid {
                level: self.name.clone(),
                issues: errors,
            })
        }
    }
}
