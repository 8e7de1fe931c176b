//! JSON run report

use crate::config::{DeckConfig, Units};
use crate::contact::types::{MembershipPolicy, SurfaceRole};
use crate::error::{Result, TetDeckError};
use crate::mesh::types::GlobalMesh;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What one object contributed to the global mesh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSummary {
    pub name: String,
    pub role: SurfaceRole,

    /// Global id of the object's first node
    pub first_node_id: usize,
    pub nodes: usize,

    /// Global id of the object's first element
    pub first_element_id: usize,
    pub elements: usize,

    /// Faces added to the master or slave surface
    pub tagged_faces: usize,
}

/// Counts over the whole deck
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckTotals {
    pub nodes: usize,
    pub elements: usize,
    pub master_faces: usize,
    pub slave_faces: usize,
    pub ground_nodes: usize,
}

/// Summary of one build
#[derive(Debug, Serialize, Deserialize)]
pub struct RunReport {
    /// Source scene file
    pub scene_file: String,

    /// Written deck
    pub deck_file: String,

    /// Timestamp when the deck was built
    pub timestamp: String,

    pub policy: MembershipPolicy,
    pub first_match_only: bool,
    pub units: Units,

    pub objects: Vec<ObjectSummary>,
    pub totals: DeckTotals,
}

impl RunReport {
    pub fn new(
        scene_file: String,
        deck_file: String,
        config: &DeckConfig,
        objects: Vec<ObjectSummary>,
        mesh: &GlobalMesh,
        ground_nodes: usize,
    ) -> Self {
        Self {
            scene_file,
            deck_file,
            timestamp: chrono::Utc::now().to_rfc3339(),
            policy: config.tagging.policy,
            first_match_only: config.tagging.first_match_only(),
            units: config.units,
            objects,
            totals: DeckTotals {
                nodes: mesh.num_nodes(),
                elements: mesh.num_elements(),
                master_faces: mesh.masters.len(),
                slave_faces: mesh.slaves.len(),
                ground_nodes,
            },
        }
    }

    /// Export report to JSON file
    pub fn export<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        serde_json::to_writer_pretty(file, self).map_err(|e| {
            TetDeckError::ConfigError(format!("Failed to write JSON report: {}", e))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_report() {
        let summary = ObjectSummary {
            name: "A".to_string(),
            role: SurfaceRole::Master,
            first_node_id: 1,
            nodes: 10,
            first_element_id: 1,
            elements: 1,
            tagged_faces: 4,
        };
        let report = RunReport::new(
            "scene.json".to_string(),
            "model.inp".to_string(),
            &DeckConfig::default(),
            vec![summary.clone()],
            &GlobalMesh::new(),
            0,
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        report.export(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let loaded: RunReport = serde_json::from_str(&text).unwrap();
        assert_eq!(loaded.objects, vec![summary]);
        assert_eq!(loaded.policy, MembershipPolicy::VertexSet);
        assert!(text.contains("\"role\": \"master\""));
        assert!(text.contains("\"policy\": \"vertex-set\""));
        assert!(chrono::DateTime::parse_from_rfc3339(&loaded.timestamp).is_ok());
    }
}
