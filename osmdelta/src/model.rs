//! Typed data model for augmented diff contents.
//!
//! An augmented diff describes the entity-level differences between two
//! numbered snapshots of the OpenStreetMap dataset. Each `<action>` in the
//! document becomes one [`ChangeRecord`] holding up to two [`Entity`]
//! snapshots: the state before the edit and the state after it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The three kinds of geospatial object in the dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Node,
    Way,
    Relation,
}

impl EntityKind {
    /// Wire name of the kind, as it appears in element tags.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Node => "node",
            EntityKind::Way => "way",
            EntityKind::Relation => "relation",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounding rectangle attached to way and relation geometry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub maxlat: f64,
    pub maxlon: f64,
    pub minlat: f64,
    pub minlon: f64,
}

/// One point of a way's line-string.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

/// A reference from a relation to another entity, with a role label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Member {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    #[serde(rename = "ref")]
    pub ref_id: u64,
    pub role: String,
}

/// Kind-dependent geometry of an entity snapshot.
///
/// Base-attributes-only snapshots (delete tombstones) carry no geometry at
/// all; the parser leaves [`Entity::geometry`] as `None` for those.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Geometry {
    Node {
        lat: f64,
        lon: f64,
    },
    Way {
        bounds: Bounds,
        /// Ordered lat/lon points; omitted entirely when the document
        /// carried no node references.
        #[serde(skip_serializing_if = "Option::is_none")]
        linestring: Option<Vec<Coord>>,
    },
    Relation {
        bounds: Bounds,
        members: Vec<Member>,
    },
}

/// A snapshot of one map entity at one version.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub id: u64,
    pub version: u64,
    /// ISO-8601 timestamp from the source, never interpreted.
    pub timestamp: String,
    pub changeset: u64,
    pub uid: u64,
    /// Display name of the editing user; may be empty.
    pub user: String,
    /// True unless the source explicitly marks the snapshot `visible="false"`.
    pub visible: bool,
    pub tags: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
}

/// What a diff action did to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Create,
    Modify,
    Delete,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeAction::Create => "create",
            ChangeAction::Modify => "modify",
            ChangeAction::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// One diff action: the entity state before and/or after an edit.
///
/// Invariant: at least one of `previous`/`current` is set. The parser drops
/// records with neither side before they are ever emitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub action: ChangeAction,
    /// State before the edit: set for modify and delete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<Entity>,
    /// State after the edit: set for create and modify; for delete this is
    /// the base-attributes-only tombstone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<Entity>,
}

impl ChangeRecord {
    /// The most recent snapshot carried by this record.
    pub fn entity(&self) -> Option<&Entity> {
        self.current.as_ref().or(self.previous.as_ref())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.previous.is_none() && self.current.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_node(id: u64) -> Entity {
        Entity {
            kind: EntityKind::Node,
            id,
            version: 1,
            timestamp: "2024-03-01T12:00:00Z".to_string(),
            changeset: 42,
            uid: 7,
            user: "mapper".to_string(),
            visible: true,
            tags: BTreeMap::new(),
            geometry: Some(Geometry::Node {
                lat: 10.0,
                lon: 20.0,
            }),
        }
    }

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(EntityKind::Node.as_str(), "node");
        assert_eq!(EntityKind::Way.as_str(), "way");
        assert_eq!(EntityKind::Relation.as_str(), "relation");
    }

    #[test]
    fn test_record_entity_prefers_current() {
        let record = ChangeRecord {
            action: ChangeAction::Modify,
            previous: Some(sample_node(5)),
            current: Some(sample_node(6)),
        };
        assert_eq!(record.entity().unwrap().id, 6);
    }

    #[test]
    fn test_record_entity_falls_back_to_previous() {
        let record = ChangeRecord {
            action: ChangeAction::Delete,
            previous: Some(sample_node(5)),
            current: None,
        };
        assert_eq!(record.entity().unwrap().id, 5);
    }

    #[test]
    fn test_node_serializes_with_geometry() {
        let json = serde_json::to_string(&sample_node(5)).unwrap();
        assert!(json.contains("\"kind\":\"node\""));
        assert!(json.contains("\"geometry\":{\"node\":{\"lat\":10.0,\"lon\":20.0}}"));
    }

    #[test]
    fn test_tombstone_omits_geometry() {
        let mut entity = sample_node(5);
        entity.geometry = None;
        entity.visible = false;
        let json = serde_json::to_string(&entity).unwrap();
        assert!(!json.contains("geometry"));
        assert!(json.contains("\"visible\":false"));
    }

    #[test]
    fn test_way_linestring_omitted_when_absent() {
        let geometry = Geometry::Way {
            bounds: Bounds {
                maxlat: 1.0,
                maxlon: 2.0,
                minlat: 0.0,
                minlon: 0.5,
            },
            linestring: None,
        };
        let json = serde_json::to_string(&geometry).unwrap();
        assert!(!json.contains("linestring"));
    }

    #[test]
    fn test_member_wire_field_names() {
        let member = Member {
            kind: EntityKind::Way,
            ref_id: 99,
            role: "outer".to_string(),
        };
        let json = serde_json::to_string(&member).unwrap();
        assert!(json.contains("\"type\":\"way\""));
        assert!(json.contains("\"ref\":99"));
        assert!(json.contains("\"role\":\"outer\""));
    }
}
