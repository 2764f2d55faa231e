//! Entity-level decoding: base attributes, tags, and geometry.

use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{FeedError, FeedResult};
use crate::model::{Bounds, Coord, Entity, EntityKind, Geometry, Member};

use super::{next_event, skip_element};

/// How much of an entity element to decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum EntityDetail {
    /// Base attributes, tags, and kind-conditional geometry.
    Full,
    /// Base attributes and tags only; geometry children are ignored.
    ///
    /// Used for the tombstone side of delete actions, which carries no
    /// geometry in the document.
    BaseOnly,
}

/// Maps an element tag name to the entity kind it declares.
pub(super) fn entity_kind(name: &[u8]) -> Option<EntityKind> {
    match name {
        b"node" => Some(EntityKind::Node),
        b"way" => Some(EntityKind::Way),
        b"relation" => Some(EntityKind::Relation),
        _ => None,
    }
}

/// Flat view of one element's attributes with fail-closed accessors.
///
/// The decoder validates required attributes up front and reports a
/// structured parse error instead of producing partially-populated records.
pub(super) struct Attrs {
    element: String,
    values: Vec<(String, String)>,
}

impl Attrs {
    pub fn from_start(start: &BytesStart<'_>) -> FeedResult<Self> {
        let element = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut values = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| {
                FeedError::Parse(format!("bad attribute in <{}>: {}", element, e))
            })?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| {
                    FeedError::Parse(format!("bad attribute value in <{}>: {}", element, e))
                })?
                .into_owned();
            values.push((key, value));
        }
        Ok(Self { element, values })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn require(&self, key: &str) -> FeedResult<&str> {
        self.get(key).ok_or_else(|| {
            FeedError::Parse(format!(
                "<{}> missing required attribute {:?}",
                self.element, key
            ))
        })
    }

    pub fn require_u64(&self, key: &str) -> FeedResult<u64> {
        let value = self.require(key)?;
        value.parse().map_err(|_| {
            FeedError::Parse(format!(
                "<{}> attribute {:?} is not a non-negative integer: {:?}",
                self.element, key, value
            ))
        })
    }

    pub fn require_f64(&self, key: &str) -> FeedResult<f64> {
        let value = self.require(key)?;
        value.parse().map_err(|_| {
            FeedError::Parse(format!(
                "<{}> attribute {:?} is not a number: {:?}",
                self.element, key, value
            ))
        })
    }
}

/// Decodes one entity element, consuming events up to its closing tag.
///
/// `has_children` is false for self-closing elements, which carry their
/// whole payload in attributes.
pub(super) fn parse_entity<'a>(
    reader: &mut Reader<&'a [u8]>,
    start: &BytesStart<'a>,
    has_children: bool,
    detail: EntityDetail,
) -> FeedResult<Entity> {
    let attrs = Attrs::from_start(start)?;
    let kind = entity_kind(start.local_name().as_ref()).ok_or_else(|| {
        FeedError::Parse(format!(
            "expected an entity element, found <{}>",
            String::from_utf8_lossy(start.local_name().as_ref())
        ))
    })?;

    let id = attrs.require_u64("id")?;
    let version = attrs.require_u64("version")?;
    let timestamp = attrs.require("timestamp")?.to_string();
    let changeset = attrs.require_u64("changeset")?;
    let uid = attrs.require_u64("uid")?;
    let user = attrs.get("user").unwrap_or_default().to_string();
    let visible = attrs.get("visible").map(|v| v != "false").unwrap_or(true);

    let mut tags = BTreeMap::new();
    let mut bounds = None;
    let mut linestring = Vec::new();
    let mut members = Vec::new();

    if has_children {
        let entity_name = start.name().as_ref().to_vec();
        loop {
            match next_event(reader)? {
                Event::Empty(child) => {
                    parse_child(&child, detail, &mut tags, &mut bounds, &mut linestring, &mut members)?;
                }
                Event::Start(child) => {
                    parse_child(&child, detail, &mut tags, &mut bounds, &mut linestring, &mut members)?;
                    skip_element(reader, &child)?;
                }
                Event::End(end) => {
                    if end.name().as_ref() == entity_name.as_slice() {
                        break;
                    }
                    return Err(FeedError::Parse(format!(
                        "unexpected closing tag inside <{}>",
                        kind
                    )));
                }
                Event::Eof => {
                    return Err(FeedError::Parse(format!(
                        "unexpected end of document inside <{}>",
                        kind
                    )));
                }
                _ => {}
            }
        }
    }

    let geometry = match detail {
        EntityDetail::BaseOnly => None,
        EntityDetail::Full => Some(match kind {
            EntityKind::Node => Geometry::Node {
                lat: attrs.require_f64("lat")?,
                lon: attrs.require_f64("lon")?,
            },
            EntityKind::Way => Geometry::Way {
                bounds: bounds.ok_or_else(|| missing_bounds(kind, id))?,
                linestring: if linestring.is_empty() {
                    None
                } else {
                    Some(linestring)
                },
            },
            EntityKind::Relation => Geometry::Relation {
                bounds: bounds.ok_or_else(|| missing_bounds(kind, id))?,
                members,
            },
        }),
    };

    Ok(Entity {
        kind,
        id,
        version,
        timestamp,
        changeset,
        uid,
        user,
        visible,
        tags,
        geometry,
    })
}

fn parse_child(
    child: &BytesStart<'_>,
    detail: EntityDetail,
    tags: &mut BTreeMap<String, String>,
    bounds: &mut Option<Bounds>,
    linestring: &mut Vec<Coord>,
    members: &mut Vec<Member>,
) -> FeedResult<()> {
    match child.local_name().as_ref() {
        // tags belong to the base attributes and are read in both modes
        b"tag" => {
            let attrs = Attrs::from_start(child)?;
            tags.insert(
                attrs.require("k")?.to_string(),
                attrs.require("v")?.to_string(),
            );
        }
        b"bounds" if detail == EntityDetail::Full => {
            let attrs = Attrs::from_start(child)?;
            *bounds = Some(Bounds {
                maxlat: attrs.require_f64("maxlat")?,
                maxlon: attrs.require_f64("maxlon")?,
                minlat: attrs.require_f64("minlat")?,
                minlon: attrs.require_f64("minlon")?,
            });
        }
        b"nd" if detail == EntityDetail::Full => {
            let attrs = Attrs::from_start(child)?;
            linestring.push(Coord {
                lat: attrs.require_f64("lat")?,
                lon: attrs.require_f64("lon")?,
            });
        }
        b"members" if detail == EntityDetail::Full => {
            let attrs = Attrs::from_start(child)?;
            let kind_name = attrs.require("type")?;
            let kind = entity_kind(kind_name.as_bytes()).ok_or_else(|| {
                FeedError::Parse(format!("unknown member type {:?}", kind_name))
            })?;
            members.push(Member {
                kind,
                ref_id: attrs.require_u64("ref")?,
                role: attrs.get("role").unwrap_or_default().to_string(),
            });
        }
        _ => {}
    }
    Ok(())
}

fn missing_bounds(kind: EntityKind, id: u64) -> FeedError {
    FeedError::Parse(format!("<{} id={}> missing <bounds>", kind, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_snippet(xml: &str, detail: EntityDetail) -> FeedResult<Entity> {
        let mut reader = Reader::from_str(xml);
        loop {
            match reader.read_event().expect("snippet is well-formed") {
                Event::Start(start) => return parse_entity(&mut reader, &start, true, detail),
                Event::Empty(start) => return parse_entity(&mut reader, &start, false, detail),
                Event::Eof => panic!("no element in snippet"),
                _ => {}
            }
        }
    }

    const NODE: &str = r#"<node id="5" version="2" timestamp="2024-03-01T12:00:00Z"
        changeset="42" uid="7" user="mapper" lat="10.5" lon="-20.25"/>"#;

    #[test]
    fn test_node_base_attributes() {
        let entity = parse_snippet(NODE, EntityDetail::Full).unwrap();
        assert_eq!(entity.kind, EntityKind::Node);
        assert_eq!(entity.id, 5);
        assert_eq!(entity.version, 2);
        assert_eq!(entity.timestamp, "2024-03-01T12:00:00Z");
        assert_eq!(entity.changeset, 42);
        assert_eq!(entity.uid, 7);
        assert_eq!(entity.user, "mapper");
        assert!(entity.visible);
    }

    #[test]
    fn test_node_geometry_from_attributes() {
        let entity = parse_snippet(NODE, EntityDetail::Full).unwrap();
        assert_eq!(
            entity.geometry,
            Some(Geometry::Node {
                lat: 10.5,
                lon: -20.25
            })
        );
    }

    #[test]
    fn test_base_only_skips_geometry() {
        let xml = r#"<node id="5" version="3" timestamp="t" changeset="42" uid="7"
            visible="false"/>"#;
        let entity = parse_snippet(xml, EntityDetail::BaseOnly).unwrap();
        assert_eq!(entity.geometry, None);
        assert!(!entity.visible);
    }

    #[test]
    fn test_base_only_still_reads_tags() {
        let xml = r#"<way id="9" version="1" timestamp="t" changeset="1" uid="1">
            <tag k="highway" v="residential"/>
        </way>"#;
        let entity = parse_snippet(xml, EntityDetail::BaseOnly).unwrap();
        assert_eq!(entity.tags.get("highway").map(String::as_str), Some("residential"));
        assert_eq!(entity.geometry, None);
    }

    #[test]
    fn test_missing_user_defaults_to_empty() {
        let xml = r#"<node id="5" version="1" timestamp="t" changeset="1" uid="1"
            lat="0" lon="0"/>"#;
        let entity = parse_snippet(xml, EntityDetail::Full).unwrap();
        assert_eq!(entity.user, "");
    }

    #[test]
    fn test_visible_only_false_when_explicit() {
        let xml = r#"<node id="5" version="1" timestamp="t" changeset="1" uid="1"
            visible="true" lat="0" lon="0"/>"#;
        assert!(parse_snippet(xml, EntityDetail::Full).unwrap().visible);
    }

    #[test]
    fn test_missing_id_is_parse_error() {
        let xml = r#"<node version="1" timestamp="t" changeset="1" uid="1" lat="0" lon="0"/>"#;
        match parse_snippet(xml, EntityDetail::Full) {
            Err(FeedError::Parse(msg)) => assert!(msg.contains("id")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_version_is_parse_error() {
        let xml = r#"<node id="5" version="x" timestamp="t" changeset="1" uid="1"
            lat="0" lon="0"/>"#;
        assert!(matches!(
            parse_snippet(xml, EntityDetail::Full),
            Err(FeedError::Parse(_))
        ));
    }

    #[test]
    fn test_node_missing_lat_is_parse_error_in_full_mode() {
        let xml = r#"<node id="5" version="1" timestamp="t" changeset="1" uid="1" lon="0"/>"#;
        assert!(parse_snippet(xml, EntityDetail::Full).is_err());
        assert!(parse_snippet(xml, EntityDetail::BaseOnly).is_ok());
    }

    #[test]
    fn test_way_collects_bounds_and_linestring() {
        let xml = r#"<way id="8" version="4" timestamp="t" changeset="3" uid="2" user="m">
            <bounds maxlat="1.5" maxlon="2.5" minlat="0.5" minlon="1.0"/>
            <nd lat="0.5" lon="1.0"/>
            <nd lat="1.5" lon="2.5"/>
        </way>"#;
        let entity = parse_snippet(xml, EntityDetail::Full).unwrap();
        match entity.geometry {
            Some(Geometry::Way { bounds, linestring }) => {
                assert_eq!(bounds.maxlat, 1.5);
                assert_eq!(bounds.minlon, 1.0);
                let points = linestring.unwrap();
                assert_eq!(points.len(), 2);
                assert_eq!(points[0], Coord { lat: 0.5, lon: 1.0 });
            }
            other => panic!("expected way geometry, got {:?}", other),
        }
    }

    #[test]
    fn test_way_without_points_omits_linestring() {
        let xml = r#"<way id="8" version="1" timestamp="t" changeset="1" uid="1">
            <bounds maxlat="1" maxlon="2" minlat="0" minlon="0"/>
        </way>"#;
        let entity = parse_snippet(xml, EntityDetail::Full).unwrap();
        assert_eq!(
            entity.geometry,
            Some(Geometry::Way {
                bounds: Bounds {
                    maxlat: 1.0,
                    maxlon: 2.0,
                    minlat: 0.0,
                    minlon: 0.0
                },
                linestring: None
            })
        );
    }

    #[test]
    fn test_way_missing_bounds_is_parse_error() {
        let xml = r#"<way id="8" version="1" timestamp="t" changeset="1" uid="1"/>"#;
        match parse_snippet(xml, EntityDetail::Full) {
            Err(FeedError::Parse(msg)) => assert!(msg.contains("bounds")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_relation_collects_members_in_order() {
        let xml = r#"<relation id="12" version="2" timestamp="t" changeset="9" uid="4">
            <bounds maxlat="1" maxlon="1" minlat="0" minlon="0"/>
            <members type="way" ref="100" role="outer"/>
            <members type="node" ref="200" role=""/>
        </relation>"#;
        let entity = parse_snippet(xml, EntityDetail::Full).unwrap();
        match entity.geometry {
            Some(Geometry::Relation { members, .. }) => {
                assert_eq!(members.len(), 2);
                assert_eq!(members[0].kind, EntityKind::Way);
                assert_eq!(members[0].ref_id, 100);
                assert_eq!(members[0].role, "outer");
                assert_eq!(members[1].kind, EntityKind::Node);
            }
            other => panic!("expected relation geometry, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_member_type_is_parse_error() {
        let xml = r#"<relation id="12" version="1" timestamp="t" changeset="1" uid="1">
            <bounds maxlat="1" maxlon="1" minlat="0" minlon="0"/>
            <members type="area" ref="1" role=""/>
        </relation>"#;
        assert!(matches!(
            parse_snippet(xml, EntityDetail::Full),
            Err(FeedError::Parse(_))
        ));
    }

    #[test]
    fn test_tag_missing_value_is_parse_error() {
        let xml = r#"<node id="5" version="1" timestamp="t" changeset="1" uid="1" lat="0" lon="0">
            <tag k="highway"/>
        </node>"#;
        assert!(matches!(
            parse_snippet(xml, EntityDetail::Full),
            Err(FeedError::Parse(_))
        ));
    }

    #[test]
    fn test_unknown_children_are_ignored() {
        let xml = r#"<node id="5" version="1" timestamp="t" changeset="1" uid="1" lat="0" lon="0">
            <unknown-extension foo="bar"><deep/></unknown-extension>
            <tag k="name" v="corner"/>
        </node>"#;
        let entity = parse_snippet(xml, EntityDetail::Full).unwrap();
        assert_eq!(entity.tags.len(), 1);
    }
}
