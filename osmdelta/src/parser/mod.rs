//! Augmented diff document decoding.
//!
//! Turns the diff endpoint's XML body into an ordered sequence of
//! [`ChangeRecord`]s. Each `<action>` element yields at most one record:
//!
//! - `create`: the contained entity becomes `current`.
//! - `modify`: the entities under `<old>`/`<new>` become
//!   `previous`/`current`, both with full geometry.
//! - `delete`: `<old>` parses with full geometry, `<new>` as a
//!   base-attributes-only tombstone.
//!
//! Records that end up with neither side (stray empty actions) are dropped
//! here and never reach a consumer.
//!
//! # Error policy
//!
//! A body with no markup at all signals [`FeedError::EmptyDiff`] so the
//! scan loop can treat it like any other retryable cycle failure. A
//! present document with zero actions is a successful, empty parse.
//! Schema violations (missing required attributes, unknown action types,
//! malformed XML) are [`FeedError::Parse`].

mod entity;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{FeedError, FeedResult};
use crate::model::{ChangeAction, ChangeRecord, Entity};

use entity::{entity_kind, parse_entity, Attrs, EntityDetail};

/// Decodes a diff document into change records, preserving document order.
pub fn parse_diff(document: &str) -> FeedResult<Vec<ChangeRecord>> {
    let mut reader = Reader::from_str(document);
    let mut records = Vec::new();
    let mut saw_element = false;

    loop {
        match next_event(&mut reader)? {
            Event::Start(start) => {
                saw_element = true;
                if start.local_name().as_ref() == b"action" {
                    if let Some(record) = parse_action(&mut reader, &start)? {
                        records.push(record);
                    }
                }
                // other containers (the root, <note>, <meta>) are scanned
                // through rather than skipped so every action is reached
            }
            Event::Empty(start) => {
                saw_element = true;
                if start.local_name().as_ref() == b"action" {
                    // no children means neither side can be present; the
                    // type attribute is still validated before dropping
                    action_kind(&Attrs::from_start(&start)?)?;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_element {
        return Err(FeedError::EmptyDiff);
    }
    Ok(records)
}

/// Decodes one `<action>` element, consuming events up to its closing tag.
///
/// Returns `None` for records with neither side set.
fn parse_action<'a>(
    reader: &mut Reader<&'a [u8]>,
    start: &BytesStart<'a>,
) -> FeedResult<Option<ChangeRecord>> {
    let action = action_kind(&Attrs::from_start(start)?)?;
    let mut previous = None;
    let mut current = None;

    loop {
        match next_event(reader)? {
            Event::Start(child) => match child.local_name().as_ref() {
                name if action == ChangeAction::Create && entity_kind(name).is_some() => {
                    if current.is_none() {
                        current = Some(parse_entity(reader, &child, true, EntityDetail::Full)?);
                    } else {
                        skip_element(reader, &child)?;
                    }
                }
                b"old" => {
                    let parsed = parse_side(reader, &child, EntityDetail::Full)?;
                    if previous.is_none() {
                        previous = parsed;
                    }
                }
                b"new" => {
                    let detail = if action == ChangeAction::Delete {
                        EntityDetail::BaseOnly
                    } else {
                        EntityDetail::Full
                    };
                    let parsed = parse_side(reader, &child, detail)?;
                    if current.is_none() {
                        current = parsed;
                    }
                }
                _ => skip_element(reader, &child)?,
            },
            Event::Empty(child) => {
                if action == ChangeAction::Create
                    && entity_kind(child.local_name().as_ref()).is_some()
                    && current.is_none()
                {
                    current = Some(parse_entity(reader, &child, false, EntityDetail::Full)?);
                }
                // empty <old/> / <new/> wrappers carry nothing
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(FeedError::Parse(
                    "unexpected end of document inside <action>".to_string(),
                ));
            }
            _ => {}
        }
    }

    let record = ChangeRecord {
        action,
        previous,
        current,
    };
    Ok((!record.is_empty()).then_some(record))
}

/// Decodes the entity inside an `<old>`/`<new>` wrapper, consuming events
/// up to the wrapper's closing tag. An empty wrapper yields `None`.
fn parse_side<'a>(
    reader: &mut Reader<&'a [u8]>,
    wrapper: &BytesStart<'a>,
    detail: EntityDetail,
) -> FeedResult<Option<Entity>> {
    let mut parsed = None;
    loop {
        match next_event(reader)? {
            Event::Start(child) => {
                if parsed.is_none() && entity_kind(child.local_name().as_ref()).is_some() {
                    parsed = Some(parse_entity(reader, &child, true, detail)?);
                } else {
                    skip_element(reader, &child)?;
                }
            }
            Event::Empty(child) => {
                if parsed.is_none() && entity_kind(child.local_name().as_ref()).is_some() {
                    parsed = Some(parse_entity(reader, &child, false, detail)?);
                }
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(FeedError::Parse(format!(
                    "unexpected end of document inside <{}>",
                    String::from_utf8_lossy(wrapper.local_name().as_ref())
                )));
            }
            _ => {}
        }
    }
    Ok(parsed)
}

fn action_kind(attrs: &Attrs) -> FeedResult<ChangeAction> {
    match attrs.require("type")? {
        "create" => Ok(ChangeAction::Create),
        "modify" => Ok(ChangeAction::Modify),
        "delete" => Ok(ChangeAction::Delete),
        other => Err(FeedError::Parse(format!("unknown action type {:?}", other))),
    }
}

fn next_event<'a>(reader: &mut Reader<&'a [u8]>) -> FeedResult<Event<'a>> {
    reader
        .read_event()
        .map_err(|e| FeedError::Parse(format!("malformed diff document: {}", e)))
}

fn skip_element(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> FeedResult<()> {
    reader
        .read_to_end(start.name())
        .map_err(|e| FeedError::Parse(format!("malformed diff document: {}", e)))?;
    Ok(())
}
