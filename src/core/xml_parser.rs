//! XML repair and event extraction for `wevtutil qe /f:xml` output.
//!
//! `wevtutil` prints one `<Event>` element per event with no enclosing root,
//! so the text is not a well-formed document on its own. [`repair_fragment`]
//! wraps it in a synthetic `<Events>` root; [`decode_events`] parses the
//! result with `roxmltree` and decodes each event.
//!
//! Per-event schema:
//! ```xml
//! <Event xmlns="http://schemas.microsoft.com/win/2004/08/events/event">
//!   <System>
//!     <Provider Name="..." />
//!     <EventID>1001</EventID>
//!     <Level>2</Level>
//!     <TimeCreated SystemTime="2024-01-15T10:23:45.1234567Z" />
//!     ...
//!   </System>
//!   <EventData>
//!     <Data Name="key">value</Data>
//!     ...
//!   </EventData>
//! </Event>
//! ```

use crate::core::event_record::DecodedEvent;
use crate::core::provider_decoder::{decoder_for, element_text};
use crate::util::constants::{NO_EVENT_DATA, SYNTHETIC_ROOT};
use crate::util::error::{missing_field, EventScopeError, Result};

/// Wrap rootless tool output in a single synthetic root element.
///
/// A UTF-8 BOM and a leading XML declaration are dropped first, since
/// neither may appear inside an element.
pub fn repair_fragment(raw: &str) -> String {
    let mut body = raw.trim_start_matches('\u{feff}').trim_start();
    if body.starts_with("<?xml") {
        if let Some(end) = body.find("?>") {
            body = &body[end + 2..];
        }
    }
    format!("<{SYNTHETIC_ROOT}>{body}</{SYNTHETIC_ROOT}>")
}

/// Parse raw tool output and decode every `<Event>` in document order.
///
/// # Errors
/// - [`EventScopeError::XmlParse`] if the repaired text is not well-formed.
/// - [`EventScopeError::Schema`] if any event lacks a required `<System>`
///   field, or its provider decoder rejects the payload.
///
/// Either every event decodes or the whole call fails.
pub fn decode_events(raw: &str) -> Result<Vec<DecodedEvent>> {
    let repaired = repair_fragment(raw);
    let doc = roxmltree::Document::parse(&repaired)
        .map_err(|e| EventScopeError::XmlParse(format!("Failed to parse tool output: {e}")))?;

    let events: Vec<DecodedEvent> = doc
        .root_element()
        .children()
        .filter(|n| is_element_named(n, "Event"))
        .enumerate()
        .map(|(index, event)| decode_event(event, index))
        .collect::<Result<_>>()?;

    tracing::debug!("Decoded {} events", events.len());
    Ok(events)
}

/// Decode one `<Event>` element. `index` is its position, for error messages.
fn decode_event(event: roxmltree::Node<'_, '_>, index: usize) -> Result<DecodedEvent> {
    let system = find_child(event, "System").ok_or_else(|| missing_field("<System>", index))?;

    let event_id = find_child(system, "EventID")
        .map(element_text)
        .ok_or_else(|| missing_field("<EventID>", index))?
        .trim()
        .to_owned();

    let time_created = find_child(system, "TimeCreated")
        .and_then(|e| e.attribute("SystemTime"))
        .ok_or_else(|| missing_field("TimeCreated/@SystemTime", index))?
        .to_owned();

    let provider_name = find_child(system, "Provider")
        .and_then(|e| e.attribute("Name"))
        .ok_or_else(|| missing_field("Provider/@Name", index))?
        .to_owned();

    let level = find_child(system, "Level")
        .map(element_text)
        .ok_or_else(|| missing_field("<Level>", index))?
        .trim()
        .to_owned();

    let full_details = match find_child(event, "EventData") {
        Some(event_data) => {
            let decoder = decoder_for(&provider_name);
            tracing::trace!(
                "Event #{index} ({provider_name}/{event_id}) -> {} decoder",
                decoder.name()
            );
            decoder.decode(event_data, &event_id)?
        }
        None => NO_EVENT_DATA.to_owned(),
    };

    Ok(DecodedEvent {
        event_id,
        time_created,
        provider_name,
        level,
        full_details,
    })
}

/// Find a direct child element by local name, ignoring namespace.
fn find_child<'a, 'input>(
    parent: roxmltree::Node<'a, 'input>,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    parent.children().find(|n| is_element_named(n, local_name))
}

fn is_element_named(node: &roxmltree::Node<'_, '_>, local_name: &str) -> bool {
    node.is_element() && node.tag_name().name() == local_name
}
