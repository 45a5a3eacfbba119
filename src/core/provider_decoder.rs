//! Provider-specific decoding of `<EventData>` payloads.
//!
//! Each provider defines its own payload schema. [`decoder_for`] picks a
//! [`ProviderDecoder`] from the event's provider name: Sysmon events get a
//! labelled header and strictly named fields, everything else gets the
//! lenient generic layout.

use crate::util::constants::SYSMON_PROVIDER;
use crate::util::error::{EventScopeError, Result};

/// Turns an `<EventData>` element into multi-line detail text.
pub trait ProviderDecoder: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Render the payload. `event_id` is the `<System>/<EventID>` text.
    ///
    /// The returned text has trailing whitespace trimmed.
    fn decode(&self, event_data: roxmltree::Node<'_, '_>, event_id: &str) -> Result<String>;
}

/// Decoder for `Microsoft-Windows-Sysmon` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysmonDecoder;

/// Decoder for every provider without a dedicated decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericDecoder;

static SYSMON_DECODER: SysmonDecoder = SysmonDecoder;
static GENERIC_DECODER: GenericDecoder = GenericDecoder;

/// Select the decoder for a provider. Always returns a decoder.
pub fn decoder_for(provider_name: &str) -> &'static dyn ProviderDecoder {
    if provider_name == SYSMON_PROVIDER {
        &SYSMON_DECODER
    } else {
        &GENERIC_DECODER
    }
}

impl SysmonDecoder {
    /// Human-readable label for the Sysmon event types we recognise.
    pub fn event_label(event_id: &str) -> Option<&'static str> {
        match event_id {
            "1" => Some("Process Create"),
            "3" => Some("Network Connect"),
            "7" => Some("Image Load"),
            "8" => Some("Create Remote Thread"),
            "10" => Some("Process Access"),
            "11" => Some("File Create"),
            "22" => Some("DNS Query"),
            _ => None,
        }
    }
}

impl ProviderDecoder for SysmonDecoder {
    fn name(&self) -> &'static str {
        "sysmon"
    }

    fn decode(&self, event_data: roxmltree::Node<'_, '_>, event_id: &str) -> Result<String> {
        let mut details = match Self::event_label(event_id) {
            Some(label) => format!("[{label}]\n"),
            None => format!("[Sysmon Event ID: {event_id}]\n"),
        };

        for data in data_children(event_data) {
            // Sysmon always names its fields; an unnamed one means the
            // payload is not what this decoder understands.
            let name = data.attribute("Name").ok_or_else(|| {
                EventScopeError::Schema(format!(
                    "Sysmon event {event_id} has a <Data> element without a Name attribute"
                ))
            })?;
            details.push_str(name);
            details.push_str(": ");
            details.push_str(&element_text(data));
            details.push('\n');
        }

        Ok(details.trim_end().to_owned())
    }
}

impl ProviderDecoder for GenericDecoder {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn decode(&self, event_data: roxmltree::Node<'_, '_>, _event_id: &str) -> Result<String> {
        let mut details = String::new();
        for data in data_children(event_data) {
            if let Some(name) = data.attribute("Name") {
                details.push_str(name);
                details.push_str(": ");
            }
            details.push_str(&element_text(data));
            details.push('\n');
        }
        Ok(details.trim_end().to_owned())
    }
}

/// The `<Data>` children of an `<EventData>` element, in document order.
fn data_children<'a, 'input>(
    event_data: roxmltree::Node<'a, 'input>,
) -> impl Iterator<Item = roxmltree::Node<'a, 'input>> {
    event_data
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "Data")
}

/// Concatenated text of a node and all its descendants, untrimmed.
pub(crate) fn element_text(node: roxmltree::Node<'_, '_>) -> String {
    node.descendants()
        .filter(|d| d.is_text())
        .filter_map(|d| d.text())
        .collect()
}
