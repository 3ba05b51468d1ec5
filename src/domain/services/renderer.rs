//! Complication Renderer
//!
//! Builds the short-text and long-text payloads handed back to the
//! watch face host.

use crate::domain::entities::{Address, Location, ResolvedLocation};
use crate::domain::services::formatter::DescriptionFormatter;
use crate::domain::value_objects::ComplicationKind;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Monochromatic icon shown next to the text.
pub const LOCATION_ICON: &str = "ic_my_location";

/// Component opened when the complication is tapped.
pub const ACTIVITY_COMPONENT: &str = "where_am_i_activity";

/// What happens when the user taps the complication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "target", rename_all = "snake_case")]
pub enum TapAction {
    OpenActivity(String),
}

/// Rendered complication payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComplicationData {
    ShortText {
        text: String,
        content_description: String,
        icon: String,
        tap_action: TapAction,
    },
    LongText {
        text: String,
        title: String,
        content_description: String,
        icon: String,
        tap_action: TapAction,
    },
}

impl ComplicationData {
    pub fn kind(&self) -> ComplicationKind {
        match self {
            Self::ShortText { .. } => ComplicationKind::ShortText,
            Self::LongText { .. } => ComplicationKind::LongText,
        }
    }
}

/// Renders complication payloads from pipeline results.
#[derive(Debug, Clone, Default)]
pub struct ComplicationRenderer {
    formatter: DescriptionFormatter,
}

impl ComplicationRenderer {
    pub fn new(formatter: DescriptionFormatter) -> Self {
        Self { formatter }
    }

    pub fn formatter(&self) -> &DescriptionFormatter {
        &self.formatter
    }

    /// Render `kind` for a resolved location, or the fallback texts when
    /// resolution failed. Returns `None` for kinds this provider does not
    /// support.
    pub fn render(
        &self,
        kind: ComplicationKind,
        resolved: Option<&ResolvedLocation>,
        now: DateTime<Utc>,
    ) -> Option<ComplicationData> {
        let location = resolved.map(|r| &r.location);
        let address = resolved.map(|r| &r.address);
        self.render_parts(kind, location, address, now)
    }

    /// Sample payload for the host's configuration UI.
    pub fn preview(&self, kind: ComplicationKind, now: DateTime<Utc>) -> Option<ComplicationData> {
        let location = Location::new(0.0, 0.0, now);
        let address = Address::country("Null Island");
        self.render_parts(kind, Some(&location), Some(&address), now)
    }

    fn render_parts(
        &self,
        kind: ComplicationKind,
        location: Option<&Location>,
        address: Option<&Address>,
        now: DateTime<Utc>,
    ) -> Option<ComplicationData> {
        let time_ago = self.formatter.short_time_ago(location, now);
        let description = self.formatter.full_description(location, address, now);
        let icon = LOCATION_ICON.to_string();
        let tap_action = TapAction::OpenActivity(ACTIVITY_COMPONENT.to_string());

        match kind {
            ComplicationKind::ShortText => Some(ComplicationData::ShortText {
                text: time_ago,
                content_description: description,
                icon,
                tap_action,
            }),
            ComplicationKind::LongText => Some(ComplicationData::LongText {
                text: self.formatter.address_label(address),
                title: time_ago,
                content_description: description,
                icon,
                tap_action,
            }),
            other => {
                tracing::warn!("unexpected complication kind {}", other);
                None
            }
        }
    }
}
