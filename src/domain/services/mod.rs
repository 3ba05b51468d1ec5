mod formatter;
mod location_updates;
mod renderer;

pub use formatter::{DescriptionFormatter, Strings, NO_TIME};
pub use location_updates::{LocationUpdates, UPDATE_CHANNEL_CAPACITY};
pub use renderer::{ComplicationData, ComplicationRenderer, TapAction, ACTIVITY_COMPONENT, LOCATION_ICON};
