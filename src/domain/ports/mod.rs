mod complication_host;
mod geocoder;
mod location_source;
mod location_store;
mod permission_gate;
mod text_view;

pub use complication_host::ComplicationHost;
pub use geocoder::Geocoder;
pub use location_source::LocationSource;
pub use location_store::LocationStore;
pub use permission_gate::PermissionGate;
pub use text_view::TextView;
