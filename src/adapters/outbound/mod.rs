mod config_permission_gate;
mod fixed_location_source;
mod gpsd_location_source;
mod logging_complication_host;
mod nominatim_geocoder;
mod sqlite_location_store;
mod stdout_text_view;

pub use config_permission_gate::ConfigPermissionGate;
pub use fixed_location_source::FixedLocationSource;
pub use gpsd_location_source::{GpsdLocationSource, DEFAULT_GPSD_ADDR};
pub use logging_complication_host::LoggingComplicationHost;
pub use nominatim_geocoder::{NominatimGeocoder, DEFAULT_NOMINATIM_URL};
pub use sqlite_location_store::SqliteLocationStore;
pub use stdout_text_view::StdoutTextView;
