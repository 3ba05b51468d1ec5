mod api_server;

pub use api_server::{router, ApiServer, ApiState, DEFAULT_RESPONSE_TIMEOUT};

// Re-export for external use (e.g., integration tests)
#[allow(unused_imports)]
pub use api_server::{HealthResponse, RefreshesResponse, TileResponse};
