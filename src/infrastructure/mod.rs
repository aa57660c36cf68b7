pub mod logging;
pub mod model_cache;

pub use logging::init_logging;
pub use model_cache::{CacheStats, ModelCache, ModelKey};
