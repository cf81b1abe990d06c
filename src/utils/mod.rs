pub mod utils_time;

pub use utils_time::{current_time_ms, ms_to_rfc3339};
