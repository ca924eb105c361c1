mod cache;
mod clock;

pub use cache::{CacheEntry, CacheStats, ResponseCache};
pub use clock::{Clock, ManualClock, SystemClock};
