pub mod clock;
pub mod formatting;
pub mod generator;
pub mod models;
pub mod resolver;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use formatting::{UNAVAILABLE_PERIOD, format_airing_period, format_period_or_unavailable};
pub use generator::{episode_season_anchor, generate, last_weekday_of_month, next_winter_anchor, post_cutoff};
pub use models::{Convention, ScheduleIdentity, ScheduleWindow, Season, validate_season_week};
pub use resolver::Resolver;
pub use store::{CacheInfo, CacheStats, WindowStore};
