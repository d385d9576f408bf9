pub mod split;
pub mod store;

pub use split::{day_key, local_midnight, split_interval};
pub use store::{DayTotals, History};
