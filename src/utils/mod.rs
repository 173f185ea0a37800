pub mod time;

pub use time::{format_time_key, is_date_interval, parse_start_date, unix_now};
