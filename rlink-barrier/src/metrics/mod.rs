pub mod metric;

pub use metric::compute;
pub use metric::register_counter;
pub use metric::register_gauge;
pub use metric::Counter;
pub use metric::Gauge;
pub use metric::Tag;
