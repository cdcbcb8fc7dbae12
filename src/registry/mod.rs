pub mod sink_registry;


pub use sink_registry::{DEFAULT_CAPACITY, MAX_SINK_NAME_LEN, SinkEntry, SinkId, SinkInfo, SinkRegistry};
