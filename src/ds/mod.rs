pub mod shard;

pub use shard::{split_capacity, ShardSelector};
