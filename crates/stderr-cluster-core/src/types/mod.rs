//! Domain types shared by every stage of the engine.

mod record;

pub use record::{
    prepare_records, truncate_lines, ClusterLabel, ClusteredRecord, ErrorRecord, RawRecord, NOISE,
};
