// Soundfield: spatial audio mixing engine
// Expose the member crates' public surface for embedders and the
// integration tests

pub use engine_config::ConfigManager;
pub use engine_core::{
    Buffer, BufferArena, BufferHandle, DistanceModel, Error, Listener, PlayState, QueueItem,
    QueueItemState, RenderSettings, SampleFormat, Source,
};
pub use mixer::{mix, Context, SharedContext};
pub use spatial::{distance_attenuation, source_params, SourceParams};
