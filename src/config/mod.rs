pub mod load;
pub mod types;
mod workspace;

pub use types::{
    BoxBlur, CompositeSpec, Config, DirectoryLayout, EncoderPreset, Language, NamingPolicy,
    Resolution, TempCleanupPolicy, ToolPaths, TransformSpec, UserSettings,
};
