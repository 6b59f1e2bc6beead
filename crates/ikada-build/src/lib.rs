//! ikada のイメージビルド機能
//!
//! ビルドコンテキストの作成、ビルド進捗ストリームのデコード、
//! bollard 経由でのイメージビルドを提供します。

pub mod builder;
pub mod context;
pub mod error;
pub mod progress;

pub use builder::ImageBuilder;
pub use context::ContextBuilder;
pub use error::{BuildError, BuildResult};
pub use progress::{AuxId, BuildEvent, ProgressDecoder, decode_build_progress};
