//! ikada のコンテナオーケストレーション
//!
//! 統合テストからコンテナの起動・healthy 待機・HTTP 疎通確認を行うための
//! 薄いユーティリティ群。イメージのビルドは `ikada-build` が担当します。

pub mod docker;
pub mod error;
pub mod host;
pub mod port;
pub mod probe;
pub mod runner;
pub mod waiter;

pub use docker::init_docker;
pub use error::{HarnessError, Result};
pub use host::docker_host_address;
pub use port::free_port;
pub use probe::fetch_body;
pub use runner::{ServiceSpec, TestContainer, spec_to_container_config};
pub use waiter::{WaitConfig, wait_for_healthy};
