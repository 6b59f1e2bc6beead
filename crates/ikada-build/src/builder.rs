// Bollard 0.19 の非推奨ビルド API を一時的に使用
#![allow(deprecated)]

use crate::error::{BuildError, Result};
use crate::progress::{BuildEvent, ProgressDecoder};
use bollard::Docker;
use bollard::image::BuildImageOptions;
use futures_util::stream::StreamExt;

pub struct ImageBuilder {
    docker: Docker,
}

impl ImageBuilder {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// イメージをビルドし、解決されたイメージ ID を返す
    ///
    /// ビルド出力の各 stream ペイロードは到着順に `sink` へ渡される。
    /// エンジンがエラーイベントを返した時点で即座に失敗する。
    pub async fn build_image(
        &self,
        context_data: Vec<u8>,
        tag: &str,
        mut sink: impl FnMut(&str),
    ) -> Result<String> {
        tracing::info!("Building image: {}", tag);

        let options = BuildImageOptions {
            dockerfile: "Dockerfile",
            t: tag,
            rm: true,      // 中間コンテナを削除
            forcerm: true, // ビルド失敗時も中間コンテナを削除
            ..Default::default()
        };

        // ビルドストリームの開始
        use bytes::Bytes;
        use http_body_util::{Either, Full};
        let context_bytes = Bytes::from(context_data);
        let body = Full::new(context_bytes);
        let mut stream = self
            .docker
            .build_image(options, None, Some(Either::Left(body)));

        // bollard がフレーム分解済みのイベントをデコーダに順次適用する
        let mut decoder = ProgressDecoder::new();
        while let Some(msg) = stream.next().await {
            match msg {
                Ok(output) => decoder.apply(BuildEvent::from(output), &mut sink)?,
                Err(e) => return Err(BuildError::Transport(e)),
            }
        }

        let image_id = decoder.finish(&mut sink)?;
        tracing::info!("Successfully built: {} ({})", tag, image_id);
        Ok(image_id)
    }

    /// イメージの存在確認
    pub async fn image_exists(&self, image_tag: &str) -> Result<bool> {
        match self.docker.inspect_image(image_tag).await {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(BuildError::Transport(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Docker接続が必要なため、通常のテストではスキップ
    async fn test_build_simple_image() {
        let docker = Docker::connect_with_local_defaults().unwrap();
        let builder = ImageBuilder::new(docker);

        use crate::context::ContextBuilder;
        use std::fs;
        use tempfile::tempdir;

        let temp_dir = tempdir().unwrap();
        fs::write(
            temp_dir.path().join("Dockerfile"),
            "FROM alpine:latest\nCMD echo 'test'",
        )
        .unwrap();

        let context_data = ContextBuilder::create_context(temp_dir.path()).unwrap();

        let mut log = String::new();
        let result = builder
            .build_image(context_data, "ikada-build-test:latest", |line| {
                log.push_str(line)
            })
            .await;

        let image_id = result.unwrap();
        assert!(!image_id.is_empty());
        assert!(log.contains("FROM alpine"));

        // クリーンアップ
        builder
            .docker
            .remove_image(
                "ikada-build-test:latest",
                None::<bollard::query_parameters::RemoveImageOptions>,
                None,
            )
            .await
            .ok();
    }
}
