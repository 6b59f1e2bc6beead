//! ビルド進捗ストリームのデコード
//!
//! Docker のイメージビルド API は newline 区切りの JSON イベントを逐次送出する。
//! このモジュールはそのストリームを取り込み、人間向けのログ行を sink に
//! 流しつつ、最終的なイメージ ID をただ一度だけ解決する。
//!
//! フレームは転送チャンクと整列しているとは限らないため、完全な JSON 値が
//! 揃うまで部分フレームをバッファする。エラーイベントを検出した時点で
//! デコーダは確定し、以降のイベントには反応しない。

use crate::error::{BuildError, Result};
use futures_util::stream::{Stream, StreamExt};
use serde::Deserialize;

/// ビルドストリームの 1 イベント
///
/// `stream` / `error` / `aux` のうち意味を持つのは通常 1 つだけ。
/// 未知のキーは無視する。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildEvent {
    pub stream: Option<String>,
    pub error: Option<String>,
    #[serde(rename = "errorDetail")]
    pub error_detail: Option<ErrorDetail>,
    pub aux: Option<AuxId>,
}

/// エラーイベントの詳細（`error` と併送されることが多い）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDetail {
    pub message: Option<String>,
}

/// aux サイドチャネル。最終イメージ ID は `ID` キーで届く
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuxId {
    #[serde(alias = "ID")]
    pub id: Option<String>,
}

impl BuildEvent {
    fn error_message(&self) -> Option<String> {
        if let Some(error) = &self.error {
            return Some(error.clone());
        }
        self.error_detail.as_ref().and_then(|d| d.message.clone())
    }
}

impl From<bollard::models::BuildInfo> for BuildEvent {
    fn from(info: bollard::models::BuildInfo) -> Self {
        Self {
            stream: info.stream,
            error: info.error,
            error_detail: info.error_detail.map(|d| ErrorDetail { message: d.message }),
            aux: info.aux.map(|a| AuxId { id: a.id }),
        }
    }
}

/// デコーダの状態。終端状態（Succeeded / Failed）から戻る遷移はない
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    Listening,
    Succeeded,
    Failed,
}

/// ビルド進捗デコーダ
///
/// 1 回のビルドにつき 1 インスタンス。イベントを到着順に適用し、
/// 候補イメージ ID（`aux.ID` または `sha:` 行、後勝ち）を保持する。
/// 確定後の [`feed`](Self::feed) / [`apply`](Self::apply) は何もしない。
#[derive(Debug)]
pub struct ProgressDecoder {
    buf: Vec<u8>,
    image_id: Option<String>,
    state: DecodeState,
}

impl Default for ProgressDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressDecoder {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            image_id: None,
            state: DecodeState::Listening,
        }
    }

    /// 終端状態に達したかどうか
    pub fn is_settled(&self) -> bool {
        self.state != DecodeState::Listening
    }

    /// 現在の候補イメージ ID
    pub fn image_id(&self) -> Option<&str> {
        self.image_id.as_deref()
    }

    /// 受信チャンクを取り込み、完成したフレームを到着順に適用する
    ///
    /// フレーム境界は newline。チャンク途中で途切れたフレームは次の
    /// `feed` まで内部バッファに残る。
    pub fn feed(&mut self, chunk: &[u8], sink: &mut dyn FnMut(&str)) -> Result<()> {
        if self.is_settled() {
            return Ok(());
        }
        self.buf.extend_from_slice(chunk);
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let frame: Vec<u8> = self.buf.drain(..=pos).collect();
            self.apply_frame(&frame, sink)?;
        }
        Ok(())
    }

    fn apply_frame(&mut self, frame: &[u8], sink: &mut dyn FnMut(&str)) -> Result<()> {
        match serde_json::from_slice::<BuildEvent>(frame) {
            Ok(event) => self.apply(event, sink),
            // 構造化されていないフレームは無視
            Err(_) => Ok(()),
        }
    }

    /// デコード済みイベントを 1 件適用する
    ///
    /// bollard のようにフレーム分解済みのストリームを使う場合はこちらを
    /// 直接呼ぶ。エラーイベントで `BuildFailed` を返し、以降は不活性になる。
    pub fn apply(&mut self, event: BuildEvent, sink: &mut dyn FnMut(&str)) -> Result<()> {
        if self.is_settled() {
            return Ok(());
        }

        if let Some(message) = event.error_message() {
            self.state = DecodeState::Failed;
            return Err(BuildError::BuildFailed(message));
        }

        if let Some(text) = event.stream.as_deref().filter(|s| !s.is_empty()) {
            // `sha:` 行は aux 以前からの ID 通知形式。両方を等価に扱い、
            // 後に観測した方で候補を上書きする
            for line in text.lines() {
                if let Some(id) = line.trim().strip_prefix("sha:") {
                    if !id.is_empty() {
                        self.image_id = Some(id.to_string());
                    }
                }
            }
            // sink にはイベントの stream ペイロードをそのまま 1 回だけ渡す
            sink(text);
        } else if let Some(id) = event.aux.and_then(|aux| aux.id) {
            self.image_id = Some(id);
        }

        Ok(())
    }

    /// ストリームの正常終了を通知し、観測済みのイメージ ID に解決する
    ///
    /// newline で終端されていない最終フレームがあればここで適用する。
    /// ID を一度も観測していなければ `MissingImageId` で失敗する。
    pub fn finish(&mut self, sink: &mut dyn FnMut(&str)) -> Result<String> {
        // 失敗確定後に呼ばれても成功として解決し直さない
        if self.state == DecodeState::Failed {
            return Err(BuildError::MissingImageId);
        }
        if !self.buf.is_empty() {
            let frame = std::mem::take(&mut self.buf);
            self.apply_frame(&frame, sink)?;
        }
        match self.image_id.take() {
            Some(id) => {
                self.state = DecodeState::Succeeded;
                Ok(id)
            }
            None => {
                self.state = DecodeState::Failed;
                Err(BuildError::MissingImageId)
            }
        }
    }
}

/// ビルド進捗のバイトストリームをデコードし、イメージ ID に解決する
///
/// ストリームの正常終了時にそれまで観測した ID を返す。エラーイベント、
/// トランスポートエラー、ID 未観測での終了はいずれも即時失敗となり、
/// 以降ストリームは読まない。
pub async fn decode_build_progress<S, B, E>(
    mut stream: S,
    mut sink: impl FnMut(&str),
) -> Result<String>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Into<BuildError>,
{
    let mut decoder = ProgressDecoder::new();
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => decoder.feed(bytes.as_ref(), &mut sink)?,
            Err(e) => return Err(e.into()),
        }
    }
    decoder.finish(&mut sink)
}
