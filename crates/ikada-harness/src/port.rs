use crate::error::Result;
use std::net::TcpListener;

/// 空いているホストポートを 1 つ確保する
///
/// OS にエフェメラルポートを割り当てさせてすぐ手放すため、返却後に
/// 他プロセスへ取られる可能性はゼロではない。テスト開始直後に bind する
/// 前提で使うこと。
pub fn free_port() -> Result<u16> {
    let listener = TcpListener::bind(("127.0.0.1", 0))?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}
