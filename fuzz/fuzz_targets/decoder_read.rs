#![no_main]

use std::net::SocketAddr;
use std::sync::LazyLock;

use bytes::Bytes;
use flowpost_netflow::{Decoder, DecoderBuilder};
use libfuzzer_sys::fuzz_target;

static DECODER: LazyLock<Option<Decoder>> = LazyLock::new(|| DecoderBuilder::new().build().ok());

fuzz_target!(|data: &[u8]| {
    let Some(decoder) = DECODER.as_ref() else {
        return;
    };
    let source = SocketAddr::from(([192, 0, 2, 1], 2055));

    // 세션 상태가 누적되므로 템플릿 학습 경로까지 함께 탐색한다
    let _ = decoder.read(Bytes::copy_from_slice(data), source);
});
