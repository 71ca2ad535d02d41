//! NetFlow v9 형식
//!
//! - 헤더 20바이트: version, count, sysUptime, unixSecs, sequence, sourceId
//! - 템플릿 셋 ID 0, 옵션 템플릿 셋 ID 1
//! - 옵션 템플릿의 scope/option 길이는 바이트 단위이며 4의 배수여야 함

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::{Buf, Bytes};

use crate::config::DecoderConfig;
use crate::error::{NetflowError, ensure_remaining};
use crate::fields::{FieldDict, v9_scope_fields};
use crate::record::FieldValue;
use crate::template::Template;

use super::dynamic::{
    DynamicProtocol, FlowSetDecoder, MIN_DATA_SET_ID, PacketHeader, TemplateUpdate,
    read_field_specs,
};
use super::{Protocol, exporter_metadata, unix_time};

const HEADER_LEN: usize = 20;
/// 템플릿 레코드 헤더: template id(2) + field count(2)
const TEMPLATE_HEADER_LEN: usize = 4;
/// 옵션 템플릿 레코드 헤더: template id(2) + scope length(2) + option length(2)
const OPTIONS_HEADER_LEN: usize = 6;
/// 필드 정의 하나의 바이트 수
const FIELD_SPEC_LEN: u16 = 4;

/// NetFlow v9 프로토콜
pub type V9Protocol = DynamicProtocol<V9Decoder>;

/// v9 헤더/템플릿 셋 디코더
#[derive(Debug, Clone, Copy, Default)]
pub struct V9Decoder;

impl FlowSetDecoder for V9Decoder {
    const NAME: &'static str = "v9";
    const VERSION: u16 = 9;
    const TEMPLATE_SET_ID: u16 = 0;
    const OPTIONS_TEMPLATE_SET_ID: u16 = 1;

    fn read_header(
        &self,
        buf: &mut Bytes,
        source: SocketAddr,
    ) -> Result<PacketHeader, NetflowError> {
        ensure_remaining(buf, HEADER_LEN, "v9 header")?;
        let version = buf.get_u16();
        let _count = buf.get_u16();
        let uptime = buf.get_u32();
        let secs = buf.get_u32();
        let sequence = buf.get_u32();
        let source_id = buf.get_u32();

        let timestamp = unix_time(secs, 0);
        let mut exporter = exporter_metadata(version, timestamp, Some(uptime), source);
        exporter.insert(
            "sourceId".to_owned(),
            FieldValue::Unsigned(u64::from(source_id)),
        );

        Ok(PacketHeader {
            timestamp,
            sequence,
            source_id,
            exporter,
        })
    }

    fn read_template_set(
        &self,
        mut body: Bytes,
        fields: &FieldDict,
    ) -> Result<Vec<TemplateUpdate>, NetflowError> {
        let mut updates = Vec::new();
        while body.remaining() >= TEMPLATE_HEADER_LEN {
            let id = body.get_u16();
            let count = body.get_u16();
            if id == 0 {
                // 셋 끝 패딩
                break;
            }
            if id < MIN_DATA_SET_ID {
                return Err(NetflowError::template(id, "template id below 256"));
            }
            if count == 0 {
                return Err(NetflowError::template(id, "template has no fields"));
            }
            let specs = read_field_specs(&mut body, usize::from(count), fields, false)?;
            updates.push(TemplateUpdate::Add(Template::new(id, specs)));
        }
        Ok(updates)
    }

    fn read_options_template_set(
        &self,
        mut body: Bytes,
        fields: &FieldDict,
    ) -> Result<Vec<TemplateUpdate>, NetflowError> {
        let mut updates = Vec::new();
        while body.remaining() >= OPTIONS_HEADER_LEN {
            let id = body.get_u16();
            let scope_len = body.get_u16();
            let options_len = body.get_u16();
            if id == 0 {
                break;
            }
            if id < MIN_DATA_SET_ID {
                return Err(NetflowError::template(id, "template id below 256"));
            }
            if u32::from(scope_len) + u32::from(options_len) == 0
                || scope_len % FIELD_SPEC_LEN != 0
                || options_len % FIELD_SPEC_LEN != 0
            {
                return Err(NetflowError::template(
                    id,
                    format!("invalid scope length {scope_len} / option length {options_len}"),
                ));
            }

            let scope_count = usize::from(scope_len / FIELD_SPEC_LEN);
            let options_count = usize::from(options_len / FIELD_SPEC_LEN);
            let mut specs = read_field_specs(&mut body, scope_count, v9_scope_fields(), false)?;
            specs.extend(read_field_specs(&mut body, options_count, fields, false)?);
            updates.push(TemplateUpdate::Add(Template::options(id, specs, scope_count)));
        }
        Ok(updates)
    }
}

/// v9 팩토리
pub fn new_v9(config: &DecoderConfig, fields: &Arc<FieldDict>) -> Box<dyn Protocol> {
    Box::new(V9Protocol::new(V9Decoder, config, Arc::clone(fields)))
}
