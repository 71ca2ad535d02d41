//! IPFIX (RFC 7011) 형식
//!
//! v9와의 차이:
//! - 헤더 16바이트, 두 번째 필드가 레코드 수가 아닌 패킷 전체 바이트 길이
//! - 템플릿 셋 ID 2, 옵션 템플릿 셋 ID 3
//! - 필드 ID 최상위 비트가 서면 4바이트 enterprise 번호가 뒤따름
//! - 옵션 템플릿은 바이트 길이 대신 필드 수/scope 필드 수를 가짐
//! - 필드 수 0인 템플릿 레코드는 철회(withdrawal)

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::{Buf, Bytes};

use crate::config::DecoderConfig;
use crate::error::{NetflowError, ensure_remaining};
use crate::fields::FieldDict;
use crate::record::FieldValue;
use crate::template::Template;

use super::dynamic::{
    DynamicProtocol, FlowSetDecoder, MIN_DATA_SET_ID, PacketHeader, TemplateUpdate,
    read_field_specs,
};
use super::{Protocol, exporter_metadata, unix_time};

const HEADER_LEN: usize = 16;
const TEMPLATE_HEADER_LEN: usize = 4;
const TEMPLATE_SET_ID: u16 = 2;
const OPTIONS_TEMPLATE_SET_ID: u16 = 3;

/// IPFIX 프로토콜
pub type IpfixProtocol = DynamicProtocol<IpfixDecoder>;

/// IPFIX 헤더/템플릿 셋 디코더
#[derive(Debug, Clone, Copy, Default)]
pub struct IpfixDecoder;

impl IpfixDecoder {
    /// 필드 수 0인 레코드를 철회로 해석합니다.
    fn withdrawal(set_id: u16, id: u16) -> Result<TemplateUpdate, NetflowError> {
        if id == set_id {
            Ok(TemplateUpdate::WithdrawAll)
        } else if id >= MIN_DATA_SET_ID {
            Ok(TemplateUpdate::Withdraw(id))
        } else {
            Err(NetflowError::template(id, "withdrawal of template id below 256"))
        }
    }
}

impl FlowSetDecoder for IpfixDecoder {
    const NAME: &'static str = "ipfix";
    const VERSION: u16 = 10;
    const TEMPLATE_SET_ID: u16 = TEMPLATE_SET_ID;
    const OPTIONS_TEMPLATE_SET_ID: u16 = OPTIONS_TEMPLATE_SET_ID;

    fn read_header(
        &self,
        buf: &mut Bytes,
        source: SocketAddr,
    ) -> Result<PacketHeader, NetflowError> {
        ensure_remaining(buf, HEADER_LEN, "ipfix header")?;
        let total = buf.remaining();
        let version = buf.get_u16();
        let length = usize::from(buf.get_u16());
        let export_time = buf.get_u32();
        let sequence = buf.get_u32();
        let domain_id = buf.get_u32();

        if length < HEADER_LEN {
            return Err(NetflowError::MalformedPacket {
                context: "ipfix header",
                reason: format!("length {length} is shorter than the header"),
            });
        }
        if length > total {
            return Err(NetflowError::UnexpectedEof {
                context: "ipfix message",
                needed: length,
                remaining: total,
            });
        }
        buf.truncate(length - HEADER_LEN);

        let timestamp = unix_time(export_time, 0);
        let mut exporter = exporter_metadata(version, timestamp, None, source);
        exporter.insert(
            "sourceId".to_owned(),
            FieldValue::Unsigned(u64::from(domain_id)),
        );

        Ok(PacketHeader {
            timestamp,
            sequence,
            source_id: domain_id,
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
            if id == 0 && count == 0 {
                break;
            }
            if count == 0 {
                updates.push(Self::withdrawal(TEMPLATE_SET_ID, id)?);
                continue;
            }
            if id < MIN_DATA_SET_ID {
                return Err(NetflowError::template(id, "template id below 256"));
            }
            let specs = read_field_specs(&mut body, usize::from(count), fields, true)?;
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
        while body.remaining() >= TEMPLATE_HEADER_LEN {
            let id = body.get_u16();
            let field_count = body.get_u16();
            if id == 0 && field_count == 0 {
                break;
            }
            if field_count == 0 {
                updates.push(Self::withdrawal(OPTIONS_TEMPLATE_SET_ID, id)?);
                continue;
            }
            if id < MIN_DATA_SET_ID {
                return Err(NetflowError::template(id, "template id below 256"));
            }
            ensure_remaining(&body, 2, "options template scope count")?;
            let scope_count = body.get_u16();
            if scope_count == 0 || scope_count > field_count {
                return Err(NetflowError::template(
                    id,
                    format!("invalid scope field count {scope_count} of {field_count} fields"),
                ));
            }

            let specs = read_field_specs(&mut body, usize::from(field_count), fields, true)?;
            updates.push(TemplateUpdate::Add(Template::options(
                id,
                specs,
                usize::from(scope_count),
            )));
        }
        Ok(updates)
    }
}

/// IPFIX 팩토리
pub fn new_ipfix(config: &DecoderConfig, fields: &Arc<FieldDict>) -> Box<dyn Protocol> {
    Box::new(IpfixProtocol::new(IpfixDecoder, config, Arc::clone(fields)))
}
