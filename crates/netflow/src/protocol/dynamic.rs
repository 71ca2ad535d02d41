//! 템플릿 기반 프로토콜(v9, IPFIX) 공통 엔진
//!
//! 버전별 차이(헤더 형식, 템플릿 셋 형식, 셋 ID)는 [`FlowSetDecoder`]가 담당하고,
//! 셋 순회, 세션 관리, 미확인 템플릿 재생, 만료 작업은 [`DynamicProtocol`]이 공유합니다.
//!
//! # 패킷 처리 순서
//! 1. 헤더 읽기 (실패 시 패킷 전체 에러)
//! 2. 세션 조회/생성, 시퀀스 재시작 검사
//! 3. 셋 순회
//!    - 템플릿/옵션 템플릿 셋: 세션에 등록하고 대기 중인 데이터 셋 재생
//!    - 데이터 셋(ID >= 256): 세션 템플릿으로 디코딩, 없으면 보관 캐시로
//!    - 그 외 ID: 경고 후 건너뜀
//! 4. 셋 길이가 맞지 않으면 순회를 멈추고 그때까지의 레코드를 반환

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use bytes::{Buf, Bytes};
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use flowpost_core::metrics as m;

use crate::config::DecoderConfig;
use crate::error::{NetflowError, ensure_remaining};
use crate::fields::{FieldDict, FieldKey};
use crate::pending::{PendingKey, PendingTemplatesCache};
use crate::record::{FieldMap, Record};
use crate::session::{SessionKey, SessionMap, SessionState};
use crate::template::{FieldTemplate, Template};

use super::{Protocol, stamp_records};

/// 셋 헤더 길이: set id(2) + length(2)
const SET_HEADER_LEN: usize = 4;

/// 데이터 셋 ID의 최소값
pub const MIN_DATA_SET_ID: u16 = 256;

/// enterprise 번호가 뒤따름을 나타내는 필드 ID 비트
const ENTERPRISE_BIT: u16 = 0x8000;

/// 패킷 헤더에서 얻은 정보
#[derive(Debug, Clone)]
pub struct PacketHeader {
    /// export 시각
    pub timestamp: DateTime<Utc>,
    /// 시퀀스 번호
    pub sequence: u32,
    /// source id / observation domain id
    pub source_id: u32,
    /// 레코드에 붙일 exporter 메타데이터
    pub exporter: FieldMap,
}

/// 템플릿 셋을 읽은 결과 하나
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateUpdate {
    /// 템플릿 등록 (같은 ID는 덮어씀)
    Add(Template),
    /// 템플릿 하나 철회
    Withdraw(u16),
    /// 세션의 모든 템플릿 철회
    WithdrawAll,
}

/// 버전별 헤더/템플릿 셋 형식
pub trait FlowSetDecoder: Send + Sync + 'static {
    /// 설정 이름
    const NAME: &'static str;
    /// 헤더 버전 번호
    const VERSION: u16;
    /// 템플릿 셋 ID
    const TEMPLATE_SET_ID: u16;
    /// 옵션 템플릿 셋 ID
    const OPTIONS_TEMPLATE_SET_ID: u16;

    /// 헤더를 읽고 `buf`를 셋 영역만 남도록 조정합니다.
    fn read_header(&self, buf: &mut Bytes, source: SocketAddr)
    -> Result<PacketHeader, NetflowError>;

    /// 템플릿 셋 본문을 읽습니다. 하나라도 잘못되면 셋 전체가 에러입니다.
    fn read_template_set(
        &self,
        body: Bytes,
        fields: &FieldDict,
    ) -> Result<Vec<TemplateUpdate>, NetflowError>;

    /// 옵션 템플릿 셋 본문을 읽습니다.
    fn read_options_template_set(
        &self,
        body: Bytes,
        fields: &FieldDict,
    ) -> Result<Vec<TemplateUpdate>, NetflowError>;
}

/// 필드 정의(type, length[, enterprise]) `count`개를 읽습니다.
///
/// `allow_enterprise`이면 ID 최상위 비트가 선 필드 뒤의 4바이트를 enterprise 번호로 읽습니다.
/// 사전에 없는 필드는 정보 없이 길이만 가진 항목이 됩니다.
pub(crate) fn read_field_specs(
    buf: &mut Bytes,
    count: usize,
    dict: &FieldDict,
    allow_enterprise: bool,
) -> Result<Vec<FieldTemplate>, NetflowError> {
    let mut fields = Vec::with_capacity(count.min(buf.remaining() / 4));
    for _ in 0..count {
        ensure_remaining(buf, 4, "template field")?;
        let mut field_id = buf.get_u16();
        let length = buf.get_u16();
        let mut enterprise_id = 0;
        if allow_enterprise && field_id & ENTERPRISE_BIT != 0 {
            field_id &= !ENTERPRISE_BIT;
            ensure_remaining(buf, 4, "template field enterprise number")?;
            enterprise_id = buf.get_u32();
        }

        let info = dict.get(&FieldKey::new(enterprise_id, field_id)).cloned();
        if info.is_none() {
            trace!(enterprise_id, field_id, length, "template uses unknown field");
        }
        fields.push(FieldTemplate::new(length, info));
    }
    Ok(fields)
}

/// 템플릿 기반 프로토콜 인스턴스
pub struct DynamicProtocol<D: FlowSetDecoder> {
    decoder: D,
    fields: Arc<FieldDict>,
    sessions: Arc<SessionMap>,
    pending: Option<Arc<PendingTemplatesCache>>,
    config: DecoderConfig,
    cancel: Mutex<Option<CancellationToken>>,
}

impl<D: FlowSetDecoder> DynamicProtocol<D> {
    /// 프로토콜 인스턴스를 생성합니다. 만료 작업은 [`Protocol::start`]에서 시작합니다.
    pub fn new(decoder: D, config: &DecoderConfig, fields: Arc<FieldDict>) -> Self {
        let pending = config.cache_unknown_templates.then(|| {
            Arc::new(PendingTemplatesCache::new(
                D::NAME,
                config.pending_cleanup_interval(),
                config.pending_removal_threshold(),
            ))
        });
        Self {
            decoder,
            fields,
            sessions: Arc::new(SessionMap::new(D::NAME)),
            pending,
            config: config.clone(),
            cancel: Mutex::new(None),
        }
    }

    /// 세션 저장소
    pub fn sessions(&self) -> &Arc<SessionMap> {
        &self.sessions
    }

    /// 미확인 템플릿 보관 캐시 (꺼져 있으면 `None`)
    pub fn pending(&self) -> Option<&Arc<PendingTemplatesCache>> {
        self.pending.as_ref()
    }

    fn on_template_set(
        &self,
        key: SessionKey,
        session: &SessionState,
        set_id: u16,
        body: Bytes,
        records: &mut Vec<Record>,
    ) {
        let result = if set_id == D::TEMPLATE_SET_ID {
            self.decoder.read_template_set(body, &self.fields)
        } else {
            self.decoder.read_options_template_set(body, &self.fields)
        };

        let updates = match result {
            Ok(updates) => updates,
            Err(e) => {
                warn!(
                    protocol = D::NAME,
                    session = %key,
                    set_id,
                    error = %e,
                    "dropping invalid template set"
                );
                metrics::counter!(m::NETFLOW_INVALID_TEMPLATE_SETS_TOTAL).increment(1);
                return;
            }
        };

        for update in updates {
            match update {
                TemplateUpdate::Add(template) => {
                    self.register_template(key, session, template, records);
                }
                TemplateUpdate::Withdraw(id) => {
                    if session.remove_template(id) {
                        debug!(session = %key, template_id = id, "template withdrawn");
                    }
                }
                TemplateUpdate::WithdrawAll => {
                    debug!(session = %key, "all templates withdrawn");
                    session.remove_all_templates();
                }
            }
        }
    }

    fn register_template(
        &self,
        key: SessionKey,
        session: &SessionState,
        template: Template,
        records: &mut Vec<Record>,
    ) {
        let template = Arc::new(template);
        debug!(
            protocol = D::NAME,
            session = %key,
            template_id = template.id,
            fields = template.fields.len(),
            options = template.is_options,
            "registered template"
        );
        session.add_template(Arc::clone(&template));
        metrics::counter!(m::NETFLOW_TEMPLATES_REGISTERED_TOTAL).increment(1);

        let Some(pending) = &self.pending else {
            return;
        };
        let backlog = pending.get_and_remove(&PendingKey::new(key, template.id));
        if backlog.is_empty() {
            return;
        }
        debug!(
            session = %key,
            template_id = template.id,
            buffers = backlog.len(),
            "replaying data sets received before their template"
        );
        metrics::counter!(m::NETFLOW_PENDING_REPLAYED_TOTAL).increment(backlog.len() as u64);
        for mut buf in backlog {
            self.apply_template(&template, &mut buf, records);
        }
    }

    fn on_data_set(
        &self,
        key: SessionKey,
        session: &SessionState,
        set_id: u16,
        mut body: Bytes,
        records: &mut Vec<Record>,
    ) {
        if let Some(template) = session.get_template(set_id) {
            self.apply_template(&template, &mut body, records);
            return;
        }

        metrics::counter!(m::NETFLOW_UNKNOWN_TEMPLATE_SETS_TOTAL).increment(1);
        match &self.pending {
            Some(pending) => {
                debug!(
                    session = %key,
                    template_id = set_id,
                    bytes = body.len(),
                    "data set references unknown template, keeping it until the template arrives"
                );
                pending.add(PendingKey::new(key, set_id), body);
            }
            None => {
                warn!(
                    session = %key,
                    template_id = set_id,
                    "data set references unknown template, dropping"
                );
            }
        }
    }

    fn apply_template(&self, template: &Template, buf: &mut Bytes, records: &mut Vec<Record>) {
        match template.apply(buf, 0) {
            Ok(decoded) => records.extend(decoded),
            Err(e) => {
                debug!(template_id = template.id, error = %e, "failed to apply template");
            }
        }
    }
}

impl<D: FlowSetDecoder> Protocol for DynamicProtocol<D> {
    fn name(&self) -> &'static str {
        D::NAME
    }

    fn version(&self) -> u16 {
        D::VERSION
    }

    fn on_packet(&self, packet: Bytes, source: SocketAddr) -> Result<Vec<Record>, NetflowError> {
        let mut buf = packet;
        let header = self.decoder.read_header(&mut buf, source)?;

        let key = SessionKey::new(source, header.source_id, self.config.share_templates);
        let session = self.sessions.get_or_create(key);
        if self.config.detect_sequence_reset
            && session.check_reset(header.sequence, self.config.sequence_reset_threshold)
        {
            info!(
                protocol = D::NAME,
                session = %key,
                sequence = header.sequence,
                "exporter sequence reset detected, dropping its templates"
            );
            metrics::counter!(m::NETFLOW_SEQUENCE_RESETS_TOTAL).increment(1);
        }

        let mut records = Vec::new();
        while buf.remaining() >= SET_HEADER_LEN {
            let set_id = buf.get_u16();
            let length = usize::from(buf.get_u16());
            if length < SET_HEADER_LEN || length - SET_HEADER_LEN > buf.remaining() {
                debug!(
                    protocol = D::NAME,
                    session = %key,
                    set_id,
                    length,
                    remaining = buf.remaining(),
                    "set length exceeds packet, stopping"
                );
                break;
            }
            let body = buf.split_to(length - SET_HEADER_LEN);

            if set_id == D::TEMPLATE_SET_ID || set_id == D::OPTIONS_TEMPLATE_SET_ID {
                self.on_template_set(key, &session, set_id, body, &mut records);
            } else if set_id >= MIN_DATA_SET_ID {
                self.on_data_set(key, &session, set_id, body, &mut records);
            } else {
                warn!(protocol = D::NAME, session = %key, set_id, "skipping set with reserved id");
            }
        }

        stamp_records(&mut records, header.timestamp, &header.exporter);
        Ok(records)
    }

    fn start(&self) -> Result<(), NetflowError> {
        let mut cancel = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        if cancel.as_ref().is_some_and(|c| !c.is_cancelled()) {
            return Err(NetflowError::AlreadyRunning);
        }

        if let Some(pending) = &self.pending {
            pending.start()?;
        }
        let token = CancellationToken::new();
        if let Some(interval) = self.config.expiration_timeout() {
            tokio::spawn(
                Arc::clone(&self.sessions).cleanup_loop(interval, token.child_token()),
            );
        }
        *cancel = Some(token);
        info!(protocol = D::NAME, "protocol started");
        Ok(())
    }

    fn stop(&self) -> Result<(), NetflowError> {
        let cancel = self
            .cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(token) = cancel {
            token.cancel();
            if let Some(pending) = &self.pending {
                pending.stop();
            }
            info!(protocol = D::NAME, "protocol stopped");
        }
        Ok(())
    }

    fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl<D: FlowSetDecoder> Drop for DynamicProtocol<D> {
    fn drop(&mut self) {
        if let Some(token) = self
            .cancel
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            token.cancel();
        }
        if let Some(pending) = &self.pending {
            pending.stop();
        }
    }
}
