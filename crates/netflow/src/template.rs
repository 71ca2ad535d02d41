//! 템플릿 -- 레코드 하나의 모양과 적용 알고리즘
//!
//! [`Template`]은 순서가 있는 필드 목록(길이 + 선택적 필드 정보)입니다.
//! v1/v5/v6/v7/v8 템플릿은 컴파일 시점 상수이고, v9/IPFIX 템플릿은
//! 템플릿 셋에서 런타임에 만들어져 세션이 소유합니다.
//!
//! # 적용 규칙
//! - 고정 길이 템플릿 + `count_hint == 0`: `남은 바이트 / 레코드 길이` 만큼 디코딩 (끝의 패딩 무시)
//! - 가변 길이 템플릿 + `count_hint == 0`: 버퍼가 빌 때까지 디코딩, 마지막 불완전 레코드는 버림
//! - 단일 필드 디코딩 실패는 그 필드만 빠지고 레코드는 유지

use std::sync::Arc;

use bytes::{Buf, Bytes};

use crate::error::{NetflowError, ensure_remaining};
use crate::fields::{Decoder, Field};
use crate::record::{FieldMap, FieldValue, OPTIONS_KEY, Record, RecordType, SCOPE_KEY};

/// 가변 길이 필드를 나타내는 길이 값
pub const VARIABLE_LENGTH: u16 = 0xFFFF;

/// 가변 길이 접두어에서 2바이트 길이가 뒤따름을 나타내는 값
const LONG_LENGTH_ESCAPE: u8 = 0xFF;

/// 템플릿의 한 열
#[derive(Debug, Clone, PartialEq)]
pub struct FieldTemplate {
    /// 필드 길이 ([`VARIABLE_LENGTH`]이면 가변)
    pub length: u16,
    /// 필드 정보. `None`이면 길이만큼 건너뜀
    pub info: Option<Arc<Field>>,
}

impl FieldTemplate {
    /// 필드 템플릿을 생성합니다.
    pub fn new(length: u16, info: Option<Arc<Field>>) -> Self {
        Self { length, info }
    }

    /// 이름과 디코더가 정해진 필드
    pub fn known(length: u16, name: &'static str, decoder: Decoder) -> Self {
        Self::new(length, Some(Arc::new(Field::new(name, decoder))))
    }

    /// 건너뛸 패딩
    pub fn padding(length: u16) -> Self {
        Self::new(length, None)
    }

    /// 가변 길이 필드인지 확인합니다.
    pub fn is_variable(&self) -> bool {
        self.length == VARIABLE_LENGTH
    }
}

/// 레코드 템플릿
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// 템플릿 ID (정적 템플릿은 0)
    pub id: u16,
    /// 필드 목록
    pub fields: Vec<FieldTemplate>,
    /// 레코드 길이. 가변 필드는 1로 계산
    pub length: usize,
    /// 가변 길이 필드 포함 여부
    pub variable_length: bool,
    /// scope 필드 수 (옵션 템플릿 전용)
    pub scope_fields: usize,
    /// 옵션 템플릿 여부
    pub is_options: bool,
}

impl Template {
    /// 플로우 템플릿을 생성합니다.
    pub fn new(id: u16, fields: Vec<FieldTemplate>) -> Self {
        let length = fields
            .iter()
            .map(|f| if f.is_variable() { 1 } else { usize::from(f.length) })
            .sum();
        let variable_length = fields.iter().any(FieldTemplate::is_variable);
        Self {
            id,
            fields,
            length,
            variable_length,
            scope_fields: 0,
            is_options: false,
        }
    }

    /// 옵션 템플릿을 생성합니다. 앞의 `scope_fields`개 필드가 scope입니다.
    pub fn options(id: u16, fields: Vec<FieldTemplate>, scope_fields: usize) -> Self {
        let mut template = Self::new(id, fields);
        template.scope_fields = scope_fields.min(template.fields.len());
        template.is_options = true;
        template
    }

    /// 필드 길이가 디코더가 허용하는 범위 안에 있는지 검사합니다. 정적 레이아웃 검증용입니다.
    #[cfg(test)]
    pub(crate) fn validate(&self) -> Result<(), NetflowError> {
        if self.fields.is_empty() {
            return Err(NetflowError::EmptyTemplate);
        }
        for field in &self.fields {
            let Some(info) = &field.info else { continue };
            if field.is_variable() {
                continue;
            }
            let decoder = info.decoder;
            if field.length < decoder.min_length() || field.length > decoder.max_length() {
                return Err(NetflowError::template(
                    self.id,
                    format!(
                        "field '{}' has length {} outside {}..={} for {decoder}",
                        info.name(),
                        field.length,
                        decoder.min_length(),
                        decoder.max_length()
                    ),
                ));
            }
        }
        Ok(())
    }

    /// 버퍼에 템플릿을 적용해 레코드를 디코딩합니다.
    ///
    /// `count_hint`가 0이 아니면 그 수를 넘겨 디코딩하지 않습니다.
    pub fn apply(&self, buf: &mut Bytes, count_hint: usize) -> Result<Vec<Record>, NetflowError> {
        if self.fields.is_empty() || self.length == 0 {
            return Err(NetflowError::EmptyTemplate);
        }

        let available = buf.remaining() / self.length;

        if !self.variable_length {
            let count = if count_hint == 0 {
                available
            } else {
                count_hint.min(available)
            };
            if count < count_hint {
                tracing::debug!(
                    template_id = self.id,
                    expected = count_hint,
                    available,
                    "buffer holds fewer records than announced"
                );
            }
            let mut records = Vec::with_capacity(count);
            for _ in 0..count {
                records.push(self.decode_record(buf)?);
            }
            return Ok(records);
        }

        let limit = if count_hint == 0 {
            usize::MAX
        } else {
            count_hint
        };
        let mut records = Vec::with_capacity(available.min(limit));
        while records.len() < limit && buf.has_remaining() {
            match self.decode_record(buf) {
                Ok(record) => records.push(record),
                Err(e) if e.is_eof() => break,
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }

    fn decode_record(&self, buf: &mut Bytes) -> Result<Record, NetflowError> {
        if !self.is_options {
            let mut fields = FieldMap::new();
            populate_field_map(&self.fields, buf, &mut fields)?;
            return Ok(Record::new(RecordType::Flow, fields));
        }

        let (scope_templates, option_templates) = self.fields.split_at(self.scope_fields);
        let mut scope = FieldMap::new();
        let mut options = FieldMap::new();
        populate_field_map(scope_templates, buf, &mut scope)?;
        populate_field_map(option_templates, buf, &mut options)?;

        let mut fields = FieldMap::new();
        fields.insert(SCOPE_KEY.to_owned(), FieldValue::Map(scope));
        fields.insert(OPTIONS_KEY.to_owned(), FieldValue::Map(options));
        Ok(Record::new(RecordType::Options, fields))
    }
}

/// 필드 목록을 순서대로 읽어 `out`에 채웁니다.
///
/// 입력이 모자라면 `UnexpectedEof`를 반환합니다. 값 디코딩 실패는 그 필드만 건너뜁니다.
pub fn populate_field_map(
    fields: &[FieldTemplate],
    buf: &mut Bytes,
    out: &mut FieldMap,
) -> Result<(), NetflowError> {
    for field in fields {
        let length = if field.is_variable() {
            read_variable_length(buf)?
        } else {
            usize::from(field.length)
        };
        ensure_remaining(buf, length, "record field")?;
        let raw = buf.split_to(length);

        let Some(info) = &field.info else { continue };
        match info.decoder.decode(&raw) {
            Ok(value) => {
                out.insert(info.name().to_owned(), value);
            }
            Err(e) => {
                tracing::trace!(field = info.name(), error = %e, "dropping undecodable field");
            }
        }
    }
    Ok(())
}

fn read_variable_length(buf: &mut Bytes) -> Result<usize, NetflowError> {
    ensure_remaining(buf, 1, "variable length prefix")?;
    let short = buf.get_u8();
    if short != LONG_LENGTH_ESCAPE {
        return Ok(usize::from(short));
    }
    ensure_remaining(buf, 2, "variable length prefix")?;
    Ok(usize::from(buf.get_u16()))
}
