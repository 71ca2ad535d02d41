//! 사용자 정의 필드 로더 -- YAML 정의 파일을 필드 사전으로 변환합니다.
//!
//! 파일 형식은 enterprise 번호 → 필드 ID → `[이름, 타입]` 매핑입니다.
//!
//! ```text
//! # enterprise 0 (v9 또는 표준 번호 공간)
//! 0:
//!   33000: [ingressAclId, aclId]
//! # 벤더 enterprise
//! 4242:
//!   1: [vendorSessionId, unsigned64]
//!   2: [vendorTunnelName, string]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::NetflowError;

use super::types::Decoder;
use super::{Field, FieldDict, FieldKey};

/// 정의 파일 최대 크기
const MAX_DEFINITION_FILE_SIZE: u64 = 4 * 1024 * 1024; // 4MB

/// enterprise 필드 ID의 최대값 (최상위 비트는 enterprise 플래그)
const MAX_ENTERPRISE_FIELD_ID: u16 = 0x7FFF;

type RawDefinitions = BTreeMap<u32, BTreeMap<u16, (String, String)>>;

/// YAML 문자열을 필드 사전으로 파싱합니다.
///
/// `source_name`은 에러 메시지에 쓰입니다.
pub fn parse_yaml(content: &str, source_name: &str) -> Result<FieldDict, NetflowError> {
    let raw: RawDefinitions =
        serde_yaml::from_str(content).map_err(|e| NetflowError::CustomFields {
            source_name: source_name.to_owned(),
            reason: format!("invalid YAML: {e}"),
        })?;

    let mut dict = FieldDict::new();
    for (enterprise_id, fields) in raw {
        for (field_id, (name, type_name)) in fields {
            if enterprise_id != 0 && field_id > MAX_ENTERPRISE_FIELD_ID {
                return Err(NetflowError::CustomFields {
                    source_name: source_name.to_owned(),
                    reason: format!(
                        "field {field_id} of enterprise {enterprise_id} exceeds {MAX_ENTERPRISE_FIELD_ID}"
                    ),
                });
            }
            if name.trim().is_empty() {
                return Err(NetflowError::CustomFields {
                    source_name: source_name.to_owned(),
                    reason: format!("field {enterprise_id}/{field_id} has an empty name"),
                });
            }
            let decoder =
                Decoder::from_name(&type_name).ok_or_else(|| NetflowError::CustomFields {
                    source_name: source_name.to_owned(),
                    reason: format!("field '{name}' has unknown type '{type_name}'"),
                })?;
            dict.insert(FieldKey::new(enterprise_id, field_id), Field::new(name, decoder));
        }
    }
    Ok(dict)
}

/// 단일 YAML 정의 파일을 로드합니다.
pub async fn load_file(path: impl AsRef<Path>) -> Result<FieldDict, NetflowError> {
    let path = path.as_ref();
    let source_name = path.display().to_string();

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| NetflowError::CustomFields {
            source_name: source_name.clone(),
            reason: format!("failed to read file metadata: {e}"),
        })?;
    if metadata.len() > MAX_DEFINITION_FILE_SIZE {
        return Err(NetflowError::CustomFields {
            source_name,
            reason: format!(
                "file too large: {} bytes (max {MAX_DEFINITION_FILE_SIZE})",
                metadata.len()
            ),
        });
    }

    let content =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| NetflowError::CustomFields {
                source_name: source_name.clone(),
                reason: format!("failed to read file: {e}"),
            })?;

    let dict = parse_yaml(&content, &source_name)?;
    tracing::info!(
        path = %path.display(),
        count = dict.len(),
        "loaded custom field definitions"
    );
    Ok(dict)
}

/// 여러 정의 파일을 순서대로 로드합니다. 하나라도 실패하면 에러를 반환합니다.
pub async fn load_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<FieldDict>, NetflowError> {
    let mut dicts = Vec::with_capacity(paths.len());
    for path in paths {
        dicts.push(load_file(path).await?);
    }
    Ok(dicts)
}
