//! 필드 사전 -- (enterprise ID, 필드 ID) → 이름 + 디코더
//!
//! 기본 사전([`default_fields`])은 최초 사용 시 한 번 만들어지는 불변 표입니다.
//! 디코더 인스턴스마다 사용자 정의 필드를 얹을 때는 기본 사전을 복사한 뒤
//! 병합합니다([`FieldDict::with_overlays`]). 키가 겹치면 나중 항목이 이깁니다.
//!
//! # 사용 예시
//! ```ignore
//! use flowpost_netflow::fields::{default_fields, FieldDict, FieldKey};
//!
//! let field = default_fields().get(&FieldKey::standard(8)).unwrap();
//! assert_eq!(field.name(), "sourceIPv4Address");
//! ```

pub mod custom;
mod iana;
pub mod types;
mod vendor;

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

pub use types::Decoder;
pub use vendor::REVERSE_PEN;

/// 정보 요소 식별자. `enterprise_id == 0`이면 표준 요소입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey {
    /// Private Enterprise Number
    pub enterprise_id: u32,
    /// 필드 ID (enterprise 비트 제외)
    pub field_id: u16,
}

impl FieldKey {
    /// 키를 생성합니다.
    pub const fn new(enterprise_id: u32, field_id: u16) -> Self {
        Self {
            enterprise_id,
            field_id,
        }
    }

    /// 표준(enterprise 0) 요소 키를 생성합니다.
    pub const fn standard(field_id: u16) -> Self {
        Self::new(0, field_id)
    }
}

/// 필드 메타데이터. 사전 구성 후에는 읽기 전용으로 공유됩니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// 필드 이름 (레코드 맵의 키)
    pub name: Cow<'static, str>,
    /// 값 디코더
    pub decoder: Decoder,
}

impl Field {
    /// 필드를 생성합니다.
    pub fn new(name: impl Into<Cow<'static, str>>, decoder: Decoder) -> Self {
        Self {
            name: name.into(),
            decoder,
        }
    }

    /// 필드 이름
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// 필드 사전
#[derive(Debug, Clone, Default)]
pub struct FieldDict {
    entries: HashMap<FieldKey, Arc<Field>>,
}

impl FieldDict {
    /// 빈 사전을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 항목을 추가합니다. 같은 키가 있으면 덮어씁니다.
    pub fn insert(&mut self, key: FieldKey, field: Field) {
        self.entries.insert(key, Arc::new(field));
    }

    /// 키로 필드를 조회합니다.
    pub fn get(&self, key: &FieldKey) -> Option<&Arc<Field>> {
        self.entries.get(key)
    }

    /// 항목 수
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 모든 항목을 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &Arc<Field>)> {
        self.entries.iter()
    }

    /// 다른 사전의 항목을 병합합니다. 겹치는 키는 `other`가 이깁니다.
    pub fn merge(&mut self, other: &FieldDict) {
        for (key, field) in &other.entries {
            self.entries.insert(*key, Arc::clone(field));
        }
    }

    /// `base`를 복사한 뒤 `overlays`를 순서대로 병합한 새 사전을 만듭니다.
    pub fn with_overlays<'a>(
        base: &FieldDict,
        overlays: impl IntoIterator<Item = &'a FieldDict>,
    ) -> FieldDict {
        let mut dict = base.clone();
        for overlay in overlays {
            dict.merge(overlay);
        }
        dict
    }

    fn extend_from_table(&mut self, enterprise_id: u32, table: &[(u16, &'static str, Decoder)]) {
        for &(field_id, name, decoder) in table {
            self.insert(
                FieldKey::new(enterprise_id, field_id),
                Field::new(name, decoder),
            );
        }
    }
}

static DEFAULT_FIELDS: LazyLock<FieldDict> = LazyLock::new(|| {
    let mut dict = FieldDict::new();
    dict.extend_from_table(0, iana::IANA_FIELDS);
    for &(field_id, name, decoder) in iana::IANA_FIELDS {
        dict.insert(
            FieldKey::new(REVERSE_PEN, field_id),
            Field::new(vendor::reverse_name(name), decoder),
        );
    }
    dict.extend_from_table(0, vendor::CISCO_NSEL_FIELDS);
    dict
});

static V9_SCOPE_FIELDS: LazyLock<FieldDict> = LazyLock::new(|| {
    let mut dict = FieldDict::new();
    dict.extend_from_table(0, vendor::V9_SCOPE_FIELDS);
    dict
});

/// 프로세스 전역 기본 사전 (IANA + RFC 5103 역방향 + Cisco NSEL)
pub fn default_fields() -> &'static FieldDict {
    &DEFAULT_FIELDS
}

/// v9 옵션 템플릿 scope 필드 사전
pub fn v9_scope_fields() -> &'static FieldDict {
    &V9_SCOPE_FIELDS
}
