#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`decoder`]: 버전 디스패치 파사드 (Pipeline trait 구현)
//! - [`protocol`]: 버전별 패킷 디코더와 프로토콜 레지스트리
//! - [`template`]: 필드 템플릿과 레코드 디코딩
//! - [`session`]: 익스포터 세션별 템플릿 저장소와 만료
//! - [`pending`]: 템플릿 미확인 데이터 세트 보관 캐시
//! - [`fields`]: 정보 요소 사전, 값 디코더, YAML 사용자 정의
//! - [`record`]: 디코딩 결과 레코드와 값 타입
//! - [`config`]: 디코더 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! packet -> Decoder --version--> Protocol
//!                                  |-- legacy/v8: static Template -> Record
//!                                  '-- v9/ipfix:  SessionMap -> Template -> Record
//!                                                     '-- PendingTemplatesCache (replay)
//! ```

pub mod config;
pub mod decoder;
pub mod error;
pub mod fields;
pub mod pending;
pub mod protocol;
pub mod record;
pub mod session;
pub mod template;

// --- 주요 타입 re-export ---

// 디코더
pub use decoder::{Decoder, DecoderBuilder};

// 설정
pub use config::{DecoderConfig, DecoderConfigBuilder};

// 에러
pub use error::NetflowError;

// 레코드
pub use record::{FieldMap, FieldValue, MacAddress, Record, RecordType};

// 프로토콜
pub use protocol::{Protocol, ProtocolRegistry};

// 필드 사전
pub use fields::{Field, FieldDict, FieldKey};

// 템플릿과 세션
pub use pending::{PendingKey, PendingTemplatesCache};
pub use session::{SessionKey, SessionMap};
pub use template::{FieldTemplate, Template};
