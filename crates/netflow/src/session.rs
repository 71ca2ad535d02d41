//! 세션/템플릿 저장소
//!
//! v9/IPFIX exporter마다 [`SessionState`] 하나가 템플릿 표와 마지막 시퀀스 번호를 가집니다.
//! [`SessionMap`]은 세션 키 → 세션 상태를 보관하며, 프로토콜 인스턴스마다 하나씩 생성됩니다.
//!
//! # 만료 (mark-and-sweep)
//! 세션과 템플릿은 각각 삭제 플래그를 가집니다. 정리 주기마다:
//! 1. 이미 플래그가 서 있는 항목은 제거
//! 2. 나머지는 플래그를 세움
//!
//! 조회/추가는 플래그를 내리므로, 사용되지 않은 항목은 한 주기를 버티고 다음 주기에 제거됩니다.
//!
//! # 잠금
//! - `SessionMap`: 맵 전체에 대한 `RwLock` (조회는 read, 생성은 write + 재확인)
//! - `SessionState`: 세션마다 독립된 `RwLock`
//! - 삭제 플래그: `AtomicBool` CAS

use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use flowpost_core::metrics as m;

use crate::template::Template;

/// 세션 식별자: exporter 주소 + observation domain(source id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    /// exporter IP
    pub address: IpAddr,
    /// exporter 포트. 템플릿 공유 모드에서는 0
    pub port: u16,
    /// source id / observation domain id
    pub source_id: u32,
}

impl SessionKey {
    /// 세션 키를 생성합니다. `share_templates`이면 포트를 무시합니다.
    pub fn new(source: SocketAddr, source_id: u32, share_templates: bool) -> Self {
        Self {
            address: source.ip(),
            port: if share_templates { 0 } else { source.port() },
            source_id,
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            SocketAddr::new(self.address, self.port),
            self.source_id
        )
    }
}

/// 템플릿과 삭제 플래그
#[derive(Debug)]
struct TemplateEntry {
    template: Arc<Template>,
    delete: AtomicBool,
}

#[derive(Debug, Default)]
struct SessionInner {
    templates: HashMap<u16, TemplateEntry>,
    last_sequence: Option<u32>,
}

/// exporter 하나의 템플릿 표와 시퀀스 상태
#[derive(Debug, Default)]
pub struct SessionState {
    inner: RwLock<SessionInner>,
    delete: AtomicBool,
}

impl SessionState {
    /// 빈 세션을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 템플릿을 추가합니다. 같은 ID가 있으면 덮어씁니다.
    pub fn add_template(&self, template: Arc<Template>) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.templates.insert(
            template.id,
            TemplateEntry {
                template,
                delete: AtomicBool::new(false),
            },
        );
    }

    /// 템플릿을 조회하고 삭제 플래그를 내립니다.
    pub fn get_template(&self, id: u16) -> Option<Arc<Template>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.templates.get(&id).map(|entry| {
            entry.delete.store(false, Ordering::Relaxed);
            Arc::clone(&entry.template)
        })
    }

    /// 템플릿 하나를 제거합니다.
    pub fn remove_template(&self, id: u16) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.templates.remove(&id).is_some()
    }

    /// 모든 템플릿을 제거합니다.
    pub fn remove_all_templates(&self) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.templates.clear();
    }

    /// 등록된 템플릿 수
    pub fn template_count(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .templates
            .len()
    }

    /// 세션 삭제 플래그를 내립니다.
    pub fn touch(&self) {
        self.delete.store(false, Ordering::Relaxed);
    }

    /// 시퀀스 번호를 기록하고 exporter 재시작 여부를 판단합니다.
    ///
    /// 새 번호가 직전 번호보다 `threshold` 넘게 작으면 재시작으로 보고 템플릿을 모두 지운 뒤
    /// `true`를 반환합니다. 카운터가 `u32::MAX`를 넘겨 0 근처로 돌아온 경우(앞으로 `threshold`
    /// 이내)는 재시작이 아닙니다.
    pub fn check_reset(&self, sequence: u32, threshold: u32) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let previous = inner.last_sequence.replace(sequence);
        let Some(previous) = previous else {
            return false;
        };

        let wrapped = sequence.wrapping_sub(previous) <= threshold;
        let reset = sequence < previous && previous - sequence > threshold && !wrapped;
        if reset {
            inner.templates.clear();
        }
        reset
    }

    /// 템플릿 만료 주기를 한 번 실행하고 제거된 수를 반환합니다.
    pub fn expire_templates(&self) -> usize {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let before = inner.templates.len();
        inner.templates.retain(|_, entry| mark_or_remove(&entry.delete));
        before - inner.templates.len()
    }
}

/// 플래그를 세우는 데 성공하면 유지(`true`), 이미 서 있으면 제거(`false`)
fn mark_or_remove(flag: &AtomicBool) -> bool {
    flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
}

/// 세션 만료 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpireStats {
    /// 제거된 세션 수
    pub sessions: usize,
    /// 남은 세션에서 제거된 템플릿 수
    pub templates: usize,
}

/// 세션 키 → 세션 상태
///
/// 메트릭은 소유 프로토콜 이름(`version` 레이블)으로 구분됩니다.
#[derive(Debug)]
pub struct SessionMap {
    protocol: &'static str,
    sessions: RwLock<HashMap<SessionKey, Arc<SessionState>>>,
}

impl SessionMap {
    /// `protocol` 인스턴스가 소유할 빈 맵을 생성합니다.
    pub fn new(protocol: &'static str) -> Self {
        Self {
            protocol,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// 세션을 조회하고, 없으면 생성합니다. 반환 전에 세션 삭제 플래그를 내립니다.
    pub fn get_or_create(&self, key: SessionKey) -> Arc<SessionState> {
        {
            let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(session) = sessions.get(&key) {
                session.touch();
                return Arc::clone(session);
            }
        }

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let session = Arc::clone(sessions.entry(key).or_insert_with(|| {
            debug!(session = %key, "new exporter session");
            Arc::new(SessionState::new())
        }));
        session.touch();
        metrics::gauge!(m::NETFLOW_ACTIVE_SESSIONS, m::LABEL_VERSION => self.protocol)
            .set(sessions.len() as f64);
        session
    }

    /// 세션 수
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// 세션이 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 세션과 템플릿 만료 주기를 한 번 실행합니다.
    pub fn expire_sessions(&self) -> ExpireStats {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        let mut templates = 0;
        sessions.retain(|_, session| {
            if !mark_or_remove(&session.delete) {
                return false;
            }
            templates += session.expire_templates();
            true
        });

        let stats = ExpireStats {
            sessions: before - sessions.len(),
            templates,
        };
        let label = self.protocol;
        metrics::gauge!(m::NETFLOW_ACTIVE_SESSIONS, m::LABEL_VERSION => label)
            .set(sessions.len() as f64);
        metrics::counter!(m::NETFLOW_SESSIONS_EXPIRED_TOTAL, m::LABEL_VERSION => label)
            .increment(stats.sessions as u64);
        metrics::counter!(m::NETFLOW_TEMPLATES_EXPIRED_TOTAL, m::LABEL_VERSION => label)
            .increment(stats.templates as u64);
        stats
    }

    /// `interval`마다 만료 주기를 실행합니다. `cancel`이 취소되면 종료합니다.
    pub async fn cleanup_loop(self: Arc<Self>, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        // 첫 tick은 즉시 완료되므로 건너뜀
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let stats = self.expire_sessions();
                    if stats.sessions > 0 || stats.templates > 0 {
                        debug!(
                            sessions = stats.sessions,
                            templates = stats.templates,
                            "expired idle sessions and templates"
                        );
                    }
                }
                _ = cancel.cancelled() => {
                    info!("session cleanup loop stopped");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::fields::Decoder;
    use crate::template::FieldTemplate;

    fn key(port: u16, source_id: u32) -> SessionKey {
        SessionKey::new(SocketAddr::from(([192, 0, 2, 1], port)), source_id, false)
    }

    fn template(id: u16) -> Arc<Template> {
        Arc::new(Template::new(
            id,
            vec![FieldTemplate::known(4, "octetDeltaCount", Decoder::Unsigned64)],
        ))
    }

    #[test]
    fn shared_key_ignores_port() {
        let a = SessionKey::new(SocketAddr::from(([192, 0, 2, 1], 4000)), 7, true);
        let b = SessionKey::new(SocketAddr::from(([192, 0, 2, 1], 5000)), 7, true);
        assert_eq!(a, b);
        assert_ne!(key(4000, 7), key(5000, 7));
        assert_ne!(key(4000, 7), key(4000, 8));
    }

    #[test]
    fn session_key_display() {
        assert_eq!(key(2055, 3).to_string(), "192.0.2.1:2055/3");
    }

    #[test]
    fn added_template_is_returned() {
        let session = SessionState::new();
        let t = template(256);
        session.add_template(Arc::clone(&t));
        let got = session.get_template(256).unwrap();
        assert!(Arc::ptr_eq(&t, &got));
        assert!(session.get_template(257).is_none());
    }

    #[test]
    fn add_overwrites_existing_template() {
        let session = SessionState::new();
        session.add_template(template(256));
        let newer = template(256);
        session.add_template(Arc::clone(&newer));
        assert!(Arc::ptr_eq(&newer, &session.get_template(256).unwrap()));
        assert_eq!(session.template_count(), 1);
    }

    #[test]
    fn untouched_template_expires_on_second_sweep() {
        let session = SessionState::new();
        session.add_template(template(256));

        assert_eq!(session.expire_templates(), 0);
        assert!(session.template_count() == 1);
        assert_eq!(session.expire_templates(), 1);
        assert!(session.get_template(256).is_none());
    }

    #[test]
    fn accessed_template_survives_sweeps() {
        let session = SessionState::new();
        session.add_template(template(256));

        for _ in 0..5 {
            assert_eq!(session.expire_templates(), 0);
            assert!(session.get_template(256).is_some());
        }
    }

    #[test]
    fn remove_single_and_all() {
        let session = SessionState::new();
        session.add_template(template(256));
        session.add_template(template(257));
        assert!(session.remove_template(256));
        assert!(!session.remove_template(256));
        session.remove_all_templates();
        assert_eq!(session.template_count(), 0);
    }

    #[test]
    fn large_regression_resets_templates() {
        let session = SessionState::new();
        session.add_template(template(256));

        assert!(!session.check_reset(50_000, 1000));
        assert!(!session.check_reset(50_001, 1000));
        assert!(session.check_reset(10, 1000));
        assert_eq!(session.template_count(), 0);
    }

    #[test]
    fn small_regression_is_not_a_reset() {
        let session = SessionState::new();
        session.add_template(template(256));

        assert!(!session.check_reset(5000, 1000));
        assert!(!session.check_reset(4990, 1000));
        assert!(!session.check_reset(4000, 1000));
        assert_eq!(session.template_count(), 1);
    }

    #[test]
    fn wraparound_and_forward_jump_are_not_resets() {
        let session = SessionState::new();
        session.add_template(template(256));

        assert!(!session.check_reset(u32::MAX - 5, 1000));
        assert!(!session.check_reset(3, 1000));
        assert!(!session.check_reset(1_000_000, 1000));
        assert_eq!(session.template_count(), 1);
    }

    #[test]
    fn restart_from_upper_half_of_sequence_space_is_a_reset() {
        let session = SessionState::new();
        session.add_template(template(256));

        assert!(!session.check_reset(3_000_000_000, 1000));
        assert!(session.check_reset(10, 1000));
        assert_eq!(session.template_count(), 0);

        session.add_template(template(256));
        assert!(!session.check_reset(u32::MAX - 100, 1000));
        assert!(session.check_reset(2_000_000_000, 1000));
        assert_eq!(session.template_count(), 0);
    }

    #[test]
    fn first_packet_with_low_sequence_is_not_a_reset() {
        let session = SessionState::new();
        assert!(!session.check_reset(0, 1000));
        assert!(!session.check_reset(1, 1000));
    }

    #[test]
    fn get_or_create_returns_same_session() {
        let map = SessionMap::new("v9");
        let a = map.get_or_create(key(2055, 1));
        let b = map.get_or_create(key(2055, 1));
        assert!(Arc::ptr_eq(&a, &b));
        let c = map.get_or_create(key(2055, 2));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn concurrent_get_or_create_yields_single_instance() {
        let map = Arc::new(SessionMap::new("v9"));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let map = Arc::clone(&map);
                std::thread::spawn(move || {
                    (0..100)
                        .map(|_| map.get_or_create(key(2055, 42)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let sessions: Vec<Arc<SessionState>> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let first = &sessions[0];
        assert!(sessions.iter().all(|s| Arc::ptr_eq(first, s)));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn idle_session_expires_on_second_sweep() {
        let map = SessionMap::new("v9");
        let active = key(2055, 1);
        let idle = key(2055, 2);
        map.get_or_create(active).add_template(template(256));
        map.get_or_create(idle);

        let first = map.expire_sessions();
        assert_eq!(first, ExpireStats::default());

        // active 세션과 그 템플릿만 사용
        map.get_or_create(active).get_template(256).unwrap();

        let second = map.expire_sessions();
        assert_eq!(second.sessions, 1);
        assert_eq!(second.templates, 0);
        assert_eq!(map.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_loop_expires_and_stops() {
        let map = Arc::new(SessionMap::new("v9"));
        map.get_or_create(key(2055, 1));

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(Arc::clone(&map).cleanup_loop(
            Duration::from_secs(10),
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert!(map.is_empty());

        cancel.cancel();
        handle.await.unwrap();
    }
}
