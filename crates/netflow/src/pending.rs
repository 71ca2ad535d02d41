//! 미확인 템플릿 레코드 캐시
//!
//! 템플릿 정의보다 데이터 셋이 먼저 도착하면 원본 바이트를
//! (세션, 템플릿 ID) 별 backlog에 보관했다가 템플릿이 등록될 때 재생합니다.
//!
//! 만료는 최근 사용 순서(LRU)가 아니라 backlog가 처음 만들어진 시각 기준입니다.
//! 생성 시각 순 min-heap을 두고, 정리 주기마다 가장 오래된 항목부터
//! `removal_threshold`가 지난 backlog를 버립니다.

use std::cmp::{Ordering, Reverse};
use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use flowpost_core::metrics as m;

use crate::error::NetflowError;
use crate::session::SessionKey;

/// backlog 식별자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingKey {
    /// 데이터 셋을 보낸 세션
    pub session: SessionKey,
    /// 데이터 셋이 참조한 템플릿 ID
    pub template_id: u16,
}

impl PendingKey {
    /// 키를 생성합니다.
    pub fn new(session: SessionKey, template_id: u16) -> Self {
        Self {
            session,
            template_id,
        }
    }
}

#[derive(Debug)]
struct Backlog {
    generation: u64,
    created: Instant,
    buffers: Vec<Bytes>,
}

/// heap 항목. `generation`이 현재 backlog와 다르면 이미 소비된 항목입니다.
#[derive(Debug)]
struct HeapEntry {
    created: Instant,
    generation: u64,
    key: PendingKey,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.created, self.generation).cmp(&(other.created, other.generation))
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    backlogs: HashMap<PendingKey, Backlog>,
    heap: BinaryHeap<Reverse<HeapEntry>>,
    next_generation: u64,
    buffered: usize,
}

#[derive(Debug)]
struct Worker {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

/// 템플릿을 기다리는 데이터 셋 캐시
#[derive(Debug)]
pub struct PendingTemplatesCache {
    protocol: &'static str,
    inner: Mutex<CacheInner>,
    worker: Mutex<Option<Worker>>,
    cleanup_interval: Duration,
    removal_threshold: Duration,
}

impl PendingTemplatesCache {
    /// `protocol` 인스턴스가 소유할 캐시를 생성합니다. 정리 작업은 [`start`](Self::start)로 시작합니다.
    pub fn new(
        protocol: &'static str,
        cleanup_interval: Duration,
        removal_threshold: Duration,
    ) -> Self {
        Self {
            protocol,
            inner: Mutex::new(CacheInner::default()),
            worker: Mutex::new(None),
            cleanup_interval,
            removal_threshold,
        }
    }

    /// 데이터 셋 원본을 backlog에 추가합니다.
    pub fn add(&self, key: PendingKey, buffer: Bytes) {
        let now = Instant::now();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = inner.next_generation;

        let created = match inner.backlogs.entry(key) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().buffers.push(buffer);
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(Backlog {
                    generation,
                    created: now,
                    buffers: vec![buffer],
                });
                true
            }
        };
        if created {
            inner.heap.push(Reverse(HeapEntry {
                created: now,
                generation,
                key,
            }));
            inner.next_generation += 1;
        }
        inner.buffered += 1;
        metrics::gauge!(m::NETFLOW_PENDING_BUFFERS, m::LABEL_VERSION => self.protocol)
            .set(inner.buffered as f64);
    }

    /// backlog 전체를 떼어내 반환합니다. 없으면 빈 벡터입니다.
    pub fn get_and_remove(&self, key: &PendingKey) -> Vec<Bytes> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(backlog) = inner.backlogs.remove(key) else {
            return Vec::new();
        };
        inner.buffered -= backlog.buffers.len();
        metrics::gauge!(m::NETFLOW_PENDING_BUFFERS, m::LABEL_VERSION => self.protocol)
            .set(inner.buffered as f64);
        backlog.buffers
    }

    /// 보관 중인 버퍼 수
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .buffered
    }

    /// 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 만료된 backlog를 제거하고 버린 버퍼 수를 반환합니다.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let mut removed = 0;

        while let Some(Reverse(oldest)) = inner.heap.peek() {
            if now.duration_since(oldest.created) < self.removal_threshold {
                break;
            }
            let Some(Reverse(entry)) = inner.heap.pop() else {
                break;
            };
            let current = inner
                .backlogs
                .get(&entry.key)
                .is_some_and(|b| b.generation == entry.generation);
            if !current {
                continue;
            }
            if let Some(backlog) = inner.backlogs.remove(&entry.key) {
                debug!(
                    session = %entry.key.session,
                    template_id = entry.key.template_id,
                    buffers = backlog.buffers.len(),
                    "dropping records still waiting for their template"
                );
                removed += backlog.buffers.len();
            }
        }

        inner.buffered -= removed;
        metrics::gauge!(m::NETFLOW_PENDING_BUFFERS, m::LABEL_VERSION => self.protocol)
            .set(inner.buffered as f64);
        metrics::counter!(m::NETFLOW_PENDING_EXPIRED_TOTAL, m::LABEL_VERSION => self.protocol)
            .increment(removed as u64);
        removed
    }

    /// 주기적 정리 작업을 시작합니다.
    pub fn start(self: &Arc<Self>) -> Result<(), NetflowError> {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if worker.as_ref().is_some_and(|w| !w.cancel.is_cancelled()) {
            return Err(NetflowError::AlreadyRunning);
        }

        let cancel = CancellationToken::new();
        let cache = Arc::clone(self);
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cache.cleanup_interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        cache.cleanup();
                    }
                    _ = token.cancelled() => {
                        info!("pending template cache cleanup stopped");
                        break;
                    }
                }
            }
        });

        *worker = Some(Worker {
            cancel,
            handle: Some(handle),
        });
        Ok(())
    }

    /// 정리 작업에 종료를 알립니다. 완료를 기다리지 않습니다.
    pub fn stop(&self) {
        let worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(worker) = worker.as_ref() {
            worker.cancel.cancel();
        }
    }

    /// 정리 작업이 끝날 때까지 기다립니다.
    pub async fn wait(&self) {
        let handle = {
            let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
            worker.as_mut().and_then(|w| w.handle.take())
        };
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "pending template cache cleanup task failed");
            }
        }
    }
}
