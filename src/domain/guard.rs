//! 重复提交检查
//!
//! 每个 (评价人, 对象) 至多一条占用名额的评价。待审核与已通过的评价总是占用名额，
//! 已驳回的评价是否占用由 `ReviewPolicy::rejected_blocks_resubmission` 决定，
//! 软删除的评价从不占用。

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use super::ReviewPolicy;
use crate::models::reviews::entities::{ModerationStatus, Review};

/// 该评价是否占用名额
pub fn occupies_slot(review: &Review, policy: &ReviewPolicy) -> bool {
    if review.is_deleted() {
        return false;
    }
    review.status != ModerationStatus::Rejected || policy.rejected_blocks_resubmission
}

/// 返回阻止提交的那条评价
pub fn blocking_review<'a>(
    existing: &'a [Review],
    reviewer_id: i64,
    offering_id: i64,
    policy: &ReviewPolicy,
) -> Option<&'a Review> {
    existing.iter().find(|r| {
        r.reviewer_id == reviewer_id && r.offering_id == offering_id && occupies_slot(r, policy)
    })
}

pub fn can_submit(
    existing: &[Review],
    reviewer_id: i64,
    offering_id: i64,
    policy: &ReviewPolicy,
) -> bool {
    blocking_review(existing, reviewer_id, offering_id, policy).is_none()
}

/// 进程内的提交锁
///
/// 同一 (评价人, 对象) 的提交串行执行，不同键之间互不影响。
/// 跨进程的唯一性由存储层事务保证。
#[derive(Default)]
pub struct SubmissionGuard {
    locks: DashMap<(i64, i64), Arc<Mutex<()>>>,
}

impl SubmissionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 持有该键的锁执行 `task`
    pub async fn run<F, Fut, T>(&self, reviewer_id: i64, offering_id: i64, task: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let key = (reviewer_id, offering_id);
        // entry 的分片锁不能跨 await 持有
        let lock = self
            .locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let result = {
            let _held = lock.lock().await;
            task().await
        };

        drop(lock);
        self.locks.remove_if(&key, |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    /// 当前仍登记在册的键数量
    pub fn tracked_keys(&self) -> usize {
        self.locks.len()
    }
}
