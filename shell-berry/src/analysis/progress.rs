//! 分析进度.

use std::sync::atomic::{AtomicUsize, Ordering};

/// 以细胞核为单位的分析进度. 可被其他线程通过 `Arc` 轮询.
///
/// 每处理完一个细胞核 (无论成功与否) 计数加一, 与处理顺序无关.
#[derive(Debug, Default)]
pub struct Progress {
    done: AtomicUsize,
    total: AtomicUsize,
}

impl Progress {
    /// 已处理的细胞核个数.
    #[inline]
    pub fn done(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }

    /// 细胞核总数.
    #[inline]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// 完成比例. 总数为 0 时视为已完成.
    pub fn fraction(&self) -> f64 {
        match self.total() {
            0 => 1.0,
            t => self.done() as f64 / t as f64,
        }
    }

    /// 重置并设置总数.
    pub(crate) fn start(&self, total: usize) {
        self.done.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    /// 计数加一.
    #[inline]
    pub(crate) fn tick(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_concurrent_ticks() {
        let p = Arc::new(Progress::default());
        assert_eq!(p.fraction(), 1.0);
        p.start(400);
        thread::scope(|s| {
            for _ in 0..4 {
                let p = Arc::clone(&p);
                s.spawn(move || (0..100).for_each(|_| p.tick()));
            }
        });
        assert_eq!(p.done(), 400);
        assert_eq!(p.fraction(), 1.0);
        p.start(10);
        assert_eq!(p.done(), 0);
    }
}
