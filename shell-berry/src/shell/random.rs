//! 随机分布对照.

use super::ShellDetector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 细胞核内均匀随机点在各壳层中的计数, 作为信号分布的零假设对照.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomDistribution {
    counts: Vec<u64>,
    unmapped: u64,
}

impl RandomDistribution {
    /// 以 `seed` 初始化私有生成器, 在 `detector` 的细胞核内采样 `iterations` 个点.
    ///
    /// 相同的 `seed` 与 `iterations` 在同一细胞核上总是得到相同结果.
    ///
    /// # 注意
    ///
    /// 如果 `iterations` 为 0, 则程序 panic.
    pub fn new(detector: &ShellDetector, iterations: usize, seed: u64) -> Self {
        Self::with_rng(detector, iterations, &mut StdRng::seed_from_u64(seed))
    }

    /// 同 [`Self::new`], 但使用调用者提供的生成器.
    pub fn with_rng<R: Rng>(
        detector: &ShellDetector,
        iterations: usize,
        rng: &mut R,
    ) -> Self {
        assert!(iterations > 0, "随机分布的采样次数必须大于 0");
        let outline = detector.outline();
        let mut counts = vec![0u64; detector.shell_count()];
        let mut unmapped = 0u64;
        // 检测器保证轮廓面积为正, 因此拒绝采样必然终止.
        let Some(bounds) = outline.bounds() else {
            return Self { counts, unmapped };
        };
        let (h0, w0) = bounds.min;
        let (height, width) = (bounds.height(), bounds.width());

        for _ in 0..iterations {
            let p = loop {
                let p = (
                    h0 + height * rng.gen::<f64>(),
                    w0 + width * rng.gen::<f64>(),
                );
                if outline.contains(p) {
                    break p;
                }
            };
            match detector.find_shell(p) {
                Some(k) => counts[k] += 1,
                None => unmapped += 1,
            }
        }
        if unmapped > 0 {
            log::debug!("{unmapped} of {iterations} random points mapped to no shell");
        }
        Self { counts, unmapped }
    }

    /// 各层计数.
    #[inline]
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// 消费自我, 获得各层计数.
    #[inline]
    pub fn into_counts(self) -> Vec<u64> {
        self.counts
    }

    /// 未能映射到任何壳层的点数.
    #[inline]
    pub fn unmapped(&self) -> u64 {
        self.unmapped
    }
}
