//! 策略运行统计.

use std::time::{Duration, Instant};

/// ablation/benchmark 计时器.
///
/// 该计时器支持 "中途中断" 与 "结束中断, 继续开始计时".
#[derive(Clone, Debug)]
struct AccTimer {
    consumed: Duration,
    since: Instant,
}

impl AccTimer {
    /// 初始化计时器. 初始化时会视为已经开始计时 (`self.start()`).
    #[inline]
    fn new() -> Self {
        Self {
            consumed: Duration::ZERO,
            since: Instant::now(),
        }
    }

    /// 开始计时.
    #[inline]
    fn start(&mut self) {
        self.since = Instant::now();
    }

    /// 结束计时, 并将这一区间的时间累加. 返回本轮计时时长.
    ///
    /// # 注意
    ///
    /// 上一次调用必须是 `self.start()`, 否则计算时间值无意义.
    #[inline]
    fn elapsed(&mut self) -> Duration {
        let d = self.since.elapsed();
        self.consumed += d;
        d
    }

    /// 获得总共累计下来的时间综合 (以微秒为单位).
    #[inline]
    fn get_total_us(&self) -> u64 {
        self.consumed.as_micros() as u64
    }
}

/// 单个 (形态, 策略) 组合的统计.
#[derive(Clone, Debug)]
pub struct Profile {
    /// 成功划分壳层的细胞核个数.
    built: u64,

    /// 因面积或圆度被拒绝的细胞核个数.
    skipped: u64,

    /// 单独划分壳层花费的总时间.
    build_time: AccTimer,

    /// 完整分析流程 (含强度累积, 随机分布与合并) 花费的时间.
    analysis_time: AccTimer,

    /// 整个任务花费的总时间.
    real_time: AccTimer,

    /// 划分壳层最耗时的一次.
    most: Option<Duration>,

    /// 各细胞核上壳层像素数相对等分值的平均偏差之和.
    deviation: f64,

    /// 信号组与随机分布的加权平均壳层, 以及卡方检验 p 值.
    overall: Option<(f64, f64)>,
    p_value: Option<f64>,
}

impl Profile {
    /// 初始化.
    #[inline]
    pub fn new() -> Self {
        Self {
            built: 0,
            skipped: 0,
            build_time: AccTimer::new(),
            analysis_time: AccTimer::new(),
            real_time: AccTimer::new(),
            most: None,
            deviation: 0.0,
            overall: None,
            p_value: None,
        }
    }

    /// 开始一次壳层划分计时.
    #[inline]
    pub fn build_start(&mut self) {
        self.build_time.start();
    }

    /// 结束一次成功的壳层划分, 并记录各层像素数.
    pub fn build_elapsed(&mut self, counts: &[u64]) {
        let d = self.build_time.elapsed();
        self.most = Some(self.most.map_or(d, |m| m.max(d)));
        self.built += 1;
        self.deviation += area_deviation(counts);
    }

    /// 记录一个被拒绝的细胞核.
    #[inline]
    pub fn count_skipped(&mut self) {
        self.skipped += 1;
    }

    /// 开始完整分析流程计时.
    #[inline]
    pub fn analysis_start(&mut self) {
        self.analysis_time.start();
    }

    /// 结束完整分析流程计时.
    #[inline]
    pub fn analysis_elapsed(&mut self) {
        self.analysis_time.elapsed();
    }

    /// 记录分析结果.
    #[inline]
    pub fn record(&mut self, signal: f64, random: f64, p_value: Option<f64>) {
        self.overall = Some((signal, random));
        self.p_value = p_value;
    }

    /// 结束全部计时.
    #[inline]
    pub fn finish(mut self) -> Self {
        self.real_time.elapsed();
        self
    }

    /// 获得成功划分的细胞核个数.
    #[inline]
    pub fn get_built(&self) -> u64 {
        self.built
    }

    /// 获得被拒绝的细胞核个数.
    #[inline]
    pub fn get_skipped(&self) -> u64 {
        self.skipped
    }

    /// 以微秒为单位获得平均划分时间.
    pub fn get_avg_build_time_us(&self) -> Option<f64> {
        match self.built {
            0 => None,
            built => Some(self.build_time.get_total_us() as f64 / built as f64),
        }
    }

    /// 以微秒为单位获得完整分析流程的时间.
    #[inline]
    pub fn get_analysis_time_us(&self) -> u64 {
        self.analysis_time.get_total_us()
    }

    /// 以微秒为单位获得任务总时间.
    #[inline]
    pub fn get_real_time_us(&self) -> u64 {
        self.real_time.get_total_us()
    }

    /// 获取最耗时的一次划分.
    #[inline]
    pub fn get_most_time_consuming(&self) -> Option<Duration> {
        self.most
    }

    /// 获得壳层像素数相对等分值的平均偏差.
    pub fn get_avg_deviation(&self) -> Option<f64> {
        match self.built {
            0 => None,
            built => Some(self.deviation / built as f64),
        }
    }

    /// 获得信号组与随机分布的加权平均壳层.
    #[inline]
    pub fn get_overall(&self) -> Option<(f64, f64)> {
        self.overall
    }

    /// 获得卡方检验 p 值.
    #[inline]
    pub fn get_p_value(&self) -> Option<f64> {
        self.p_value
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}

/// `counts` 相对等分值 `Σ / N` 的平均相对偏差. 没有像素时为 0.
fn area_deviation(counts: &[u64]) -> f64 {
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let ideal = total as f64 / counts.len() as f64;
    counts
        .iter()
        .map(|&c| (c as f64 - ideal).abs() / ideal)
        .sum::<f64>()
        / counts.len() as f64
}
