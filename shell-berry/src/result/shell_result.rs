//! 单个信号组的壳层结果累加器.

use super::stats::chi_square_sf;
use super::{Aggregation, CountType, Normalisation, ShellKey};
use crate::consts::MAX_SHELL_COUNT;
use crate::shell::ShrinkType;
use std::collections::BTreeMap;
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

type Rows = BTreeMap<ShellKey, Vec<u64>>;

/// 单个信号组的壳层累加结果: `(类别, 细胞, 细胞核, 可选信号) -> [u64; N]`.
///
/// 所有写入都是累加而非覆盖. 每一行的长度固定为构造时给定的壳层数 `N`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShellResult {
    n_shells: usize,
    shrink_type: ShrinkType,
    signal: Rows,
    counterstain: Rows,
}

impl ShellResult {
    /// 创建 `n_shells` 层的空结果.
    ///
    /// # 注意
    ///
    /// 如果 `n_shells` 不在 `1..=MAX_SHELL_COUNT` 内, 则程序 panic.
    pub fn new(n_shells: usize, shrink_type: ShrinkType) -> Self {
        assert!(
            (1..=MAX_SHELL_COUNT).contains(&n_shells),
            "壳层个数必须位于 1..={MAX_SHELL_COUNT}, 但得到了 {n_shells}"
        );
        Self {
            n_shells,
            shrink_type,
            signal: Rows::new(),
            counterstain: Rows::new(),
        }
    }

    /// 以同样的壳层数与收缩策略创建空结果.
    #[inline]
    pub fn empty_like(&self) -> Self {
        Self::new(self.n_shells, self.shrink_type)
    }

    /// 壳层个数.
    #[inline]
    pub fn n_shells(&self) -> usize {
        self.n_shells
    }

    /// 收缩策略.
    #[inline]
    pub fn shrink_type(&self) -> ShrinkType {
        self.shrink_type
    }

    #[inline]
    fn rows(&self, count_type: CountType) -> &Rows {
        match count_type {
            CountType::Signal => &self.signal,
            CountType::Counterstain => &self.counterstain,
        }
    }

    #[inline]
    fn rows_mut(&mut self, count_type: CountType) -> &mut Rows {
        match count_type {
            CountType::Signal => &mut self.signal,
            CountType::Counterstain => &mut self.counterstain,
        }
    }

    /// 将 `counts` 累加到细胞核层面的行 `(count_type, cell, component)`.
    ///
    /// # 注意
    ///
    /// 如果 `counts.len() != self.n_shells()`, 则程序 panic.
    #[inline]
    pub fn add_shell_data(
        &mut self,
        count_type: CountType,
        cell: Uuid,
        component: Uuid,
        counts: &[u64],
    ) {
        self.add_keyed(count_type, ShellKey::new(cell, component, None), counts);
    }

    /// 将 `counts` 累加到信号层面的行 `(count_type, cell, component, signal)`.
    ///
    /// # 注意
    ///
    /// 如果 `counts.len() != self.n_shells()`, 则程序 panic.
    #[inline]
    pub fn add_signal_shell_data(
        &mut self,
        count_type: CountType,
        cell: Uuid,
        component: Uuid,
        signal: Uuid,
        counts: &[u64],
    ) {
        self.add_keyed(count_type, ShellKey::new(cell, component, Some(signal)), counts);
    }

    /// 将 `counts` 累加到 `key` 对应的行.
    ///
    /// # 注意
    ///
    /// 如果 `counts.len() != self.n_shells()`, 则程序 panic.
    pub fn add_keyed(&mut self, count_type: CountType, key: ShellKey, counts: &[u64]) {
        assert_eq!(
            counts.len(),
            self.n_shells,
            "壳层数据长度必须为 {}, 但得到了 {}",
            self.n_shells,
            counts.len()
        );
        let n = self.n_shells;
        let row = self
            .rows_mut(count_type)
            .entry(key)
            .or_insert_with(|| vec![0; n]);
        row.iter_mut().zip(counts).for_each(|(r, &c)| *r += c);
    }

    /// 获取行数据. 没有写入过该键时返回 `None` (与全 0 的行不同).
    #[inline]
    pub fn get_pixel_values(
        &self,
        count_type: CountType,
        cell: Uuid,
        component: Uuid,
        signal: Option<Uuid>,
    ) -> Option<&[u64]> {
        self.get_keyed(count_type, &ShellKey::new(cell, component, signal))
    }

    /// 按键获取行数据.
    #[inline]
    pub fn get_keyed(&self, count_type: CountType, key: &ShellKey) -> Option<&[u64]> {
        self.rows(count_type).get(key).map(Vec::as_slice)
    }

    /// 按键序遍历某一类别的所有行.
    #[inline]
    pub fn iter(&self, count_type: CountType) -> impl Iterator<Item = (&ShellKey, &[u64])> {
        self.rows(count_type).iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// 是否没有任何数据.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.signal.is_empty() && self.counterstain.is_empty()
    }

    /// 每个单位 (细胞核或信号) 的各层比例.
    ///
    /// 信号总量为 0 的单位被排除; 在 `Dapi` 归一化下, 复染为 0 的层贡献 0,
    /// 缺少复染行的单位被排除.
    fn unit_proportions(
        &self,
        aggregation: Aggregation,
        normalisation: Normalisation,
    ) -> Vec<Vec<f64>> {
        let wanted = |k: &ShellKey| match aggregation {
            Aggregation::ByNucleus => !k.has_signal(),
            Aggregation::BySignal => k.has_signal(),
        };
        self.signal
            .iter()
            .filter(|&(k, _)| wanted(k))
            .filter_map(|(k, sig)| {
                let values: Vec<f64> = match normalisation {
                    Normalisation::None => sig.iter().map(|&s| s as f64).collect(),
                    Normalisation::Dapi => {
                        let cs = self.counterstain.get(&k.component_key())?;
                        sig.iter()
                            .zip(cs)
                            .map(|(&s, &c)| if c == 0 { 0.0 } else { s as f64 / c as f64 })
                            .collect()
                    }
                };
                let total: f64 = values.iter().sum();
                (total > 0.0).then(|| values.into_iter().map(|v| v / total).collect())
            })
            .collect()
    }

    /// 参与给定聚合与归一化方式计算的单位个数.
    #[inline]
    pub fn unit_count(&self, aggregation: Aggregation, normalisation: Normalisation) -> usize {
        self.unit_proportions(aggregation, normalisation).len()
    }

    /// 各层比例: 先求每个单位的比例, 再逐层取平均.
    ///
    /// 存在参与计算的单位时结果之和为 1; 否则返回全 0.
    pub fn proportions(&self, aggregation: Aggregation, normalisation: Normalisation) -> Vec<f64> {
        let units = self.unit_proportions(aggregation, normalisation);
        mean_by_shell(&units, self.n_shells)
    }

    /// 各层比例的标准误 `stdev / sqrt(n)`. 单位少于 2 个时为 0.
    pub fn std_errs(&self, aggregation: Aggregation, normalisation: Normalisation) -> Vec<f64> {
        let units = self.unit_proportions(aggregation, normalisation);
        let n = units.len();
        if n < 2 {
            return vec![0.0; self.n_shells];
        }
        let mean = mean_by_shell(&units, self.n_shells);
        (0..self.n_shells)
            .map(|i| {
                let var = units.iter().map(|u| (u[i] - mean[i]).powi(2)).sum::<f64>()
                    / (n - 1) as f64;
                var.sqrt() / (n as f64).sqrt()
            })
            .collect()
    }

    /// 加权平均壳层 `Σ i * p_i`. 0 为最外层.
    pub fn overall_shell(&self, aggregation: Aggregation, normalisation: Normalisation) -> f64 {
        self.proportions(aggregation, normalisation)
            .iter()
            .enumerate()
            .map(|(i, p)| i as f64 * p)
            .sum()
    }

    /// 与 `expected` (通常为随机分布) 相比的卡方统计量.
    ///
    /// 观测值为 `floor(本结果比例 * 单位数)`, 期望值为 `expected 比例 * 单位数`;
    /// 两者总和不同时期望值按观测总和缩放.
    ///
    /// # 返回值
    ///
    /// 只有一层, 没有单位, 观测全为 0, 或任一期望值不为正时返回 `None`.
    ///
    /// # 注意
    ///
    /// 如果两个结果的壳层数不同, 则程序 panic.
    pub fn chi_square(
        &self,
        aggregation: Aggregation,
        normalisation: Normalisation,
        expected: &ShellResult,
    ) -> Option<f64> {
        assert_eq!(self.n_shells, expected.n_shells, "壳层数不一致");
        if self.n_shells < 2 {
            return None;
        }
        let units = self.unit_proportions(aggregation, normalisation);
        let count = units.len() as f64;
        if units.is_empty() {
            return None;
        }
        let observed: Vec<f64> = mean_by_shell(&units, self.n_shells)
            .into_iter()
            .map(|p| (p * count).floor())
            .collect();
        let exp: Vec<f64> = expected
            .proportions(aggregation, normalisation)
            .into_iter()
            .map(|p| p * count)
            .collect();
        if exp.iter().any(|&e| e <= 0.0) {
            return None;
        }
        let sum_obs: f64 = observed.iter().sum();
        let sum_exp: f64 = exp.iter().sum();
        if sum_obs <= 0.0 {
            return None;
        }
        let ratio = if (sum_exp - sum_obs).abs() > 1e-5 {
            sum_obs / sum_exp
        } else {
            1.0
        };
        Some(
            observed
                .iter()
                .zip(&exp)
                .map(|(&o, &e)| {
                    let e = ratio * e;
                    (o - e) * (o - e) / e
                })
                .sum(),
        )
    }

    /// 卡方检验 p 值, 自由度为 `N - 1`. 参见 [`Self::chi_square`].
    pub fn p_value(
        &self,
        aggregation: Aggregation,
        normalisation: Normalisation,
        expected: &ShellResult,
    ) -> Option<f64> {
        self.chi_square(aggregation, normalisation, expected)
            .map(|chi| chi_square_sf(chi, self.n_shells - 1))
    }
}

fn mean_by_shell(units: &[Vec<f64>], n_shells: usize) -> Vec<f64> {
    if units.is_empty() {
        return vec![0.0; n_shells];
    }
    let n = units.len() as f64;
    (0..n_shells)
        .map(|i| units.iter().map(|u| u[i]).sum::<f64>() / n)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-8
    }

    fn ids() -> (Uuid, Uuid) {
        (Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn test_additive() {
        let mut r = ShellResult::new(3, ShrinkType::Area);
        let (c, n) = ids();
        r.add_shell_data(CountType::Signal, c, n, &[1, 2, 3]);
        r.add_shell_data(CountType::Signal, c, n, &[10, 0, 5]);
        assert_eq!(
            r.get_pixel_values(CountType::Signal, c, n, None),
            Some(&[11, 2, 8][..])
        );
        assert_eq!(r.get_pixel_values(CountType::Counterstain, c, n, None), None);
    }

    #[test]
    fn test_missing_vs_zero() {
        let mut r = ShellResult::new(2, ShrinkType::Radius);
        let (c, n) = ids();
        let s = Uuid::new_v4();
        assert!(r.get_pixel_values(CountType::Signal, c, n, Some(s)).is_none());
        r.add_signal_shell_data(CountType::Signal, c, n, s, &[0, 0]);
        assert_eq!(
            r.get_pixel_values(CountType::Signal, c, n, Some(s)),
            Some(&[0, 0][..])
        );
        assert!(r.get_pixel_values(CountType::Signal, c, n, None).is_none());
    }

    #[test]
    #[should_panic]
    fn test_wrong_length_panics() {
        let mut r = ShellResult::new(5, ShrinkType::Area);
        let (c, n) = ids();
        r.add_shell_data(CountType::Signal, c, n, &[1, 2, 3]);
    }

    #[test]
    fn test_average_of_proportions() {
        let mut r = ShellResult::new(2, ShrinkType::Area);
        let (c1, n1) = ids();
        let (c2, n2) = ids();
        // 比例 [1, 0] 与 [0.5, 0.5], 平均为 [0.75, 0.25]; 先求和再归一化会得到 [~0.995, ~0.005].
        r.add_shell_data(CountType::Signal, c1, n1, &[1000, 0]);
        r.add_shell_data(CountType::Signal, c2, n2, &[5, 5]);
        let p = r.proportions(Aggregation::ByNucleus, Normalisation::None);
        assert!(f64_eq(p[0], 0.75) && f64_eq(p[1], 0.25));
        assert!(f64_eq(r.overall_shell(Aggregation::ByNucleus, Normalisation::None), 0.25));
        assert_eq!(r.unit_count(Aggregation::ByNucleus, Normalisation::None), 2);
    }

    #[test]
    fn test_by_signal_units() {
        let mut r = ShellResult::new(2, ShrinkType::Area);
        let (c, n) = ids();
        r.add_shell_data(CountType::Signal, c, n, &[3, 3]);
        for _ in 0..3 {
            r.add_signal_shell_data(CountType::Signal, c, n, Uuid::new_v4(), &[4, 0]);
        }
        r.add_signal_shell_data(CountType::Signal, c, n, Uuid::new_v4(), &[0, 4]);
        let p = r.proportions(Aggregation::BySignal, Normalisation::None);
        assert!(f64_eq(p[0], 0.75) && f64_eq(p[1], 0.25));
        assert_eq!(r.unit_count(Aggregation::BySignal, Normalisation::None), 4);
        let p = r.proportions(Aggregation::ByNucleus, Normalisation::None);
        assert!(f64_eq(p[0], 0.5));
    }

    #[test]
    fn test_proportions_sum_to_one() {
        let mut r = ShellResult::new(5, ShrinkType::Radius);
        for i in 0..6u64 {
            let (c, n) = ids();
            r.add_shell_data(CountType::Counterstain, c, n, &[50, 40, 30 + i, 0, 10]);
            r.add_shell_data(CountType::Signal, c, n, &[i, 2 * i + 1, 3, 7, 0]);
            r.add_signal_shell_data(CountType::Signal, c, n, Uuid::new_v4(), &[0, i, 1, 0, 2]);
        }
        for agg in Aggregation::ALL {
            for norm in Normalisation::ALL {
                let s: f64 = r.proportions(agg, norm).iter().sum();
                assert!(f64_eq(s, 1.0), "{agg} {norm}: {s}");
            }
        }
    }

    #[test]
    fn test_dapi_uniform_when_equal() {
        let mut r = ShellResult::new(4, ShrinkType::Area);
        for row in [[10u64, 20, 30, 40], [7, 1, 9, 100]] {
            let (c, n) = ids();
            r.add_shell_data(CountType::Signal, c, n, &row);
            r.add_shell_data(CountType::Counterstain, c, n, &row);
        }
        let p = r.proportions(Aggregation::ByNucleus, Normalisation::Dapi);
        assert!(p.iter().all(|&x| f64_eq(x, 0.25)), "{p:?}");
        assert!(r
            .std_errs(Aggregation::ByNucleus, Normalisation::Dapi)
            .iter()
            .all(|&e| f64_eq(e, 0.0)));
    }

    #[test]
    fn test_zero_guards() {
        let mut r = ShellResult::new(3, ShrinkType::Area);
        let (c, n) = ids();
        r.add_shell_data(CountType::Signal, c, n, &[0, 0, 0]);
        r.add_shell_data(CountType::Counterstain, c, n, &[0, 0, 0]);
        for agg in Aggregation::ALL {
            for norm in Normalisation::ALL {
                assert_eq!(r.proportions(agg, norm), vec![0.0; 3]);
                assert_eq!(r.unit_count(agg, norm), 0);
            }
        }
        // 复染为 0 的层贡献 0, 其余层正常归一化.
        let (c, n) = ids();
        r.add_shell_data(CountType::Signal, c, n, &[5, 5, 5]);
        r.add_shell_data(CountType::Counterstain, c, n, &[0, 5, 5]);
        let p = r.proportions(Aggregation::ByNucleus, Normalisation::Dapi);
        assert!(f64_eq(p[0], 0.0) && f64_eq(p[1], 0.5) && f64_eq(p[2], 0.5));
    }

    #[test]
    fn test_std_errs() {
        let mut r = ShellResult::new(2, ShrinkType::Area);
        for row in [[1u64, 0], [0, 1]] {
            let (c, n) = ids();
            r.add_shell_data(CountType::Signal, c, n, &row);
        }
        // 比例 1 与 0: 样本标准差 sqrt(0.5), 标准误 0.5.
        let e = r.std_errs(Aggregation::ByNucleus, Normalisation::None);
        assert!(f64_eq(e[0], 0.5) && f64_eq(e[1], 0.5));
    }

    #[test]
    fn test_chi_square_against_uniform() {
        let mut uniform = ShellResult::new(2, ShrinkType::Area);
        let mut skewed = ShellResult::new(2, ShrinkType::Area);
        for _ in 0..100 {
            let (c, n) = ids();
            uniform.add_shell_data(CountType::Signal, c, n, &[1, 1]);
            skewed.add_shell_data(CountType::Signal, c, n, &[3, 1]);
        }
        let agg = Aggregation::ByNucleus;
        let norm = Normalisation::None;
        // 观测 [75, 25], 期望 [50, 50]: 25^2/50 * 2 = 25.
        assert!(f64_eq(skewed.chi_square(agg, norm, &uniform).unwrap(), 25.0));
        let p = skewed.p_value(agg, norm, &uniform).unwrap();
        assert!(p < 1e-5);
        assert!(f64_eq(uniform.chi_square(agg, norm, &uniform).unwrap(), 0.0));
        assert!(f64_eq(uniform.p_value(agg, norm, &uniform).unwrap(), 1.0));

        let empty = ShellResult::new(2, ShrinkType::Area);
        assert!(skewed.chi_square(agg, norm, &empty).is_none());
        assert!(empty.chi_square(agg, norm, &uniform).is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_bincode_round_trip() {
        let mut r = ShellResult::new(3, ShrinkType::Radius);
        let (c, n) = ids();
        r.add_shell_data(CountType::Signal, c, n, &[1, 2, 3]);
        r.add_signal_shell_data(CountType::Signal, c, n, Uuid::new_v4(), &[0, 2, 0]);
        r.add_shell_data(CountType::Counterstain, c, n, &[9, 9, 9]);
        let bytes = bincode::serialize(&r).unwrap();
        let back: ShellResult = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, r);
    }
}
