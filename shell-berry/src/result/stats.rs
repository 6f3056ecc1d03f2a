//! 卡方检验所需的特殊函数.

use std::f64::consts::PI;

const MAX_ITER: usize = 500;
const EPS: f64 = 1e-15;
const FP_MIN: f64 = 1e-300;

/// Lanczos 系数, `g = 7`, `n = 9`.
const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// `ln Γ(x)`, `x > 0`.
pub(crate) fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // 反射公式
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let t = x + 7.5;
    let a = LANCZOS
        .iter()
        .enumerate()
        .skip(1)
        .fold(LANCZOS[0], |acc, (i, &c)| acc + c / (x + i as f64));
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
}

/// 正则化上不完全 Gamma 函数 `Q(a, x) = Γ(a, x) / Γ(a)`.
///
/// # 注意
///
/// 如果 `a <= 0` 或 `x < 0`, 则程序 panic.
pub(crate) fn gamma_q(a: f64, x: f64) -> f64 {
    assert!(a > 0.0 && x >= 0.0, "gamma_q 的定义域为 a > 0, x >= 0");
    if x == 0.0 {
        1.0
    } else if x < a + 1.0 {
        1.0 - lower_series(a, x)
    } else {
        upper_fraction(a, x)
    }
}

/// `P(a, x)` 的级数展开.
fn lower_series(a: f64, x: f64) -> f64 {
    let mut ap = a;
    let mut del = 1.0 / a;
    let mut sum = del;
    for _ in 0..MAX_ITER {
        ap += 1.0;
        del *= x / ap;
        sum += del;
        if del.abs() < sum.abs() * EPS {
            break;
        }
    }
    sum * (-x + a * x.ln() - ln_gamma(a)).exp()
}

/// `Q(a, x)` 的连分式展开 (modified Lentz).
fn upper_fraction(a: f64, x: f64) -> f64 {
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / FP_MIN;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..MAX_ITER {
        let an = -(i as f64) * (i as f64 - a);
        b += 2.0;
        d = an * d + b;
        if d.abs() < FP_MIN {
            d = FP_MIN;
        }
        c = b + an / c;
        if c.abs() < FP_MIN {
            c = FP_MIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < EPS {
            break;
        }
    }
    (-x + a * x.ln() - ln_gamma(a)).exp() * h
}

/// 自由度为 `df` 的卡方分布上尾概率 `P(X >= chi)`.
#[inline]
pub(crate) fn chi_square_sf(chi: f64, df: usize) -> f64 {
    gamma_q(df as f64 / 2.0, chi / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_ln_gamma() {
        assert!(close(ln_gamma(1.0), 0.0, 1e-12));
        assert!(close(ln_gamma(5.0), 24f64.ln(), 1e-12));
        assert!(close(ln_gamma(0.5), PI.sqrt().ln(), 1e-12));
        assert!(close(ln_gamma(0.25), 3.625_609_908_221_908f64.ln(), 1e-10));
    }

    #[test]
    fn test_gamma_q_exponential() {
        // Q(1, x) = e^-x
        for x in [0.0, 0.1, 1.0, 2.5, 10.0, 40.0] {
            assert!(close(gamma_q(1.0, x), (-x).exp(), 1e-12), "x = {x}");
        }
    }

    #[test]
    fn test_chi_square_sf() {
        // df = 2: e^(-chi / 2)
        assert!(close(chi_square_sf(3.0, 2), (-1.5f64).exp(), 1e-12));
        // 常见临界值
        assert!(close(chi_square_sf(3.841_458_820_694_124, 1), 0.05, 1e-9));
        assert!(close(chi_square_sf(9.487_729_036_781_154, 4), 0.05, 1e-9));
        assert!(close(chi_square_sf(13.276_704_135_987_62, 4), 0.01, 1e-9));
        assert_eq!(chi_square_sf(0.0, 4), 1.0);
    }
}
