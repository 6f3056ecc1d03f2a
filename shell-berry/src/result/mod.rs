//! 壳层结果的累积与统计.

mod key;
mod shell_result;
mod stats;

pub use key::ShellKey;
pub use shell_result::ShellResult;

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 像素数据类别.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CountType {
    /// 信号.
    Signal,
    /// 复染 (通常为 DAPI), 反映各层的 DNA 密度.
    Counterstain,
}

/// 求比例时的平均单位.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Aggregation {
    /// 以细胞核为单位, 每个细胞核贡献相同权重.
    ByNucleus,
    /// 以单个信号为单位, 信号多的细胞核贡献更多.
    BySignal,
}

/// 归一化方式.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Normalisation {
    /// 直接使用信号强度.
    None,
    /// 先除以同一细胞核同一层的复染强度.
    Dapi,
}

impl Aggregation {
    /// 所有取值.
    pub const ALL: [Aggregation; 2] = [Aggregation::ByNucleus, Aggregation::BySignal];
}

impl Normalisation {
    /// 所有取值.
    pub const ALL: [Normalisation; 2] = [Normalisation::None, Normalisation::Dapi];
}

impl fmt::Display for CountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Signal => "SIGNAL",
            Self::Counterstain => "COUNTERSTAIN",
        })
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ByNucleus => "BY_NUCLEUS",
            Self::BySignal => "BY_SIGNAL",
        })
    }
}

impl fmt::Display for Normalisation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "NONE",
            Self::Dapi => "DAPI",
        })
    }
}
