//! 壳层分析配置.

use crate::consts::*;
use crate::error::ConfigError;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 壳层个数选项名.
pub const SHELL_COUNT_KEY: &str = "SHELL_COUNT_INT";

/// 收缩策略选项名.
pub const SHRINK_TYPE_KEY: &str = "SHELL_EROSION_METHOD_KEY";

/// 随机分布采样次数选项名.
pub const RANDOM_ITERATIONS_KEY: &str = "SHELL_RANDOM_ITERATIONS";

/// 随机分布种子选项名.
pub const RANDOM_SEED_KEY: &str = "SHELL_RANDOM_SEED";

/// 壳层收缩策略.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ShrinkType {
    /// 各壳层面积相等.
    #[default]
    Area,
    /// 各壳层宽度 (半径方向) 相等.
    Radius,
}

impl fmt::Display for ShrinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Area => "AREA",
            Self::Radius => "RADIUS",
        })
    }
}

impl FromStr for ShrinkType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AREA" => Ok(Self::Area),
            "RADIUS" => Ok(Self::Radius),
            _ => Err(ConfigError::UnknownShrinkType(s.to_string())),
        }
    }
}

/// 壳层分析配置. 按值传递给分析流程与各核心组件.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShellAnalysisConfig {
    /// 壳层个数.
    pub shell_count: usize,
    /// 收缩策略.
    pub shrink_type: ShrinkType,
    /// 每个细胞核的随机分布采样次数.
    pub random_iterations: usize,
    /// 随机分布种子. 每个细胞核使用同一个种子独立初始化生成器.
    pub random_seed: u64,
}

impl Default for ShellAnalysisConfig {
    fn default() -> Self {
        Self {
            shell_count: DEFAULT_SHELL_COUNT,
            shrink_type: ShrinkType::default(),
            random_iterations: DEFAULT_RANDOM_ITERATIONS,
            random_seed: DEFAULT_RANDOM_SEED,
        }
    }
}

impl ShellAnalysisConfig {
    /// 以给定壳层个数与收缩策略创建配置, 其余取默认值.
    #[inline]
    pub fn new(shell_count: usize, shrink_type: ShrinkType) -> Self {
        Self {
            shell_count,
            shrink_type,
            ..Self::default()
        }
    }

    /// 检查配置是否合法.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_SHELL_COUNT).contains(&self.shell_count) {
            return Err(ConfigError::ShellCount(self.shell_count, MAX_SHELL_COUNT));
        }
        if self.random_iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        Ok(())
    }

    /// 从具名选项读取配置. 缺失的选项取默认值, 结果经过 [`Self::validate`] 检查.
    ///
    /// 选项名见 [`SHELL_COUNT_KEY`], [`SHRINK_TYPE_KEY`], [`RANDOM_ITERATIONS_KEY`], [`RANDOM_SEED_KEY`].
    pub fn from_lookup<F>(mut lookup: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        fn parse<T: FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
            value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            })
        }

        let mut config = Self::default();
        if let Some(v) = lookup(SHELL_COUNT_KEY) {
            config.shell_count = parse(SHELL_COUNT_KEY, v)?;
        }
        if let Some(v) = lookup(SHRINK_TYPE_KEY) {
            config.shrink_type = v.parse()?;
        }
        if let Some(v) = lookup(RANDOM_ITERATIONS_KEY) {
            config.random_iterations = parse(RANDOM_ITERATIONS_KEY, v)?;
        }
        if let Some(v) = lookup(RANDOM_SEED_KEY) {
            config.random_seed = parse(RANDOM_SEED_KEY, v)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// 从选项表读取配置. 参见 [`Self::from_lookup`].
    #[inline]
    pub fn from_options(options: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|k| options.get(k).cloned())
    }
}
