//! 同心壳层: 收缩策略, 壳层构建, 壳层检测器与随机分布对照.

mod builder;
mod config;
mod detector;
mod policy;
mod random;

pub use builder::{build_shells, Shell, ShellMap, NO_SHELL};
pub use config::{
    ShellAnalysisConfig, ShrinkType, RANDOM_ITERATIONS_KEY, RANDOM_SEED_KEY, SHELL_COUNT_KEY,
    SHRINK_TYPE_KEY,
};
pub use detector::ShellDetector;
pub use policy::{AreaShrink, RadiusShrink, ShellPlan, ShrinkPolicy};
pub use random::RandomDistribution;
