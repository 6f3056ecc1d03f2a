//! 从环境变量读取实验配置与输出目录.

use shell_berry::error::ConfigError;
use shell_berry::shell::{ShellAnalysisConfig, ShrinkType};
use std::env;
use std::path::PathBuf;

/// 从环境变量读取壳层分析配置.
///
/// 变量名与 `ShellAnalysisConfig::from_lookup` 的选项名相同, 例如 `$SHELL_COUNT_INT`.
/// 未设置的变量取默认值.
pub fn config_from_env() -> Result<ShellAnalysisConfig, ConfigError> {
    ShellAnalysisConfig::from_lookup(|key| env::var(key).ok())
}

/// 与 [`config_from_env`] 相同, 但收缩策略固定为 `shrink_type`.
pub fn config_from_env_with(shrink_type: ShrinkType) -> Result<ShellAnalysisConfig, ConfigError> {
    Ok(ShellAnalysisConfig {
        shrink_type,
        ..config_from_env()?
    })
}

/// 获取实验输出目录.
///
/// 1. 若环境变量 `$SHELL_ABLATION_OUT_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/shells`.
///
/// 两者都不可用时返回 `None`.
pub fn out_dir_from_env_or_home() -> Option<PathBuf> {
    match env::var("SHELL_ABLATION_OUT_DIR") {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => {
            let mut ans = dirs::home_dir()?;
            ans.extend(["dataset", "shells"]);
            Some(ans)
        }
    }
}
