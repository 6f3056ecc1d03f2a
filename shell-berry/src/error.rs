//! 运行时错误.

use std::path::PathBuf;
use thiserror::Error;

/// 壳层划分失败.
///
/// 这类错误只影响单个细胞核, 分析流程会跳过该细胞核并继续.
#[derive(Debug, Error)]
pub enum ShellError {
    /// 细胞核面积不足以划分出给定个数的壳层.
    #[error("nucleus area {area:.1} is below the minimum {minimum:.1} for shell analysis")]
    TooSmall {
        /// 实际面积.
        area: f64,
        /// 最小面积.
        minimum: f64,
    },

    /// 细胞核形状过于不规则.
    #[error("nucleus circularity {circularity:.3} is below the minimum {minimum:.3}")]
    TooIrregular {
        /// 实际圆度.
        circularity: f64,
        /// 最小圆度.
        minimum: f64,
    },

    /// 轮廓点少于 3 个, 或轮廓不包含任何像素.
    #[error("outline does not enclose any pixel")]
    DegenerateOutline,

    /// 读取图像失败.
    #[error(transparent)]
    Image(#[from] ImageImportError),
}

/// 图像导入失败.
#[derive(Debug, Error)]
pub enum ImageImportError {
    /// 无法打开或解码图像文件.
    #[error("cannot open image `{}`", path.display())]
    Open {
        /// 图像路径.
        path: PathBuf,
        /// 底层错误.
        #[source]
        source: image::ImageError,
    },

    /// 图像不包含请求的通道.
    #[error("image `{}` has {channels} channel(s), channel {channel} requested", path.display())]
    MissingChannel {
        /// 图像路径.
        path: PathBuf,
        /// 请求的通道.
        channel: usize,
        /// 图像实际通道数.
        channels: usize,
    },
}

/// 配置项非法.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// 壳层个数超出 `1..=MAX_SHELL_COUNT`.
    #[error("shell count {0} is out of range 1..={1}")]
    ShellCount(usize, usize),

    /// 随机分布采样次数为 0.
    #[error("random distribution needs at least one iteration")]
    ZeroIterations,

    /// 无法识别的收缩策略名称.
    #[error("unknown shrink type `{0}`, expected AREA or RADIUS")]
    UnknownShrinkType(String),

    /// 选项值无法解析.
    #[error("option `{key}` has an invalid value `{value}`")]
    InvalidValue {
        /// 选项名.
        key: String,
        /// 原始值.
        value: String,
    },
}
