//! 通用常量.

use uuid::Uuid;

/// 默认壳层个数.
pub const DEFAULT_SHELL_COUNT: usize = 5;

/// 允许的最大壳层个数.
///
/// 壳层标签以 `u16` 存储, 且需要为 "无壳层" 预留一个值.
pub const MAX_SHELL_COUNT: usize = 100;

/// 每个壳层所需的最小面积 (像素). 细胞核面积小于 `MINIMUM_AREA_PER_SHELL * N` 时拒绝划分.
pub const MINIMUM_AREA_PER_SHELL: f64 = 50.0;

/// 允许划分壳层的最小圆度.
pub const MINIMUM_CIRCULARITY: f64 = 0.07;

/// 等半径收缩按整像素剥离所需的最小层宽 (像素). 更窄时改用到轮廓的精确距离.
pub const WHOLE_PIXEL_SHELL_WIDTH: f64 = 8.0;

/// 等半径收缩在层宽小于该值 (像素) 时, 以亚像素采样估计每层面积.
pub const FINE_SHELL_WIDTH: f64 = 2.0;

/// 亚像素采样时每个像素每个方向上的采样点数.
pub const FINE_SAMPLES: usize = 4;

/// 随机分布对照的默认采样次数.
pub const DEFAULT_RANDOM_ITERATIONS: usize = 10_000;

/// 随机分布对照的默认种子.
pub const DEFAULT_RANDOM_SEED: u64 = 1234;

/// 随机分布伪信号组的固定标识.
pub const RANDOM_SIGNAL_ID: Uuid = Uuid::from_u128(0xf0000000_0000_4000_8000_000000000000);

/// 随机分布伪信号组的名称.
pub const RANDOM_SIGNAL_GROUP_NAME: &str = "Random distribution";

/// 通道编号.
pub mod channel {
    /// 红色通道.
    pub const RED: usize = 0;

    /// 蓝色通道 (通常为 DAPI 复染).
    pub const BLUE: usize = 2;
}

/// 壳层叠加图像所用颜色.
pub mod color {
    /// 壳层边界颜色, 纯黄色.
    pub const SHELL_BOUNDARY: [u8; 3] = [0xff, 0xff, 0x00];

    /// 细胞核原始轮廓颜色, 纯青色.
    pub const NUCLEUS_OUTLINE: [u8; 3] = [0x00, 0xff, 0xff];
}
