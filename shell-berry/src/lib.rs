#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供细胞核 "同心壳层" 划分, 以及核内信号在各壳层中的强度累积与统计分析.
//!
//! 该 crate 只提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 坐标统一以 `(h, w)` (行, 列) 形式给出. 像素 `(h, w)` 覆盖 `[h, h+1) × [w, w+1)`,
//!   当且仅当其中心 `(h + 0.5, w + 0.5)` 位于多边形内部时, 像素属于该多边形.
//! 2. 在非期望情况下 (例如向累加器写入长度错误的数组), 程序会直接 panic.
//!   几何过小/过于不规则、图像读取失败则以 `Result` 返回.
//!
//! # 模块一览
//!
//! ### 几何基础 ✅
//!
//! 多边形、像素窗口、扫描线栅格化、欧氏距离变换与 8-邻域轮廓追踪.
//!
//! 实现位于 `shell-berry/src/geom`.
//!
//! ### 壳层划分 ✅
//!
//! 等半径 (`RADIUS`) 与等面积 (`AREA`) 两种收缩策略, 壳层检测器与随机分布对照.
//!
//! 实现位于 `shell-berry/src/shell`.
//!
//! ### 结果累积与统计 ✅
//!
//! 按细胞核/按信号聚合, 原始/复染归一化, 标准误, 卡方检验.
//!
//! 实现位于 `shell-berry/src/result`.
//!
//! ### 数据集分析流程 ✅
//!
//! 逐细胞核并行处理, 单线程按序合并, 结果向子数据集传播.
//!
//! 实现位于 `shell-berry/src/analysis`.

pub mod analysis;
pub mod component;
pub mod consts;
pub mod dataset;
pub mod error;
pub mod geom;
pub mod image;
pub mod prelude;
pub mod result;
pub mod shell;

/// 二维像素索引, `(h, w)`.
pub type Idx2d = (usize, usize);

/// 原图坐标系中的二维像素索引, 允许为负 (位于图像之外).
pub type Idx2dI = (i64, i64);

/// 二维连续坐标, `(h, w)`.
pub type Idx2dF = (f64, f64);

pub use error::{ConfigError, ImageImportError, ShellError};
