//! 细胞, 细胞核与核内信号.
//!
//! 所有组件都以 "局部轮廓 + 原点偏移" 的方式存储: 轮廓坐标相对于组件在源图像中的原点,
//! 需要时通过 [`Component::original_outline`] 转换回源图像坐标.

use crate::geom::Polygon;
use crate::Idx2dF;
use std::collections::BTreeMap;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 一个带轮廓的细胞组件 (细胞核或核内信号).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Component {
    id: Uuid,
    outline: Polygon,
    origin: Idx2dF,
    source: PathBuf,
    channel: usize,
}

impl Component {
    /// 由源图像坐标系下的轮廓创建组件, 随机分配标识.
    ///
    /// 原点取轮廓包围盒左上角 (向下取整), 局部轮廓由此平移得到.
    pub fn new<P: AsRef<Path>>(outline: Polygon, source: P, channel: usize) -> Self {
        Self::with_id(Uuid::new_v4(), outline, source, channel)
    }

    /// 同 [`Component::new`], 但使用给定标识.
    pub fn with_id<P: AsRef<Path>>(id: Uuid, outline: Polygon, source: P, channel: usize) -> Self {
        let origin = outline
            .bounds()
            .map_or((0.0, 0.0), |b| (b.min.0.floor(), b.min.1.floor()));
        Self {
            id,
            outline: outline.translate((-origin.0, -origin.1)),
            origin,
            source: source.as_ref().to_path_buf(),
            channel,
        }
    }

    /// 由局部轮廓与原点直接创建组件.
    pub fn from_local<P: AsRef<Path>>(
        id: Uuid,
        outline: Polygon,
        origin: Idx2dF,
        source: P,
        channel: usize,
    ) -> Self {
        Self {
            id,
            outline,
            origin,
            source: source.as_ref().to_path_buf(),
            channel,
        }
    }

    /// 标识.
    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 局部坐标下的轮廓.
    #[inline]
    pub fn outline(&self) -> &Polygon {
        &self.outline
    }

    /// 原点在源图像中的位置.
    #[inline]
    pub fn origin(&self) -> Idx2dF {
        self.origin
    }

    /// 源图像坐标下的轮廓.
    #[inline]
    pub fn original_outline(&self) -> Polygon {
        self.outline.translate(self.origin)
    }

    /// 源图像路径.
    #[inline]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// 组件所在通道.
    #[inline]
    pub fn channel(&self) -> usize {
        self.channel
    }

    /// 面积.
    #[inline]
    pub fn area(&self) -> f64 {
        self.outline.area()
    }

    /// 圆度.
    #[inline]
    pub fn circularity(&self) -> f64 {
        self.outline.circularity()
    }

    /// 源图像坐标下的点是否位于组件内部.
    #[inline]
    pub fn contains(&self, (h, w): Idx2dF) -> bool {
        self.outline.contains((h - self.origin.0, w - self.origin.1))
    }
}

/// 细胞核上某一个信号组的所有信号.
///
/// 信号组可以来自与细胞核不同的图像文件, 因此单独记录源图像与通道.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NuclearSignalGroup {
    /// 信号组图像路径.
    pub source: PathBuf,
    /// 信号组所在通道.
    pub channel: usize,
    /// 信号.
    pub signals: Vec<Component>,
}

impl NuclearSignalGroup {
    /// 创建空信号组.
    pub fn new<P: AsRef<Path>>(source: P, channel: usize) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            channel,
            signals: Vec::new(),
        }
    }

    /// 是否包含信号.
    #[inline]
    pub fn has_signal(&self) -> bool {
        !self.signals.is_empty()
    }
}

/// 细胞核. 可以当作 [`Component`] 使用.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Nucleus {
    component: Component,
    signal_groups: BTreeMap<Uuid, NuclearSignalGroup>,
}

impl Deref for Nucleus {
    type Target = Component;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.component
    }
}

impl Nucleus {
    /// 由组件创建不含信号的细胞核.
    #[inline]
    pub fn new(component: Component) -> Self {
        Self {
            component,
            signal_groups: BTreeMap::new(),
        }
    }

    /// 作为组件.
    #[inline]
    pub fn component(&self) -> &Component {
        &self.component
    }

    /// 获取信号组.
    #[inline]
    pub fn signal_group(&self, id: Uuid) -> Option<&NuclearSignalGroup> {
        self.signal_groups.get(&id)
    }

    /// 遍历所有信号组.
    #[inline]
    pub fn signal_groups(&self) -> impl Iterator<Item = (Uuid, &NuclearSignalGroup)> {
        self.signal_groups.iter().map(|(k, v)| (*k, v))
    }

    /// 设置信号组, 返回被替换的旧信号组.
    pub fn set_signal_group(
        &mut self,
        id: Uuid,
        group: NuclearSignalGroup,
    ) -> Option<NuclearSignalGroup> {
        self.signal_groups.insert(id, group)
    }

    /// 在信号组 `id` 中是否存在信号.
    #[inline]
    pub fn has_signal(&self, id: Uuid) -> bool {
        self.signal_group(id).is_some_and(NuclearSignalGroup::has_signal)
    }
}

/// 细胞.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cell {
    id: Uuid,
    nuclei: Vec<Nucleus>,
}

impl Cell {
    /// 创建细胞, 随机分配标识.
    #[inline]
    pub fn new(nuclei: Vec<Nucleus>) -> Self {
        Self::with_id(Uuid::new_v4(), nuclei)
    }

    /// 以给定标识创建细胞.
    #[inline]
    pub fn with_id(id: Uuid, nuclei: Vec<Nucleus>) -> Self {
        Self { id, nuclei }
    }

    /// 标识.
    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 细胞核.
    #[inline]
    pub fn nuclei(&self) -> &[Nucleus] {
        &self.nuclei
    }

    /// 可变细胞核.
    #[inline]
    pub fn nuclei_mut(&mut self) -> &mut Vec<Nucleus> {
        &mut self.nuclei
    }
}
