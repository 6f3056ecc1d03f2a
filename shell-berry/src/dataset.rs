//! 细胞集合, 信号组, 以及父子数据集.

use crate::component::Cell;
use crate::consts::{RANDOM_SIGNAL_GROUP_NAME, RANDOM_SIGNAL_ID};
use crate::result::ShellResult;
use std::collections::BTreeMap;
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 数据集层面的信号组元数据, 可附带壳层分析结果.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SignalGroup {
    id: Uuid,
    name: String,
    shell_result: Option<ShellResult>,
}

impl SignalGroup {
    /// 创建不带结果的信号组.
    pub fn new<S: Into<String>>(id: Uuid, name: S) -> Self {
        Self {
            id,
            name: name.into(),
            shell_result: None,
        }
    }

    /// 以给定结果创建随机分布伪信号组.
    pub fn random(result: ShellResult) -> Self {
        Self {
            id: RANDOM_SIGNAL_ID,
            name: RANDOM_SIGNAL_GROUP_NAME.to_string(),
            shell_result: Some(result),
        }
    }

    /// 标识.
    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 名称.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 是否是随机分布伪信号组.
    #[inline]
    pub fn is_random(&self) -> bool {
        self.id == RANDOM_SIGNAL_ID
    }

    /// 壳层分析结果.
    #[inline]
    pub fn shell_result(&self) -> Option<&ShellResult> {
        self.shell_result.as_ref()
    }

    /// 设置壳层分析结果, 返回旧结果.
    #[inline]
    pub fn set_shell_result(&mut self, result: ShellResult) -> Option<ShellResult> {
        self.shell_result.replace(result)
    }

    /// 移除壳层分析结果.
    #[inline]
    pub fn take_shell_result(&mut self) -> Option<ShellResult> {
        self.shell_result.take()
    }
}

/// 细胞集合.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellCollection {
    name: String,
    cells: Vec<Cell>,
    signal_groups: BTreeMap<Uuid, SignalGroup>,
}

impl CellCollection {
    /// 创建集合.
    pub fn new<S: Into<String>>(name: S, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
            signal_groups: BTreeMap::new(),
        }
    }

    /// 名称.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 所有细胞.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// 按标识查找细胞.
    pub fn cell(&self, id: Uuid) -> Option<&Cell> {
        self.cells.iter().find(|c| c.id() == id)
    }

    /// 是否包含标识为 `id` 的细胞.
    #[inline]
    pub fn contains_cell(&self, id: Uuid) -> bool {
        self.cell(id).is_some()
    }

    /// 细胞核总数.
    pub fn nucleus_count(&self) -> usize {
        self.cells.iter().map(|c| c.nuclei().len()).sum()
    }

    /// 添加或替换信号组.
    pub fn add_signal_group(&mut self, group: SignalGroup) -> Option<SignalGroup> {
        self.signal_groups.insert(group.id(), group)
    }

    /// 移除信号组.
    #[inline]
    pub fn remove_signal_group(&mut self, id: Uuid) -> Option<SignalGroup> {
        self.signal_groups.remove(&id)
    }

    /// 获取信号组.
    #[inline]
    pub fn signal_group(&self, id: Uuid) -> Option<&SignalGroup> {
        self.signal_groups.get(&id)
    }

    /// 获取可变信号组.
    #[inline]
    pub fn signal_group_mut(&mut self, id: Uuid) -> Option<&mut SignalGroup> {
        self.signal_groups.get_mut(&id)
    }

    /// 按标识顺序遍历所有信号组.
    #[inline]
    pub fn signal_groups(&self) -> impl Iterator<Item = &SignalGroup> {
        self.signal_groups.values()
    }

    /// 所有信号组标识.
    pub fn signal_group_ids(&self) -> Vec<Uuid> {
        self.signal_groups.keys().copied().collect()
    }

    /// 是否有任何细胞核在信号组 `id` 中存在信号.
    pub fn has_signals(&self, id: Uuid) -> bool {
        self.cells
            .iter()
            .flat_map(|c| c.nuclei())
            .any(|n| n.has_signal(id))
    }
}

/// 分析数据集. 子数据集 (例如按聚类划分出的子集) 的细胞是父数据集细胞的子集.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalysisDataset {
    /// 该数据集的细胞.
    pub collection: CellCollection,
    /// 子数据集.
    pub children: Vec<AnalysisDataset>,
}

impl AnalysisDataset {
    /// 由集合创建不含子数据集的数据集.
    #[inline]
    pub fn new(collection: CellCollection) -> Self {
        Self {
            collection,
            children: Vec::new(),
        }
    }

    /// 添加子数据集, 返回其引用.
    pub fn add_child(&mut self, child: AnalysisDataset) -> &mut AnalysisDataset {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// 以给定细胞筛选条件派生一个子数据集. 信号组元数据被复制, 但不带结果.
    pub fn derive_child<S, F>(&self, name: S, mut keep: F) -> AnalysisDataset
    where
        S: Into<String>,
        F: FnMut(&Cell) -> bool,
    {
        let cells = self
            .collection
            .cells()
            .iter()
            .filter(|c| keep(c))
            .cloned()
            .collect();
        let mut collection = CellCollection::new(name, cells);
        for g in self.collection.signal_groups().filter(|g| !g.is_random()) {
            collection.add_signal_group(SignalGroup::new(g.id(), g.name()));
        }
        AnalysisDataset::new(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, NuclearSignalGroup, Nucleus};
    use crate::geom::Polygon;

    fn nucleus_with(group: Uuid, signals: usize) -> Nucleus {
        let mut n = Nucleus::new(Component::new(
            Polygon::rectangle((0.0, 0.0), (20.0, 20.0)),
            "n.png",
            2,
        ));
        let mut g = NuclearSignalGroup::new("n.png", 0);
        for _ in 0..signals {
            g.signals
                .push(Component::new(Polygon::rectangle((1.0, 1.0), (3.0, 3.0)), "n.png", 0));
        }
        n.set_signal_group(group, g);
        n
    }

    #[test]
    fn test_has_signals() {
        let g = Uuid::new_v4();
        let empty = CellCollection::new("a", vec![Cell::new(vec![nucleus_with(g, 0)])]);
        assert!(!empty.has_signals(g));
        let full = CellCollection::new(
            "b",
            vec![
                Cell::new(vec![nucleus_with(g, 0)]),
                Cell::new(vec![nucleus_with(g, 2)]),
            ],
        );
        assert!(full.has_signals(g));
        assert!(!full.has_signals(Uuid::new_v4()));
        assert_eq!(full.nucleus_count(), 2);
    }

    #[test]
    fn test_derive_child() {
        let g = Uuid::new_v4();
        let cells = vec![
            Cell::new(vec![nucleus_with(g, 1)]),
            Cell::new(vec![nucleus_with(g, 1)]),
        ];
        let keep = cells[1].id();
        let mut col = CellCollection::new("root", cells);
        col.add_signal_group(SignalGroup::new(g, "red"));
        col.add_signal_group(SignalGroup::random(ShellResult::new(
            3,
            crate::shell::ShrinkType::Area,
        )));
        let ds = AnalysisDataset::new(col);

        let child = ds.derive_child("sub", |c| c.id() == keep);
        assert_eq!(child.collection.cells().len(), 1);
        assert!(child.collection.contains_cell(keep));
        assert_eq!(child.collection.signal_group_ids(), vec![g]);
        assert!(child.collection.signal_group(g).unwrap().shell_result().is_none());
    }
}
