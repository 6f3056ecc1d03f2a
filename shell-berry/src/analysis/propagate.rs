//! 将壳层结果复制到子数据集.
//!
//! 子数据集的细胞是父数据集的子集, 因此只需按细胞核筛选已有的行, 不必重新划分壳层.

use crate::component::Component;
use crate::consts::{RANDOM_SIGNAL_GROUP_NAME, RANDOM_SIGNAL_ID};
use crate::dataset::{AnalysisDataset, CellCollection, SignalGroup};
use crate::result::{CountType, ShellKey, ShellResult};
use uuid::Uuid;

/// 按 `dest` 中存在的细胞核, 从 `src` 复制信号组 `group` 的结果.
///
/// 缺少复染行或信号行的细胞核被跳过. 对随机分布伪信号组, 复制细胞核所有信号的行;
/// 对普通信号组, 只复制该组信号的行.
pub fn copy_shell_result(group: Uuid, src: &ShellResult, dest: &CellCollection) -> ShellResult {
    let mut out = src.empty_like();
    for cell in dest.cells() {
        for nucleus in cell.nuclei() {
            let key = ShellKey::new(cell.id(), nucleus.id(), None);
            let (Some(cs), Some(sig)) = (
                src.get_keyed(CountType::Counterstain, &key),
                src.get_keyed(CountType::Signal, &key),
            ) else {
                continue;
            };
            out.add_keyed(CountType::Counterstain, key, cs);
            out.add_keyed(CountType::Signal, key, sig);

            let signals: Vec<&Component> = if group == RANDOM_SIGNAL_ID {
                nucleus
                    .signal_groups()
                    .flat_map(|(_, g)| g.signals.iter())
                    .collect()
            } else {
                nucleus
                    .signal_group(group)
                    .map(|g| g.signals.iter().collect())
                    .unwrap_or_default()
            };
            for s in signals {
                let key = ShellKey::new(cell.id(), nucleus.id(), Some(s.id()));
                if let Some(v) = src.get_keyed(CountType::Signal, &key) {
                    out.add_keyed(CountType::Signal, key, v);
                }
            }
        }
    }
    out
}

/// 将结果挂到集合的信号组上. 随机分布伪信号组总是整体替换.
fn attach(collection: &mut CellCollection, group: Uuid, name: &str, result: ShellResult) {
    if group == RANDOM_SIGNAL_ID {
        collection.remove_signal_group(RANDOM_SIGNAL_ID);
        collection.add_signal_group(SignalGroup::random(result));
        return;
    }
    match collection.signal_group_mut(group) {
        Some(g) => {
            g.set_shell_result(result);
        }
        None => {
            let mut g = SignalGroup::new(group, name);
            g.set_shell_result(result);
            collection.add_signal_group(g);
        }
    }
}

/// 递归地将信号组 `group` 的结果 `result` 筛选并复制到所有子数据集.
pub fn propagate_to_children(
    children: &mut [AnalysisDataset],
    group: Uuid,
    name: &str,
    result: &ShellResult,
) {
    for child in children {
        let filtered = copy_shell_result(group, result, &child.collection);
        log::debug!(
            "Copied shell result of `{name}` to `{}`",
            child.collection.name()
        );
        propagate_to_children(&mut child.children, group, name, &filtered);
        attach(&mut child.collection, group, name, filtered);
    }
}

/// 分析完成后才创建的子集合, 从父集合复制所有已有的壳层结果. 返回复制的信号组个数.
pub fn copy_from_parent(parent: &CellCollection, child: &mut CellCollection) -> usize {
    let mut copied = 0;
    for g in parent.signal_groups() {
        let Some(result) = g.shell_result() else {
            continue;
        };
        let filtered = copy_shell_result(g.id(), result, child);
        let name = if g.is_random() {
            RANDOM_SIGNAL_GROUP_NAME
        } else {
            g.name()
        };
        attach(child, g.id(), name, filtered);
        copied += 1;
    }
    copied
}
