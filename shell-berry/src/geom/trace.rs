//! 8-邻域连通区域与外轮廓追踪.

use super::{neighbour8_cw, PosIter};
use crate::Idx2d;
use ndarray::{Array2, ArrayView2};
use std::collections::VecDeque;

type Area2d = Vec<Idx2d>;

/// 按照 8-相邻规则获取 `mask` 中所有前景区域.
///
/// 区域按照其行优先意义下的第一个像素排序, 且每个区域的第一个元素就是该像素.
pub fn components8(mask: ArrayView2<bool>) -> Vec<Area2d> {
    let mut ans = Vec::with_capacity(1);
    let mut visited = Array2::from_elem(mask.dim(), false);
    let mut bfs_q = VecDeque::with_capacity(16);

    for pos in PosIter::new(mask.dim()) {
        if visited[pos] || !mask[pos] {
            continue;
        }
        visited[pos] = true;
        bfs_q.push_back(pos);
        let mut this_area = Area2d::with_capacity(16);
        while let Some(cur) = bfs_q.pop_front() {
            this_area.push(cur);
            for p in neighbour8_cw(cur) {
                if mask.get(p).copied().unwrap_or(false) && !visited[p] {
                    visited[p] = true;
                    bfs_q.push_back(p);
                }
            }
        }
        ans.push(this_area);
    }
    ans
}

/// Moore 邻域追踪: 从前景像素 `start` 出发, 顺时针追踪其所在 8-连通区域的外轮廓.
///
/// `start` 必须是该区域行优先意义下的第一个像素 (其正西方向必为背景).
/// 再次回到 `start` 且下一步与第一步相同时停止, 因此单像素宽的 "颈部" 会被来回经过两次.
///
/// # 返回值
///
/// 轮廓像素序列, 不重复首像素. 孤立像素返回 `[start]`.
pub fn trace_contour(mask: ArrayView2<bool>, start: Idx2d) -> Vec<Idx2d> {
    let fg = |p: Idx2d| mask.get(p).copied().unwrap_or(false);
    assert!(fg(start), "轮廓起点 {start:?} 必须是前景像素");

    // 从 `back` 之后顺时针寻找下一个前景邻居, 同时返回它之前的那个背景邻居.
    let step = |cur: Idx2d, back: Idx2d| -> Option<(Idx2d, Idx2d)> {
        let ring = neighbour8_cw(cur);
        let from = ring.iter().position(|&p| p == back).unwrap_or(0);
        (1..=8)
            .map(|s| (from + s) % 8)
            .find(|&i| fg(ring[i]))
            .map(|i| (ring[i], ring[(i + 7) % 8]))
    };

    let Some(first) = step(start, (start.0, start.1.wrapping_sub(1))) else {
        return vec![start];
    };
    let mut contour = vec![start];
    let (mut cur, mut back) = first;
    let cap = 4 * mask.len() + 8;
    for _ in 0..cap {
        let Some(next) = step(cur, back) else {
            break;
        };
        if cur == start && next.0 == first.0 {
            break;
        }
        contour.push(cur);
        (cur, back) = next;
    }
    contour
}

/// 获取 `mask` 中每个 8-连通前景区域的外轮廓. 顺序与 [`components8`] 一致.
pub fn trace_contours(mask: ArrayView2<bool>) -> Vec<Vec<Idx2d>> {
    components8(mask)
        .into_iter()
        .map(|area| trace_contour(mask, area[0]))
        .collect()
}
