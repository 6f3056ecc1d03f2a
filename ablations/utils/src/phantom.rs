//! 合成细胞核图像. 用于在没有真实数据时比较两种收缩策略.

use ndarray::Array2;
use shell_berry::prelude::*;
use std::fmt;
use uuid::Uuid;

/// 每个细胞核占据的正方形区域边长.
const TILE: usize = 128;

/// 复染强度.
const COUNTERSTAIN: u8 = 60;

/// 信号斑点半径.
const SPOT_RADIUS: f64 = 6.0;

/// 合成细胞核的形态.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phantom {
    /// 圆形细胞核, 信号位于中心.
    Disc,
    /// 椭圆细胞核, 信号位于中心.
    Ellipse,
    /// 圆形细胞核, 信号贴近边缘.
    Peripheral,
}

impl Phantom {
    /// 全部形态.
    pub const ALL: [Phantom; 3] = [Phantom::Disc, Phantom::Ellipse, Phantom::Peripheral];

    /// 第 `i` 个细胞核的 `(h, w)` 半径. 同一形态内半径略有变化.
    fn radii(&self, i: usize) -> (f64, f64) {
        let jitter = (i % 5) as f64 * 2.0;
        match self {
            Phantom::Disc | Phantom::Peripheral => (40.0 + jitter, 40.0 + jitter),
            Phantom::Ellipse => (28.0 + jitter, 52.0 + jitter),
        }
    }

    /// 信号中心相对细胞核中心的偏移.
    fn spot_offset(&self, (rh, _): (f64, f64)) -> (f64, f64) {
        match self {
            Phantom::Disc | Phantom::Ellipse => (0.0, 0.0),
            Phantom::Peripheral => (rh - 2.0 * SPOT_RADIUS, 0.0),
        }
    }
}

impl fmt::Display for Phantom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phantom::Disc => "disc",
            Phantom::Ellipse => "ellipse",
            Phantom::Peripheral => "peripheral",
        };
        f.write_str(s)
    }
}

/// 一组合成数据.
#[derive(Debug)]
pub struct PhantomSet {
    /// 数据集. 每个细胞只有一个细胞核, 每个细胞核在 `group` 中有一个信号.
    pub dataset: AnalysisDataset,
    /// 对应的内存图像. 分析前需要放入 `ImageCache`.
    pub images: Vec<ImageStack>,
    /// 信号组 id.
    pub group: Uuid,
}

/// 生成 `count` 个 `kind` 形态的细胞核, 横向排成一行.
///
/// # 注意
///
/// 如果 `count` 为 0, 则程序 panic.
pub fn phantom_set(kind: Phantom, count: usize) -> PhantomSet {
    assert!(count > 0, "至少需要一个细胞核");
    let shape = (TILE, TILE * count);
    let nuclei_path = format!("phantom/{kind}/nuclei");
    let signal_path = format!("phantom/{kind}/signal");
    let group = Uuid::new_v4();

    let mut outlines = Vec::with_capacity(count);
    let mut spots = Vec::with_capacity(count);
    for i in 0..count {
        let center = (TILE as f64 / 2.0, (i * TILE + TILE / 2) as f64);
        let radii = kind.radii(i);
        let (dh, dw) = kind.spot_offset(radii);
        outlines.push(Polygon::ellipse(center, radii, 180));
        spots.push((center.0 + dh, center.1 + dw));
    }

    let blue = Array2::from_shape_fn(shape, |(h, w)| {
        let p = (h as f64 + 0.5, w as f64 + 0.5);
        if outlines.iter().any(|o| o.contains(p)) {
            COUNTERSTAIN
        } else {
            0
        }
    });
    let red = Array2::from_shape_fn(shape, |(h, w)| {
        let (ph, pw) = (h as f64 + 0.5, w as f64 + 0.5);
        let d = spots
            .iter()
            .map(|&(sh, sw)| (ph - sh).hypot(pw - sw))
            .fold(f64::INFINITY, f64::min);
        (250.0 * (-(d * d) / (2.0 * SPOT_RADIUS * SPOT_RADIUS)).exp()) as u8
    });
    let images = vec![
        ImageStack::from_channels(
            &nuclei_path,
            vec![Array2::zeros(shape), Array2::zeros(shape), blue],
        ),
        ImageStack::from_channels(&signal_path, vec![red]),
    ];

    let cells = outlines
        .into_iter()
        .zip(spots)
        .map(|(outline, spot)| {
            let mut nucleus = Nucleus::new(Component::new(outline, &nuclei_path, channel::BLUE));
            let mut g = NuclearSignalGroup::new(&signal_path, channel::RED);
            g.signals.push(Component::new(
                Polygon::circle(spot, SPOT_RADIUS, 36),
                &signal_path,
                channel::RED,
            ));
            nucleus.set_signal_group(group, g);
            Cell::new(vec![nucleus])
        })
        .collect();
    let mut collection = CellCollection::new(format!("phantom-{kind}"), cells);
    collection.add_signal_group(SignalGroup::new(group, "red"));

    PhantomSet {
        dataset: AnalysisDataset::new(collection),
        images,
        group,
    }
}
