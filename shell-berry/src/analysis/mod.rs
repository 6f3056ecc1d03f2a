//! 数据集壳层分析流程.
//!
//! 对每个细胞核独立地构建壳层并计算强度 (可并行), 再按数据集顺序单线程合并到各信号组的结果中,
//! 因此结果与是否启用 `rayon` 无关.

mod progress;
mod propagate;

pub use progress::Progress;
pub use propagate::{copy_from_parent, copy_shell_result, propagate_to_children};

use crate::component::{Cell, NuclearSignalGroup, Nucleus};
use crate::consts::{RANDOM_SIGNAL_GROUP_NAME, RANDOM_SIGNAL_ID};
use crate::dataset::{AnalysisDataset, SignalGroup};
use crate::error::{ConfigError, ImageImportError, ShellError};
use crate::image::ImageCache;
use crate::result::{CountType, ShellKey, ShellResult};
use crate::shell::{RandomDistribution, ShellAnalysisConfig, ShellDetector};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

        /// 并行映射, 保持输入顺序.
        fn map_ordered<T, R, F>(items: &[T], f: F) -> Vec<R>
        where
            T: Sync,
            R: Send,
            F: Fn(&T) -> R + Sync + Send,
        {
            items.par_iter().map(f).collect()
        }
    } else {
        /// 顺序映射.
        fn map_ordered<T, R, F>(items: &[T], f: F) -> Vec<R>
        where
            F: Fn(&T) -> R,
        {
            items.iter().map(f).collect()
        }
    }
}

/// 一次分析的统计.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShellAnalysisSummary {
    /// 细胞核总数.
    pub nuclei: usize,
    /// 成功划分壳层的细胞核个数.
    pub analysed: usize,
    /// 因面积或圆度不足被跳过的细胞核个数.
    pub skipped: usize,
    /// 图像读取失败次数 (细胞核自身图像或信号组图像).
    pub image_failures: usize,
    /// 附加了结果的信号组个数 (不含随机分布).
    pub signal_groups: usize,
    /// 是否生成了随机分布伪信号组.
    pub random_attached: bool,
}

/// 待合并的一行数据.
#[derive(Debug)]
struct Row {
    group: Uuid,
    count_type: CountType,
    key: ShellKey,
    counts: Vec<u64>,
}

impl Row {
    #[inline]
    fn new(group: Uuid, count_type: CountType, key: ShellKey, counts: Vec<u64>) -> Self {
        Self {
            group,
            count_type,
            key,
            counts,
        }
    }
}

/// 单个细胞核的处理结果.
#[derive(Debug)]
enum Outcome {
    /// 几何不满足要求.
    Skipped,
    /// 细胞核自身图像读取失败.
    ImageFailed,
    /// 已分析. `image_failures` 为读取失败而跳过的信号组个数.
    Analysed {
        rows: Vec<Row>,
        image_failures: usize,
    },
}

/// 壳层分析.
#[derive(Debug)]
pub struct ShellAnalysis {
    config: ShellAnalysisConfig,
    cache: ImageCache,
    progress: Arc<Progress>,
}

impl ShellAnalysis {
    /// 以 `config` 创建分析. 配置不合法时返回错误.
    pub fn new(config: ShellAnalysisConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            cache: ImageCache::new(),
            progress: Arc::new(Progress::default()),
        })
    }

    /// 配置.
    #[inline]
    pub fn config(&self) -> &ShellAnalysisConfig {
        &self.config
    }

    /// 本次分析使用的图像缓存. 可以预先放入内存中的图像.
    #[inline]
    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// 进度句柄.
    #[inline]
    pub fn progress(&self) -> Arc<Progress> {
        Arc::clone(&self.progress)
    }

    /// 分析 `dataset` 的所有细胞核, 将结果附加到各信号组, 并复制到所有子数据集.
    ///
    /// 至少一个信号组存在信号时, 随机分布伪信号组被重新生成 (替换旧的随机分布结果).
    pub fn run(&self, dataset: &mut AnalysisDataset) -> ShellAnalysisSummary {
        let ShellAnalysisConfig {
            shell_count,
            shrink_type,
            ..
        } = self.config;
        let collection = &dataset.collection;
        let group_ids: Vec<Uuid> = collection
            .signal_group_ids()
            .into_iter()
            .filter(|&id| id != RANDOM_SIGNAL_ID)
            .collect();
        let jobs: Vec<(&Cell, &Nucleus)> = collection
            .cells()
            .iter()
            .flat_map(|c| c.nuclei().iter().map(move |n| (c, n)))
            .collect();
        log::info!(
            "Shell analysis of `{}`: {} nuclei, {} signal group(s), {shell_count} {shrink_type} shells",
            collection.name(),
            jobs.len(),
            group_ids.len()
        );

        self.progress.start(jobs.len());
        let outcomes = map_ordered(&jobs, |&(cell, nucleus)| {
            let outcome = self.analyse_nucleus(cell, nucleus, &group_ids);
            self.progress.tick();
            outcome
        });

        let mut summary = ShellAnalysisSummary {
            nuclei: jobs.len(),
            ..Default::default()
        };
        let mut results: BTreeMap<Uuid, ShellResult> = group_ids
            .iter()
            .map(|&id| (id, ShellResult::new(shell_count, shrink_type)))
            .collect();
        let mut random = ShellResult::new(shell_count, shrink_type);
        for outcome in outcomes {
            match outcome {
                Outcome::Skipped => summary.skipped += 1,
                Outcome::ImageFailed => summary.image_failures += 1,
                Outcome::Analysed {
                    rows,
                    image_failures,
                } => {
                    summary.analysed += 1;
                    summary.image_failures += image_failures;
                    for row in rows {
                        let target = if row.group == RANDOM_SIGNAL_ID {
                            &mut random
                        } else if let Some(r) = results.get_mut(&row.group) {
                            r
                        } else {
                            continue;
                        };
                        target.add_keyed(row.count_type, row.key, &row.counts);
                    }
                }
            }
        }

        for (id, result) in results {
            if !dataset.collection.has_signals(id) {
                continue;
            }
            let name = dataset
                .collection
                .signal_group(id)
                .map(|g| g.name().to_string())
                .unwrap_or_default();
            propagate_to_children(&mut dataset.children, id, &name, &result);
            if let Some(g) = dataset.collection.signal_group_mut(id) {
                g.set_shell_result(result);
            }
            summary.signal_groups += 1;
        }
        if summary.signal_groups > 0 {
            propagate_to_children(
                &mut dataset.children,
                RANDOM_SIGNAL_ID,
                RANDOM_SIGNAL_GROUP_NAME,
                &random,
            );
            dataset.collection.remove_signal_group(RANDOM_SIGNAL_ID);
            dataset.collection.add_signal_group(SignalGroup::random(random));
            summary.random_attached = true;
        }

        log::info!(
            "Shell analysis of `{}` finished: {} analysed, {} skipped, {} image failure(s)",
            dataset.collection.name(),
            summary.analysed,
            summary.skipped,
            summary.image_failures
        );
        summary
    }

    /// 划分壳层并统计复染强度. 图像读取失败时返回 `ShellError::Image`.
    fn prepare(&self, nucleus: &Nucleus) -> Result<(ShellDetector, Vec<u64>), ShellError> {
        let config = &self.config;
        let detector = ShellDetector::new(nucleus, config.shell_count, config.shrink_type)?;
        let counterstain = detector.find_pixel_intensities(nucleus, &self.cache)?;
        Ok((detector, counterstain))
    }

    fn analyse_nucleus(&self, cell: &Cell, nucleus: &Nucleus, group_ids: &[Uuid]) -> Outcome {
        let config = &self.config;
        let (detector, counterstain) = match self.prepare(nucleus) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Skipping nucleus {} of cell {}: {e}", nucleus.id(), cell.id());
                return match e {
                    ShellError::Image(_) => Outcome::ImageFailed,
                    _ => Outcome::Skipped,
                };
            }
        };
        let random =
            RandomDistribution::new(&detector, config.random_iterations, config.random_seed)
                .into_counts();

        let key = ShellKey::new(cell.id(), nucleus.id(), None);
        let mut rows = vec![
            Row::new(RANDOM_SIGNAL_ID, CountType::Signal, key, random.clone()),
            Row::new(RANDOM_SIGNAL_ID, CountType::Counterstain, key, counterstain.clone()),
        ];
        let mut image_failures = 0;
        for &id in group_ids {
            let Some(group) = nucleus.signal_group(id).filter(|g| g.has_signal()) else {
                continue;
            };
            match signal_rows(&detector, key, id, group, &counterstain, &random, &self.cache) {
                Ok(mut r) => rows.append(&mut r),
                Err(e) => {
                    log::warn!(
                        "Skipping signal group {id} of nucleus {}: {e}",
                        nucleus.id()
                    );
                    image_failures += 1;
                }
            }
        }
        Outcome::Analysed {
            rows,
            image_failures,
        }
    }
}

/// 一个细胞核上一个信号组的所有行. 全部计算成功后才返回, 不会留下半组数据.
fn signal_rows(
    detector: &ShellDetector,
    key: ShellKey,
    id: Uuid,
    group: &NuclearSignalGroup,
    counterstain: &[u64],
    random: &[u64],
    cache: &ImageCache,
) -> Result<Vec<Row>, ImageImportError> {
    let stack = cache.get(&group.source)?;
    let total = detector.find_shell_intensities(&stack, group.channel)?;
    let mut rows = vec![
        Row::new(id, CountType::Counterstain, key, counterstain.to_vec()),
        Row::new(id, CountType::Signal, key, total),
    ];
    for s in &group.signals {
        let signal_key = ShellKey::new(key.cell(), key.component(), Some(s.id()));
        let counts = detector.find_pixel_intensities_in(s, &stack, group.channel)?;
        rows.push(Row::new(id, CountType::Signal, signal_key, counts));
        rows.push(Row::new(
            RANDOM_SIGNAL_ID,
            CountType::Signal,
            signal_key,
            random.to_vec(),
        ));
    }
    Ok(rows)
}
