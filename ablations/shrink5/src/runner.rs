//! 程序运行函数.

use crate::profile::Profile;
use crate::result::AblationResult;
use shell_berry::prelude::*;
use std::thread;
use utils::loader;
use utils::phantom::{self, Phantom, PhantomSet};

/// 每种形态生成的细胞核个数.
const NUCLEI_PER_PHANTOM: usize = 16;

/// 实际运行.
pub fn run() -> AblationResult {
    // 短路判断
    if let Err(e) = loader::config_from_env() {
        panic!("Loading shell config error: {e}");
    }

    println!("Running ablation studies on {} core(s)...", utils::cpus());
    thread::scope(|s| {
        let jobs: Vec<(Phantom, ShrinkType)> = Phantom::ALL
            .into_iter()
            .flat_map(|k| [ShrinkType::Radius, ShrinkType::Area].map(|t| (k, t)))
            .collect();
        let handles: Vec<_> = jobs
            .iter()
            .map(|&(k, t)| s.spawn(move || study(k, t)))
            .collect();

        AblationResult::from_iter(
            jobs.iter().map(|(k, t)| format!("{k}/{t}")).zip(
                handles
                    .into_iter()
                    .map(|th| th.join().expect("Thread joining error")),
            ),
        )
    })
}

/// 在 `kind` 形态的合成数据上运行 `shrink_type` 策略.
fn study(kind: Phantom, shrink_type: ShrinkType) -> Profile {
    let mut profile = Profile::new();
    let config = match loader::config_from_env_with(shrink_type) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{kind}/{shrink_type}: {e}");
            return profile.finish();
        }
    };
    let PhantomSet {
        mut dataset,
        images,
        group,
    } = phantom::phantom_set(kind, NUCLEI_PER_PHANTOM);

    for nucleus in dataset.collection.cells().iter().flat_map(Cell::nuclei) {
        profile.build_start();
        match ShellDetector::new(nucleus, config.shell_count, shrink_type) {
            Ok(d) => profile.build_elapsed(&d.find_pixel_counts()),
            Err(e) => {
                log::debug!("{kind}/{shrink_type}: {e}");
                profile.count_skipped();
            }
        }
    }

    let analysis = match ShellAnalysis::new(config) {
        Ok(a) => a,
        Err(e) => {
            log::error!("{kind}/{shrink_type}: {e}");
            return profile.finish();
        }
    };
    for image in images {
        analysis.cache().insert(image);
    }
    profile.analysis_start();
    let summary = analysis.run(&mut dataset);
    profile.analysis_elapsed();
    log::info!("{kind}/{shrink_type}: {summary:?}");

    let col = &dataset.collection;
    let signal = col.signal_group(group).and_then(SignalGroup::shell_result);
    let random = col
        .signal_group(RANDOM_SIGNAL_ID)
        .and_then(SignalGroup::shell_result);
    if let (Some(signal), Some(random)) = (signal, random) {
        let (agg, norm) = (Aggregation::BySignal, Normalisation::Dapi);
        profile.record(
            signal.overall_shell(agg, norm),
            random.overall_shell(agg, norm),
            signal.p_value(agg, norm, random),
        );
    }
    profile.finish()
}
