//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx2dF, Idx2dI};

pub use crate::component::{Cell, Component, NuclearSignalGroup, Nucleus};
pub use crate::dataset::{AnalysisDataset, CellCollection, SignalGroup};
pub use crate::geom::{DistanceMap, Frame, Polygon};
pub use crate::image::{ImageCache, ImageStack, ImgWriteVis, ShellOverlay};

pub use crate::consts::channel;
pub use crate::consts::{
    DEFAULT_SHELL_COUNT, MAX_SHELL_COUNT, RANDOM_SIGNAL_GROUP_NAME, RANDOM_SIGNAL_ID,
};

pub use crate::shell::{
    RandomDistribution, ShellAnalysisConfig, ShellDetector, ShellMap, ShrinkType,
};
pub use crate::result::{Aggregation, CountType, Normalisation, ShellKey, ShellResult};
pub use crate::analysis::{ShellAnalysis, ShellAnalysisSummary};

pub use crate::error::{ConfigError, ImageImportError, ShellError};
