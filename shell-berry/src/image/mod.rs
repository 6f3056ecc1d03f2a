//! 图像读取, 单次运行内的图像缓存, 以及壳层叠加图的持久化存储.

mod cache;
mod save;
mod stack;

pub use cache::ImageCache;
pub use save::{ImgWriteVis, ShellOverlay};
pub use stack::ImageStack;
