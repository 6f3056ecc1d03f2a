//! 单次分析内按源文件共享的图像缓存.

use super::ImageStack;
use crate::error::ImageImportError;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

type Slot = Arc<OnceCell<Arc<ImageStack>>>;

/// 按路径缓存已解码的图像. 多个线程同时请求同一个文件时只解码一次.
///
/// 解码失败不会被缓存, 下一次请求会重新尝试.
#[derive(Debug, Default)]
pub struct ImageCache {
    slots: Mutex<HashMap<PathBuf, Slot>>,
}

impl ImageCache {
    /// 创建空缓存.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取 `path` 对应的图像, 必要时从文件读取.
    pub fn get<P: AsRef<Path>>(&self, path: P) -> Result<Arc<ImageStack>, ImageImportError> {
        let path = path.as_ref();
        // 只在取槽位时持有锁, 解码在锁外进行.
        let slot = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(path.to_path_buf())
            .or_default()
            .clone();
        slot.get_or_try_init(|| ImageStack::open(path).map(Arc::new))
            .cloned()
    }

    /// 预先放入一张图像 (例如内存中合成的图像), 以其 `path()` 为键. 已存在的同键图像会被替换.
    pub fn insert(&self, stack: ImageStack) -> Arc<ImageStack> {
        let stack = Arc::new(stack);
        let slot = OnceCell::with_value(Arc::clone(&stack));
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(stack.path().to_path_buf(), Arc::new(slot));
        stack
    }

    /// 已成功解码的图像个数.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|s| s.get().is_some())
            .count()
    }

    /// 缓存是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 清空缓存.
    pub fn clear(&self) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_insert_and_get_shares() {
        let cache = ImageCache::new();
        let a = cache.insert(ImageStack::from_channels("mem/a", vec![Array2::zeros((2, 2))]));
        let b = cache.get("mem/a").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_decode_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g.png");
        image::GrayImage::new(3, 3).save(&path).unwrap();

        let cache = ImageCache::new();
        let a = cache.get(&path).unwrap();
        let b = cache.get(&path).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.channel_count(), 1);
    }

    #[test]
    fn test_failure_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.png");
        let cache = ImageCache::new();
        assert!(cache.get(&path).is_err());
        assert!(cache.is_empty());

        image::GrayImage::new(1, 1).save(&path).unwrap();
        assert!(cache.get(&path).is_ok());
    }
}
