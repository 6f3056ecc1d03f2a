//! 壳层结果的行键: 细胞, 细胞核 (或其他组分) 与可选的单个信号.

use std::fmt;
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 累积行的标识: (细胞, 组件, 可选信号).
///
/// 不带信号的键描述整个细胞核; 带信号的键描述细胞核中的单个信号.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShellKey {
    cell: Uuid,
    component: Uuid,
    signal: Option<Uuid>,
}

impl ShellKey {
    /// 创建键.
    #[inline]
    pub fn new(cell: Uuid, component: Uuid, signal: Option<Uuid>) -> Self {
        Self {
            cell,
            component,
            signal,
        }
    }

    /// 细胞标识.
    #[inline]
    pub fn cell(&self) -> Uuid {
        self.cell
    }

    /// 组件 (细胞核) 标识.
    #[inline]
    pub fn component(&self) -> Uuid {
        self.component
    }

    /// 信号标识.
    #[inline]
    pub fn signal(&self) -> Option<Uuid> {
        self.signal
    }

    /// 是否带信号.
    #[inline]
    pub fn has_signal(&self) -> bool {
        self.signal.is_some()
    }

    /// 去掉信号后的细胞核层面的键.
    #[inline]
    pub fn component_key(&self) -> Self {
        Self {
            signal: None,
            ..*self
        }
    }
}

impl fmt::Display for ShellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.cell, self.component)?;
        if let Some(s) = self.signal {
            write!(f, "_{s}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_key() {
        let (c, n, s) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let k = ShellKey::new(c, n, Some(s));
        assert!(k.has_signal());
        assert_eq!(k.component_key(), ShellKey::new(c, n, None));
        assert_ne!(k, k.component_key());
        assert!(!k.component_key().has_signal());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_bincode_round_trip() {
        let (c, n, s) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        for k in [ShellKey::new(c, n, Some(s)), ShellKey::new(c, n, None)] {
            let bytes = bincode::serialize(&k).unwrap();
            let back: ShellKey = bincode::deserialize(&bytes).unwrap();
            assert_eq!(back, k);
        }
    }
}
