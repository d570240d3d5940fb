use enumflags2::bitflags;

use crate::DirEntryType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stat {
    pub inode: u32,
    pub kind: StatKind,
    /// 所在目录
    pub parent: u32,
    /// Optimal I/O block size
    pub block_size: u64,
    /// Occupying blocks
    pub blocks: u64,
    /// File size
    pub size: u64,
}

#[allow(clippy::upper_case_acronyms)]
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatKind {
    DIR = 0o040000,
    #[default]
    FILE = 0o100000,
}

impl StatKind {
    /// 模式位，`ls -l` 风格输出时使用
    #[inline]
    pub fn mode(self) -> u32 {
        self as u32
    }
}

impl From<DirEntryType> for StatKind {
    #[inline]
    fn from(ty: DirEntryType) -> Self {
        match ty {
            DirEntryType::Directory => Self::DIR,
            DirEntryType::Regular => Self::FILE,
        }
    }
}
