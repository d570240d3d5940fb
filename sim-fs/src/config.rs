//! 构造时固定的容量参数

use crate::{BLOCK_SIZE, INODE_COUNT, TOTAL_BLOCKS};

/// 目录内容的存放方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirLayout {
    /// 目录项保存在目录 inode 内的有序表中，不占用数据块
    #[default]
    Table,
    /// 目录项编码为 `name:inode_id` 文本行，存放在目录自己的数据块里
    Blocks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsConfig {
    /// 每块字节数
    pub block_size: usize,
    /// 磁盘总块数
    pub total_blocks: u32,
    /// inode 个数上限
    pub inode_count: u32,
    pub dir_layout: DirLayout,
}

impl FsConfig {
    #[inline]
    pub const fn new(block_size: usize, total_blocks: u32, inode_count: u32) -> Self {
        Self {
            block_size,
            total_blocks,
            inode_count,
            dir_layout: DirLayout::Table,
        }
    }

    #[inline]
    pub const fn with_dir_layout(mut self, dir_layout: DirLayout) -> Self {
        self.dir_layout = dir_layout;
        self
    }

    /// 整个虚拟磁盘的字节容量，溢出时取 `usize::MAX`
    #[inline]
    pub fn disk_bytes(&self) -> usize {
        self.block_size.saturating_mul(self.total_blocks as usize)
    }
}

impl Default for FsConfig {
    fn default() -> Self {
        Self::new(BLOCK_SIZE, TOTAL_BLOCKS, INODE_COUNT)
    }
}
