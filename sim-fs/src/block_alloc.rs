//! # 块分配层
//!
//! 持有数据块位图以及每个块的字节内容。
//! 块要么空闲（内容已清空），要么被恰好一个 inode 占用；
//! 占用关系由引擎记录在 inode 中，此处只管位图与数据。

use alloc::vec;
use alloc::vec::Vec;

use vfs::{Error, Result};

use crate::layout::Bitmap;

#[derive(Debug, Clone)]
pub struct BlockAllocator {
    bitmap: Bitmap,
    /// 各块内容，长度不超过 `block_size`
    data: Vec<Vec<u8>>,
    block_size: usize,
}

impl BlockAllocator {
    pub fn new(block_size: usize, total_blocks: u32) -> Self {
        assert!(block_size > 0, "block size must be positive");

        Self {
            bitmap: Bitmap::new(total_blocks as usize),
            data: vec![Vec::new(); total_blocks as usize],
            block_size,
        }
    }

    /// 分配编号最小的空闲块
    pub fn allocate(&mut self) -> Result<u32> {
        let block_id = self.bitmap.alloc().ok_or(Error::DiskFull)? as u32;
        log::trace!("alloc block {block_id}");
        Ok(block_id)
    }

    /// 回收块并清空其内容。
    /// 越界或重复回收说明引擎的记账已经出错，直接 panic。
    pub fn release(&mut self, block_id: u32) {
        self.bitmap.dealloc(block_id as usize);
        let data = &mut self.data[block_id as usize];
        data.clear();
        data.shrink_to_fit();
        log::trace!("release block {block_id}");
    }

    #[inline]
    pub fn read(&self, block_id: u32) -> &[u8] {
        debug_assert!(self.is_used(block_id));
        &self.data[block_id as usize]
    }

    /// 覆盖写整个块
    pub fn write(&mut self, block_id: u32, bytes: &[u8]) {
        assert!(self.is_used(block_id), "write to free block {block_id}");
        assert!(bytes.len() <= self.block_size);

        let data = &mut self.data[block_id as usize];
        data.clear();
        data.extend_from_slice(bytes);
    }

    /// 追加到块尾，调用方保证不超过剩余空间
    pub fn append(&mut self, block_id: u32, bytes: &[u8]) {
        assert!(self.is_used(block_id), "append to free block {block_id}");
        assert!(bytes.len() <= self.room(block_id));

        self.data[block_id as usize].extend_from_slice(bytes);
    }

    /// 块内剩余空间
    #[inline]
    pub fn room(&self, block_id: u32) -> usize {
        self.block_size - self.data[block_id as usize].len()
    }

    #[inline]
    pub fn is_used(&self, block_id: u32) -> bool {
        self.bitmap.is_set(block_id as usize)
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.bitmap.capacity()
    }

    #[inline]
    pub fn used_count(&self) -> usize {
        self.bitmap.count_set()
    }

    #[inline]
    pub fn free_count(&self) -> usize {
        self.capacity() - self.used_count()
    }
}
