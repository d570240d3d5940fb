//! # 目录编解码层
//!
//! 目录的内容就是一串有序的目录项。表布局下目录项直接保存在目录 inode 中；
//! 块布局下目录项编码为 `name:inode_id\n` 文本行，连续存放在目录自己的数据块里，
//! 一行可以跨越块边界，最后一块写满后再申请新块。

use alloc::vec::Vec;

use vfs::{Error, Result};

use crate::BlockAllocator;
use crate::DirLayout;
use crate::layout::{DirEntry, Inode};

#[derive(Debug, Default, Clone, Copy)]
pub struct DirectoryCodec {
    layout: DirLayout,
}

impl DirectoryCodec {
    #[inline]
    pub fn new(layout: DirLayout) -> Self {
        Self { layout }
    }

    /// 按插入顺序列出目录项
    pub fn decode(&self, dir: &Inode, blocks: &BlockAllocator) -> Result<Vec<DirEntry>> {
        if !dir.is_dir() {
            return Err(Error::NotADirectory);
        }

        match self.layout {
            DirLayout::Table => Ok(dir.entries.clone()),
            DirLayout::Blocks => Self::parse(&Self::content(dir, blocks)),
        }
    }

    /// 在目录下通过名字获取 inode ID
    pub fn lookup(&self, dir: &Inode, blocks: &BlockAllocator, name: &str) -> Result<Option<u32>> {
        let found = match self.layout {
            DirLayout::Table if dir.is_dir() => dir
                .entries
                .iter()
                .find(|entry| entry.name() == name)
                .map(DirEntry::inode_id),
            _ => self
                .decode(dir, blocks)?
                .into_iter()
                .find(|entry| entry.name() == name)
                .map(|entry| entry.inode_id()),
        };
        Ok(found)
    }

    pub fn is_empty(&self, dir: &Inode, blocks: &BlockAllocator) -> Result<bool> {
        match self.layout {
            DirLayout::Table if dir.is_dir() => Ok(dir.entries.is_empty()),
            _ => Ok(self.decode(dir, blocks)?.is_empty()),
        }
    }

    /// 追加一个目录项。空间不足时返回 [`Error::DiskFull`]，目录保持原样。
    pub fn append_entry(
        &self,
        dir: &mut Inode,
        blocks: &mut BlockAllocator,
        name: &str,
        inode_id: u32,
    ) -> Result<()> {
        if !dir.is_dir() {
            return Err(Error::NotADirectory);
        }
        let entry = DirEntry::new(name, inode_id);

        if self.layout == DirLayout::Table {
            dir.entries.push(entry);
            return Ok(());
        }

        let mut line = Vec::with_capacity(entry.encoded_len());
        entry.encode_into(&mut line);

        // 先填满最后一块，剩下的部分按块切分
        let last = dir.blocks.last().copied();
        let room = last.map_or(0, |block_id| blocks.room(block_id)).min(line.len());
        let (head, rest) = line.split_at(room);
        if rest.len().div_ceil(blocks.block_size()) > blocks.free_count() {
            return Err(Error::DiskFull);
        }

        if let Some(block_id) = last.filter(|_| !head.is_empty()) {
            blocks.append(block_id, head);
        }
        for chunk in rest.chunks(blocks.block_size()) {
            let block_id = blocks.allocate()?;
            blocks.write(block_id, chunk);
            dir.blocks.push(block_id);
        }
        dir.size += line.len();

        Ok(())
    }

    /// 删除名字匹配的目录项，返回其 inode ID
    pub fn remove_entry(
        &self,
        dir: &mut Inode,
        blocks: &mut BlockAllocator,
        name: &str,
    ) -> Result<u32> {
        let mut entries = self.decode(dir, blocks)?;
        let index = entries
            .iter()
            .position(|entry| entry.name() == name)
            .ok_or(Error::NotFound)?;
        let removed = entries.remove(index).inode_id();

        match self.layout {
            DirLayout::Table => dir.entries = entries,
            DirLayout::Blocks => Self::store(dir, blocks, &Self::encode(&entries)),
        }

        Ok(removed)
    }

    /// 目录项编码为文本
    pub fn encode(entries: &[DirEntry]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(entries.iter().map(DirEntry::encoded_len).sum());
        for entry in entries {
            entry.encode_into(&mut buf);
        }
        buf
    }

    /// 从文本解析目录项，跳过空行
    pub fn parse(bytes: &[u8]) -> Result<Vec<DirEntry>> {
        bytes
            .split(|&byte| byte == b'\n')
            .filter(|line| !line.is_empty())
            .map(DirEntry::parse)
            .collect()
    }
}

impl DirectoryCodec {
    /// 目录所有块内容的拼接
    fn content(dir: &Inode, blocks: &BlockAllocator) -> Vec<u8> {
        let mut content = Vec::with_capacity(dir.size);
        for &block_id in &dir.blocks {
            content.extend_from_slice(blocks.read(block_id));
        }
        content
    }

    /// 用更短的内容重写目录，多余的块交还
    fn store(dir: &mut Inode, blocks: &mut BlockAllocator, bytes: &[u8]) {
        let needed = bytes.len().div_ceil(blocks.block_size());
        debug_assert!(needed <= dir.blocks.len());

        for block_id in dir.blocks.drain(needed..) {
            blocks.release(block_id);
        }
        for (&block_id, chunk) in dir.blocks.iter().zip(bytes.chunks(blocks.block_size())) {
            blocks.write(block_id, chunk);
        }
        dir.size = bytes.len();
    }
}

#[cfg(test)]
mod tests {
    use alloc::borrow::ToOwned;
    use alloc::vec;

    use super::*;
    use crate::{InodeKind, InodeTable};

    fn setup(layout: DirLayout) -> (DirectoryCodec, InodeTable, BlockAllocator) {
        (
            DirectoryCodec::new(layout),
            InodeTable::new(8),
            BlockAllocator::new(4, 8),
        )
    }

    #[test]
    fn blocks_spill_and_shrink() {
        let (codec, mut inodes, mut blocks) = setup(DirLayout::Blocks);
        let root = inodes.get_mut(0).unwrap();

        // "a:1\n" 恰好一块，"bc:2\n" 跨两块
        codec.append_entry(root, &mut blocks, "a", 1).unwrap();
        assert_eq!(root.blocks(), &[0]);
        codec.append_entry(root, &mut blocks, "bc", 2).unwrap();
        assert_eq!(root.blocks(), &[0, 1, 2]);
        assert_eq!(blocks.read(1), b"bc:2");
        assert_eq!(blocks.read(2), b"\n");

        let names: Vec<_> = codec
            .decode(root, &blocks)
            .unwrap()
            .into_iter()
            .map(|entry| (entry.name().to_owned(), entry.inode_id()))
            .collect();
        assert_eq!(names, vec![("a".to_owned(), 1), ("bc".to_owned(), 2)]);

        assert_eq!(codec.remove_entry(root, &mut blocks, "a"), Ok(1));
        assert_eq!(root.blocks(), &[0, 1]);
        assert_eq!(root.size(), 5);
        assert_eq!(blocks.free_count(), 6);
        assert_eq!(codec.lookup(root, &blocks, "bc"), Ok(Some(2)));
        assert_eq!(codec.lookup(root, &blocks, "a"), Ok(None));
    }

    #[test]
    fn blocks_append_is_all_or_nothing() {
        let mut inodes = InodeTable::new(4);
        let mut blocks = BlockAllocator::new(4, 1);
        let codec = DirectoryCodec::new(DirLayout::Blocks);
        let root = inodes.get_mut(0).unwrap();

        codec.append_entry(root, &mut blocks, "a", 1).unwrap();
        assert_eq!(
            codec.append_entry(root, &mut blocks, "c", 2),
            Err(Error::DiskFull)
        );
        assert_eq!(root.size(), 4);
        assert_eq!(root.blocks(), &[0]);
        assert_eq!(codec.decode(root, &blocks).unwrap().len(), 1);
    }

    #[test]
    fn table_uses_no_blocks() {
        let (codec, mut inodes, mut blocks) = setup(DirLayout::Table);
        let root = inodes.get_mut(0).unwrap();
        codec.append_entry(root, &mut blocks, "a", 1).unwrap();
        codec.append_entry(root, &mut blocks, "b", 2).unwrap();
        assert_eq!(blocks.free_count(), 8);
        assert_eq!(codec.remove_entry(root, &mut blocks, "a"), Ok(1));
        assert_eq!(
            codec.remove_entry(root, &mut blocks, "a"),
            Err(Error::NotFound)
        );
        assert!(!codec.is_empty(root, &blocks).unwrap());
    }

    #[test]
    fn not_a_directory() {
        let (codec, mut inodes, mut blocks) = setup(DirLayout::Blocks);
        let file = inodes.allocate(InodeKind::File, 0).unwrap();
        let file = inodes.get_mut(file).unwrap();
        assert_eq!(codec.decode(file, &blocks), Err(Error::NotADirectory));
        assert_eq!(
            codec.append_entry(file, &mut blocks, "x", 3),
            Err(Error::NotADirectory)
        );
    }

    #[test]
    fn text_form() {
        let entries = [DirEntry::new("a", 1), DirEntry::new("b", 20)];
        let bytes = DirectoryCodec::encode(&entries);
        assert_eq!(bytes, b"a:1\nb:20\n");
        assert_eq!(DirectoryCodec::parse(b"a:1\n\nb:20"), Ok(entries.to_vec()));
        assert_eq!(DirectoryCodec::parse(b"a:1\nbroken"), Err(Error::Corrupted));
    }
}
