//! # 存储引擎层
//!
//! 组合 inode 表、块分配器与目录编解码器，对外提供创建、列目录、读写、删除以及目录导航。
//! 引擎独占全部状态，多个实例之间互不干扰。所有操作同步完成；
//! 需要多方同时访问时，通过 [`SimFileSystem::new_shared`] 把整个引擎放进一把锁里。

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use spin::Mutex;
use vfs::{DirEntry, DirEntryType, Error, Result, Stat};

use crate::ROOT_INODE;
use crate::layout::{self, Inode, InodeTable};
use crate::{BlockAllocator, DirectoryCodec, FsConfig};

#[derive(Debug, Clone)]
pub struct SimFileSystem {
    config: FsConfig,
    inodes: InodeTable,
    blocks: BlockAllocator,
    codec: DirectoryCodec,
    /// 当前工作目录
    cwd: u32,
}

impl SimFileSystem {
    pub fn new(config: FsConfig) -> Self {
        log::debug!("new filesystem: {config:?}");

        Self {
            config,
            inodes: InodeTable::new(config.inode_count),
            blocks: BlockAllocator::new(config.block_size, config.total_blocks),
            codec: DirectoryCodec::new(config.dir_layout),
            cwd: ROOT_INODE,
        }
    }

    /// 所有调用经由同一把锁串行执行
    pub fn new_shared(config: FsConfig) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self::new(config)))
    }

    #[inline]
    pub fn config(&self) -> &FsConfig {
        &self.config
    }

    #[inline]
    pub fn cwd(&self) -> u32 {
        self.cwd
    }

    /// 在当前目录下创建文件或目录，返回新 inode 的 ID
    pub fn create(&mut self, name: &str, ty: DirEntryType) -> Result<u32> {
        if !layout::DirEntry::is_valid_name(name) {
            return Err(Error::InvalidName);
        }
        let cwd = self.cwd;
        // 确认没有已创建的同名项
        if self.entry(cwd, name)?.is_some() {
            return Err(Error::AlreadyExists);
        }

        let inode_id = self.inodes.allocate(ty.into(), cwd)?;
        let dir = self.inodes.get_mut(cwd)?;
        if let Err(err) = self.codec.append_entry(dir, &mut self.blocks, name, inode_id) {
            // 目录项写不进去，新 inode 作废
            self.inodes.release(inode_id);
            return Err(err);
        }

        log::debug!("create {name:?} ({ty:?}) as inode {inode_id} under {cwd}");
        Ok(inode_id)
    }

    /// 列出当前目录
    #[inline]
    pub fn list(&self) -> Result<Vec<DirEntry>> {
        self.list_dir(self.cwd)
    }

    /// 列出指定目录，不依赖当前工作目录
    pub fn list_dir(&self, dir_id: u32) -> Result<Vec<DirEntry>> {
        let dir = self.inodes.get(dir_id)?;
        self.codec
            .decode(dir, &self.blocks)?
            .into_iter()
            .map(|entry| {
                let ty = self
                    .inodes
                    .get(entry.inode_id())?
                    .kind()
                    .entry_type()
                    .ok_or(Error::Corrupted)?;
                Ok(DirEntry::new(entry.name(), entry.inode_id(), ty))
            })
            .collect()
    }

    /// 以 `data` 替换文件的全部内容。
    ///
    /// 写入要么完整生效，要么什么都不改：空间不够时返回 [`Error::DiskFull`]，
    /// 文件保留原有内容。
    pub fn write(&mut self, inode_id: u32, data: &[u8]) -> Result<()> {
        let block_size = self.blocks.block_size();
        let inode = self.inodes.get_mut(inode_id)?;
        if !inode.is_file() {
            return Err(Error::NotAFile);
        }

        // 旧块回收后可以重用，先算清楚再动手
        let needed = data.len().div_ceil(block_size);
        let available = self.blocks.free_count() + inode.blocks.len();
        if needed > available {
            log::warn!(
                "write {} bytes to inode {inode_id}: need {needed} blocks, {available} available",
                data.len()
            );
            return Err(Error::DiskFull);
        }

        for block_id in inode.blocks.drain(..) {
            self.blocks.release(block_id);
        }
        for chunk in data.chunks(block_size) {
            let block_id = self.blocks.allocate()?;
            self.blocks.write(block_id, chunk);
            inode.blocks.push(block_id);
        }
        inode.size = data.len();

        log::debug!(
            "write {} bytes to inode {inode_id}: blocks {:?}",
            data.len(),
            inode.blocks
        );
        Ok(())
    }

    /// 读出文件的全部内容
    pub fn read(&self, inode_id: u32) -> Result<Vec<u8>> {
        let inode = self.inodes.get(inode_id)?;
        if !inode.is_file() {
            return Err(Error::NotAFile);
        }

        let mut data = Vec::with_capacity(inode.size);
        for &block_id in &inode.blocks {
            data.extend_from_slice(self.blocks.read(block_id));
        }
        debug_assert_eq!(data.len(), inode.size);

        Ok(data)
    }

    /// 删除当前目录下的项，回收其全部数据块与 inode。
    /// 非空目录不可删除。
    pub fn delete(&mut self, name: &str) -> Result<()> {
        let cwd = self.cwd;
        let inode_id = self.entry(cwd, name)?.ok_or(Error::NotFound)?;

        let target = self.inodes.get(inode_id)?;
        if target.is_dir() && !self.codec.is_empty(target, &self.blocks)? {
            return Err(Error::DirectoryNotEmpty);
        }

        let dir = self.inodes.get_mut(cwd)?;
        let removed = self.codec.remove_entry(dir, &mut self.blocks, name)?;
        debug_assert_eq!(removed, inode_id);

        let target = self.inodes.get_mut(inode_id)?;
        for block_id in target.blocks.drain(..) {
            self.blocks.release(block_id);
        }
        self.inodes.release(inode_id);

        log::debug!("delete {name:?} (inode {inode_id}) under {cwd}");
        Ok(())
    }
}

/// 目录导航
impl SimFileSystem {
    /// 在当前目录下根据名字获取 inode ID
    pub fn lookup(&self, name: &str) -> Result<u32> {
        self.entry(self.cwd, name)?.ok_or(Error::NotFound)
    }

    /// 解析路径。以 `/` 开头时从根目录出发，否则从当前目录出发；
    /// 支持 `.` 与 `..`，根目录的 `..` 仍是根目录。
    pub fn find(&self, path: &str) -> Result<u32> {
        let mut inode_id = if path.starts_with('/') {
            ROOT_INODE
        } else {
            self.cwd
        };

        for cmp in path.split('/').filter(|cmp| !cmp.is_empty()) {
            inode_id = match cmp {
                "." => self.dir(inode_id)?.id(),
                ".." => self.dir(inode_id)?.parent().ok_or(Error::Corrupted)?,
                name => self.entry(inode_id, name)?.ok_or(Error::NotFound)?,
            };
        }

        Ok(inode_id)
    }

    pub fn change_dir(&mut self, path: &str) -> Result<()> {
        let inode_id = self.find(path)?;
        self.dir(inode_id)?;
        log::trace!("cwd {} -> {inode_id}", self.cwd);
        self.cwd = inode_id;
        Ok(())
    }

    /// 沿 `parent` 链向上，拼出 inode 的绝对路径
    pub fn path_of(&self, inode_id: u32) -> Result<String> {
        let mut names: Vec<String> = Vec::new();
        let mut current = self.allocated(inode_id)?;

        while current.id() != ROOT_INODE {
            let parent_id = current.parent().ok_or(Error::Corrupted)?;
            let parent = self.inodes.get(parent_id)?;
            let entry = self
                .codec
                .decode(parent, &self.blocks)?
                .into_iter()
                .find(|entry| entry.inode_id() == current.id())
                .ok_or(Error::Corrupted)?;
            names.push(entry.name().into());
            current = parent;
        }

        let mut path = String::new();
        for name in names.iter().rev() {
            path.push('/');
            path.push_str(name);
        }
        if path.is_empty() {
            path.push('/');
        }
        Ok(path)
    }
}

/// 统计与一致性检查
impl SimFileSystem {
    /// 已分配 inode 的只读视图
    pub fn inode(&self, inode_id: u32) -> Result<&Inode> {
        self.allocated(inode_id)
    }

    pub fn stat(&self, inode_id: u32) -> Result<Stat> {
        let inode = self.allocated(inode_id)?;
        let ty = inode.kind().entry_type().ok_or(Error::NotFound)?;

        Ok(Stat {
            inode: inode_id,
            kind: ty.into(),
            parent: inode.parent().ok_or(Error::Corrupted)?,
            block_size: self.blocks.block_size() as u64,
            blocks: inode.blocks().len() as u64,
            size: inode.size() as u64,
        })
    }

    /// 块的原始内容，空闲块返回空
    pub fn block(&self, block_id: u32) -> Option<&[u8]> {
        self.blocks
            .is_used(block_id)
            .then(|| self.blocks.read(block_id))
    }

    #[inline]
    pub fn free_blocks(&self) -> usize {
        self.blocks.free_count()
    }

    #[inline]
    pub fn free_inodes(&self) -> usize {
        self.inodes.free_count()
    }

    /// 校验全局不变式：
    /// - 未分配的 inode 不持有任何东西；
    /// - 每个块至多属于一个 inode，且被持有的块在位图中已占用；
    /// - 空闲块数加上被持有的块数等于总块数；
    /// - 目录项指向已分配的 inode，且其 `parent` 指回该目录；
    /// - 除根外每个已分配的 inode 恰好被父目录列出一次；
    /// - 文件的块数与大小相符。
    pub fn check(&self) -> Result<()> {
        let block_size = self.blocks.block_size();
        let mut owned = vec![false; self.blocks.capacity()];
        let mut listed = vec![0usize; self.inodes.capacity()];
        let mut held = 0;

        for slot in 0..self.inodes.capacity() as u32 {
            let inode = self.inodes.get(slot)?;
            if !inode.is_allocated() {
                if !inode.blocks().is_empty()
                    || inode.size() != 0
                    || inode.parent().is_some()
                    || !inode.entries.is_empty()
                {
                    log::error!("unallocated inode {slot} still holds state");
                    return Err(Error::Corrupted);
                }
                continue;
            }

            for &block_id in inode.blocks() {
                let seen = owned.get_mut(block_id as usize).ok_or(Error::Corrupted)?;
                if *seen || !self.blocks.is_used(block_id) {
                    log::error!("block {block_id} of inode {slot} is shared or free");
                    return Err(Error::Corrupted);
                }
                *seen = true;
                held += 1;
            }

            if inode.is_file() && inode.blocks().len() != inode.size().div_ceil(block_size) {
                log::error!(
                    "file inode {slot} has {} blocks for {} bytes",
                    inode.blocks().len(),
                    inode.size()
                );
                return Err(Error::Corrupted);
            }

            if inode.is_dir() {
                for entry in self.codec.decode(inode, &self.blocks)? {
                    let child = self.inodes.get(entry.inode_id())?;
                    if !child.is_allocated() || child.parent() != Some(slot) {
                        log::error!("entry {:?} of directory {slot} is dangling", entry.name());
                        return Err(Error::Corrupted);
                    }
                    listed[entry.inode_id() as usize] += 1;
                }
            }
        }

        for inode in self.inodes.live() {
            let times = listed[inode.id() as usize];
            if inode.id() != ROOT_INODE && times != 1 {
                log::error!("inode {} is listed {times} times by its parent", inode.id());
                return Err(Error::Corrupted);
            }
        }

        if self.blocks.free_count() + held != self.blocks.capacity() {
            log::error!(
                "{} free + {held} held != {} blocks",
                self.blocks.free_count(),
                self.blocks.capacity()
            );
            return Err(Error::Corrupted);
        }

        Ok(())
    }
}

impl SimFileSystem {
    /// 在目录下通过名字获取目录项的 inode ID
    fn entry(&self, dir_id: u32, name: &str) -> Result<Option<u32>> {
        let dir = self.inodes.get(dir_id)?;
        self.codec.lookup(dir, &self.blocks, name)
    }

    fn dir(&self, inode_id: u32) -> Result<&Inode> {
        let inode = self.inodes.get(inode_id)?;
        if !inode.is_dir() {
            return Err(Error::NotADirectory);
        }
        Ok(inode)
    }

    fn allocated(&self, inode_id: u32) -> Result<&Inode> {
        let inode = self.inodes.get(inode_id)?;
        if !inode.is_allocated() {
            return Err(Error::NotFound);
        }
        Ok(inode)
    }
}

impl Default for SimFileSystem {
    fn default() -> Self {
        Self::new(FsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DirLayout, InodeKind};

    fn tiny(layout: DirLayout) -> SimFileSystem {
        SimFileSystem::new(FsConfig::new(4, 4, 8).with_dir_layout(layout))
    }

    #[test]
    fn check_catches_shared_block() {
        let mut fs = tiny(DirLayout::Table);
        let a = fs.create("a", DirEntryType::Regular).unwrap();
        let b = fs.create("b", DirEntryType::Regular).unwrap();
        fs.write(a, b"abcd").unwrap();
        fs.check().unwrap();

        let shared = fs.inodes.get(a).unwrap().blocks[0];
        let inode_b = fs.inodes.get_mut(b).unwrap();
        inode_b.blocks.push(shared);
        inode_b.size = 4;
        assert_eq!(fs.check(), Err(Error::Corrupted));
    }

    #[test]
    fn check_catches_leaked_block() {
        let mut fs = tiny(DirLayout::Table);
        fs.blocks.allocate().unwrap();
        assert_eq!(fs.check(), Err(Error::Corrupted));
    }

    #[test]
    fn check_catches_dangling_entry() {
        let mut fs = tiny(DirLayout::Blocks);
        let a = fs.create("a", DirEntryType::Regular).unwrap();
        fs.inodes.get_mut(a).unwrap().kind = InodeKind::Unallocated;
        fs.inodes.get_mut(a).unwrap().parent = None;
        assert_eq!(fs.check(), Err(Error::Corrupted));
        assert_eq!(fs.list(), Err(Error::Corrupted));
    }

    #[test]
    fn check_catches_unlisted_inode() {
        let mut fs = tiny(DirLayout::Table);
        fs.create("a", DirEntryType::Regular).unwrap();
        fs.check().unwrap();

        fs.inodes.allocate(InodeKind::File, ROOT_INODE).unwrap();
        assert_eq!(fs.check(), Err(Error::Corrupted));
    }

    #[test]
    fn failed_create_releases_inode() {
        let mut fs = tiny(DirLayout::Blocks);
        let a = fs.create("a", DirEntryType::Regular).unwrap();
        fs.write(a, b"abcdefghijkl").unwrap();
        assert_eq!(fs.free_blocks(), 0);

        let live = fs.inodes.live_count();
        assert_eq!(fs.create("b", DirEntryType::Regular), Err(Error::DiskFull));
        assert_eq!(fs.inodes.live_count(), live);
        fs.check().unwrap();
    }
}
