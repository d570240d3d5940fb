//! inode 记录与 inode 表
//!
//! inode 表长度在构造时固定，0 号槽位恒为根目录。
//! 槽位的分配与回收只涉及 inode 本身，数据块的回收由调用方先行完成。

use alloc::vec::Vec;

use vfs::{DirEntryType, Error, Result};

use crate::ROOT_INODE;
use crate::layout::DirEntry;

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum InodeKind {
    #[default]
    Unallocated,
    File,
    Directory,
}

#[derive(Debug, Default, Clone)]
pub struct Inode {
    pub(crate) id: u32,
    pub(crate) kind: InodeKind,
    /// 文件：数据长度；块布局的目录：编码后目录内容的长度
    pub(crate) size: usize,
    /// 按存储顺序排列的数据块编号
    pub(crate) blocks: Vec<u32>,
    pub(crate) parent: Option<u32>,
    /// 表布局下目录的有序目录项
    pub(crate) entries: Vec<DirEntry>,
}

impl Inode {
    #[inline]
    fn new(id: u32) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    #[inline]
    fn init(&mut self, kind: InodeKind, parent: u32) {
        *self = Self {
            id: self.id,
            kind,
            parent: Some(parent),
            ..Default::default()
        }
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> InodeKind {
        self.kind
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn blocks(&self) -> &[u32] {
        &self.blocks
    }

    #[inline]
    pub fn parent(&self) -> Option<u32> {
        self.parent
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == InodeKind::Directory
    }

    #[inline]
    pub fn is_file(&self) -> bool {
        self.kind == InodeKind::File
    }

    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.kind != InodeKind::Unallocated
    }
}

#[derive(Debug, Clone)]
pub struct InodeTable {
    inodes: Vec<Inode>,
}

impl InodeTable {
    pub fn new(inode_count: u32) -> Self {
        assert!(inode_count > 0, "inode table needs a slot for the root");

        let mut inodes: Vec<Inode> = (0..inode_count).map(Inode::new).collect();
        inodes[ROOT_INODE as usize].init(InodeKind::Directory, ROOT_INODE);

        Self { inodes }
    }

    /// 分配编号最小的空闲槽位
    pub fn allocate(&mut self, kind: InodeKind, parent: u32) -> Result<u32> {
        debug_assert_ne!(kind, InodeKind::Unallocated);

        let inode = self
            .inodes
            .iter_mut()
            .find(|inode| !inode.is_allocated())
            .ok_or(Error::InodeExhausted)?;
        inode.init(kind, parent);

        log::trace!("alloc inode {} as {kind:?}", inode.id);
        Ok(inode.id)
    }

    /// 槽位恢复为未分配；此前数据块必须已经交还
    pub fn release(&mut self, inode_id: u32) {
        assert_ne!(inode_id, ROOT_INODE, "the root inode is never released");
        let inode = &mut self.inodes[inode_id as usize];
        debug_assert!(inode.blocks.is_empty());

        log::trace!("release inode {inode_id}");
        *inode = Inode::new(inode_id);
    }

    pub fn get(&self, inode_id: u32) -> Result<&Inode> {
        self.inodes
            .get(inode_id as usize)
            .ok_or(Error::BadInode(inode_id))
    }

    pub fn get_mut(&mut self, inode_id: u32) -> Result<&mut Inode> {
        self.inodes
            .get_mut(inode_id as usize)
            .ok_or(Error::BadInode(inode_id))
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.inodes.len()
    }

    /// 所有已分配的 inode
    pub fn live(&self) -> impl Iterator<Item = &Inode> {
        self.inodes.iter().filter(|inode| inode.is_allocated())
    }

    #[inline]
    pub fn live_count(&self) -> usize {
        self.live().count()
    }

    #[inline]
    pub fn free_count(&self) -> usize {
        self.capacity() - self.live_count()
    }
}

impl From<DirEntryType> for InodeKind {
    #[inline]
    fn from(ty: DirEntryType) -> Self {
        match ty {
            DirEntryType::Directory => Self::Directory,
            DirEntryType::Regular => Self::File,
        }
    }
}

impl InodeKind {
    /// 未分配的 inode 没有对应的目录项类型
    #[inline]
    pub fn entry_type(self) -> Option<DirEntryType> {
        match self {
            Self::Unallocated => None,
            Self::File => Some(DirEntryType::Regular),
            Self::Directory => Some(DirEntryType::Directory),
        }
    }
}
