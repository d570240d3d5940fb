#![no_std]

extern crate alloc;

/* sim-fs 的整体架构，自上而下 */

// 存储引擎层：组合下面各层，实现创建、列目录、读写、删除等操作
mod sfs;

// 目录编解码层：目录项与目录内容之间的转换
mod dir_codec;

// 块分配层：位图与块内数据
mod block_alloc;

// 数据结构层：位图、inode、目录项
pub mod layout;

mod config;

pub use self::{
    block_alloc::BlockAllocator,
    config::{DirLayout, FsConfig},
    dir_codec::DirectoryCodec,
    layout::{Bitmap, Inode, InodeKind, InodeTable},
    sfs::SimFileSystem,
};
pub use vfs::{DirEntry, DirEntryType, Error, Result, Stat, StatKind};

pub const BLOCK_SIZE: usize = 4096;
pub const TOTAL_BLOCKS: u32 = 1024;
pub const INODE_COUNT: u32 = 128;

/// 根目录的 inode ID
pub const ROOT_INODE: u32 = 0;
