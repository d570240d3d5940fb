//! # 数据结构层
//!
//! sim-fs 的内存布局：
//! inode 表 | 数据块位图 | 数据块区域

mod bitmap;
pub use bitmap::Bitmap;

mod inode;
pub use inode::{Inode, InodeKind, InodeTable};

/// 目录项，目录内容的基本单位
mod dir_entry;
pub use dir_entry::DirEntry;
