/// 文件系统操作的错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("no free block left on disk")]
    DiskFull,
    #[error("inode table exhausted")]
    InodeExhausted,
    #[error("not a file")]
    NotAFile,
    #[error("not a directory")]
    NotADirectory,
    #[error("no such file or directory")]
    NotFound,
    #[error("file exists")]
    AlreadyExists,
    #[error("directory not empty")]
    DirectoryNotEmpty,
    #[error("invalid name")]
    InvalidName,
    #[error("inode {0} out of range")]
    BadInode(u32),
    /// 目录数据无法解析，或布局违反了不变式
    #[error("filesystem corrupted")]
    Corrupted,
}

pub type Result<T> = core::result::Result<T, Error>;
