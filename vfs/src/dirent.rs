use alloc::string::String;

/// 目录列表中的一项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Inode number
    pub inode: u32,
    pub ty: DirEntryType,
    pub name: String,
}

impl DirEntry {
    #[inline]
    pub fn new(name: impl Into<String>, inode: u32, ty: DirEntryType) -> Self {
        Self {
            inode,
            ty,
            name: name.into(),
        }
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.ty == DirEntryType::Directory
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DirEntryType {
    Directory,
    #[default]
    Regular,
}
