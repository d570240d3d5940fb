use alloc::string::{String, ToString};
use alloc::vec::Vec;

use vfs::{Error, Result};

/// 目录项分隔符：`name:inode_id`
const SEPARATOR: char = ':';

/// 目录项：名字到 inode ID 的映射
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DirEntry {
    name: String,
    inode_id: u32,
}

impl DirEntry {
    #[inline]
    pub fn new(name: &str, inode_id: u32) -> Self {
        Self {
            name: name.to_string(),
            inode_id,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn inode_id(&self) -> u32 {
        self.inode_id
    }

    /// 名字不能为空，不能是 `.`、`..`，也不能含有路径分隔符、
    /// 目录项分隔符以及换行
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', SEPARATOR, '\n', '\r'])
    }

    /// 编码为一行文本，带结尾换行
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.name.as_bytes());
        buf.push(SEPARATOR as u8);
        buf.extend_from_slice(self.inode_id.to_string().as_bytes());
        buf.push(b'\n');
    }

    #[inline]
    pub fn encoded_len(&self) -> usize {
        self.name.len() + 1 + self.inode_id.to_string().len() + 1
    }

    /// 解析一行（不含换行）
    pub fn parse(line: &[u8]) -> Result<Self> {
        let line = core::str::from_utf8(line).map_err(|_| Error::Corrupted)?;
        let (name, inode_id) = line.rsplit_once(SEPARATOR).ok_or(Error::Corrupted)?;
        let inode_id = inode_id.parse().map_err(|_| Error::Corrupted)?;

        Ok(Self::new(name, inode_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_format() {
        let mut buf = Vec::new();
        let entry = DirEntry::new("notes", 12);
        entry.encode_into(&mut buf);
        assert_eq!(buf, b"notes:12\n");
        assert_eq!(entry.encoded_len(), buf.len());
        assert_eq!(DirEntry::parse(b"notes:12"), Ok(entry));
    }

    #[test]
    fn malformed_lines() {
        assert_eq!(DirEntry::parse(b"notes"), Err(Error::Corrupted));
        assert_eq!(DirEntry::parse(b"notes:x"), Err(Error::Corrupted));
        assert_eq!(DirEntry::parse(&[0xff, b':', b'1']), Err(Error::Corrupted));
    }

    #[test]
    fn names() {
        assert!(DirEntry::is_valid_name("a.txt"));
        assert!(!DirEntry::is_valid_name(""));
        assert!(!DirEntry::is_valid_name(".."));
        assert!(!DirEntry::is_valid_name("a/b"));
        assert!(!DirEntry::is_valid_name("a:b"));
        assert!(!DirEntry::is_valid_name("a\nb"));
    }
}
