use clap::{Parser, ValueEnum};
use sim_fs::{BLOCK_SIZE, DirLayout, FsConfig, INODE_COUNT, TOTAL_BLOCKS};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(about = "Interactive shell over a simulated block filesystem")]
pub struct Cli {
    /// Bytes per block
    #[arg(long, default_value_t = BLOCK_SIZE as u64, value_parser = clap::value_parser!(u64).range(1..))]
    pub block_size: u64,

    /// Disk capacity in blocks
    #[arg(long, default_value_t = TOTAL_BLOCKS)]
    pub total_blocks: u32,

    /// Maximum number of live inodes, root included
    #[arg(long, default_value_t = INODE_COUNT, value_parser = clap::value_parser!(u32).range(1..))]
    pub inode_count: u32,

    /// Where directory entries are kept
    #[arg(long, value_enum, default_value_t = Layout::Table)]
    pub dir_layout: Layout,

    /// Read commands from a file instead of stdin
    #[arg(long, short)]
    pub script: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Layout {
    /// Ordered table inside the directory inode
    Table,
    /// `name:inode` lines inside directory-owned blocks
    Blocks,
}

impl Cli {
    /// 块大小超出本平台 `usize` 时报错
    pub fn config(&self) -> io::Result<FsConfig> {
        let block_size = usize::try_from(self.block_size).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("block size {} does not fit in memory", self.block_size),
            )
        })?;
        let dir_layout = match self.dir_layout {
            Layout::Table => DirLayout::Table,
            Layout::Blocks => DirLayout::Blocks,
        };
        Ok(FsConfig::new(block_size, self.total_blocks, self.inode_count)
            .with_dir_layout(dir_layout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_build_config() {
        let cli = Cli::parse_from([
            "sim-fs-shell",
            "--block-size",
            "8",
            "--total-blocks",
            "16",
            "--dir-layout",
            "blocks",
        ]);
        let config = cli.config().unwrap();
        assert_eq!(
            config,
            FsConfig::new(8, 16, INODE_COUNT).with_dir_layout(DirLayout::Blocks)
        );
    }

    #[test]
    fn zero_block_size_rejected() {
        assert!(Cli::try_parse_from(["sim-fs-shell", "--block-size", "0"]).is_err());
    }
}
