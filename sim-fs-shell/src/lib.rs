//! 模拟文件系统的命令行外壳
//!
//! 只负责把一行命令翻译成对 [`SimFileSystem`] 的调用，再把结果或错误写回。

#[cfg(test)]
mod tests;

use std::fmt::Write as _;
use std::io::{self, BufRead, Write};

use sim_fs::{DirEntryType, Result, SimFileSystem, StatKind};

pub const USAGE: &str = "\
commands:
  mkdir NAME            create a directory
  touch NAME            create a file
  rm NAME               delete a file or an empty directory
  ls [PATH]             list a directory
  write NAME CONTENT    replace the content of a file
  cat NAME              print the content of a file
  cd PATH               change the current directory
  pwd                   print the current directory
  tree                  print the whole hierarchy
  stat NAME             show inode information
  df                    show block and inode usage
  help                  show this message
  exit                  leave the shell";

#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Mkdir(&'a str),
    Touch(&'a str),
    Rm(&'a str),
    Ls(Option<&'a str>),
    Write(&'a str, &'a str),
    Cat(&'a str),
    Cd(&'a str),
    Pwd,
    Tree,
    Stat(&'a str),
    Df,
    Help,
    Exit,
}

impl<'a> Command<'a> {
    /// 解析一行命令；空行与不认识的命令返回空。
    /// `write` 的内容原样保留，只去掉首尾空白。
    pub fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("write") {
            let rest = rest.strip_prefix(char::is_whitespace)?.trim_start();
            let (name, content) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            return Some(Self::Write(name, content.trim_start()));
        }

        let mut args = line.split_whitespace();
        let cmd = args.next()?;
        let rest: Vec<&str> = args.collect();

        let command = match (cmd, rest.as_slice()) {
            ("mkdir", &[name]) => Self::Mkdir(name),
            ("touch", &[name]) => Self::Touch(name),
            ("rm", &[name]) => Self::Rm(name),
            ("ls", &[]) => Self::Ls(None),
            ("ls", &[path]) => Self::Ls(Some(path)),
            ("cat", &[name]) => Self::Cat(name),
            ("cd", &[path]) => Self::Cd(path),
            ("pwd", &[]) => Self::Pwd,
            ("tree", &[]) => Self::Tree,
            ("stat", &[name]) => Self::Stat(name),
            ("df", &[]) => Self::Df,
            ("help", _) => Self::Help,
            ("exit" | "quit", _) => Self::Exit,
            _ => return None,
        };
        Some(command)
    }
}

pub struct Shell {
    fs: SimFileSystem,
}

impl Shell {
    #[inline]
    pub fn new(fs: SimFileSystem) -> Self {
        Self { fs }
    }

    #[inline]
    pub fn fs(&self) -> &SimFileSystem {
        &self.fs
    }

    /// 提示符中带上当前目录
    pub fn prompt(&self) -> String {
        let cwd = self.fs.path_of(self.fs.cwd()).unwrap_or_else(|_| "?".into());
        format!("sfs:{cwd}> ")
    }

    /// 逐行执行命令，直到输入结束或遇到 `exit`
    pub fn run(
        &mut self,
        input: impl BufRead,
        out: &mut impl Write,
        interactive: bool,
    ) -> io::Result<()> {
        if interactive {
            write!(out, "{}", self.prompt())?;
            out.flush()?;
        }

        for line in input.lines() {
            if !self.execute(&line?, out)? {
                break;
            }
            if interactive {
                write!(out, "{}", self.prompt())?;
                out.flush()?;
            }
        }

        Ok(())
    }

    /// 执行一行命令。返回 `false` 表示应当退出。
    /// 文件系统报错只打印出来，不会中断外壳。
    pub fn execute(&mut self, line: &str, out: &mut impl Write) -> io::Result<bool> {
        if line.trim().is_empty() {
            return Ok(true);
        }

        let Some(command) = Command::parse(line) else {
            log::info!("unsupported command: {line:?}");
            writeln!(out, "unsupported command, try `help`")?;
            return Ok(true);
        };
        if command == Command::Exit {
            return Ok(false);
        }

        match self.dispatch(command) {
            Ok(output) => write!(out, "{output}")?,
            Err(err) => {
                log::debug!("{line:?} failed: {err:?}");
                writeln!(out, "error: {err}")?
            }
        }

        Ok(true)
    }
}

impl Shell {
    fn dispatch(&mut self, command: Command) -> Result<String> {
        let mut output = String::new();

        match command {
            Command::Mkdir(name) => {
                let inode = self.fs.create(name, DirEntryType::Directory)?;
                _ = writeln!(output, "created directory {name} (inode {inode})");
            }
            Command::Touch(name) => {
                let inode = self.fs.create(name, DirEntryType::Regular)?;
                _ = writeln!(output, "created file {name} (inode {inode})");
            }
            Command::Rm(name) => {
                self.fs.delete(name)?;
                _ = writeln!(output, "removed {name}");
            }
            Command::Ls(path) => {
                let dir = match path {
                    Some(path) => self.fs.find(path)?,
                    None => self.fs.cwd(),
                };
                for entry in self.fs.list_dir(dir)? {
                    let kind = if entry.is_dir() { 'd' } else { '-' };
                    _ = writeln!(output, "{kind} {:>4} {}", entry.inode, entry.name);
                }
            }
            Command::Write(name, content) => {
                let inode = self.fs.find(name)?;
                self.fs.write(inode, content.as_bytes())?;
                _ = writeln!(output, "wrote {} bytes to {name}", content.len());
            }
            Command::Cat(name) => {
                let inode = self.fs.find(name)?;
                let data = self.fs.read(inode)?;
                _ = writeln!(output, "{}", String::from_utf8_lossy(&data));
            }
            Command::Cd(path) => self.fs.change_dir(path)?,
            Command::Pwd => {
                _ = writeln!(output, "{}", self.fs.path_of(self.fs.cwd())?);
            }
            Command::Tree => {
                _ = writeln!(output, "/");
                self.tree(sim_fs::ROOT_INODE, 1, &mut output)?;
            }
            Command::Stat(name) => {
                let stat = self.fs.stat(self.fs.find(name)?)?;
                let kind = match stat.kind {
                    StatKind::DIR => "directory",
                    StatKind::FILE => "file",
                };
                _ = writeln!(output, "inode:  {}", stat.inode);
                _ = writeln!(output, "kind:   {kind} ({:o})", stat.kind.mode());
                _ = writeln!(output, "size:   {}", stat.size);
                _ = writeln!(output, "blocks: {} x {} bytes", stat.blocks, stat.block_size);
                _ = writeln!(output, "parent: {}", stat.parent);
            }
            Command::Df => {
                let config = self.fs.config();
                let total_blocks = config.total_blocks as usize;
                let total_inodes = config.inode_count as usize;
                _ = writeln!(
                    output,
                    "blocks: {}/{total_blocks} used, {} free, {} bytes each",
                    total_blocks - self.fs.free_blocks(),
                    self.fs.free_blocks(),
                    config.block_size,
                );
                _ = writeln!(
                    output,
                    "inodes: {}/{total_inodes} used, {} free",
                    total_inodes - self.fs.free_inodes(),
                    self.fs.free_inodes(),
                );
            }
            Command::Help => {
                _ = writeln!(output, "{USAGE}");
            }
            Command::Exit => {}
        }

        Ok(output)
    }

    /// 递归列出目录，每一层都显式传入要列出的目录
    fn tree(&self, dir: u32, depth: usize, output: &mut String) -> Result<()> {
        for entry in self.fs.list_dir(dir)? {
            let indent = "  ".repeat(depth);
            if entry.is_dir() {
                _ = writeln!(output, "{indent}{}/", entry.name);
                self.tree(entry.inode, depth + 1, output)?;
            } else {
                _ = writeln!(output, "{indent}{}", entry.name);
            }
        }
        Ok(())
    }
}
