use sim_fs::{DirLayout, FsConfig, SimFileSystem};

use crate::{Command, Shell};

fn run_script(config: FsConfig, script: &str) -> (Shell, String) {
    let mut shell = Shell::new(SimFileSystem::new(config));
    let mut out = Vec::new();
    shell.run(script.as_bytes(), &mut out, false).unwrap();
    (shell, String::from_utf8(out).unwrap())
}

#[test]
fn parse_commands() {
    assert_eq!(Command::parse("mkdir usr"), Some(Command::Mkdir("usr")));
    assert_eq!(Command::parse("  ls  "), Some(Command::Ls(None)));
    assert_eq!(
        Command::parse("write a hello   world "),
        Some(Command::Write("a", "hello   world"))
    );
    assert_eq!(Command::parse("write\ta \tx"), Some(Command::Write("a", "x")));
    assert_eq!(Command::parse("write a"), Some(Command::Write("a", "")));
    assert_eq!(Command::parse("write"), None);
    assert_eq!(Command::parse("writer a"), None);
    assert_eq!(Command::parse("mkdir"), None);
    assert_eq!(Command::parse("mkdir a b"), None);
    assert_eq!(Command::parse("format c:"), None);
    assert_eq!(Command::parse(""), None);
}

#[test]
fn file_lifecycle() {
    let (shell, out) = run_script(
        FsConfig::default(),
        "touch a\nwrite a hello world\ncat a\nls\nrm a\nls\n",
    );
    assert_eq!(
        out,
        "created file a (inode 1)\n\
         wrote 11 bytes to a\n\
         hello world\n\
         -    1 a\n\
         removed a\n"
    );
    assert!(shell.fs().list().unwrap().is_empty());
}

#[test]
fn write_keeps_inner_whitespace() {
    let (shell, out) = run_script(FsConfig::default(), "touch a\nwrite a x   y\tz\ncat a\n");
    assert_eq!(
        out,
        "created file a (inode 1)\n\
         wrote 7 bytes to a\n\
         x   y\tz\n"
    );
    assert_eq!(shell.fs().read(1).unwrap(), b"x   y\tz");
}

#[test]
fn errors_do_not_stop_the_shell() {
    let (_, out) = run_script(
        FsConfig::default(),
        "rm ghost\nmkdir d\nwrite d text\ncat d\nfrobnicate\nmkdir d\npwd\n",
    );
    assert_eq!(
        out,
        "error: no such file or directory\n\
         created directory d (inode 1)\n\
         error: not a file\n\
         error: not a file\n\
         unsupported command, try `help`\n\
         error: file exists\n\
         /\n"
    );
}

#[test]
fn exit_stops_reading() {
    let (shell, out) = run_script(FsConfig::default(), "touch a\nexit\ntouch b\n");
    assert_eq!(out, "created file a (inode 1)\n");
    assert_eq!(shell.fs().list().unwrap().len(), 1);
}

#[test]
fn tree_lists_each_directory_explicitly() {
    let (_, out) = run_script(
        FsConfig::default(),
        "mkdir usr\ncd usr\nmkdir bin\ncd bin\ntouch ls\ncd /\ntouch readme\ntree\n",
    );
    let tree = out.split_once("/\n").unwrap().1;
    assert_eq!(tree, "  usr/\n    bin/\n      ls\n  readme\n");
}

#[test]
fn navigation_commands() {
    let (shell, out) = run_script(
        FsConfig::default(),
        "mkdir usr\ncd usr\nmkdir bin\ncd bin\npwd\ncd ..\npwd\nls /usr\ncd /nowhere\n",
    );
    assert!(out.contains("/usr/bin\n/usr\n"));
    assert!(out.contains("d    2 bin\n"));
    assert!(out.ends_with("error: no such file or directory\n"));
    assert_eq!(shell.prompt(), "sfs:/usr> ");
}

#[test]
fn disk_full_reported() {
    let config = FsConfig::new(4, 4, 8);
    let (_, out) = run_script(
        config,
        "touch a\nwrite a 0123456789abcdef\ntouch b\nwrite b x\ndf\n",
    );
    assert!(out.contains("wrote 16 bytes to a\n"));
    assert!(out.contains("error: no free block left on disk\n"));
    assert!(out.contains("blocks: 4/4 used, 0 free, 4 bytes each\n"));
    assert!(out.contains("inodes: 3/8 used, 5 free\n"));
}

#[test]
fn block_layout_stat() {
    let config = FsConfig::new(8, 16, 8).with_dir_layout(DirLayout::Blocks);
    let (_, out) = run_script(config, "touch a\nwrite a abcdefghij\nstat a\nstat /\n");
    assert!(out.contains("inode:  1\nkind:   file (100000)\nsize:   10\nblocks: 2 x 8 bytes\nparent: 0\n"));
    assert!(out.contains("kind:   directory (40000)\nsize:   4\nblocks: 1 x 8 bytes\n"));
}
