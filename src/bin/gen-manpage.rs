//! Writes si5351ctl.1 plus one si5351ctl-<command>.1 page per subcommand
//!
//! Usage: gen-manpage [output-dir]   (default: man/)

use clap::{Command, CommandFactory};
use std::io;
use std::path::{Path, PathBuf};

#[path = "../cli.rs"]
mod cli;

fn render(cmd: Command, dir: &Path) -> io::Result<PathBuf> {
    let path = dir.join(format!("{}.1", cmd.get_name()));
    let mut page = Vec::new();
    clap_mangen::Man::new(cmd).render(&mut page)?;
    std::fs::write(&path, page)?;
    Ok(path)
}

fn main() -> io::Result<()> {
    let dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));
    std::fs::create_dir_all(&dir)?;

    let root = cli::Cli::command();
    let mut written = vec![render(root.clone(), &dir)?];
    for sub in root.get_subcommands().filter(|s| s.get_name() != "help") {
        let name = format!("{}-{}", root.get_name(), sub.get_name());
        written.push(render(sub.clone().name(name), &dir)?);
    }

    for path in &written {
        println!("wrote {}", path.display());
    }
    if let Some(main_page) = written.first() {
        println!("view with: man -l {}", main_page.display());
    }
    Ok(())
}
