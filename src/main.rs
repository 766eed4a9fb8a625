use std::io::{stdin, stdout, Write};
use std::{env, fs, process};

use flatfs::prelude::*;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <diskfile>", args[0]);
        process::exit(1);
    }
    let image = args[1].clone();

    let mut mounted: Option<FileSystem> = None;

    // shell loop
    loop {
        let line = read_command();
        let command: Vec<&str> = line.split_whitespace().collect();
        if command.is_empty() {
            continue;
        }

        match command[0] {
            "help" => do_help(),
            "format" => do_format(&image, &mounted),
            "mount" => do_mount(&image, &mut mounted),
            "unmount" => do_unmount(&mut mounted),
            "create" => do_create(&mut mounted, &command),
            "delete" => do_delete(&mut mounted, &command),
            "ls" => do_list(&mut mounted),
            "write" => do_write(&mut mounted, &command),
            "cat" => do_cat(&mut mounted, &command),
            "stat" => do_stat(&mut mounted, &command),
            "copyin" => do_copyin(&mut mounted, &command),
            "copyout" => do_copyout(&mut mounted, &command),
            "debug" => do_debug(&mut mounted),
            "free" => do_free(&mut mounted),
            "exit" | "quit" => break,
            _ => println!("Unknown command: {}", line),
        }
    }
}

fn read_command() -> String {
    println!();
    print!("flatfs> ");
    let _ = stdout().flush();
    let mut line = String::new();
    if stdin().read_line(&mut line).unwrap_or(0) == 0 {
        return "exit".to_string();
    }
    if let Some('\n') = line.chars().next_back() {
        line.pop();
    }
    if let Some('\r') = line.chars().next_back() {
        line.pop();
    }
    line
}

fn do_help() {
    println!("Commands are:");
    println!("      format");
    println!("      mount");
    println!("      unmount");
    println!("      create  <name>");
    println!("      delete  <name>");
    println!("      ls");
    println!("      write   <name> <text>");
    println!("      cat     <name>");
    println!("      stat    <name>");
    println!("      copyin  <hostfile> <name>");
    println!("      copyout <name> <hostfile>");
    println!("      debug");
    println!("      free");
    println!("      help");
    println!("      quit");
    println!("      exit");
}

fn require_mounted(mounted: &mut Option<FileSystem>) -> Option<&mut FileSystem> {
    if mounted.is_none() {
        println!("no filesystem mounted");
    }
    mounted.as_mut()
}

fn do_format(image: &str, mounted: &Option<FileSystem>) {
    if mounted.is_some() {
        println!("unmount first");
        return;
    }
    match FileSystem::format(image) {
        Ok(()) => println!("disk formatted."),
        Err(e) => println!("format failed: {}", e),
    }
}

fn do_mount(image: &str, mounted: &mut Option<FileSystem>) {
    if mounted.is_some() {
        println!("already mounted");
        return;
    }
    match FileSystem::mount(image) {
        Ok(fs) => {
            *mounted = Some(fs);
            println!("disk mounted.");
        }
        Err(e) => println!("mount failed: {}", e),
    }
}

fn do_unmount(mounted: &mut Option<FileSystem>) {
    match mounted.take() {
        Some(fs) => {
            fs.unmount();
            println!("disk unmounted.");
        }
        None => println!("no filesystem mounted"),
    }
}

fn do_create(mounted: &mut Option<FileSystem>, args: &[&str]) {
    if args.len() != 2 {
        println!("Usage: create <name>");
        return;
    }
    if let Some(fs) = require_mounted(mounted) {
        match fs.create(args[1]) {
            Ok(()) => println!("created '{}'", args[1]),
            Err(e) => println!("create failed: {}", e),
        }
    }
}

fn do_delete(mounted: &mut Option<FileSystem>, args: &[&str]) {
    if args.len() != 2 {
        println!("Usage: delete <name>");
        return;
    }
    if let Some(fs) = require_mounted(mounted) {
        match fs.delete(args[1]) {
            Ok(()) => println!("deleted '{}'", args[1]),
            Err(e) => println!("delete failed: {}", e),
        }
    }
}

fn do_list(mounted: &mut Option<FileSystem>) {
    if let Some(fs) = require_mounted(mounted) {
        match fs.list(MAX_FILES) {
            Ok(names) => {
                for name in &names {
                    println!("{}", name);
                }
                println!("{} file(s)", names.len());
            }
            Err(e) => println!("ls failed: {}", e),
        }
    }
}

fn do_write(mounted: &mut Option<FileSystem>, args: &[&str]) {
    if args.len() < 3 {
        println!("Usage: write <name> <text>");
        return;
    }
    if let Some(fs) = require_mounted(mounted) {
        let text = args[2..].join(" ");
        match fs.write(args[1], text.as_bytes()) {
            Ok(()) => println!("{} bytes written", text.len()),
            Err(e) => println!("write failed: {}", e),
        }
    }
}

fn do_cat(mounted: &mut Option<FileSystem>, args: &[&str]) {
    if args.len() != 2 {
        println!("Usage: cat <name>");
        return;
    }
    if let Some(fs) = require_mounted(mounted) {
        let mut buf = vec![0u8; MAX_FILE_SIZE];
        match fs.read(args[1], &mut buf) {
            Ok(n) => println!("{}", String::from_utf8_lossy(&buf[..n])),
            Err(e) => println!("cat failed: {}", e),
        }
    }
}

fn do_stat(mounted: &mut Option<FileSystem>, args: &[&str]) {
    if args.len() != 2 {
        println!("Usage: stat <name>");
        return;
    }
    if let Some(fs) = require_mounted(mounted) {
        match fs.stat(args[1]) {
            Ok(stat) => println!(
                "'{}' has size {} bytes in {} block(s)",
                stat.name, stat.size, stat.blocks
            ),
            Err(e) => println!("stat failed: {}", e),
        }
    }
}

fn do_copyin(mounted: &mut Option<FileSystem>, args: &[&str]) {
    if args.len() != 3 {
        println!("Usage: copyin <hostfile> <name>");
        return;
    }
    if let Some(fs_ctx) = require_mounted(mounted) {
        let data = match fs::read(args[1]) {
            Ok(data) => data,
            Err(e) => {
                println!("Unable to read {}: {}", args[1], e);
                return;
            }
        };
        if data.len() > MAX_FILE_SIZE {
            println!(
                "{} is {} bytes; the maximum file size is {}",
                args[1],
                data.len(),
                MAX_FILE_SIZE
            );
            return;
        }
        match fs_ctx.write(args[2], &data) {
            Ok(()) => println!("{} bytes copied", data.len()),
            Err(e) => println!("copyin failed: {}", e),
        }
    }
}

fn do_copyout(mounted: &mut Option<FileSystem>, args: &[&str]) {
    if args.len() != 3 {
        println!("Usage: copyout <name> <hostfile>");
        return;
    }
    if let Some(fs_ctx) = require_mounted(mounted) {
        let mut buf = vec![0u8; MAX_FILE_SIZE];
        let n = match fs_ctx.read(args[1], &mut buf) {
            Ok(n) => n,
            Err(e) => {
                println!("copyout failed: {}", e);
                return;
            }
        };
        match fs::write(args[2], &buf[..n]) {
            Ok(()) => println!("{} bytes copied", n),
            Err(e) => println!("Unable to write {}: {}", args[2], e),
        }
    }
}

fn do_debug(mounted: &mut Option<FileSystem>) {
    if let Some(fs) = require_mounted(mounted) {
        match fs.dump() {
            Ok(report) => print!("{}", report),
            Err(e) => println!("debug failed: {}", e),
        }
    }
}

fn do_free(mounted: &mut Option<FileSystem>) {
    if let Some(fs) = require_mounted(mounted) {
        match fs.free_blocks() {
            Ok(count) => println!("{} free block(s)", count),
            Err(e) => println!("free failed: {}", e),
        }
    }
}
