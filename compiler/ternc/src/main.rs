//! Tern module tool CLI.

use std::path::{Path, PathBuf};

use ternc::commands::{
    dump_module, explain_error, load_module, pack_manifest, parse_load_args,
    search_paths_from_env, CommandError, MODULE_PATH_VAR,
};

fn main() {
    ternc::init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];
    let mut stdout = std::io::stdout().lock();

    match command.as_str() {
        "load" => {
            let mut options = match parse_load_args(&args[2..]) {
                Ok(options) => options,
                Err(e) => {
                    eprintln!("error: {e}");
                    eprintln!("Usage: ternc load <Module> [-I <dir>]... [--from <source-file>]");
                    std::process::exit(1);
                }
            };
            let env_paths = std::env::var_os(MODULE_PATH_VAR);
            options
                .import_paths
                .extend(search_paths_from_env(env_paths.as_deref()));

            let mut stderr = std::io::stderr().lock();
            match load_module(&options, &mut stdout, &mut stderr) {
                Ok(0) => {}
                Ok(_) => std::process::exit(1),
                Err(e) => fail(&e),
            }
        }
        "dump" => {
            if args.len() < 3 {
                eprintln!("Usage: ternc dump <file.ternmod>");
                std::process::exit(1);
            }
            if let Err(e) = dump_module(Path::new(&args[2]), &mut stdout) {
                fail(&e);
            }
        }
        "pack" => {
            if args.len() < 3 {
                eprintln!("Usage: ternc pack <manifest.json> [-o <out.ternmod>]");
                std::process::exit(1);
            }
            let mut output = None;
            let mut i = 3;
            while i < args.len() {
                if args[i] == "-o" && i + 1 < args.len() {
                    output = Some(PathBuf::from(&args[i + 1]));
                    i += 2;
                } else {
                    eprintln!("error: unexpected argument '{}'", args[i]);
                    std::process::exit(1);
                }
            }
            if let Err(e) = pack_manifest(Path::new(&args[2]), output.as_deref(), &mut stdout) {
                fail(&e);
            }
        }
        "--explain" | "explain" => {
            if args.len() < 3 {
                eprintln!("Usage: ternc --explain <code>");
                std::process::exit(1);
            }
            if let Err(e) = explain_error(&args[2], &mut stdout) {
                fail(&e);
            }
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "version" | "--version" | "-V" => {
            println!("ternc {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn fail(error: &CommandError) -> ! {
    eprintln!("error: {error}");
    std::process::exit(1);
}

fn print_usage() {
    println!("Tern module tool");
    println!();
    println!("Usage: ternc <command> [options]");
    println!();
    println!("Commands:");
    println!("  load <Module>             Resolve a module and list what it provides");
    println!("  dump <file.ternmod>       Print the contents of a module file");
    println!("  pack <manifest.json>      Write a module file from a JSON manifest");
    println!("  --explain <code>          Explain an error code (e.g., E7004)");
    println!("  help                      Show this help message");
    println!("  version                   Show version information");
    println!();
    println!("Load options:");
    println!("  -I <dir>                  Add a module search directory");
    println!("  --from <source-file>      Resolve as if imported from this file");
    println!();
    println!("Pack options:");
    println!("  -o <path>                 Output file (default: <name>.ternmod)");
    println!();
    println!("Environment:");
    println!("  {MODULE_PATH_VAR}          Extra search directories, searched after -I");
    println!("  RUST_LOG                  Enable tracing output (e.g., tern_loader=debug)");
    println!("  TERN_LOG_TREE=1           Show tracing as an indented span tree");
}
