use std::path::PathBuf;

fn main() {
    if handle_cli_flags() {
        return;
    }

    env_logger::init();

    let options = match parse_args() {
        Some(options) => options,
        None => {
            eprintln!("usage: marginalia [--offline] <page.md> [filename]");
            std::process::exit(2);
        }
    };

    if let Err(err) = marginalia::run(options) {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn handle_cli_flags() -> bool {
    let mut saw_flag = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("Marginalia {}", marginalia::VERSION);
                saw_flag = true;
            }
            "--help" | "-h" => {
                println!(
                    "Marginalia — Threaded comments for rendered documentation pages.\n\nUsage: marginalia [--offline] <page.md> [filename]\n\n  --offline            Use the built-in in-memory backend\n  --version, -V        Show version and exit\n  --help,    -h        Show this help message"
                );
                saw_flag = true;
            }
            _ => {}
        }
    }
    saw_flag
}

fn parse_args() -> Option<marginalia::RunOptions> {
    let mut offline = false;
    let mut positional = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--offline" => offline = true,
            other => positional.push(other.to_string()),
        }
    }

    let mut positional = positional.into_iter();
    let page = PathBuf::from(positional.next()?);
    Some(marginalia::RunOptions {
        page,
        filename: positional.next(),
        offline,
    })
}
