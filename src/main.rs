use cacti_runtime::prelude::*;
use cacti_runtime::syntax::source::SourceFile;
use clap::Parser;
use std::path::PathBuf;
use std::process;

mod logger;

#[derive(Debug, Parser)]
#[command(name = "cacti")]
#[command(about = "The Cacti programming language interpreter")]
#[command(version)]
struct Options {
    /// Enable verbose logging. Repeat for more detail.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable all logging
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// The script to run
    file: PathBuf,
}

fn main() {
    log_panics::init();
    logger::init();

    let options = Options::parse();

    if options.quiet {
        logger::quiet();
    } else {
        logger::verbose(options.verbose);
    }

    process::exit(run(&options));
}

fn run(options: &Options) -> exitcode::ExitCode {
    let file = match SourceFile::open(&options.file) {
        Ok(file) => file,
        Err(e) => {
            log::error!("cannot read '{}': {}", options.file.display(), e);
            return exitcode::NOINPUT;
        }
    };

    let mut runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("runtime failed to start: {}", e);
            return exitcode::SOFTWARE;
        }
    };

    match runtime.execute(file) {
        Ok(_) => exitcode::OK,
        Err(Exception::Syntax(e)) => {
            eprintln!("{}", e);
            exitcode::DATAERR
        }
        Err(e) => {
            eprintln!("{}", e);
            exitcode::SOFTWARE
        }
    }
}
