use log::{
    Level,
    LevelFilter,
    Log,
    Metadata,
    Record,
};

/// Install the stderr logger. Colors are used when stderr is a terminal.
pub fn init() {
    let result = if atty::is(atty::Stream::Stderr) {
        log::set_boxed_logger(Box::new(ColorLogger))
    } else {
        log::set_boxed_logger(Box::new(PlainLogger))
    };

    if result.is_err() {
        eprintln!("warn: a logger was already installed");
    }

    log::set_max_level(LevelFilter::Warn);
}

/// Raise the log level by the number of `-v` flags given.
pub fn verbose(verbosity: u8) {
    log::set_max_level(match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    });
}

pub fn quiet() {
    log::set_max_level(LevelFilter::Off);
}

/// Simple logger that dumps everything to stderr.
struct PlainLogger;

impl Log for PlainLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        eprintln!("{}: {}", record.level(), record.args());
    }

    fn flush(&self) {}
}

/// Simple logger that colorizes log messages and writes them to stderr.
struct ColorLogger;

impl Log for ColorLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        match record.level() {
            Level::Error => eprintln!("\x1b[1m\x1b[31merror\x1b[0m: {}", record.args()),
            Level::Warn => eprintln!("\x1b[1m\x1b[33mwarn\x1b[0m: {}", record.args()),
            Level::Info => eprintln!("\x1b[1m\x1b[32minfo\x1b[0m: {}", record.args()),
            Level::Debug => eprintln!("\x1b[1m\x1b[36mdebug\x1b[0m: {}", record.args()),
            Level::Trace => eprintln!("\x1b[1m\x1b[37mtrace\x1b[0m: {}", record.args()),
        }
    }

    fn flush(&self) {}
}
