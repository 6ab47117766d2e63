use clap::Parser as _;
use proc_exit::prelude::*;

mod args;
mod serve;

fn main() {
    human_panic::setup_panic!();
    let result = run();
    proc_exit::exit(result);
}

fn run() -> proc_exit::ExitResult {
    let args = args::Args::parse();
    init_logging(args.verbose.log_level_filter());

    serve::run(&args).with_code(proc_exit::Code::FAILURE)?;

    // printed on every normal exit
    println!("Thank you for playing Flappy Bird!");
    Ok(())
}

fn init_logging(level: log::LevelFilter) {
    if level == log::LevelFilter::Off {
        return;
    }

    let mut builder = env_logger::Builder::new();
    builder.filter(None, level);
    builder.format(|f, record| {
        use std::io::Write as _;
        let level = record.level().to_string().to_lowercase();
        writeln!(f, "[{}] {}", level, record.args())
    });
    builder.init();
}
