use clap::Parser;
use log::warn;
use snafu::ErrorCompat;

mod args;
mod poll;

fn main() {
    let args = args::Args::parse();

    if args.verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    match poll::run(&args) {
        Ok(out) => print!("{}", out),
        Err(e) => {
            warn!("Error occured {:?}", e);
            eprintln!("An error occured: {}", poll::describe(&e));
            if let Some(bt) = ErrorCompat::backtrace(&e) {
                eprintln!("trace: {}", bt);
            }
            std::process::exit(1);
        }
    }
}
