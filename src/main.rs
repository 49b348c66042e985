mod append_cmd;
mod cli;
mod compress_cmd;
mod config;
mod decompress_cmd;
mod error;
mod info_cmd;

use clap::Parser;
use cli::{Cli, Command};
use log::error;

fn init_log(level: log::LevelFilter, debug: bool) {
    fern::Dispatch::new()
        .format(move |out, message, record| {
            if debug {
                out.finish(format_args!(
                    "[{}]({})({}) {}",
                    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                    record.target(),
                    record.level(),
                    message
                ))
            } else {
                out.finish(format_args!("{}", message))
            }
        })
        .level(level)
        .chain(std::io::stdout())
        .apply()
        .expect("only one logger is ever installed");
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let nthreads = config::parse_nthreads(cli.nthreads.unwrap_or_else(num_cpus::get))?;

    let result = match &cli.command {
        Command::Compress { input, output, opts } => compress_cmd::run(&compress_cmd::Args {
            input: input.clone(),
            output: output.clone(),
            opts: opts.clone(),
            force: cli.force,
            nthreads,
        }),
        Command::Decompress {
            input,
            output,
            no_check_extension,
        } => decompress_cmd::run(&decompress_cmd::Args {
            input: input.clone(),
            output: output.clone(),
            no_check_extension: *no_check_extension,
            force: cli.force,
            nthreads,
        }),
        Command::Append {
            orig,
            new,
            opts,
            no_check_extension,
        } => append_cmd::run(&append_cmd::Args {
            orig: orig.clone(),
            new: new.clone(),
            opts: opts.clone(),
            no_check_extension: *no_check_extension,
            nthreads,
        }),
        Command::Info { file } => info_cmd::run(&info_cmd::Args { file: file.clone() }),
    };
    result.map_err(anyhow::Error::from)
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.debug {
        log::LevelFilter::Trace
    } else {
        match cli.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    init_log(level, cli.debug);

    if let Err(e) = run(&cli) {
        error!("blpk: error: {}", e);
        for cause in e.chain().skip(1) {
            error!("caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
