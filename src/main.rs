use std::process::ExitCode;

use clap::Parser;
use dietlp::{CLIArguments, DietError, diet_main, init_tracing};

fn main() -> ExitCode {
    let args = CLIArguments::parse();
    init_tracing(args.verbose);

    match diet_main(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err.downcast_ref::<DietError>().map_or(1, DietError::code);
            eprintln!("Error code: {code}. {err:#}");
            ExitCode::FAILURE
        }
    }
}
