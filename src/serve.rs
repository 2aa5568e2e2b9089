//! `teenyc-serve`: answers `POST /compile` through the Lambda HTTP runtime.
//!
//! Run locally with `cargo lambda watch`, which serves the handler over HTTP.

use clap::{Arg, ArgAction, Command as ClapCommand};
use lambda_http::{run, service_fn, Error as LambdaError};
use tracing::info;

use teenyc::{logging, service::handle_http};

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    let matches = ClapCommand::new("teenyc-serve")
        .version("0.1.0")
        .about("Serves POST /compile requests")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (repeatable)")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .help("Emit logs as JSON")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    logging::init(matches.get_count("verbose"), matches.get_flag("log-json"));
    info!("initialising Lambda runtime");

    run(service_fn(handle_http)).await
}
