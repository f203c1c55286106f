mod commands;
mod terminal;

use commands::{CommandLine, Commands, results, run};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging();

    match commands.command {
        Commands::Run(args) => {
            let cfg = args.to_config();
            print::header("starting workflows");
            run::run(&args, &cfg).await
        }
        Commands::Results(args) => {
            print::header("collecting results");
            results::results(&args)
        }
    }
}
