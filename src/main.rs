use clap::Parser;

use isolate_forge::cli::{Cli, Commands};
use isolate_forge::commands::{run_check, run_hashtable, run_rewrite, run_run};

fn main() {
    let cli = Cli::parse();
    let color = cli.color.into();

    let exit_code = match &cli.command {
        Commands::Check(args) => run_check(args, color),
        Commands::Hashtable(args) => run_hashtable(args, color),
        Commands::Rewrite(args) => run_rewrite(args, color),
        Commands::Run(args) => run_run(args, color),
    };

    std::process::exit(exit_code);
}
