use pathways_cli::{command, exit_code, logging, run, CliArgs, EXIT_SUCCESS, EXIT_USAGE};

#[tokio::main]
async fn main() {
    let matches = command().get_matches();

    let args = match CliArgs::from_matches(&matches) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(EXIT_USAGE);
        }
    };

    logging::init(args.log_json);

    match run(&args).await {
        Ok(outcome) => {
            match serde_json::to_string_pretty(&outcome) {
                Ok(summary) => println!("{summary}"),
                Err(e) => tracing::warn!(error = %e, "cannot render run summary"),
            }
            std::process::exit(EXIT_SUCCESS);
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(exit_code(&e));
        }
    }
}
