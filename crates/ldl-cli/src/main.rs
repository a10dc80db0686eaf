use ldl_core::logging;

mod cli;

#[tokio::main]
async fn main() {
    // File logging first; stdout belongs to the progress view.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    if let Err(err) = cli::run_from_args().await {
        eprintln!("ldl error: {:#}", err);
        std::process::exit(1);
    }
}
