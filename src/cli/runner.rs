use tracing::info;
use tracing_subscriber::EnvFilter;

use modisnrt::{Collaborators, Config, Pipeline, ProcessInvoker, WgetFetcher};

use super::args::CliArgs;
use super::errors::AppError;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // already installed when run twice in one process
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub fn run(args: CliArgs) -> Result<(), AppError> {
    init_logging();

    let config = Config::load(&args.config).map_err(AppError::Config)?;
    info!("Loaded configuration from {:?}", args.config);

    let wget = WgetFetcher::new(&config.lance.wget, &config.lance.auth_token);
    let collaborators = Collaborators {
        metadata: &wget,
        downloader: &wget,
        tools: &ProcessInvoker,
    };

    let mut pipeline = Pipeline::new(&config, collaborators).map_err(AppError::Setup)?;
    info!(
        "Run time {} (selection {})",
        pipeline.run_time().format("%Y-%m-%d %H:%M"),
        config.selection_policy().map_err(AppError::Setup)?
    );

    match pipeline.run() {
        Ok(products) => {
            info!("Successfully produced {:?}", products.kmz);
            Ok(())
        }
        Err(source) => Err(AppError::from_run_failure(pipeline.state(), source)),
    }
}
