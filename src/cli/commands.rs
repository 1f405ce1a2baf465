//! Command implementation for the Affinity CLI.

use std::time::Instant;

use log::info;

use crate::cli::args::AffinityArgs;
use crate::cli::output::output_recommendations;
use crate::config::AffinityConfig;
use crate::error::Result;
use crate::pipeline::Pipeline;

/// Build the run configuration from the config file and command line overrides.
pub fn load_config(args: &AffinityArgs) -> Result<AffinityConfig> {
    let mut config = AffinityConfig::load(&args.config)?;
    if let Some(input) = &args.input {
        config = config.with_file_path(input);
    }
    if let Some(threads) = args.threads {
        config = config.with_num_threads(threads);
    }
    config.validate()?;
    Ok(config)
}

/// Execute a CLI invocation.
pub fn execute_command(args: AffinityArgs) -> Result<()> {
    let start = Instant::now();
    let config = load_config(&args)?;

    let pipeline = Pipeline::new(config)?;
    let trained = pipeline.run()?;
    let recommendations = trained.recommend_all(&args.users, args.count)?;

    info!(
        "Recommended for {} users in {} ms",
        recommendations.len(),
        start.elapsed().as_millis()
    );

    output_recommendations(&recommendations, args.output_format, args.pretty)
}
