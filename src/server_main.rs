use anyhow::Result;
use clap::Parser;
use sitetally::{
    server::{args::ServerArgs, start_server},
    utils::{
        dir::create_application_default_path,
        logging::{enable_logging, SERVER_PREFIX},
        runtime::multi_thread_runtime,
    },
};
use tracing::error;

fn main() -> Result<()> {
    let args = ServerArgs::parse();
    let app_dir = args
        .dir
        .clone()
        .map_or_else(create_application_default_path, Ok)?;
    enable_logging(SERVER_PREFIX, &app_dir, args.log, args.log_console)?;

    let db_path = args.db.clone().unwrap_or_else(|| app_dir.join("db.json"));
    multi_thread_runtime()?
        .block_on(async { start_server(&args, db_path).await })
        .inspect_err(|e| error!("Server stopped with an error {e:?}"))?;
    Ok(())
}
