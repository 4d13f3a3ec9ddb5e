#![forbid(unsafe_code)]

use log::{error, info};

// Utilities
use crate::utils::config::{init_log, init_runtime_context, init_server_args, RuntimeCtx};
use crate::utils::errors::Errors;

// Modules
mod api;
mod server;
mod utils;

// ---------------------------------------------------------------------------
// main:
// ---------------------------------------------------------------------------
#[tokio::main]
async fn main() {
    // Announce ourselves.
    println!("Starting hello_openapi!");

    // Initialize the server.  Any failure here is fatal.
    let ctx = match server_init() {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("FAILED to initialize hello_openapi: {:#}", e);
            std::process::exit(1);
        }
    };

    // ------------------ Main Loop -------------------
    let config = &ctx.parms.config;
    if let Err(e) = server::run_server(config).await {
        let addr = format!("{}:{}", config.bind_addr, config.http_port);
        error!("{}", Errors::ServerStart(addr, e.to_string()));
        std::process::exit(1);
    }
}

// ***************************************************************************
//                             Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// server_init:
// ---------------------------------------------------------------------------
/** Read the command line and configuration file, then configure logging. */
fn server_init() -> anyhow::Result<RuntimeCtx> {
    let ctx = init_runtime_context(init_server_args())?;

    // Configure our log.
    init_log(&ctx.args, &ctx.parms.config)?;
    info!("{}", Errors::InputParms(format!("{:#?}", ctx)));
    match &ctx.parms.config_file {
        Some(file) => info!("Configuration read from {}.", file),
        None => info!("No configuration file given, using defaults."),
    }

    // Log build info.
    print_version_info();

    Ok(ctx)
}

// ---------------------------------------------------------------------------
// print_version_info:
// ---------------------------------------------------------------------------
fn print_version_info() {
    info!("\n*** Running HELLO_OPENAPI={}, BRANCH={}, COMMIT={}, DIRTY={}, SRC_TS={}, RUSTC={}.",
          option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"),
          env!("GIT_BRANCH"),
          env!("GIT_COMMIT_SHORT"),
          env!("GIT_DIRTY"),
          env!("SOURCE_TIMESTAMP"),
          env!("RUSTC_VERSION"));
}
