#![forbid(unsafe_code)]

use anyhow::{anyhow, Result};
use clap::Parser;
use log::{error, info, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;
use serde::Deserialize;
use std::fs;

// Utilities
use crate::utils::{errors::Errors, http_utils::get_absolute_path};

// ***************************************************************************
//                                Constants
// ***************************************************************************
// OpenAPI document information.
const DEFAULT_TITLE        : &str = "Basic Example";
const DEFAULT_DESCRIPTION  : &str = "This app showcases a trivial REST API.";
const DEFAULT_API_VERSION  : &str = "v1.2.3";

// Networking.
const DEFAULT_BIND_ADDR    : &str = "0.0.0.0";
const DEFAULT_HTTP_PORT    : u16  = 3000;

// Logging.
const DEFAULT_LOG_LEVEL    : &str = "info";
const CONSOLE_APPENDER     : &str = "stdout";
const CONSOLE_PATTERN      : &str = "{d(%Y-%m-%dT%H:%M:%S%.3f)} {h({l:5})} {t} - {m}{n}";

// Long options that may also be written with a single dash (-port 8080).
const SINGLE_DASH_LONG_OPTS: [&str; 3] = ["port", "config", "log-config"];

// ***************************************************************************
//                               Config Structs
// ***************************************************************************
// ---------------------------------------------------------------------------
// ServerArgs:
// ---------------------------------------------------------------------------
#[derive(Debug, Parser)]
#[command(name = "hello_openapi", version, about = "Command line arguments for the hello_openapi server.")]
pub struct ServerArgs {
    /// Webserver port.
    ///
    /// Overrides the http_port value in the configuration file.  Defaults
    /// to 3000 when neither is given.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path of an optional TOML configuration file.
    #[arg(short, long)]
    pub config: Option<String>,

    /// Path of an optional log4rs YAML configuration file.
    ///
    /// When absent, log records are written to the console at the level
    /// given by log_level in the configuration file.
    #[arg(long)]
    pub log_config: Option<String>,
}

// ---------------------------------------------------------------------------
// Parms:
// ---------------------------------------------------------------------------
#[derive(Debug)]
pub struct Parms {
    pub config_file: Option<String>,
    pub config: Config,
}

// ---------------------------------------------------------------------------
// RuntimeCtx:
// ---------------------------------------------------------------------------
#[derive(Debug)]
pub struct RuntimeCtx {
    pub parms: Parms,
    pub args: ServerArgs,
}

// ---------------------------------------------------------------------------
// Config:
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub title: String,
    pub description: String,
    pub version: String,
    pub bind_addr: String,
    pub http_port: u16,
    pub log_level: String,
}

impl Config {
    pub fn new() -> Self {
        Config::default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            version: DEFAULT_API_VERSION.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

// ***************************************************************************
//                             Argument Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_server_args:
// ---------------------------------------------------------------------------
/** Get the command line arguments. */
pub fn init_server_args() -> ServerArgs {
    parse_server_args(std::env::args())
}

// ---------------------------------------------------------------------------
// parse_server_args:
// ---------------------------------------------------------------------------
/** Parse an argument list after rewriting single-dash long options such as
 * -port into their double-dash form.  clap exits the process on invalid input.
 */
pub fn parse_server_args<I>(args: I) -> ServerArgs
where
    I: IntoIterator<Item = String>,
{
    ServerArgs::parse_from(args.into_iter().map(normalize_arg))
}

fn normalize_arg(arg: String) -> String {
    if arg.starts_with("--") {
        return arg;
    }
    let Some(opt) = arg.strip_prefix('-') else {
        return arg;
    };
    let name = opt.split('=').next().unwrap_or_default();
    if SINGLE_DASH_LONG_OPTS.contains(&name) {
        format!("-{}", arg)
    } else {
        arg
    }
}

// ***************************************************************************
//                               Log Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_log:
// ---------------------------------------------------------------------------
/** Initialize log4rs logging from the file named on the command line, or
 * programmatically with a console appender when no file was given.
 */
pub fn init_log(args: &ServerArgs, config: &Config) -> Result<()> {
    match &args.log_config {
        Some(file) => {
            let logconfig = get_absolute_path(file);
            if let Err(e) = log4rs::init_file(&logconfig, Default::default()) {
                return Err(anyhow!(Errors::Log4rsInitialization(format!("{}: {}", logconfig, e))));
            }
            info!("Log4rs initialized using: {}", logconfig);
        }
        None => {
            let level = parse_log_level(&config.log_level)?;
            let stdout = ConsoleAppender::builder()
                .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
                .build();
            let logconfig = LogConfig::builder()
                .appender(Appender::builder().build(CONSOLE_APPENDER, Box::new(stdout)))
                .build(Root::builder().appender(CONSOLE_APPENDER).build(level))
                .map_err(|e| anyhow!(Errors::Log4rsInitialization(e.to_string())))?;
            log4rs::init_config(logconfig)
                .map_err(|e| anyhow!(Errors::Log4rsInitialization(e.to_string())))?;
            info!("Log4rs initialized on the console at level {}.", level);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// parse_log_level:
// ---------------------------------------------------------------------------
fn parse_log_level(level: &str) -> Result<LevelFilter> {
    level.parse::<LevelFilter>()
        .map_err(|_| anyhow!(Errors::Log4rsInitialization(format!("invalid log_level: {}", level))))
}

// ***************************************************************************
//                             Parms Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// get_parms:
// ---------------------------------------------------------------------------
/** Retrieve the application parameters from the configuration file named on
 * the command line.  Default values are used when no file is named; a named
 * file that can't be read or parsed is an error.  The port given on the command
 * line always wins.
 */
fn get_parms(args: &ServerArgs) -> Result<Parms> {
    let (config_file, mut config) = match &args.config {
        Some(file) => {
            let config_file_abs = get_absolute_path(file);
            println!("{}", Errors::ReadingConfigFile(config_file_abs.clone()));
            let contents = fs::read_to_string(&config_file_abs).map_err(Errors::IOError)?;
            (Some(config_file_abs.clone()), parse_config(&config_file_abs, &contents)?)
        }
        None => (None, Config::new()),
    };

    if let Some(port) = args.port {
        config.http_port = port;
    }

    Ok(Parms { config_file, config })
}

// ---------------------------------------------------------------------------
// parse_config:
// ---------------------------------------------------------------------------
fn parse_config(config_file: &str, contents: &str) -> Result<Config> {
    match toml::from_str(contents) {
        Ok(c) => Ok(c),
        Err(e) => {
            let msg = format!("{}\n   {}", Errors::TOMLParseError(config_file.to_string()), e);
            error!("{}", msg);
            Err(anyhow!(msg))
        }
    }
}

// ***************************************************************************
//                             Config Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_runtime_context:
// ---------------------------------------------------------------------------
pub fn init_runtime_context(args: ServerArgs) -> Result<RuntimeCtx> {
    let parms = get_parms(&args)?;
    Ok(RuntimeCtx { parms, args })
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> ServerArgs {
        parse_server_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn print_config() {
        println!("{:?}", Config::new());
    }

    #[test]
    fn default_port_is_3000() {
        let ctx = init_runtime_context(args(&["hello_openapi"])).unwrap();
        assert_eq!(ctx.parms.config.http_port, 3000);
        assert_eq!(ctx.parms.config.title, "Basic Example");
        assert!(ctx.parms.config_file.is_none());
    }

    #[test]
    fn single_dash_port() {
        assert_eq!(args(&["hello_openapi", "-port", "8080"]).port, Some(8080));
        assert_eq!(args(&["hello_openapi", "-port=8081"]).port, Some(8081));
        assert_eq!(args(&["hello_openapi", "--port", "8082"]).port, Some(8082));
        assert_eq!(args(&["hello_openapi", "-p", "8083"]).port, Some(8083));
    }

    #[test]
    fn unknown_single_dash_args_untouched() {
        assert_eq!(normalize_arg("-p8080".to_string()), "-p8080");
        assert_eq!(normalize_arg("8080".to_string()), "8080");
        assert_eq!(normalize_arg("-log-config=x.yml".to_string()), "--log-config=x.yml");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = parse_config("test.toml", "http_port = 4000\ntitle = \"Other\"\n").unwrap();
        assert_eq!(config.http_port, 4000);
        assert_eq!(config.title, "Other");
        assert_eq!(config.version, "v1.2.3");
        assert_eq!(config.bind_addr, "0.0.0.0");
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(parse_config("test.toml", "http_port = \"many\"").is_err());
    }

    #[test]
    fn command_line_port_wins() {
        let file = std::env::temp_dir().join(format!("hello_openapi_{}.toml", std::process::id()));
        fs::write(&file, "http_port = 4000\nlog_level = \"debug\"\n").unwrap();
        let path = file.to_string_lossy().to_string();

        let ctx = init_runtime_context(args(&["hello_openapi", "-c", &path])).unwrap();
        assert_eq!(ctx.parms.config.http_port, 4000);
        assert_eq!(ctx.parms.config.log_level, "debug");

        let ctx = init_runtime_context(args(&["hello_openapi", "-c", &path, "-port", "5000"])).unwrap();
        assert_eq!(ctx.parms.config.http_port, 5000);

        fs::remove_file(&file).unwrap();
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let ctx = init_runtime_context(args(&["hello_openapi", "--config", "/nonexistent/hello.toml"]));
        assert!(ctx.is_err());
    }

    #[test]
    fn log_levels() {
        assert_eq!(parse_log_level("debug").unwrap(), LevelFilter::Debug);
        assert!(parse_log_level("chatty").is_err());
    }
}
