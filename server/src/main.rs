use clap::Parser;
use log::{error, info};
use server::config::ServerConfig;
use server::network::{BoxError, Server};
use shared::GameConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port serving both the WebSocket endpoint and static assets
    #[arg(short, long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Directory of static client assets
    #[arg(short, long, env = "STATIC_DIR", default_value = "public")]
    static_dir: PathBuf,

    /// Simulation ticks per second
    #[arg(short, long, env = "TICK_RATE", default_value = "60")]
    tick_rate: u32,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            host: self.host,
            port: self.port,
            static_dir: self.static_dir,
            game: GameConfig {
                tick_rate: self.tick_rate,
                ..GameConfig::default()
            },
        }
    }
}

/// Logs panics from any task; tokio keeps the rest of the server running.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        error!("Unhandled fault: {}\n{}", info, backtrace);
    }));
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    install_panic_hook();

    let config = Args::parse().into_config();

    info!("Starting paddle server...");
    let server = Server::bind(config).await?;
    info!("Waiting for players...");

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_arguments_override_defaults() {
        let args = Args::try_parse_from([
            "server", "-H", "127.0.0.1", "-p", "4000", "-s", "assets", "-t", "30",
        ])
        .unwrap();
        let config = args.into_config();

        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:4000");
        assert_eq!(config.static_dir, PathBuf::from("assets"));
        assert_eq!(config.game.tick_rate, 30);
        assert_eq!(config.game.width, GameConfig::default().width);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(Args::try_parse_from(["server", "--port", "70000"]).is_err());
    }
}
