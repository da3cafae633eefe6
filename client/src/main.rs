use clap::Parser;
use client::network::{BoxError, Client};
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// WebSocket URL of the game server
    #[arg(short, long, env = "SERVER_URL", default_value = "ws://127.0.0.1:3000/ws")]
    url: String,

    /// Steer the assigned paddle towards the ball
    #[arg(short, long)]
    autopilot: bool,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    info!("Starting client...");
    if args.autopilot {
        info!("Autopilot enabled");
    }

    let mut client = Client::new(&args.url, args.autopilot);

    tokio::select! {
        result = client.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, exiting");
        }
    }

    Ok(())
}
