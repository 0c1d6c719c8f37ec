use std::env;
use std::process;

use anyhow::Result;

use multipart_fixture_server::{Server, ServerConfig};

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = match ServerConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };
    log::debug!(
        "Server configuration: bind {}, chunk size {}, parts {:?}",
        config.bind_addr(),
        config.chunk_size,
        config.parts.iter().map(|p| p.name()).collect::<Vec<_>>()
    );

    let server = Server::start_multipart(&config)?;
    server.wait();

    Ok(())
}
