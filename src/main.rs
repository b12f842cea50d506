use log::{error, info};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use cube_explorer::{
    config::Config,
    controller::{Command, LogPresenter},
    data_store::{ConnectionDescriptor, InitDescriptor, LocalDataStore},
    persistence::FileStore,
    Controller,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = Config::new().map_err(|e| {
        error!("Failed to initialize config: {}", e);
        e
    })?;

    let controller = Controller::new(
        Arc::new(LocalDataStore::new()),
        FileStore::new(&config.state_dir),
        LogPresenter,
    )
    .with_timeout(config.query_timeout());

    let (commands, receiver) = mpsc::channel(32);
    let session = tokio::spawn(controller.run(receiver));

    commands
        .send(Command::Connect {
            connection: ConnectionDescriptor::local(config.connection.as_str()),
            init: InitDescriptor {
                metadata: config.metadata_path.clone(),
            },
        })
        .await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" {
            break;
        }
        match line.parse::<Command>() {
            Ok(command) => commands.send(command).await?,
            Err(e) => error!("{}", e),
        }
    }

    drop(commands);
    session.await?;
    info!("Session closed");
    Ok(())
}
