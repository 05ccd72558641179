extern crate pretty_env_logger;

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use clap::{arg, value_parser, ArgMatches, Command};
use ferry_core_lib::{
    data::{requests::RequestBody, ServerInfo, Settings},
    FerryError,
};
use ferry_peer::{
    configuration::ApplicationConfig, connectivity::RequestSender, processing::RequestLog,
    EventSender, Peer, ServerEvent,
};
use tokio::{sync::broadcast, time::timeout};

#[macro_use]
extern crate log;

const REPLY_TIMEOUT: Duration = Duration::from_secs(30);

fn cli() -> Command {
    let remote = || {
        arg!(<remote> "Address of the remote peer, e.g. 192.168.1.20:7777")
            .value_parser(value_parser!(SocketAddr))
    };

    Command::new("ferry")
        .about("Peer-to-peer file transfer")
        .version("1.0")
        .subcommand_required(true)
        .arg(arg!(-c --config <path> "YAML configuration file").default_value("config.yaml"))
        .arg(
            arg!(-p --port <port> "Port to listen on, overrides the configuration")
                .value_parser(value_parser!(u16)),
        )
        .subcommand(Command::new("serve").about("Run a peer until interrupted"))
        .subcommand(Command::new("info").about("Ask a peer who it is").arg(remote()))
        .subcommand(
            Command::new("text")
                .about("Send a text message")
                .arg(remote())
                .arg(arg!(<message> "Text to send")),
        )
        .subcommand(
            Command::new("list")
                .about("List the files a peer offers")
                .arg(remote())
                .arg(arg!([folder] "Remote folder, the peer's transfer folder when omitted")),
        )
        .subcommand(
            Command::new("get")
                .about("Download a file from a peer")
                .arg(remote())
                .arg(arg!(<file> "Name of the remote file"))
                .arg(arg!([folder] "Remote folder")),
        )
        .subcommand(
            Command::new("send")
                .about("Upload a file to a peer")
                .arg(remote())
                .arg(arg!(<path> "Local file").value_parser(value_parser!(PathBuf)))
                .arg(arg!([folder] "Remote folder")),
        )
        .subcommand(
            Command::new("shutdown").about("Stop the peer running on this machine at --port"),
        )
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    let matches = cli().get_matches();

    if let Err(e) = run(&matches).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(matches: &ArgMatches) -> ferry_core_lib::Result<()> {
    let settings = load_settings(matches)?;

    match matches.subcommand() {
        Some(("serve", _)) => serve(settings).await,
        Some(("shutdown", _)) => shutdown_local(settings).await,
        Some((name, sub_matches)) => {
            // Replies arrive on new connections, so client commands run a
            // short-lived peer on an ephemeral port unless one was given.
            let settings = Settings {
                listen_port: matches.get_one::<u16>("port").copied().unwrap_or(0),
                ..settings
            };
            let peer = Peer::start(settings).await?;
            let result = client_command(&peer, name, sub_matches).await;
            drop(peer);
            result
        }
        None => unreachable!(),
    }
}

fn load_settings(matches: &ArgMatches) -> ferry_core_lib::Result<Settings> {
    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("config.yaml");
    let mut settings = ApplicationConfig::build(Path::new(config_path))?.into_settings()?;

    if let Some(port) = matches.get_one::<u16>("port") {
        settings.listen_port = *port;
    }
    Ok(settings)
}

async fn serve(settings: Settings) -> ferry_core_lib::Result<()> {
    let peer = Peer::start(settings).await?;
    let mut events = peer.subscribe();
    info!("Serving as {}", peer.local_server());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                peer.shutdown().await?;
                break;
            }
            event = events.recv() => match event {
                Ok(ServerEvent::InboundTransferPending { transfer_id, file_name, file_size }) => {
                    println!(
                        "Transfer {} offered: {} ({} bytes)",
                        transfer_id, file_name, file_size
                    );
                }
                Ok(ServerEvent::TransferComplete { transfer_id }) => {
                    println!("Transfer {} complete", transfer_id);
                }
                Ok(ServerEvent::TextMessageReceived { remote_server, text }) => {
                    println!("{}: {}", remote_server, text);
                }
                Ok(ServerEvent::ShutdownStarted) => break,
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("Skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    peer.wait().await;
    Ok(())
}

async fn client_command(
    peer: &Peer,
    name: &str,
    matches: &ArgMatches,
) -> ferry_core_lib::Result<()> {
    let address = matches
        .get_one::<SocketAddr>("remote")
        .copied()
        .ok_or_else(|| FerryError::InvalidSetting("remote address is required".to_string()))?;
    let remote = ServerInfo::new(address.ip(), address.port());
    let folder = matches.get_one::<String>("folder").cloned().unwrap_or_default();
    let mut events = peer.subscribe();

    match name {
        "info" => {
            peer.request_server_info(&remote).await?;
            wait_for(&mut events, |event| match event {
                ServerEvent::ServerInfoReceived { remote_server } => {
                    println!(
                        "{} on {}, transfer folder {}",
                        remote_server.name, remote_server.platform, remote_server.transfer_folder
                    );
                    Some(Ok(()))
                }
                _ => None,
            })
            .await
        }
        "text" => {
            let message = matches.get_one::<String>("message").cloned().unwrap_or_default();
            peer.send_text(&remote, &message).await
        }
        "list" => {
            peer.request_file_list(&remote, &folder).await?;
            wait_for(&mut events, |event| match event {
                ServerEvent::FileListReceived { folder, files, .. } => {
                    println!("{}:", folder);
                    for file in files {
                        println!("  {:>12}  {}", file.size, file.name);
                    }
                    Some(Ok(()))
                }
                ServerEvent::RemoteFolderEmpty { folder, .. } => {
                    println!("{} is empty", folder);
                    Some(Ok(()))
                }
                ServerEvent::RemoteFolderMissing { folder, .. } => {
                    Some(Err(FerryError::FolderMissing(folder.clone())))
                }
                _ => None,
            })
            .await
        }
        "get" => {
            let file = matches.get_one::<String>("file").cloned().unwrap_or_default();
            let transfer_id = peer.get_file(&remote, &file, &folder).await?;
            wait_for(&mut events, |event| transfer_finished(event, transfer_id, false)).await?;
            println!("Received {}", file);
            Ok(())
        }
        "send" => {
            let path = matches.get_one::<PathBuf>("path").cloned().unwrap_or_default();
            let transfer_id = peer.send_file(&remote, &path, &folder).await?;
            wait_for(&mut events, |event| transfer_finished(event, transfer_id, true)).await?;
            println!("Sent {}", path.display());
            Ok(())
        }
        _ => unreachable!(),
    }
}

fn transfer_finished(
    event: &ServerEvent,
    transfer_id: u32,
    sending: bool,
) -> Option<ferry_core_lib::Result<()>> {
    match event {
        ServerEvent::TransferProgress {
            transfer_id: id,
            current_bytes,
            file_size,
        } if *id == transfer_id => {
            println!("{} / {} bytes", current_bytes, file_size);
            None
        }
        ServerEvent::TransferComplete { transfer_id: id } if *id == transfer_id && !sending => {
            Some(Ok(()))
        }
        ServerEvent::TransferConfirmed { transfer_id: id } if *id == transfer_id => Some(Ok(())),
        ServerEvent::TransferRejected { transfer_id: id } if *id == transfer_id => {
            Some(Err(FerryError::InvalidSetting("the peer rejected the transfer".to_string())))
        }
        ServerEvent::RemoteFileMissing { transfer_id: id, file_name } if *id == transfer_id => {
            Some(Err(FerryError::RemoteFileMissing(file_name.clone())))
        }
        ServerEvent::TransferStalled {
            transfer_id: id,
            current_bytes,
        } if *id == transfer_id => Some(Err(FerryError::TransferStalled {
            transfer_id,
            bytes_received: *current_bytes,
        })),
        ServerEvent::TransferCancelled { transfer_id: id } if *id == transfer_id => {
            Some(Err(FerryError::Cancelled))
        }
        _ => None,
    }
}

async fn wait_for<F>(
    events: &mut broadcast::Receiver<ServerEvent>,
    mut done: F,
) -> ferry_core_lib::Result<()>
where
    F: FnMut(&ServerEvent) -> Option<ferry_core_lib::Result<()>>,
{
    let waited = timeout(REPLY_TIMEOUT, async {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(result) = done(&event) {
                        return result;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return Err(FerryError::Cancelled),
            }
        }
    })
    .await;

    waited.unwrap_or(Err(FerryError::Cancelled))
}

/// Sends the shutdown command to the peer on this machine at the configured
/// port, claiming that peer's own identity.
async fn shutdown_local(settings: Settings) -> ferry_core_lib::Result<()> {
    let local_server = ferry_peer::PeerContext::local_server_for(&settings, settings.listen_port);
    let sender = RequestSender::new(
        local_server.clone(),
        settings.socket_timeout,
        RequestLog::new(),
        EventSender::new(8),
    );

    sender
        .send(&local_server, RequestBody::ShutdownServerCommand)
        .await?;
    println!("Shutdown sent to {}", local_server.session_address());
    Ok(())
}
