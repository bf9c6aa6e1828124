//! Parley line client.
//!
//! # Usage
//!
//! ```bash
//! # Everything in-process, with a slow assistant
//! parley --ai-delay-ms 3000
//!
//! # Metadata and history from a real server
//! parley --api-base https://chat.example.com --token "$TOKEN" --room 66aa00000000000000000001
//! ```

use std::{
    error::Error,
    io::{self, Write},
    time::Duration,
};

use clap::Parser;
use parley_app::{
    ChannelTransport, HttpConfig, HttpRoomApi, Notice, RoomApi, Runtime, RuntimeConfig,
    SessionContext, SystemEnv, TransportEvent, local::LocalBackend,
};
use parley_cli::{Input, Renderer, command::HELP};
use parley_core::{Room, RoomId, SessionConfig, SessionSnapshot};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{
        broadcast::{self, error::RecvError},
        mpsc, watch,
    },
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Frames buffered between the transport and the runtime.
const PUSH_CAPACITY: usize = 64;

/// Parley chat client
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "Line-oriented client for Parley chat rooms")]
#[command(version)]
struct Args {
    /// REST origin for room metadata and history
    ///
    /// If not provided, an in-process server answers instead. The live
    /// stream is always served in-process.
    #[arg(long)]
    api_base: Option<String>,

    /// Bearer token for the session
    #[arg(long, default_value = "demo")]
    token: String,

    /// Display name used by the in-process server
    #[arg(long, default_value = "you")]
    user: String,

    /// Room to open on start
    #[arg(long)]
    room: Option<String>,

    /// Artificial delay before every metadata/history fetch
    #[arg(long, default_value = "0")]
    fetch_delay_ms: u64,

    /// Delay before the in-process assistant answers
    #[arg(long, default_value = "1500")]
    ai_delay_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // stdout belongs to the chat transcript.
    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let initial = args.room.map(RoomId::new).transpose()?;
    let fetch_delay = Duration::from_millis(args.fetch_delay_ms);

    let backend = LocalBackend::new().with_room(Room {
        id: RoomId::new("66aa00000000000000000001")?,
        display_name: "Rustaceans".into(),
        picture_ref: None,
        member_count: 3,
        is_ai: false,
    });
    let server = backend.spawn_server(&args.user, Duration::from_millis(args.ai_delay_ms));
    let (transport, pushes) = server.connect(PUSH_CAPACITY);
    let context = SessionContext::logged_in(args.token);

    let context = match args.api_base {
        Some(base_url) => {
            tracing::info!(%base_url, "using HTTP room API");
            let api = HttpRoomApi::new(&HttpConfig { base_url, fetch_delay })?;
            session(api, transport, pushes, context, initial).await?
        },
        None => session(backend.api(fetch_delay), transport, pushes, context, initial).await?,
    };

    tracing::info!(authenticated = context.is_authenticated(), "session ended");
    Ok(())
}

async fn session<A: RoomApi>(
    api: A,
    transport: ChannelTransport,
    pushes: mpsc::Receiver<TransportEvent>,
    context: SessionContext,
    initial: Option<RoomId>,
) -> Result<SessionContext, Box<dyn Error>> {
    let (runtime, handle) = Runtime::new(
        SystemEnv::new(),
        api,
        transport,
        pushes,
        context,
        SessionConfig::default(),
        &RuntimeConfig::default(),
    )?;
    let runtime = tokio::spawn(runtime.run());
    let view = tokio::spawn(view(handle.watch(), handle.notices()));

    write_lines([HELP])?;
    if let Some(room_id) = initial {
        handle.select_room(room_id).await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Input::parse(&line) {
            Ok(Input::Room(room_id)) => handle.select_room(room_id).await?,
            Ok(Input::Say(text)) => handle.send_message(text).await?,
            Ok(Input::Help) => write_lines([HELP])?,
            Ok(Input::Logout) => break,
            Err(e) => write_lines([e.to_string()])?,
        }
    }

    handle.logout().await?;
    let context = runtime.await?;
    view.abort();
    Ok(context)
}

/// Print snapshot changes and restored drafts until the runtime goes away.
async fn view(
    mut snapshots: watch::Receiver<SessionSnapshot>,
    mut notices: broadcast::Receiver<Notice>,
) -> io::Result<()> {
    let mut renderer = Renderer::new();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                write_lines(renderer.lines(&snapshot))?;
            },
            notice = notices.recv() => match notice {
                Ok(Notice::RestoreInput(text)) => write_lines([format!("(not sent: {text})")])?,
                // Errors surface through the snapshot status.
                Ok(Notice::ClearInput | Notice::Error(_)) => {},
                Err(RecvError::Lagged(skipped)) => tracing::debug!(skipped, "notices lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    Ok(())
}

fn write_lines<I>(lines: I) -> io::Result<()>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut out = io::stdout().lock();
    for line in lines {
        writeln!(out, "{}", line.as_ref())?;
    }
    out.flush()
}
