use std::sync::Arc;

use anyhow::{Context, Result};
use bank_browser::{
    init_tracing, AlertSink, AppConfig, BrowserEvent, BrowserSession, HeadlessMap, MarkerHandle,
    PopupView, RemoteServices,
};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::info;

struct ConsolePopup;

impl PopupView for ConsolePopup {
    fn open(&self, anchor: Option<MarkerHandle>, html: &str) {
        match anchor {
            Some(marker) => println!("[popup @ marker {}] {html}", marker.0),
            None => println!("[popup] {html}"),
        }
    }

    fn set_content(&self, html: &str) {
        println!("[popup] {html}");
    }

    fn close(&self) {
        println!("[popup closed]");
    }
}

struct ConsoleAlerts;

impl AlertSink for ConsoleAlerts {
    fn alert(&self, message: &str) {
        eprintln!("ALERT: {message}");
    }
}

const HELP: &str = "commands: filter <text> | clear | toggle | list | select <n> | close | quit";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let config = AppConfig::from_env();
    info!(profile = ?config.public_profile(), "starting bank browser");

    let remote = RemoteServices::from_config(&config).context("configuring remote services")?;
    let map = Arc::new(HeadlessMap::new());
    let mut session = BrowserSession::bootstrap(
        config,
        remote,
        map.clone(),
        Arc::new(ConsolePopup),
        Arc::new(ConsoleAlerts),
    )
    .await
    .context("loading nearby places")?;

    session
        .browser_mut()
        .subscribe(Arc::new(|event: &BrowserEvent| match event {
            BrowserEvent::FilterChanged { filter, visible } => {
                println!("filter {filter:?}: {} visible", visible.len());
            }
            BrowserEvent::SidebarToggled { open } => {
                println!("sidebar {}", if *open { "open" } else { "closed" });
            }
        }));

    println!("{HELP}");
    print_list(&session);

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let line = line.trim();
        let (command, argument) = line.split_once(' ').unwrap_or((line, ""));
        match command {
            "" => {}
            "filter" => {
                session.browser_mut().set_filter(argument);
                print_list(&session);
            }
            "clear" => {
                session.browser_mut().set_filter("");
                print_list(&session);
            }
            "toggle" => {
                session.browser_mut().toggle_sidebar();
            }
            "list" => print_list(&session),
            "select" => {
                let visible = session.browser().visible_places();
                match argument.trim().parse::<usize>().ok().and_then(|i| visible.get(i)) {
                    // runs detached; updates print as they arrive
                    Some(place) => drop(session.browser().select_place(&place.id)),
                    None => println!("no visible place at {argument:?}"),
                }
            }
            "close" => session.browser().resolver().close(),
            "quit" | "exit" => break,
            _ => println!("{HELP}"),
        }
    }

    info!(visible_markers = map.visible_marker_count(), "bank browser exiting");
    Ok(())
}

fn print_list(session: &BrowserSession) {
    for (index, place) in session.browser().visible_places().iter().enumerate() {
        println!("{index:>3}  {}", place.name);
    }
}
