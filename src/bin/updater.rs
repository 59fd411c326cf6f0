use anyhow::{anyhow, bail};
use clap::Parser;
use kodi_updater::common::{error, info};
use kodi_updater::config::config_updater::{CliUpdater, CommandsUpdater, ConfigUpdater};
use kodi_updater::updater::{BusyGate, UpdateListener, Updater};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

enum Event {
    CheckFinished(String),
    Progress { is_error: bool, percent: u8, message: String },
}

struct ChannelListener {
    sender: Mutex<Sender<Event>>,
}

impl UpdateListener for ChannelListener {
    fn on_check_for_update_finished(&self, message: &str) {
        if let Ok(sender) = self.sender.lock() {
            let _ = sender.send(Event::CheckFinished(message.to_string()));
        }
    }

    fn on_update_progress(&self, is_error: bool, percent: u8, message: &str) {
        if let Ok(sender) = self.sender.lock() {
            let _ = sender.send(Event::Progress { is_error, percent, message: message.to_string() });
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = CliUpdater::parse();
    let config = ConfigUpdater::load(&cli.config)?;

    let (sender, receiver) = channel();
    let updater = Updater::from_config(&config, Arc::new(BusyGate::default()))?
        .with_listener(Arc::new(ChannelListener { sender: Mutex::new(sender) }));

    match cli.command {
        CommandsUpdater::Check(_) => {
            updater.check_for_update(true);
            wait_for_check(&receiver)?;
            if let Some(artifact) = updater.latest_artifact() {
                info(&format!(
                    "Latest artifact: {} {}",
                    artifact.version.unwrap_or_default(),
                    artifact.url.unwrap_or_default()
                ));
            }
            Ok(())
        }
        CommandsUpdater::Update(update) => {
            let handle = updater.download_and_install(&update.current_version);
            let result = wait_for_update(&receiver);
            handle.join().map_err(|_| anyhow!("Update thread panicked"))?;
            result
        }
    }
}

fn wait_for_check(receiver: &Receiver<Event>) -> anyhow::Result<()> {
    loop {
        if let Event::CheckFinished(message) = receiver.recv()? {
            return if message.starts_with("Update-Check-Error") {
                error(&message);
                bail!(message)
            } else {
                info(&message);
                Ok(())
            };
        }
    }
}

fn wait_for_update(receiver: &Receiver<Event>) -> anyhow::Result<()> {
    loop {
        match receiver.recv()? {
            Event::CheckFinished(message) => info(&message),
            Event::Progress { is_error: true, message, .. } => {
                error(&message);
                bail!(message)
            }
            Event::Progress { percent: 100, message, .. } => {
                info(&format!("[100%] {message}"));
                return Ok(());
            }
            Event::Progress { percent, message, .. } => info(&format!("[{percent:>3}%] {message}")),
        }
    }
}
