use log::{info, warn};

use super::at;
use super::command::{CommandDriver, Response, ResponseClass};
use super::error::ModemError;
use super::transport::ModemTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModemState {
    Ready,
    /// The wake probe went unanswered even after clearing a stuck prompt.
    Unreachable,
}

/// Brings the modem into the configuration the poller relies on.
///
/// Only the wake probe is fatal. Every later step is attempted regardless of
/// how the previous one went.
pub async fn initialize<T: ModemTransport>(
    driver: &mut CommandDriver<T>,
) -> Result<ModemState, ModemError> {
    if !wake(driver).await? {
        warn!("Modem did not answer the wake probe");
        return Ok(ModemState::Unreachable);
    }
    info!("Modem is awake");

    step(driver, "new message notifications", at::NOTIFY_ON_STORE).await?;
    step(driver, "message storage", at::SELECT_STORAGE).await?;
    step(driver, "save settings", at::SAVE_SETTINGS).await?;

    let purge = driver.send(at::DELETE_ALL).await?;
    let purged = purge.is_acknowledged() || purge.class == ResponseClass::Prompt;
    if purged {
        info!("Modem init: stored messages purged");
    } else {
        warn!("Modem init: purge not acknowledged ({})", purge.class);
    }

    step(driver, "message storage", at::SELECT_STORAGE).await?;
    if purged {
        step(driver, "text mode", at::TEXT_MODE).await?;
    } else {
        warn!("Modem init: leaving message format unchanged");
    }

    Ok(ModemState::Ready)
}

async fn wake<T: ModemTransport>(driver: &mut CommandDriver<T>) -> Result<bool, ModemError> {
    let reply = driver.send(at::WAKE).await?;
    if reply.is_acknowledged() {
        return Ok(true);
    }

    // A previous session may have died halfway through AT+CMGS, leaving the
    // modem at its text prompt. Finish that message so it accepts commands.
    warn!(
        "Wake probe answered with {}, closing any pending message prompt",
        reply.class
    );
    driver.write_raw(&at::abort_sequence())?;
    driver.settle().await;
    let closed = driver.read_available()?;
    log::debug!("Prompt abort reply: {}", closed.class);

    let retry = driver.send(at::WAKE).await?;
    Ok(retry.is_acknowledged())
}

async fn step<T: ModemTransport>(
    driver: &mut CommandDriver<T>,
    name: &str,
    command: &[u8],
) -> Result<Response, ModemError> {
    let reply = driver.send(command).await?;
    if reply.is_acknowledged() {
        info!("Modem init: {} ok", name);
    } else {
        warn!("Modem init: {} failed ({})", name, reply.class);
    }
    Ok(reply)
}
