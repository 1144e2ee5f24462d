//! Modem conversations on top of the AT transport
//!
//! Everything here blocks the calling task for up to the given timeout.

use defmt::*;
use nodelink_core::config::ServerConfig;
use nodelink_core::traits::Clock;
use nodelink_core::transport::{AtTransport, TransportError};
use nodelink_hal_rp2040::Pl011TxInterrupt;
use nodelink_protocol::socket::{self, OpenError};
use nodelink_protocol::{
    AtCommand, CommandError, FinalResult, IdentityField, ModemIdentity, Response, Terminator,
    TerminatorError,
};

use crate::clock::EmbassyClock;
use crate::link::{RX_SIZE, TX_SIZE};

pub type Transport = AtTransport<'static, RX_SIZE, TX_SIZE, Pl011TxInterrupt, EmbassyClock>;

/// Response capture size
pub const RESPONSE_SIZE: usize = 256;

/// Per-probe timeout while waiting for the modem to answer `AT`
const SYNC_PROBE_MS: u32 = 300;
/// `+QIOPEN` URC can take a while on a cold network attach
const OPEN_TIMEOUT_MS: u32 = 30_000;
/// Data phase of `AT+QISEND`
const SEND_TIMEOUT_MS: u32 = 10_000;

/// Modem conversation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum ModemError {
    Transport(TransportError),
    Command(CommandError),
    Terminator(TerminatorError),
    /// Modem answered with a failure result code
    Rejected(FinalResult),
    /// Socket open URC reported a failure
    Open(OpenError),
    /// Response filled the capture buffer before its final result
    Truncated,
}

impl From<TransportError> for ModemError {
    fn from(e: TransportError) -> Self {
        ModemError::Transport(e)
    }
}

impl From<CommandError> for ModemError {
    fn from(e: CommandError) -> Self {
        ModemError::Command(e)
    }
}

impl From<TerminatorError> for ModemError {
    fn from(e: TerminatorError) -> Self {
        ModemError::Terminator(e)
    }
}

impl From<OpenError> for ModemError {
    fn from(e: OpenError) -> Self {
        ModemError::Open(e)
    }
}

/// Run a command and require a success result
fn exchange<'b>(
    transport: &mut Transport,
    cmd: &AtCommand,
    buf: &'b mut [u8],
    timeout_ms: u32,
    terminator: Terminator,
) -> Result<Response<'b>, ModemError> {
    let len = transport.send_command_with(cmd.as_bytes(), buf, timeout_ms, terminator)?;
    let buf: &'b [u8] = buf;
    let rsp = Response::parse(&buf[..len]);
    if !rsp.is_ok() {
        if len == buf.len() && rsp.result() == FinalResult::Missing {
            return Err(ModemError::Truncated);
        }
        return Err(ModemError::Rejected(rsp.result()));
    }
    Ok(rsp)
}

/// Run a command expecting a standard final result
pub fn command<'b>(
    transport: &mut Transport,
    cmd: &AtCommand,
    buf: &'b mut [u8],
    timeout_ms: u32,
) -> Result<Response<'b>, ModemError> {
    exchange(transport, cmd, buf, timeout_ms, Terminator::final_result())
}

/// Probe with `AT` until the modem answers `OK`
///
/// The `RDY` banner is not awaited: every transaction flushes the RX
/// ring on entry, so an unsolicited banner arriving between commands is
/// dropped anyway. Returns the number of probes sent.
pub fn sync(transport: &mut Transport, boot_timeout_ms: u32) -> Result<u32, ModemError> {
    let at = AtCommand::raw("AT")?;
    let mut clock = EmbassyClock;
    let deadline = clock.now_ms() + boot_timeout_ms as u64;
    let mut buf = [0u8; 64];
    let mut probes = 0;

    loop {
        probes += 1;
        match command(transport, &at, &mut buf, SYNC_PROBE_MS) {
            Ok(_) => {
                let flushed = transport.flushed_on_entry();
                if flushed > 0 {
                    debug!("Discarded {} bytes of boot output", flushed);
                }
                return Ok(probes);
            }
            Err(e) if clock.now_ms() >= deadline => return Err(e),
            Err(e) => trace!("Sync probe {} failed: {}", probes, e),
        }
    }
}

/// Ask the modem for its identification strings
///
/// `ATI` is logged as-is; the individual `AT+G*` answers fill the
/// returned identity. A failed query leaves its field empty.
pub fn identify(transport: &mut Transport, timeout_ms: u32) -> ModemIdentity {
    let mut buf = [0u8; RESPONSE_SIZE];
    let mut identity = ModemIdentity::default();

    match AtCommand::raw("ATI") {
        Ok(ati) => match command(transport, &ati, &mut buf, timeout_ms) {
            Ok(rsp) => {
                for line in rsp.info_lines() {
                    info!("ATI: {=[u8]:a}", line);
                }
            }
            Err(e) => warn!("ATI failed: {}", e),
        },
        Err(e) => warn!("ATI failed: {}", e),
    }

    for field in IdentityField::ALL {
        let cmd = match AtCommand::execute(field.command()) {
            Ok(cmd) => cmd,
            Err(e) => {
                warn!("{} query failed: {}", field, e);
                continue;
            }
        };
        match command(transport, &cmd, &mut buf, timeout_ms) {
            Ok(rsp) => {
                if !identity.record(field, &rsp) {
                    warn!("{} answered without a value", field);
                }
            }
            Err(e) => warn!("{} query failed: {}", field, e),
        }
    }

    identity
}

/// Activate the PDP context and open the TCP socket
pub fn open_socket(
    transport: &mut Transport,
    server: &ServerConfig,
    timeout_ms: u32,
) -> Result<(), ModemError> {
    let mut buf = [0u8; RESPONSE_SIZE];

    let act = socket::activate_context(server.context_id)?;
    if let Err(e) = command(transport, &act, &mut buf, timeout_ms) {
        // Already active is reported as an error too
        debug!("Context activation: {}", e);
    }

    let open = socket::open_tcp(
        server.context_id,
        server.connect_id,
        server.host.as_str(),
        server.port,
    )?;
    // The earlier "OK" line is the final result; the URC follows it
    let rsp = exchange(
        transport,
        &open,
        &mut buf,
        OPEN_TIMEOUT_MS,
        socket::open_terminator()?,
    )?;
    socket::open_result(&rsp, server.connect_id)?;
    Ok(())
}

/// Send one payload on an open socket
pub fn send(
    transport: &mut Transport,
    connect_id: u8,
    payload: &[u8],
    timeout_ms: u32,
) -> Result<(), ModemError> {
    let mut buf = [0u8; 64];

    let announce = socket::send_length(connect_id, payload.len())?;
    exchange(transport, &announce, &mut buf, timeout_ms, Terminator::prompt())?;

    let len = transport.send_command_with(
        payload,
        &mut buf,
        SEND_TIMEOUT_MS,
        Terminator::send_result(),
    )?;
    let rsp = Response::parse(&buf[..len]);
    match rsp.result() {
        FinalResult::SendOk => Ok(()),
        other => Err(ModemError::Rejected(other)),
    }
}

/// Close the socket
pub fn close_socket(
    transport: &mut Transport,
    connect_id: u8,
    timeout_ms: u32,
) -> Result<(), ModemError> {
    let mut buf = [0u8; 64];
    let close = socket::close(connect_id)?;
    command(transport, &close, &mut buf, timeout_ms)?;
    Ok(())
}
