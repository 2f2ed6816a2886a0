//! Connection façade: the public surface this crate builds everything
//! else to support.
//!
//! [`Connection`] combines [`crate::state::HandshakeMachine`],
//! [`crate::engine::Engine`], [`crate::composer::Composer`] and
//! [`crate::network::Network`] behind one sans-IO object: feed it
//! inbound lines, call its lifecycle methods, and it hands back the
//! commands to write to the wire. It owns no socket — the reference
//! runtime for driving one is a `tokio::select!` loop over a transport's
//! read half, the pending-write queue, and the reconnect timer, as
//! described for the façade's concurrency model; that loop is an
//! embedding detail outside this crate.
//!
//! Grounded on `original_source/include/IrcCore/ircconnection.h` and
//! `original_source/src/core/ircconnection.cpp` for the configuration
//! fields, the status transition table, the reconnect-timer rule, and
//! the send/receive pipelines.

use std::collections::VecDeque;

use crate::command::Command;
use crate::composer::{ComposedMessage, Composer};
use crate::engine::Engine;
use crate::filter::FilterChain;
use crate::message::{Message, MessageRef};
use crate::network::{Network, NetworkChange};
use crate::state::{HandshakeAction, HandshakeConfig, HandshakeError, HandshakeMachine, SaslCredentials};

/// Capabilities requested by default when none are explicitly configured.
const DEFAULT_REQUEST_CAPS: &[&str] = &[
    "multi-prefix",
    "server-time",
    "message-tags",
    "account-notify",
    "away-notify",
    "extended-join",
    "cap-notify",
    "chghost",
    "userhost-in-names",
    "echo-message",
];

/// Current schema version of [`PersistedState`].
pub const PERSISTENCE_VERSION: u32 = 1;

/// Errors a [`Connection`] can report. All are non-panic, recoverable
/// conditions; none of them tear down the session on their own.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// `open()` was attempted with one of `host`/`userName`/`nickName`/
    /// `realName` empty.
    #[error("configuration is missing a required field (host, userName, nickName, or realName)")]
    InvalidConfiguration,
    /// `open()` was attempted while [`Configuration::enabled`] is `false`.
    #[error("connection is disabled")]
    Disabled,
    /// `restore_state` was given a record from an incompatible schema version.
    #[error("persisted state version {found} does not match the current version {expected}")]
    VersionMismatch { found: u32, expected: u32 },
    /// `restore_state` was called while the connection is active.
    #[error("cannot restore state while the connection is active")]
    RestoreWhileActive,
}

/// Immutable-while-active connection configuration.
///
/// Invariant: [`Connection::open`] only proceeds when `host`,
/// `user_name`, `nick_name`, and `real_name` are all non-empty.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Configuration {
    /// Server hostname or address.
    pub host: String,
    /// Server port. Defaults to 6667.
    pub port: u16,
    /// Ident username sent in `USER`.
    pub user_name: String,
    /// Desired nickname.
    pub nick_name: String,
    /// Real name / GECOS sent in `USER`.
    pub real_name: String,
    /// Server password (`PASS`), and reused as the SASL PLAIN password
    /// when `sasl_mechanism` is set.
    pub password: Option<String>,
    /// Caller-facing display name; purely descriptive, not sent on the wire.
    pub display_name: Option<String>,
    /// Whether to use a TLS transport.
    pub secure: bool,
    /// SASL mechanism to use: empty/`None` or `"PLAIN"`.
    pub sasl_mechanism: Option<String>,
    /// Fallback decode encoding label (e.g. `"ISO-8859-15"`).
    pub encoding: String,
    /// Reconnect delay in seconds. `0` disables automatic reconnect.
    pub reconnect_delay_seconds: u32,
    /// Whether `open()` is permitted to do anything at all.
    pub enabled: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 6667,
            user_name: String::new(),
            nick_name: String::new(),
            real_name: String::new(),
            password: None,
            display_name: None,
            secure: false,
            sasl_mechanism: None,
            encoding: "UTF-8".to_string(),
            reconnect_delay_seconds: 0,
            enabled: true,
        }
    }
}

impl Configuration {
    /// `true` iff `host`, `user_name`, `nick_name`, and `real_name` are
    /// all non-empty — the precondition [`Connection::open`] checks.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.host.is_empty()
            && !self.user_name.is_empty()
            && !self.nick_name.is_empty()
            && !self.real_name.is_empty()
    }
}

/// Connection lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectionStatus {
    /// Never opened, or opened and then fully closed without error.
    Inactive,
    /// Waiting for the reconnect timer to fire.
    Waiting,
    /// Transport is being established or the handshake is in progress.
    Connecting,
    /// Registered (`001` received).
    Connected,
    /// `close()` was called; tearing down.
    Closing,
    /// Closed after a prior open.
    Closed,
    /// Stopped due to a transport or protocol error.
    Error,
}

impl ConnectionStatus {
    /// `true` for `Connecting`, `Connected`, or `Closing`.
    #[must_use]
    pub fn active(self) -> bool {
        matches!(self, Self::Connecting | Self::Connected | Self::Closing)
    }

    /// `true` iff `Connected`.
    #[must_use]
    pub fn connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Edge notifications a [`Connection`] produces as a side effect of
/// `open`/`close`/`receive_line`, mirroring the donor's Qt signals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Status changed to `Connecting`.
    Connecting,
    /// Status changed to `Connected` (Welcome received).
    Connected,
    /// The session ended (transport closed).
    Disconnected,
    /// Status changed, carrying the new value.
    StatusChanged(ConnectionStatus),
    /// A transport-level error occurred.
    SocketError(String),
    /// The configured nickname was rejected before registration; carries
    /// the rejected nick. The caller's nick-collision hook (installed on
    /// the underlying [`Engine`]) decides the replacement, if any.
    NickNameReserved {
        /// The nickname the server rejected.
        rejected: String,
    },
}

/// The connection's serializable state (§6.5): a versioned snapshot of
/// [`Configuration`], independent of live session state.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PersistedState {
    /// Schema version this record was written with.
    pub version: u32,
    pub host: String,
    pub port: u16,
    pub user_name: String,
    pub nick_name: String,
    pub real_name: String,
    pub password: Option<String>,
    pub display_name: Option<String>,
    pub encoding: String,
    pub enabled: bool,
    pub reconnect_delay_seconds: u32,
    pub secure: bool,
    pub sasl_mechanism: Option<String>,
}

/// Outcome of feeding one inbound message through [`Connection::receive`].
#[derive(Debug, Default)]
pub struct ReceiveOutcome {
    /// `true` if an installed inbound filter consumed the message (in
    /// which case no composed message or observer notification follows).
    pub consumed: bool,
    /// The composed multi-line message this inbound message completed, if any.
    pub composed: Option<ComposedMessage>,
    /// Commands the engine/handshake machine produced in response
    /// (e.g. `PONG`, a CTCP reply, `CAP END`/`NICK`/`USER`).
    pub commands: Vec<Command>,
    /// Network Info changes observed (`RPL_ISUPPORT` absorption or
    /// post-Welcome `CAP NEW`/`DEL`).
    pub network_change: Option<NetworkChange>,
    /// Edge notifications produced by this message.
    pub events: Vec<ConnectionEvent>,
}

/// The connection façade.
pub struct Connection {
    config: Configuration,
    status: ConnectionStatus,
    sent_quit: bool,
    reconnect_armed: bool,
    current_nick: String,
    handshake: HandshakeMachine,
    engine: Engine,
    composer: Composer,
    network: Network,
    pending: VecDeque<Command>,
    inbound_filters: FilterChain<Message>,
    outbound_filters: FilterChain<Command>,
}

impl Connection {
    /// Create a new, inactive connection for `config`.
    #[must_use]
    pub fn new(config: Configuration) -> Self {
        let nick = config.nick_name.clone();
        let handshake = HandshakeMachine::new(Self::handshake_config(&config));
        Self {
            config,
            status: ConnectionStatus::Inactive,
            sent_quit: false,
            reconnect_armed: false,
            current_nick: nick,
            handshake,
            engine: Engine::new(),
            composer: Composer::new(),
            network: Network::new(),
            pending: VecDeque::new(),
            inbound_filters: FilterChain::new(),
            outbound_filters: FilterChain::new(),
        }
    }

    fn handshake_config(config: &Configuration) -> HandshakeConfig {
        let mut caps: Vec<String> = DEFAULT_REQUEST_CAPS.iter().map(|s| s.to_string()).collect();
        let sasl_credentials = if config.sasl_mechanism.as_deref() == Some("PLAIN") {
            caps.push("sasl".to_string());
            Some(SaslCredentials {
                account: config.user_name.clone(),
                password: config.password.clone().unwrap_or_default(),
            })
        } else {
            None
        };
        HandshakeConfig {
            nickname: config.nick_name.clone(),
            username: config.user_name.clone(),
            realname: config.real_name.clone(),
            password: config.password.clone(),
            request_caps: caps,
            sasl_credentials,
        }
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// `true` for `Connecting`/`Connected`/`Closing`.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.active()
    }

    /// `true` iff `Connected`.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status.connected()
    }

    /// The current nickname, tracked as `NICK` confirmations for this
    /// session's own nick arrive.
    #[must_use]
    pub fn current_nick(&self) -> &str {
        &self.current_nick
    }

    /// Read-only view over the session's ISUPPORT/capability state.
    #[must_use]
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Install an inbound message filter. Runs LIFO (most recently
    /// installed first) ahead of observer dispatch.
    pub fn install_message_filter(&mut self, filter: crate::filter::Filter<Message>) -> crate::filter::FilterId {
        self.inbound_filters.install(filter)
    }

    /// Remove a previously installed inbound message filter.
    pub fn remove_message_filter(&mut self, id: crate::filter::FilterId) {
        self.inbound_filters.remove(id);
    }

    /// Install an outbound command filter. Runs LIFO ahead of encoding.
    pub fn install_command_filter(&mut self, filter: crate::filter::Filter<Command>) -> crate::filter::FilterId {
        self.outbound_filters.install(filter)
    }

    /// Remove a previously installed outbound command filter.
    pub fn remove_command_filter(&mut self, id: crate::filter::FilterId) {
        self.outbound_filters.remove(id);
    }

    /// Install a CTCP reply policy, overriding the engine's default table.
    pub fn set_ctcp_reply_hook(&mut self, hook: crate::engine::CtcpReplyHook) {
        self.engine.set_ctcp_reply_hook(hook);
    }

    /// Install a nick-collision hook, invoked on `433`/`436` before Welcome.
    pub fn set_nick_collision_hook(&mut self, hook: crate::engine::NickCollisionHook) {
        self.engine.set_nick_collision_hook(hook);
    }

    /// Begin (re)connecting.
    ///
    /// No-ops (returns an empty command list) unless `status` is
    /// `Inactive`, `Closed`, or `Error`, `config.enabled` is `true`, and
    /// `config` is valid. On success, transitions to `Connecting`,
    /// disarms the reconnect timer, and returns the initial handshake
    /// commands (`PASS` if set, then `CAP LS`).
    pub fn open(&mut self) -> Result<Vec<Command>, ConnectionError> {
        if !self.config.enabled {
            return Err(ConnectionError::Disabled);
        }
        if !self.config.is_valid() {
            return Err(ConnectionError::InvalidConfiguration);
        }
        if !matches!(
            self.status,
            ConnectionStatus::Inactive | ConnectionStatus::Closed | ConnectionStatus::Error
        ) {
            return Ok(Vec::new());
        }

        self.reconnect_armed = false;
        self.sent_quit = false;
        self.current_nick = self.config.nick_name.clone();
        self.handshake = HandshakeMachine::new(Self::handshake_config(&self.config));
        self.engine = Engine::new();
        self.composer = Composer::new();
        self.set_status(ConnectionStatus::Connecting);

        Ok(self
            .handshake
            .start()
            .into_iter()
            .filter_map(Self::command_from_action)
            .collect())
    }

    /// Close the connection immediately. Disarms the reconnect timer and
    /// synchronously transitions to `Closing` then `Closed`. A no-op if
    /// the connection is not active.
    pub fn close(&mut self) -> Vec<ConnectionEvent> {
        if !self.status.active() {
            return Vec::new();
        }
        self.reconnect_armed = false;
        let mut events = vec![self.set_status(ConnectionStatus::Closing)];
        events.push(self.set_status(ConnectionStatus::Closed));
        events.push(ConnectionEvent::Disconnected);
        events
    }

    /// Send a `QUIT` through the normal send pipeline and mark this
    /// session as quit-initiated, so a subsequent transport disconnect
    /// is treated as a clean close rather than an error.
    pub fn quit(&mut self, reason: Option<String>) -> bool {
        self.sent_quit = true;
        self.send(Command::QUIT(reason))
    }

    /// Report that the transport has disconnected.
    ///
    /// `socket_error` carries a transport error description if the
    /// disconnect was not the expected result of `quit()`/`close()`.
    /// Arms the reconnect timer when appropriate per the status table.
    pub fn notify_disconnected(&mut self, socket_error: Option<String>) -> Vec<ConnectionEvent> {
        let mut events = Vec::new();
        if let Some(err) = socket_error {
            events.push(self.set_status(ConnectionStatus::Error));
            events.push(ConnectionEvent::SocketError(err));
            if self.config.reconnect_delay_seconds > 0 && self.config.enabled && !self.sent_quit {
                self.reconnect_armed = true;
                events.push(self.set_status(ConnectionStatus::Waiting));
            }
        } else {
            events.push(self.set_status(ConnectionStatus::Closed));
        }
        events.push(ConnectionEvent::Disconnected);
        events
    }

    /// `true` if the reconnect timer is armed and due to fire; the
    /// caller drives the actual `tokio::time::sleep` and calls
    /// [`Connection::open`] when it elapses.
    #[must_use]
    pub fn reconnect_armed(&self) -> bool {
        self.reconnect_armed
    }

    fn set_status(&mut self, status: ConnectionStatus) -> ConnectionEvent {
        self.status = status;
        match status {
            ConnectionStatus::Connecting => ConnectionEvent::Connecting,
            ConnectionStatus::Connected => ConnectionEvent::Connected,
            _ => ConnectionEvent::StatusChanged(status),
        }
    }

    fn command_from_action(action: HandshakeAction) -> Option<Command> {
        match action {
            HandshakeAction::Send(msg) => Some(msg.command),
            HandshakeAction::Complete | HandshakeAction::Error(_) => None,
        }
    }

    /// Send pipeline (§4.7) for a user-issued command:
    /// 1. Run outbound filters LIFO; a consumed command is dropped.
    /// 2. If not active, enqueue in the pending queue and return `false`.
    /// 3. Otherwise return `true`: the caller encodes and writes it.
    pub fn send(&mut self, command: Command) -> bool {
        if self.outbound_filters.run(&command) {
            return false;
        }
        if !self.status.active() {
            self.pending.push_back(command);
            return false;
        }
        true
    }

    /// Feed one already-decoded inbound message through the connection.
    ///
    /// Applies the receive pipeline (§4.7): the handshake machine and
    /// engine adjust session state, inbound filters run LIFO, then the
    /// composer is offered the message.
    pub fn receive(&mut self, msg: Message) -> ReceiveOutcome {
        let mut outcome = ReceiveOutcome::default();

        if !self.status.connected() {
            if let Ok(msg_ref) = MessageRef::parse(&msg.to_string()) {
                for action in self.handshake.feed(&msg_ref) {
                    match action {
                        HandshakeAction::Send(sent) => outcome.commands.push(sent.command),
                        HandshakeAction::Complete => {
                            outcome.events.push(self.set_status(ConnectionStatus::Connected));
                            while let Some(cmd) = self.pending.pop_front() {
                                outcome.commands.push(cmd);
                            }
                        }
                        HandshakeAction::Error(HandshakeError::NicknameInUse(nick)) => {
                            outcome.events.push(ConnectionEvent::NickNameReserved {
                                rejected: nick,
                            });
                        }
                        HandshakeAction::Error(HandshakeError::ServerError(_)) => {
                            outcome.events.push(self.set_status(ConnectionStatus::Error));
                        }
                        HandshakeAction::Error(_) => {}
                    }
                }
            }
        }

        let engine_out = self.engine.feed(&msg, &self.current_nick);
        outcome.commands.extend(engine_out.commands);
        if let Some(change) = engine_out.cap_change {
            let mut net_change = NetworkChange::default();
            if !change.added.is_empty() {
                net_change = self.network.activate_capabilities(change.added);
            }
            if !change.removed.is_empty() {
                let removed: Vec<&str> = change.removed.iter().map(String::as_str).collect();
                let c = self.network.deactivate_capabilities(removed);
                net_change.capabilities |= c.capabilities;
            }
            outcome.network_change = Some(net_change);
        }

        if let Command::NICK(new_nick) = &msg.command {
            if msg
                .source_nickname()
                .is_some_and(|n| n.eq_ignore_ascii_case(&self.current_nick))
            {
                self.current_nick = new_nick.clone();
            }
        }

        if let Some(isupport) = crate::isupport::Isupport::from_message(&msg) {
            let change = self.network.absorb_isupport(&isupport);
            outcome.network_change = Some(match outcome.network_change.take() {
                Some(mut existing) => {
                    existing.name |= change.name;
                    existing.modes |= change.modes;
                    existing.prefixes |= change.prefixes;
                    existing.channel_types |= change.channel_types;
                    existing.capabilities |= change.capabilities;
                    existing
                }
                None => change,
            });
        }

        if self.inbound_filters.run(&msg) {
            outcome.consumed = true;
            return outcome;
        }

        outcome.composed = self.composer.feed(&msg);
        outcome
    }

    /// Snapshot the connection's persistable configuration.
    #[must_use]
    pub fn save_state(&self) -> PersistedState {
        PersistedState {
            version: PERSISTENCE_VERSION,
            host: self.config.host.clone(),
            port: self.config.port,
            user_name: self.config.user_name.clone(),
            nick_name: self.config.nick_name.clone(),
            real_name: self.config.real_name.clone(),
            password: self.config.password.clone(),
            display_name: self.config.display_name.clone(),
            encoding: self.config.encoding.clone(),
            enabled: self.config.enabled,
            reconnect_delay_seconds: self.config.reconnect_delay_seconds,
            secure: self.config.secure,
            sasl_mechanism: self.config.sasl_mechanism.clone(),
        }
    }

    /// Restore configuration from a previously saved state.
    ///
    /// Refused (without changing anything) if `state.version` doesn't
    /// match [`PERSISTENCE_VERSION`] or the connection is currently active.
    pub fn restore_state(&mut self, state: PersistedState) -> Result<(), ConnectionError> {
        if state.version != PERSISTENCE_VERSION {
            return Err(ConnectionError::VersionMismatch {
                found: state.version,
                expected: PERSISTENCE_VERSION,
            });
        }
        if self.status.active() {
            return Err(ConnectionError::RestoreWhileActive);
        }
        self.config = Configuration {
            host: state.host,
            port: state.port,
            user_name: state.user_name,
            nick_name: state.nick_name,
            real_name: state.real_name,
            password: state.password,
            display_name: state.display_name,
            secure: state.secure,
            sasl_mechanism: state.sasl_mechanism,
            encoding: state.encoding,
            reconnect_delay_seconds: state.reconnect_delay_seconds,
            enabled: state.enabled,
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Configuration {
        Configuration {
            host: "irc.example.org".to_string(),
            user_name: "bot".to_string(),
            nick_name: "botty".to_string(),
            real_name: "Bot".to_string(),
            ..Configuration::default()
        }
    }

    fn msg(raw: &str) -> Message {
        raw.parse().unwrap()
    }

    #[test]
    fn open_with_invalid_config_is_refused() {
        let mut conn = Connection::new(Configuration::default());
        assert!(matches!(conn.open(), Err(ConnectionError::InvalidConfiguration)));
        assert_eq!(conn.status(), ConnectionStatus::Inactive);
    }

    #[test]
    fn open_with_disabled_config_is_refused() {
        let mut conn = Connection::new(Configuration {
            enabled: false,
            ..config()
        });
        assert!(matches!(conn.open(), Err(ConnectionError::Disabled)));
    }

    #[test]
    fn open_transitions_to_connecting_and_sends_cap_ls() {
        let mut conn = Connection::new(config());
        let commands = conn.open().unwrap();
        assert_eq!(conn.status(), ConnectionStatus::Connecting);
        assert!(commands.iter().any(|c| matches!(c, Command::CAP(..))));
    }

    #[test]
    fn open_while_already_connecting_is_a_noop() {
        let mut conn = Connection::new(config());
        conn.open().unwrap();
        let second = conn.open().unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn commands_enqueue_while_inactive_and_flush_after_welcome() {
        let mut conn = Connection::new(config());
        conn.open().unwrap();
        assert!(!conn.send(Command::JOIN("#chan".to_string(), None, None)));

        // Drive the handshake straight through to Welcome.
        conn.receive(msg(":srv CAP botty LS :"));
        conn.receive(msg(":srv CAP botty ACK :"));
        let outcome = conn.receive(msg(":srv 001 botty :Welcome"));

        assert_eq!(conn.status(), ConnectionStatus::Connected);
        assert!(outcome
            .commands
            .iter()
            .any(|c| matches!(c, Command::JOIN(chan, ..) if chan == "#chan")));
    }

    #[test]
    fn send_while_connected_returns_true_for_caller_to_write() {
        let mut conn = Connection::new(config());
        conn.open().unwrap();
        conn.receive(msg(":srv CAP botty LS :"));
        conn.receive(msg(":srv CAP botty ACK :"));
        conn.receive(msg(":srv 001 botty :Welcome"));
        assert!(conn.send(Command::JOIN("#chan".to_string(), None, None)));
    }

    #[test]
    fn outbound_filter_can_drop_a_command() {
        let mut conn = Connection::new(config());
        conn.open().unwrap();
        conn.receive(msg(":srv CAP botty LS :"));
        conn.receive(msg(":srv CAP botty ACK :"));
        conn.receive(msg(":srv 001 botty :Welcome"));

        conn.install_command_filter(Box::new(|cmd| {
            matches!(cmd, Command::PRIVMSG(..))
                .then_some(crate::filter::FilterOutcome::Keep(true))
                .unwrap_or(crate::filter::FilterOutcome::Keep(false))
        }));

        assert!(!conn.send(Command::PRIVMSG("#chan".to_string(), "hi".to_string())));
        assert!(conn.send(Command::JOIN("#chan".to_string(), None, None)));
    }

    #[test]
    fn inbound_filter_consumes_and_suppresses_composer() {
        let mut conn = Connection::new(config());
        conn.install_message_filter(Box::new(|_| crate::filter::FilterOutcome::Keep(true)));
        let outcome = conn.receive(msg(":srv 375 me :- message of the day -"));
        assert!(outcome.consumed);
        assert!(outcome.composed.is_none());
    }

    #[test]
    fn close_is_a_noop_when_inactive() {
        let mut conn = Connection::new(config());
        assert!(conn.close().is_empty());
    }

    #[test]
    fn close_transitions_through_closing_to_closed() {
        let mut conn = Connection::new(config());
        conn.open().unwrap();
        let events = conn.close();
        assert_eq!(conn.status(), ConnectionStatus::Closed);
        assert!(events.contains(&ConnectionEvent::StatusChanged(ConnectionStatus::Closing)));
        assert!(events.contains(&ConnectionEvent::StatusChanged(ConnectionStatus::Closed)));
    }

    #[test]
    fn disconnect_without_error_goes_to_closed() {
        let mut conn = Connection::new(config());
        conn.open().unwrap();
        conn.notify_disconnected(None);
        assert_eq!(conn.status(), ConnectionStatus::Closed);
        assert!(!conn.reconnect_armed());
    }

    #[test]
    fn disconnect_with_error_and_reconnect_enabled_arms_waiting() {
        let mut conn = Connection::new(Configuration {
            reconnect_delay_seconds: 10,
            ..config()
        });
        conn.open().unwrap();
        conn.notify_disconnected(Some("connection reset".to_string()));
        assert_eq!(conn.status(), ConnectionStatus::Waiting);
        assert!(conn.reconnect_armed());
    }

    #[test]
    fn disconnect_with_error_after_quit_does_not_arm_reconnect() {
        let mut conn = Connection::new(Configuration {
            reconnect_delay_seconds: 10,
            ..config()
        });
        conn.open().unwrap();
        conn.receive(msg(":srv CAP botty LS :"));
        conn.receive(msg(":srv CAP botty ACK :"));
        conn.receive(msg(":srv 001 botty :Welcome"));
        conn.quit(Some("bye".to_string()));
        conn.notify_disconnected(Some("closed by peer".to_string()));
        assert!(!conn.reconnect_armed());
    }

    #[test]
    fn nickname_in_use_before_welcome_surfaces_event() {
        let mut conn = Connection::new(config());
        conn.open().unwrap();
        conn.receive(msg(":srv CAP botty LS :"));
        let outcome = conn.receive(msg(":srv 433 * botty :Nickname is already in use"));
        assert!(outcome
            .events
            .iter()
            .any(|e| matches!(e, ConnectionEvent::NickNameReserved { rejected } if rejected == "botty")));
    }

    #[test]
    fn tracks_own_nick_change() {
        let mut conn = Connection::new(config());
        conn.open().unwrap();
        conn.receive(msg(":srv CAP botty LS :"));
        conn.receive(msg(":srv CAP botty ACK :"));
        conn.receive(msg(":srv 001 botty :Welcome"));
        conn.receive(msg(":botty!u@h NICK :botty2"));
        assert_eq!(conn.current_nick(), "botty2");
    }

    #[test]
    fn absorbs_isupport_into_network() {
        let mut conn = Connection::new(config());
        let outcome = conn.receive(msg(":srv 005 me PREFIX=(ov)@+ CHANTYPES=#& :are supported"));
        assert!(outcome.network_change.is_some());
        assert_eq!(conn.network().channel_types(), vec!['#', '&']);
    }

    #[test]
    fn save_and_restore_round_trip() {
        let mut conn = Connection::new(config());
        let saved = conn.save_state();
        let mut other = Connection::new(Configuration::default());
        other.restore_state(saved.clone()).unwrap();
        assert_eq!(other.config().host, "irc.example.org");
        assert_eq!(saved.version, PERSISTENCE_VERSION);
    }

    #[test]
    fn restore_rejects_version_mismatch() {
        let mut conn = Connection::new(config());
        let mut saved = conn.save_state();
        saved.version = 999;
        assert!(matches!(
            conn.restore_state(saved),
            Err(ConnectionError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn restore_refused_while_active() {
        let mut conn = Connection::new(config());
        conn.open().unwrap();
        let saved = conn.save_state();
        assert!(matches!(
            conn.restore_state(saved),
            Err(ConnectionError::RestoreWhileActive)
        ));
    }
}
