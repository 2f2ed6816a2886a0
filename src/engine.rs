//! Runtime protocol dispatch.
//!
//! [`state::HandshakeMachine`](crate::state::HandshakeMachine) drives a
//! session from the initial `CAP LS` through `RPL_WELCOME`. Once a session
//! is registered, a handful of protocol behaviors keep running for the
//! life of the connection: answering `PING`, replying to CTCP requests,
//! retrying a colliding nickname, and tracking capability changes
//! announced after registration (`CAP NEW`/`CAP DEL`). [`Engine`] is that
//! runtime half, kept sans-IO like the handshake machine and the
//! [`Composer`](crate::composer::Composer): feed it a message, get back
//! the commands (if any) the session should send in response.
//!
//! Grounded on `original_source/src/core/ircprotocol.cpp` (the CTCP reply
//! table and its `createCtcpReply` override point) and
//! `ircprotocol.cpp`'s nick-collision retry hook.

use crate::command::Command;
use crate::ctcp::{Ctcp, CtcpKind};
use crate::message::Message;
use crate::response::Response;

/// Library name/version sent in reply to a CTCP `VERSION` request.
pub const CLIENT_VERSION: &str = concat!("slirc-proto v", env!("CARGO_PKG_VERSION"));

/// URL sent in reply to a CTCP `SOURCE` request.
pub const CLIENT_SOURCE: &str = env!("CARGO_PKG_REPOSITORY");

/// User-settable CTCP reply policy.
///
/// Receives the parsed request and returns the reply payload (without the
/// surrounding `\x01` delimiters), or `None` to send no reply at all. Falls
/// back to [`default_ctcp_reply`] when no hook is installed.
pub type CtcpReplyHook = Box<dyn FnMut(&Ctcp<'_>) -> Option<String> + Send>;

/// User-settable nick-collision hook.
///
/// Invoked with the colliding nickname when `433 ERR_NICKNAMEINUSE` or
/// `436 ERR_NICKCOLLISION` arrives before `RPL_WELCOME`. Returning
/// `Some(alt)` causes the engine to send `NICK alt`; returning `None`
/// leaves the session stalled at registration until the caller intervenes.
pub type NickCollisionHook = Box<dyn FnMut(&str) -> Option<String> + Send>;

/// Default CTCP reply table (per the CTCP reply policy: `PING` echoes its
/// payload back, `TIME`/`VERSION`/`SOURCE`/`CLIENTINFO` answer with fixed
/// library-provided text, and anything else goes unanswered).
#[must_use]
pub fn default_ctcp_reply(ctcp: &Ctcp<'_>) -> Option<String> {
    match ctcp.kind {
        CtcpKind::Ping => Some(format!("PING {}", ctcp.params.unwrap_or_default())),
        CtcpKind::Time => Some(format!("TIME {}", chrono::Local::now().format("%H:%M"))),
        CtcpKind::Version => Some(format!("VERSION {CLIENT_VERSION}")),
        CtcpKind::Source => Some(format!("SOURCE {CLIENT_SOURCE}")),
        CtcpKind::Clientinfo => Some("CLIENTINFO PING SOURCE TIME VERSION".to_string()),
        _ => None,
    }
}

/// Capability changes observed in a single [`Engine::feed`] call, carried
/// by `CAP NEW`/`CAP DEL` after registration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CapabilityChange {
    /// Capabilities newly advertised by `CAP NEW`.
    pub added: Vec<String>,
    /// Capabilities withdrawn by `CAP DEL`.
    pub removed: Vec<String>,
}

/// Result of feeding one message to the [`Engine`].
#[derive(Debug, Default)]
pub struct EngineOutput {
    /// Commands the session should send in response.
    pub commands: Vec<Command>,
    /// Capability changes carried by this message, if any.
    pub cap_change: Option<CapabilityChange>,
}

/// Runtime protocol engine: `PING`/`PONG`, CTCP replies, nick-collision
/// recovery, and `CAP NEW`/`CAP DEL` tracking after registration.
pub struct Engine {
    ctcp_reply: Option<CtcpReplyHook>,
    nick_collision: Option<NickCollisionHook>,
    welcomed: bool,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("welcomed", &self.welcomed)
            .field("ctcp_reply", &self.ctcp_reply.is_some())
            .field("nick_collision", &self.nick_collision.is_some())
            .finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            ctcp_reply: None,
            nick_collision: None,
            welcomed: false,
        }
    }
}

impl Engine {
    /// Create a new engine with the default CTCP policy and no
    /// nick-collision hook installed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the default CTCP reply policy (§4.6.1).
    pub fn set_ctcp_reply_hook(&mut self, hook: CtcpReplyHook) {
        self.ctcp_reply = Some(hook);
    }

    /// Install a nick-collision hook, invoked on `433`/`436` before Welcome.
    pub fn set_nick_collision_hook(&mut self, hook: NickCollisionHook) {
        self.nick_collision = Some(hook);
    }

    /// `true` once `RPL_WELCOME` has passed through this engine.
    #[must_use]
    pub fn is_welcomed(&self) -> bool {
        self.welcomed
    }

    /// Feed one inbound message to the engine.
    ///
    /// `own_nick` is the session's current nickname at arrival time, used
    /// to recognize CTCP requests addressed to us and to default the
    /// collision hook's nickname argument.
    pub fn feed(&mut self, msg: &Message, own_nick: &str) -> EngineOutput {
        let mut out = EngineOutput::default();

        match &msg.command {
            Command::PING(server1, server2) => {
                out.commands
                    .push(Command::PONG(server1.clone(), server2.clone()));
            }

            Command::PRIVMSG(target, text) if target.eq_ignore_ascii_case(own_nick) => {
                if let Some(sender) = msg.source_nickname() {
                    if let Some(ctcp) = Ctcp::parse(text) {
                        let reply = match self.ctcp_reply.as_mut() {
                            Some(hook) => hook(&ctcp),
                            None => default_ctcp_reply(&ctcp),
                        };
                        if let Some(payload) = reply {
                            out.commands.push(Command::NOTICE(
                                sender.to_string(),
                                format!("\x01{payload}\x01"),
                            ));
                        }
                    }
                }
            }

            Command::Response(Response::RPL_WELCOME, _) => {
                self.welcomed = true;
            }

            Command::Response(Response::ERR_NICKNAMEINUSE, params)
            | Command::Response(Response::ERR_NICKCOLLISION, params)
                if !self.welcomed =>
            {
                let current = params.get(1).map(String::as_str).unwrap_or(own_nick);
                if let Some(hook) = self.nick_collision.as_mut() {
                    if let Some(alt) = hook(current) {
                        if !alt.is_empty() {
                            out.commands.push(Command::NICK(alt));
                        }
                    }
                }
            }

            Command::CAP(_, sub, _, caps) if self.welcomed => {
                let list: Vec<String> = caps
                    .as_deref()
                    .unwrap_or("")
                    .split_whitespace()
                    .map(|s| s.trim_start_matches(['-', '=', '~']).to_string())
                    .filter(|s| !s.is_empty())
                    .collect();

                match sub {
                    crate::command::CapSubCommand::NEW => {
                        out.cap_change = Some(CapabilityChange {
                            added: list,
                            removed: Vec::new(),
                        });
                    }
                    crate::command::CapSubCommand::DEL => {
                        out.cap_change = Some(CapabilityChange {
                            added: Vec::new(),
                            removed: list,
                        });
                    }
                    _ => {}
                }
            }

            _ => {}
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(raw: &str) -> Message {
        raw.parse().unwrap()
    }

    #[test]
    fn answers_ping_with_pong() {
        let mut engine = Engine::new();
        let out = engine.feed(&msg("PING :server"), "me");
        assert_eq!(out.commands.len(), 1);
        assert_eq!(out.commands[0].to_string(), "PONG server\r\n");
    }

    #[test]
    fn answers_ctcp_version() {
        let mut engine = Engine::new();
        let out = engine.feed(
            &msg(":bob!b@h PRIVMSG alice :\x01VERSION\x01"),
            "alice",
        );
        assert_eq!(out.commands.len(), 1);
        let rendered = out.commands[0].to_string();
        assert!(rendered.starts_with("NOTICE bob :\x01VERSION"));
        assert!(rendered.ends_with("\x01\r\n"));
    }

    #[test]
    fn answers_ctcp_ping_with_same_payload() {
        let mut engine = Engine::new();
        let out = engine.feed(
            &msg(":bob!b@h PRIVMSG alice :\x011234567890\x01"),
            "alice",
        );
        assert_eq!(
            out.commands[0].to_string(),
            "NOTICE bob :\x01PING 1234567890\x01\r\n"
        );
    }

    #[test]
    fn unknown_ctcp_gets_no_reply() {
        let mut engine = Engine::new();
        let out = engine.feed(
            &msg(":bob!b@h PRIVMSG alice :\x01FROBNICATE\x01"),
            "alice",
        );
        assert!(out.commands.is_empty());
    }

    #[test]
    fn ctcp_to_a_channel_is_ignored() {
        let mut engine = Engine::new();
        let out = engine.feed(
            &msg(":bob!b@h PRIVMSG #chan :\x01VERSION\x01"),
            "alice",
        );
        assert!(out.commands.is_empty());
    }

    #[test]
    fn custom_ctcp_hook_overrides_default() {
        let mut engine = Engine::new();
        engine.set_ctcp_reply_hook(Box::new(|ctcp| {
            (ctcp.kind == CtcpKind::Version).then(|| "VERSION custom-client 0.1".to_string())
        }));
        let out = engine.feed(
            &msg(":bob!b@h PRIVMSG alice :\x01VERSION\x01"),
            "alice",
        );
        assert_eq!(
            out.commands[0].to_string(),
            "NOTICE bob :\x01VERSION custom-client 0.1\x01\r\n"
        );
    }

    #[test]
    fn welcome_marks_session_registered() {
        let mut engine = Engine::new();
        assert!(!engine.is_welcomed());
        engine.feed(&msg(":srv 001 alice :Welcome"), "alice");
        assert!(engine.is_welcomed());
    }

    #[test]
    fn nick_collision_hook_runs_before_welcome() {
        let mut engine = Engine::new();
        engine.set_nick_collision_hook(Box::new(|_nick| Some("alice_".to_string())));
        let out = engine.feed(&msg(":s 433 * alice :in use"), "alice");
        assert_eq!(out.commands.len(), 1);
        assert_eq!(out.commands[0].to_string(), "NICK alice_\r\n");
    }

    #[test]
    fn nick_collision_hook_does_not_run_after_welcome() {
        let mut engine = Engine::new();
        engine.feed(&msg(":srv 001 alice :Welcome"), "alice");
        engine.set_nick_collision_hook(Box::new(|_nick| Some("alice_".to_string())));
        let out = engine.feed(&msg(":s 433 * alice :in use"), "alice");
        assert!(out.commands.is_empty());
    }

    #[test]
    fn nick_collision_hook_returning_none_stalls() {
        let mut engine = Engine::new();
        engine.set_nick_collision_hook(Box::new(|_nick| None));
        let out = engine.feed(&msg(":s 433 * alice :in use"), "alice");
        assert!(out.commands.is_empty());
    }

    #[test]
    fn cap_new_after_welcome_reports_added_capabilities() {
        let mut engine = Engine::new();
        engine.feed(&msg(":srv 001 alice :Welcome"), "alice");
        let out = engine.feed(&msg(":srv CAP alice NEW :away-notify"), "alice");
        assert_eq!(
            out.cap_change,
            Some(CapabilityChange {
                added: vec!["away-notify".to_string()],
                removed: Vec::new(),
            })
        );
    }

    #[test]
    fn cap_del_after_welcome_reports_removed_capabilities() {
        let mut engine = Engine::new();
        engine.feed(&msg(":srv 001 alice :Welcome"), "alice");
        let out = engine.feed(&msg(":srv CAP alice DEL :away-notify"), "alice");
        assert_eq!(
            out.cap_change,
            Some(CapabilityChange {
                added: Vec::new(),
                removed: vec!["away-notify".to_string()],
            })
        );
    }

    #[test]
    fn cap_new_before_welcome_is_ignored() {
        let mut engine = Engine::new();
        let out = engine.feed(&msg(":srv CAP alice NEW :away-notify"), "alice");
        assert_eq!(out.cap_change, None);
    }
}
