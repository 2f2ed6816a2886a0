//! Classification of inbound messages into logical kinds.
//!
//! `Command` already carries the wire-level shape of a message (one variant
//! per IRC verb). `MessageKind` is a coarser view on top of it, grouping
//! verbs the way a client actually wants to dispatch on them: a `PRIVMSG`
//! is a `Private` message unless its body is a CTCP frame, a `433`/`001`
//! numeric becomes `Numeric` unless it is part of a value the composer
//! aggregates, and so on. It mirrors `IrcMessage::Type` in the protocol
//! this library's design is grounded on.

use crate::ctcp::Ctcp;
use crate::response::Response;

use super::types::Message;

/// The logical kind of an inbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageKind {
    /// `CAP` negotiation traffic.
    Capability,
    /// `ERROR` from the server.
    Error,
    /// `INVITE`.
    Invite,
    /// `JOIN`.
    Join,
    /// `KICK`.
    Kick,
    /// `MODE` (user or channel).
    Mode,
    /// A line of the MOTD (see the composer for the aggregated form).
    Motd,
    /// A NAMES reply line (see the composer for the aggregated form).
    Names,
    /// `NICK` change.
    Nick,
    /// `NOTICE`.
    Notice,
    /// A numeric reply with no more specific classification.
    Numeric,
    /// `PART`.
    Part,
    /// `PING`.
    Ping,
    /// `PONG`.
    Pong,
    /// `PRIVMSG` carrying ordinary text (not a CTCP frame).
    Private,
    /// `PRIVMSG` carrying a CTCP request.
    CtcpRequest,
    /// `NOTICE` carrying a CTCP reply.
    CtcpReply,
    /// `PRIVMSG` carrying a CTCP ACTION (`/me`).
    CtcpAction,
    /// `QUIT`.
    Quit,
    /// `TOPIC`.
    Topic,
    /// A WHOREPLY line (see the composer for the aggregated form).
    WhoReply,
    /// `AWAY`.
    Away,
    /// Anything not covered above.
    Unknown,
}

/// Contextual flags describing the relationship between an inbound message
/// and the local session. Computed at dispatch time rather than stored on
/// `Message`, since they depend on information (our own nick, whether
/// `identify-msg` is enabled) that the wire message itself doesn't carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageFlag {
    /// The message originated from this session (echo-message, or a
    /// locally-generated message being reflected back).
    Own,
    /// Under `identify-msg`, the sender is a registered/identified user.
    Identified,
    /// Under `identify-msg`, the sender is not a registered user.
    Unidentified,
}

impl Message {
    /// Classify this message into a [`MessageKind`].
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        use crate::command::Command;

        match &self.command {
            Command::CAP(..) => MessageKind::Capability,
            Command::ERROR(_) => MessageKind::Error,
            Command::INVITE(..) => MessageKind::Invite,
            Command::JOIN(..) => MessageKind::Join,
            Command::KICK(..) => MessageKind::Kick,
            Command::ChannelMODE(..) | Command::UserMODE(..) => MessageKind::Mode,
            Command::NICK(_) => MessageKind::Nick,
            Command::NOTICE(_, text) => classify_notice(text),
            Command::PART(..) => MessageKind::Part,
            Command::PING(..) => MessageKind::Ping,
            Command::PONG(..) => MessageKind::Pong,
            Command::PRIVMSG(_, text) => classify_privmsg(text),
            Command::QUIT(_) => MessageKind::Quit,
            Command::TOPIC(..) => MessageKind::Topic,
            Command::AWAY(_) => MessageKind::Away,
            Command::Response(response, _) => classify_response(*response),
            _ => MessageKind::Unknown,
        }
    }

    /// Compute the contextual flags for this message.
    ///
    /// `own_nick` is the session's current nickname (for `Own` detection);
    /// `identify_msg` indicates whether the `identify-msg` capability is
    /// enabled, in which case a leading `+`/`-` byte on `PRIVMSG`/`NOTICE`
    /// text marks the sender `Identified`/`Unidentified`.
    #[must_use]
    pub fn flags(&self, own_nick: &str, identify_msg: bool) -> Vec<MessageFlag> {
        let mut flags = Vec::new();

        if let Some(nick) = self.source_nickname() {
            if nick.eq_ignore_ascii_case(own_nick) {
                flags.push(MessageFlag::Own);
            }
        }

        if identify_msg {
            if let Some(marker) = identify_msg_marker(&self.command) {
                flags.push(if marker {
                    MessageFlag::Identified
                } else {
                    MessageFlag::Unidentified
                });
            }
        }

        flags
    }
}

fn classify_privmsg(text: &str) -> MessageKind {
    match Ctcp::parse(text) {
        Some(ctcp) if ctcp.kind == crate::ctcp::CtcpKind::Action => MessageKind::CtcpAction,
        Some(_) => MessageKind::CtcpRequest,
        None => MessageKind::Private,
    }
}

fn classify_notice(text: &str) -> MessageKind {
    if Ctcp::is_ctcp(text) {
        MessageKind::CtcpReply
    } else {
        MessageKind::Notice
    }
}

fn classify_response(response: Response) -> MessageKind {
    match response {
        Response::RPL_MOTDSTART | Response::RPL_MOTD | Response::RPL_ENDOFMOTD => {
            MessageKind::Motd
        }
        Response::RPL_NAMREPLY | Response::RPL_ENDOFNAMES => MessageKind::Names,
        Response::RPL_WHOREPLY | Response::RPL_ENDOFWHO => MessageKind::WhoReply,
        Response::RPL_TOPIC | Response::RPL_NOTOPIC | Response::RPL_TOPICWHOTIME => {
            MessageKind::Topic
        }
        Response::RPL_INVITING => MessageKind::Invite,
        Response::RPL_CHANNELMODEIS => MessageKind::Mode,
        Response::RPL_AWAY | Response::RPL_UNAWAY | Response::RPL_NOWAWAY => MessageKind::Away,
        _ => MessageKind::Numeric,
    }
}

/// For `PRIVMSG`/`NOTICE` text under `identify-msg`, the first byte is `+`
/// (identified) or `-` (not identified). Returns `None` for other commands.
fn identify_msg_marker(command: &crate::command::Command) -> Option<bool> {
    use crate::command::Command;
    let text = match command {
        Command::PRIVMSG(_, text) | Command::NOTICE(_, text) => text,
        _ => return None,
    };
    match text.chars().next() {
        Some('+') => Some(true),
        Some('-') => Some(false),
        _ => None,
    }
}

/// Strip the `identify-msg` marker byte from message text, if present.
#[must_use]
pub fn strip_identify_msg_marker(text: &str) -> &str {
    match text.chars().next() {
        Some('+') | Some('-') => &text[1..],
        _ => text,
    }
}
