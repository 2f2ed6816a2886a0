//! Multi-line numeric reply aggregation.
//!
//! A handful of server replies arrive as an opening line, zero or more
//! continuation lines, and a closing line, all describing one logical
//! answer (the MOTD, a NAMES listing, a WHO result, ...). [`Composer`] is a
//! sans-IO accumulator, mirroring [`crate::state::HandshakeMachine`]'s
//! shape: feed it numerics one at a time, and it hands back a
//! [`ComposedMessage`] once a sequence completes. Numerics it doesn't
//! recognize, or that aren't part of a composed sequence, are left for the
//! caller to handle directly.
//!
//! Grounded on `IrcMessageComposer::composeMessage`, which performs the
//! same numeric-by-numeric accumulation over a single pending message.

use crate::command::Command;
use crate::message::Message;
use crate::response::Response;

/// A logical message assembled from a multi-line numeric sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ComposedMessage {
    /// The complete message of the day.
    Motd {
        /// Each `RPL_MOTD` line, in order.
        lines: Vec<String>,
    },
    /// A complete NAMES listing for a channel.
    Names {
        /// Channel the listing is for.
        channel: String,
        /// All nicknames collected across `RPL_NAMREPLY` lines.
        names: Vec<String>,
    },
    /// A channel's topic (possibly empty, for `RPL_NOTOPIC`).
    Topic {
        /// Channel the topic belongs to.
        channel: String,
        /// Topic text, `None` for `RPL_NOTOPIC`.
        topic: Option<String>,
    },
    /// The result of an `INVITE`.
    Invite {
        /// Nickname that was invited.
        nick: String,
        /// Channel invited to.
        channel: String,
    },
    /// A single WHO result line.
    WhoReply {
        /// Mask that was queried.
        mask: String,
        /// Nickname of the matched user.
        nick: String,
        /// Username (ident) of the matched user.
        user: String,
        /// Hostname of the matched user.
        host: String,
        /// Server the user is on.
        server: String,
        /// Status flags (`H`/`G`, `*`, `@`/`+`).
        flags: String,
        /// Real name (GECOS), with the hop count stripped.
        realname: String,
    },
    /// The result of a channel `MODE` query.
    Mode {
        /// Channel the modes apply to.
        channel: String,
        /// Mode string and arguments as returned by the server.
        params: Vec<String>,
    },
    /// The current away state of a user.
    Away {
        /// Nickname the away state describes.
        nick: String,
        /// `true` for `RPL_AWAY`/`RPL_NOWAWAY`, `false` for `RPL_UNAWAY`.
        away: bool,
        /// Away message. Present for `RPL_AWAY` (the user's away text) and
        /// `RPL_UNAWAY`/`RPL_NOWAWAY` (the server's confirmation text).
        message: Option<String>,
    },
}

#[derive(Debug)]
enum Pending {
    Motd(Vec<String>),
    Names { channel: String, names: Vec<String> },
}

/// Sans-IO accumulator for multi-line numeric sequences.
#[derive(Debug, Default)]
pub struct Composer {
    pending: Option<Pending>,
}

impl Composer {
    /// Create a new, empty composer.
    #[must_use]
    pub fn new() -> Self {
        Self { pending: None }
    }

    /// Returns `true` if `response` is part of a sequence this composer
    /// aggregates (the MOTD, NAMES, WHO, TOPIC, INVITE, channel MODE, and
    /// AWAY families).
    #[must_use]
    pub fn is_composed(response: Response) -> bool {
        matches!(
            response,
            Response::RPL_MOTDSTART
                | Response::RPL_MOTD
                | Response::RPL_ENDOFMOTD
                | Response::RPL_NAMREPLY
                | Response::RPL_ENDOFNAMES
                | Response::RPL_TOPIC
                | Response::RPL_NOTOPIC
                | Response::RPL_INVITING
                | Response::RPL_INVITED
                | Response::RPL_WHOREPLY
                | Response::RPL_CHANNELMODEIS
                | Response::RPL_AWAY
                | Response::RPL_UNAWAY
                | Response::RPL_NOWAWAY
        )
    }

    /// Feed one message to the composer. Returns a completed
    /// [`ComposedMessage`] when `msg` closes a sequence, `None` otherwise
    /// (including for every message the composer doesn't recognize).
    pub fn feed(&mut self, msg: &Message) -> Option<ComposedMessage> {
        let Command::Response(response, params) = &msg.command else {
            return None;
        };

        match *response {
            Response::RPL_MOTDSTART => {
                self.pending = Some(Pending::Motd(Vec::new()));
                None
            }
            Response::RPL_MOTD => {
                if let Some(Pending::Motd(lines)) = &mut self.pending {
                    if let Some(line) = params.get(1) {
                        lines.push(line.clone());
                    }
                }
                None
            }
            Response::RPL_ENDOFMOTD => match self.pending.take() {
                Some(Pending::Motd(lines)) => Some(ComposedMessage::Motd { lines }),
                _ => None,
            },

            Response::RPL_NAMREPLY => {
                let count = params.len();
                let channel = params.get(count.wrapping_sub(2))?.clone();
                let new_names = params
                    .get(count.wrapping_sub(1))
                    .map(|s| {
                        s.split(' ')
                            .filter(|n| !n.is_empty())
                            .map(str::to_owned)
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();

                match &mut self.pending {
                    Some(Pending::Names { channel: c, names }) if *c == channel => {
                        names.extend(new_names);
                    }
                    _ => {
                        self.pending = Some(Pending::Names {
                            channel,
                            names: new_names,
                        });
                    }
                }
                None
            }
            Response::RPL_ENDOFNAMES => match self.pending.take() {
                Some(Pending::Names { channel, names }) => {
                    Some(ComposedMessage::Names { channel, names })
                }
                _ => None,
            },

            Response::RPL_TOPIC | Response::RPL_NOTOPIC => {
                let channel = params.get(1)?.clone();
                let topic = if *response == Response::RPL_TOPIC {
                    params.get(2).cloned()
                } else {
                    None
                };
                Some(ComposedMessage::Topic { channel, topic })
            }

            Response::RPL_INVITING | Response::RPL_INVITED => {
                let nick = params.get(1)?.clone();
                let channel = params.get(2)?.clone();
                Some(ComposedMessage::Invite { nick, channel })
            }

            Response::RPL_WHOREPLY => {
                let mask = params.get(1)?.clone();
                let user = params.get(2)?.clone();
                let host = params.get(3)?.clone();
                let server = params.get(4)?.clone();
                let nick = params.get(5)?.clone();
                let flags = params.get(6)?.clone();
                let realname = params
                    .get(7)
                    .and_then(|trailing| trailing.split_once(' '))
                    .map(|(_hopcount, name)| name.to_owned())
                    .unwrap_or_default();
                Some(ComposedMessage::WhoReply {
                    mask,
                    nick,
                    user,
                    host,
                    server,
                    flags,
                    realname,
                })
            }

            Response::RPL_CHANNELMODEIS => {
                let channel = params.get(1)?.clone();
                let rest = params.get(2..).unwrap_or(&[]).to_vec();
                Some(ComposedMessage::Mode {
                    channel,
                    params: rest,
                })
            }

            Response::RPL_AWAY => {
                let nick = params.get(1)?.clone();
                let message = params.get(2).cloned();
                Some(ComposedMessage::Away {
                    nick,
                    away: true,
                    message,
                })
            }
            Response::RPL_UNAWAY => {
                let nick = params.first()?.clone();
                let message = params.get(1).cloned();
                Some(ComposedMessage::Away {
                    nick,
                    away: false,
                    message,
                })
            }
            Response::RPL_NOWAWAY => {
                let nick = params.first()?.clone();
                let message = params.get(1).cloned();
                Some(ComposedMessage::Away {
                    nick,
                    away: true,
                    message,
                })
            }

            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(raw: &str) -> Message {
        raw.parse().unwrap()
    }

    #[test]
    fn composes_motd() {
        let mut c = Composer::new();
        assert!(c.feed(&msg(":srv 375 me :- message of the day -")).is_none());
        assert!(c.feed(&msg(":srv 372 me :line one")).is_none());
        assert!(c.feed(&msg(":srv 372 me :line two")).is_none());
        let result = c.feed(&msg(":srv 376 me :End of MOTD")).unwrap();
        assert_eq!(
            result,
            ComposedMessage::Motd {
                lines: vec!["line one".to_string(), "line two".to_string()]
            }
        );
    }

    #[test]
    fn composes_names_across_multiple_lines() {
        let mut c = Composer::new();
        assert!(c
            .feed(&msg(":srv 353 me = #chan :alice bob"))
            .is_none());
        assert!(c
            .feed(&msg(":srv 353 me = #chan :carol"))
            .is_none());
        let result = c.feed(&msg(":srv 366 me #chan :End of NAMES")).unwrap();
        assert_eq!(
            result,
            ComposedMessage::Names {
                channel: "#chan".to_string(),
                names: vec!["alice".into(), "bob".into(), "carol".into()],
            }
        );
    }

    #[test]
    fn composes_topic() {
        let mut c = Composer::new();
        let result = c
            .feed(&msg(":srv 332 me #chan :Topic text here"))
            .unwrap();
        assert_eq!(
            result,
            ComposedMessage::Topic {
                channel: "#chan".to_string(),
                topic: Some("Topic text here".to_string()),
            }
        );
    }

    #[test]
    fn composes_no_topic() {
        let mut c = Composer::new();
        let result = c.feed(&msg(":srv 331 me #chan :No topic is set")).unwrap();
        assert_eq!(
            result,
            ComposedMessage::Topic {
                channel: "#chan".to_string(),
                topic: None,
            }
        );
    }

    #[test]
    fn composes_who_reply() {
        let mut c = Composer::new();
        let result = c
            .feed(&msg(
                ":srv 352 me #chan user host server nick H :2 Real Name"
            ))
            .unwrap();
        assert_eq!(
            result,
            ComposedMessage::WhoReply {
                mask: "#chan".to_string(),
                user: "user".to_string(),
                host: "host".to_string(),
                server: "server".to_string(),
                nick: "nick".to_string(),
                flags: "H".to_string(),
                realname: "Real Name".to_string(),
            }
        );
    }

    #[test]
    fn composes_away() {
        let mut c = Composer::new();
        let result = c.feed(&msg(":srv 301 me nick :gone fishing")).unwrap();
        assert_eq!(
            result,
            ComposedMessage::Away {
                nick: "nick".to_string(),
                away: true,
                message: Some("gone fishing".to_string()),
            }
        );
    }

    #[test]
    fn composes_unaway() {
        let mut c = Composer::new();
        let result = c
            .feed(&msg(":srv 305 me :You are no longer marked as away"))
            .unwrap();
        assert_eq!(
            result,
            ComposedMessage::Away {
                nick: "me".to_string(),
                away: false,
                message: Some("You are no longer marked as away".to_string()),
            }
        );
    }

    #[test]
    fn composes_nowaway() {
        let mut c = Composer::new();
        let result = c
            .feed(&msg(":srv 306 me :You have been marked as being away"))
            .unwrap();
        assert_eq!(
            result,
            ComposedMessage::Away {
                nick: "me".to_string(),
                away: true,
                message: Some("You have been marked as being away".to_string()),
            }
        );
    }

    #[test]
    fn non_composed_numeric_passes_through() {
        let mut c = Composer::new();
        assert!(c.feed(&msg(":srv 001 me :Welcome")).is_none());
    }

    #[test]
    fn is_composed_matches_table() {
        assert!(Composer::is_composed(Response::RPL_MOTD));
        assert!(Composer::is_composed(Response::RPL_WHOREPLY));
        assert!(!Composer::is_composed(Response::RPL_WELCOME));
    }
}
