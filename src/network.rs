//! Per-session network parameters: an owned projection over
//! `RPL_ISUPPORT` tokens and the IRCv3 capability sets, consumed by
//! higher layers once a session is registered.
//!
//! [`crate::isupport::Isupport`] is borrowed and tied to a single
//! message's lifetime, but `RPL_ISUPPORT` is frequently split across
//! several `005` lines. [`Network`] absorbs each one into an owned,
//! case-insensitive key/value table that survives past the message that
//! produced it, then answers the same keyed queries
//! [`Isupport`](crate::isupport::Isupport) does plus the capability
//! bookkeeping a session needs for its whole lifetime.
//!
//! Grounded on `original_source/include/IrcCore/ircnetwork.h`
//! (`IrcNetwork`): `modes`/`prefixes`/`modeToPrefix`/`prefixToMode`/
//! `channelTypes`/`channelModes(ModeTypes)`/`numericLimit`/`modeLimit`/
//! `channelLimit`/`targetLimit`/`availableCapabilities`/
//! `activeCapabilities` mirror that type's public surface one for one;
//! `requestedCapabilities`/`hasCapability`/`isCapable`/
//! `requestCapability` extend it per this specification's IRCv3 capability
//! tracking, named after `original_source/src/core/ircprotocol.cpp`'s
//! capability bookkeeping (which `IrcNetwork` itself does not expose).

use std::collections::BTreeSet;

use crate::isupport::Isupport;

/// Maximum length of a message body (`MESSAGE_LENGTH`), fixed by RFC
/// 1459/2812 regardless of what a server advertises.
pub const MESSAGE_LENGTH: usize = 512;

/// Which `CHANMODES` type category (or union of categories) to query
/// with [`Network::channel_modes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeTypes {
    bits: u8,
}

impl ModeTypes {
    /// Type A: list modes (always take a parameter).
    pub const TYPE_A: ModeTypes = ModeTypes { bits: 0x1 };
    /// Type B: modes that always require a parameter.
    pub const TYPE_B: ModeTypes = ModeTypes { bits: 0x2 };
    /// Type C: modes that require a parameter only when set.
    pub const TYPE_C: ModeTypes = ModeTypes { bits: 0x4 };
    /// Type D: modes that never take a parameter.
    pub const TYPE_D: ModeTypes = ModeTypes { bits: 0x8 };
    /// All four categories.
    pub const ALL_TYPES: ModeTypes = ModeTypes { bits: 0xf };

    fn contains(self, other: ModeTypes) -> bool {
        self.bits & other.bits != 0
    }
}

impl std::ops::BitOr for ModeTypes {
    type Output = ModeTypes;
    fn bitor(self, rhs: ModeTypes) -> ModeTypes {
        ModeTypes {
            bits: self.bits | rhs.bits,
        }
    }
}

/// A queryable numeric limit, per [`Network::numeric_limit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Limit {
    /// Maximum nickname length (`NICKLEN`).
    NickLength,
    /// Maximum channel name length (`CHANNELLEN`).
    ChannelLength,
    /// Maximum topic length (`TOPICLEN`).
    TopicLength,
    /// Maximum wire message length; fixed at [`MESSAGE_LENGTH`].
    MessageLength,
    /// Maximum KICK reason length (`KICKLEN`).
    KickReasonLength,
    /// Maximum AWAY reason length (`AWAYLEN`).
    AwayReasonLength,
    /// Maximum simultaneous channel modes per MODE command (`MODES`).
    ModeCount,
    /// Maximum MONITOR list size (`MONITOR`).
    MonitorCount,
}

/// What changed in a [`Network`] as the result of one
/// [`Network::absorb_isupport`] or capability-tracking call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkChange {
    /// `NETWORK` changed.
    pub name: bool,
    /// `PREFIX`'s mode half changed.
    pub modes: bool,
    /// `PREFIX`'s prefix half changed.
    pub prefixes: bool,
    /// `CHANTYPES` changed.
    pub channel_types: bool,
    /// Any capability set (available, requested, or active) changed.
    pub capabilities: bool,
}

impl NetworkChange {
    /// `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == NetworkChange::default()
    }
}

/// Owned, long-lived projection of a session's `RPL_ISUPPORT` tokens and
/// IRCv3 capability state.
#[derive(Clone, Debug, Default)]
pub struct Network {
    tokens: std::collections::BTreeMap<String, Option<String>>,
    available_caps: std::collections::BTreeMap<String, Option<String>>,
    requested_caps: BTreeSet<String>,
    active_caps: BTreeSet<String>,
}

impl Network {
    /// Create an empty network projection, as it exists before the first
    /// `RPL_ISUPPORT` line arrives.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the tokens from one `RPL_ISUPPORT` line into the running
    /// table. Call once per `005` line; later values for the same key
    /// overwrite earlier ones, matching servers that refine a value
    /// (e.g. raising `CHANLIMIT`) across lines.
    pub fn absorb_isupport(&mut self, isupport: &Isupport<'_>) -> NetworkChange {
        let mut change = NetworkChange::default();
        for entry in isupport.iter() {
            let key = entry.key.to_ascii_uppercase();
            let value = entry.value.map(str::to_owned);
            let changed = self.tokens.get(&key) != Some(&value);
            if changed {
                match key.as_str() {
                    "NETWORK" => change.name = true,
                    "PREFIX" => {
                        change.modes = true;
                        change.prefixes = true;
                    }
                    "CHANTYPES" => change.channel_types = true,
                    _ => {}
                }
                self.tokens.insert(key, value);
            }
        }
        change
    }

    fn token(&self, key: &str) -> Option<&str> {
        self.tokens.get(key).and_then(|v| v.as_deref())
    }

    fn prefix_spec(&self) -> Option<crate::isupport::PrefixSpec<'_>> {
        self.token("PREFIX").and_then(crate::isupport::PrefixSpec::parse)
    }

    fn chanmodes(&self) -> Option<crate::isupport::ChanModes<'_>> {
        self.token("CHANMODES").and_then(crate::isupport::ChanModes::parse)
    }

    /// The network's announced name (`NETWORK`), if known.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.token("NETWORK")
    }

    /// Channel user mode characters, in `PREFIX` order (e.g. `['o', 'v']`).
    #[must_use]
    pub fn modes(&self) -> Vec<char> {
        self.prefix_spec()
            .map(|p| p.modes.chars().collect())
            .unwrap_or_default()
    }

    /// Channel user prefix symbols, in `PREFIX` order (e.g. `['@', '+']`).
    #[must_use]
    pub fn prefixes(&self) -> Vec<char> {
        self.prefix_spec()
            .map(|p| p.prefixes.chars().collect())
            .unwrap_or_default()
    }

    /// Mode character for a prefix symbol (`@` → `o`).
    #[must_use]
    pub fn prefix_to_mode(&self, prefix: char) -> Option<char> {
        self.prefix_spec().and_then(|p| p.mode_for_prefix(prefix))
    }

    /// Prefix symbol for a mode character (`o` → `@`).
    #[must_use]
    pub fn mode_to_prefix(&self, mode: char) -> Option<char> {
        self.prefix_spec().and_then(|p| p.prefix_for_mode(mode))
    }

    /// Channel name prefix characters (`CHANTYPES`), default `#&` if the
    /// server never advertised one.
    #[must_use]
    pub fn channel_types(&self) -> Vec<char> {
        self.token("CHANTYPES")
            .unwrap_or("#&")
            .chars()
            .collect()
    }

    /// `true` if `name`'s first character is one of [`Network::channel_types`].
    #[must_use]
    pub fn is_channel(&self, name: &str) -> bool {
        name.chars()
            .next()
            .is_some_and(|c| self.channel_types().contains(&c))
    }

    /// Union of `CHANMODES` characters across the requested type
    /// categories.
    #[must_use]
    pub fn channel_modes(&self, types: ModeTypes) -> Vec<char> {
        let Some(cm) = self.chanmodes() else {
            return Vec::new();
        };
        let mut result = Vec::new();
        if types.contains(ModeTypes::TYPE_A) {
            result.extend(cm.a.chars());
        }
        if types.contains(ModeTypes::TYPE_B) {
            result.extend(cm.b.chars());
        }
        if types.contains(ModeTypes::TYPE_C) {
            result.extend(cm.c.chars());
        }
        if types.contains(ModeTypes::TYPE_D) {
            result.extend(cm.d.chars());
        }
        result
    }

    /// A numeric limit, or `None` if the server never advertised it
    /// (except [`Limit::MessageLength`], which is always
    /// [`MESSAGE_LENGTH`]).
    #[must_use]
    pub fn numeric_limit(&self, limit: Limit) -> Option<usize> {
        let key = match limit {
            Limit::NickLength => "NICKLEN",
            Limit::ChannelLength => "CHANNELLEN",
            Limit::TopicLength => "TOPICLEN",
            Limit::MessageLength => return Some(MESSAGE_LENGTH),
            Limit::KickReasonLength => "KICKLEN",
            Limit::AwayReasonLength => "AWAYLEN",
            Limit::ModeCount => "MODES",
            Limit::MonitorCount => "MONITOR",
        };
        self.token(key).and_then(|v| v.parse().ok())
    }

    /// `MAXLIST` entry for a list-mode character, or `-1` if absent.
    #[must_use]
    pub fn mode_limit(&self, mode: char) -> i64 {
        self.token("MAXLIST")
            .and_then(crate::isupport::MaxList::parse)
            .and_then(|m| m.limit_for(mode))
            .map_or(-1, |n| n as i64)
    }

    /// `CHANLIMIT` entry for a channel-type character, or `-1` if absent.
    #[must_use]
    pub fn channel_limit(&self, chan_type: char) -> i64 {
        self.token("CHANLIMIT")
            .and_then(|s| {
                s.split(',').find_map(|part| {
                    let (types, n) = part.split_once(':')?;
                    types.contains(chan_type).then(|| n.parse().ok()).flatten()
                })
            })
            .map_or(-1, |n: usize| n as i64)
    }

    /// `TARGMAX` entry for a command name, or `-1` if absent.
    #[must_use]
    pub fn target_limit(&self, command: &str) -> i64 {
        self.token("TARGMAX")
            .and_then(crate::isupport::TargMax::parse)
            .and_then(|t| t.get(command))
            .flatten()
            .map_or(-1, |n| n as i64)
    }

    /// `CASEMAPPING` value, default `rfc1459`.
    #[must_use]
    pub fn casemapping(&self) -> &str {
        self.token("CASEMAPPING").unwrap_or("rfc1459")
    }

    /// `STATUSMSG` prefix letters, if advertised.
    #[must_use]
    pub fn status_msg(&self) -> Option<&str> {
        self.token("STATUSMSG")
    }

    /// Record the capabilities a server advertised in `CAP LS`, with
    /// their optional values (e.g. `sasl=PLAIN,EXTERNAL`).
    pub fn set_available_capabilities(
        &mut self,
        caps: impl IntoIterator<Item = (String, Option<String>)>,
    ) -> NetworkChange {
        let before = self.available_caps.clone();
        self.available_caps = caps.into_iter().collect();
        NetworkChange {
            capabilities: self.available_caps != before,
            ..Default::default()
        }
    }

    /// Capabilities the server has advertised as available.
    #[must_use]
    pub fn available_capabilities(&self) -> Vec<&str> {
        self.available_caps.keys().map(String::as_str).collect()
    }

    /// Capabilities this session has requested (via `CAP REQ`), whether
    /// or not the server has acknowledged them yet.
    #[must_use]
    pub fn requested_capabilities(&self) -> Vec<&str> {
        self.requested_caps.iter().map(String::as_str).collect()
    }

    /// Capabilities currently active on this session (acknowledged by
    /// `CAP ACK` and not since removed by `CAP DEL`).
    #[must_use]
    pub fn active_capabilities(&self) -> Vec<&str> {
        self.active_caps.iter().map(String::as_str).collect()
    }

    /// `true` if the server has advertised `name` as available.
    #[must_use]
    pub fn has_capability(&self, name: &str) -> bool {
        self.available_caps.keys().any(|k| k.eq_ignore_ascii_case(name))
    }

    /// `true` if `name` is currently active on this session.
    #[must_use]
    pub fn is_capable(&self, name: &str) -> bool {
        self.active_caps.iter().any(|k| k.eq_ignore_ascii_case(name))
    }

    /// Mark `names` as requested, for callers that want to track which
    /// capabilities they have asked for independent of the handshake
    /// machine's own bookkeeping. Does not itself emit a `CAP REQ`.
    pub fn request_capability(&mut self, names: impl IntoIterator<Item = String>) -> NetworkChange {
        let before = self.requested_caps.clone();
        self.requested_caps.extend(names);
        NetworkChange {
            capabilities: self.requested_caps != before,
            ..Default::default()
        }
    }

    /// Record capabilities acknowledged by `CAP ACK` (or newly announced
    /// by `CAP NEW`) as active.
    pub fn activate_capabilities(&mut self, names: impl IntoIterator<Item = String>) -> NetworkChange {
        let before = self.active_caps.clone();
        self.active_caps.extend(names);
        NetworkChange {
            capabilities: self.active_caps != before,
            ..Default::default()
        }
    }

    /// Record capabilities withdrawn by `CAP DEL` as no longer active.
    pub fn deactivate_capabilities<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) -> NetworkChange {
        let before = self.active_caps.len();
        for name in names {
            self.active_caps.retain(|c| !c.eq_ignore_ascii_case(name));
        }
        NetworkChange {
            capabilities: self.active_caps.len() != before,
            ..Default::default()
        }
    }
}
