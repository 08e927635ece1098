//! # Module Packets
//!
//! Packet id 82 carries a `u16` module id and a module-specific payload.
//! [`ModulePacket`] adapts any [`Module`] to the [`Packet`] contract.

use std::fmt::Debug;

use bytes::{BufMut, BytesMut};
use hookwire_core::{Color3, HookwireError, Result};

use super::codecs::*;
use super::packet_types::Packet;
use super::packets::{ModuleId, PacketRole, MODULE_PACKET_ID};

/// Codec contract for one module kind
pub trait Module: Clone + Debug + Send + Sync + 'static {
    /// Raw module id
    fn module_id(&self) -> u16;

    /// Read the module payload that followed the module id
    fn read(id: u16, buf: &mut &[u8], role: PacketRole) -> Result<Self>;

    /// Append the module payload (without the module id)
    fn write(&self, buf: &mut BytesMut, role: PacketRole) -> Result<()>;
}

/// A module kind with a statically known id
pub trait KnownModule: Module + Default {
    const ID: ModuleId;
}

/// Packet wrapper around a module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModulePacket<M> {
    pub module: M,
}

impl<M: Module> ModulePacket<M> {
    pub fn new(module: M) -> Self {
        Self { module }
    }
}

impl<M: Module> Packet for ModulePacket<M> {
    fn id(&self) -> u8 {
        MODULE_PACKET_ID
    }

    fn read(_id: u8, buf: &mut &[u8], role: PacketRole) -> Result<Self> {
        let module_id = read_u16(buf)?;
        Ok(Self { module: M::read(module_id, buf, role)? })
    }

    fn write(&self, buf: &mut BytesMut, role: PacketRole) -> Result<()> {
        write_u16(buf, self.module.module_id());
        self.module.write(buf, role)
    }
}

/// How a [`NetworkText`] is interpreted by the receiving client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum NetworkTextMode {
    /// Shown as-is
    #[default]
    Literal = 0,
    /// Format string with substitutions
    Formattable = 1,
    /// Localization key with substitutions
    LocalizationKey = 2,
}

impl NetworkTextMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Literal),
            1 => Some(Self::Formattable),
            2 => Some(Self::LocalizationKey),
            _ => None,
        }
    }
}

/// Deepest substitution nesting accepted when reading a [`NetworkText`]
pub const MAX_NETWORK_TEXT_DEPTH: usize = 8;

/// Text sent from the server that the client may localize
///
/// # Format
/// ```text
/// {U8 mode}{STRING text}[{U8 count}{NETWORKTEXT substitution}*count]
/// ```
/// Substitutions are only present for non-literal modes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkText {
    pub mode: NetworkTextMode,
    pub text: String,
    pub substitutions: Vec<NetworkText>,
}

impl NetworkText {
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            mode: NetworkTextMode::Literal,
            text: text.into(),
            substitutions: Vec::new(),
        }
    }

    pub fn read(buf: &mut &[u8]) -> Result<Self> {
        Self::read_nested(buf, 0)
    }

    fn read_nested(buf: &mut &[u8], depth: usize) -> Result<Self> {
        if depth > MAX_NETWORK_TEXT_DEPTH {
            return Err(HookwireError::InvalidData(format!(
                "Network text nested deeper than {} levels",
                MAX_NETWORK_TEXT_DEPTH
            )));
        }

        let raw = read_u8(buf)?;
        let mode = NetworkTextMode::from_u8(raw)
            .ok_or_else(|| HookwireError::InvalidData(format!("Unknown network text mode: {}", raw)))?;
        let text = read_string(buf)?;

        let mut substitutions = Vec::new();
        if mode != NetworkTextMode::Literal {
            let count = read_u8(buf)?;
            for _ in 0..count {
                substitutions.push(Self::read_nested(buf, depth + 1)?);
            }
        }

        Ok(Self { mode, text, substitutions })
    }

    /// Append this text to `buf`
    ///
    /// # Returns
    /// An error if any level carries more than 255 substitutions, which the
    /// one byte count cannot express
    pub fn write(&self, buf: &mut BytesMut) -> Result<()> {
        write_u8(buf, self.mode as u8);
        write_string(buf, &self.text);
        if self.mode != NetworkTextMode::Literal {
            let count = u8::try_from(self.substitutions.len()).map_err(|_| {
                HookwireError::Protocol(format!(
                    "Network text has {} substitutions, at most 255 fit",
                    self.substitutions.len()
                ))
            })?;
            write_u8(buf, count);
            for substitution in &self.substitutions {
                substitution.write(buf)?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for NetworkText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Chat message or command
///
/// Clients send a command name and a message; the server broadcasts an
/// author, a network text and a color. Which set of fields is read or
/// written depends on the [`PacketRole`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatModule {
    /// Command name, e.g. `Say`; client-authored only
    pub client_command: String,
    /// Message text; client-authored only
    pub client_message: String,
    /// Index of the author; server-authored only
    pub server_author_index: u8,
    /// Message text; server-authored only
    pub server_message: NetworkText,
    /// Message color; server-authored only
    pub server_color: Color3,
}

impl Module for ChatModule {
    fn module_id(&self) -> u16 {
        Self::ID.as_u16()
    }

    fn read(_id: u16, buf: &mut &[u8], role: PacketRole) -> Result<Self> {
        let mut module = Self::default();
        match role {
            PacketRole::Client => {
                module.client_command = read_string(buf)?;
                module.client_message = read_string(buf)?;
            }
            PacketRole::Server => {
                module.server_author_index = read_u8(buf)?;
                module.server_message = NetworkText::read(buf)?;
                module.server_color = read_color(buf)?;
            }
        }
        Ok(module)
    }

    fn write(&self, buf: &mut BytesMut, role: PacketRole) -> Result<()> {
        match role {
            PacketRole::Client => {
                write_string(buf, &self.client_command);
                write_string(buf, &self.client_message);
            }
            PacketRole::Server => {
                write_u8(buf, self.server_author_index);
                self.server_message.write(buf)?;
                write_color(buf, self.server_color);
            }
        }
        Ok(())
    }
}

impl KnownModule for ChatModule {
    const ID: ModuleId = ModuleId::Chat;
}

/// Any module kind this library does not interpret
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnknownModule {
    pub id: u16,
    pub payload: Vec<u8>,
}

impl UnknownModule {
    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

impl Module for UnknownModule {
    fn module_id(&self) -> u16 {
        self.id
    }

    fn read(id: u16, buf: &mut &[u8], _role: PacketRole) -> Result<Self> {
        Ok(Self { id, payload: read_remaining(buf) })
    }

    fn write(&self, buf: &mut BytesMut, _role: PacketRole) -> Result<()> {
        buf.put_slice(&self.payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_chat_decode() {
        let mut payload = vec![1, 0, 3];
        payload.extend_from_slice(b"Say");
        payload.push(13);
        payload.extend_from_slice(b"/command test");

        let packet = ModulePacket::<ChatModule>::decode(82, &payload, PacketRole::Client).unwrap();
        assert_eq!(packet.module.client_command, "Say");
        assert_eq!(packet.module.client_message, "/command test");

        let frame = packet.to_frame(PacketRole::Client).unwrap();
        assert_eq!(frame[0] as usize, frame.len());
        assert_eq!(&frame[3..], &payload[..]);
    }

    #[test]
    fn test_server_chat_frame() {
        let packet = ModulePacket::new(ChatModule {
            server_author_index: 1,
            server_message: NetworkText::literal("test"),
            server_color: Color3::WHITE,
            ..Default::default()
        });
        let frame = packet.to_frame(PacketRole::Server).unwrap();
        assert_eq!(
            &frame[..],
            &[15, 0, 82, 1, 0, 1, 0, 4, 116, 101, 115, 116, 255, 255, 255]
        );

        let decoded = ModulePacket::<ChatModule>::decode(82, &frame[3..], PacketRole::Server).unwrap();
        assert_eq!(decoded.module.server_author_index, 1);
        assert_eq!(decoded.module.server_message.to_string(), "test");
        assert_eq!(decoded.module.server_color, Color3::WHITE);
    }

    #[test]
    fn test_formattable_network_text() {
        let text = NetworkText {
            mode: NetworkTextMode::Formattable,
            text: "{0} joined".into(),
            substitutions: vec![NetworkText::literal("alice")],
        };
        let mut buf = BytesMut::new();
        text.write(&mut buf).unwrap();

        let mut slice = &buf[..];
        assert_eq!(NetworkText::read(&mut slice).unwrap(), text);
        assert!(slice.is_empty());
    }

    #[test]
    fn test_unknown_module_keeps_id() {
        let packet = ModulePacket::<UnknownModule>::decode(82, &[255, 255], PacketRole::Client).unwrap();
        assert_eq!(packet.module.id, 65535);
        assert!(packet.module.is_empty());

        let packet =
            ModulePacket::<UnknownModule>::decode(82, &[255, 255, 210, 4, 0, 0], PacketRole::Server).unwrap();
        assert_eq!(packet.module.len(), 4);
        assert_eq!(
            &packet.to_frame(PacketRole::Server).unwrap()[..],
            &[9, 0, 82, 255, 255, 210, 4, 0, 0]
        );
    }

    #[test]
    fn test_network_text_depth_is_capped() {
        // Each level is a formattable text "" with one substitution
        let mut payload = Vec::new();
        for _ in 0..MAX_NETWORK_TEXT_DEPTH {
            payload.extend_from_slice(&[1, 0, 1]);
        }
        payload.extend_from_slice(&[0, 0]);

        let mut slice = &payload[..];
        let text = NetworkText::read(&mut slice).unwrap();
        assert!(slice.is_empty());
        assert_eq!(text.substitutions.len(), 1);

        let mut deeper = vec![1, 0, 1];
        deeper.extend_from_slice(&payload);
        let mut slice = &deeper[..];
        match NetworkText::read(&mut slice) {
            Err(HookwireError::InvalidData(message)) => assert!(message.contains("nested")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_network_text_too_many_substitutions() {
        let text = NetworkText {
            mode: NetworkTextMode::LocalizationKey,
            text: "key".into(),
            substitutions: vec![NetworkText::literal("x"); 256],
        };
        let mut buf = BytesMut::new();
        assert!(matches!(text.write(&mut buf), Err(HookwireError::Protocol(_))));

        let packet = ModulePacket::new(ChatModule {
            server_message: text,
            ..Default::default()
        });
        assert!(packet.to_frame(PacketRole::Server).is_err());

        let text = NetworkText {
            mode: NetworkTextMode::LocalizationKey,
            text: "key".into(),
            substitutions: vec![NetworkText::literal("x"); 255],
        };
        let mut buf = BytesMut::new();
        text.write(&mut buf).unwrap();
        assert_eq!(buf[5], 255);
    }
}
