//! # Hookwire Protocol Library
//!
//! Wire codecs and packet structures for the game protocol intercepted by
//! Hookwire.
//!
//! ## Architecture
//!
//! ### 1. Codecs Layer ([`codecs`])
//! Little-endian primitives over `&mut &[u8]` cursors and [`bytes::BytesMut`]:
//! integers, booleans, 7-bit length-prefixed strings and RGB colors.
//!
//! ### 2. Identifiers ([`packets`])
//! The closed [`PacketId`] and [`ModuleId`] enumerations, [`PacketRole`] and
//! framing constants.
//!
//! ### 3. Packet Structures ([`packet_types`], [`modules`])
//! One struct per known kind implementing the [`Packet`] codec contract, plus
//! [`UnknownPacket`] / [`UnknownModule`] fallbacks that keep the raw id and
//! payload.
//!
//! ### 4. Frames ([`frame`])
//! Classification of a frame into a [`PacketKind`], the [`AnyPacket`] sum
//! type, and [`visit_known`] for building per-kind dispatch tables.
//!
//! ## Usage Example
//!
//! ```rust
//! use hookwire_protocol::{Packet, PacketRole, PlayerHealthPacket};
//!
//! let packet = PlayerHealthPacket { player_index: 5, health: 100, max_health: 500 };
//! let frame = packet.to_frame(PacketRole::Client).unwrap();
//! assert_eq!(&frame[..], &[8, 0, 16, 5, 100, 0, 244, 1]);
//! ```

pub mod codecs;
pub mod frame;
pub mod modules;
pub mod packet_types;
pub mod packets;

pub use frame::*;
pub use modules::*;
pub use packet_types::*;
pub use packets::*;
