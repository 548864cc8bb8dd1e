#![no_std]

/// Bytes in one frame: start delimiter, device command or end delimiter.
pub const FRAME_SIZE: usize = 4;

pub const START_MARKER: u8 = 0x00;
pub const END_MARKER: u8 = 0xFF;

/// Top bit every command byte carries, it tells a command apart from a start delimiter.
pub const COMMAND_MARKER: u8 = 0x80;

/// Command byte that powers a device and latches the following color.
pub const ENABLE_FLAG: u8 = 0xE0;
/// Command byte used to switch a device off on parts without a sleep mode.
pub const START_FLAG: u8 = 0xE0;
/// Command byte that puts a device into its low power state, only understood by
/// parts with power saving (e.g. the Harvatak T3A33BRG).
pub const SLEEP_FLAG: u8 = 0xA0;

pub const MIN_INTENSITY: u8 = 0x01;
/// Highest valid intensity, doubles as the mask applied to every command byte.
pub const MAX_INTENSITY: u8 = 0x1F;

/// Mask folded into the flag by the color setting commands. It is one bit wider than
/// [`MAX_INTENSITY`] so the marker bits and the intensity can share the command byte.
pub const WIDE_INTENSITY_MASK: u8 = 0x3F;

/// An RGB color plus the 5 bit global intensity of the device.
///
/// Only the low 5 bits of `intensity` ever reach the wire, anything above is
/// silently dropped.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
	pub red:       u8,
	pub green:     u8,
	pub blue:      u8,
	pub intensity: u8,
}

impl Color {
	pub const fn new(red: u8, green: u8, blue: u8, intensity: u8) -> Self {
		Self {
			red,
			green,
			blue,
			intensity,
		}
	}

	/// No color at the given intensity, what a dimmed or switched off device receives.
	pub const fn dark(intensity: u8) -> Self {
		Self::new(0x00, 0x00, 0x00, intensity)
	}
}

impl From<[u8; 4]> for Color {
	/// `[red, green, blue, intensity]`
	fn from([red, green, blue, intensity]: [u8; 4]) -> Self {
		Self::new(red, green, blue, intensity)
	}
}

/// The two framing sequences that bound a transaction across the whole chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
	Start,
	End,
}

impl Delimiter {
	/// Marker byte repeated for the length of the delimiter, given the configured markers.
	pub const fn marker(self, start_marker: u8, end_marker: u8) -> u8 {
		match self {
			Delimiter::Start => start_marker,
			Delimiter::End => end_marker,
		}
	}

	/// Marker byte with the protocol defaults.
	pub const fn default_marker(self) -> u8 {
		self.marker(START_MARKER, END_MARKER)
	}
}

/// Encodes one device command: `[flag | intensity, blue, green, red]`.
///
/// `intensity_mask` truncates the intensity, it never rejects it.
pub const fn encode_command(flag: u8, color: &Color, intensity_mask: u8) -> [u8; FRAME_SIZE] {
	[flag | (color.intensity & intensity_mask), color.blue, color.green, color.red]
}
