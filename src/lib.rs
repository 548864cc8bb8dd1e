//! Drives a fixed-length chain of APA102 LEDs over any byte-wide synchronous serial bus.
//!
//! Every public operation is one complete transaction (start delimiter, command frames,
//! end delimiter), except [`Apa102::set_one`] and [`Apa102::turn_off`] which emit a
//! single command frame for the caller to wrap in [`Apa102::send_start`] and
//! [`Apa102::send_end`].
//!
//! The driver holds no lock. If more than one thread or task can reach the bus, the
//! caller has to serialize access and must never interleave two start/end windows, the
//! chain ends up showing garbage otherwise.
//!
//! The end delimiter is always [`Config::frame_size`] bytes long, whatever the chain
//! length. A 4 byte delimiter reliably flushes up to 64 devices; longer chains may not
//! latch the last frames.

use apa102_chain_protocol::{encode_command, Delimiter, WIDE_INTENSITY_MASK};
pub use apa102_chain_protocol::{self as protocol, Color};
use tracing::{debug, trace};

mod config;
mod serial;
mod transport;

pub use config::{Config, PowerSaving};
pub use serial::SerialTransport;
pub use transport::Transport;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("the chain needs at least one device")]
	InvalidChainLength,
	#[error("delimiters need at least one byte")]
	InvalidFrameSize,
	#[error("max intensity {max:#04x} is above 0x1f")]
	IntensityOutOfRange { max: u8 },
	#[error("max intensity {max:#04x} does not mask a contiguous range of low bits")]
	IntensityMaskNotContiguous { max: u8 },
	#[error("flag {flag:#04x} is missing the command marker bit")]
	InvalidFlag { flag: u8 },
	#[error("min intensity {min:#04x} is above max intensity {max:#04x}")]
	IntensityBoundsInverted { min: u8, max: u8 },
	#[error("serial port: {0}")]
	Serial(#[from] serialport::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub struct Apa102<T: Transport> {
	transport: T,
	config:    Config,
}

impl<T: Transport> Apa102<T> {
	/// Create a driver for the chain described by `config`, sending through `transport`.
	///
	/// Nothing is sent yet, call [`Apa102::init`] before anything else.
	pub fn new(transport: T, config: Config) -> Result<Self> {
		config.validate()?;

		debug!(
			chain_length = config.chain_length,
			frame_size = config.frame_size,
			power_saving = ?config.power_saving,
			"apa102 chain configured"
		);
		if config.chain_length > config.flushable_chain_length() {
			debug!(
				"{} byte end delimiter only flushes {} of {} devices",
				config.frame_size,
				config.flushable_chain_length(),
				config.chain_length
			);
		}

		Ok(Self { transport, config })
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn transport(&self) -> &T {
		&self.transport
	}

	pub fn transport_mut(&mut self) -> &mut T {
		&mut self.transport
	}

	pub fn into_inner(self) -> T {
		self.transport
	}

	/// Sends the start delimiter: `frame_size` start markers.
	pub fn send_start(&mut self) {
		self.send_delimiter(Delimiter::Start);
	}

	/// Sends the end delimiter: `frame_size` end markers.
	pub fn send_end(&mut self) {
		self.send_delimiter(Delimiter::End);
	}

	fn send_delimiter(&mut self, delimiter: Delimiter) {
		let marker = delimiter.marker(self.config.start_marker, self.config.end_marker);
		trace!(?delimiter, marker, "delimiter");

		for _ in 0..self.config.frame_size {
			self.transport.transfer_byte(marker);
		}
	}

	fn send_frame(&mut self, frame: [u8; 4]) {
		trace!(?frame, "frame");
		self.transport.transfer_all(&frame);
	}

	/// Sends `frame` to every device, wrapped in both delimiters.
	fn broadcast(&mut self, frame: [u8; 4]) {
		self.send_start();
		for _ in 0..self.config.chain_length {
			self.send_frame(frame);
		}
		self.send_end();
	}

	fn dark_frame(&self) -> [u8; 4] {
		encode_command(
			self.config.enable_flag,
			&Color::dark(self.config.min_intensity),
			self.config.max_intensity,
		)
	}

	/// The command frame [`Apa102::set_one`] sends for `color`.
	pub fn single_frame(&self, color: &Color) -> [u8; 4] {
		let flag = self.config.enable_flag | (color.intensity & WIDE_INTENSITY_MASK);
		encode_command(flag, color, self.config.max_intensity)
	}

	/// The command frame [`Apa102::turn_off`] sends.
	pub fn off_frame(&self) -> [u8; 4] {
		let flag = self.config.power_saving.off_flag(&self.config);
		encode_command(flag, &Color::dark(self.config.min_intensity), self.config.max_intensity)
	}

	/// Powers every device and leaves it dark at minimum intensity.
	pub fn init(&mut self) {
		debug!(chain_length = self.config.chain_length, "init");
		let frame = self.dark_frame();
		self.broadcast(frame);
	}

	/// Sends one command frame for the next device on the chain.
	///
	/// Not a transaction on its own, wrap the calls for a chain in
	/// [`Apa102::send_start`] and [`Apa102::send_end`].
	pub fn set_one(&mut self, color: &Color) {
		let frame = self.single_frame(color);
		self.send_frame(frame);
	}

	/// Sets every device on the chain to `color`.
	pub fn set_all(&mut self, color: &Color) {
		debug!(?color, "set all");
		let frame = self.single_frame(color);
		self.broadcast(frame);
	}

	/// Sets each device to the matching color of `colors`, in chain order.
	///
	/// Colors past the end of the chain are ignored. Devices without a color are
	/// left powered and dark, as after [`Apa102::init`].
	pub fn set_each<I>(&mut self, colors: I)
	where
		I: IntoIterator<Item = Color>,
	{
		let chain_length = self.config.chain_length;
		let mut sent = 0;

		self.send_start();
		for color in colors.into_iter().take(chain_length) {
			self.set_one(&color);
			sent += 1;
		}

		let dark = self.dark_frame();
		for _ in sent..chain_length {
			self.send_frame(dark);
		}
		self.send_end();

		debug!(colors = sent, chain_length, "set each");
	}

	/// Sends one command frame that switches the next device off.
	///
	/// With [`PowerSaving::Available`] the device is put to sleep, otherwise it is
	/// dimmed to `min_intensity` with no color. Needs the same wrapping as
	/// [`Apa102::set_one`].
	pub fn turn_off(&mut self) {
		let frame = self.off_frame();
		self.send_frame(frame);
	}

	/// Switches every device on the chain off.
	pub fn turn_all_off(&mut self) {
		debug!(power_saving = ?self.config.power_saving, "turn all off");
		self.send_start();
		for _ in 0..self.config.chain_length {
			self.turn_off();
		}
		self.send_end();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const COLOR: Color = Color::new(0x10, 0x20, 0x30, 0x05);

	fn chain(chain_length: usize) -> Apa102<Vec<u8>> {
		Apa102::new(Vec::<u8>::new(), Config::new(chain_length)).unwrap()
	}

	#[test]
	fn init_test() {
		#[rustfmt::skip]
		const EXPECTED_WRITE_DATA: &[u8] = &[
			0x00, 0x00, 0x00, 0x00, // start
			0xE1, 0x00, 0x00, 0x00, // dark, min intensity
			0xE1, 0x00, 0x00, 0x00,
			0xFF, 0xFF, 0xFF, 0xFF, // end
		];

		let mut apa102 = chain(2);
		apa102.init();

		assert_eq!(apa102.transport(), EXPECTED_WRITE_DATA);
	}

	#[test]
	fn set_all_test() {
		#[rustfmt::skip]
		const EXPECTED_WRITE_DATA: &[u8] = &[
			0x00, 0x00, 0x00, 0x00,
			0xE5, 0x30, 0x20, 0x10,
			0xE5, 0x30, 0x20, 0x10,
			0xE5, 0x30, 0x20, 0x10,
			0xFF, 0xFF, 0xFF, 0xFF,
		];

		let mut apa102 = chain(3);
		apa102.set_all(&COLOR);

		assert_eq!(apa102.transport(), EXPECTED_WRITE_DATA);
	}

	#[test]
	fn set_one_is_a_bare_frame() {
		let mut apa102 = chain(3);
		apa102.set_one(&COLOR);

		assert_eq!(apa102.transport(), &[0xE5, 0x30, 0x20, 0x10]);
	}

	#[test]
	fn single_frame_uses_wide_mask() {
		let config = Config {
			enable_flag: 0xC0,
			..Config::new(1)
		};
		let apa102 = Apa102::new(Vec::<u8>::new(), config).unwrap();

		// bit 5 of the intensity passes the wide mask, bit 6 and 7 never do
		assert_eq!(apa102.single_frame(&Color::new(0, 0, 0, 0xFF))[0], 0xFF);
		assert_eq!(apa102.single_frame(&Color::new(0, 0, 0, 0xC1))[0], 0xC1);
		assert_eq!(apa102.single_frame(&Color::new(0, 0, 0, 0x21))[0], 0xE1);
	}

	#[test]
	fn turn_off_test() {
		let mut apa102 = chain(1);
		apa102.turn_off();
		assert_eq!(apa102.into_inner(), [0xE1, 0x00, 0x00, 0x00]);

		let config = Config::new(1).with_power_saving(PowerSaving::Available);
		let mut apa102 = Apa102::new(Vec::<u8>::new(), config).unwrap();
		apa102.turn_off();
		assert_eq!(apa102.into_inner(), [0xA1, 0x00, 0x00, 0x00]);
	}

	#[test]
	fn turn_all_off_test() {
		#[rustfmt::skip]
		const EXPECTED_WRITE_DATA: &[u8] = &[
			0x00, 0x00, 0x00, 0x00,
			0xA1, 0x00, 0x00, 0x00,
			0xA1, 0x00, 0x00, 0x00,
			0xFF, 0xFF, 0xFF, 0xFF,
		];

		let config = Config::new(2).with_power_saving(PowerSaving::Available);
		let mut apa102 = Apa102::new(Vec::<u8>::new(), config).unwrap();
		apa102.turn_all_off();

		assert_eq!(apa102.transport(), EXPECTED_WRITE_DATA);
	}

	#[test]
	fn set_each_pads_and_truncates() {
		#[rustfmt::skip]
		const EXPECTED_WRITE_DATA: &[u8] = &[
			0x00, 0x00, 0x00, 0x00,
			0xE5, 0x30, 0x20, 0x10,
			0xE1, 0x00, 0x00, 0x00, // padded
			0xFF, 0xFF, 0xFF, 0xFF,
		];

		let mut apa102 = chain(2);
		apa102.set_each([COLOR]);
		assert_eq!(apa102.transport(), EXPECTED_WRITE_DATA);

		let mut apa102 = chain(1);
		apa102.set_each([COLOR, Color::new(0xFF, 0xFF, 0xFF, 0x1F)]);
		assert_eq!(apa102.transport().len(), 12);
		assert_eq!(&apa102.transport()[4..8], &[0xE5, 0x30, 0x20, 0x10]);
	}

	#[test]
	fn custom_markers_and_frame_size() {
		let config = Config {
			frame_size: 2,
			start_marker: 0x11,
			end_marker: 0xEE,
			..Config::new(1)
		};
		let mut apa102 = Apa102::new(Vec::<u8>::new(), config).unwrap();
		apa102.send_start();
		apa102.send_end();

		assert_eq!(apa102.transport(), &[0x11, 0x11, 0xEE, 0xEE]);
	}

	#[test]
	fn invalid_config_is_rejected() {
		assert!(matches!(Apa102::new(Vec::<u8>::new(), Config::new(0)), Err(Error::InvalidChainLength)));
	}

	#[test]
	fn mask_that_drops_min_intensity_is_rejected() {
		// 0x10 & 0x01 would leave init and turn_off frames at intensity 0
		let config = Config {
			max_intensity: 0x10,
			..Config::new(1)
		};

		assert!(matches!(
			Apa102::new(Vec::<u8>::new(), config),
			Err(Error::IntensityMaskNotContiguous { max: 0x10 })
		));
	}

	#[test]
	fn flag_equal_to_start_marker_is_rejected() {
		let config = Config {
			enable_flag: 0x00,
			..Config::new(1)
		};

		assert!(matches!(Apa102::new(Vec::<u8>::new(), config), Err(Error::InvalidFlag { flag: 0x00 })));
	}

	#[test]
	fn narrower_mask_keeps_min_intensity() {
		let config = Config {
			max_intensity: 0x07,
			..Config::new(1)
		};
		let apa102 = Apa102::new(Vec::<u8>::new(), config).unwrap();

		assert_eq!(apa102.off_frame(), [0xE1, 0x00, 0x00, 0x00]);
		assert_eq!(apa102.single_frame(&Color::new(0, 0, 0, 0x1F))[0], 0xFF);
	}
}
