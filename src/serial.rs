use std::{
	io::{self, Write},
	time::Duration,
};

use serialport::SerialPort;
use tracing::warn;

use crate::{Result, Transport};

/// Transport over a USB serial bridge that shifts every received byte onto its SPI bus.
///
/// The bridge has no way to report MISO back, so every transfer returns `0x00`.
pub struct SerialTransport {
	port: Box<dyn SerialPort>,
}

impl SerialTransport {
	/// Wraps a port that is already open and configured.
	pub fn new(port: Box<dyn SerialPort>) -> Self {
		Self { port }
	}

	/// Opens the serial device at `path`.
	pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
		let builder = serialport::new(path, baud_rate).timeout(Duration::from_millis(10));
		let port = builder.open()?;

		Ok(Self::new(port))
	}

	pub fn into_inner(self) -> Box<dyn SerialPort> {
		self.port
	}

	fn serial_write(&mut self, buffer: &[u8]) {
		match self.port.write_all(buffer) {
			Ok(_) => {}
			Err(ref e) if e.kind() == io::ErrorKind::TimedOut => {
				warn!("serial timeout, {} byte(s) dropped", buffer.len());
			}
			Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {
				warn!("serial interrupted, {} byte(s) dropped", buffer.len());
			}
			Err(e) => {
				warn!("serial write failed: {}", e);
			}
		}
	}
}

impl Transport for SerialTransport {
	fn transfer_byte(&mut self, byte: u8) -> u8 {
		self.serial_write(&[byte]);
		0x00
	}

	fn transfer_all(&mut self, bytes: &[u8]) {
		self.serial_write(bytes);
	}
}
