/// A byte-wide synchronous serial bus.
///
/// The bus must already be set up for the chain (MSB first, data sampled on the
/// rising clock edge). `transfer_byte` blocks until the byte has been shifted out and
/// returns whatever was clocked in at the same time. There is no error channel, a
/// transport that can fail has to deal with it itself.
pub trait Transport {
	fn transfer_byte(&mut self, byte: u8) -> u8;

	/// Sends every byte of `bytes` in order.
	fn transfer_all(&mut self, bytes: &[u8]) {
		for &byte in bytes {
			self.transfer_byte(byte);
		}
	}
}

impl<T> Transport for &mut T
where
	T: Transport + ?Sized,
{
	fn transfer_byte(&mut self, byte: u8) -> u8 {
		T::transfer_byte(self, byte)
	}

	fn transfer_all(&mut self, bytes: &[u8]) {
		T::transfer_all(self, bytes)
	}
}

/// Records the outgoing bytes, e.g. to render a whole transaction and hand it to a
/// bulk writer afterwards. Nothing is ever received.
impl Transport for Vec<u8> {
	fn transfer_byte(&mut self, byte: u8) -> u8 {
		self.push(byte);
		0x00
	}

	fn transfer_all(&mut self, bytes: &[u8]) {
		self.extend_from_slice(bytes);
	}
}
