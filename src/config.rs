use apa102_chain_protocol::{
	Delimiter,
	COMMAND_MARKER,
	ENABLE_FLAG,
	FRAME_SIZE,
	MAX_INTENSITY,
	MIN_INTENSITY,
	SLEEP_FLAG,
	START_FLAG,
};

use crate::{Error, Result};

/// Whether the devices on the chain understand the sleep command.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PowerSaving {
	#[default]
	Unavailable,
	Available,
}

impl PowerSaving {
	/// The command byte used to switch a single device off.
	///
	/// Without power saving the device only gets dimmed to `min_intensity`, it keeps
	/// drawing current.
	pub fn off_flag(self, config: &Config) -> u8 {
		match self {
			PowerSaving::Available => config.sleep_flag,
			PowerSaving::Unavailable => config.start_flag,
		}
	}
}

/// Chain and protocol settings, fixed for the lifetime of a driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	/// Number of devices on the chain.
	pub chain_length: usize,
	/// Length of the start and end delimiters in bytes.
	pub frame_size:   usize,
	pub start_marker: u8,
	pub end_marker:   u8,

	pub min_intensity: u8,
	/// Also used as the mask for every command byte: all low bits set, at most `0x1F`.
	pub max_intensity: u8,

	pub enable_flag:  u8,
	pub start_flag:   u8,
	pub sleep_flag:   u8,
	pub power_saving: PowerSaving,
}

impl Config {
	/// Protocol defaults for a chain of `chain_length` devices.
	pub fn new(chain_length: usize) -> Self {
		Self {
			chain_length,
			frame_size: FRAME_SIZE,
			start_marker: Delimiter::Start.default_marker(),
			end_marker: Delimiter::End.default_marker(),

			min_intensity: MIN_INTENSITY,
			max_intensity: MAX_INTENSITY,

			enable_flag: ENABLE_FLAG,
			start_flag: START_FLAG,
			sleep_flag: SLEEP_FLAG,
			power_saving: PowerSaving::Unavailable,
		}
	}

	pub fn with_power_saving(mut self, power_saving: PowerSaving) -> Self {
		self.power_saving = power_saving;
		self
	}

	pub fn validate(&self) -> Result<()> {
		if self.chain_length == 0 {
			return Err(Error::InvalidChainLength);
		}
		if self.frame_size == 0 {
			return Err(Error::InvalidFrameSize);
		}
		if self.max_intensity > MAX_INTENSITY {
			return Err(Error::IntensityOutOfRange {
				max: self.max_intensity,
			});
		}
		// the mask must keep every intensity up to the max, or min_intensity may vanish
		if self.max_intensity & self.max_intensity.wrapping_add(1) != 0 {
			return Err(Error::IntensityMaskNotContiguous {
				max: self.max_intensity,
			});
		}
		if self.min_intensity > self.max_intensity {
			return Err(Error::IntensityBoundsInverted {
				min: self.min_intensity,
				max: self.max_intensity,
			});
		}
		for flag in [self.enable_flag, self.start_flag, self.sleep_flag] {
			if flag & COMMAND_MARKER != COMMAND_MARKER {
				return Err(Error::InvalidFlag { flag });
			}
		}

		Ok(())
	}

	/// Devices a single end delimiter can clock through: every device delays the clock
	/// by half a bit, so each delimiter bit covers two devices.
	pub fn flushable_chain_length(&self) -> usize {
		self.frame_size * 8 * 2
	}
}

impl Default for Config {
	fn default() -> Self {
		Self::new(1)
	}
}
