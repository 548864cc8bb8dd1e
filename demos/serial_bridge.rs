use std::{thread, time::Duration};

use apa102_chain::{Apa102, Color, Config, SerialTransport};
use color_eyre::eyre::{eyre, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

const BAUD_RATE: u32 = 921_600;

fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
		.init();

	let mut args = std::env::args().skip(1);
	let path = args.next().ok_or_else(|| eyre!("usage: serial_bridge <serial device> [leds]"))?;
	let leds = args.next().map(|n| n.parse()).transpose()?.unwrap_or(8);

	let transport = SerialTransport::open(&path, BAUD_RATE)?;
	let mut apa102 = Apa102::new(transport, Config::new(leds))?;

	apa102.init();

	for color in [
		Color::new(0xFF, 0x00, 0x00, 0x08),
		Color::new(0x00, 0xFF, 0x00, 0x08),
		Color::new(0x00, 0x00, 0xFF, 0x08),
	] {
		info!(?color, "showing");
		apa102.set_all(&color);
		thread::sleep(Duration::from_millis(500));
	}

	let gradient = (0..leds).map(|i| {
		let step = (i * 255 / leds.max(2).saturating_sub(1)).min(255) as u8;
		Color::new(step, 0x00, 0xFF - step, 0x04)
	});
	info!("gradient");
	apa102.set_each(gradient);
	thread::sleep(Duration::from_secs(1));

	apa102.turn_all_off();

	Ok(())
}
